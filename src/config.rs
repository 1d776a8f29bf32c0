use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    /// Directory served statically under `/uploads`; avatars land in
    /// `<uploads_dir>/profiles`.
    pub uploads_dir: PathBuf,
    pub jwt: JwtConfig,
}

impl AppConfig {
    /// `DATABASE_URL` and `JWT_SECRET` are required; there are deliberately
    /// no baked-in fallbacks for either.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let uploads_dir = std::env::var("UPLOADS_DIR")
            .unwrap_or_else(|_| "public/uploads".into())
            .into();
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "forumd".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "forumd-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(12 * 60),
        };
        Ok(Self {
            database_url,
            uploads_dir,
            jwt,
        })
    }
}
