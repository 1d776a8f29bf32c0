use axum::{
    extract::{FromRef, State},
    routing::post,
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, SignupRequest, TokenResponse},
        jwt::JwtKeys,
        password::{hash_password, verify_password, DUMMY_HASH},
    },
    db::AppState,
    error::{ApiError, ApiResult},
    users::repo::User,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
}

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Canonical form for every email the system stores or looks up. Signup and
/// profile update must both go through here, or a mixed-case update would
/// strand the account: login lowercases before the exact-match lookup.
pub(crate) fn normalize_email(raw: &str) -> ApiResult<String> {
    let email = raw.trim().to_lowercase();
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::BadRequest("Invalid email".into()));
    }
    Ok(email)
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(mut payload): Json<SignupRequest>,
) -> ApiResult<Json<TokenResponse>> {
    payload.email = normalize_email(&payload.email)?;
    let username = payload.username.trim();

    if username.is_empty() {
        return Err(ApiError::BadRequest("Username is required".into()));
    }
    if payload.password.len() < 8 {
        warn!("password too short");
        return Err(ApiError::BadRequest("Password too short".into()));
    }

    let hash = hash_password(&payload.password)?;

    // Uniqueness is the database's unique constraint, not a pre-read; two
    // concurrent signups with one email cannot both land.
    let user = match User::create(&state.db, username, &payload.email, &hash).await {
        Ok(u) => u,
        Err(e) if e.as_database_error().is_some_and(|d| d.is_unique_violation()) => {
            warn!(email = %payload.email, "email already registered");
            return Err(ApiError::Conflict("Email exists"));
        }
        Err(e) => return Err(e.into()),
    };

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user signed up");
    Ok(Json(TokenResponse { access_token }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    payload.email = payload.email.trim().to_lowercase();

    // Unknown email and wrong password fail with the same body, and both
    // run one argon2 verification.
    let user = match User::find_by_email(&state.db, &payload.email).await? {
        Some(u) => u,
        None => {
            let _ = verify_password(&payload.password, &DUMMY_HASH);
            warn!(email = %payload.email, "login unknown email");
            return Err(ApiError::Unauthenticated("Invalid email or password"));
        }
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthenticated("Invalid email or password"));
    }

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(TokenResponse { access_token }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation_accepts_plain_addresses() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last@sub.example.org"));
    }

    #[test]
    fn email_validation_rejects_malformed_input() {
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("two@@x.com"));
        assert!(!is_valid_email("spaces in@x.com"));
        assert!(!is_valid_email("missing@tld"));
    }

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email("  Ann@X.com ").unwrap(), "ann@x.com");
        assert_eq!(normalize_email("a@x.com").unwrap(), "a@x.com");
    }

    #[test]
    fn normalize_email_rejects_malformed_input() {
        assert!(normalize_email("not-an-email").is_err());
        assert!(normalize_email("   ").is_err());
    }
}
