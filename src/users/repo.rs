use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Identity record. The credential hash never serializes; profile responses
/// are this struct as-is.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub bio: Option<String>,
    pub profile_pic: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

const COLUMNS: &str = "id, email, username, password_hash, bio, profile_pic, created_at";

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Fails with a unique violation when the email is already registered.
    pub async fn create(
        db: &PgPool,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, email, password_hash) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        ))
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await
    }

    /// Fields present in the input overwrite the stored ones; `None` leaves
    /// a column untouched. The credential hash is not updatable here.
    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        username: Option<&str>,
        email: Option<&str>,
        bio: Option<&str>,
        profile_pic: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET \
             username = COALESCE($2, username), \
             email = COALESCE($3, email), \
             bio = COALESCE($4, bio), \
             profile_pic = COALESCE($5, profile_pic) \
             WHERE id = $1",
        )
        .bind(id)
        .bind(username)
        .bind(email)
        .bind(bio)
        .bind(profile_pic)
        .execute(db)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization_excludes_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            email: "a@x.com".into(),
            username: "ann".into(),
            password_hash: "$argon2id$secret".into(),
            bio: Some("hello".into()),
            profile_pic: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("password"));
        assert!(json.contains(r#""profilePic":null"#));
        assert!(json.contains(r#""username":"ann""#));
    }
}
