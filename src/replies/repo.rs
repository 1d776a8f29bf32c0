use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// A reply under one post. Carries the same vote bookkeeping as a post and
/// goes through the same vote engine. `forum_id` has no foreign key on
/// purpose: replies outlive a deleted post.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub id: Uuid,
    pub forum_id: Uuid,
    pub reply_text: String,
    pub user_id: Uuid,
    pub username: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub likes: i32,
    pub dislikes: i32,
    pub liked_by: Vec<Uuid>,
    pub disliked_by: Vec<Uuid>,
}

const COLUMNS: &str = "id, forum_id, reply_text, user_id, username, created_at, \
                       likes, dislikes, liked_by, disliked_by";

impl Reply {
    pub async fn create(
        db: &PgPool,
        forum_id: Uuid,
        reply_text: &str,
        user_id: Uuid,
        username: &str,
    ) -> Result<Reply, sqlx::Error> {
        sqlx::query_as::<_, Reply>(&format!(
            "INSERT INTO replies (forum_id, reply_text, user_id, username) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        ))
        .bind(forum_id)
        .bind(reply_text)
        .bind(user_id)
        .bind(username)
        .fetch_one(db)
        .await
    }

    pub async fn by_forum(db: &PgPool, forum_id: Uuid) -> Result<Vec<Reply>, sqlx::Error> {
        sqlx::query_as::<_, Reply>(&format!(
            "SELECT {COLUMNS} FROM replies WHERE forum_id = $1 ORDER BY created_at ASC"
        ))
        .bind(forum_id)
        .fetch_all(db)
        .await
    }

    pub async fn by_id(db: &PgPool, id: Uuid) -> Result<Option<Reply>, sqlx::Error> {
        sqlx::query_as::<_, Reply>(&format!("SELECT {COLUMNS} FROM replies WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn update_text(db: &PgPool, id: Uuid, reply_text: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE replies SET reply_text = $2 WHERE id = $1")
            .bind(id)
            .bind(reply_text)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM replies WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}
