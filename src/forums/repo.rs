use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// A forum post. `author` is a display-name snapshot taken at write time;
/// `created_by` is the authoritative identity reference. The four vote
/// columns are only ever touched by the vote engine.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Forum {
    pub id: Uuid,
    pub title: String,
    pub discussion_body: String,
    pub tags: Vec<String>,
    pub author: String,
    pub created_by: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub likes: i32,
    pub dislikes: i32,
    pub liked_by: Vec<Uuid>,
    pub disliked_by: Vec<Uuid>,
}

const COLUMNS: &str = "id, title, discussion_body, tags, author, created_by, created_at, \
                       likes, dislikes, liked_by, disliked_by";

impl Forum {
    pub async fn create(
        db: &PgPool,
        title: &str,
        discussion_body: &str,
        tags: &[String],
        author: &str,
        created_by: Uuid,
    ) -> Result<Forum, sqlx::Error> {
        sqlx::query_as::<_, Forum>(&format!(
            "INSERT INTO forums (title, discussion_body, tags, author, created_by) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        ))
        .bind(title)
        .bind(discussion_body)
        .bind(tags)
        .bind(author)
        .bind(created_by)
        .fetch_one(db)
        .await
    }

    pub async fn all(db: &PgPool) -> Result<Vec<Forum>, sqlx::Error> {
        sqlx::query_as::<_, Forum>(&format!(
            "SELECT {COLUMNS} FROM forums ORDER BY created_at DESC"
        ))
        .fetch_all(db)
        .await
    }

    pub async fn by_author(db: &PgPool, created_by: Uuid) -> Result<Vec<Forum>, sqlx::Error> {
        sqlx::query_as::<_, Forum>(&format!(
            "SELECT {COLUMNS} FROM forums WHERE created_by = $1 ORDER BY created_at DESC"
        ))
        .bind(created_by)
        .fetch_all(db)
        .await
    }

    pub async fn by_id(db: &PgPool, id: Uuid) -> Result<Option<Forum>, sqlx::Error> {
        sqlx::query_as::<_, Forum>(&format!("SELECT {COLUMNS} FROM forums WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Wholesale replacement of title, body and tags; refreshes the author
    /// display-name snapshot at the same time. Vote columns are untouched.
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        title: &str,
        discussion_body: &str,
        tags: &[String],
        author: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE forums SET title = $2, discussion_body = $3, tags = $4, author = $5 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(title)
        .bind(discussion_body)
        .bind(tags)
        .bind(author)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Removes the post only. Its replies stay behind, still queryable by
    /// forum id.
    pub async fn delete(db: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM forums WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}
