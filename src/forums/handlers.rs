use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::jwt::AuthUser,
    db::AppState,
    dto::MessageResponse,
    error::{ApiError, ApiResult},
    forums::{dto::ForumBody, repo::Forum},
    users::repo::User,
    votes::{self, VoteAction, VoteTarget},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/forums", get(list_forums).post(create_forum))
        .route("/userForums", get(list_user_forums))
        .route("/forums/:id", get(get_forum).delete(delete_forum))
        .route("/forums/:id/edit", post(edit_forum))
        .route("/forums/:id/like", post(like_forum))
        .route("/forums/:id/dislike", post(dislike_forum))
}

/// The client sends tags as a JSON string ("[\"a\",\"b\"]"). A malformed
/// value is logged and treated as no tags; the request still succeeds.
fn parse_tags(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(tags) => tags,
        Err(e) => {
            warn!(error = %e, "malformed tags payload, storing none");
            Vec::new()
        }
    }
}

async fn display_name(state: &AppState, user_id: Uuid) -> ApiResult<String> {
    match User::find_by_id(&state.db, user_id).await? {
        Some(user) => Ok(user.username),
        None => Err(ApiError::Unauthenticated("User not found")),
    }
}

/// Loads the post and checks the caller owns it. Shared by edit and delete.
async fn owned_forum(state: &AppState, id: Uuid, user_id: Uuid) -> ApiResult<Forum> {
    let forum = Forum::by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Post not found"))?;
    if forum.created_by != user_id {
        warn!(%id, %user_id, "caller is not the post author");
        return Err(ApiError::Forbidden("Not the author of this post"));
    }
    Ok(forum)
}

// Listing all posts is the one public read.
#[instrument(skip(state))]
pub async fn list_forums(State(state): State<AppState>) -> ApiResult<Json<Vec<Forum>>> {
    Ok(Json(Forum::all(&state.db).await?))
}

#[instrument(skip(state))]
pub async fn list_user_forums(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<Vec<Forum>>> {
    Ok(Json(Forum::by_author(&state.db, user_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_forum(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<ForumBody>,
) -> ApiResult<Json<MessageResponse>> {
    let username = display_name(&state, user_id).await?;
    let tags = parse_tags(&payload.tags);

    let forum = Forum::create(
        &state.db,
        &payload.title,
        &payload.discussion_body,
        &tags,
        &username,
        user_id,
    )
    .await?;

    info!(forum_id = %forum.id, %user_id, "post created");
    Ok(Json(MessageResponse { message: "Success" }))
}

#[instrument(skip(state))]
pub async fn get_forum(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Forum>> {
    let forum = Forum::by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Post not found"))?;
    Ok(Json(forum))
}

#[instrument(skip(state, payload))]
pub async fn edit_forum(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ForumBody>,
) -> ApiResult<Json<MessageResponse>> {
    owned_forum(&state, id, user_id).await?;
    let username = display_name(&state, user_id).await?;
    let tags = parse_tags(&payload.tags);

    Forum::update(
        &state.db,
        id,
        &payload.title,
        &payload.discussion_body,
        &tags,
        &username,
    )
    .await?;

    info!(forum_id = %id, %user_id, "post updated");
    Ok(Json(MessageResponse {
        message: "Post updated successfully",
    }))
}

#[instrument(skip(state))]
pub async fn delete_forum(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    owned_forum(&state, id, user_id).await?;
    // Replies are intentionally left in place, still reachable by forum id.
    Forum::delete(&state.db, id).await?;

    info!(forum_id = %id, %user_id, "post deleted");
    Ok(Json(MessageResponse {
        message: "Post deleted",
    }))
}

#[instrument(skip(state))]
pub async fn like_forum(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    votes::apply(&state.db, VoteTarget::Forum, id, user_id, VoteAction::Like).await?;
    Ok(Json(MessageResponse {
        message: "Post like updated",
    }))
}

#[instrument(skip(state))]
pub async fn dislike_forum(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    votes::apply(&state.db, VoteTarget::Forum, id, user_id, VoteAction::Dislike).await?;
    Ok(Json(MessageResponse {
        message: "Post dislike updated",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_parse_from_json_string() {
        assert_eq!(parse_tags(r#"["rust","forums"]"#), vec!["rust", "forums"]);
        assert_eq!(parse_tags("[]"), Vec::<String>::new());
    }

    #[test]
    fn malformed_tags_become_empty_without_error() {
        assert!(parse_tags("not json").is_empty());
        assert!(parse_tags(r#"{"a":1}"#).is_empty());
        assert!(parse_tags(r#"["unterminated"#).is_empty());
    }

    #[test]
    fn blank_tags_field_means_no_tags() {
        assert!(parse_tags("").is_empty());
        assert!(parse_tags("   ").is_empty());
    }
}
