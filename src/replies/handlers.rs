use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::jwt::AuthUser,
    db::AppState,
    dto::MessageResponse,
    error::{ApiError, ApiResult},
    forums::repo::Forum,
    replies::{dto::ReplyBody, repo::Reply},
    users::repo::User,
    votes::{self, VoteAction, VoteTarget},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/forums/:id/reply", post(create_reply))
        .route("/replies/:id", get(list_replies))
        .route("/forums/:forum_id/replies/:reply_id", delete(delete_reply))
        .route("/forums/:forum_id/replies/:reply_id/edit", post(edit_reply))
        .route("/forums/:forum_id/replies/:reply_id/like", post(like_reply))
        .route(
            "/forums/:forum_id/replies/:reply_id/dislike",
            post(dislike_reply),
        )
}

/// Loads the reply and checks the caller wrote it. Shared by edit and
/// delete.
async fn owned_reply(state: &AppState, id: Uuid, user_id: Uuid) -> ApiResult<Reply> {
    let reply = Reply::by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Reply not found"))?;
    if reply.user_id != user_id {
        warn!(reply_id = %id, %user_id, "caller is not the reply author");
        return Err(ApiError::Forbidden("Not the author of this reply"));
    }
    Ok(reply)
}

#[instrument(skip(state, payload))]
pub async fn create_reply(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(forum_id): Path<Uuid>,
    Json(payload): Json<ReplyBody>,
) -> ApiResult<Json<MessageResponse>> {
    // Replies only attach to posts that still exist.
    if Forum::by_id(&state.db, forum_id).await?.is_none() {
        return Err(ApiError::NotFound("Post not found"));
    }
    let username = match User::find_by_id(&state.db, user_id).await? {
        Some(user) => user.username,
        None => return Err(ApiError::Unauthenticated("User not found")),
    };

    let reply = Reply::create(&state.db, forum_id, &payload.reply_text, user_id, &username).await?;

    info!(reply_id = %reply.id, %forum_id, %user_id, "reply created");
    Ok(Json(MessageResponse {
        message: "Reply posted",
    }))
}

/// `:id` here is the forum id; replies come back oldest first.
#[instrument(skip(state))]
pub async fn list_replies(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(forum_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Reply>>> {
    Ok(Json(Reply::by_forum(&state.db, forum_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn edit_reply(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((_forum_id, reply_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<ReplyBody>,
) -> ApiResult<Json<MessageResponse>> {
    owned_reply(&state, reply_id, user_id).await?;
    Reply::update_text(&state.db, reply_id, &payload.reply_text).await?;

    info!(%reply_id, %user_id, "reply updated");
    Ok(Json(MessageResponse {
        message: "Reply updated",
    }))
}

#[instrument(skip(state))]
pub async fn delete_reply(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((_forum_id, reply_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<MessageResponse>> {
    owned_reply(&state, reply_id, user_id).await?;
    Reply::delete(&state.db, reply_id).await?;

    info!(%reply_id, %user_id, "reply deleted");
    Ok(Json(MessageResponse {
        message: "Reply deleted",
    }))
}

#[instrument(skip(state))]
pub async fn like_reply(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((_forum_id, reply_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<MessageResponse>> {
    votes::apply(
        &state.db,
        VoteTarget::Reply,
        reply_id,
        user_id,
        VoteAction::Like,
    )
    .await?;
    Ok(Json(MessageResponse {
        message: "Reply like updated",
    }))
}

#[instrument(skip(state))]
pub async fn dislike_reply(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((_forum_id, reply_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<MessageResponse>> {
    votes::apply(
        &state.db,
        VoteTarget::Reply,
        reply_id,
        user_id,
        VoteAction::Dislike,
    )
    .await?;
    Ok(Json(MessageResponse {
        message: "Reply dislike updated",
    }))
}
