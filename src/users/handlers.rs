use anyhow::Context;
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{handlers::normalize_email, jwt::AuthUser},
    db::AppState,
    error::{ApiError, ApiResult},
    users::repo::User,
};

const MAX_AVATAR_BYTES: usize = 5 * 1024 * 1024;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile))
        .route("/profile/update", post(update_profile))
        // Avatar limit plus headroom for the text fields.
        .layer(DefaultBodyLimit::max(MAX_AVATAR_BYTES + 64 * 1024))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<User>> {
    match User::find_by_id(&state.db, user_id).await? {
        Some(user) => Ok(Json(user)),
        None => {
            warn!(%user_id, "profile for unknown user id");
            Err(ApiError::Unauthenticated("User not found"))
        }
    }
}

/// Multipart form with `username`, `email`, `bio` and an optional
/// `profilePic` image. The picture is written under the uploads directory
/// and referenced from the user record by its `/uploads/...` URL.
#[instrument(skip(state, form))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut form: Multipart,
) -> ApiResult<Json<User>> {
    let mut username: Option<String> = None;
    let mut email: Option<String> = None;
    let mut bio: Option<String> = None;
    let mut picture: Option<(&'static str, Bytes)> = None;

    while let Some(field) = form
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed form data: {e}")))?
    {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("username") => username = Some(field.text().await.map_err(malformed)?),
            // Stored emails are canonical; an as-received mixed-case value
            // would never match login's lowercased lookup again.
            Some("email") => {
                email = Some(normalize_email(&field.text().await.map_err(malformed)?)?);
            }
            Some("bio") => bio = Some(field.text().await.map_err(malformed)?),
            Some("profilePic") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let ext = image_extension(&file_name).ok_or_else(|| {
                    ApiError::BadRequest("Only image files are allowed".into())
                })?;
                let data = field.bytes().await.map_err(malformed)?;
                if data.len() > MAX_AVATAR_BYTES {
                    return Err(ApiError::BadRequest("Image exceeds the 5MB limit".into()));
                }
                picture = Some((ext, data));
            }
            _ => {}
        }
    }

    let mut pic_url: Option<String> = None;
    if let Some((ext, data)) = picture {
        let dir = state.config.uploads_dir.join("profiles");
        tokio::fs::create_dir_all(&dir)
            .await
            .context("create uploads directory")?;
        let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        let file_name = format!("user-{user_id}-{millis}.{ext}");
        tokio::fs::write(dir.join(&file_name), &data)
            .await
            .context("write avatar file")?;
        info!(%user_id, file = %file_name, bytes = data.len(), "avatar stored");
        pic_url = Some(format!("/uploads/profiles/{file_name}"));
    }

    User::update_profile(
        &state.db,
        user_id,
        username.as_deref(),
        email.as_deref(),
        bio.as_deref(),
        pic_url.as_deref(),
    )
    .await
    .map_err(|e| {
        error!(error = %e, %user_id, "profile update failed");
        ApiError::Internal(anyhow::Error::from(e).context("update profile"))
    })?;

    match User::find_by_id(&state.db, user_id).await? {
        Some(user) => Ok(Json(user)),
        None => Err(ApiError::Unauthenticated("User not found")),
    }
}

fn malformed(e: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::BadRequest(format!("Malformed form data: {e}"))
}

/// Accepted avatar types, by file extension.
fn image_extension(file_name: &str) -> Option<&'static str> {
    let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" => Some("jpg"),
        "jpeg" => Some("jpeg"),
        "png" => Some("png"),
        "gif" => Some("gif"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_extension_accepts_the_four_types() {
        assert_eq!(image_extension("me.jpg"), Some("jpg"));
        assert_eq!(image_extension("me.JPEG"), Some("jpeg"));
        assert_eq!(image_extension("pic.png"), Some("png"));
        assert_eq!(image_extension("anim.gif"), Some("gif"));
    }

    #[test]
    fn image_extension_rejects_everything_else() {
        assert_eq!(image_extension("script.svg"), None);
        assert_eq!(image_extension("archive.tar.bz2"), None);
        assert_eq!(image_extension("noextension"), None);
        assert_eq!(image_extension(""), None);
    }

    #[test]
    fn image_extension_uses_the_last_dot() {
        assert_eq!(image_extension("weird.name.png"), Some("png"));
        assert_eq!(image_extension("evil.png.exe"), None);
    }
}
