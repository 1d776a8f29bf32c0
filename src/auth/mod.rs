use axum::Router;

use crate::db::AppState;

mod dto;
pub mod handlers;
pub mod jwt;
pub mod password;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
