use serde::Serialize;

/// Plain `{"message": ...}` body returned by mutation endpoints.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
