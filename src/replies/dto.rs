use serde::Deserialize;

/// Body for creating or editing a reply.
#[derive(Debug, Deserialize)]
pub struct ReplyBody {
    #[serde(rename = "replyText")]
    pub reply_text: String,
}
