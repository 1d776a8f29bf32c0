use serde::Deserialize;

/// Body for creating or editing a post. The client sends `tags` as a
/// JSON-encoded string array inside the string field.
#[derive(Debug, Deserialize)]
pub struct ForumBody {
    pub title: String,
    #[serde(rename = "discussionBody")]
    pub discussion_body: String,
    #[serde(default)]
    pub tags: String,
}
