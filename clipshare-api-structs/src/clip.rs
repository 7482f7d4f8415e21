use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request body used to create a new clip.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClip {
    /// The text to share; must not be empty.
    pub content: String,
    /// Private clips require a password to be read.
    #[serde(default)]
    pub is_private: bool,
    /// The password for a private clip. Ignored for public clips.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Address the clip at this slug rather than a generated one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_slug: Option<String>,
    /// How long the clip lives: "never", or a count of hours or days such as "1h" or "7d".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<String>,
    /// Delete the clip once it has been read.
    #[serde(default)]
    pub destroy_on_view: bool,
}

/// Returned after a clip is created. The content is never echoed back.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipCreated {
    pub id: Uuid,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// A clip as seen by a reader who passed the access checks.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipView {
    pub id: Uuid,
    pub slug: String,
    pub content: String,
    pub is_private: bool,
    /// Number of successful reads, including this one.
    pub views: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
