// SPDX-License-Identifier: GPL-2.0-or-later
//
// The storage seam the clip service talks through.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clipshare_api_structs::{ClipCreated, ClipView};
use sqlx::types::Uuid;

use crate::Error;

/// Representation of a clip in the database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Clip {
    /// The unique identifier for the clip and primary key for the table.
    pub id: Uuid,
    /// The unique, human-facing address of the clip.
    pub slug: String,
    /// The shared text.
    pub content: String,
    /// Whether reading the clip requires a password.
    pub is_private: bool,
    /// Argon2 PHC string; only present for private clips created with a password.
    pub password_hash: Option<String>,
    /// When the clip stops being readable; `None` means never.
    pub expires_at: Option<DateTime<Utc>>,
    /// Whether the clip is deleted after being read.
    pub destroy_on_view: bool,
    /// Number of successful reads.
    pub views: i64,
    /// The time when the clip was added to the database.
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Display for Clip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Clip ID {}\n\tSlug: {}\n\tPrivate: {}\n\tViews: {}\n\tExpires: {}\n",
            self.id,
            self.slug,
            self.is_private,
            self.views,
            self.expires_at
                .map(|e| e.to_rfc3339())
                .unwrap_or_else(|| "never".into())
        )
    }
}

impl From<&Clip> for ClipCreated {
    fn from(clip: &Clip) -> Self {
        Self {
            id: clip.id,
            slug: clip.slug.clone(),
            expires_at: clip.expires_at,
        }
    }
}

impl Clip {
    /// The reader's view of the clip, with `views` replaced by the post-increment count.
    pub fn view(self, views: i64) -> ClipView {
        ClipView {
            id: self.id,
            slug: self.slug,
            content: self.content,
            is_private: self.is_private,
            views,
            expires_at: self.expires_at,
            created_at: self.created_at,
        }
    }
}

/// Everything needed to insert a clip; the store fills in the view counter.
#[derive(Debug, Clone)]
pub struct NewClip {
    pub id: Uuid,
    pub slug: String,
    pub content: String,
    pub is_private: bool,
    pub password_hash: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub destroy_on_view: bool,
    pub created_at: DateTime<Utc>,
}

/// A keyed record store for clips.
///
/// Implementations must make `insert` fail with [`Error::SlugConflict`] rather than
/// overwrite an existing slug, and must make `increment_views` a single atomic
/// increment-and-fetch.
#[async_trait]
pub trait ClipStore: Send + Sync {
    /// Find a clip by its slug, expired or not.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Clip>, Error>;

    /// Insert a new clip with zero views.
    async fn insert(&self, clip: NewClip) -> Result<Clip, Error>;

    /// Add one to the clip's view counter and return the new count, or `None` if the clip
    /// no longer exists.
    async fn increment_views(&self, id: Uuid) -> Result<Option<i64>, Error>;

    /// Delete a clip, returning whether it existed.
    async fn delete(&self, id: Uuid) -> Result<bool, Error>;

    /// Delete every clip that has expired as of `now`, returning how many were removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, Error>;

    /// Check that the store can serve requests, returning how many connections it holds.
    async fn health(&self) -> Result<u32, Error>;
}
