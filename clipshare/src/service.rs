// SPDX-License-Identifier: GPL-2.0-or-later

//! Creation and retrieval of clips.
//!
//! [`ClipService`] ties the slug, password, and lifecycle rules to a [`ClipStore`]. It holds
//! no mutable state of its own: every operation is a handful of store round-trips, and the
//! only contended value, the view counter, is changed with the store's atomic increment.
use chrono::{DateTime, Utc};
use clipshare_api_structs::{ClipCreated, ClipView, CreateClip};
use sqlx::types::Uuid;
use clipshare_api_structs::Status;
use tracing::{error, info, instrument, warn};
use ulid::Ulid;

use crate::access::check_access;
use crate::config::Config;
use crate::lifecycle::{self, Expiry};
use crate::password::Hasher;
use crate::slug;
use crate::store::{ClipStore, NewClip};
use crate::Error;

/// How many generated slugs to try before giving up on a run of collisions.
const MAX_SLUG_ATTEMPTS: usize = 3;

#[derive(Debug, Clone)]
pub struct ClipService<S> {
    store: S,
    hasher: Hasher,
    max_content_bytes: usize,
}

impl<S: ClipStore> ClipService<S> {
    pub fn new(store: S, hasher: Hasher, max_content_bytes: usize) -> Self {
        Self {
            store,
            hasher,
            max_content_bytes,
        }
    }

    pub fn from_config(store: S, config: &Config) -> Result<Self, Error> {
        Ok(Self::new(
            store,
            Hasher::new(config.password.params()?),
            config.clips.max_content_bytes,
        ))
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create a new clip.
    ///
    /// # Arguments
    ///
    /// `request` - The clip to create. The password is only used for private clips, and an
    ///             empty custom slug is the same as none.
    ///
    /// `now` - The creation time; expiry is measured from here.
    ///
    /// # Returns
    ///
    /// The new clip's id, slug, and expiry time, or [`Error::InvalidInput`] if the request
    /// is malformed, or [`Error::SlugConflict`] if the custom slug belongs to a live clip.
    #[instrument(skip_all, fields(private = request.is_private, destroy_on_view = request.destroy_on_view))]
    pub async fn create(
        &self,
        request: CreateClip,
        now: DateTime<Utc>,
    ) -> Result<ClipCreated, Error> {
        if request.content.is_empty() {
            return Err(Error::InvalidInput("content is required".into()));
        }
        if request.content.len() > self.max_content_bytes {
            return Err(Error::InvalidInput(format!(
                "content must be at most {} bytes",
                self.max_content_bytes
            )));
        }

        let expiry = match request.expires_in.as_deref() {
            Some(expires_in) => expires_in.parse::<Expiry>()?,
            None => Expiry::Never,
        };
        let expires_at = expiry.expires_at(now)?;

        let custom_slug = request.custom_slug.filter(|s| !s.is_empty());
        if let Some(custom_slug) = &custom_slug {
            if !slug::validate(custom_slug) {
                return Err(Error::InvalidInput(
                    "custom slugs may only contain letters, digits, '-' and '_', up to 64 characters"
                        .into(),
                ));
            }
            self.claim_slug(custom_slug, now).await?;
        }

        let password_hash = match request.password {
            Some(password) if request.is_private && !password.is_empty() => {
                Some(self.hasher.hash_blocking(password).await?)
            }
            _ => None,
        };

        let mut new_clip = NewClip {
            id: Uuid::from_u128(Ulid::new().0),
            slug: custom_slug.clone().unwrap_or_else(slug::generate),
            content: request.content,
            is_private: request.is_private,
            password_hash,
            expires_at,
            destroy_on_view: request.destroy_on_view,
            created_at: now,
        };

        let clip = if custom_slug.is_some() {
            self.store.insert(new_clip).await?
        } else {
            let mut attempt = 1;
            loop {
                match self.store.insert(new_clip.clone()).await {
                    Err(Error::SlugConflict) if attempt < MAX_SLUG_ATTEMPTS => {
                        warn!(slug = %new_clip.slug, "Generated slug collided; trying another");
                        new_clip.slug = slug::generate();
                        attempt += 1;
                    }
                    result => break result?,
                }
            }
        };

        Ok((&clip).into())
    }

    /// Make sure a custom slug is free, deleting an expired clip that still holds it.
    async fn claim_slug(&self, custom_slug: &str, now: DateTime<Utc>) -> Result<(), Error> {
        match self.store.find_by_slug(custom_slug).await? {
            None => Ok(()),
            Some(existing) if lifecycle::is_expired(existing.expires_at, now) => {
                info!(slug = custom_slug, "Releasing the slug of an expired clip");
                self.store.delete(existing.id).await?;
                Ok(())
            }
            Some(_) => Err(Error::SlugConflict),
        }
    }

    /// Read a clip, counting the view and destroying the clip if this was its last one.
    ///
    /// The checks run in a fixed order: existence, expiry, password, then the view counter.
    /// Only a request that passes all of them increments `views`.
    ///
    /// # Returns
    ///
    /// The clip's content and metadata. [`Error::NotFound`] if the slug is unknown,
    /// [`Error::Gone`] if the clip expired (it is deleted), and
    /// [`Error::PasswordRequired`] or [`Error::PasswordIncorrect`] if the reader may not see
    /// a private clip.
    #[instrument(skip(self, password))]
    pub async fn retrieve(
        &self,
        slug: &str,
        password: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<ClipView, Error> {
        let clip = self
            .store
            .find_by_slug(slug)
            .await?
            .ok_or(Error::NotFound)?;

        if lifecycle::is_expired(clip.expires_at, now) {
            self.store.delete(clip.id).await?;
            info!(id = %clip.id, "Deleted expired clip");
            return Err(Error::Gone);
        }

        check_access(&self.hasher, &clip, password)
            .await?
            .into_result()?;

        // Deleted between the lookup and now, most likely by a concurrent final view.
        let views = self
            .store
            .increment_views(clip.id)
            .await?
            .ok_or(Error::NotFound)?;

        if lifecycle::exceeds_view_limit(clip.is_private, clip.destroy_on_view, views) {
            warn!(id = %clip.id, views, "Lost the race for the last view of a clip");
            self.store.delete(clip.id).await?;
            return Err(Error::NotFound);
        }

        let id = clip.id;
        let destroy = lifecycle::should_destroy_after_view(clip.is_private, clip.destroy_on_view, views);
        let view = clip.view(views);
        if destroy {
            // The view is already counted, so the reader gets the content even if the delete
            // fails. Any later reader exceeds the view limit and retries the delete.
            match self.store.delete(id).await {
                Ok(_) => info!(%id, views, "Destroyed clip after its final view"),
                Err(e) => error!(%id, views, "Failed to destroy clip after its final view: {}", e),
            }
        }
        Ok(view)
    }

    /// Report whether the store is reachable.
    #[instrument(skip(self))]
    pub async fn status(&self) -> Result<Status, Error> {
        let db_connections = self.store.health().await?;
        Ok(Status { db_connections })
    }

    /// Delete every clip that expired before `now`.
    #[instrument(skip(self))]
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, Error> {
        let purged = self.store.purge_expired(now).await?;
        if purged > 0 {
            info!(purged, "Purged expired clips");
        }
        Ok(purged)
    }
}
