// SPDX-License-Identifier: GPL-2.0-or-later
//
// Provides the SQLite implementation of the clip store.
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    types::Uuid,
    SqlitePool,
};
use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::store::{Clip, ClipStore, NewClip};
use crate::Error;

static MIGRATIONS: sqlx::migrate::Migrator = sqlx::migrate!("./migrations/");

/// A [`ClipStore`] backed by a SQLite connection pool.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Wrap an existing pool; the schema must already be migrated.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database in the configured data directory and
    /// migrate it.
    ///
    /// Every connection waits at most `store.timeout_secs` for a pool slot or a database
    /// lock before failing.
    pub async fn connect(config: &Config) -> Result<Self, Error> {
        let options = SqliteConnectOptions::from_str(&config.database_url())?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(config.store.timeout());
        let pool = SqlitePoolOptions::new()
            .max_connections(config.store.max_connections)
            .acquire_timeout(config.store.timeout())
            .connect_with(options)
            .await?;
        debug!("Connected to the database; running migrations");
        MIGRATIONS.run(&pool).await?;
        Ok(Self::new(pool))
    }

    /// A private, migrated, in-memory database. Its contents vanish with the store.
    pub async fn in_memory() -> Result<Self, Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        // Every connection to :memory: is a separate database, so there can only be one.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        MIGRATIONS.run(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl ClipStore for SqliteStore {
    #[instrument(skip(self))]
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Clip>, Error> {
        sqlx::query_as::<_, Clip>(
            "
            SELECT *
            FROM clips
            WHERE slug = ?;
            ",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)
    }

    /// Insert a new clip.
    ///
    /// # Returns
    ///
    /// The newly-added Clip, or [`Error::SlugConflict`] if the slug is already in the table.
    #[instrument(skip_all, fields(slug = %clip.slug))]
    async fn insert(&self, clip: NewClip) -> Result<Clip, Error> {
        let insert_result = sqlx::query_as::<_, Clip>(
            "
            INSERT INTO clips
                (id, slug, content, is_private, password_hash, expires_at, destroy_on_view, views, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?)
            RETURNING *;
            ",
        )
        .bind(clip.id)
        .bind(&clip.slug)
        .bind(&clip.content)
        .bind(clip.is_private)
        .bind(&clip.password_hash)
        .bind(clip.expires_at)
        .bind(clip.destroy_on_view)
        .bind(clip.created_at)
        .fetch_one(&self.pool)
        .await;
        match insert_result {
            Ok(clip) => {
                info!(id = %clip.id, "Added clip");
                Ok(clip)
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(Error::SlugConflict),
            Err(e) => Err(Error::Database(e)),
        }
    }

    /// Increment the view counter in a single statement so concurrent readers each see a
    /// distinct count.
    #[instrument(skip(self))]
    async fn increment_views(&self, id: Uuid) -> Result<Option<i64>, Error> {
        sqlx::query_scalar::<_, i64>(
            "
            UPDATE clips
            SET views = views + 1
            WHERE id = ?
            RETURNING views;
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> Result<bool, Error> {
        sqlx::query(
            "
            DELETE FROM clips
            WHERE id = ?;
            ",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_or_else(
            |e| Err(Error::Database(e)),
            |delete| Ok(delete.rows_affected() > 0),
        )
    }

    /// Delete expired clips.
    ///
    /// `julianday` rounds to the millisecond, so the comparison is strict: a clip within the
    /// same millisecond as `now` is left for the next sweep rather than removed early.
    #[instrument(skip(self))]
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, Error> {
        sqlx::query(
            "
            DELETE FROM clips
            WHERE expires_at IS NOT NULL AND julianday(expires_at) < julianday(?);
            ",
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_or_else(
            |e| Err(Error::Database(e)),
            |delete| Ok(delete.rows_affected()),
        )
    }

    #[instrument(skip(self))]
    async fn health(&self) -> Result<u32, Error> {
        let _conn = self.pool.acquire().await?;
        Ok(self.pool.size())
    }
}
