// SPDX-License-Identifier: GPL-2.0-or-later
use thiserror::Error as ThisError;

/// An enumeration of errors clipshare library functions can encounter.
///
/// The first six variants are outcomes a client is told about; everything else is an
/// internal failure whose details stay in the logs.
#[derive(ThisError, Debug)]
pub enum Error {
    #[error("Client request is invalid: {0}")]
    InvalidInput(String),
    #[error("The requested slug is already taken")]
    SlugConflict,
    #[error("Clip not found")]
    NotFound,
    #[error("The clip has expired")]
    Gone,
    #[error("A password is required for this clip")]
    PasswordRequired,
    #[error("Incorrect password")]
    PasswordIncorrect,
    #[error("A database error occurred: {0}")]
    Database(#[from] sqlx::Error),
    #[error("The database migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Password hashing failed: {0}")]
    PasswordHash(argon2::password_hash::Error),
    #[error("Configuration file could not be read: {0}")]
    ConfigReadError(#[from] std::io::Error),
    #[error("Configuration file could not be parsed: {0}")]
    ConfigParseError(#[from] toml::de::Error),
    #[error("Configuration file contains invalid values: {0}")]
    ConfigValueError(String),
    #[error("HTTP server encountered an error: {0}")]
    Server(std::io::Error),
    #[error("Tokio task failed: {0}")]
    TokioTask(#[from] tokio::task::JoinError),
}

impl Error {
    /// True when the error is not the caller's doing and must not be described to them.
    pub fn is_internal(&self) -> bool {
        !matches!(
            self,
            Error::InvalidInput(_)
                | Error::SlugConflict
                | Error::NotFound
                | Error::Gone
                | Error::PasswordRequired
                | Error::PasswordIncorrect
        )
    }
}

pub mod access;
pub mod cli;
pub mod config;
pub mod db;
pub mod lifecycle;
pub mod password;
pub mod service;
pub mod slug;
pub mod store;
pub mod web;
