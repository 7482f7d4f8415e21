// SPDX-License-Identifier: GPL-2.0-or-later

//! One-way password hashing for private clips.
//!
//! Hashes are Argon2id PHC strings. Both hashing and verification are deliberately slow, so
//! the async wrappers move the work onto tokio's blocking thread pool.
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use tracing::instrument;

use crate::Error;

#[derive(Debug, Clone, Default)]
pub struct Hasher {
    params: Params,
}

impl Hasher {
    pub fn new(params: Params) -> Self {
        Self { params }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password with a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<String, Error> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(Error::PasswordHash)
    }

    /// Check a password against a stored hash.
    ///
    /// A mismatch is `Ok(false)`; a hash that can't be parsed is an error.
    pub fn verify(&self, password: &str, password_hash: &str) -> Result<bool, Error> {
        let parsed_hash = PasswordHash::new(password_hash).map_err(Error::PasswordHash)?;
        match self
            .argon2()
            .verify_password(password.as_bytes(), &parsed_hash)
        {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(Error::PasswordHash(e)),
        }
    }

    #[instrument(skip_all)]
    pub async fn hash_blocking(&self, password: String) -> Result<String, Error> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password)).await?
    }

    #[instrument(skip_all)]
    pub async fn verify_blocking(
        &self,
        password: String,
        password_hash: String,
    ) -> Result<bool, Error> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &password_hash)).await?
    }
}
