// SPDX-License-Identifier: GPL-2.0-or-later
//
// Decides whether a reader may see a clip's content.
use tracing::instrument;

use crate::password::Hasher;
use crate::store::Clip;
use crate::Error;

/// The outcome of checking a reader's password against a clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    /// The clip is private and the reader didn't offer a password.
    PasswordRequired,
    /// The reader offered a password and it didn't match.
    PasswordIncorrect,
}

impl Access {
    /// Turn a refusal into the matching error.
    pub fn into_result(self) -> Result<(), Error> {
        match self {
            Access::Granted => Ok(()),
            Access::PasswordRequired => Err(Error::PasswordRequired),
            Access::PasswordIncorrect => Err(Error::PasswordIncorrect),
        }
    }
}

/// Check a reader's password against a clip.
///
/// Public clips are always readable. An empty password counts as no password. A private
/// clip created without a password has no hash, so every password is incorrect for it.
///
/// This has no side effects and may be called any number of times for a request.
#[instrument(skip_all, fields(slug = %clip.slug, private = clip.is_private))]
pub async fn check_access(
    hasher: &Hasher,
    clip: &Clip,
    supplied_password: Option<&str>,
) -> Result<Access, Error> {
    if !clip.is_private {
        return Ok(Access::Granted);
    }
    let password = match supplied_password {
        Some(password) if !password.is_empty() => password,
        _ => return Ok(Access::PasswordRequired),
    };
    let password_hash = match &clip.password_hash {
        Some(password_hash) => password_hash,
        None => return Ok(Access::PasswordIncorrect),
    };

    let matches = hasher
        .verify_blocking(password.to_owned(), password_hash.clone())
        .await?;
    Ok(if matches {
        Access::Granted
    } else {
        Access::PasswordIncorrect
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use sqlx::types::Uuid;

    use super::*;
    use crate::password::tests::fast_hasher;

    fn clip(is_private: bool, password_hash: Option<String>) -> Clip {
        Clip {
            id: Uuid::new_v4(),
            slug: "guarded".into(),
            content: "secret".into(),
            is_private,
            password_hash,
            expires_at: None,
            destroy_on_view: false,
            views: 0,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn public_clips_are_always_granted() {
        let hasher = fast_hasher();
        let clip = clip(false, None);

        for password in [None, Some(""), Some("anything")] {
            assert_eq!(
                check_access(&hasher, &clip, password).await.unwrap(),
                Access::Granted
            );
        }
    }

    #[tokio::test]
    async fn private_clip_with_password() {
        let hasher = fast_hasher();
        let clip = clip(true, Some(hasher.hash("p").unwrap()));

        assert_eq!(
            check_access(&hasher, &clip, None).await.unwrap(),
            Access::PasswordRequired
        );
        assert_eq!(
            check_access(&hasher, &clip, Some("")).await.unwrap(),
            Access::PasswordRequired
        );
        assert_eq!(
            check_access(&hasher, &clip, Some("wrong")).await.unwrap(),
            Access::PasswordIncorrect
        );
        assert_eq!(
            check_access(&hasher, &clip, Some("p")).await.unwrap(),
            Access::Granted
        );
        // Checking again gives the same answer.
        assert_eq!(
            check_access(&hasher, &clip, Some("p")).await.unwrap(),
            Access::Granted
        );
    }

    #[tokio::test]
    async fn private_clip_without_password_never_unlocks() {
        let hasher = fast_hasher();
        let clip = clip(true, None);

        assert_eq!(
            check_access(&hasher, &clip, None).await.unwrap(),
            Access::PasswordRequired
        );
        assert_eq!(
            check_access(&hasher, &clip, Some("anything")).await.unwrap(),
            Access::PasswordIncorrect
        );
    }

    #[tokio::test]
    async fn corrupt_hash_is_internal() {
        let hasher = fast_hasher();
        let clip = clip(true, Some("garbage".into()));

        let err = check_access(&hasher, &clip, Some("p")).await.unwrap_err();
        assert!(err.is_internal());
    }

    #[test]
    fn refusals_become_errors() {
        assert!(Access::Granted.into_result().is_ok());
        assert!(matches!(
            Access::PasswordRequired.into_result(),
            Err(Error::PasswordRequired)
        ));
        assert!(matches!(
            Access::PasswordIncorrect.into_result(),
            Err(Error::PasswordIncorrect)
        ));
    }
}
