// SPDX-License-Identifier: GPL-2.0-or-later

//! Decides when a clip stops being readable.
//!
//! Clips die in two ways: their expiry time passes, or they are destroyed after being
//! viewed. Everything here is a pure function of the clip's fields and the current time so
//! the policy can be tested without a database.
use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Duration, Utc};

use crate::Error;

/// The unit of an [`Expiry`] duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Hours,
    Days,
}

/// How long a clip lives after it is created.
///
/// Parsed from the symbolic form clients send: `"never"`, `"<N>h"`, or `"<N>d"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expiry {
    #[default]
    Never,
    After { amount: u32, unit: Unit },
}

impl Expiry {
    /// The absolute expiry time for a clip created at `now`, if it expires at all.
    pub fn expires_at(&self, now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>, Error> {
        let duration = match *self {
            Expiry::Never => return Ok(None),
            Expiry::After {
                amount,
                unit: Unit::Hours,
            } => Duration::try_hours(amount.into()),
            Expiry::After {
                amount,
                unit: Unit::Days,
            } => Duration::try_days(amount.into()),
        };
        duration
            .and_then(|duration| now.checked_add_signed(duration))
            .map(Some)
            .ok_or_else(|| Error::InvalidInput(format!("expiry '{self}' is too far away")))
    }
}

impl FromStr for Expiry {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "never" {
            return Ok(Expiry::Never);
        }
        let invalid = || {
            Error::InvalidInput(format!(
                "expiry '{s}' must be \"never\" or a number of hours or days, like \"2h\" or \"7d\""
            ))
        };

        let split = s.len().checked_sub(1).ok_or_else(invalid)?;
        if !s.is_char_boundary(split) {
            return Err(invalid());
        }
        let (amount, unit) = s.split_at(split);
        let unit = match unit {
            "h" => Unit::Hours,
            "d" => Unit::Days,
            _ => return Err(invalid()),
        };
        if amount.is_empty() || !amount.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        match amount.parse::<u32>() {
            Ok(0) | Err(_) => Err(invalid()),
            Ok(amount) => Ok(Expiry::After { amount, unit }),
        }
    }
}

impl Display for Expiry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expiry::Never => write!(f, "never"),
            Expiry::After {
                amount,
                unit: Unit::Hours,
            } => write!(f, "{amount}h"),
            Expiry::After {
                amount,
                unit: Unit::Days,
            } => write!(f, "{amount}d"),
        }
    }
}

/// A clip is expired once `now` reaches its expiry time; clips without one never expire.
pub fn is_expired(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    expires_at.is_some_and(|expires_at| now >= expires_at)
}

/// The most successful views a destroy-on-view clip allows.
///
/// A private one-shot clip is a secret and is gone after its first view. A public one is
/// readable twice, so its creator can check it once before passing the link on.
pub fn view_limit(is_private: bool, destroy_on_view: bool) -> Option<i64> {
    match (destroy_on_view, is_private) {
        (false, _) => None,
        (true, true) => Some(1),
        (true, false) => Some(2),
    }
}

/// Whether the clip must be deleted once the view that brought it to `views_after` is served.
pub fn should_destroy_after_view(is_private: bool, destroy_on_view: bool, views_after: i64) -> bool {
    view_limit(is_private, destroy_on_view).is_some_and(|limit| views_after >= limit)
}

/// Whether a view that brought the counter to `views_after` came too late to see the content.
///
/// Only possible when concurrent readers race for the last view of a destroy-on-view clip.
pub fn exceeds_view_limit(is_private: bool, destroy_on_view: bool, views_after: i64) -> bool {
    view_limit(is_private, destroy_on_view).is_some_and(|limit| views_after > limit)
}
