//! Salted, date-bucketed IP hashing
//!
//! The same address hashes to the same value for the whole calendar day and
//! to a different value the next day, which is enough to count unique
//! visitors per day without storing anything reversible.

use chrono::{DateTime, TimeZone};
use sha2::{Digest, Sha256};

/// Hash `ip` for the calendar day of `at`.
///
/// Returns an empty string when either `ip` or `salt` is empty.
pub fn anonymize<Tz: TimeZone>(ip: &str, salt: &str, at: &DateTime<Tz>) -> String {
    if ip.is_empty() || salt.is_empty() {
        return String::new();
    }

    let date = at.date_naive().format("%Y-%m-%d").to_string();

    let mut hasher = Sha256::new();
    hasher.update(ip.as_bytes());
    hasher.update(date.as_bytes());
    hasher.update(salt.as_bytes());

    format!("{:x}", hasher.finalize())
}

/// Holds the process-wide salt
#[derive(Clone)]
pub struct Anonymizer {
    salt: String,
}

impl Anonymizer {
    pub fn new(salt: impl Into<String>) -> Self {
        Self { salt: salt.into() }
    }

    pub fn anonymize<Tz: TimeZone>(&self, ip: &str, at: &DateTime<Tz>) -> String {
        anonymize(ip, &self.salt, at)
    }

    pub fn has_salt(&self) -> bool {
        !self.salt.is_empty()
    }
}

impl std::fmt::Debug for Anonymizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Anonymizer")
            .field("salt", &"<redacted>")
            .finish()
    }
}
