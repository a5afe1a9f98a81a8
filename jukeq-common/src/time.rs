//! HH:MM:SS duration handling
//!
//! The queue server expresses every song duration as a fixed-format
//! `HH:MM:SS` string, both in REST responses and in push-channel event
//! payloads. [`Hms`] is that wire format: a whole-second duration that
//! serializes to/from the three-field colon form.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};

/// A whole-second duration carried on the wire as `HH:MM:SS`.
///
/// Hours are zero-padded to two digits but not capped, so durations of
/// 100 hours and up render with three-digit hour fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Hms(u64);

impl Hms {
    /// Construct from a whole number of seconds.
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Total seconds.
    pub const fn as_secs(&self) -> u64 {
        self.0
    }

    /// Total milliseconds, for comparison against player positions.
    pub const fn as_millis(&self) -> u64 {
        self.0 * 1000
    }

    /// True for the zero duration (used by failure notices that carry no
    /// real song data).
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Hms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hours = self.0 / 3600;
        let mins = (self.0 / 60) % 60;
        let secs = self.0 % 60;
        write!(f, "{:02}:{:02}:{:02}", hours, mins, secs)
    }
}

impl FromStr for Hms {
    type Err = Error;

    /// Parse `HH:MM:SS`. Exactly three colon-separated numeric fields are
    /// required; minute/second fields above 59 are rejected.
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 3 {
            return Err(Error::InvalidDuration(s.to_string()));
        }

        let field = |p: &str| -> Result<u64> {
            if p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()) {
                return Err(Error::InvalidDuration(s.to_string()));
            }
            p.parse::<u64>()
                .map_err(|_| Error::InvalidDuration(s.to_string()))
        };

        let hours = field(parts[0])?;
        let mins = field(parts[1])?;
        let secs = field(parts[2])?;
        if mins > 59 || secs > 59 {
            return Err(Error::InvalidDuration(s.to_string()));
        }

        Ok(Self(hours * 3600 + mins * 60 + secs))
    }
}

impl Serialize for Hms {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Hms {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Format a millisecond position as `HH:MM:SS` for display next to a
/// song's total duration. Sub-second remainders are truncated.
pub fn format_position_ms(position_ms: u64) -> String {
    Hms::from_secs(position_ms / 1000).to_string()
}
