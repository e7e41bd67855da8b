//! Timestamp-based note identifiers and the collision-free generator.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// A stable note identifier.
///
/// Identifiers are strings of ASCII digits. Generated ids are a
/// `%Y%m%d%H%M%S` timestamp followed by a five digit counter, e.g.
/// `2024011510300000001`, but any digit string is accepted so that notes
/// created by older tooling keep their ids.
///
/// # Examples
///
/// ```
/// use zet::domain::NoteId;
///
/// let id: NoteId = "2024011510300000001".parse().unwrap();
/// assert_eq!(id.as_str(), "2024011510300000001");
/// assert!("abc".parse::<NoteId>().is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteId(String);

impl NoteId {
    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NoteId(\"{}\")", self.0)
    }
}

/// Error returned when parsing an invalid note id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseNoteIdError {
    value: String,
}

impl fmt::Display for ParseNoteIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid note id '{}': must be a non-empty string of digits",
            self.value
        )
    }
}

impl std::error::Error for ParseNoteIdError {}

impl FromStr for NoteId {
    type Err = ParseNoteIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseNoteIdError {
                value: s.to_string(),
            });
        }
        Ok(Self(s.to_string()))
    }
}

impl Serialize for NoteId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for NoteId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Generates note ids that never collide within one run.
///
/// Each id is the current second followed by a counter that increases
/// monotonically modulo [`IdGenerator::COUNTER_RANGE`]. Ids handed out
/// before, or registered through [`IdGenerator::reserve`], are skipped.
#[derive(Debug, Default)]
pub struct IdGenerator {
    counter: u64,
    taken: HashSet<NoteId>,
}

impl IdGenerator {
    /// Number of distinct counter values per second.
    pub const COUNTER_RANGE: u64 = 100_000;

    /// Creates a generator with no reserved ids.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks an id as already in use.
    ///
    /// Returns `false` if the id was reserved before.
    pub fn reserve(&mut self, id: &NoteId) -> bool {
        self.taken.insert(id.clone())
    }

    /// Returns whether the id is reserved or was generated by this instance.
    pub fn is_taken(&self, id: &NoteId) -> bool {
        self.taken.contains(id)
    }

    /// Generates a fresh id for the current time.
    pub fn next_id(&mut self) -> NoteId {
        self.next_id_at(Utc::now())
    }

    /// Generates a fresh id for the given instant.
    pub fn next_id_at(&mut self, at: DateTime<Utc>) -> NoteId {
        let mut at = at;
        loop {
            let stamp = at.format("%Y%m%d%H%M%S").to_string();
            for _ in 0..Self::COUNTER_RANGE {
                self.counter = (self.counter + 1) % Self::COUNTER_RANGE;
                let id = NoteId(format!("{}{:05}", stamp, self.counter));
                if self.taken.insert(id.clone()) {
                    return id;
                }
            }
            // every counter value of this second is used up
            at += Duration::seconds(1);
        }
    }
}
