//! Chapter domain model

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a chapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChapterId(Uuid);

impl ChapterId {
    /// Creates a new random ChapterId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a ChapterId from a UUID string
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }

    /// Returns the ChapterId as a string
    pub fn as_string(&self) -> String {
        self.0.to_string()
    }
}

impl Default for ChapterId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry in a book's table of contents.
///
/// The raw URL is either absolute (used verbatim) or relative to a
/// source's media base. Immutable once extracted from the book page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    pub id: ChapterId,
    pub name: String,
    pub url: String,
    pub duration: String,
}

impl Chapter {
    /// Creates a chapter, normalizing the duration string.
    ///
    /// Durations containing `:` are kept verbatim. Bare numeric strings
    /// are treated as seconds and rendered `HH:MM:SS` when at least an
    /// hour long, `MM:SS` otherwise. Empty input stays empty (unknown);
    /// anything else becomes `00:00`.
    pub fn new(name: impl Into<String>, url: impl Into<String>, duration: &str) -> Self {
        Self {
            id: ChapterId::new(),
            name: name.into(),
            url: url.into(),
            duration: normalize_duration(duration),
        }
    }

    /// Parses the duration back into whole seconds (0 when unknown or
    /// unparseable).
    pub fn duration_seconds(&self) -> u64 {
        parse_duration_seconds(&self.duration)
    }
}

fn normalize_duration(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }
    if raw.contains(':') {
        return raw.to_string();
    }
    match raw.parse::<f64>() {
        Ok(seconds) if seconds >= 0.0 => {
            let total = seconds as u64;
            let hours = total / 3600;
            let minutes = (total % 3600) / 60;
            let secs = total % 60;
            if hours > 0 {
                format!("{:02}:{:02}:{:02}", hours, minutes, secs)
            } else {
                format!("{:02}:{:02}", minutes, secs)
            }
        }
        _ => "00:00".to_string(),
    }
}

fn parse_duration_seconds(duration: &str) -> u64 {
    let parts: Vec<&str> = duration.split(':').collect();
    let num = |s: &str| s.trim().parse::<u64>().unwrap_or(0);
    match parts.as_slice() {
        [h, m, s] => num(h) * 3600 + num(m) * 60 + num(s),
        [m, s] => num(m) * 60 + num(s),
        [s] => num(s),
        _ => 0,
    }
}

/// Sums chapter durations and renders a display total like `5 hr 42 min`.
pub fn total_duration(chapters: &[Chapter]) -> String {
    let total: u64 = chapters.iter().map(Chapter::duration_seconds).sum();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    if hours > 0 {
        format!("{} hr {} min", hours, minutes)
    } else {
        format!("{} min", minutes)
    }
}
