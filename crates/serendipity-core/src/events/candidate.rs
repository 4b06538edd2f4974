//! Event candidates and the raw records they are built from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Field strings pulled from one element index of a source page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEventRecord {
    pub title: String,
    pub description: String,
    pub datetime: String,
    pub venue: String,
}

/// A scraped, normalized event awaiting scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventCandidate {
    pub title: String,
    pub description: String,
    pub url: String,
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    /// URL of the source the event was scraped from.
    pub source: String,
    pub confidence: f64,
}

impl EventCandidate {
    /// Identity used for deduplication: `title|startTime|venue`.
    pub fn dedup_key(&self) -> String {
        format!(
            "{}|{}|{}",
            self.title,
            self.start_time.map(|t| t.to_rfc3339()).unwrap_or_default(),
            self.venue.as_deref().unwrap_or_default()
        )
    }

    /// Lower-cased `title description`, the text interests are matched against.
    pub fn search_text(&self) -> String {
        format!("{} {}", self.title, self.description).to_lowercase()
    }
}

/// Inclusive window an aggregation run is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeframe {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Timeframe {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::InvalidTimeframe { start, end });
        }
        Ok(Self { start, end })
    }

    /// Events without a known start time are never excluded.
    pub fn admits(&self, candidate: &EventCandidate) -> bool {
        match candidate.start_time {
            Some(t) => t >= self.start && t <= self.end,
            None => true,
        }
    }
}
