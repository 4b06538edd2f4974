//! User profile data model.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Confidence below which a contact counts as a gap.
pub const GAP_THRESHOLD: f64 = 0.3;
/// Confidence at or above which a contact counts as a strong connection.
pub const STRONG_THRESHOLD: f64 = 0.7;

/// Clamp a weight, confidence or rate into [0, 1]. NaN becomes 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// CSS-like selectors used to pull event fields out of a source page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceSelectors {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl SourceSelectors {
    /// Fill unset fields from `defaults`.
    pub fn or(&self, defaults: &SourceSelectors) -> SourceSelectors {
        SourceSelectors {
            title: self.title.clone().or_else(|| defaults.title.clone()),
            description: self
                .description
                .clone()
                .or_else(|| defaults.description.clone()),
            datetime: self.datetime.clone().or_else(|| defaults.datetime.clone()),
            location: self.location.clone().or_else(|| defaults.location.clone()),
        }
    }
}

/// A configured place to scrape events from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSourceConfig {
    pub url: String,
    /// Source family, e.g. "meetup", "eventbrite", "custom".
    #[serde(rename = "type")]
    pub source_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selectors: Option<SourceSelectors>,
    #[serde(default)]
    pub last_scraped: Option<DateTime<Utc>>,
    /// Exponential moving average of scrape success.
    #[serde(default = "default_success_rate")]
    pub success_rate: f64,
}

fn default_success_rate() -> f64 {
    1.0
}

impl EventSourceConfig {
    pub fn new(url: impl Into<String>, source_type: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            source_type: source_type.into(),
            selectors: None,
            last_scraped: None,
            success_rate: default_success_rate(),
        }
    }

    pub fn with_selectors(mut self, selectors: SourceSelectors) -> Self {
        self.selectors = Some(selectors);
        self
    }

    pub fn with_success_rate(mut self, rate: f64) -> Self {
        self.success_rate = clamp_unit(rate);
        self
    }

    /// Fold one scrape outcome into the moving average.
    pub fn record_scrape(&mut self, success: bool, at: DateTime<Utc>) {
        let hit = if success { 1.0 } else { 0.0 };
        self.success_rate = clamp_unit(self.success_rate * 0.9 + hit * 0.1);
        self.last_scraped = Some(at);
    }
}

/// One contact in the user's network graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConnection {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub skills: BTreeSet<String>,
    #[serde(default)]
    pub interests: BTreeSet<String>,
    pub confidence: f64,
}

impl NetworkConnection {
    pub fn new(id: impl Into<String>, name: impl Into<String>, confidence: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            skills: BTreeSet::new(),
            interests: BTreeSet::new(),
            confidence: clamp_unit(confidence),
        }
    }

    pub fn with_interests<I, S>(mut self, interests: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interests.extend(interests.into_iter().map(Into::into));
        self
    }

    pub fn with_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skills.extend(skills.into_iter().map(Into::into));
        self
    }

    pub fn is_gap(&self) -> bool {
        self.confidence < GAP_THRESHOLD
    }

    pub fn is_strong(&self) -> bool {
        self.confidence >= STRONG_THRESHOLD
    }
}

/// Success/total counters for one action kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionStats {
    pub success: u32,
    pub total: u32,
}

impl ActionStats {
    pub fn record(&mut self, success: bool) {
        self.total += 1;
        if success {
            self.success += 1;
        }
    }

    /// Priority multiplier `0.5 + success/total`, or `None` without history.
    pub fn multiplier(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(0.5 + f64::from(self.success) / f64::from(self.total))
        }
    }
}

/// A user as seen by the engine. The engine only ever reads a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub location: String,
    #[serde(default = "default_availability")]
    pub availability: String,
    /// Topic weights in insertion order.
    #[serde(default)]
    pub interests: IndexMap<String, f64>,
    #[serde(default)]
    pub network: IndexMap<String, NetworkConnection>,
    #[serde(default)]
    pub event_sources: Vec<EventSourceConfig>,
    #[serde(default)]
    pub success_metrics: HashMap<String, ActionStats>,
}

fn default_availability() -> String {
    "anytime".to_string()
}

impl UserProfile {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: String::new(),
            location: String::new(),
            availability: default_availability(),
            interests: IndexMap::new(),
            network: IndexMap::new(),
            event_sources: Vec::new(),
            success_metrics: HashMap::new(),
        }
    }

    pub fn with_interest(mut self, topic: impl Into<String>, weight: f64) -> Self {
        self.interests.insert(topic.into(), clamp_unit(weight));
        self
    }

    pub fn with_connection(mut self, connection: NetworkConnection) -> Self {
        self.network.insert(connection.id.clone(), connection);
        self
    }

    pub fn with_source(mut self, source: EventSourceConfig) -> Self {
        self.event_sources.push(source);
        self
    }

    /// The `n` highest-weighted interests; equal weights keep insertion order.
    pub fn top_interests(&self, n: usize) -> Vec<&str> {
        let mut ranked: Vec<(&String, &f64)> = self.interests.iter().collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.into_iter().take(n).map(|(t, _)| t.as_str()).collect()
    }

    pub fn strong_connections(&self) -> impl Iterator<Item = &NetworkConnection> {
        self.network.values().filter(|c| c.is_strong())
    }
}
