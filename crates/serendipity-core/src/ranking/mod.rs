//! Suggestion ranking.
//!
//! Merges event, connection and nudge candidates into one list, adjusts
//! each priority for historical success and goal relevance, then sorts
//! highest first (stable on ties) and caps the output.

mod goals;
mod priority;

pub use goals::GoalMatcher;
pub use priority::{MetricsLookup, PriorityAdjuster};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::events::EventCandidate;
use crate::gaps::{ConnectionSuggestion, CONNECTION_PRIORITY, TOP_INTEREST_COUNT};
use crate::nudge::{NudgeSuggestion, NUDGE_PRIORITY};
use crate::profile::UserProfile;
use crate::storage::RankingConfig;

/// Kind of a suggestion; also the key under which outcomes are recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Event,
    Connection,
    Nudge,
}

impl SuggestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionKind::Event => "event",
            SuggestionKind::Connection => "connection",
            SuggestionKind::Nudge => "nudge",
        }
    }
}

impl std::fmt::Display for SuggestionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Candidate carried by a suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "suggestion", rename_all = "lowercase")]
pub enum SuggestionPayload {
    Event(EventCandidate),
    Connection(ConnectionSuggestion),
    Nudge(NudgeSuggestion),
}

/// One ranked recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub priority: f64,
    pub reasoning: String,
    #[serde(flatten)]
    pub payload: SuggestionPayload,
}

impl Suggestion {
    /// Event suggestion starting from the candidate's confidence.
    pub fn event(candidate: EventCandidate, reasoning: String) -> Self {
        Self {
            priority: candidate.confidence,
            reasoning,
            payload: SuggestionPayload::Event(candidate),
        }
    }

    pub fn connection(candidate: ConnectionSuggestion) -> Self {
        Self {
            priority: CONNECTION_PRIORITY,
            reasoning: candidate.reasoning(),
            payload: SuggestionPayload::Connection(candidate),
        }
    }

    pub fn nudge(candidate: NudgeSuggestion) -> Self {
        Self {
            priority: NUDGE_PRIORITY,
            reasoning: candidate.reasoning(),
            payload: SuggestionPayload::Nudge(candidate),
        }
    }

    pub fn kind(&self) -> SuggestionKind {
        match self.payload {
            SuggestionPayload::Event(_) => SuggestionKind::Event,
            SuggestionPayload::Connection(_) => SuggestionKind::Connection,
            SuggestionPayload::Nudge(_) => SuggestionKind::Nudge,
        }
    }
}

/// Reasoning line for an event: which top interests it mentions.
pub fn event_reasoning(candidate: &EventCandidate, profile: &UserProfile) -> String {
    let text = candidate.search_text();
    let matched: Vec<&str> = profile
        .top_interests(TOP_INTEREST_COUNT)
        .into_iter()
        .filter(|interest| text.contains(&interest.to_lowercase()))
        .collect();
    format!("Event matches interests: {}", matched.join(", "))
}

/// Candidate streams feeding one ranking run.
#[derive(Debug, Clone, Default)]
pub struct Candidates {
    pub events: Vec<EventCandidate>,
    pub connections: Vec<ConnectionSuggestion>,
    pub nudges: Vec<NudgeSuggestion>,
}

/// Stable sort, highest priority first.
pub fn sort_by_priority(suggestions: &mut [Suggestion]) {
    suggestions.sort_by(|a, b| {
        b.priority
            .partial_cmp(&a.priority)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Merge, adjust, sort and cap.
///
/// Pure apart from reading `metrics`.
pub fn rank<M: MetricsLookup + ?Sized>(
    candidates: Candidates,
    goals: &[String],
    profile: &UserProfile,
    metrics: &M,
    config: &RankingConfig,
) -> Vec<Suggestion> {
    let mut suggestions: Vec<Suggestion> = Vec::with_capacity(
        candidates.events.len() + candidates.connections.len() + candidates.nudges.len(),
    );
    suggestions.extend(candidates.events.into_iter().map(|e| {
        let reasoning = event_reasoning(&e, profile);
        Suggestion::event(e, reasoning)
    }));
    suggestions.extend(candidates.connections.into_iter().map(Suggestion::connection));
    suggestions.extend(candidates.nudges.into_iter().map(Suggestion::nudge));

    let adjuster = PriorityAdjuster::new(&profile.id, goals, metrics, config);
    for suggestion in &mut suggestions {
        let adjusted = adjuster.adjust(suggestion);
        debug!(
            kind = %suggestion.kind(),
            base = suggestion.priority,
            adjusted,
            "adjusted priority"
        );
        suggestion.priority = adjusted;
    }

    sort_by_priority(&mut suggestions);
    suggestions.truncate(config.max_suggestions);
    suggestions
}
