//! Routine nudges derived from reliable event sources.

use serde::{Deserialize, Serialize};

use crate::profile::UserProfile;

/// Source success rate above which its type counts as an established routine.
pub const ROUTINE_SUCCESS_RATE: f64 = 0.7;

/// Base priority of a routine nudge.
pub const NUDGE_PRIORITY: f64 = 0.6;

/// A behavioural suggestion for the user's routine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NudgeSuggestion {
    pub action: String,
    pub context: String,
    pub expected_outcome: String,
    pub timing: String,
}

impl NudgeSuggestion {
    pub fn reasoning(&self) -> String {
        "Consistent engagement leads to stronger network connections".to_string()
    }
}

/// Source types whose success rate exceeds [`ROUTINE_SUCCESS_RATE`], in source order.
pub fn routine_patterns(profile: &UserProfile) -> Vec<&str> {
    profile
        .event_sources
        .iter()
        .filter(|s| s.success_rate > ROUTINE_SUCCESS_RATE)
        .map(|s| s.source_type.as_str())
        .collect()
}

/// At most one nudge, built around the first routine pattern.
pub fn suggest_nudges(profile: &UserProfile) -> Vec<NudgeSuggestion> {
    routine_patterns(profile)
        .first()
        .map(|pattern| NudgeSuggestion {
            action: "Schedule regular attendance".into(),
            context: format!("Regular participation in {pattern} events"),
            expected_outcome: "Strengthen network connections and stay updated in field".into(),
            timing: "Weekly".into(),
        })
        .into_iter()
        .collect()
}
