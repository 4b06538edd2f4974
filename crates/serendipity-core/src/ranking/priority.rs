//! Priority adjustment for wrapped suggestions.
//!
//! Adjusts a suggestion's base priority by:
//! - Historical success of its kind (multiplier `0.5 + success/total`)
//! - Relevance to the user's stated goals (flat boost)
//!
//! then clamps the result to at most 1 (and at least 0 when configured).

use super::goals::GoalMatcher;
use super::{Suggestion, SuggestionPayload};
use crate::profile::{ActionStats, ProfileStore};
use crate::storage::RankingConfig;

/// Source of historical success counters, keyed by actor and action kind.
pub trait MetricsLookup {
    fn stats_for(&self, actor_id: &str, action: &str) -> Option<ActionStats>;
}

impl<S: ProfileStore + ?Sized> MetricsLookup for S {
    fn stats_for(&self, actor_id: &str, action: &str) -> Option<ActionStats> {
        self.action_stats(actor_id, action)
    }
}

/// Applies success and goal adjustments for one user's ranking run.
pub struct PriorityAdjuster<'a, M: MetricsLookup + ?Sized> {
    user_id: &'a str,
    goals: GoalMatcher,
    metrics: &'a M,
    config: &'a RankingConfig,
}

impl<'a, M: MetricsLookup + ?Sized> PriorityAdjuster<'a, M> {
    pub fn new(
        user_id: &'a str,
        goals: &[String],
        metrics: &'a M,
        config: &'a RankingConfig,
    ) -> Self {
        Self {
            user_id,
            goals: GoalMatcher::new(goals),
            metrics,
            config,
        }
    }

    /// Whose history drives the multiplier: the contact for introductions,
    /// the user for everything else.
    fn actor<'s>(&'s self, suggestion: &'s Suggestion) -> &'s str {
        match &suggestion.payload {
            SuggestionPayload::Connection(c) => &c.contact,
            _ => self.user_id,
        }
    }

    fn success_multiplier(&self, suggestion: &Suggestion) -> Option<f64> {
        self.metrics
            .stats_for(self.actor(suggestion), suggestion.kind().as_str())
            .and_then(|stats| stats.multiplier())
    }

    fn goal_text(suggestion: &Suggestion) -> String {
        match &suggestion.payload {
            SuggestionPayload::Event(e) => format!("{} {}", e.title, e.description),
            _ => suggestion.reasoning.clone(),
        }
    }

    fn clamp(&self, priority: f64) -> f64 {
        let upper = priority.min(1.0);
        if self.config.clamp_lower {
            upper.max(0.0)
        } else {
            upper
        }
    }

    /// Final priority for `suggestion`, starting from its current priority.
    pub fn adjust(&self, suggestion: &Suggestion) -> f64 {
        let mut priority = suggestion.priority;

        if let Some(multiplier) = self.success_multiplier(suggestion) {
            priority *= multiplier;
        }

        if !self.goals.is_empty() && self.goals.matches(&Self::goal_text(suggestion)) {
            priority += self.config.goal_boost;
        }

        self.clamp(priority)
    }
}
