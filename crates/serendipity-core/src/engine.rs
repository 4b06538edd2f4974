//! Serendipity engine.
//!
//! Long-lived service object owning every collaborator a ranking run needs.
//! One run is aggregate, analyze gaps, generate nudges, rank, remember and
//! record outcomes, for a single user.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::{CoreError, FetchError, Result};
use crate::events::{AggregationReport, EventAggregator, Timeframe};
use crate::gaps::find_gaps;
use crate::memory::{SuggestionMemory, SuggestionMemoryEntry};
use crate::nudge::suggest_nudges;
use crate::profile::{ProfileStore, UserProfile};
use crate::ranking::{rank, Candidates, Suggestion};
use crate::sources::{Extractor, Fetcher};
use crate::storage::EngineConfig;

/// Inputs of one ranking run besides the user.
#[derive(Debug, Clone, Default)]
pub struct RankingRequest {
    /// Free-text goals; suggestions mentioning them get a priority boost.
    pub goals: Vec<String>,
    /// Only events starting inside this window are kept.
    pub timeframe: Option<Timeframe>,
}

/// Output of one ranking run.
#[derive(Debug, Clone)]
pub struct RankingRun {
    pub user_id: String,
    /// Ranked suggestions, highest priority first.
    pub suggestions: Vec<Suggestion>,
    /// Sources that could not be scraped during this run.
    pub failures: Vec<FetchError>,
    pub generated_at: DateTime<Utc>,
    action_count: usize,
}

impl RankingRun {
    /// The top suggestions worth acting on now.
    pub fn actionable(&self) -> &[Suggestion] {
        let n = self.action_count.min(self.suggestions.len());
        &self.suggestions[..n]
    }

    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

pub struct SerendipityEngine {
    store: Arc<dyn ProfileStore>,
    aggregator: EventAggregator,
    memory: SuggestionMemory,
    config: EngineConfig,
}

impl SerendipityEngine {
    pub fn new(
        store: Arc<dyn ProfileStore>,
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn Extractor>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            aggregator: EventAggregator::new(fetcher, extractor, config.aggregation.clone()),
            memory: SuggestionMemory::with_capacity(config.memory.capacity),
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn ProfileStore> {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Aggregate events for `profile` and feed each source's outcome back
    /// into the store's success rates.
    pub async fn aggregate(
        &self,
        profile: &UserProfile,
        timeframe: Option<&Timeframe>,
    ) -> AggregationReport {
        let report = self.aggregator.aggregate(profile, timeframe).await;
        for source in &report.sources {
            let updated =
                self.store
                    .update_event_source_stats(&profile.id, &source.url, source.succeeded());
            if let Err(e) = updated {
                warn!(
                    user_id = %profile.id,
                    url = %source.url,
                    error = %e,
                    "failed to update source stats"
                );
            }
        }
        report
    }

    /// Full ranking run for a stored user.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ProfileNotFound`] for unknown users. Source
    /// failures never fail the run; they are listed in [`RankingRun::failures`].
    pub async fn run(&self, user_id: &str, request: &RankingRequest) -> Result<RankingRun> {
        let profile = self
            .store
            .get(user_id)
            .ok_or_else(|| CoreError::ProfileNotFound(user_id.to_string()))?;
        Ok(self.run_for_profile(&profile, request).await)
    }

    /// Ranking run against an already loaded profile snapshot.
    pub async fn run_for_profile(
        &self,
        profile: &UserProfile,
        request: &RankingRequest,
    ) -> RankingRun {
        let report = self.aggregate(profile, request.timeframe.as_ref()).await;
        let failures: Vec<FetchError> = report.failures().cloned().collect();

        let candidates = Candidates {
            events: report.candidates,
            connections: find_gaps(profile),
            nudges: suggest_nudges(profile),
        };
        let suggestions = rank(
            candidates,
            &request.goals,
            profile,
            &*self.store,
            &self.config.ranking,
        );

        self.memory.record(&profile.id, &suggestions);
        if self.config.outcomes.record {
            self.record_outcomes(&profile.id, &suggestions);
        }

        info!(
            user_id = %profile.id,
            suggestions = suggestions.len(),
            failed_sources = failures.len(),
            "ranking run complete"
        );

        RankingRun {
            user_id: profile.id.clone(),
            suggestions,
            failures,
            generated_at: Utc::now(),
            action_count: self.config.ranking.action_count,
        }
    }

    fn record_outcomes(&self, user_id: &str, suggestions: &[Suggestion]) {
        let threshold = self.config.outcomes.success_threshold;
        for suggestion in suggestions {
            let kind = suggestion.kind();
            let success = suggestion.priority > threshold;
            debug!(user_id, %kind, success, "recording outcome");
            if let Err(e) = self.store.record_action_outcome(user_id, kind.as_str(), success) {
                warn!(user_id, %kind, error = %e, "failed to record outcome");
            }
        }
    }

    /// Remembered runs for `user_id`, oldest first.
    pub fn history(&self, user_id: &str) -> Vec<SuggestionMemoryEntry> {
        self.memory.history(user_id)
    }
}
