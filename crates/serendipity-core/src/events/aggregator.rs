//! Event aggregation across every configured source of a profile.
//!
//! Sources are scraped concurrently, each under its own timeout. A failing
//! source contributes nothing and is reported in the [`AggregationReport`];
//! it never aborts the run. Surviving candidates are deduplicated, scored
//! against the profile's interests and strong connections, and sorted.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::candidate::{EventCandidate, Timeframe};
use super::normalizer::{extract_records, normalize};
use crate::error::{CoreError, FetchError};
use crate::profile::{EventSourceConfig, UserProfile};
use crate::sources::{Extractor, Fetcher};
use crate::storage::AggregationConfig;

/// Score contributed by each strong-connection interest found in an event.
const NETWORK_MATCH_BOOST: f64 = 0.1;

/// Outcome of scraping one source.
#[derive(Debug, Clone)]
pub struct SourceReport {
    pub url: String,
    /// Candidates normalized from this source, before dedup and scoring.
    pub found: usize,
    pub error: Option<FetchError>,
}

impl SourceReport {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of one aggregation: scored candidates plus per-source outcomes.
#[derive(Debug, Clone, Default)]
pub struct AggregationReport {
    /// Deduplicated, interest-scored candidates, highest confidence first.
    pub candidates: Vec<EventCandidate>,
    /// One entry per configured source, in configuration order.
    pub sources: Vec<SourceReport>,
}

impl AggregationReport {
    pub fn failures(&self) -> impl Iterator<Item = &FetchError> {
        self.sources.iter().filter_map(|s| s.error.as_ref())
    }

    /// `AggregationPartialFailure` when at least one source failed.
    pub fn partial_failure(&self) -> Option<CoreError> {
        let failed = self.failures().count();
        (failed > 0).then(|| CoreError::AggregationPartialFailure {
            failed,
            total: self.sources.len(),
        })
    }
}

/// Keep the first candidate seen for every `title|startTime|venue` key.
pub fn dedup_candidates(candidates: Vec<EventCandidate>) -> Vec<EventCandidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(c.dedup_key()))
        .collect()
}

/// Relevance of an event to a profile.
///
/// Mean weight of the profile interests found in the event text, plus a
/// flat boost for every strong-connection interest found. Network matches
/// do not count towards the mean's denominator.
pub fn interest_score(candidate: &EventCandidate, profile: &UserProfile) -> f64 {
    let text = candidate.search_text();

    let (sum, matches) = profile
        .interests
        .iter()
        .filter(|(topic, _)| {
            let topic = topic.trim().to_lowercase();
            !topic.is_empty() && text.contains(&topic)
        })
        .fold((0.0, 0u32), |(sum, n), (_, weight)| (sum + weight, n + 1));
    let direct = if matches > 0 {
        sum / f64::from(matches)
    } else {
        0.0
    };

    let network_matches = profile
        .strong_connections()
        .flat_map(|c| c.interests.iter())
        .filter(|interest| {
            let interest = interest.trim().to_lowercase();
            !interest.is_empty() && text.contains(&interest)
        })
        .count();

    direct + NETWORK_MATCH_BOOST * network_matches as f64
}

/// Drop candidates with no signal, boost the rest by `1 + score` and sort
/// by confidence, highest first. Equal confidences keep their input order.
pub fn score_candidates(
    candidates: Vec<EventCandidate>,
    profile: &UserProfile,
) -> Vec<EventCandidate> {
    let mut scored: Vec<EventCandidate> = candidates
        .into_iter()
        .filter_map(|mut c| {
            let score = interest_score(&c, profile);
            if score <= 0.0 {
                debug!(title = %c.title, "dropping event with no interest signal");
                return None;
            }
            c.confidence *= 1.0 + score;
            Some(c)
        })
        .collect();

    scored.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored
}

/// Scrapes, normalizes and scores events for a profile.
pub struct EventAggregator {
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn Extractor>,
    config: AggregationConfig,
}

impl EventAggregator {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn Extractor>,
        config: AggregationConfig,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            config,
        }
    }

    /// Aggregate events from every source of `profile`.
    ///
    /// Never fails: source errors are logged and reported per source.
    pub async fn aggregate(
        &self,
        profile: &UserProfile,
        timeframe: Option<&Timeframe>,
    ) -> AggregationReport {
        let outcomes = self.scrape_all(&profile.event_sources).await;

        let mut raw = Vec::new();
        let mut sources = Vec::with_capacity(outcomes.len());
        for (source, outcome) in profile.event_sources.iter().zip(outcomes) {
            match outcome {
                Ok(found) => {
                    debug!(url = %source.url, count = found.len(), "scraped source");
                    sources.push(SourceReport {
                        url: source.url.clone(),
                        found: found.len(),
                        error: None,
                    });
                    raw.extend(found);
                }
                Err(e) => {
                    warn!(user_id = %profile.id, url = %source.url, error = %e, "event source failed");
                    sources.push(SourceReport {
                        url: source.url.clone(),
                        found: 0,
                        error: Some(e),
                    });
                }
            }
        }

        let mut unique = dedup_candidates(raw);
        if let Some(tf) = timeframe {
            unique.retain(|c| tf.admits(c));
        }

        let report = AggregationReport {
            candidates: score_candidates(unique, profile),
            sources,
        };
        if let Some(partial) = report.partial_failure() {
            warn!(user_id = %profile.id, "{partial}");
        }
        report
    }

    /// Scrape all sources concurrently; results come back in source order.
    async fn scrape_all(
        &self,
        sources: &[EventSourceConfig],
    ) -> Vec<Result<Vec<EventCandidate>, FetchError>> {
        let timeout = self.config.source_timeout();
        let mut set = JoinSet::new();

        for (idx, source) in sources.iter().enumerate() {
            let fetcher = Arc::clone(&self.fetcher);
            let extractor = Arc::clone(&self.extractor);
            let source = source.clone();
            let selectors = source
                .selectors
                .clone()
                .unwrap_or_default()
                .or(&self.config.default_selectors);
            let base_confidence = self.config.base_confidence;

            set.spawn(async move {
                let result = match tokio::time::timeout(timeout, fetcher.fetch(&source.url)).await
                {
                    Ok(Ok(html)) => {
                        let records = extract_records(&html, &selectors, extractor.as_ref());
                        Ok(normalize(&source, &records, base_confidence))
                    }
                    Ok(Err(e)) => Err(e),
                    Err(_) => Err(FetchError::Timeout {
                        url: source.url.clone(),
                        secs: timeout.as_secs(),
                    }),
                };
                (idx, result)
            });
        }

        let mut slots: Vec<Option<Result<Vec<EventCandidate>, FetchError>>> =
            (0..sources.len()).map(|_| None).collect();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, result)) => slots[idx] = Some(result),
                Err(e) => warn!(error = %e, "scrape task did not complete"),
            }
        }

        slots
            .into_iter()
            .zip(sources)
            .map(|(slot, source)| {
                slot.unwrap_or_else(|| {
                    Err(FetchError::Extract {
                        url: source.url.clone(),
                        message: "scrape task did not complete".into(),
                    })
                })
            })
            .collect()
    }
}
