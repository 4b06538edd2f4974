//! Periodic digest runs.
//!
//! The scheduler ranks suggestions for every stored profile and hands
//! non-empty results to a [`Notifier`]. Delivery channels live behind
//! that trait; the crate only ships [`LogNotifier`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{info, warn};

use crate::engine::{RankingRequest, SerendipityEngine};
use crate::error::Result;
use crate::profile::UserProfile;
use crate::ranking::{Suggestion, SuggestionPayload};
use crate::storage::SchedulerConfig;

pub const DIGEST_SUBJECT: &str = "Your Daily Serendipity Digest";

/// Receives each user's ranked suggestions after a digest run.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, profile: &UserProfile, suggestions: &[Suggestion]) -> Result<()>;
}

/// Writes the rendered digest to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, profile: &UserProfile, suggestions: &[Suggestion]) -> Result<()> {
        info!(
            user_id = %profile.id,
            email = %profile.email,
            subject = DIGEST_SUBJECT,
            count = suggestions.len(),
            "digest\n{}",
            build_digest_body(profile, suggestions)
        );
        Ok(())
    }
}

/// Plain-text digest: greeting, one bullet per suggestion, sign-off.
pub fn build_digest_body(profile: &UserProfile, suggestions: &[Suggestion]) -> String {
    let items: Vec<String> = suggestions.iter().map(digest_item).collect();
    format!(
        "Hello {},\n\nHere are your new suggestions:\n\n{}\n\nBest regards,\nSerendipity Team",
        profile.name,
        items.join("\n")
    )
}

fn digest_item(suggestion: &Suggestion) -> String {
    match &suggestion.payload {
        SuggestionPayload::Event(e) => {
            let description = if e.description.is_empty() {
                "No description available"
            } else {
                e.description.as_str()
            };
            format!("- {}\n  {}\n  {}", e.title, description, e.url)
        }
        SuggestionPayload::Connection(c) => {
            format!("- Introduction: {}\n  {}", c.contact, suggestion.reasoning)
        }
        SuggestionPayload::Nudge(n) => format!("- {}\n  {} ({})", n.action, n.context, n.timing),
    }
}

/// Counters for one pass over all profiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DigestSummary {
    pub users: usize,
    pub notified: usize,
    pub failed: usize,
}

/// Whether a new pass is due, given when the last one started.
fn is_due(last_run: Option<Instant>, now: Instant, interval: Duration) -> bool {
    last_run.map_or(true, |last| now.duration_since(last) >= interval)
}

pub struct DigestScheduler {
    engine: Arc<SerendipityEngine>,
    notifier: Arc<dyn Notifier>,
    config: SchedulerConfig,
}

impl DigestScheduler {
    pub fn new(
        engine: Arc<SerendipityEngine>,
        notifier: Arc<dyn Notifier>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            engine,
            notifier,
            config,
        }
    }

    /// Rank and notify every stored profile once.
    ///
    /// A failing user is logged and counted; the others still run.
    pub async fn run_once(&self) -> DigestSummary {
        let profiles = self.engine.store().list();
        let mut summary = DigestSummary {
            users: profiles.len(),
            ..Default::default()
        };
        let request = RankingRequest::default();

        for profile in &profiles {
            let run = match self.engine.run(&profile.id, &request).await {
                Ok(run) => run,
                Err(e) => {
                    warn!(user_id = %profile.id, error = %e, "digest run failed");
                    summary.failed += 1;
                    continue;
                }
            };
            if run.suggestions.is_empty() {
                continue;
            }
            match self.notifier.notify(profile, &run.suggestions).await {
                Ok(()) => summary.notified += 1,
                Err(e) => {
                    warn!(user_id = %profile.id, error = %e, "digest notification failed");
                    summary.failed += 1;
                }
            }
        }

        info!(
            users = summary.users,
            notified = summary.notified,
            failed = summary.failed,
            "digest pass complete"
        );
        summary
    }

    /// Check every `check_secs` and run a pass whenever `interval_secs`
    /// have passed since the previous one. The first pass runs immediately.
    pub async fn run_forever(&self) {
        let interval = Duration::from_secs(self.config.interval_secs);
        let mut ticker = tokio::time::interval(Duration::from_secs(self.config.check_secs.max(1)));
        let mut last_run = None;

        loop {
            ticker.tick().await;
            let now = Instant::now();
            if is_due(last_run, now, interval) {
                last_run = Some(now);
                self.run_once().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoreError, FetchError};
    use crate::events::EventCandidate;
    use crate::nudge::NudgeSuggestion;
    use crate::profile::{EventSourceConfig, JsonProfileStore, ProfileStore};
    use crate::sources::{Fetcher, SelectorExtractor};
    use crate::storage::EngineConfig;
    use std::sync::Mutex;

    struct FailingFetcher;

    #[async_trait]
    impl Fetcher for FailingFetcher {
        async fn fetch(&self, url: &str) -> std::result::Result<String, FetchError> {
            Err(FetchError::Http {
                url: url.to_string(),
                status: 503,
            })
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        seen: Mutex<Vec<String>>,
        fail_for: Option<String>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, profile: &UserProfile, _suggestions: &[Suggestion]) -> Result<()> {
            if self.fail_for.as_deref() == Some(profile.id.as_str()) {
                return Err(CoreError::Store("mailbox full".into()));
            }
            self.seen.lock().unwrap().push(profile.id.clone());
            Ok(())
        }
    }

    fn scheduler(notifier: Arc<RecordingNotifier>) -> DigestScheduler {
        let store = Arc::new(JsonProfileStore::in_memory());
        // Nudge from a reliable source even though scraping fails.
        store
            .insert(
                UserProfile::new("busy", "Busy")
                    .with_source(EventSourceConfig::new("https://example.com/a", "meetup")),
            )
            .unwrap();
        store
            .insert(
                UserProfile::new("other", "Other")
                    .with_source(EventSourceConfig::new("https://example.com/b", "meetup")),
            )
            .unwrap();
        store.insert(UserProfile::new("quiet", "Quiet")).unwrap();

        let engine = SerendipityEngine::new(
            store as Arc<dyn ProfileStore>,
            Arc::new(FailingFetcher),
            Arc::new(SelectorExtractor::new()),
            EngineConfig::default(),
        );
        DigestScheduler::new(Arc::new(engine), notifier, SchedulerConfig::default())
    }

    #[tokio::test]
    async fn run_once_notifies_only_non_empty_results() {
        let notifier = Arc::new(RecordingNotifier::default());
        let summary = scheduler(Arc::clone(&notifier)).run_once().await;

        assert_eq!(
            summary,
            DigestSummary {
                users: 3,
                notified: 2,
                failed: 0
            }
        );
        assert_eq!(*notifier.seen.lock().unwrap(), vec!["busy", "other"]);
    }

    #[tokio::test]
    async fn notifier_failure_does_not_stop_other_users() {
        let notifier = Arc::new(RecordingNotifier {
            fail_for: Some("busy".into()),
            ..Default::default()
        });
        let summary = scheduler(Arc::clone(&notifier)).run_once().await;

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.notified, 1);
        assert_eq!(*notifier.seen.lock().unwrap(), vec!["other"]);
    }

    #[test]
    fn due_when_never_run_or_interval_elapsed() {
        let now = Instant::now();
        let hour = Duration::from_secs(3600);
        assert!(is_due(None, now, hour));
        assert!(!is_due(Some(now), now, hour));
        assert!(is_due(Some(now), now + hour, hour));
    }

    #[test]
    fn digest_body_lists_every_suggestion() {
        let profile = UserProfile::new("u", "Ada");
        let event = Suggestion::event(
            EventCandidate {
                title: "AI Meetup".into(),
                description: String::new(),
                url: "https://example.com/e".into(),
                start_time: None,
                end_time: None,
                venue: None,
                source: "https://example.com/e".into(),
                confidence: 0.9,
            },
            "Event matches interests: ai".into(),
        );
        let nudge = Suggestion::nudge(NudgeSuggestion {
            action: "Schedule regular attendance".into(),
            context: "Regular participation in meetup events".into(),
            expected_outcome: String::new(),
            timing: "Weekly".into(),
        });

        let body = build_digest_body(&profile, &[event, nudge]);
        assert!(body.starts_with("Hello Ada,"));
        assert!(body.contains("- AI Meetup\n  No description available\n  https://example.com/e"));
        assert!(body.contains(
            "- Schedule regular attendance\n  Regular participation in meetup events (Weekly)"
        ));
        assert!(body.ends_with("Serendipity Team"));
    }
}
