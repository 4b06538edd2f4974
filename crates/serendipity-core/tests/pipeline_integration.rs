//! Integration tests for full ranking runs.
//!
//! These tests drive the engine end to end with in-process fetchers, so no
//! network access is needed.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use serendipity_core::events::dedup_candidates;
use serendipity_core::{
    EngineConfig, EventCandidate, EventSourceConfig, FetchError, Fetcher, JsonProfileStore,
    NetworkConnection, ProfileStore, RankingRequest, SelectorExtractor, SerendipityEngine,
    SuggestionKind, SuggestionPayload, Timeframe, UserProfile,
};

const SOURCE_A: &str = "https://events.example.com/a";
const SOURCE_B: &str = "https://events.example.com/b";

const MEETUP_PAGE: &str = r#"
<html><body>
  <h2 class="event-title">AI Meetup</h2>
  <div class="event-description">Monthly machine learning talks</div>
  <span class="event-date">2025-03-10T18:00:00Z</span>
  <p class="event-location">Hall A</p>

  <h2 class="event-title">Knitting Circle</h2>
  <div class="event-description">Yarn and tea</div>
  <span class="event-date">2025-03-11T18:00:00Z</span>
  <p class="event-location">Hall B</p>
</body></html>
"#;

/// Serves canned pages by URL; unknown URLs fail with a transport error.
/// Stalled URLs sleep well past any test timeout before answering.
#[derive(Default)]
struct StubFetcher {
    pages: HashMap<String, Result<String, FetchError>>,
    stalled: HashSet<String>,
}

impl StubFetcher {
    fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), Ok(html.to_string()));
        self
    }

    fn status(mut self, url: &str, status: u16) -> Self {
        self.pages.insert(
            url.to_string(),
            Err(FetchError::Http {
                url: url.to_string(),
                status,
            }),
        );
        self
    }

    fn stall(mut self, url: &str, html: &str) -> Self {
        self.stalled.insert(url.to_string());
        self.page(url, html)
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        if self.stalled.contains(url) {
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
        self.pages.get(url).cloned().unwrap_or_else(|| {
            Err(FetchError::Transport {
                url: url.to_string(),
                message: "no route".into(),
            })
        })
    }
}

fn base_profile(sources: &[&str]) -> UserProfile {
    let mut profile = UserProfile::new("u1", "Ada")
        .with_interest("ai", 0.9)
        .with_interest("rust", 0.6)
        .with_connection(NetworkConnection::new("c1", "Grace", 0.2).with_interests(["ai"]))
        .with_connection(NetworkConnection::new("c2", "Alan", 0.25).with_interests(["gardening"]));
    for url in sources {
        profile = profile.with_source(EventSourceConfig::new(*url, "meetup"));
    }
    profile
}

fn engine_with(
    profile: UserProfile,
    fetcher: impl Fetcher + 'static,
    config: EngineConfig,
) -> (SerendipityEngine, Arc<JsonProfileStore>) {
    let store = Arc::new(JsonProfileStore::in_memory());
    store.insert(profile).unwrap();
    let engine = SerendipityEngine::new(
        Arc::clone(&store) as Arc<dyn ProfileStore>,
        Arc::new(fetcher),
        Arc::new(SelectorExtractor::new()),
        config,
    );
    (engine, store)
}

fn event_titles(run: &serendipity_core::RankingRun) -> Vec<&str> {
    run.suggestions
        .iter()
        .filter_map(|s| match &s.payload {
            SuggestionPayload::Event(e) => Some(e.title.as_str()),
            _ => None,
        })
        .collect()
}

/// Test: interest-matching event, gap contact and nudge come out in priority order.
#[tokio::test]
async fn test_run_ranks_event_connection_and_nudge() {
    let (engine, _store) = engine_with(
        base_profile(&[SOURCE_A]),
        StubFetcher::default().page(SOURCE_A, MEETUP_PAGE),
        EngineConfig::default(),
    );

    let run = engine.run("u1", &RankingRequest::default()).await.unwrap();

    let kinds: Vec<_> = run.suggestions.iter().map(|s| s.kind()).collect();
    assert_eq!(
        kinds,
        vec![SuggestionKind::Event, SuggestionKind::Connection, SuggestionKind::Nudge]
    );
    assert_eq!(event_titles(&run), vec!["AI Meetup"]);

    let event = &run.suggestions[0];
    assert_eq!(event.priority, 1.0);
    assert_eq!(event.reasoning, "Event matches interests: ai");
    match &event.payload {
        SuggestionPayload::Event(e) => {
            assert_eq!(e.venue.as_deref(), Some("Hall A"));
            assert_eq!(e.start_time, Some(Utc.with_ymd_and_hms(2025, 3, 10, 18, 0, 0).unwrap()));
            assert_eq!(e.source, SOURCE_A);
        }
        other => panic!("expected event, got {other:?}"),
    }

    match &run.suggestions[1].payload {
        SuggestionPayload::Connection(c) => {
            assert_eq!(c.contact, "c1");
            assert_eq!(c.shared_interests, vec!["ai"]);
        }
        other => panic!("expected connection, got {other:?}"),
    }
    assert!((run.suggestions[1].priority - 0.8).abs() < 1e-9);
    assert!((run.suggestions[2].priority - 0.6).abs() < 1e-9);
}

/// Test: one failing source is reported but does not sink the run.
#[tokio::test]
async fn test_failing_source_is_reported_not_fatal() {
    let (engine, store) = engine_with(
        base_profile(&[SOURCE_A, SOURCE_B]),
        StubFetcher::default()
            .page(SOURCE_A, MEETUP_PAGE)
            .status(SOURCE_B, 500),
        EngineConfig::default(),
    );

    let run = engine.run("u1", &RankingRequest::default()).await.unwrap();

    assert!(run.is_partial());
    assert_eq!(run.failures.len(), 1);
    assert_eq!(run.failures[0].url(), SOURCE_B);
    assert_eq!(event_titles(&run), vec!["AI Meetup"]);

    let profile = store.get("u1").unwrap();
    assert!((profile.event_sources[0].success_rate - 1.0).abs() < 1e-9);
    assert!((profile.event_sources[1].success_rate - 0.9).abs() < 1e-9);
}

/// Test: every source failing still yields connections and nudges.
#[tokio::test]
async fn test_all_sources_failing_keeps_other_suggestions() {
    let (engine, _store) = engine_with(
        base_profile(&[SOURCE_A, SOURCE_B]),
        StubFetcher::default(),
        EngineConfig::default(),
    );

    let run = engine.run("u1", &RankingRequest::default()).await.unwrap();
    assert_eq!(run.failures.len(), 2);
    assert!(event_titles(&run).is_empty());
    assert!(run
        .suggestions
        .iter()
        .any(|s| s.kind() == SuggestionKind::Connection));
}

/// Test: a slow source times out and is reported as such.
#[tokio::test]
async fn test_slow_source_times_out() {
    let mut config = EngineConfig::default();
    config.aggregation.source_timeout_secs = 1;
    let (engine, _store) = engine_with(
        base_profile(&[SOURCE_A]),
        StubFetcher::default().stall(SOURCE_A, MEETUP_PAGE),
        config,
    );

    let run = engine.run("u1", &RankingRequest::default()).await.unwrap();
    assert!(matches!(
        run.failures.as_slice(),
        [FetchError::Timeout { secs: 1, .. }]
    ));
}

/// Test: a stalled source times out on its own while a fast source's
/// events are still ranked.
#[tokio::test]
async fn test_slow_source_does_not_hold_back_fast_source() {
    let mut config = EngineConfig::default();
    config.aggregation.source_timeout_secs = 1;
    let fast_page = r#"<h2 class="event-title">Rust Workshop</h2>"#;
    let fetcher = StubFetcher::default()
        .stall(SOURCE_A, MEETUP_PAGE)
        .page(SOURCE_B, fast_page);
    let (engine, store) = engine_with(base_profile(&[SOURCE_A, SOURCE_B]), fetcher, config);

    let started = std::time::Instant::now();
    let run = engine.run("u1", &RankingRequest::default()).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(4));

    assert_eq!(event_titles(&run), vec!["Rust Workshop"]);
    match run.failures.as_slice() {
        [FetchError::Timeout { url, secs: 1 }] => assert_eq!(url, SOURCE_A),
        other => panic!("expected one timeout for {SOURCE_A}, got {other:?}"),
    }

    let profile = store.get("u1").unwrap();
    assert!((profile.event_sources[0].success_rate - 0.9).abs() < 1e-9);
    assert_eq!(profile.event_sources[1].success_rate, 1.0);
}

/// Test: stating a goal raises a matching event by exactly the goal boost.
#[tokio::test]
async fn test_goal_boosts_matching_event() {
    let page = r#"<h2 class="event-title">AI Summit</h2>"#;
    let mut config = EngineConfig::default();
    config.aggregation.base_confidence = 0.3;

    let priority_with = |goals: Vec<String>| {
        let config = config.clone();
        async move {
            let (engine, _store) = engine_with(
                base_profile(&[SOURCE_A]),
                StubFetcher::default().page(SOURCE_A, page),
                config,
            );
            let run = engine
                .run(
                    "u1",
                    &RankingRequest {
                        goals,
                        timeframe: None,
                    },
                )
                .await
                .unwrap();
            run.suggestions
                .iter()
                .find(|s| s.kind() == SuggestionKind::Event)
                .map(|s| s.priority)
                .unwrap()
        }
    };

    let without = priority_with(Vec::new()).await;
    let with = priority_with(vec!["find AI collaborators".to_string()]).await;
    assert!((without - 0.3 * 1.9).abs() < 1e-9);
    assert!((with - without - 0.2).abs() < 1e-9);
}

/// Test: timeframe drops events outside the window and keeps undated ones.
#[tokio::test]
async fn test_timeframe_filters_dated_events() {
    let page = r#"
        <h2 class="event-title">AI in March</h2><span class="event-date">2025-03-10</span>
        <h2 class="event-title">AI in June</h2><span class="event-date">2025-06-01</span>
        <h2 class="event-title">AI someday</h2><span class="event-date">tbd</span>
    "#;
    let (engine, _store) = engine_with(
        base_profile(&[SOURCE_A]),
        StubFetcher::default().page(SOURCE_A, page),
        EngineConfig::default(),
    );
    let timeframe = Timeframe::new(
        Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2025, 3, 31, 23, 59, 59).unwrap(),
    )
    .unwrap();

    let run = engine
        .run(
            "u1",
            &RankingRequest {
                goals: Vec::new(),
                timeframe: Some(timeframe),
            },
        )
        .await
        .unwrap();

    assert_eq!(event_titles(&run), vec!["AI in March", "AI someday"]);
}

/// Test: the same event listed by two sources is suggested once.
#[tokio::test]
async fn test_duplicate_events_across_sources_collapse() {
    let (engine, _store) = engine_with(
        base_profile(&[SOURCE_A, SOURCE_B]),
        StubFetcher::default()
            .page(SOURCE_A, MEETUP_PAGE)
            .page(SOURCE_B, MEETUP_PAGE),
        EngineConfig::default(),
    );

    let run = engine.run("u1", &RankingRequest::default()).await.unwrap();
    assert_eq!(event_titles(&run), vec!["AI Meetup"]);
}

/// Test: memory keeps only the ten most recent runs.
#[tokio::test]
async fn test_memory_keeps_ten_most_recent_runs() {
    let (engine, _store) = engine_with(
        base_profile(&[SOURCE_A]),
        StubFetcher::default().page(SOURCE_A, MEETUP_PAGE),
        EngineConfig::default(),
    );

    let mut stamps = Vec::new();
    for _ in 0..12 {
        let run = engine.run("u1", &RankingRequest::default()).await.unwrap();
        stamps.push(run.generated_at);
    }

    let history = engine.history("u1");
    assert_eq!(history.len(), 10);
    assert!(history.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    assert!(history[0].timestamp >= stamps[1]);
    assert_eq!(history[9].suggestions.len(), 3);
}

/// Test: past outcomes feed into later runs through the success multiplier.
#[tokio::test]
async fn test_recorded_outcomes_adjust_next_run() {
    let (engine, store) = engine_with(
        base_profile(&[SOURCE_A]),
        StubFetcher::default().page(SOURCE_A, MEETUP_PAGE),
        EngineConfig::default(),
    );

    engine.run("u1", &RankingRequest::default()).await.unwrap();
    let stats = store.action_stats("u1", "nudge").unwrap();
    assert_eq!((stats.success, stats.total), (0, 1));

    // 0.6 * (0.5 + 0/1)
    let run = engine.run("u1", &RankingRequest::default()).await.unwrap();
    let nudge = run
        .suggestions
        .iter()
        .find(|s| s.kind() == SuggestionKind::Nudge)
        .unwrap();
    assert!((nudge.priority - 0.3).abs() < 1e-9);
}

fn candidate(title: &str, day: u32, venue: Option<&str>) -> EventCandidate {
    EventCandidate {
        title: title.to_string(),
        description: String::new(),
        url: SOURCE_A.to_string(),
        start_time: Some(Utc.with_ymd_and_hms(2025, 3, day, 18, 0, 0).unwrap()),
        end_time: None,
        venue: venue.map(str::to_string),
        source: SOURCE_A.to_string(),
        confidence: 0.7,
    }
}

proptest! {
    #[test]
    fn test_dedup_is_idempotent(
        picks in prop::collection::vec((0usize..4, 1u32..4, any::<bool>()), 0..30)
    ) {
        let titles = ["AI Meetup", "Rust Night", "ML Salon", "Data Drinks"];
        let input: Vec<EventCandidate> = picks
            .iter()
            .map(|(t, day, venue)| candidate(titles[*t], *day, venue.then_some("Hall")))
            .collect();

        let once = dedup_candidates(input.clone());
        let twice = dedup_candidates(once.clone());
        prop_assert_eq!(&once, &twice);

        let doubled: Vec<EventCandidate> = input.iter().chain(input.iter()).cloned().collect();
        prop_assert_eq!(dedup_candidates(doubled), once);
    }
}
