//! # Serendipity Core Library
//!
//! This library provides the suggestion engine behind Serendipity: it turns a
//! user profile (interests, network, event sources) into a ranked list of
//! events to attend, people to be introduced to and routines to keep up.
//! The `serendipity` CLI is a thin layer over the same library.
//!
//! ## Architecture
//!
//! - **Events**: concurrent scraping of every configured source, normalization
//!   into typed candidates, dedup and interest scoring
//! - **Gaps**: weak ties that share the user's top interests
//! - **Nudges**: routine suggestions built from reliable sources
//! - **Ranking**: priority adjustment for past success and stated goals
//! - **Memory**: bounded per-user history of ranking runs
//! - **Storage**: JSON profile store and TOML configuration
//!
//! ## Key Components
//!
//! - [`SerendipityEngine`]: Long-lived service running ranking runs
//! - [`ProfileStore`]: Persistence boundary for profiles and outcomes
//! - [`Fetcher`] / [`Extractor`]: Page download and field extraction
//! - [`DigestScheduler`]: Periodic runs for every stored profile

pub mod engine;
pub mod error;
pub mod events;
pub mod gaps;
pub mod memory;
pub mod nudge;
pub mod profile;
pub mod ranking;
pub mod scheduler;
pub mod sources;
pub mod storage;

pub use engine::{RankingRequest, RankingRun, SerendipityEngine};
pub use error::{ConfigError, CoreError, FetchError, ParseError, ValidationError};
pub use events::{AggregationReport, EventAggregator, EventCandidate, Timeframe};
pub use gaps::{find_gaps, ConnectionSuggestion};
pub use memory::{SuggestionMemory, SuggestionMemoryEntry};
pub use nudge::{suggest_nudges, NudgeSuggestion};
pub use profile::{
    EventSourceConfig, JsonProfileStore, NetworkConnection, NewProfile, ProfileStore,
    ProfileUpdate, UserProfile,
};
pub use ranking::{rank, Candidates, Suggestion, SuggestionKind, SuggestionPayload};
pub use scheduler::{DigestScheduler, DigestSummary, LogNotifier, Notifier};
pub use sources::{Extractor, Fetcher, HttpFetcher, SelectorExtractor};
pub use storage::EngineConfig;
