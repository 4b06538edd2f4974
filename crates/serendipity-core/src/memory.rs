//! Bounded per-user suggestion history.
//!
//! Each ranking run appends one summarized entry; only the most recent
//! `capacity` entries are kept per user. Appends for one user are
//! serialized, appends for different users do not contend beyond the
//! brief map lookup. Nothing is persisted.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ranking::{Suggestion, SuggestionKind};

/// Default number of entries kept per user.
pub const DEFAULT_CAPACITY: usize = 10;

/// A suggestion with its payload dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionSummary {
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    pub priority: f64,
    pub reasoning: String,
}

impl From<&Suggestion> for SuggestionSummary {
    fn from(s: &Suggestion) -> Self {
        Self {
            kind: s.kind(),
            priority: s.priority,
            reasoning: s.reasoning.clone(),
        }
    }
}

/// Output of one ranking run, as remembered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionMemoryEntry {
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    pub suggestions: Vec<SuggestionSummary>,
}

type History = Arc<Mutex<VecDeque<SuggestionMemoryEntry>>>;

// History is append-only, so a poisoned lock still guards consistent data.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Process-wide suggestion history keyed by user id.
#[derive(Debug)]
pub struct SuggestionMemory {
    capacity: usize,
    users: Mutex<HashMap<String, History>>,
}

impl SuggestionMemory {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            users: Mutex::new(HashMap::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn history_for(&self, user_id: &str) -> History {
        let mut users = lock(&self.users);
        Arc::clone(users.entry(user_id.to_string()).or_default())
    }

    /// Append a summary of `suggestions`, evicting the oldest entry when full.
    pub fn record(&self, user_id: &str, suggestions: &[Suggestion]) -> SuggestionMemoryEntry {
        let entry = SuggestionMemoryEntry {
            user_id: user_id.to_string(),
            timestamp: Utc::now(),
            suggestions: suggestions.iter().map(SuggestionSummary::from).collect(),
        };

        let history = self.history_for(user_id);
        let mut entries = lock(&history);
        entries.push_back(entry.clone());
        while entries.len() > self.capacity {
            entries.pop_front();
        }
        entry
    }

    /// Entries for `user_id`, oldest first.
    pub fn history(&self, user_id: &str) -> Vec<SuggestionMemoryEntry> {
        let history = {
            let users = lock(&self.users);
            match users.get(user_id) {
                Some(h) => Arc::clone(h),
                None => return Vec::new(),
            }
        };
        let entries = lock(&history);
        entries.iter().cloned().collect()
    }
}

impl Default for SuggestionMemory {
    fn default() -> Self {
        Self::new()
    }
}
