//! Profile store: the only place profiles are mutated.
//!
//! The engine reads snapshots through [`ProfileStore::get`] and asks the
//! store to record outcomes. All clamping of written values happens here.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{clamp_unit, ActionStats, EventSourceConfig, NetworkConnection, UserProfile};
use crate::error::{CoreError, Result, ValidationError};
use crate::storage::data_dir;

/// Profile store file name.
const PROFILES_FILE: &str = "profiles.json";

/// Fields needed to create a profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProfile {
    pub name: String,
    pub email: String,
    pub location: String,
    pub availability: Option<String>,
}

/// Partial edit of a profile's identity fields. `None` leaves a field as is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub location: Option<String>,
    pub availability: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.location.is_none()
            && self.availability.is_none()
    }
}

/// Persistence boundary for user profiles.
pub trait ProfileStore: Send + Sync {
    /// Snapshot of one profile.
    fn get(&self, user_id: &str) -> Option<UserProfile>;

    /// Snapshots of every profile, in creation order.
    fn list(&self) -> Vec<UserProfile>;

    fn create(&self, new: NewProfile) -> Result<UserProfile>;

    /// Change name, email, location or availability; returns the updated profile.
    fn update_profile(&self, user_id: &str, update: ProfileUpdate) -> Result<UserProfile>;

    /// Set an interest weight, clamped to [0, 1].
    fn add_interest(&self, user_id: &str, topic: &str, weight: f64) -> Result<()>;

    /// Insert or replace a contact, confidence clamped to [0, 1].
    fn add_network_connection(&self, user_id: &str, connection: NetworkConnection) -> Result<()>;

    /// Append a source; it starts fully trusted and stamped with the current time.
    fn add_event_source(&self, user_id: &str, source: EventSourceConfig) -> Result<()>;

    fn record_action_outcome(&self, user_id: &str, action: &str, success: bool) -> Result<()>;

    /// Fold one scrape outcome into the source's moving success rate.
    fn update_event_source_stats(&self, user_id: &str, source_url: &str, success: bool)
        -> Result<()>;

    /// Historical counters for `action` on the profile `actor_id`.
    fn action_stats(&self, actor_id: &str, action: &str) -> Option<ActionStats> {
        self.get(actor_id)?.success_metrics.get(action).copied()
    }
}

#[derive(Debug, Default, Deserialize)]
struct ProfilesFile {
    profiles: IndexMap<String, UserProfile>,
}

#[derive(Serialize)]
struct ProfilesFileRef<'a> {
    profiles: &'a IndexMap<String, UserProfile>,
}

/// JSON-file backed store. Without a path it lives purely in memory.
#[derive(Debug)]
pub struct JsonProfileStore {
    profiles: Mutex<IndexMap<String, UserProfile>>,
    path: Option<PathBuf>,
}

impl JsonProfileStore {
    /// Store with no backing file (for tests and one-off runs).
    pub fn in_memory() -> Self {
        Self {
            profiles: Mutex::new(IndexMap::new()),
            path: None,
        }
    }

    /// Open `profiles.json` in the data directory.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join(PROFILES_FILE);
        Self::open_at(&path)
    }

    /// Open a store at an explicit path. A missing file starts empty.
    pub fn open_at(path: &Path) -> Result<Self> {
        let profiles = match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str::<ProfilesFile>(&content)?.profiles,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => IndexMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), count = profiles.len(), "loaded profiles");
        Ok(Self {
            profiles: Mutex::new(profiles),
            path: Some(path.to_path_buf()),
        })
    }

    /// Seed a complete profile (replaces any profile with the same id).
    pub fn insert(&self, profile: UserProfile) -> Result<()> {
        self.commit(|profiles| {
            profiles.insert(profile.id.clone(), profile);
            Ok(())
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, IndexMap<String, UserProfile>>> {
        self.profiles
            .lock()
            .map_err(|e| CoreError::Store(format!("Lock failed: {e}")))
    }

    fn persist(&self, profiles: &IndexMap<String, UserProfile>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let file = ProfilesFileRef { profiles };
        std::fs::write(path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }

    /// Apply `f` to a copy of the profiles and swap it in once persisted.
    /// A failed closure or write leaves the in-memory state untouched.
    fn commit<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut IndexMap<String, UserProfile>) -> Result<T>,
    {
        let mut profiles = self.lock()?;
        let mut next = profiles.clone();
        let out = f(&mut next)?;
        self.persist(&next)?;
        *profiles = next;
        Ok(out)
    }

    fn update<T, F>(&self, user_id: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut UserProfile) -> Result<T>,
    {
        self.commit(|profiles| {
            let profile = profiles
                .get_mut(user_id)
                .ok_or_else(|| CoreError::ProfileNotFound(user_id.to_string()))?;
            f(profile)
        })
    }
}

impl ProfileStore for JsonProfileStore {
    fn get(&self, user_id: &str) -> Option<UserProfile> {
        self.lock().ok()?.get(user_id).cloned()
    }

    fn list(&self) -> Vec<UserProfile> {
        match self.lock() {
            Ok(profiles) => profiles.values().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    fn create(&self, new: NewProfile) -> Result<UserProfile> {
        if new.name.trim().is_empty() {
            return Err(ValidationError::Empty("name".into()).into());
        }

        let mut profile = UserProfile::new(uuid::Uuid::new_v4().to_string(), new.name);
        profile.email = new.email;
        profile.location = new.location;
        if let Some(availability) = new.availability {
            profile.availability = availability;
        }

        self.commit(|profiles| {
            profiles.insert(profile.id.clone(), profile.clone());
            Ok(())
        })?;
        debug!(user_id = %profile.id, "created profile");
        Ok(profile)
    }

    fn update_profile(&self, user_id: &str, update: ProfileUpdate) -> Result<UserProfile> {
        if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(ValidationError::Empty("name".into()).into());
        }
        let profile = self.update(user_id, |p| {
            if let Some(name) = update.name {
                p.name = name;
            }
            if let Some(email) = update.email {
                p.email = email;
            }
            if let Some(location) = update.location {
                p.location = location;
            }
            if let Some(availability) = update.availability {
                p.availability = availability;
            }
            Ok(p.clone())
        })?;
        debug!(user_id, "updated profile");
        Ok(profile)
    }

    fn add_interest(&self, user_id: &str, topic: &str, weight: f64) -> Result<()> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(ValidationError::Empty("topic".into()).into());
        }
        self.update(user_id, |p| {
            p.interests.insert(topic.to_string(), clamp_unit(weight));
            Ok(())
        })
    }

    fn add_network_connection(&self, user_id: &str, connection: NetworkConnection) -> Result<()> {
        if connection.id.trim().is_empty() {
            return Err(ValidationError::Empty("contact id".into()).into());
        }
        self.update(user_id, |p| {
            let connection = NetworkConnection {
                confidence: clamp_unit(connection.confidence),
                ..connection
            };
            p.network.insert(connection.id.clone(), connection);
            Ok(())
        })
    }

    fn add_event_source(&self, user_id: &str, source: EventSourceConfig) -> Result<()> {
        url::Url::parse(&source.url).map_err(|e| ValidationError::InvalidUrl {
            url: source.url.clone(),
            message: e.to_string(),
        })?;
        self.update(user_id, |p| {
            p.event_sources.push(EventSourceConfig {
                last_scraped: Some(Utc::now()),
                success_rate: 1.0,
                ..source
            });
            Ok(())
        })
    }

    fn record_action_outcome(&self, user_id: &str, action: &str, success: bool) -> Result<()> {
        self.update(user_id, |p| {
            p.success_metrics
                .entry(action.to_string())
                .or_default()
                .record(success);
            Ok(())
        })
    }

    fn update_event_source_stats(
        &self,
        user_id: &str,
        source_url: &str,
        success: bool,
    ) -> Result<()> {
        self.update(user_id, |p| {
            if let Some(source) = p.event_sources.iter_mut().find(|s| s.url == source_url) {
                source.record_scrape(success, Utc::now());
            }
            Ok(())
        })
    }
}
