//! User profiles and the store that owns them.

mod store;
mod types;

pub use store::{JsonProfileStore, NewProfile, ProfileStore, ProfileUpdate};
pub use types::{
    clamp_unit, ActionStats, EventSourceConfig, NetworkConnection, SourceSelectors, UserProfile,
    GAP_THRESHOLD, STRONG_THRESHOLD,
};
