//! Network gap analysis.
//!
//! A gap is a contact the user barely knows (confidence below
//! [`GAP_THRESHOLD`](crate::profile::GAP_THRESHOLD)) who shares at least one
//! of the user's top interests. Each such contact becomes an introduction
//! candidate.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::profile::UserProfile;

/// How many of the user's interests are considered when matching contacts.
pub const TOP_INTEREST_COUNT: usize = 5;

/// Base priority of every introduction candidate.
pub const CONNECTION_PRIORITY: f64 = 0.8;

/// A proposed introduction to an under-connected contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSuggestion {
    /// Contact id in the user's network.
    pub contact: String,
    /// Shared interests, in the user's top-interest order.
    pub shared_interests: Vec<String>,
    pub potential_value: String,
    pub introduction_strategy: String,
}

impl ConnectionSuggestion {
    pub fn reasoning(&self) -> String {
        format!(
            "Strong interest overlap in: {}",
            self.shared_interests.join(", ")
        )
    }
}

/// Introduction candidates for every gap contact sharing a top interest.
/// Output follows the network's insertion order.
pub fn find_gaps(profile: &UserProfile) -> Vec<ConnectionSuggestion> {
    let top = profile.top_interests(TOP_INTEREST_COUNT);

    profile
        .network
        .iter()
        .filter(|(_, contact)| contact.is_gap())
        .filter_map(|(id, contact)| {
            let shared: Vec<String> = top
                .iter()
                .filter(|interest| contact.interests.contains(**interest))
                .map(|interest| interest.to_string())
                .collect();
            if shared.is_empty() {
                debug!(contact = %id, "gap contact shares no top interest");
                return None;
            }
            Some(ConnectionSuggestion {
                contact: id.clone(),
                shared_interests: shared,
                potential_value: "Potential collaboration and knowledge sharing".into(),
                introduction_strategy: "Suggest meeting at relevant industry event".into(),
            })
        })
        .collect()
}
