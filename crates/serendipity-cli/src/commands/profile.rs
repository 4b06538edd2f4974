//! Profile management commands.

use clap::Subcommand;
use serendipity_core::profile::SourceSelectors;
use serendipity_core::{
    EventSourceConfig, JsonProfileStore, NetworkConnection, NewProfile, ProfileStore,
    ProfileUpdate, UserProfile,
};

use super::CliResult;

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Create a profile and print its id
    Create {
        /// Display name
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        location: String,
        /// Free-text availability (defaults to "anytime")
        #[arg(long)]
        availability: Option<String>,
    },

    /// List all profiles
    List {
        #[arg(long)]
        json: bool,
    },

    /// Show one profile
    Show {
        user_id: String,
        #[arg(long)]
        json: bool,
    },

    /// Change name, email, location or availability
    Update {
        user_id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        availability: Option<String>,
    },

    /// Set an interest weight (clamped to 0..1)
    AddInterest {
        user_id: String,
        topic: String,
        weight: f64,
    },

    /// Add or replace a network contact
    AddContact {
        user_id: String,
        /// Contact id
        contact_id: String,
        /// Contact display name
        name: String,
        /// Tie strength, 0..1
        #[arg(long, default_value_t = 0.5)]
        confidence: f64,
        /// Comma-separated interests
        #[arg(long, value_delimiter = ',')]
        interests: Vec<String>,
        /// Comma-separated skills
        #[arg(long, value_delimiter = ',')]
        skills: Vec<String>,
    },

    /// Add an event source to scrape
    AddSource {
        user_id: String,
        url: String,
        /// Source type label (e.g. "meetup", "eventbrite")
        #[arg(long = "type", default_value = "custom")]
        source_type: String,
        #[arg(long)]
        title_selector: Option<String>,
        #[arg(long)]
        description_selector: Option<String>,
        #[arg(long)]
        datetime_selector: Option<String>,
        #[arg(long)]
        location_selector: Option<String>,
    },
}

pub fn run(action: ProfileAction) -> CliResult {
    let store = JsonProfileStore::open()?;
    match action {
        ProfileAction::Create {
            name,
            email,
            location,
            availability,
        } => {
            let profile = store.create(NewProfile {
                name,
                email,
                location,
                availability,
            })?;
            println!("Profile created: {}", profile.id);
        }
        ProfileAction::List { json } => {
            let profiles = store.list();
            if json {
                println!("{}", serde_json::to_string_pretty(&profiles)?);
            } else if profiles.is_empty() {
                println!("No profiles.");
            } else {
                for p in &profiles {
                    println!(
                        "  {}  {}  ({} interests, {} contacts, {} sources)",
                        p.id,
                        p.name,
                        p.interests.len(),
                        p.network.len(),
                        p.event_sources.len()
                    );
                }
            }
        }
        ProfileAction::Show { user_id, json } => {
            let profile = store
                .get(&user_id)
                .ok_or_else(|| format!("Profile not found: {user_id}"))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&profile)?);
            } else {
                print_profile(&profile);
            }
        }
        ProfileAction::Update {
            user_id,
            name,
            email,
            location,
            availability,
        } => {
            let update = ProfileUpdate {
                name,
                email,
                location,
                availability,
            };
            if update.is_empty() {
                return Err(
                    "nothing to update; pass --name, --email, --location or --availability".into(),
                );
            }
            let profile = store.update_profile(&user_id, update)?;
            println!("Profile updated: {}", profile.id);
        }
        ProfileAction::AddInterest {
            user_id,
            topic,
            weight,
        } => {
            store.add_interest(&user_id, &topic, weight)?;
            println!("ok");
        }
        ProfileAction::AddContact {
            user_id,
            contact_id,
            name,
            confidence,
            interests,
            skills,
        } => {
            let connection = NetworkConnection::new(contact_id, name, confidence)
                .with_interests(interests)
                .with_skills(skills);
            store.add_network_connection(&user_id, connection)?;
            println!("ok");
        }
        ProfileAction::AddSource {
            user_id,
            url,
            source_type,
            title_selector,
            description_selector,
            datetime_selector,
            location_selector,
        } => {
            let selectors = SourceSelectors {
                title: title_selector,
                description: description_selector,
                datetime: datetime_selector,
                location: location_selector,
            };
            let mut source = EventSourceConfig::new(url, source_type);
            if selectors != SourceSelectors::default() {
                source = source.with_selectors(selectors);
            }
            store.add_event_source(&user_id, source)?;
            println!("ok");
        }
    }
    Ok(())
}

fn print_profile(p: &UserProfile) {
    println!("{} ({})", p.name, p.id);
    println!("{}", "=".repeat(p.name.len() + p.id.len() + 3));
    if !p.email.is_empty() {
        println!("Email: {}", p.email);
    }
    if !p.location.is_empty() {
        println!("Location: {}", p.location);
    }
    println!("Availability: {}", p.availability);
    println!();

    println!("Interests:");
    for (topic, weight) in &p.interests {
        println!("  {topic}: {weight:.2}");
    }
    println!();

    println!("Network:");
    for c in p.network.values() {
        let tag = if c.is_gap() {
            " [gap]"
        } else if c.is_strong() {
            " [strong]"
        } else {
            ""
        };
        println!("  {} - {} ({:.2}){}", c.id, c.name, c.confidence, tag);
    }
    println!();

    println!("Event sources:");
    for s in &p.event_sources {
        println!("  {} [{}] success {:.0}%", s.url, s.source_type, s.success_rate * 100.0);
    }
}
