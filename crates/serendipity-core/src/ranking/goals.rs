//! Goal relevance matching.
//!
//! A goal matches a text when the whole goal phrase occurs in it, or when
//! any of the goal's keywords occurs in it as a whole word. Keywords are
//! the goal's words minus filler ("find", "learn", "the", ...), so the goal
//! "find AI collaborators" matches an event titled "AI Summit".

use std::collections::HashSet;

const FILLER_WORDS: &[&str] = &[
    "a", "about", "an", "and", "are", "at", "be", "by", "connect", "for", "from", "get", "i",
    "in", "into", "is", "learn", "looking", "me", "meet", "more", "my", "new", "of", "on", "or",
    "some", "the", "to", "want", "with", "find",
];

#[derive(Debug, Clone)]
struct Goal {
    phrase: String,
    keywords: Vec<String>,
}

fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
}

/// Case-insensitive matcher over a user's stated goals.
#[derive(Debug, Clone, Default)]
pub struct GoalMatcher {
    goals: Vec<Goal>,
}

impl GoalMatcher {
    pub fn new(goals: &[String]) -> Self {
        let goals = goals
            .iter()
            .map(|g| g.trim().to_lowercase())
            .filter(|g| !g.is_empty())
            .map(|phrase| {
                let keywords = words(&phrase)
                    .filter(|w| w.chars().count() >= 2 && !FILLER_WORDS.contains(w))
                    .map(str::to_string)
                    .collect();
                Goal { phrase, keywords }
            })
            .collect();
        Self { goals }
    }

    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }

    /// Whether any goal is relevant to `text`.
    pub fn matches(&self, text: &str) -> bool {
        if self.goals.is_empty() {
            return false;
        }
        let text = text.to_lowercase();
        let text_words: HashSet<&str> = words(&text).collect();

        self.goals.iter().any(|goal| {
            text.contains(&goal.phrase)
                || goal.keywords.iter().any(|k| text_words.contains(k.as_str()))
        })
    }
}
