//! Keyword-based intent classification.
//!
//! A category matches when any of its keywords occurs anywhere in the
//! lower-cased prompt. This is plain substring containment, so "pr" matches
//! inside "projects" and "run" inside "running". When nothing matches the
//! configured default categories are returned instead of an empty set.

use std::collections::BTreeSet;

use adopilot_core::config::AgentConfig;

/// Maps a prompt to the ids of the categories it mentions.
#[derive(Clone, Copy, Debug)]
pub struct IntentClassifier<'a> {
    config: &'a AgentConfig,
}

impl<'a> IntentClassifier<'a> {
    pub fn new(config: &'a AgentConfig) -> Self {
        Self { config }
    }

    pub fn classify(&self, prompt: &str) -> BTreeSet<String> {
        let prompt = prompt.to_lowercase();

        let matched: BTreeSet<String> = self
            .config
            .categories
            .iter()
            .filter(|category| {
                category
                    .keywords
                    .iter()
                    .filter(|k| !k.is_empty())
                    .any(|k| prompt.contains(&k.to_lowercase()))
            })
            .map(|category| category.id.clone())
            .collect();

        if matched.is_empty() {
            self.config.default_categories.iter().cloned().collect()
        } else {
            matched
        }
    }
}
