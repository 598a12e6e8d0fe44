//! Bot registry — the fixed set of personas the gateway can relay to.
//!
//! Each [`BotProfile`] pairs an identifier with the system prompt sent
//! upstream and the canned replies served when the upstream call fails.
//! The registry is built once at startup and shared read-only.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Errors raised while building a registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Registry must contain at least one bot")]
    Empty,

    #[error("Bot identifier must not be empty")]
    EmptyId,

    #[error("Duplicate bot identifier: {0}")]
    DuplicateId(String),

    #[error("Bot '{0}' has an empty system prompt")]
    EmptyPrompt(String),

    #[error("Bot '{0}' has no fallback replies")]
    NoFallbacks(String),

    #[error("Failed to read bots file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse bots file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// A single bot persona.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BotProfile {
    /// Identifier callers select with `botType`.
    pub id: String,
    /// System prompt describing the persona and its domain.
    pub prompt: String,
    /// Replies served when the upstream provider is unavailable. Never empty.
    pub fallbacks: Vec<String>,
}

impl BotProfile {
    pub fn new(
        id: impl Into<String>,
        prompt: impl Into<String>,
        fallbacks: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            fallbacks: fallbacks.into_iter().map(Into::into).collect(),
        }
    }
}

/// Ordered, validated collection of bot profiles.
///
/// Insertion order is preserved and is the order in which valid identifiers
/// are reported back to callers.
#[derive(Debug, Clone)]
pub struct BotRegistry {
    profiles: Vec<BotProfile>,
}

impl BotRegistry {
    /// Build a registry, rejecting duplicates and incomplete profiles.
    pub fn new(profiles: Vec<BotProfile>) -> Result<Self, RegistryError> {
        if profiles.is_empty() {
            return Err(RegistryError::Empty);
        }
        for (i, profile) in profiles.iter().enumerate() {
            if profile.id.trim().is_empty() {
                return Err(RegistryError::EmptyId);
            }
            if profiles[..i].iter().any(|p| p.id == profile.id) {
                return Err(RegistryError::DuplicateId(profile.id.clone()));
            }
            if profile.prompt.trim().is_empty() {
                return Err(RegistryError::EmptyPrompt(profile.id.clone()));
            }
            if profile.fallbacks.is_empty() {
                return Err(RegistryError::NoFallbacks(profile.id.clone()));
            }
        }
        Ok(Self { profiles })
    }

    /// The built-in eBay / NFL / Home Depot personas.
    pub fn builtin() -> Self {
        Self {
            profiles: vec![
                BotProfile::new(
                    "ebay",
                    "You are an eBay shopping assistant. Help users with shopping, selling, and price comparisons.",
                    [
                        "I can help you find the best deals on eBay. What are you looking to buy or sell?",
                        "Based on recent listings, similar items are selling for around $50-$100.",
                        "To improve your selling success, try adding high-quality photos and detailed descriptions.",
                    ],
                ),
                BotProfile::new(
                    "nfl",
                    "You are an NFL expert. Provide accurate information about football, teams, players, and statistics.",
                    [
                        "The NFL regular season consists of 17 games. Would you like to know more about a specific team?",
                        "The Kansas City Chiefs won Super Bowl LVIII in 2024.",
                        "That player had an outstanding season with impressive stats. What specific information would you like to know?",
                    ],
                ),
                BotProfile::new(
                    "homedepot",
                    "You are a Home Depot DIY expert. Help users with home improvement projects and product recommendations.",
                    [
                        "For that DIY project, I'd recommend starting with these basic tools...",
                        "When painting interior walls, always start with a good primer and use quality brushes.",
                        "The best material for your project would depend on your budget and intended use. Let's discuss the options.",
                    ],
                ),
            ],
        }
    }

    /// Parse a YAML list of `{ id, prompt, fallbacks }` entries.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, RegistryError> {
        let profiles: Vec<BotProfile> = serde_yaml::from_str(yaml)?;
        Self::new(profiles)
    }

    /// Load a registry from a YAML file on disk.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let yaml = fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    pub fn get(&self, id: &str) -> Option<&BotProfile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    /// Valid identifiers in registry order.
    pub fn ids(&self) -> Vec<String> {
        self.profiles.iter().map(|p| p.id.clone()).collect()
    }

    pub fn profiles(&self) -> &[BotProfile] {
        &self.profiles
    }
}

impl Default for BotRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
