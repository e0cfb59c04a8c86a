pub mod signals;
pub mod similarity;
pub mod strategies;

pub use signals::*;
pub use similarity::*;
pub use strategies::*;

use anyhow::{ensure, Result};

use crate::models::{IdentitySignals, MatchResult, Roster};

/// Default minimum similarity for a fuzzy name match
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.86;

/// Configuration for the matching cascade
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Minimum sequence similarity (0-1) accepted by the name strategy
    pub fuzzy_threshold: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
        }
    }
}

impl ResolverConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            (0.0..=1.0).contains(&self.fuzzy_threshold),
            "fuzzy threshold must be between 0 and 1, got {}",
            self.fuzzy_threshold
        );
        Ok(())
    }
}

/// Ordered cascade of match strategies; the first strategy to match wins
pub struct Resolver {
    strategies: Vec<Box<dyn MatchStrategy>>,
}

impl Resolver {
    /// Exact email, then email username, then fuzzy name
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            strategies: vec![
                Box::new(EmailExact),
                Box::new(EmailUsername),
                Box::new(NameFuzzy::new(config.fuzzy_threshold)),
            ],
        }
    }

    /// A cascade with no strategies; everything resolves to no match
    pub fn empty() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Append a strategy after the existing ones
    pub fn with_strategy(mut self, strategy: impl MatchStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn strategy_count(&self) -> usize {
        self.strategies.len()
    }

    pub fn resolve(&self, signals: &IdentitySignals, roster: &Roster) -> MatchResult {
        if roster.is_empty() || signals.is_empty() {
            return MatchResult::none();
        }

        self.strategies
            .iter()
            .find_map(|strategy| strategy.attempt(signals, roster))
            .unwrap_or_else(MatchResult::none)
    }

    /// Extract signals from `text` and resolve them in one step
    pub fn link_text(&self, text: &str, roster: &Roster) -> (IdentitySignals, MatchResult) {
        let signals = extract_signals(text);
        let result = self.resolve(&signals, roster);
        (signals, result)
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(&ResolverConfig::default())
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let methods: Vec<_> = self.strategies.iter().map(|s| s.method()).collect();
        f.debug_struct("Resolver").field("strategies", &methods).finish()
    }
}

/// Resolve with the default cascade and threshold
pub fn resolve(emails: &[String], name: Option<&str>, roster: &Roster) -> MatchResult {
    let signals = IdentitySignals::new(emails.to_vec(), name.map(str::to_string));
    Resolver::default().resolve(&signals, roster)
}
