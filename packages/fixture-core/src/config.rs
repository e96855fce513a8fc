//! Fixture context configuration.

/// Fixture context configuration.
#[derive(Debug, Clone)]
pub struct FixtureConfig {
    /// Seed for the default generator source (`None` = entropy)
    pub seed: Option<u64>,
    /// Flush storage after every create outside a deferred scope
    pub auto_flush: bool,
    /// Length of generated text values
    pub text_length: usize,
    /// Maximum depth of nested factory calls
    pub max_nesting_depth: usize,
    /// Maximum size of a single `many(n)` request
    pub max_collection_size: usize,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            seed: None,
            auto_flush: true,
            text_length: 12,
            max_nesting_depth: 16,
            max_collection_size: 10_000,
        }
    }
}

impl FixtureConfig {
    /// Returns a configuration with a fixed generator seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Default::default()
        }
    }
}
