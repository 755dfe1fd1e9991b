use std::{env, time::Duration};

use recurra_core::recurrence::{GenerationLimits, DEFAULT_MAX_ITERATIONS, DEFAULT_MAX_OCCURRENCES};
use recurra_core::storage::WindowBounds;

/// Engine configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Cache TTL in seconds (default: 300). Zero disables caching.
    pub cache_ttl_seconds: u64,
    /// Maximum number of cached expansions (default: 10,000)
    pub cache_max_entries: usize,
    /// Occurrence cap per generation call (default: 500)
    pub max_occurrences: usize,
    /// Iteration cap per generation call (default: 1,000)
    pub max_iterations: usize,
    /// Bounds used to filter non-recurring events (default: half-open)
    pub standalone_bounds: WindowBounds,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `CACHE_TTL_SECONDS` - Cache TTL in seconds (default: 300)
    /// - `CACHE_MAX_ENTRIES` - Maximum cache entries (default: 10,000)
    /// - `MAX_OCCURRENCES` - Occurrence cap per expansion (default: 500)
    /// - `MAX_ITERATIONS` - Iteration cap per expansion (default: 1,000)
    /// - `STANDALONE_WINDOW_BOUNDS` - `half-open` or `closed` (default: `half-open`)
    pub fn from_env() -> Self {
        Self {
            cache_ttl_seconds: env::var("CACHE_TTL_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
            cache_max_entries: env::var("CACHE_MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10_000),
            max_occurrences: env::var("MAX_OCCURRENCES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_OCCURRENCES),
            max_iterations: env::var("MAX_ITERATIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_ITERATIONS),
            standalone_bounds: env::var("STANDALONE_WINDOW_BOUNDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
        }
    }

    /// Get cache TTL as a Duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    /// Get the generation caps.
    pub fn limits(&self) -> GenerationLimits {
        GenerationLimits {
            max_occurrences: self.max_occurrences,
            max_iterations: self.max_iterations,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_ttl_seconds: 300,
            cache_max_entries: 10_000,
            max_occurrences: DEFAULT_MAX_OCCURRENCES,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            standalone_bounds: WindowBounds::HalfOpen,
        }
    }
}
