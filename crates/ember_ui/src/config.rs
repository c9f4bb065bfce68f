//! Startup configuration.
//!
//! Loaded once at startup, typically from a TOML file next to the
//! application. Everything has a working default; the knobs exist so hosts
//! with unusual UI density can size the arenas without recompiling.

use crate::error::{UiError, UiResult};
use serde::Deserialize;

/// Configuration for a [`crate::UiState`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UiConfig {
    /// Reservation for the persistent arena (fonts, long-lived state).
    pub persistent_arena_bytes: usize,
    /// Reservation for each of the two frame arenas.
    pub frame_arena_bytes: usize,
    /// Bucket count for the key cache.
    pub key_buckets: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            persistent_arena_bytes: 16 * 1024 * 1024,
            frame_arena_bytes: 4 * 1024 * 1024,
            key_buckets: crate::key::DEFAULT_KEY_BUCKETS,
        }
    }
}

impl UiConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// [`UiError::InvalidConfig`] with the parser's message on malformed
    /// input or unknown keys.
    pub fn from_toml_str(input: &str) -> UiResult<Self> {
        toml::from_str(input).map_err(|err| UiError::InvalidConfig(err.to_string()))
    }
}
