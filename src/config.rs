//! Configuration types for vibe-db.
//!
//! The [`Config`] struct controls database behavior including:
//! - How option payloads are encoded ([`PayloadCodec`])
//! - Cache size and durability settings
//! - The random source used for first assignments
//!
//! # Example
//! ```rust
//! use vibedb::{Config, PayloadCodec, SyncMode};
//!
//! // Use defaults (JSON payloads, entropy-seeded RNG)
//! let config = Config::default();
//!
//! // Reproducible assignments for a test suite
//! let config = Config {
//!     rng_seed: Some(42),
//!     payload_codec: PayloadCodec::Bincode,
//!     sync_mode: SyncMode::Fast,
//!     ..Default::default()
//! };
//! ```

use serde::{Deserialize, Serialize};

use crate::codec::PayloadCodec;
use crate::error::ValidationError;

/// Database configuration options.
///
/// All fields have sensible defaults. Use struct update syntax to override
/// specific settings.
#[derive(Clone, Debug)]
pub struct Config {
    /// Cache size in megabytes for the storage engine.
    ///
    /// Default: 64 MB
    pub cache_size_mb: usize,

    /// Durability mode for write operations.
    pub sync_mode: SyncMode,

    /// Encoding used for option payloads.
    pub payload_codec: PayloadCodec,

    /// Seed for the assignment RNG.
    ///
    /// `None` seeds from OS entropy. Set this to make first assignments
    /// reproducible across runs.
    pub rng_seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_size_mb: 64,
            sync_mode: SyncMode::Normal,
            payload_codec: PayloadCodec::Json,
            rng_seed: None,
        }
    }
}

impl Config {
    /// Creates a new Config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a Config with a fixed RNG seed.
    ///
    /// # Example
    /// ```rust
    /// use vibedb::Config;
    ///
    /// let config = Config::seeded(7);
    /// assert_eq!(config.rng_seed, Some(7));
    /// ```
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng_seed: Some(seed),
            ..Default::default()
        }
    }

    /// Validates the configuration.
    ///
    /// Called automatically by `VibeDB::open()`.
    ///
    /// # Errors
    /// Returns `ValidationError` if `cache_size_mb` is 0.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.cache_size_mb == 0 {
            return Err(ValidationError::invalid_field(
                "cache_size_mb",
                "must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Returns the cache size in bytes.
    pub fn cache_size_bytes(&self) -> usize {
        self.cache_size_mb.saturating_mul(1024 * 1024)
    }
}

/// Durability mode for write operations.
///
/// Controls the trade-off between write performance and crash safety.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncMode {
    /// Sync to disk on transaction commit.
    #[default]
    Normal,

    /// Deferred sync (faster writes, may lose recent data on crash).
    Fast,

    /// Immediate sync with two-phase commit on every write (slowest).
    Paranoid,
}

impl SyncMode {
    /// Returns true if this mode syncs on every write.
    pub fn is_paranoid(&self) -> bool {
        matches!(self, Self::Paranoid)
    }

    /// Returns true if this mode is async (may lose data on crash).
    pub fn is_fast(&self) -> bool {
        matches!(self, Self::Fast)
    }

    /// Maps the mode onto redb's commit durability.
    pub(crate) fn durability(&self) -> redb::Durability {
        match self {
            Self::Normal => redb::Durability::Immediate,
            Self::Fast => redb::Durability::Eventual,
            Self::Paranoid => redb::Durability::Immediate,
        }
    }

    /// Returns true if commits should use redb's two-phase commit.
    pub(crate) fn two_phase_commit(&self) -> bool {
        self.is_paranoid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.cache_size_mb, 64);
        assert_eq!(config.sync_mode, SyncMode::Normal);
        assert_eq!(config.payload_codec, PayloadCodec::Json);
        assert!(config.rng_seed.is_none());
    }

    #[test]
    fn test_seeded() {
        let config = Config::seeded(99);
        assert_eq!(config.rng_seed, Some(99));
        assert_eq!(config.cache_size_mb, 64);
    }

    #[test]
    fn test_validate_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_cache_size_zero() {
        let config = Config {
            cache_size_mb: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ValidationError::InvalidField { field, .. } if field == "cache_size_mb")
        );
    }

    #[test]
    fn test_cache_size_bytes() {
        let config = Config {
            cache_size_mb: 2,
            ..Default::default()
        };
        assert_eq!(config.cache_size_bytes(), 2 * 1024 * 1024);
    }

    #[test]
    fn test_sync_mode_checks() {
        assert!(!SyncMode::Normal.is_fast());
        assert!(!SyncMode::Normal.is_paranoid());
        assert!(SyncMode::Fast.is_fast());
        assert!(SyncMode::Paranoid.is_paranoid());
    }

    #[test]
    fn test_sync_mode_durability() {
        assert!(matches!(
            SyncMode::Normal.durability(),
            redb::Durability::Immediate
        ));
        assert!(matches!(
            SyncMode::Fast.durability(),
            redb::Durability::Eventual
        ));
        assert!(matches!(
            SyncMode::Paranoid.durability(),
            redb::Durability::Immediate
        ));
    }

    #[test]
    fn test_only_paranoid_uses_two_phase_commit() {
        assert!(!SyncMode::Normal.two_phase_commit());
        assert!(!SyncMode::Fast.two_phase_commit());
        assert!(SyncMode::Paranoid.two_phase_commit());
    }
}
