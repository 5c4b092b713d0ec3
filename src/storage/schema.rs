//! Database schema definitions and versioning.
//!
//! This module defines the table structure for the redb storage engine.
//! All table definitions are compile-time constants to ensure consistency.
//!
//! # Table Layout
//!
//! ```text
//! Shared partition (visible to every caller)
//! ┌──────────────────────────┬──────────────────────────┬─────────────────────┐
//! │ table                    │ key                      │ value               │
//! ├──────────────────────────┼──────────────────────────┼─────────────────────┤
//! │ metadata                 │ &str                     │ DatabaseMetadata    │
//! │ vibe_checks              │ VibeCheckId (16)         │ VibeCheckRecord     │
//! │ vibe_checks_by_name  (M) │ &str name                │ VibeCheckId (16)    │
//! │ vibe_options             │ VibeOptionId (16)        │ OptionRecord        │
//! │ options_by_vibe_check(M) │ VibeCheckId (16)         │ VibeOptionId (16)   │
//! │ metrics                  │ MetricId (16)            │ VibeMetric          │
//! │ metrics_by_vibe_check(M) │ VibeCheckId ‖ ts_be (24) │ MetricId (16)       │
//! └──────────────────────────┴──────────────────────────┴─────────────────────┘
//!
//! Caller-private partition
//! ┌──────────────────────────┬──────────────────────────┬─────────────────────┐
//! │ vibes                    │ CallerId ‖ VibeCheckId   │ Vibe                │
//! │                          │ (32, caller prefix)      │                     │
//! └──────────────────────────┴──────────────────────────┴─────────────────────┘
//!
//! (M) = multimap. Record values are bincode-serialized.
//! ```
//!
//! The `vibes` key is the uniqueness constraint for assignments: there is
//! exactly one slot per `(caller, vibe check)` pair.

use redb::{MultimapTableDefinition, TableDefinition};
use serde::{Deserialize, Serialize};

use crate::types::{CallerId, Timestamp, VibeCheckId};

/// Current schema version.
///
/// The database will refuse to open if versions don't match.
pub const SCHEMA_VERSION: u32 = 1;

/// Maximum length of vibe check, option, and metric names in bytes.
pub const MAX_NAME_LENGTH: usize = 255;

/// Maximum number of options per vibe check.
pub const MAX_OPTIONS: usize = 64;

/// Maximum encoded payload size per option (64 KB).
pub const MAX_PAYLOAD_SIZE: usize = 64 * 1024;

// ============================================================================
// Table Definitions
// ============================================================================

/// Metadata table for database-level information.
pub const METADATA_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("metadata");

/// Vibe checks table.
pub const VIBE_CHECKS_TABLE: TableDefinition<&[u8; 16], &[u8]> =
    TableDefinition::new("vibe_checks");

/// Index: vibe check ids by name. A name maps to several ids when the same
/// experiment is re-run over disjoint windows.
pub const VIBE_CHECKS_BY_NAME_TABLE: MultimapTableDefinition<&str, &[u8; 16]> =
    MultimapTableDefinition::new("vibe_checks_by_name");

/// Vibe options table.
pub const OPTIONS_TABLE: TableDefinition<&[u8; 16], &[u8]> = TableDefinition::new("vibe_options");

/// Index: option ids by owning vibe check.
pub const OPTIONS_BY_VIBE_CHECK_TABLE: MultimapTableDefinition<&[u8; 16], &[u8; 16]> =
    MultimapTableDefinition::new("options_by_vibe_check");

/// Vibes (assignments), caller-private.
///
/// Key: `caller_id ‖ vibe_check_id`. A range over one caller prefix lists
/// that caller's vibes and nobody else's.
pub const VIBES_TABLE: TableDefinition<&[u8; 32], &[u8]> = TableDefinition::new("vibes");

/// Metrics table.
pub const METRICS_TABLE: TableDefinition<&[u8; 16], &[u8]> = TableDefinition::new("metrics");

/// Index: metrics by vibe check and recording time.
///
/// Big-endian timestamp in the key makes a range scan return metrics in
/// recording order; the multimap holds several metrics per millisecond.
pub const METRICS_BY_VIBE_CHECK_TABLE: MultimapTableDefinition<&[u8; 24], &[u8; 16]> =
    MultimapTableDefinition::new("metrics_by_vibe_check");

/// Table name used in unique violation errors for the vibes table.
pub const VIBES_TABLE_NAME: &str = "vibes";

// ============================================================================
// Database Metadata
// ============================================================================

/// Database metadata stored in the metadata table under "db_metadata".
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatabaseMetadata {
    /// Schema version for compatibility checking.
    pub schema_version: u32,

    /// Timestamp when the database was created.
    pub created_at: Timestamp,

    /// Last time the database was opened (updated on each open).
    pub last_opened_at: Timestamp,
}

impl DatabaseMetadata {
    /// Creates new metadata for a fresh database.
    pub fn new() -> Self {
        let now = Timestamp::now();
        Self {
            schema_version: SCHEMA_VERSION,
            created_at: now,
            last_opened_at: now,
        }
    }

    /// Updates the last_opened_at timestamp.
    pub fn touch(&mut self) {
        self.last_opened_at = Timestamp::now();
    }

    /// Checks if this metadata is compatible with the current schema.
    pub fn is_compatible(&self) -> bool {
        self.schema_version == SCHEMA_VERSION
    }
}

impl Default for DatabaseMetadata {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Key Encoding Helpers
// ============================================================================

/// Encodes the `(caller, vibe check)` slot key for the vibes table.
#[inline]
pub fn encode_vibe_key(caller: CallerId, vibe_check: VibeCheckId) -> [u8; 32] {
    let mut key = [0u8; 32];
    key[..16].copy_from_slice(caller.as_bytes());
    key[16..].copy_from_slice(vibe_check.as_bytes());
    key
}

/// First possible vibes key for a caller.
#[inline]
pub fn caller_range_start(caller: CallerId) -> [u8; 32] {
    let mut key = [0u8; 32];
    key[..16].copy_from_slice(caller.as_bytes());
    key
}

/// Last possible vibes key for a caller.
#[inline]
pub fn caller_range_end(caller: CallerId) -> [u8; 32] {
    let mut key = [0xFFu8; 32];
    key[..16].copy_from_slice(caller.as_bytes());
    key
}

/// Encodes a `(vibe check, timestamp)` key for the metrics index.
///
/// Format: `[vibe_check_id: 16][timestamp_be: 8]`.
#[inline]
pub fn encode_metric_index_key(vibe_check: &[u8; 16], timestamp: Timestamp) -> [u8; 24] {
    let mut key = [0u8; 24];
    key[..16].copy_from_slice(vibe_check);
    key[16..].copy_from_slice(&timestamp.to_be_bytes());
    key
}

/// Range start for all metrics of a vibe check.
///
/// Timestamps before the epoch are not supported as index keys.
#[inline]
pub fn metric_range_start(vibe_check: &[u8; 16]) -> [u8; 24] {
    encode_metric_index_key(vibe_check, Timestamp::from_millis(0))
}

/// Range end for all metrics of a vibe check.
#[inline]
pub fn metric_range_end(vibe_check: &[u8; 16]) -> [u8; 24] {
    encode_metric_index_key(vibe_check, Timestamp::from_millis(i64::MAX))
}
