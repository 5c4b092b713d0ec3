//! Storage layer abstractions for vibe-db.
//!
//! This module provides a trait-based abstraction over the storage engine.
//! The engine exposes two logical partitions:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         VibeDB                              │
//! │                            │                                │
//! │                            ▼                                │
//! │                 ┌─────────────────────┐                     │
//! │                 │   StorageEngine     │  ← Trait            │
//! │                 └─────────────────────┘                     │
//! │                   │                 │                       │
//! │        shared partition     caller-private partition        │
//! │   (vibe checks, options,      (vibes, keyed by caller)      │
//! │         metrics)                                            │
//! │                   └───────┬─────────┘                       │
//! │                           ▼                                 │
//! │                      RedbStorage                            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every write method runs in its own transaction, so each persisted step
//! is atomic at the granularity of one logical row (plus its index entries).
//! Reads after a committed write on the same engine observe that write.

pub mod redb;
pub mod schema;

pub use self::redb::RedbStorage;
pub use schema::{DatabaseMetadata, SCHEMA_VERSION};

use std::path::Path;

use crate::catalog::VibeCheckFilter;
use crate::config::Config;
use crate::error::Result;
use crate::metric::VibeMetric;
use crate::types::{CallerId, VibeCheckId, VibeOptionId};
use crate::vibe::Vibe;
use crate::vibe_check::{OptionRecord, VibeCheckRecord};

/// Storage engine trait for vibe-db.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow the database to be shared
/// across threads. The engine handles internal synchronization.
pub trait StorageEngine: Send + Sync {
    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Returns the database metadata.
    fn metadata(&self) -> &DatabaseMetadata;

    /// Closes the storage engine, flushing any pending writes.
    fn close(self: Box<Self>) -> Result<()>;

    /// Returns the path to the database file, if applicable.
    fn path(&self) -> Option<&Path>;

    // =========================================================================
    // Vibe Checks & Options (shared partition)
    // =========================================================================

    /// Saves a vibe check together with all of its options.
    ///
    /// Written in one transaction. Fails with
    /// [`ValidationError::OverlappingVibeCheck`](crate::ValidationError::OverlappingVibeCheck)
    /// if a stored vibe check with the same name has an overlapping window;
    /// nothing is written in that case.
    fn save_vibe_check(&self, check: &VibeCheckRecord, options: &[OptionRecord]) -> Result<()>;

    /// Retrieves a vibe check by ID.
    fn get_vibe_check(&self, id: VibeCheckId) -> Result<Option<VibeCheckRecord>>;

    /// Returns every vibe check matching `filter`.
    ///
    /// When `filter.name` is set the name index is used; otherwise all vibe
    /// checks are scanned.
    fn find_vibe_checks(&self, filter: &VibeCheckFilter) -> Result<Vec<VibeCheckRecord>>;

    /// Retrieves an option by ID.
    fn get_option(&self, id: VibeOptionId) -> Result<Option<OptionRecord>>;

    /// Returns all options of a vibe check. Order is unspecified.
    fn options_for(&self, vibe_check: VibeCheckId) -> Result<Vec<OptionRecord>>;

    // =========================================================================
    // Vibes (caller-private partition)
    // =========================================================================

    /// Retrieves the caller's vibe for a vibe check, if one exists.
    fn get_vibe(&self, caller: CallerId, vibe_check: VibeCheckId) -> Result<Option<Vibe>>;

    /// Inserts a new vibe.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::UniqueViolation`](crate::StorageError::UniqueViolation)
    /// if the caller already holds a vibe for this vibe check. The existing
    /// vibe is left untouched.
    fn insert_vibe(&self, vibe: &Vibe) -> Result<()>;

    /// Lists all vibes held by one caller.
    fn list_vibes(&self, caller: CallerId) -> Result<Vec<Vibe>>;

    // =========================================================================
    // Metrics (shared partition, append-only)
    // =========================================================================

    /// Appends a metric.
    fn save_metric(&self, metric: &VibeMetric) -> Result<()>;

    /// Returns all metrics of a vibe check in recording order.
    fn metrics_for(&self, vibe_check: VibeCheckId) -> Result<Vec<VibeMetric>>;
}

/// Opens a storage engine at the given path.
///
/// This is a convenience function that creates a [`RedbStorage`] instance.
///
/// # Errors
///
/// Returns an error if the database file is corrupted, locked by another
/// process, or has a different schema version.
pub fn open_storage(path: impl AsRef<Path>, config: &Config) -> Result<Box<dyn StorageEngine>> {
    let storage = RedbStorage::open(path, config)?;
    Ok(Box::new(storage))
}
