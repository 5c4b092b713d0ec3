//! VibeDB main struct and lifecycle operations.
//!
//! The [`VibeDB`] struct is the primary interface for interacting with
//! the database. It provides methods for:
//!
//! - Opening and closing the database
//! - Defining vibe checks (experiments) and their options
//! - Resolving a caller's vibe (sticky weighted assignment)
//! - Recording and aggregating metrics
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use vibedb::{CallerId, Config, NewVibeCheck, NewVibeOption, Timestamp, VibeDB};
//!
//! let db = VibeDB::open("./vibes.db", Config::default())?;
//!
//! let now = Timestamp::now();
//! db.create_vibe_check(NewVibeCheck {
//!     name: "checkout-button".into(),
//!     start_date: now,
//!     end_date: now.plus_millis(86_400_000),
//!     options: vec![
//!         NewVibeOption::new("blue", 1, "#0000ff".to_string()),
//!         NewVibeOption::new("green", 1, "#00ff00".to_string()),
//!     ],
//! })?;
//!
//! let caller = CallerId::new();
//! let colour: Option<String> = db.feel_vibe("checkout-button", caller)?;
//!
//! db.record_metric("clicks", 1.into(), "checkout-button", caller)?;
//! db.close()?;
//! ```
//!
//! # Thread Safety
//!
//! `VibeDB` is `Send + Sync` and can be shared across threads using `Arc`.
//! The underlying storage uses MVCC for concurrent reads with exclusive
//! write locking. Concurrent first assignments for the same caller converge
//! on one vibe.

use std::path::Path;
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::catalog;
use crate::config::Config;
use crate::error::{Result, VibeDBError};
use crate::metric::{self, MetricsByOption, VibeMetric};
use crate::storage::{open_storage, DatabaseMetadata, StorageEngine};
use crate::types::{CallerId, Timestamp, VibeCheckId};
use crate::vibe::{self, Vibe};
use crate::vibe_check::{
    self, NewVibeCheck, OptionRecord, VibeCheck, VibeCheckRecord, VibeOption,
};

/// The main VibeDB database handle.
///
/// Create an instance with [`VibeDB::open()`] and close it with
/// [`VibeDB::close()`].
///
/// # Ownership
///
/// `VibeDB` owns its storage and its assignment RNG. When you call
/// `close()`, the database is consumed and cannot be used afterward.
pub struct VibeDB {
    /// Storage engine.
    storage: Box<dyn StorageEngine>,

    /// Random source for first assignments.
    rng: Mutex<StdRng>,

    /// Configuration used to open this database.
    config: Config,
}

impl std::fmt::Debug for VibeDB {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VibeDB")
            .field("config", &self.config)
            .field("path", &self.storage.path())
            .finish_non_exhaustive()
    }
}

impl VibeDB {
    /// Opens or creates a VibeDB database at the specified path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration is invalid (see [`Config::validate`])
    /// - Database file is corrupted
    /// - Database is locked by another process
    /// - Schema version doesn't match
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use vibedb::{Config, VibeDB};
    ///
    /// // Reproducible first assignments
    /// let db = VibeDB::open("./vibes.db", Config::seeded(42))?;
    /// ```
    #[instrument(skip(config), fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>, config: Config) -> Result<Self> {
        config.validate().map_err(VibeDBError::from)?;

        info!("Opening VibeDB");

        let storage = open_storage(&path, &config)?;

        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        info!(
            sync_mode = ?config.sync_mode,
            payload_codec = ?config.payload_codec,
            seeded = config.rng_seed.is_some(),
            "VibeDB opened successfully"
        );

        Ok(Self {
            storage,
            rng: Mutex::new(rng),
            config,
        })
    }

    /// Closes the database, flushing all pending writes.
    ///
    /// This method consumes the `VibeDB` instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend reports a flush failure.
    #[instrument(skip(self))]
    pub fn close(self) -> Result<()> {
        info!("Closing VibeDB");

        self.storage.close()?;

        info!("VibeDB closed successfully");
        Ok(())
    }

    /// Returns a reference to the database configuration.
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the database metadata.
    #[inline]
    pub fn metadata(&self) -> &DatabaseMetadata {
        self.storage.metadata()
    }

    // =========================================================================
    // Vibe Checks
    // =========================================================================

    /// Defines a new vibe check with its options.
    ///
    /// The vibe check and every option are written in one transaction.
    /// Payloads are encoded with the configured [`PayloadCodec`](crate::PayloadCodec).
    ///
    /// # Errors
    ///
    /// - [`ValidationError`](crate::ValidationError) for a bad name, an
    ///   inverted window, too many options, or an oversized payload
    /// - [`ValidationError::OverlappingVibeCheck`](crate::ValidationError::OverlappingVibeCheck)
    ///   if a vibe check with the same name has an overlapping window
    /// - [`VibeDBError::Payload`] if a value cannot be encoded
    #[instrument(skip(self, check), fields(name = %check.name, options = check.options.len()))]
    pub fn create_vibe_check<V: Serialize>(&self, check: NewVibeCheck<V>) -> Result<VibeCheckId> {
        vibe_check::validate_new_vibe_check(&check)?;

        let (record, options) = vibe_check::into_records(check, self.config.payload_codec)?;
        self.storage.save_vibe_check(&record, &options)?;

        info!(id = %record.id, "Vibe check created");
        Ok(record.id)
    }

    /// Returns the vibe check currently active under `name`, if any.
    pub fn find_active_vibe_check(&self, name: &str) -> Result<Option<VibeCheckRecord>> {
        catalog::find_active(self.storage.as_ref(), name, Timestamp::now())
    }

    /// Retrieves a vibe check by ID, active or not.
    pub fn get_vibe_check(&self, id: VibeCheckId) -> Result<Option<VibeCheckRecord>> {
        self.storage.get_vibe_check(id)
    }

    /// Returns `true` if a vibe check named `name` is active right now.
    pub fn vibe_check_exists(&self, name: &str) -> Result<bool> {
        catalog::exists(self.storage.as_ref(), name, Timestamp::now())
    }

    /// Loads the active vibe check named `name` with its options decoded to `V`.
    ///
    /// Returns `Ok(None)` if no vibe check with that name is active.
    ///
    /// # Errors
    ///
    /// Returns [`VibeDBError::Payload`] if any option payload is not a valid `V`.
    pub fn load_vibe_check<V: DeserializeOwned>(&self, name: &str) -> Result<Option<VibeCheck<V>>> {
        let Some(record) = self.find_active_vibe_check(name)? else {
            return Ok(None);
        };

        let options = self.options_for(record.id)?;
        Ok(Some(VibeCheck {
            id: record.id,
            name: record.name,
            start_date: record.start_date,
            end_date: record.end_date,
            options,
        }))
    }

    /// Returns all options of a vibe check in definition order, decoded to `V`.
    ///
    /// An unknown ID yields an empty list.
    pub fn options_for<V: DeserializeOwned>(&self, id: VibeCheckId) -> Result<Vec<VibeOption<V>>> {
        let codec = self.config.payload_codec;
        catalog::options_for(self.storage.as_ref(), id)?
            .iter()
            .map(|record| record.decode(codec))
            .collect()
    }

    // =========================================================================
    // Vibes
    // =========================================================================

    /// Resolves the caller's option for the active vibe check named `name`.
    ///
    /// The first call for a caller draws an option by weight and persists the
    /// assignment; every later call returns the same option without writing.
    ///
    /// Returns `Ok(None)`, with nothing written, if no vibe check is active
    /// under `name`, it has no options, or all weights are zero.
    #[instrument(skip(self), fields(caller = %caller))]
    pub fn resolve(&self, name: &str, caller: CallerId) -> Result<Option<OptionRecord>> {
        let Some(check) = self.find_active_vibe_check(name)? else {
            debug!("No active vibe check");
            return Ok(None);
        };

        vibe::resolve_option(self.storage.as_ref(), &check, caller, |total| {
            self.draw(total)
        })
    }

    /// Resolves the caller's vibe and decodes its payload to `V`.
    ///
    /// # Errors
    ///
    /// Returns [`VibeDBError::Payload`] if the payload is not a valid `V`.
    pub fn feel_vibe<V: DeserializeOwned>(&self, name: &str, caller: CallerId) -> Result<Option<V>> {
        match self.resolve(name, caller)? {
            Some(option) => Ok(Some(self.config.payload_codec.decode(&option.payload)?)),
            None => Ok(None),
        }
    }

    /// Returns the caller's existing vibe for the active vibe check, without
    /// ever creating one.
    pub fn current_vibe(&self, name: &str, caller: CallerId) -> Result<Option<Vibe>> {
        match self.find_active_vibe_check(name)? {
            Some(check) => self.storage.get_vibe(caller, check.id),
            None => Ok(None),
        }
    }

    /// Lists every vibe the caller holds, across all vibe checks.
    pub fn vibes_for(&self, caller: CallerId) -> Result<Vec<Vibe>> {
        self.storage.list_vibes(caller)
    }

    fn draw(&self, total: u64) -> Result<u64> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| VibeDBError::runtime("assignment RNG lock poisoned"))?;
        vibe::draw(&mut *rng, total)
            .ok_or_else(|| VibeDBError::runtime("cannot draw from a zero total weight"))
    }

    // =========================================================================
    // Metrics
    // =========================================================================

    /// Records a metric against the caller's vibe in the vibe check `vibe_name`.
    ///
    /// Resolves the caller's vibe first, creating it if needed, so recording
    /// opts the caller in. Does nothing if no vibe check is active under
    /// `vibe_name` or it has no assignable option. Repeated calls append
    /// repeated rows.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `metric_name` is empty or longer than
    /// 255 bytes.
    #[instrument(skip(self, value), fields(caller = %caller))]
    pub fn record_metric(
        &self,
        metric_name: &str,
        value: Decimal,
        vibe_name: &str,
        caller: CallerId,
    ) -> Result<()> {
        metric::validate_metric_name(metric_name)?;

        let Some(check) = self.find_active_vibe_check(vibe_name)? else {
            debug!("No active vibe check, metric dropped");
            return Ok(());
        };

        let Some(option) = vibe::resolve_option(self.storage.as_ref(), &check, caller, |total| {
            self.draw(total)
        })?
        else {
            debug!("No assignable option, metric dropped");
            return Ok(());
        };

        self.storage
            .save_metric(&VibeMetric::new(check.id, option.id, metric_name, value))
    }

    /// Returns every metric of the active vibe check `vibe_name`, grouped by
    /// option.
    ///
    /// Returns `Ok(None)` if no vibe check is active under that name, and
    /// `Ok(Some(empty map))` if it is active but has no metrics yet.
    pub fn metrics_by_option(&self, vibe_name: &str) -> Result<Option<MetricsByOption>> {
        let Some(check) = self.find_active_vibe_check(vibe_name)? else {
            return Ok(None);
        };

        let metrics = self.storage.metrics_for(check.id)?;
        Ok(Some(metric::group_by_option(metrics)))
    }

    // =========================================================================
    // Test Helpers
    // =========================================================================

    /// Returns a reference to the storage engine for integration testing.
    ///
    /// Not part of the public API. Integration tests use this to inspect raw
    /// tables.
    #[doc(hidden)]
    #[inline]
    pub fn storage_for_test(&self) -> &dyn StorageEngine {
        self.storage.as_ref()
    }
}

// VibeDB is auto Send + Sync: Box<dyn StorageEngine + Send + Sync>,
// Mutex<StdRng>, and Config are all Send + Sync.

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vibe_check::NewVibeOption;
    use tempfile::tempdir;

    fn always_on(name: &str, weights: &[u32]) -> NewVibeCheck<u32> {
        NewVibeCheck {
            name: name.into(),
            start_date: Timestamp::from_millis(0),
            end_date: Timestamp::from_millis(i64::MAX),
            options: weights
                .iter()
                .enumerate()
                .map(|(i, &w)| NewVibeOption::new(format!("opt-{}", i), w, i as u32))
                .collect(),
        }
    }

    #[test]
    fn test_open_creates_database() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let db = VibeDB::open(&path, Config::default()).unwrap();

        assert!(path.exists());
        assert_eq!(db.metadata().schema_version, crate::storage::SCHEMA_VERSION);

        db.close().unwrap();
    }

    #[test]
    fn test_config_validation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let invalid_config = Config {
            cache_size_mb: 0,
            ..Default::default()
        };

        let err = VibeDB::open(&path, invalid_config).unwrap_err();
        assert!(err.is_validation());
        assert!(!path.exists());
    }

    #[test]
    fn test_seeded_databases_assign_identically() {
        let dir = tempdir().unwrap();
        let a = VibeDB::open(dir.path().join("a.db"), Config::seeded(11)).unwrap();
        let b = VibeDB::open(dir.path().join("b.db"), Config::seeded(11)).unwrap();
        a.create_vibe_check(always_on("seeded", &[1, 1, 1, 1])).unwrap();
        b.create_vibe_check(always_on("seeded", &[1, 1, 1, 1])).unwrap();

        for _ in 0..20 {
            let caller = CallerId::new();
            let va: Option<u32> = a.feel_vibe("seeded", caller).unwrap();
            let vb: Option<u32> = b.feel_vibe("seeded", caller).unwrap();
            assert_eq!(va, vb);
        }
    }

    #[test]
    fn test_current_vibe_never_assigns() {
        let dir = tempdir().unwrap();
        let db = VibeDB::open(dir.path().join("test.db"), Config::default()).unwrap();
        db.create_vibe_check(always_on("peek", &[1])).unwrap();
        let caller = CallerId::new();

        assert!(db.current_vibe("peek", caller).unwrap().is_none());
        assert!(db.vibes_for(caller).unwrap().is_empty());

        let option = db.resolve("peek", caller).unwrap().unwrap();
        let vibe = db.current_vibe("peek", caller).unwrap().unwrap();
        assert_eq!(vibe.option_id, option.id);
    }

    #[test]
    fn test_record_metric_validates_name_before_lookup() {
        let dir = tempdir().unwrap();
        let db = VibeDB::open(dir.path().join("test.db"), Config::default()).unwrap();

        let err = db
            .record_metric("", Decimal::ONE, "missing", CallerId::new())
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_vibedb_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<VibeDB>();
    }
}
