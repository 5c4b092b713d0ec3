//! redb storage engine implementation.
//!
//! This module provides the storage backend for vibe-db using
//! [redb](https://docs.rs/redb), a pure Rust embedded key-value store.
//!
//! # Features
//!
//! - ACID transactions with MVCC
//! - Single-writer, multiple-reader concurrency
//! - Automatic crash recovery
//!
//! The single-writer property is what makes check-then-insert inside one
//! write transaction atomic: no other write can commit between the check
//! and the insert.

use std::path::{Path, PathBuf};

use ::redb::{
    Database, Durability, ReadableMultimapTable, ReadableTable, WriteTransaction,
};
use bincode::Options;
use tracing::{debug, info, instrument, warn};

use super::schema::{
    caller_range_end, caller_range_start, encode_metric_index_key, encode_vibe_key,
    metric_range_end, metric_range_start, DatabaseMetadata, METADATA_TABLE,
    METRICS_BY_VIBE_CHECK_TABLE, METRICS_TABLE, OPTIONS_BY_VIBE_CHECK_TABLE, OPTIONS_TABLE,
    SCHEMA_VERSION, VIBES_TABLE, VIBES_TABLE_NAME, VIBE_CHECKS_BY_NAME_TABLE, VIBE_CHECKS_TABLE,
};
use super::StorageEngine;
use crate::catalog::VibeCheckFilter;
use crate::config::Config;
use crate::error::{Result, StorageError, ValidationError, VibeDBError};
use crate::metric::VibeMetric;
use crate::types::{CallerId, VibeCheckId, VibeOptionId};
use crate::vibe::Vibe;
use crate::vibe_check::{OptionRecord, VibeCheckRecord};

/// Metadata key in the metadata table.
const METADATA_KEY: &str = "db_metadata";

/// redb storage engine wrapper.
///
/// # Thread Safety
///
/// `RedbStorage` is `Send + Sync`. redb handles internal synchronization
/// using MVCC for readers and exclusive locking for writers.
#[derive(Debug)]
pub struct RedbStorage {
    /// The redb database handle.
    db: Database,

    /// Cached database metadata.
    metadata: DatabaseMetadata,

    /// Path to the database file.
    path: PathBuf,

    /// Commit durability applied to every write transaction.
    durability: Durability,

    /// Whether write transactions use redb's two-phase commit.
    two_phase_commit: bool,
}

/// Commit settings derived from [`SyncMode`](crate::config::SyncMode).
#[derive(Clone, Copy)]
struct CommitMode {
    durability: Durability,
    two_phase_commit: bool,
}

impl RedbStorage {
    /// Opens or creates a database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The database file is corrupted
    /// - The database is locked by another process
    /// - Schema version doesn't match
    #[instrument(skip(config), fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>, config: &Config) -> Result<Self> {
        let path = path.as_ref();
        let db_exists = path.exists();

        debug!(db_exists = db_exists, "Opening storage engine");

        let db = Self::create_database(path, config)?;
        let commit = CommitMode {
            durability: config.sync_mode.durability(),
            two_phase_commit: config.sync_mode.two_phase_commit(),
        };

        if db_exists {
            Self::open_existing(db, path.to_path_buf(), commit)
        } else {
            Self::initialize_new(db, path.to_path_buf(), commit)
        }
    }

    /// Creates the redb database with appropriate settings.
    fn create_database(path: &Path, config: &Config) -> Result<Database> {
        let mut builder = Database::builder();
        builder.set_cache_size(config.cache_size_bytes());

        // redb has no typed variant for lock conflicts; match on the message.
        let db = builder.create(path).map_err(|e| {
            if e.to_string().contains("locked") {
                StorageError::DatabaseLocked
            } else {
                StorageError::Redb(e.to_string())
            }
        })?;

        debug!("Database file opened successfully");
        Ok(db)
    }

    /// Initializes a new database with tables and metadata.
    #[instrument(skip(db, commit), fields(path = %path.display()))]
    fn initialize_new(db: Database, path: PathBuf, commit: CommitMode) -> Result<Self> {
        info!("Initializing new database");

        let metadata = DatabaseMetadata::new();

        let write_txn = db.begin_write().map_err(StorageError::from)?;
        {
            let mut meta_table = write_txn.open_table(METADATA_TABLE)?;
            let metadata_bytes = bincode::serialize(&metadata)
                .map_err(|e| StorageError::serialization(e.to_string()))?;
            meta_table.insert(METADATA_KEY, metadata_bytes.as_slice())?;

            // Tables are created on first open; create them all up front so
            // read transactions never hit a missing table.
            let _ = write_txn.open_table(VIBE_CHECKS_TABLE)?;
            let _ = write_txn.open_multimap_table(VIBE_CHECKS_BY_NAME_TABLE)?;
            let _ = write_txn.open_table(OPTIONS_TABLE)?;
            let _ = write_txn.open_multimap_table(OPTIONS_BY_VIBE_CHECK_TABLE)?;
            let _ = write_txn.open_table(VIBES_TABLE)?;
            let _ = write_txn.open_table(METRICS_TABLE)?;
            let _ = write_txn.open_multimap_table(METRICS_BY_VIBE_CHECK_TABLE)?;
        }
        write_txn.commit().map_err(StorageError::from)?;

        info!(schema_version = SCHEMA_VERSION, "Database initialized");

        Ok(Self {
            db,
            metadata,
            path,
            durability: commit.durability,
            two_phase_commit: commit.two_phase_commit,
        })
    }

    /// Opens and validates an existing database.
    #[instrument(skip(db, commit), fields(path = %path.display()))]
    fn open_existing(db: Database, path: PathBuf, commit: CommitMode) -> Result<Self> {
        info!("Opening existing database");

        let read_txn = db.begin_read().map_err(StorageError::from)?;

        let metadata = {
            let meta_table = read_txn.open_table(METADATA_TABLE).map_err(|e| {
                StorageError::corrupted(format!("Cannot open metadata table: {}", e))
            })?;

            let metadata_bytes = meta_table
                .get(METADATA_KEY)
                .map_err(StorageError::from)?
                .ok_or_else(|| StorageError::corrupted("Missing database metadata"))?;

            // Exact-length decode: a garbage record must not pass as a foreign version.
            bincode::DefaultOptions::new()
                .with_fixint_encoding()
                .reject_trailing_bytes()
                .deserialize::<DatabaseMetadata>(metadata_bytes.value())
                .map_err(|e| StorageError::corrupted(format!("Invalid metadata format: {}", e)))?
        };

        drop(read_txn);

        if !metadata.is_compatible() {
            warn!(
                expected = SCHEMA_VERSION,
                found = metadata.schema_version,
                "Schema version mismatch"
            );
            return Err(VibeDBError::Storage(StorageError::SchemaVersionMismatch {
                expected: SCHEMA_VERSION,
                found: metadata.schema_version,
            }));
        }

        let mut metadata = metadata;
        metadata.touch();

        let write_txn = db.begin_write().map_err(StorageError::from)?;
        {
            let mut meta_table = write_txn.open_table(METADATA_TABLE)?;
            let metadata_bytes = bincode::serialize(&metadata)
                .map_err(|e| StorageError::serialization(e.to_string()))?;
            meta_table.insert(METADATA_KEY, metadata_bytes.as_slice())?;
        }
        write_txn.commit().map_err(StorageError::from)?;

        info!(
            schema_version = metadata.schema_version,
            "Database opened successfully"
        );

        Ok(Self {
            db,
            metadata,
            path,
            durability: commit.durability,
            two_phase_commit: commit.two_phase_commit,
        })
    }

    /// Returns a reference to the underlying redb database.
    #[cfg(test)]
    pub(crate) fn database(&self) -> &Database {
        &self.db
    }

    /// Begins a write transaction with the configured durability.
    fn begin_write(&self) -> Result<WriteTransaction> {
        let mut write_txn = self.db.begin_write().map_err(StorageError::from)?;
        write_txn.set_durability(self.durability);
        write_txn.set_two_phase_commit(self.two_phase_commit);
        Ok(write_txn)
    }
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    bincode::deserialize(bytes).map_err(|e| StorageError::serialization(e.to_string()).into())
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
    bincode::serialize(value).map_err(|e| StorageError::serialization(e.to_string()).into())
}

impl StorageEngine for RedbStorage {
    // =========================================================================
    // Lifecycle
    // =========================================================================

    fn metadata(&self) -> &DatabaseMetadata {
        &self.metadata
    }

    #[instrument(skip(self))]
    fn close(self: Box<Self>) -> Result<()> {
        info!("Closing storage engine");

        // redb flushes durably on drop, which is infallible.
        drop(self.db);

        info!("Storage engine closed");
        Ok(())
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }

    // =========================================================================
    // Vibe Checks & Options
    // =========================================================================

    #[instrument(skip(self, check, options), fields(name = %check.name, options = options.len()))]
    fn save_vibe_check(&self, check: &VibeCheckRecord, options: &[OptionRecord]) -> Result<()> {
        let check_bytes = encode(check)?;
        let option_bytes = options
            .iter()
            .map(|o| encode(o).map(|bytes| (o.id, bytes)))
            .collect::<Result<Vec<_>>>()?;

        let write_txn = self.begin_write()?;

        let overlapping = {
            let by_name = write_txn.open_multimap_table(VIBE_CHECKS_BY_NAME_TABLE)?;
            let checks = write_txn.open_table(VIBE_CHECKS_TABLE)?;

            let mut overlapping = false;
            for id in by_name.get(check.name.as_str())? {
                let id = *id?.value();
                if let Some(bytes) = checks.get(&id)? {
                    let existing: VibeCheckRecord = decode(bytes.value())?;
                    if existing.overlaps(check.start_date, check.end_date) {
                        overlapping = true;
                        break;
                    }
                }
            }
            overlapping
        };

        if overlapping {
            write_txn.abort().map_err(StorageError::from)?;
            warn!("Rejected vibe check overlapping an existing window");
            return Err(ValidationError::overlapping_vibe_check(&check.name).into());
        }

        {
            let mut checks = write_txn.open_table(VIBE_CHECKS_TABLE)?;
            checks.insert(check.id.as_bytes(), check_bytes.as_slice())?;

            let mut by_name = write_txn.open_multimap_table(VIBE_CHECKS_BY_NAME_TABLE)?;
            by_name.insert(check.name.as_str(), check.id.as_bytes())?;

            let mut option_table = write_txn.open_table(OPTIONS_TABLE)?;
            let mut by_check = write_txn.open_multimap_table(OPTIONS_BY_VIBE_CHECK_TABLE)?;
            for (id, bytes) in &option_bytes {
                option_table.insert(id.as_bytes(), bytes.as_slice())?;
                by_check.insert(check.id.as_bytes(), id.as_bytes())?;
            }
        }
        write_txn.commit().map_err(StorageError::from)?;

        debug!(id = %check.id, "Vibe check saved");
        Ok(())
    }

    fn get_vibe_check(&self, id: VibeCheckId) -> Result<Option<VibeCheckRecord>> {
        let read_txn = self.db.begin_read().map_err(StorageError::from)?;
        let table = read_txn.open_table(VIBE_CHECKS_TABLE)?;

        match table.get(id.as_bytes())? {
            Some(value) => Ok(Some(decode(value.value())?)),
            None => Ok(None),
        }
    }

    fn find_vibe_checks(&self, filter: &VibeCheckFilter) -> Result<Vec<VibeCheckRecord>> {
        let read_txn = self.db.begin_read().map_err(StorageError::from)?;
        let checks = read_txn.open_table(VIBE_CHECKS_TABLE)?;

        let mut found = Vec::new();
        match filter.name {
            Some(ref name) => {
                let by_name = read_txn.open_multimap_table(VIBE_CHECKS_BY_NAME_TABLE)?;
                for id in by_name.get(name.as_str())? {
                    let id = *id?.value();
                    let bytes = checks.get(&id)?.ok_or_else(|| {
                        StorageError::corrupted(format!(
                            "name index points at missing vibe check {}",
                            VibeCheckId::from_bytes(id)
                        ))
                    })?;
                    let check: VibeCheckRecord = decode(bytes.value())?;
                    if filter.matches(&check) {
                        found.push(check);
                    }
                }
            }
            None => {
                for entry in checks.iter()? {
                    let (_, value) = entry.map_err(StorageError::from)?;
                    let check: VibeCheckRecord = decode(value.value())?;
                    if filter.matches(&check) {
                        found.push(check);
                    }
                }
            }
        }

        Ok(found)
    }

    fn get_option(&self, id: VibeOptionId) -> Result<Option<OptionRecord>> {
        let read_txn = self.db.begin_read().map_err(StorageError::from)?;
        let table = read_txn.open_table(OPTIONS_TABLE)?;

        match table.get(id.as_bytes())? {
            Some(value) => Ok(Some(decode(value.value())?)),
            None => Ok(None),
        }
    }

    fn options_for(&self, vibe_check: VibeCheckId) -> Result<Vec<OptionRecord>> {
        let read_txn = self.db.begin_read().map_err(StorageError::from)?;
        let by_check = read_txn.open_multimap_table(OPTIONS_BY_VIBE_CHECK_TABLE)?;
        let table = read_txn.open_table(OPTIONS_TABLE)?;

        let mut options = Vec::new();
        for id in by_check.get(vibe_check.as_bytes())? {
            let id = *id?.value();
            let bytes = table.get(&id)?.ok_or_else(|| {
                StorageError::corrupted(format!(
                    "option index points at missing option {}",
                    VibeOptionId::from_bytes(id)
                ))
            })?;
            options.push(decode(bytes.value())?);
        }

        Ok(options)
    }

    // =========================================================================
    // Vibes
    // =========================================================================

    fn get_vibe(&self, caller: CallerId, vibe_check: VibeCheckId) -> Result<Option<Vibe>> {
        let read_txn = self.db.begin_read().map_err(StorageError::from)?;
        let table = read_txn.open_table(VIBES_TABLE)?;

        let key = encode_vibe_key(caller, vibe_check);
        match table.get(&key)? {
            Some(value) => Ok(Some(decode(value.value())?)),
            None => Ok(None),
        }
    }

    fn insert_vibe(&self, vibe: &Vibe) -> Result<()> {
        let key = encode_vibe_key(vibe.caller_id, vibe.vibe_check_id);
        let bytes = encode(vibe)?;

        let write_txn = self.begin_write()?;
        let taken = {
            let mut table = write_txn.open_table(VIBES_TABLE)?;
            if table.get(&key)?.is_some() {
                true
            } else {
                table.insert(&key, bytes.as_slice())?;
                false
            }
        };

        if taken {
            write_txn.abort().map_err(StorageError::from)?;
            return Err(StorageError::unique_violation(
                VIBES_TABLE_NAME,
                format!("{}/{}", vibe.caller_id, vibe.vibe_check_id),
            )
            .into());
        }

        write_txn.commit().map_err(StorageError::from)?;

        debug!(id = %vibe.id, caller = %vibe.caller_id, "Vibe saved");
        Ok(())
    }

    fn list_vibes(&self, caller: CallerId) -> Result<Vec<Vibe>> {
        let read_txn = self.db.begin_read().map_err(StorageError::from)?;
        let table = read_txn.open_table(VIBES_TABLE)?;

        let start = caller_range_start(caller);
        let end = caller_range_end(caller);

        let mut vibes = Vec::new();
        for entry in table.range::<&[u8; 32]>(&start..=&end)? {
            let (_, value) = entry.map_err(StorageError::from)?;
            vibes.push(decode(value.value())?);
        }

        Ok(vibes)
    }

    // =========================================================================
    // Metrics
    // =========================================================================

    fn save_metric(&self, metric: &VibeMetric) -> Result<()> {
        let bytes = encode(metric)?;
        let index_key = encode_metric_index_key(metric.vibe_check_id.as_bytes(), metric.recorded_at);

        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(METRICS_TABLE)?;
            table.insert(metric.id.as_bytes(), bytes.as_slice())?;

            let mut index = write_txn.open_multimap_table(METRICS_BY_VIBE_CHECK_TABLE)?;
            index.insert(&index_key, metric.id.as_bytes())?;
        }
        write_txn.commit().map_err(StorageError::from)?;

        debug!(id = %metric.id, name = %metric.name, "Metric saved");
        Ok(())
    }

    fn metrics_for(&self, vibe_check: VibeCheckId) -> Result<Vec<VibeMetric>> {
        let read_txn = self.db.begin_read().map_err(StorageError::from)?;
        let index = read_txn.open_multimap_table(METRICS_BY_VIBE_CHECK_TABLE)?;
        let table = read_txn.open_table(METRICS_TABLE)?;

        let start = metric_range_start(vibe_check.as_bytes());
        let end = metric_range_end(vibe_check.as_bytes());

        let mut metrics = Vec::new();
        for entry in index.range::<&[u8; 24]>(&start..=&end)? {
            let (_, ids) = entry.map_err(StorageError::from)?;
            for id in ids {
                let id = *id?.value();
                let bytes = table.get(&id)?.ok_or_else(|| {
                    StorageError::corrupted("metric index points at missing metric")
                })?;
                metrics.push(decode(bytes.value())?);
            }
        }

        Ok(metrics)
    }
}

// RedbStorage is auto Send + Sync: Database, DatabaseMetadata, PathBuf, and
// Durability are all Send + Sync.
