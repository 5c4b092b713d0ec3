//! Integration tests for VibeDB database lifecycle operations.
//!
//! These tests verify the end-to-end behavior of:
//! - Opening new databases
//! - Opening existing databases
//! - Configuration validation
//! - Lock detection
//! - Proper resource cleanup on close

use vibedb::{Config, PayloadCodec, StorageError, SyncMode, VibeDB, VibeDBError};
use tempfile::tempdir;

// ============================================================================
// Database Creation Tests
// ============================================================================

#[test]
fn test_open_creates_new_database() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.db");

    assert!(!path.exists(), "Database should not exist before open");

    let db = VibeDB::open(&path, Config::default()).unwrap();

    assert!(path.exists(), "Database file should exist after open");

    db.close().unwrap();
}

#[test]
fn test_open_with_default_config() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.db");

    let db = VibeDB::open(&path, Config::default()).unwrap();

    assert_eq!(db.config().sync_mode, SyncMode::Normal);
    assert_eq!(db.config().payload_codec, PayloadCodec::Json);
    assert_eq!(db.config().cache_size_mb, 64);
    assert!(db.config().rng_seed.is_none());

    db.close().unwrap();
}

#[test]
fn test_open_with_each_sync_mode() {
    for sync_mode in [SyncMode::Normal, SyncMode::Fast, SyncMode::Paranoid] {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let config = Config {
            sync_mode,
            ..Default::default()
        };
        let db = VibeDB::open(&path, config).unwrap();
        assert_eq!(db.config().sync_mode, sync_mode);
        db.close().unwrap();
    }
}

// ============================================================================
// Reopen Tests
// ============================================================================

#[test]
fn test_reopen_preserves_metadata() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.db");

    let db = VibeDB::open(&path, Config::default()).unwrap();
    let created_at = db.metadata().created_at;
    db.close().unwrap();

    std::thread::sleep(std::time::Duration::from_millis(10));

    let db = VibeDB::open(&path, Config::default()).unwrap();
    assert_eq!(db.metadata().created_at, created_at);
    assert!(db.metadata().last_opened_at > created_at);
    db.close().unwrap();
}

#[test]
fn test_reopen_with_different_codec_is_allowed() {
    // The codec only affects payload bytes; the schema is unchanged.
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.db");

    VibeDB::open(&path, Config::default())
        .unwrap()
        .close()
        .unwrap();

    let config = Config {
        payload_codec: PayloadCodec::Bincode,
        ..Default::default()
    };
    let db = VibeDB::open(&path, config).unwrap();
    assert_eq!(db.config().payload_codec, PayloadCodec::Bincode);
    db.close().unwrap();
}

// ============================================================================
// Validation & Locking Tests
// ============================================================================

#[test]
fn test_zero_cache_size_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.db");

    let config = Config {
        cache_size_mb: 0,
        ..Default::default()
    };

    let result = VibeDB::open(&path, config);
    assert!(matches!(result, Err(VibeDBError::Validation(_))));
    assert!(!path.exists(), "Invalid config must not create a file");
}

#[test]
fn test_second_open_of_same_file_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.db");

    let db = VibeDB::open(&path, Config::default()).unwrap();

    let err = VibeDB::open(&path, Config::default()).unwrap_err();
    assert!(err.is_storage(), "Expected storage error, got: {:?}", err);
    assert!(matches!(
        err,
        VibeDBError::Storage(StorageError::DatabaseLocked | StorageError::Redb(_))
    ));

    db.close().unwrap();
}

#[test]
fn test_close_releases_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.db");

    let db = VibeDB::open(&path, Config::default()).unwrap();
    db.close().unwrap();

    // Reopening after close must succeed
    let db = VibeDB::open(&path, Config::default()).unwrap();
    db.close().unwrap();
}

#[test]
fn test_debug_output_names_database() {
    let dir = tempdir().unwrap();
    let db = VibeDB::open(dir.path().join("test.db"), Config::default()).unwrap();

    let debug = format!("{:?}", db);
    assert!(debug.contains("VibeDB"));

    db.close().unwrap();
}
