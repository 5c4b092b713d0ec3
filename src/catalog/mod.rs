//! Read-only view over vibe check and option definitions.
//!
//! Absence is a normal outcome here: no matching vibe check yields `None`
//! or `false`, never an error.

pub mod filter;

pub use filter::VibeCheckFilter;

use crate::error::{Result, StorageError};
use crate::storage::StorageEngine;
use crate::types::{Timestamp, VibeCheckId};
use crate::vibe_check::{OptionRecord, VibeCheckRecord};

/// Returns the unique vibe check named `name` whose window contains `now`.
///
/// Overlapping windows for one name are rejected at creation, so more than
/// one match means the stored data is inconsistent and is reported as
/// corruption rather than silently picking one.
pub(crate) fn find_active(
    storage: &dyn StorageEngine,
    name: &str,
    now: Timestamp,
) -> Result<Option<VibeCheckRecord>> {
    let mut matches = storage.find_vibe_checks(&VibeCheckFilter::active(name, now))?;
    match matches.len() {
        0 => Ok(None),
        1 => Ok(matches.pop()),
        n => Err(StorageError::corrupted(format!(
            "{} vibe checks named '{}' are active at {}",
            n, name, now
        ))
        .into()),
    }
}

/// Returns true if a vibe check named `name` is active at `now`.
pub(crate) fn exists(storage: &dyn StorageEngine, name: &str, now: Timestamp) -> Result<bool> {
    Ok(!storage
        .find_vibe_checks(&VibeCheckFilter::active(name, now))?
        .is_empty())
}

/// Returns all options of a vibe check in definition order.
pub(crate) fn options_for(storage: &dyn StorageEngine, id: VibeCheckId) -> Result<Vec<OptionRecord>> {
    let mut options = storage.options_for(id)?;
    options.sort_by_key(|o| o.position);
    Ok(options)
}
