//! Vibe (assignment) resolution.
//!
//! Resolving a vibe check for a caller yields exactly one option:
//!
//! 1. An existing vibe in the caller's partition is replayed without writes.
//! 2. Otherwise the options are loaded, one is drawn by weight, and a new
//!    vibe is inserted.
//!
//! # Concurrent first contact
//!
//! Two resolutions for the same `(caller, vibe_check)` may both see "no vibe"
//! and both draw. The vibes table enforces uniqueness on that pair inside
//! the insert transaction, so only one insert commits. The loser receives
//! [`StorageError::UniqueViolation`], drops its own draw, and returns the
//! winner's option. Every caller therefore observes the single durable
//! assignment.

pub mod selection;
pub mod types;

pub use selection::{draw, select_weighted, total_weight};
pub use types::Vibe;

use tracing::{debug, warn};

use crate::error::{Result, StorageError, VibeDBError};
use crate::storage::StorageEngine;
use crate::types::CallerId;
use crate::vibe_check::{OptionRecord, VibeCheckRecord};

/// Resolves the caller's option for an active vibe check, assigning one on
/// first contact.
///
/// `draw` receives the positive total weight and must return a value in
/// `[0, total)`. It is only called when a new assignment is needed.
///
/// Returns `None` if the vibe check has no options or every option weighs
/// zero; nothing is written in that case.
pub(crate) fn resolve_option<D>(
    storage: &dyn StorageEngine,
    check: &VibeCheckRecord,
    caller: CallerId,
    draw: D,
) -> Result<Option<OptionRecord>>
where
    D: FnOnce(u64) -> Result<u64>,
{
    if let Some(vibe) = storage.get_vibe(caller, check.id)? {
        return option_for_vibe(storage, &vibe).map(Some);
    }

    let mut options = storage.options_for(check.id)?;
    if options.is_empty() {
        debug!(vibe_check = %check.name, "Vibe check has no options");
        return Ok(None);
    }
    options.sort_by_key(|o| o.position);

    let total = total_weight(&options);
    if total == 0 {
        debug!(vibe_check = %check.name, "Vibe check has no positively weighted option");
        return Ok(None);
    }

    let r = draw(total)?;
    let Some(selected) = select_weighted(&options, r) else {
        return Err(VibeDBError::runtime(format!(
            "draw {} out of range for total weight {}",
            r, total
        )));
    };

    let vibe = Vibe::new(caller, check.id, selected.id);
    match storage.insert_vibe(&vibe) {
        Ok(()) => {
            debug!(
                vibe_check = %check.name,
                caller = %caller,
                option = %selected.name,
                "Assigned new vibe"
            );
            Ok(Some(selected.clone()))
        }
        Err(VibeDBError::Storage(StorageError::UniqueViolation { .. })) => {
            warn!(
                vibe_check = %check.name,
                caller = %caller,
                "Lost assignment race, replaying winner"
            );
            let winner = storage.get_vibe(caller, check.id)?.ok_or_else(|| {
                StorageError::corrupted(format!(
                    "vibe for caller {} in {} vanished after unique violation",
                    caller, check.id
                ))
            })?;
            option_for_vibe(storage, &winner).map(Some)
        }
        Err(e) => Err(e),
    }
}

/// Dereferences a stored vibe to its option.
///
/// A vibe pointing at a missing option means the shared partition lost a
/// row, which is reported as corruption.
fn option_for_vibe(storage: &dyn StorageEngine, vibe: &Vibe) -> Result<OptionRecord> {
    storage.get_option(vibe.option_id)?.ok_or_else(|| {
        StorageError::corrupted(format!(
            "vibe {} references missing option {}",
            vibe.id, vibe.option_id
        ))
        .into()
    })
}
