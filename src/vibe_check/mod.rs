//! Vibe check (experiment) definitions.
//!
//! A **vibe check** is a named A/B test active over an inclusive time window,
//! with weighted options carrying arbitrary payloads.
//!
//! # Operations
//!
//! All vibe check operations are available on [`VibeDB`](crate::VibeDB):
//!
//! - [`create_vibe_check(check)`](crate::VibeDB::create_vibe_check)
//! - [`load_vibe_check(name)`](crate::VibeDB::load_vibe_check)
//! - [`vibe_check_exists(name)`](crate::VibeDB::vibe_check_exists)
//! - [`options_for(id)`](crate::VibeDB::options_for)
//!
//! # Constraints
//!
//! - Name non-empty and ≤ 255 bytes
//! - `end_date >= start_date`
//! - At most 64 options, each named (≤ 255 bytes) with a payload ≤ 64 KiB
//! - No two vibe checks with the same name may have overlapping windows
//!   (checked inside the write transaction, not here)
//! - Options are written together with their vibe check and never change

pub mod types;

pub use types::{NewVibeCheck, NewVibeOption, OptionRecord, VibeCheck, VibeCheckRecord, VibeOption};

use serde::Serialize;

use crate::codec::PayloadCodec;
use crate::error::{Result, ValidationError, VibeDBError};
use crate::storage::schema::{MAX_NAME_LENGTH, MAX_OPTIONS, MAX_PAYLOAD_SIZE};
use crate::types::{Timestamp, VibeCheckId, VibeOptionId};

/// Validates a [`NewVibeCheck`] before its payloads are encoded.
///
/// Empty option lists and all-zero weights are allowed; such a vibe check
/// simply never assigns anyone.
pub(crate) fn validate_new_vibe_check<V>(check: &NewVibeCheck<V>) -> Result<()> {
    validate_name("name", &check.name)?;

    if check.end_date < check.start_date {
        return Err(ValidationError::invalid_field(
            "end_date",
            format!(
                "must not be before start_date ({} < {})",
                check.end_date, check.start_date
            ),
        )
        .into());
    }

    if check.options.len() > MAX_OPTIONS {
        return Err(
            ValidationError::too_many_items("options", check.options.len(), MAX_OPTIONS).into(),
        );
    }

    for option in &check.options {
        validate_name("options.name", &option.name)?;
    }

    Ok(())
}

fn validate_name(field: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ValidationError::required_field(field).into());
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(ValidationError::invalid_field(
            field,
            format!(
                "must be at most {} bytes, got {}",
                MAX_NAME_LENGTH,
                name.len()
            ),
        )
        .into());
    }
    Ok(())
}

/// Turns a validated [`NewVibeCheck`] into the records that get persisted.
///
/// Payloads are encoded here, so a value the codec rejects fails the whole
/// definition before anything is written.
pub(crate) fn into_records<V: Serialize>(
    check: NewVibeCheck<V>,
    codec: PayloadCodec,
) -> Result<(VibeCheckRecord, Vec<OptionRecord>)> {
    let record = VibeCheckRecord {
        id: VibeCheckId::new(),
        name: check.name,
        start_date: check.start_date,
        end_date: check.end_date,
        created_at: Timestamp::now(),
    };

    let options = check
        .options
        .into_iter()
        .enumerate()
        .map(|(position, option)| {
            let payload = codec.encode(&option.value)?;
            if payload.len() > MAX_PAYLOAD_SIZE {
                return Err(VibeDBError::from(ValidationError::content_too_large(
                    payload.len(),
                    MAX_PAYLOAD_SIZE,
                )));
            }
            Ok(OptionRecord {
                id: VibeOptionId::new(),
                vibe_check_id: record.id,
                name: option.name,
                weight: option.weight,
                position: position as u32,
                payload,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok((record, options))
}
