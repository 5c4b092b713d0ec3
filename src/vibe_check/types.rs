//! Type definitions for vibe checks and their options.
//!
//! Two layers exist:
//!
//! ```text
//! NewVibeCheck<V> / VibeCheck<V> / VibeOption<V>   (typed, API boundary)
//!         ↓ PayloadCodec::encode / decode
//! VibeCheckRecord / OptionRecord                    (stored, opaque payload bytes)
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::codec::PayloadCodec;
use crate::error::Result;
use crate::types::{Timestamp, VibeCheckId, VibeOptionId};

/// A stored vibe check (experiment) without its options.
///
/// Active while `start_date <= now <= end_date`. Both bounds are inclusive.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VibeCheckRecord {
    /// Unique identifier (UUID v7).
    pub id: VibeCheckId,

    /// Name used to resolve the vibe check. Unique among vibe checks whose
    /// windows overlap.
    pub name: String,

    /// First instant at which the vibe check is active.
    pub start_date: Timestamp,

    /// Last instant at which the vibe check is active.
    pub end_date: Timestamp,

    /// When this vibe check was created.
    pub created_at: Timestamp,
}

impl VibeCheckRecord {
    /// Returns true if `now` falls inside the inclusive activation window.
    #[inline]
    pub fn is_active_at(&self, now: Timestamp) -> bool {
        self.start_date <= now && now <= self.end_date
    }

    /// Returns true if `[start, end]` shares at least one instant with this
    /// vibe check's window.
    #[inline]
    pub fn overlaps(&self, start: Timestamp, end: Timestamp) -> bool {
        self.start_date <= end && start <= self.end_date
    }
}

/// A stored option with its payload still encoded.
///
/// This is what the assignment engine moves around; it never looks inside
/// `payload`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionRecord {
    /// Unique identifier (UUID v7).
    pub id: VibeOptionId,

    /// The vibe check this option belongs to.
    pub vibe_check_id: VibeCheckId,

    /// Display name.
    pub name: String,

    /// Relative selection weight. Zero-weight options are never selected.
    pub weight: u32,

    /// Definition order within the vibe check. Selection walks options in
    /// ascending position.
    pub position: u32,

    /// Encoded payload.
    pub payload: Vec<u8>,
}

impl OptionRecord {
    /// Decodes this record into a typed [`VibeOption`].
    ///
    /// # Errors
    ///
    /// Returns a payload error if the stored bytes are not a valid `V`.
    pub fn decode<V: DeserializeOwned>(&self, codec: PayloadCodec) -> Result<VibeOption<V>> {
        Ok(VibeOption {
            id: self.id,
            vibe_check_id: self.vibe_check_id,
            name: self.name.clone(),
            weight: self.weight,
            value: codec.decode(&self.payload)?,
        })
    }
}

/// A vibe check with its options decoded to `V`.
#[derive(Clone, Debug)]
pub struct VibeCheck<V> {
    /// Unique identifier.
    pub id: VibeCheckId,

    /// Name of the vibe check.
    pub name: String,

    /// Start of the activation window (inclusive).
    pub start_date: Timestamp,

    /// End of the activation window (inclusive).
    pub end_date: Timestamp,

    /// Options in definition order.
    pub options: Vec<VibeOption<V>>,
}

/// One variant of a vibe check, payload decoded to `V`.
#[derive(Clone, Debug, PartialEq)]
pub struct VibeOption<V> {
    /// Unique identifier.
    pub id: VibeOptionId,

    /// The vibe check this option belongs to.
    pub vibe_check_id: VibeCheckId,

    /// Display name.
    pub name: String,

    /// Relative selection weight.
    pub weight: u32,

    /// The payload handed to callers assigned this option.
    pub value: V,
}

/// Input for defining a new vibe check.
///
/// # Example
///
/// ```rust,ignore
/// use vibedb::{NewVibeCheck, NewVibeOption, Timestamp};
///
/// let now = Timestamp::now();
/// let id = db.create_vibe_check(NewVibeCheck {
///     name: "checkout-button".into(),
///     start_date: now,
///     end_date: now.plus_millis(7 * 24 * 3600 * 1000),
///     options: vec![
///         NewVibeOption::new("control", 1, "blue"),
///         NewVibeOption::new("treatment", 1, "green"),
///     ],
/// })?;
/// ```
#[derive(Clone, Debug)]
pub struct NewVibeCheck<V> {
    /// Name (non-empty, max 255 bytes).
    pub name: String,

    /// Start of the activation window (inclusive).
    pub start_date: Timestamp,

    /// End of the activation window (inclusive, must be >= `start_date`).
    pub end_date: Timestamp,

    /// Options in definition order (max 64).
    pub options: Vec<NewVibeOption<V>>,
}

/// Input for one option of a [`NewVibeCheck`].
#[derive(Clone, Debug)]
pub struct NewVibeOption<V> {
    /// Display name (non-empty, max 255 bytes).
    pub name: String,

    /// Relative selection weight.
    pub weight: u32,

    /// Payload value.
    pub value: V,
}

impl<V> NewVibeOption<V> {
    /// Creates an option input.
    pub fn new(name: impl Into<String>, weight: u32, value: V) -> Self {
        Self {
            name: name.into(),
            weight,
            value,
        }
    }
}
