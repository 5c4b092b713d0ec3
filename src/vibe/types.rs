//! Data types for vibes (assignments).
//!
//! A vibe records which option a caller was given for one vibe check. Vibes
//! are keyed by the `(caller_id, vibe_check_id)` composite, so a caller can
//! hold at most one vibe per vibe check. Once written a vibe is never
//! updated or removed.

use serde::{Deserialize, Serialize};

use crate::types::{CallerId, Timestamp, VibeCheckId, VibeId, VibeOptionId};

/// A stored assignment of one caller to one option.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vibe {
    /// Unique identifier (UUID v7).
    pub id: VibeId,

    /// The caller that owns this vibe (partition key).
    pub caller_id: CallerId,

    /// The vibe check the caller was assigned in.
    pub vibe_check_id: VibeCheckId,

    /// The option the caller was given.
    pub option_id: VibeOptionId,

    /// When the assignment was made.
    pub assigned_at: Timestamp,
}

impl Vibe {
    /// Creates a fresh vibe stamped with the current time.
    pub fn new(caller_id: CallerId, vibe_check_id: VibeCheckId, option_id: VibeOptionId) -> Self {
        Self {
            id: VibeId::new(),
            caller_id,
            vibe_check_id,
            option_id,
            assigned_at: Timestamp::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vibe_new() {
        let caller = CallerId::new();
        let check = VibeCheckId::new();
        let option = VibeOptionId::new();

        let vibe = Vibe::new(caller, check, option);
        assert_eq!(vibe.caller_id, caller);
        assert_eq!(vibe.vibe_check_id, check);
        assert_eq!(vibe.option_id, option);
        assert!(!vibe.id.0.is_nil());
    }

    #[test]
    fn test_vibe_bincode_roundtrip() {
        let vibe = Vibe::new(CallerId::new(), VibeCheckId::new(), VibeOptionId::new());
        let bytes = bincode::serialize(&vibe).unwrap();
        let restored: Vibe = bincode::deserialize(&bytes).unwrap();
        assert_eq!(vibe, restored);
    }
}
