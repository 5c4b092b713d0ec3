//! Core type definitions for vibe-db identifiers and timestamps.
//!
//! All identifiers are UUID v7 newtypes, so freshly created records sort by
//! creation time when keyed by their raw bytes.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            #[doc = concat!("Creates a new `", stringify!($name), "` with a UUID v7 (time-ordered).")]
            #[inline]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates a nil (all zeros) identifier.
            #[inline]
            pub fn nil() -> Self {
                Self(Uuid::nil())
            }

            /// Returns the raw UUID bytes for storage.
            #[inline]
            pub fn as_bytes(&self) -> &[u8; 16] {
                self.0.as_bytes()
            }

            /// Creates an identifier from raw bytes.
            #[inline]
            pub fn from_bytes(bytes: [u8; 16]) -> Self {
                Self(Uuid::from_bytes(bytes))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::nil()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

uuid_id!(
    /// Vibe check (experiment) identifier.
    ///
    /// # Example
    /// ```
    /// use vibedb::VibeCheckId;
    ///
    /// let id = VibeCheckId::new();
    /// println!("Created vibe check: {}", id);
    /// ```
    VibeCheckId
);

uuid_id!(
    /// Vibe option (variant) identifier. Each option belongs to exactly one
    /// vibe check.
    VibeOptionId
);

uuid_id!(
    /// Vibe (assignment) identifier.
    VibeId
);

uuid_id!(
    /// Metric row identifier.
    MetricId
);

uuid_id!(
    /// Identity of the caller whose assignments are being resolved.
    ///
    /// The caller id is the partition key of the private assignment table:
    /// one caller can never observe another caller's vibes.
    CallerId
);

/// Unix timestamp in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    ///
    /// If the system clock is before the Unix epoch, returns the epoch
    /// rather than panicking.
    #[inline]
    pub fn now() -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self(duration.as_millis() as i64)
    }

    /// Creates a timestamp from Unix milliseconds.
    #[inline]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as Unix milliseconds.
    #[inline]
    pub const fn as_millis(&self) -> i64 {
        self.0
    }

    /// Returns this timestamp shifted by `millis` (saturating).
    #[inline]
    pub const fn plus_millis(&self, millis: i64) -> Self {
        Self(self.0.saturating_add(millis))
    }

    /// Returns big-endian bytes for storage (enables lexicographic ordering).
    #[inline]
    pub fn to_be_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(VibeCheckId::new(), VibeCheckId::new());
        assert_ne!(CallerId::new(), CallerId::new());
    }

    #[test]
    fn test_id_bytes_roundtrip() {
        let id = VibeOptionId::new();
        assert_eq!(VibeOptionId::from_bytes(*id.as_bytes()), id);
    }

    #[test]
    fn test_default_is_nil() {
        assert_eq!(MetricId::default(), MetricId::nil());
        assert!(VibeId::default().0.is_nil());
    }

    #[test]
    fn test_v7_ids_sort_by_creation() {
        let first = VibeCheckId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = VibeCheckId::new();
        assert!(first.as_bytes() < second.as_bytes());
    }

    #[test]
    fn test_timestamp_ordering_and_bytes() {
        let t1 = Timestamp::from_millis(1_000);
        let t2 = t1.plus_millis(1);
        assert!(t1 < t2);
        assert!(t1.to_be_bytes() < t2.to_be_bytes());
        assert_eq!(t2.as_millis(), 1_001);
    }

    #[test]
    fn test_plus_millis_saturates() {
        let t = Timestamp::from_millis(i64::MAX);
        assert_eq!(t.plus_millis(10), t);
    }

    #[test]
    fn test_id_bincode_roundtrip() {
        let id = CallerId::new();
        let bytes = bincode::serialize(&id).unwrap();
        let restored: CallerId = bincode::deserialize(&bytes).unwrap();
        assert_eq!(id, restored);
    }
}
