//! Filter criteria for vibe check lookups.
//!
//! [`VibeCheckFilter`] is the conjunctive query the storage engine answers:
//! name equality plus the two window predicates `start_date <= t` and
//! `end_date >= t`.

use crate::types::Timestamp;
use crate::vibe_check::VibeCheckRecord;

/// Filter criteria for [`StorageEngine::find_vibe_checks`](crate::storage::StorageEngine::find_vibe_checks).
///
/// Fields set to `None` are not filtered on.
///
/// # Example
///
/// ```rust
/// use vibedb::{Timestamp, VibeCheckFilter};
///
/// let filter = VibeCheckFilter::active("pricing-page", Timestamp::now());
/// assert_eq!(filter.name.as_deref(), Some("pricing-page"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VibeCheckFilter {
    /// Only include vibe checks with exactly this name.
    pub name: Option<String>,

    /// Only include vibe checks with `start_date <= t`.
    pub started_by: Option<Timestamp>,

    /// Only include vibe checks with `end_date >= t`.
    pub not_ended_before: Option<Timestamp>,
}

impl VibeCheckFilter {
    /// Vibe checks named `name` whose window contains `now`.
    pub fn active(name: impl Into<String>, now: Timestamp) -> Self {
        Self {
            name: Some(name.into()),
            started_by: Some(now),
            not_ended_before: Some(now),
        }
    }

    /// All vibe checks named `name`, regardless of window.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Returns `true` if the vibe check passes all filter criteria.
    pub fn matches(&self, check: &VibeCheckRecord) -> bool {
        if let Some(ref name) = self.name {
            if &check.name != name {
                return false;
            }
        }

        if let Some(t) = self.started_by {
            if check.start_date > t {
                return false;
            }
        }

        if let Some(t) = self.not_ended_before {
            if check.end_date < t {
                return false;
            }
        }

        true
    }
}
