//! # VibeDB
//!
//! Embedded A/B testing store: weighted experiments, sticky per-caller
//! assignment, and metric collection on top of an ACID key-value engine.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use vibedb::{CallerId, Config, NewVibeCheck, NewVibeOption, Timestamp, VibeDB};
//!
//! // Open or create a database
//! let db = VibeDB::open("./vibes.db", Config::default())?;
//!
//! // Define a vibe check running for a week
//! let now = Timestamp::now();
//! db.create_vibe_check(NewVibeCheck {
//!     name: "pricing-page".into(),
//!     start_date: now,
//!     end_date: now.plus_millis(7 * 86_400_000),
//!     options: vec![
//!         NewVibeOption::new("control", 1, 9.99),
//!         NewVibeOption::new("discount", 1, 7.99),
//!     ],
//! })?;
//!
//! // Each caller always sees the same option
//! let caller = CallerId::new();
//! let price: Option<f64> = db.feel_vibe("pricing-page", caller)?;
//!
//! // Record how it went, then compare options
//! db.record_metric("converted", 1.into(), "pricing-page", caller)?;
//! let by_option = db.metrics_by_option("pricing-page")?;
//!
//! db.close()?;
//! ```
//!
//! ## Key Concepts
//!
//! ### Vibe Check
//!
//! A **vibe check** is a named experiment, active over an inclusive time
//! window. At most one vibe check per name is active at any instant.
//!
//! ### Option
//!
//! An **option** is one variant of a vibe check. It carries a relative
//! weight and a typed payload, stored as bytes by the configured
//! [`PayloadCodec`].
//!
//! ### Vibe
//!
//! A **vibe** is the durable record of which option a caller was given.
//! Each caller holds at most one vibe per vibe check, and only that caller's
//! lookups ever see it.
//!
//! ### Metric
//!
//! A **metric** is a named decimal measurement recorded against a caller's
//! option. Metrics are append-only and grouped by option for analysis.
//!
//! ## Thread Safety
//!
//! `VibeDB` is `Send + Sync` and can be shared across threads using `Arc`.
//! The database uses MVCC for concurrent reads with exclusive write locking.
//! For async services, wrap it in a [`DbVibeProvider`].

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_op_in_unsafe_fn)]

// ============================================================================
// Module declarations
// ============================================================================

mod codec;
mod config;
mod db;
mod error;
mod provider;
mod types;

pub mod storage;

// Domain modules
mod catalog;
mod metric;
mod vibe;
mod vibe_check;

// ============================================================================
// Public API re-exports
// ============================================================================

// Main database interface
pub use db::VibeDB;

// Async surface
pub use provider::{DbVibeProvider, VibeProvider};

// Configuration
pub use codec::PayloadCodec;
pub use config::{Config, SyncMode};

// Error handling
pub use error::{Result, StorageError, ValidationError, VibeDBError};

// Core types
pub use types::{CallerId, MetricId, Timestamp, VibeCheckId, VibeId, VibeOptionId};

// Domain types
pub use catalog::VibeCheckFilter;
pub use metric::{MetricsByOption, VibeMetric};
pub use vibe::Vibe;
pub use vibe_check::{
    NewVibeCheck, NewVibeOption, OptionRecord, VibeCheck, VibeCheckRecord, VibeOption,
};

/// Weighted option selection primitives.
pub use vibe::selection;

// Storage (for advanced users)
pub use storage::DatabaseMetadata;

// ============================================================================
// Prelude module for convenient imports
// ============================================================================

/// Convenient imports for common VibeDB usage.
///
/// ```rust
/// use vibedb::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::db::VibeDB;
    pub use crate::error::{Result, VibeDBError};
    pub use crate::provider::{DbVibeProvider, VibeProvider};
    pub use crate::types::{CallerId, Timestamp, VibeCheckId};
    pub use crate::vibe_check::{NewVibeCheck, NewVibeOption};
}
