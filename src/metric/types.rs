//! Data types for vibe metrics.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{MetricId, Timestamp, VibeCheckId, VibeOptionId};

/// A recorded measurement attributed to the option a caller was assigned.
///
/// Metrics are append-only. Recording the same name twice produces two
/// rows, which together form a time series for that name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VibeMetric {
    /// Unique identifier (UUID v7).
    pub id: MetricId,

    /// The vibe check the metric belongs to.
    pub vibe_check_id: VibeCheckId,

    /// The option the recording caller was assigned.
    pub option_id: VibeOptionId,

    /// Metric name (e.g. "conversion", "time_on_page_ms").
    pub name: String,

    /// Metric value, stored exactly.
    pub value: Decimal,

    /// When the metric was recorded.
    pub recorded_at: Timestamp,
}

impl VibeMetric {
    /// Creates a metric stamped with the current time.
    pub fn new(
        vibe_check_id: VibeCheckId,
        option_id: VibeOptionId,
        name: impl Into<String>,
        value: Decimal,
    ) -> Self {
        Self {
            id: MetricId::new(),
            vibe_check_id,
            option_id,
            name: name.into(),
            value,
            recorded_at: Timestamp::now(),
        }
    }
}

/// Metrics of one vibe check grouped by the option they were recorded against.
pub type MetricsByOption = HashMap<VibeOptionId, Vec<VibeMetric>>;
