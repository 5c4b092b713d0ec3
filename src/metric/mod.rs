//! Metric recording and aggregation.
//!
//! # Operations
//!
//! - [`record_metric(name, value, vibe_name, caller)`](crate::VibeDB::record_metric)
//!   resolves (or creates) the caller's vibe, then appends one metric row.
//! - [`metrics_by_option(vibe_name)`](crate::VibeDB::metrics_by_option)
//!   returns every metric of the active vibe check grouped by option.
//!
//! The vibe is always persisted before its metric, so an interrupted record
//! can leave an assignment without a metric but never a metric without an
//! assignment.

pub mod types;

pub use types::{MetricsByOption, VibeMetric};

use crate::error::{Result, ValidationError};
use crate::storage::schema::MAX_NAME_LENGTH;

/// Validates a metric name before anything is resolved or written.
pub(crate) fn validate_metric_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ValidationError::required_field("metric name").into());
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(ValidationError::invalid_field(
            "metric name",
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

/// Groups metrics by option, keeping the input order inside each group.
pub(crate) fn group_by_option(metrics: Vec<VibeMetric>) -> MetricsByOption {
    let mut grouped = MetricsByOption::new();
    for metric in metrics {
        grouped.entry(metric.option_id).or_default().push(metric);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{VibeCheckId, VibeOptionId};
    use rust_decimal::Decimal;

    #[test]
    fn test_metric_name_rules() {
        assert!(validate_metric_name("clicks").is_ok());
        assert!(validate_metric_name(&"x".repeat(MAX_NAME_LENGTH)).is_ok());

        let err = validate_metric_name("").unwrap_err();
        assert!(err.is_validation());

        let err = validate_metric_name(&"x".repeat(MAX_NAME_LENGTH + 1)).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_group_by_option() {
        let check = VibeCheckId::new();
        let a = VibeOptionId::new();
        let b = VibeOptionId::new();

        let metrics = vec![
            VibeMetric::new(check, a, "clicks", Decimal::from(1)),
            VibeMetric::new(check, b, "clicks", Decimal::from(2)),
            VibeMetric::new(check, a, "clicks", Decimal::from(3)),
            VibeMetric::new(check, a, "clicks", Decimal::from(4)),
            VibeMetric::new(check, b, "clicks", Decimal::from(5)),
        ];

        let grouped = group_by_option(metrics);
        assert_eq!(grouped.len(), 2);
        let a_values: Vec<Decimal> = grouped[&a].iter().map(|m| m.value).collect();
        assert_eq!(
            a_values,
            vec![Decimal::from(1), Decimal::from(3), Decimal::from(4)]
        );
        assert_eq!(grouped[&b].len(), 2);
    }

    #[test]
    fn test_group_empty() {
        assert!(group_by_option(Vec::new()).is_empty());
    }
}
