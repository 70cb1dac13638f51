//! Configuration validation

use super::schema::ModuleSpec;

/// Validation error type
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid default threshold: {0} (must be finite)")]
    InvalidDefaultThreshold(f32),

    #[error("Invalid early stopping patience: {0} (must be > 0)")]
    InvalidPatience(usize),

    #[error("Invalid early stopping min_delta: {0} (must be >= 0.0)")]
    InvalidMinDelta(f64),

    #[error("Early stopping metric name must not be empty")]
    EmptyMetricName,
}

/// Validate a module specification
///
/// Checks:
/// - The default threshold is a finite number
/// - Early stopping settings are in valid ranges
///
/// Unknown task strings never reach this point; they are rejected while
/// parsing.
pub fn validate_config(spec: &ModuleSpec) -> Result<(), ValidationError> {
    if !spec.threshold.default.is_finite() {
        return Err(ValidationError::InvalidDefaultThreshold(
            spec.threshold.default,
        ));
    }

    if let Some(early_stopping) = &spec.early_stopping {
        if early_stopping.metric.trim().is_empty() {
            return Err(ValidationError::EmptyMetricName);
        }
        if early_stopping.patience == 0 {
            return Err(ValidationError::InvalidPatience(early_stopping.patience));
        }
        if early_stopping.min_delta.is_nan() || early_stopping.min_delta < 0.0 {
            return Err(ValidationError::InvalidMinDelta(early_stopping.min_delta));
        }
    }

    Ok(())
}
