use thiserror::Error;

use crate::schema::Feature;
use crate::variant::Variant;

/// Human-readable form of the accepted `pickup_datetime` layout.
pub const DATETIME_FORMAT_HINT: &str = "YYYY-MM-DD HH:MM:SS[.ffffff]";

/// Client-caused problems with a single trip request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("passenger_count must be greater than 0 (got {0})")]
    NonPositivePassengerCount(i64),

    #[error("pickup_datetime {value:?} does not match the expected format {expected}")]
    MalformedDatetime {
        value: String,
        expected: &'static str,
    },

    #[error("{field} must be within [{min}, {max}] (got {value})")]
    CoordinateOutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("missing required field `{0}`")]
    MissingField(&'static str),
}

/// Operator-caused problems: a deployment whose schema, variant and model disagree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("feature `{feature}` cannot be derived: the request carries no `{field}`")]
    UnderivableFeature {
        feature: Feature,
        field: &'static str,
    },

    #[error("surge pricing needs ride_requests/drivers, which the {0} variant does not accept")]
    SurgeUnavailable(Variant),

    #[error("invalid surge elasticity {0}: must be finite and non-negative")]
    InvalidSurgeAlpha(f64),

    #[error("unknown feature `{0}`")]
    UnknownFeature(String),

    #[error("feature `{0}` appears more than once in the schema")]
    DuplicateFeature(Feature),

    #[error("feature schema is empty")]
    EmptySchema,

    #[error("model was trained on {found:?} but the active schema is {expected:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("unknown pricing variant `{0}` (expected surge, temporal or basic)")]
    UnknownVariant(String),

    #[error("unknown coordinate check `{0}` (expected enforce or skip)")]
    UnknownCoordinateCheck(String),

    #[error("model artifact {path}: {reason}")]
    ModelArtifact { path: String, reason: String },
}

/// Failures raised by a [`FareModel`](crate::model::FareModel) backend.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("feature length mismatch: got {got}, expected {expected}")]
    DimensionMismatch { got: usize, expected: usize },

    #[error("model produced a non-finite prediction ({0})")]
    NonFinite(f64),

    #[error("{0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FareError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("model prediction failed: {0}")]
    Model(#[from] ModelError),
}

impl FareError {
    /// True when the caller can fix the request and retry.
    pub fn is_client_error(&self) -> bool {
        matches!(self, FareError::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datetime_error_names_expected_format() {
        let err = ValidationError::MalformedDatetime {
            value: "not-a-date".into(),
            expected: DATETIME_FORMAT_HINT,
        };
        let msg = err.to_string();
        assert!(msg.contains("not-a-date"));
        assert!(msg.contains("YYYY-MM-DD HH:MM:SS"));
    }

    #[test]
    fn only_validation_errors_are_client_errors() {
        let bad_input: FareError = ValidationError::NonPositivePassengerCount(0).into();
        let bad_deploy: FareError = ConfigurationError::EmptySchema.into();
        let bad_model: FareError = ModelError::NonFinite(f64::NAN).into();

        assert!(bad_input.is_client_error());
        assert!(!bad_deploy.is_client_error());
        assert!(!bad_model.is_client_error());
    }
}
