use crate::error::ModelError;
use crate::vector::FeatureVector;

/// A trained fare regressor.
///
/// Loaded once, then shared read-only across concurrent requests; hence the
/// `Send + Sync` bound and `&self` receiver.
pub trait FareModel: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError>;

    fn name(&self) -> &str {
        "fare-model"
    }
}

pub fn ensure_dimension(features: &FeatureVector, expected: usize) -> Result<(), ModelError> {
    if features.len() != expected {
        return Err(ModelError::DimensionMismatch {
            got: features.len(),
            expected,
        });
    }
    Ok(())
}
