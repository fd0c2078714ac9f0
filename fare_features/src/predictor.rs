use std::sync::Arc;

use crate::error::{ConfigurationError, FareError, ModelError, ValidationError};
use crate::model::FareModel;
use crate::request::TripRequest;
use crate::schema::FeatureSchema;
use crate::variant::{CoordinateCheck, PricingProfile};
use crate::vector::{FeatureVector, FeatureVectorBuilder};

/// Result of pricing one trip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FareEstimate {
    /// Final fare after surge and rounding.
    pub fare: f64,
    /// What the model returned, before surge.
    pub model_output: f64,
    pub surge_multiplier: Option<f64>,
}

/// Request -> features -> model -> surge -> rounding.
///
/// Cloning is cheap; the model sits behind an `Arc`.
#[derive(Clone)]
pub struct FarePredictor {
    profile: PricingProfile,
    builder: FeatureVectorBuilder,
    model: Arc<dyn FareModel>,
}

impl FarePredictor {
    pub fn new(
        profile: PricingProfile,
        model: Arc<dyn FareModel>,
    ) -> Result<Self, ConfigurationError> {
        profile.validate()?;
        let builder = FeatureVectorBuilder::new(profile.schema().clone());
        Ok(Self {
            profile,
            builder,
            model,
        })
    }

    pub fn profile(&self) -> &PricingProfile {
        &self.profile
    }

    pub fn schema(&self) -> &FeatureSchema {
        self.profile.schema()
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Validate the request and build its feature vector without touching the model.
    pub fn features(&self, trip: &TripRequest) -> Result<FeatureVector, FareError> {
        trip.check_passenger_count()?;
        if self.profile.coordinate_check() == CoordinateCheck::Enforce {
            trip.check_coordinates()?;
        }

        let carried = self.profile.variant().request_fields();
        if carried.pickup_datetime
            && self.schema().needs_pickup_datetime()
            && trip.pickup_datetime.is_none()
        {
            return Err(ValidationError::MissingField("pickup_datetime").into());
        }
        self.surge_multiplier(trip)?;

        self.builder.build(trip)
    }

    pub fn predict(&self, trip: &TripRequest) -> Result<FareEstimate, FareError> {
        let features = self.features(trip)?;
        self.price(trip, &features)
    }

    /// Run the model on an already-built vector and apply surge and rounding.
    pub fn price(
        &self,
        trip: &TripRequest,
        features: &FeatureVector,
    ) -> Result<FareEstimate, FareError> {
        let surge_multiplier = self.surge_multiplier(trip)?;
        let raw = self.model.predict(features)?;
        if !raw.is_finite() {
            return Err(ModelError::NonFinite(raw).into());
        }
        let model_output = if raw < 0.0 {
            tracing::warn!(raw, model = self.model.name(), "negative fare prediction floored at 0");
            0.0
        } else {
            raw
        };

        let fare = self
            .profile
            .rounding()
            .apply(model_output * surge_multiplier.unwrap_or(1.0));

        tracing::debug!(
            variant = %self.profile.variant(),
            model_output,
            surge = surge_multiplier.unwrap_or(1.0),
            fare,
            "priced trip"
        );

        Ok(FareEstimate {
            fare,
            model_output,
            surge_multiplier,
        })
    }

    /// `None` when the profile prices without surge.
    fn surge_multiplier(&self, trip: &TripRequest) -> Result<Option<f64>, ValidationError> {
        let Some(policy) = self.profile.surge() else {
            return Ok(None);
        };
        let ride_requests = trip
            .ride_requests
            .ok_or(ValidationError::MissingField("ride_requests"))?;
        let drivers = trip
            .drivers
            .ok_or(ValidationError::MissingField("drivers"))?;
        Ok(Some(policy.multiplier(ride_requests, drivers)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::LatLon;
    use crate::variant::Variant;

    struct Fixed(f64);

    impl FareModel for Fixed {
        fn predict(&self, _features: &FeatureVector) -> Result<f64, ModelError> {
            Ok(self.0)
        }
    }

    fn predictor(variant: Variant, output: f64) -> FarePredictor {
        FarePredictor::new(PricingProfile::for_variant(variant), Arc::new(Fixed(output))).unwrap()
    }

    fn trip() -> TripRequest {
        TripRequest::new(
            LatLon::new(37.7749, -122.4194),
            LatLon::new(37.7849, -122.4094),
            1,
        )
    }

    #[test]
    fn test_surge_scales_model_output() {
        let p = predictor(Variant::Surge, 12.636);
        let est = p.predict(&trip().with_market(3, 1)).unwrap();
        assert_eq!(est.surge_multiplier, Some(2.5));
        assert_eq!(est.fare, 31.59);
        assert_eq!(est.model_output, 12.636);

        let est = p.predict(&trip().with_market(1, 1)).unwrap();
        assert_eq!(est.fare, 12.64);
    }

    #[test]
    fn test_basic_is_unrounded() {
        let est = predictor(Variant::Basic, 9.87654).predict(&trip()).unwrap();
        assert_eq!(est.fare, 9.87654);
        assert_eq!(est.surge_multiplier, None);
    }

    #[test]
    fn test_negative_prediction_floors_at_zero() {
        let est = predictor(Variant::Basic, -3.0).predict(&trip()).unwrap();
        assert_eq!(est.fare, 0.0);
    }

    #[test]
    fn test_non_finite_prediction_is_model_error() {
        let err = predictor(Variant::Basic, f64::INFINITY)
            .predict(&trip())
            .unwrap_err();
        assert!(matches!(err, FareError::Model(ModelError::NonFinite(_))));
    }

    #[test]
    fn test_surge_variant_requires_market_counts() {
        let err = predictor(Variant::Surge, 5.0).predict(&trip()).unwrap_err();
        assert_eq!(
            err,
            FareError::Validation(ValidationError::MissingField("ride_requests"))
        );
    }

    #[test]
    fn test_price_checks_market_counts_too() {
        let p = predictor(Variant::Surge, 5.0);
        let priced = trip().with_market(2, 1);
        let features = p.features(&priced).unwrap();

        let err = p.price(&trip(), &features).unwrap_err();
        assert_eq!(
            err,
            FareError::Validation(ValidationError::MissingField("ride_requests"))
        );

        let mut no_drivers = priced.clone();
        no_drivers.drivers = None;
        assert_eq!(
            p.price(&no_drivers, &features).unwrap_err(),
            FareError::Validation(ValidationError::MissingField("drivers"))
        );
        assert_eq!(p.price(&priced, &features).unwrap().fare, 9.0);
    }

    #[test]
    fn test_cents_rounding_matches_decimal_value() {
        let est = predictor(Variant::Temporal, 2.675)
            .predict(&trip().with_pickup_datetime("2023-01-02 08:00:00"))
            .unwrap();
        assert_eq!(est.fare, 2.67);
        assert_eq!(est.model_output, 2.675);
    }

    #[test]
    fn test_coordinate_check_can_be_skipped() {
        let mut far_out = trip();
        far_out.pickup_longitude = 200.0;

        let strict = predictor(Variant::Basic, 5.0);
        assert!(strict.predict(&far_out).unwrap_err().is_client_error());

        let lax = FarePredictor::new(
            PricingProfile::for_variant(Variant::Basic)
                .with_coordinate_check(CoordinateCheck::Skip),
            Arc::new(Fixed(5.0)),
        )
        .unwrap();
        assert_eq!(lax.predict(&far_out).unwrap().fare, 5.0);
    }
}
