use crate::error::{ConfigurationError, FareError};
use crate::geo::haversine_km;
use crate::group::large_group;
use crate::request::TripRequest;
use crate::schema::{Feature, FeatureSchema};
use crate::temporal::{parse_pickup_datetime, TemporalFeatures};

/// Feature values laid out in the order of the schema that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    schema: FeatureSchema,
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, feature: Feature) -> Option<f64> {
        self.schema.position(feature).map(|i| self.values[i])
    }

    /// `(feature, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (Feature, f64)> + '_ {
        self.schema
            .features()
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }

    /// Single-precision copy for backends that take `f32` tensors.
    pub fn to_f32(&self) -> Vec<f32> {
        self.values.iter().map(|v| *v as f32).collect()
    }
}

/// Turns trip requests into [`FeatureVector`]s for one schema.
///
/// Shared by the inference service and the dataset pipeline so both emit
/// identical columns.
#[derive(Debug, Clone)]
pub struct FeatureVectorBuilder {
    schema: FeatureSchema,
}

impl FeatureVectorBuilder {
    pub fn new(schema: FeatureSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Compute every feature the schema lists, in schema order.
    ///
    /// # Errors
    /// * `ConfigurationError::UnderivableFeature` if a temporal feature is
    ///   required but the request has no `pickup_datetime`.
    /// * `ValidationError::MalformedDatetime` if the timestamp cannot be parsed.
    pub fn build(&self, trip: &TripRequest) -> Result<FeatureVector, FareError> {
        let temporal = self.temporal(trip)?;
        let mut distance = None;

        let mut values = Vec::with_capacity(self.schema.len());
        for feature in self.schema.features() {
            let value = match feature {
                Feature::Distance => {
                    *distance.get_or_insert_with(|| haversine_km(trip.pickup(), trip.dropoff()))
                }
                Feature::PickupLongitude => trip.pickup_longitude,
                Feature::PickupLatitude => trip.pickup_latitude,
                Feature::DropoffLongitude => trip.dropoff_longitude,
                Feature::DropoffLatitude => trip.dropoff_latitude,
                Feature::PassengerCount => trip.passenger_count as f64,
                Feature::LargeGroupSize => f64::from(large_group(trip.passenger_count)),
                // temporal() guarantees Some when the schema has these
                Feature::Hour => temporal.map_or(0.0, |t| f64::from(t.hour)),
                Feature::DayOfWeek => temporal.map_or(0.0, |t| f64::from(t.day_of_week)),
            };
            values.push(value);
        }

        Ok(FeatureVector {
            schema: self.schema.clone(),
            values,
        })
    }

    fn temporal(&self, trip: &TripRequest) -> Result<Option<TemporalFeatures>, FareError> {
        if !self.schema.needs_pickup_datetime() {
            return Ok(None);
        }
        let raw = trip.pickup_datetime.as_deref().ok_or_else(|| {
            let feature = self
                .schema
                .features()
                .iter()
                .copied()
                .find(|f| f.source_field().is_some())
                .unwrap_or(Feature::Hour);
            ConfigurationError::UnderivableFeature {
                feature,
                field: "pickup_datetime",
            }
        })?;
        Ok(Some(parse_pickup_datetime(raw)?))
    }
}
