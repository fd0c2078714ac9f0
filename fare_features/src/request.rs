use std::ops::RangeInclusive;

use serde::Deserialize;

use crate::error::ValidationError;
use crate::geo::LatLon;

pub const LATITUDE_RANGE: RangeInclusive<f64> = -90.0..=90.0;
pub const LONGITUDE_RANGE: RangeInclusive<f64> = -180.0..=180.0;

/// True when both components are finite and within their closed ranges.
///
/// This is the predicate the dataset pipeline filters training rows with.
pub fn coordinates_in_range(point: LatLon) -> bool {
    LATITUDE_RANGE.contains(&point.lat) && LONGITUDE_RANGE.contains(&point.lon)
}

/// A fare request as received from the web layer.
///
/// Which optional fields must be present depends on the pricing variant.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TripRequest {
    pub pickup_latitude: f64,
    pub pickup_longitude: f64,
    pub dropoff_latitude: f64,
    pub dropoff_longitude: f64,
    pub passenger_count: i64,
    #[serde(default)]
    pub pickup_datetime: Option<String>,
    #[serde(default)]
    pub ride_requests: Option<u32>,
    #[serde(default)]
    pub drivers: Option<u32>,
}

impl TripRequest {
    pub fn new(pickup: LatLon, dropoff: LatLon, passenger_count: i64) -> Self {
        Self {
            pickup_latitude: pickup.lat,
            pickup_longitude: pickup.lon,
            dropoff_latitude: dropoff.lat,
            dropoff_longitude: dropoff.lon,
            passenger_count,
            pickup_datetime: None,
            ride_requests: None,
            drivers: None,
        }
    }

    pub fn with_pickup_datetime(mut self, pickup_datetime: impl Into<String>) -> Self {
        self.pickup_datetime = Some(pickup_datetime.into());
        self
    }

    pub fn with_market(mut self, ride_requests: u32, drivers: u32) -> Self {
        self.ride_requests = Some(ride_requests);
        self.drivers = Some(drivers);
        self
    }

    pub fn pickup(&self) -> LatLon {
        LatLon::new(self.pickup_latitude, self.pickup_longitude)
    }

    pub fn dropoff(&self) -> LatLon {
        LatLon::new(self.dropoff_latitude, self.dropoff_longitude)
    }

    pub fn check_passenger_count(&self) -> Result<(), ValidationError> {
        if self.passenger_count <= 0 {
            return Err(ValidationError::NonPositivePassengerCount(
                self.passenger_count,
            ));
        }
        Ok(())
    }

    /// Reject latitudes outside [-90, 90] and longitudes outside [-180, 180].
    pub fn check_coordinates(&self) -> Result<(), ValidationError> {
        let checks = [
            ("pickup_latitude", self.pickup_latitude, &LATITUDE_RANGE),
            ("pickup_longitude", self.pickup_longitude, &LONGITUDE_RANGE),
            ("dropoff_latitude", self.dropoff_latitude, &LATITUDE_RANGE),
            ("dropoff_longitude", self.dropoff_longitude, &LONGITUDE_RANGE),
        ];
        for (field, value, range) in checks {
            if !range.contains(&value) {
                return Err(ValidationError::CoordinateOutOfRange {
                    field,
                    value,
                    min: *range.start(),
                    max: *range.end(),
                });
            }
        }
        Ok(())
    }
}
