//! Feature engineering and surge pricing for ride fare estimation.
//!
//! A [`FarePredictor`] turns a [`TripRequest`] into the exact column layout a
//! trained regressor expects, calls the model, and applies the deployment's
//! surge and rounding rules. The same [`FeatureVectorBuilder`] is used to
//! produce training rows, so inference and training cannot drift apart.

pub mod error;
pub mod geo;
pub mod group;
pub mod model;
pub mod predictor;
pub mod request;
pub mod schema;
pub mod surge;
pub mod temporal;
pub mod variant;
pub mod vector;

pub use error::{ConfigurationError, FareError, ModelError, ValidationError};
pub use geo::{haversine_km, LatLon};
pub use group::large_group;
pub use model::FareModel;
pub use predictor::{FareEstimate, FarePredictor};
pub use request::{coordinates_in_range, TripRequest};
pub use schema::{Feature, FeatureSchema, ModelMeta, RequestFields};
pub use surge::{surge_multiplier, SurgePolicy};
pub use temporal::{parse_pickup_datetime, TemporalFeatures};
pub use variant::{CoordinateCheck, PricingProfile, Rounding, Variant};
pub use vector::{FeatureVector, FeatureVectorBuilder};
