//! Feature schemas: the ordered column lists a fare model is trained on.
//!
//! A tree ensemble fed columns in the wrong order still returns a number, so
//! the order is owned here and nowhere else. The dataset pipeline writes the
//! schema's names into the model's `meta.json`; the service refuses to start
//! unless those names match the active schema exactly.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Distance,
    PickupLongitude,
    PickupLatitude,
    DropoffLongitude,
    DropoffLatitude,
    PassengerCount,
    LargeGroupSize,
    Hour,
    DayOfWeek,
}

impl Feature {
    pub const ALL: [Feature; 9] = [
        Feature::Distance,
        Feature::PickupLongitude,
        Feature::PickupLatitude,
        Feature::DropoffLongitude,
        Feature::DropoffLatitude,
        Feature::PassengerCount,
        Feature::LargeGroupSize,
        Feature::Hour,
        Feature::DayOfWeek,
    ];

    /// Column name used in training data and model metadata.
    pub fn name(self) -> &'static str {
        match self {
            Feature::Distance => "distance",
            Feature::PickupLongitude => "pickup_longitude",
            Feature::PickupLatitude => "pickup_latitude",
            Feature::DropoffLongitude => "dropoff_longitude",
            Feature::DropoffLatitude => "dropoff_latitude",
            Feature::PassengerCount => "passenger_count",
            Feature::LargeGroupSize => "large_group_size",
            Feature::Hour => "hour",
            Feature::DayOfWeek => "day_of_week",
        }
    }

    /// The optional request field this feature is derived from, if any.
    pub fn source_field(self) -> Option<&'static str> {
        match self {
            Feature::Hour | Feature::DayOfWeek => Some("pickup_datetime"),
            _ => None,
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Feature {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Feature::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| ConfigurationError::UnknownFeature(s.to_string()))
    }
}

/// Optional request fields a deployment accepts (or a schema needs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequestFields {
    pub pickup_datetime: bool,
    /// `ride_requests` and `drivers`
    pub market: bool,
}

pub const SURGE_FEATURES: [Feature; 6] = [
    Feature::Distance,
    Feature::PickupLongitude,
    Feature::PickupLatitude,
    Feature::DropoffLongitude,
    Feature::DropoffLatitude,
    Feature::LargeGroupSize,
];

pub const TEMPORAL_FEATURES: [Feature; 8] = [
    Feature::Distance,
    Feature::PickupLongitude,
    Feature::PickupLatitude,
    Feature::DropoffLongitude,
    Feature::DropoffLatitude,
    Feature::PassengerCount,
    Feature::Hour,
    Feature::DayOfWeek,
];

pub const BASIC_FEATURES: [Feature; 6] = [
    Feature::Distance,
    Feature::PickupLongitude,
    Feature::PickupLatitude,
    Feature::DropoffLongitude,
    Feature::DropoffLatitude,
    Feature::PassengerCount,
];

/// Ordered, duplicate-free list of features. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    features: Arc<[Feature]>,
}

impl FeatureSchema {
    pub fn new(features: Vec<Feature>) -> Result<Self, ConfigurationError> {
        if features.is_empty() {
            return Err(ConfigurationError::EmptySchema);
        }
        for (i, f) in features.iter().enumerate() {
            if features[..i].contains(f) {
                return Err(ConfigurationError::DuplicateFeature(*f));
            }
        }
        Ok(Self {
            features: features.into(),
        })
    }

    /// One of the built-in column lists; those are known to be valid.
    pub(crate) fn builtin(features: &[Feature]) -> Self {
        debug_assert!(Self::new(features.to_vec()).is_ok());
        Self {
            features: features.into(),
        }
    }

    /// Build a schema from column names, e.g. a model's `feat_list`.
    pub fn from_names<I, S>(names: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let features = names
            .into_iter()
            .map(|n| n.as_ref().parse())
            .collect::<Result<Vec<Feature>, _>>()?;
        Self::new(features)
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.features.iter().map(|f| f.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn contains(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }

    pub fn position(&self, feature: Feature) -> Option<usize> {
        self.features.iter().position(|f| *f == feature)
    }

    pub fn needs_pickup_datetime(&self) -> bool {
        self.features
            .iter()
            .any(|f| f.source_field() == Some("pickup_datetime"))
    }

    /// Fail unless every feature can be computed from requests carrying `carried`.
    pub fn ensure_derivable(&self, carried: RequestFields) -> Result<(), ConfigurationError> {
        for feature in self.features.iter() {
            if let Some(field) = feature.source_field() {
                if field == "pickup_datetime" && !carried.pickup_datetime {
                    return Err(ConfigurationError::UnderivableFeature {
                        feature: *feature,
                        field,
                    });
                }
            }
        }
        Ok(())
    }

    /// Fail unless `names` lists exactly this schema's columns in the same order.
    pub fn ensure_matches<S: AsRef<str>>(&self, names: &[S]) -> Result<(), ConfigurationError> {
        let same = names.len() == self.len()
            && names
                .iter()
                .zip(self.features.iter())
                .all(|(n, f)| n.as_ref() == f.name());
        if same {
            Ok(())
        } else {
            Err(ConfigurationError::SchemaMismatch {
                expected: self.names().into_iter().map(String::from).collect(),
                found: names.iter().map(|n| n.as_ref().to_string()).collect(),
            })
        }
    }
}

impl fmt::Display for FeatureSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.names().join(", "))
    }
}

/// Sidecar metadata shipped next to a model file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMeta {
    pub feat_list: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_dim: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

impl ModelMeta {
    pub fn for_schema(schema: &FeatureSchema, variant: Option<&str>) -> Self {
        Self {
            feat_list: schema.names().into_iter().map(String::from).collect(),
            in_dim: Some(schema.len()),
            variant: variant.map(String::from),
        }
    }

    pub fn in_dim(&self) -> usize {
        self.in_dim.unwrap_or(self.feat_list.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_names_round_trip() {
        for f in Feature::ALL {
            assert_eq!(f.name().parse::<Feature>().unwrap(), f);
        }
        assert_eq!(
            "fare_amount".parse::<Feature>(),
            Err(ConfigurationError::UnknownFeature("fare_amount".into()))
        );
    }

    #[test]
    fn test_rejects_duplicates_and_empty() {
        assert_eq!(
            FeatureSchema::new(vec![Feature::Distance, Feature::Hour, Feature::Distance]),
            Err(ConfigurationError::DuplicateFeature(Feature::Distance))
        );
        assert_eq!(FeatureSchema::new(vec![]), Err(ConfigurationError::EmptySchema));
    }

    #[test]
    fn test_from_names_keeps_order() {
        let schema = FeatureSchema::from_names(["hour", "distance", "passenger_count"]).unwrap();
        assert_eq!(
            schema.features(),
            &[Feature::Hour, Feature::Distance, Feature::PassengerCount]
        );
        assert_eq!(schema.position(Feature::Distance), Some(1));
        assert_eq!(schema.to_string(), "[hour, distance, passenger_count]");
    }

    #[test]
    fn test_temporal_schema_needs_datetime() {
        let temporal = FeatureSchema::new(TEMPORAL_FEATURES.to_vec()).unwrap();
        let basic = FeatureSchema::new(BASIC_FEATURES.to_vec()).unwrap();
        assert!(temporal.needs_pickup_datetime());
        assert!(!basic.needs_pickup_datetime());

        assert_eq!(
            temporal.ensure_derivable(RequestFields::default()),
            Err(ConfigurationError::UnderivableFeature {
                feature: Feature::Hour,
                field: "pickup_datetime",
            })
        );
        assert!(temporal
            .ensure_derivable(RequestFields { pickup_datetime: true, market: false })
            .is_ok());
        assert!(basic.ensure_derivable(RequestFields::default()).is_ok());
    }

    #[test]
    fn test_ensure_matches_detects_reordering() {
        let schema = FeatureSchema::new(BASIC_FEATURES.to_vec()).unwrap();
        let names = schema.names();
        assert!(schema.ensure_matches(&names).is_ok());

        let mut swapped = names.clone();
        swapped.swap(1, 2);
        assert!(matches!(
            schema.ensure_matches(&swapped),
            Err(ConfigurationError::SchemaMismatch { .. })
        ));

        let short = &names[..5];
        assert!(schema.ensure_matches(short).is_err());
    }

    #[test]
    fn test_meta_json_shape() {
        let schema = FeatureSchema::new(SURGE_FEATURES.to_vec()).unwrap();
        let meta = ModelMeta::for_schema(&schema, Some("surge"));
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["feat_list"][5], "large_group_size");
        assert_eq!(json["in_dim"], 6);
        assert_eq!(json["variant"], "surge");

        let bare: ModelMeta = serde_json::from_str(r#"{"feat_list":["distance"]}"#).unwrap();
        assert_eq!(bare.in_dim(), 1);
        assert_eq!(bare.variant, None);
    }
}
