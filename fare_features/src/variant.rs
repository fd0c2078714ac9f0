use std::fmt;
use std::str::FromStr;

use crate::error::ConfigurationError;
use crate::schema::{
    FeatureSchema, RequestFields, BASIC_FEATURES, SURGE_FEATURES, TEMPORAL_FEATURES,
};
use crate::surge::SurgePolicy;

/// The three deployed request/response contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Live market counts, surge applied, `{"fare": ..}`.
    Surge,
    /// Pickup timestamp, `{"predicted_fare": ..}`.
    Temporal,
    /// Coordinates and passengers only, unrounded `{"predicted_fare": ..}`.
    Basic,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::Surge, Variant::Temporal, Variant::Basic];

    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Surge => "surge",
            Variant::Temporal => "temporal",
            Variant::Basic => "basic",
        }
    }

    pub fn default_schema(self) -> FeatureSchema {
        match self {
            Variant::Surge => FeatureSchema::builtin(&SURGE_FEATURES),
            Variant::Temporal => FeatureSchema::builtin(&TEMPORAL_FEATURES),
            Variant::Basic => FeatureSchema::builtin(&BASIC_FEATURES),
        }
    }

    pub fn request_fields(self) -> RequestFields {
        match self {
            Variant::Surge => RequestFields {
                pickup_datetime: false,
                market: true,
            },
            Variant::Temporal => RequestFields {
                pickup_datetime: true,
                market: false,
            },
            Variant::Basic => RequestFields::default(),
        }
    }

    pub fn applies_surge(self) -> bool {
        matches!(self, Variant::Surge)
    }

    pub fn rounding(self) -> Rounding {
        match self {
            Variant::Basic => Rounding::Unrounded,
            Variant::Surge | Variant::Temporal => Rounding::Cents,
        }
    }

    /// JSON field the fare is returned under.
    pub fn response_key(self) -> &'static str {
        match self {
            Variant::Surge => "fare",
            Variant::Temporal | Variant::Basic => "predicted_fare",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "surge" | "a" => Ok(Variant::Surge),
            "temporal" | "b" => Ok(Variant::Temporal),
            "basic" | "c" => Ok(Variant::Basic),
            _ => Err(ConfigurationError::UnknownVariant(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    Cents,
    Unrounded,
}

impl Rounding {
    /// Cents are rounded from the exact binary value, ties to even, so
    /// `2.675` (stored as 2.67499..) gives 2.67 and `0.125` gives 0.12.
    pub fn apply(self, fare: f64) -> f64 {
        match self {
            Rounding::Cents if fare.is_finite() => {
                format!("{fare:.2}").parse().unwrap_or(fare)
            }
            Rounding::Cents | Rounding::Unrounded => fare,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinateCheck {
    #[default]
    Enforce,
    Skip,
}

impl FromStr for CoordinateCheck {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enforce" | "on" | "true" => Ok(CoordinateCheck::Enforce),
            "skip" | "off" | "false" => Ok(CoordinateCheck::Skip),
            _ => Err(ConfigurationError::UnknownCoordinateCheck(s.to_string())),
        }
    }
}

/// Everything that distinguishes one deployment's pricing from another's.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingProfile {
    variant: Variant,
    schema: FeatureSchema,
    surge: Option<SurgePolicy>,
    rounding: Rounding,
    coordinate_check: CoordinateCheck,
}

impl PricingProfile {
    pub fn for_variant(variant: Variant) -> Self {
        Self {
            variant,
            schema: variant.default_schema(),
            surge: variant.applies_surge().then(SurgePolicy::default),
            rounding: variant.rounding(),
            coordinate_check: CoordinateCheck::default(),
        }
    }

    /// Swap in a schema, typically one read from model metadata.
    pub fn with_schema(mut self, schema: FeatureSchema) -> Result<Self, ConfigurationError> {
        schema.ensure_derivable(self.variant.request_fields())?;
        self.schema = schema;
        Ok(self)
    }

    pub fn with_surge(mut self, policy: SurgePolicy) -> Result<Self, ConfigurationError> {
        if !self.variant.request_fields().market {
            return Err(ConfigurationError::SurgeUnavailable(self.variant));
        }
        self.surge = Some(policy);
        Ok(self)
    }

    pub fn with_coordinate_check(mut self, check: CoordinateCheck) -> Self {
        self.coordinate_check = check;
        self
    }

    /// Startup self-check; also run by `FarePredictor::new`.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let carried = self.variant.request_fields();
        self.schema.ensure_derivable(carried)?;
        if self.surge.is_some() && !carried.market {
            return Err(ConfigurationError::SurgeUnavailable(self.variant));
        }
        Ok(())
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn surge(&self) -> Option<SurgePolicy> {
        self.surge
    }

    pub fn rounding(&self) -> Rounding {
        self.rounding
    }

    pub fn coordinate_check(&self) -> CoordinateCheck {
        self.coordinate_check
    }
}
