use crate::error::ConfigurationError;

pub const DEFAULT_SURGE_ALPHA: f64 = 0.8;
pub const SURGE_FLOOR: f64 = 1.0;
pub const SURGE_CAP: f64 = 2.5;

/// Demand-driven price multiplier.
///
/// `1 + alpha * (requests - drivers) / drivers`, with zero drivers counted as
/// one, clamped to `[SURGE_FLOOR, SURGE_CAP]`. Slack supply never discounts
/// below the base fare.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurgePolicy {
    alpha: f64,
}

impl Default for SurgePolicy {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_SURGE_ALPHA,
        }
    }
}

impl SurgePolicy {
    pub fn with_alpha(alpha: f64) -> Result<Self, ConfigurationError> {
        if !alpha.is_finite() || alpha < 0.0 {
            return Err(ConfigurationError::InvalidSurgeAlpha(alpha));
        }
        Ok(Self { alpha })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn multiplier(&self, ride_requests: u32, drivers: u32) -> f64 {
        let demand = f64::from(ride_requests);
        let supply = f64::from(drivers.max(1));
        let raw = 1.0 + self.alpha * (demand - supply) / supply;
        raw.clamp(SURGE_FLOOR, SURGE_CAP)
    }
}

/// Multiplier under the default elasticity.
pub fn surge_multiplier(ride_requests: u32, drivers: u32) -> f64 {
    SurgePolicy::default().multiplier(ride_requests, drivers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balanced_market_is_base_fare() {
        assert_eq!(surge_multiplier(1, 1), 1.0);
        assert_eq!(surge_multiplier(7, 7), 1.0);
    }

    #[test]
    fn test_extreme_demand_is_capped() {
        // raw = 8.2
        assert_eq!(surge_multiplier(10, 1), 2.5);
        // raw = 2.6
        assert_eq!(surge_multiplier(3, 1), 2.5);
    }

    #[test]
    fn test_slack_supply_never_discounts() {
        // raw = 0.2
        assert_eq!(surge_multiplier(0, 5), 1.0);
    }

    #[test]
    fn test_moderate_demand() {
        // 1 + 0.8 * (3 - 2) / 2 = 1.4
        assert!((surge_multiplier(3, 2) - 1.4).abs() < 1e-12);
    }

    #[test]
    fn test_zero_drivers_counts_as_one() {
        assert_eq!(surge_multiplier(0, 0), 1.0);
        assert_eq!(surge_multiplier(2, 0), surge_multiplier(2, 1));
    }

    #[test]
    fn test_alpha_validation() {
        assert!(SurgePolicy::with_alpha(0.0).is_ok());
        assert!(matches!(
            SurgePolicy::with_alpha(-0.1),
            Err(ConfigurationError::InvalidSurgeAlpha(_))
        ));
        assert!(SurgePolicy::with_alpha(f64::NAN).is_err());

        let flat = SurgePolicy::with_alpha(0.0).unwrap();
        assert_eq!(flat.multiplier(50, 1), 1.0);
    }
}
