/// Mean Earth radius (IUGG) in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Great-circle distance in kilometres on a spherical Earth.
///
/// Coordinates are taken as given; range checks belong to the caller.
pub fn haversine_km(a: LatLon, b: LatLon) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    // rounding can push h a hair outside [0, 1] for antipodal points
    2.0 * EARTH_RADIUS_KM * h.clamp(0.0, 1.0).sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPIRE_STATE: LatLon = LatLon::new(40.748817, -73.985428);
    const JFK: LatLon = LatLon::new(40.641311, -73.778139);

    #[test]
    fn test_identical_points_are_zero() {
        assert_eq!(haversine_km(EMPIRE_STATE, EMPIRE_STATE), 0.0);
        let origin = LatLon::new(0.0, 0.0);
        assert_eq!(haversine_km(origin, origin), 0.0);
    }

    #[test]
    fn test_midtown_to_jfk() {
        let d = haversine_km(EMPIRE_STATE, JFK);
        assert!(d > 20.5 && d < 21.8, "unexpected distance {d}");
    }

    #[test]
    fn test_symmetric() {
        let there = haversine_km(EMPIRE_STATE, JFK);
        let back = haversine_km(JFK, EMPIRE_STATE);
        assert!((there - back).abs() < 1e-9);
    }

    #[test]
    fn test_antipodes_is_half_circumference() {
        let d = haversine_km(LatLon::new(0.0, 0.0), LatLon::new(0.0, 180.0));
        let half = std::f64::consts::PI * EARTH_RADIUS_KM;
        assert!((d - half).abs() < 1e-6);
        assert!(!d.is_nan());
    }
}
