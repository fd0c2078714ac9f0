use fare_features::{haversine_km, large_group, surge_multiplier, LatLon};
use proptest::prelude::*;

fn point() -> impl Strategy<Value = LatLon> {
    (-90.0f64..=90.0, -180.0f64..=180.0).prop_map(|(lat, lon)| LatLon::new(lat, lon))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn distance_is_symmetric(a in point(), b in point()) {
        let there = haversine_km(a, b);
        let back = haversine_km(b, a);
        prop_assert!((there - back).abs() <= 1e-9 * there.max(1.0));
    }

    #[test]
    fn distance_to_self_is_zero(a in point()) {
        prop_assert_eq!(haversine_km(a, a), 0.0);
    }

    #[test]
    fn distance_is_bounded(a in point(), b in point()) {
        let d = haversine_km(a, b);
        prop_assert!(d >= 0.0);
        prop_assert!(d <= std::f64::consts::PI * 6371.0088 + 1e-6);
    }

    #[test]
    fn surge_stays_in_bounds(requests in 0u32..10_000, drivers in 0u32..10_000) {
        let m = surge_multiplier(requests, drivers);
        prop_assert!((1.0..=2.5).contains(&m), "multiplier {}", m);
    }

    #[test]
    fn surge_non_decreasing_in_requests(requests in 0u32..5_000, extra in 0u32..100, drivers in 0u32..5_000) {
        prop_assert!(surge_multiplier(requests + extra, drivers) >= surge_multiplier(requests, drivers));
    }

    #[test]
    fn surge_non_increasing_in_drivers(requests in 0u32..5_000, drivers in 0u32..5_000, extra in 0u32..100) {
        prop_assert!(surge_multiplier(requests, drivers + extra) <= surge_multiplier(requests, drivers));
    }

    #[test]
    fn large_group_is_binary_threshold(passengers in 1i64..1_000) {
        let flag = large_group(passengers);
        prop_assert_eq!(flag == 1, passengers >= 5);
        prop_assert!(flag <= 1);
    }
}
