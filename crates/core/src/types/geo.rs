//! Geographic primitives: coordinates, haversine distance, display formatting.
//!
//! Distance is never stored; it is a pure function of two [`GeoPoint`]s
//! computed at read time by the restaurant views.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometres.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "longitude")]
    pub lng: f64,
}

impl GeoPoint {
    /// Create a new coordinate pair.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Great-circle distance between two points in kilometres (haversine).
#[must_use]
pub fn haversine_km(from: GeoPoint, to: GeoPoint) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lng = (to.lng - from.lng).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + from.lat.to_radians().cos() * to.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

/// Format a distance in kilometres for display.
///
/// Distances below one kilometre render as whole metres, everything else as
/// kilometres with one decimal.
#[must_use]
pub fn format_distance(km: f64) -> String {
    if km < 1.0 {
        format!("{:.0} m", km * 1000.0)
    } else {
        format!("{km:.1} Km")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_distance_sub_kilometre() {
        assert_eq!(format_distance(0.5), "500 m");
        assert_eq!(format_distance(0.0), "0 m");
    }

    #[test]
    fn test_format_distance_kilometres() {
        assert_eq!(format_distance(2.37), "2.4 Km");
        assert_eq!(format_distance(1.0), "1.0 Km");
    }

    #[test]
    fn test_haversine_zero_for_same_point() {
        let p = GeoPoint::new(12.9716, 77.5946);
        assert!(haversine_km(p, p) < 1e-9);
    }

    #[test]
    fn test_haversine_known_pair() {
        // Bangalore MG Road to Koramangala, roughly 5.5-6.5 km.
        let mg_road = GeoPoint::new(12.9758, 77.6096);
        let koramangala = GeoPoint::new(12.9352, 77.6245);
        let km = haversine_km(mg_road, koramangala);
        assert!((4.0..8.0).contains(&km), "got {km}");
    }

    #[test]
    fn test_geopoint_accepts_long_field_names() {
        let p: GeoPoint =
            serde_json::from_str(r#"{"latitude": 1.5, "longitude": 2.5}"#).expect("deserialize");
        assert!((p.lat - 1.5).abs() < f64::EPSILON);
        assert!((p.lng - 2.5).abs() < f64::EPSILON);
    }
}
