//! Great-circle distance helpers used by tutor discovery.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Builds coordinates only when both halves are present.
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        match (latitude, longitude) {
            (Some(lat), Some(lng)) => Some(Self::new(lat, lng)),
            _ => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Haversine distance between two points in kilometres.
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lng = (b.longitude - a.longitude).to_radians();
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    // clamp guards against rounding pushing h past 1.0 for antipodal points
    let c = 2.0 * h.sqrt().min(1.0).asin();
    EARTH_RADIUS_KM * c
}

/// Rounds a distance for API responses (2 decimal places).
pub fn round_km(distance: f64) -> f64 {
    (distance * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const DHANMONDI: Coordinates = Coordinates {
        latitude: 23.7461,
        longitude: 90.3742,
    };
    const GULSHAN: Coordinates = Coordinates {
        latitude: 23.7925,
        longitude: 90.4078,
    };

    #[test]
    fn test_zero_for_identical_points() {
        assert_eq!(haversine_km(DHANMONDI, DHANMONDI), 0.0);
    }

    #[test]
    fn test_symmetric_and_non_negative() {
        let ab = haversine_km(DHANMONDI, GULSHAN);
        let ba = haversine_km(GULSHAN, DHANMONDI);
        assert!(ab > 0.0);
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn test_dhanmondi_to_gulshan_distance() {
        // roughly 6.1 km as the crow flies
        let d = haversine_km(DHANMONDI, GULSHAN);
        assert!(d > 5.5 && d < 6.8, "unexpected distance {}", d);
    }

    #[test]
    fn test_antipodal_points() {
        let d = haversine_km(Coordinates::new(0.0, 0.0), Coordinates::new(0.0, 180.0));
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn test_coordinate_validation() {
        assert!(DHANMONDI.is_valid());
        assert!(!Coordinates::new(91.0, 0.0).is_valid());
        assert!(!Coordinates::new(0.0, -181.0).is_valid());
        assert!(!Coordinates::new(f64::NAN, 0.0).is_valid());
        assert_eq!(Coordinates::from_parts(Some(1.0), None), None);
    }

    #[test]
    fn test_round_km() {
        assert_eq!(round_km(6.12345), 6.12);
    }
}
