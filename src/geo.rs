//! Geodetic positions and great-circle helpers

use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Geodetic position
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPosition {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Altitude above mean sea level in feet
    pub altitude_ft: f64,
}

impl GeoPosition {
    pub fn new(latitude: f64, longitude: f64, altitude_ft: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude_ft,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite() && self.altitude_ft.is_finite()
    }

    /// Component-wise linear interpolation, `t` is not clamped
    pub fn lerp(&self, other: &GeoPosition, t: f64) -> GeoPosition {
        GeoPosition {
            latitude: lerp(self.latitude, other.latitude, t),
            longitude: lerp(self.longitude, other.longitude, t),
            altitude_ft: lerp(self.altitude_ft, other.altitude_ft, t),
        }
    }

    /// Great-circle distance in meters, altitude ignored
    pub fn distance_m(&self, other: &GeoPosition) -> f64 {
        distance_bearing(self.latitude, self.longitude, other.latitude, other.longitude).0
    }

    /// Position reached after travelling `distance_m` along `bearing_deg`
    pub fn destination(&self, bearing_deg: f64, distance_m: f64) -> GeoPosition {
        let lat1 = self.latitude.to_radians();
        let lon1 = self.longitude.to_radians();
        let brg = bearing_deg.to_radians();
        let d = distance_m / EARTH_RADIUS_M;

        let lat2 = (lat1.sin() * d.cos() + lat1.cos() * d.sin() * brg.cos()).asin();
        let lon2 = lon1 + (brg.sin() * d.sin() * lat1.cos()).atan2(d.cos() - lat1.sin() * lat2.sin());

        let mut longitude = lon2.to_degrees();
        if longitude > 180.0 {
            longitude -= 360.0;
        } else if longitude < -180.0 {
            longitude += 360.0;
        }

        GeoPosition {
            latitude: lat2.to_degrees(),
            longitude,
            altitude_ft: self.altitude_ft,
        }
    }
}

#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Distance (m) and initial bearing (degrees) between two lat/lon points
/// using the Haversine formula
pub fn distance_bearing(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> (f64, f64) {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    let distance = EARTH_RADIUS_M * c;

    let y = delta_lon.sin() * lat2_rad.cos();
    let x = lat1_rad.cos() * lat2_rad.sin() - lat1_rad.sin() * lat2_rad.cos() * delta_lon.cos();
    let bearing = (y.atan2(x).to_degrees() + 360.0) % 360.0;

    (distance, bearing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_position() {
        let a = GeoPosition::new(0.0, 10.0, 1000.0);
        let b = GeoPosition::new(1.0, 12.0, 3000.0);
        let m = a.lerp(&b, 0.5);
        assert!((m.latitude - 0.5).abs() < 1e-12);
        assert!((m.longitude - 11.0).abs() < 1e-12);
        assert!((m.altitude_ft - 2000.0).abs() < 1e-9);

        // beyond the newer point
        let e = a.lerp(&b, 2.0);
        assert!((e.latitude - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_distance_one_degree_latitude() {
        let a = GeoPosition::new(0.0, 0.0, 0.0);
        let b = GeoPosition::new(1.0, 0.0, 0.0);
        let d = a.distance_m(&b);
        assert!((d - 111_195.0).abs() < 10.0, "distance {}", d);
    }

    #[test]
    fn test_destination_roundtrip_bearing() {
        let start = GeoPosition::new(47.0, 8.0, 5000.0);
        let dest = start.destination(90.0, 10_000.0);
        let (dist, brg) = distance_bearing(start.latitude, start.longitude, dest.latitude, dest.longitude);
        assert!((dist - 10_000.0).abs() < 1.0);
        assert!((brg - 90.0).abs() < 0.1);
        assert_eq!(dest.altitude_ft, 5000.0);
    }
}
