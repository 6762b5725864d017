//! Geographic and spherical coordinate conversion shared by the point field,
//! the arcs and the location markers.
//!
//! Everything on the globe goes through [`spherical_to_cartesian`], which uses
//! a Y-up frame with the X axis negated. [`geo_to_cartesian`] is expressed in
//! terms of it so sampled points and catalog markers can never drift apart.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
}

impl GeoCoordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Latitude within [-90, 90] and longitude within [-180, 180].
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Position of this coordinate on a sphere of radius `r`.
    pub fn to_cartesian(self, r: f64) -> DVec3 {
        geo_to_cartesian(self.latitude, self.longitude, r)
    }
}

/// Azimuth `theta` in [0, 2π), polar angle `phi` in [0, π] measured from +Y.
#[inline]
pub fn spherical_to_cartesian(theta: f64, phi: f64, r: f64) -> DVec3 {
    let (sin_phi, cos_phi) = phi.sin_cos();
    let (sin_theta, cos_theta) = theta.sin_cos();
    DVec3::new(
        -r * sin_phi * cos_theta,
        r * cos_phi,
        r * sin_phi * sin_theta,
    )
}

/// Longitude -180 lands on azimuth 0 and the north pole on polar angle 0,
/// matching the UV layout of an equirectangular texture.
#[inline]
pub fn geo_to_cartesian(lat: f64, lon: f64, r: f64) -> DVec3 {
    let phi = (90.0 - lat).to_radians();
    let theta = (lon + 180.0).to_radians();
    spherical_to_cartesian(theta, phi, r)
}

/// Inverse of [`spherical_to_cartesian`] into normalized texture coordinates.
#[inline]
pub fn spherical_to_uv(theta: f64, phi: f64) -> (f64, f64) {
    (theta / (2.0 * PI), phi / PI)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_close(a: DVec3, b: DVec3) {
        assert!((a - b).length() < EPS, "{a:?} != {b:?}");
    }

    #[test]
    fn test_equator_prime_meridian_matches_spherical() {
        let r = 3.5;
        let from_geo = geo_to_cartesian(0.0, 0.0, r);
        let from_spherical = spherical_to_cartesian(PI, PI / 2.0, r);
        assert_close(from_geo, from_spherical);
        assert_close(from_geo, DVec3::new(r, 0.0, 0.0));
    }

    #[test]
    fn test_north_pole_is_y_up() {
        assert_close(geo_to_cartesian(90.0, 12.0, 2.0), DVec3::new(0.0, 2.0, 0.0));
        assert_close(geo_to_cartesian(-90.0, -77.0, 2.0), DVec3::new(0.0, -2.0, 0.0));
    }

    #[test]
    fn test_antipodal_equator_points_are_negated() {
        let a = geo_to_cartesian(0.0, 0.0, 1.0);
        let b = geo_to_cartesian(0.0, 180.0, 1.0);
        assert_close(a, -b);
    }

    #[test]
    fn test_conversion_preserves_radius() {
        for &(lat, lon) in &[(37.09, -95.71), (-38.41, -63.61), (35.86, 104.19), (-90.0, 180.0)] {
            let p = geo_to_cartesian(lat, lon, 3.5);
            assert!((p.length() - 3.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_uv_of_geo_point_round_trips_through_angles() {
        let (u, v) = spherical_to_uv(PI, PI / 2.0);
        assert!((u - 0.5).abs() < EPS);
        assert!((v - 0.5).abs() < EPS);
    }

    #[test]
    fn test_validity_bounds() {
        assert!(GeoCoordinate::new(90.0, -180.0).is_valid());
        assert!(!GeoCoordinate::new(90.5, 0.0).is_valid());
        assert!(!GeoCoordinate::new(0.0, 181.0).is_valid());
        assert!(!GeoCoordinate::new(f64::NAN, 0.0).is_valid());
    }
}
