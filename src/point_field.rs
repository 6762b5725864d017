//! Sphere point clouds sampled from a luminance texture.
//!
//! Bright texels (landmass on a specular map) attract points through
//! rejection sampling; without a texture the sphere is covered uniformly.

use crate::geo::{spherical_to_cartesian, spherical_to_uv};
use crate::texture::LuminanceMap;
use glam::DVec3;
use rand::Rng;
use std::f64::consts::TAU;

/// Upper bound on candidates drawn per requested point.
pub const ATTEMPTS_PER_POINT: usize = 100;

/// Points on a sphere of fixed radius, generated once.
#[derive(Debug, Clone)]
pub struct PointField {
    points: Vec<DVec3>,
    radius: f64,
    requested: usize,
    attempts: usize,
}

impl PointField {
    pub fn points(&self) -> &[DVec3] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn requested(&self) -> usize {
        self.requested
    }

    /// Candidates drawn while generating. Equal to `len()` for uniform fields.
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Flat `[x0, y0, z0, x1, ...]` buffer for vertex upload.
    pub fn to_f32_buffer(&self) -> Vec<f32> {
        self.points
            .iter()
            .flat_map(|p| [p.x as f32, p.y as f32, p.z as f32])
            .collect()
    }
}

/// Uniform azimuth and area-preserving polar angle.
#[inline]
fn random_angles<R: Rng + ?Sized>(rng: &mut R) -> (f64, f64) {
    let theta = rng.gen::<f64>() * TAU;
    let phi = (rng.gen::<f64>() * 2.0 - 1.0).acos();
    (theta, phi)
}

/// Generate up to `count` points on a sphere of `radius`.
///
/// With a luminance map, candidates are accepted with probability
/// `luminance / 255` and at most `count * ATTEMPTS_PER_POINT` candidates are
/// drawn, so dark maps return a short field instead of spinning.
pub fn generate<R: Rng + ?Sized>(
    count: usize,
    radius: f64,
    source: Option<&LuminanceMap>,
    rng: &mut R,
) -> PointField {
    let Some(map) = source else {
        tracing::warn!(count, "no luminance map provided, sampling the sphere uniformly");
        return generate_uniform(count, radius, rng);
    };

    let max_attempts = count.saturating_mul(ATTEMPTS_PER_POINT);
    let mut points = Vec::with_capacity(count);
    let mut attempts = 0;

    while points.len() < count && attempts < max_attempts {
        attempts += 1;

        let (theta, phi) = random_angles(rng);
        let (u, v) = spherical_to_uv(theta, phi);
        let luminance = map.sample_uv(u, v);

        if rng.gen::<f64>() * 255.0 < f64::from(luminance) {
            points.push(spherical_to_cartesian(theta, phi, radius));
        }
    }

    if points.len() < count {
        tracing::warn!(
            requested = count,
            generated = points.len(),
            attempts,
            "attempt cap reached before the point field was filled"
        );
    } else {
        tracing::info!(generated = points.len(), attempts, "generated point field");
    }

    PointField { points, radius, requested: count, attempts }
}

fn generate_uniform<R: Rng + ?Sized>(count: usize, radius: f64, rng: &mut R) -> PointField {
    let points = (0..count)
        .map(|_| {
            let (theta, phi) = random_angles(rng);
            spherical_to_cartesian(theta, phi, radius)
        })
        .collect();
    PointField { points, radius, requested: count, attempts: count }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn polar_angle(p: DVec3) -> f64 {
        (p.y / p.length()).clamp(-1.0, 1.0).acos()
    }

    fn half_bright_map() -> LuminanceMap {
        // Left half (azimuth < π) black, right half white
        let (w, h) = (64u32, 32u32);
        let data = (0..h)
            .flat_map(|_| (0..w).map(move |x| if x < w / 2 { 0 } else { 255 }))
            .collect();
        LuminanceMap::from_raw(w, h, data).unwrap()
    }

    #[test]
    fn test_uniform_points_lie_on_sphere() {
        let mut rng = StdRng::seed_from_u64(42);
        let field = generate(2000, 3.5, None, &mut rng);
        assert_eq!(field.len(), 2000);
        for p in field.points() {
            assert!((p.length() - 3.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_uniform_polar_distribution_passes_ks() {
        let mut rng = StdRng::seed_from_u64(2025);
        let field = generate(10_000, 1.0, None, &mut rng);

        // cos(phi) = y / r is uniform on [-1, 1] for a uniform sphere
        let mut cos_phi: Vec<f64> = field.points().iter().map(|p| p.y).collect();
        cos_phi.sort_by(|a, b| a.partial_cmp(b).unwrap());

        let n = cos_phi.len() as f64;
        let d = cos_phi
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let cdf = (c + 1.0) / 2.0;
                let lo = i as f64 / n;
                let hi = (i + 1) as f64 / n;
                (cdf - lo).abs().max((hi - cdf).abs())
            })
            .fold(0.0, f64::max);

        // alpha = 0.001
        let critical = 1.95 / n.sqrt();
        assert!(d < critical, "KS statistic {d} exceeds {critical}");

        let mean = field.points().iter().map(|p| p.length()).sum::<f64>() / n;
        assert!((mean - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_dark_map_yields_nothing_and_respects_cap() {
        let map = LuminanceMap::from_raw(16, 8, vec![0; 128]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let field = generate(100, 1.0, Some(&map), &mut rng);
        assert_eq!(field.len(), 0);
        assert_eq!(field.attempts(), 100 * ATTEMPTS_PER_POINT);
        assert_eq!(field.requested(), 100);
    }

    #[test]
    fn test_bright_map_fills_quickly() {
        let map = LuminanceMap::from_raw(4, 4, vec![255; 16]).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        let field = generate(500, 2.0, Some(&map), &mut rng);
        assert_eq!(field.len(), 500);
        // Acceptance is certain for 255: rng * 255 < 255 always holds
        assert_eq!(field.attempts(), 500);
    }

    #[test]
    fn test_points_only_land_on_bright_texels() {
        let map = half_bright_map();
        let mut rng = StdRng::seed_from_u64(77);
        let field = generate(1000, 3.5, Some(&map), &mut rng);
        assert_eq!(field.len(), 1000);
        assert!(field.attempts() <= 1000 * ATTEMPTS_PER_POINT);

        for p in field.points() {
            assert!((p.length() - 3.5).abs() < 1e-6);
            // Recover the azimuth: x = -r sinφ cosθ, z = r sinφ sinθ
            let theta = p.z.atan2(-p.x).rem_euclid(TAU);
            let (u, _) = spherical_to_uv(theta, polar_angle(*p));
            // Bright columns start at x = 32 of 64, i.e. u >= 32/63
            assert!(u >= 32.0 / 63.0 - 1e-9, "point at u={u} sampled a dark texel");
        }
    }

    #[test]
    fn test_same_seed_same_field() {
        let map = half_bright_map();
        let a = generate(200, 1.0, Some(&map), &mut StdRng::seed_from_u64(5));
        let b = generate(200, 1.0, Some(&map), &mut StdRng::seed_from_u64(5));
        assert_eq!(a.points(), b.points());
        assert_eq!(a.attempts(), b.attempts());
    }

    #[test]
    fn test_f32_buffer_is_flat_triples() {
        let field = generate(3, 1.0, None, &mut StdRng::seed_from_u64(3));
        let buf = field.to_f32_buffer();
        assert_eq!(buf.len(), 9);
        assert_eq!(buf[3], field.points()[1].x as f32);
    }

    #[test]
    fn test_zero_count() {
        let map = LuminanceMap::from_raw(1, 1, vec![255]).unwrap();
        let field = generate(0, 1.0, Some(&map), &mut StdRng::seed_from_u64(0));
        assert_eq!(field.len(), 0);
        assert_eq!(field.attempts(), 0);
    }
}
