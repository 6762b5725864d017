//! Orbit camera with scroll-driven zoom.

use glam::{DMat3, DVec3};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};

pub const FOV_DEGREES: f64 = 45.0;
/// Tilt applied to the whole globe group around X.
pub const GLOBE_TILT: f64 = 0.3;
/// Orbit auto-rotation, one revolution per 120 seconds.
pub const AUTO_ROTATE: f64 = TAU / 120.0;

const MIN_POLAR: f64 = FRAC_PI_4;
const MAX_POLAR: f64 = PI - FRAC_PI_4;
/// Scroll progress where zooming begins.
const ZOOM_DELAY: f64 = 0.25;
/// Per-frame fraction of the remaining distance covered.
const ZOOM_DAMPING: f64 = 0.1;
/// Globe radius the zoom ranges are tuned for.
const REFERENCE_RADIUS: f64 = 3.5;
/// Points closer to the camera plane than this are not projected.
const NEAR_PLANE: f64 = 0.1;

#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Hermite smoothstep of `x` between `min` and `max`.
#[inline]
pub fn smoothstep(x: f64, min: f64, max: f64) -> f64 {
    if x <= min {
        return 0.0;
    }
    if x >= max {
        return 1.0;
    }
    let t = (x - min) / (max - min);
    t * t * (3.0 - 2.0 * t)
}

/// Start and end camera distance for scroll progress 0 and 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomRange {
    pub start: f64,
    pub end: f64,
}

impl ZoomRange {
    pub const WIDE: Self = Self { start: 4.9, end: 22.0 };
    pub const COMPACT: Self = Self { start: 12.0, end: 25.0 };

    /// The same framing for a globe of `radius`.
    pub fn for_radius(self, radius: f64) -> Self {
        let scale = radius / REFERENCE_RADIUS;
        Self { start: self.start * scale, end: self.end * scale }
    }

    /// Target distance for a scroll progress in [0, 1].
    pub fn target(&self, scroll: f64) -> f64 {
        let delayed = smoothstep(scroll, ZOOM_DELAY, 1.0);
        lerp(self.start, self.end, delayed)
    }
}

#[derive(Debug, Clone)]
pub struct OrbitCamera {
    pub azimuth: f64,
    pub polar: f64,
    pub distance: f64,
    pub scroll: f64,
    pub auto_rotate: bool,
    zoom: ZoomRange,
}

impl OrbitCamera {
    pub fn new(zoom: ZoomRange) -> Self {
        Self {
            azimuth: 0.0,
            polar: FRAC_PI_2,
            distance: zoom.start,
            scroll: 0.0,
            auto_rotate: true,
            zoom,
        }
    }

    pub fn orbit(&mut self, d_azimuth: f64, d_polar: f64) {
        self.azimuth = (self.azimuth + d_azimuth).rem_euclid(TAU);
        self.polar = (self.polar + d_polar).clamp(MIN_POLAR, MAX_POLAR);
    }

    pub fn scroll_by(&mut self, delta: f64) {
        self.scroll = (self.scroll + delta).clamp(0.0, 1.0);
    }

    /// One frame of auto-rotation and zoom easing.
    pub fn update(&mut self, dt: f64) {
        if self.auto_rotate {
            self.azimuth = (self.azimuth + AUTO_ROTATE * dt).rem_euclid(TAU);
        }
        let target = self.zoom.target(self.scroll);
        self.distance = lerp(self.distance, target, ZOOM_DAMPING);
    }

    pub fn position(&self) -> DVec3 {
        let (sin_p, cos_p) = self.polar.sin_cos();
        let (sin_a, cos_a) = self.azimuth.sin_cos();
        DVec3::new(self.distance * sin_p * sin_a, self.distance * cos_p, self.distance * sin_p * cos_a)
    }

    /// World to view rotation; the camera looks at the origin with +Y up.
    pub fn view_rotation(&self) -> DMat3 {
        let eye = self.position();
        let forward = (-eye).normalize();
        let right = forward.cross(DVec3::Y).try_normalize().unwrap_or(DVec3::X);
        let up = right.cross(forward);
        DMat3::from_cols(right, up, -forward).transpose()
    }

    /// Focal length for the vertical field of view, in NDC units.
    pub fn focal() -> f64 {
        1.0 / (FOV_DEGREES.to_radians() * 0.5).tan()
    }

    /// Project a world point to normalized device coordinates in [-1, 1]
    /// (aspect not applied). `None` when behind the camera.
    pub fn project(&self, world: DVec3) -> Option<(f64, f64, f64)> {
        let view = self.view_rotation() * (world - self.position());
        let depth = -view.z;
        if depth < NEAR_PLANE {
            return None;
        }
        let focal = Self::focal();
        Some((view.x * focal / depth, view.y * focal / depth, depth))
    }

    /// Whether a sphere of `radius` at the origin blocks the line of sight.
    pub fn occluded(&self, world: DVec3, radius: f64) -> bool {
        let eye = self.position();
        let to_point = world - eye;
        let len = to_point.length();
        if len < 1e-12 {
            return false;
        }
        let dir = to_point / len;
        // Ray-sphere: |eye + s*dir|^2 = r^2
        let b = eye.dot(dir);
        let c = eye.length_squared() - radius * radius;
        let disc = b * b - c;
        if disc < 0.0 {
            return false;
        }
        let s = -b - disc.sqrt();
        s > 0.0 && s < len
    }
}

/// Model rotation of the globe group, a fixed tilt around X.
pub fn globe_rotation() -> DMat3 {
    DMat3::from_rotation_x(GLOBE_TILT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoothstep_edges() {
        assert_eq!(smoothstep(0.1, 0.25, 1.0), 0.0);
        assert_eq!(smoothstep(1.2, 0.25, 1.0), 1.0);
        assert!((smoothstep(0.625, 0.25, 1.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_zoom_waits_for_quarter_scroll() {
        assert_eq!(ZoomRange::WIDE.target(0.0), 4.9);
        assert_eq!(ZoomRange::WIDE.target(0.25), 4.9);
        assert_eq!(ZoomRange::WIDE.target(1.0), 22.0);
        assert_eq!(ZoomRange::COMPACT.target(1.0), 25.0);
    }

    #[test]
    fn test_distance_eases_toward_target() {
        let mut cam = OrbitCamera::new(ZoomRange::WIDE);
        cam.auto_rotate = false;
        cam.scroll_by(2.0);
        assert_eq!(cam.scroll, 1.0);
        cam.update(0.016);
        assert!((cam.distance - (4.9 + (22.0 - 4.9) * 0.1)).abs() < 1e-12);
        for _ in 0..500 {
            cam.update(0.016);
        }
        assert!((cam.distance - 22.0).abs() < 1e-6);
    }

    #[test]
    fn test_polar_is_clamped() {
        let mut cam = OrbitCamera::new(ZoomRange::WIDE);
        cam.orbit(0.0, 10.0);
        assert_eq!(cam.polar, MAX_POLAR);
        cam.orbit(0.0, -10.0);
        assert_eq!(cam.polar, MIN_POLAR);
    }

    #[test]
    fn test_origin_projects_to_center() {
        let cam = OrbitCamera::new(ZoomRange::WIDE);
        let (x, y, depth) = cam.project(DVec3::ZERO).unwrap();
        assert!(x.abs() < 1e-12 && y.abs() < 1e-12);
        assert!((depth - 4.9).abs() < 1e-12);
    }

    #[test]
    fn test_up_projects_up() {
        let cam = OrbitCamera::new(ZoomRange::WIDE);
        let (_, y, _) = cam.project(DVec3::new(0.0, 1.0, 0.0)).unwrap();
        assert!(y > 0.0);
        let (x, _, _) = cam.project(DVec3::new(1.0, 0.0, 0.0)).unwrap();
        assert!(x > 0.0);
    }

    #[test]
    fn test_far_side_is_occluded() {
        let cam = OrbitCamera::new(ZoomRange::WIDE);
        let eye_dir = cam.position().normalize();
        assert!(!cam.occluded(eye_dir * 3.5, 3.45));
        assert!(cam.occluded(-eye_dir * 3.5, 3.45));
    }

    #[test]
    fn test_point_behind_camera_is_not_projected() {
        let cam = OrbitCamera::new(ZoomRange::WIDE);
        assert!(cam.project(cam.position() * 2.0).is_none());
    }

    #[test]
    fn test_point_at_camera_plane_is_not_projected() {
        let cam = OrbitCamera::new(ZoomRange::WIDE);
        let grazing = cam.position() * 0.99 + DVec3::X;
        assert!(cam.project(grazing).is_none());
    }

    #[test]
    fn test_zoom_range_scales_with_radius() {
        let wide = ZoomRange::WIDE.for_radius(7.0);
        assert!((wide.start - 9.8).abs() < 1e-12);
        assert!((wide.end - 44.0).abs() < 1e-12);
        assert_eq!(ZoomRange::COMPACT.for_radius(3.5), ZoomRange::COMPACT);
    }
}
