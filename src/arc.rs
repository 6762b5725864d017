//! Elevated connection arcs between two points on the globe.
//!
//! An arc is a quadratic Bézier whose control point sits above the midpoint
//! of its endpoints, raised by half the chord length, so short hops stay low
//! and long hops bulge high.

use crate::geo::GeoCoordinate;
use glam::DVec3;
use std::f64::consts::PI;

/// Tessellation used for the rendered path.
pub const ARC_SEGMENTS: usize = 30;
/// Tube extrusion defaults.
pub const TUBE_SEGMENTS: usize = 20;
pub const TUBE_RADIUS: f64 = 0.025;
pub const TUBE_RADIAL_SEGMENTS: usize = 8;

const DEGENERATE_EPS: f64 = 1e-12;

/// Position and marker scale at one parameter along an arc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcSample {
    pub position: DVec3,
    pub scale: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcCurve {
    pub start: DVec3,
    pub control: DVec3,
    pub end: DVec3,
}

impl ArcCurve {
    /// Coordinates are not validated.
    pub fn build(start: GeoCoordinate, end: GeoCoordinate, radius: f64) -> Self {
        Self::between(start.to_cartesian(radius), end.to_cartesian(radius), radius)
    }

    /// Build from two points already on the sphere of `radius`.
    pub fn between(start: DVec3, end: DVec3, radius: f64) -> Self {
        let chord = start.distance(end);
        let height = radius + chord * 0.5;
        let normal = lift_direction(start, end);
        Self { start, control: normal * height, end }
    }

    pub fn chord(&self) -> f64 {
        self.start.distance(self.end)
    }

    /// Bézier position at `t` in [0, 1].
    pub fn point_at(&self, t: f64) -> DVec3 {
        let mt = 1.0 - t;
        self.start * (mt * mt) + self.control * (2.0 * mt * t) + self.end * (t * t)
    }

    /// Marker position plus a scale that swells to 1.5 at the midpoint.
    pub fn sample(&self, t: f64) -> ArcSample {
        ArcSample {
            position: self.point_at(t),
            scale: 1.0 + (t * PI).sin() * 0.5,
        }
    }

    /// `segments + 1` points at evenly spaced parameters.
    pub fn points(&self, segments: usize) -> Vec<DVec3> {
        let segments = segments.max(1);
        (0..=segments)
            .map(|i| self.point_at(i as f64 / segments as f64))
            .collect()
    }

    /// Extrude a closed-ring tube along the tessellated path.
    pub fn tube(&self, path_segments: usize, tube_radius: f64, radial_segments: usize) -> TubeMesh {
        TubeMesh::along(&self.points(path_segments), tube_radius, radial_segments)
    }
}

/// Unit vector the control point is pushed along.
///
/// Normally the midpoint direction. A zero-length arc reuses the endpoint
/// direction; exactly antipodal endpoints have no midpoint direction, so the
/// arc is lifted through whichever pole is perpendicular to the chord, or +Z
/// when the chord runs pole to pole.
fn lift_direction(start: DVec3, end: DVec3) -> DVec3 {
    let mid = (start + end) * 0.5;
    if mid.length_squared() > DEGENERATE_EPS * start.length_squared().max(1.0) {
        return mid.normalize();
    }
    if start.length_squared() <= DEGENERATE_EPS {
        return DVec3::Y;
    }
    let axis = start.normalize();
    let fallback = if axis.y.abs() < 0.9 { DVec3::Y } else { DVec3::Z };
    (fallback - axis * fallback.dot(axis)).normalize()
}

/// Triangle mesh of a tube.
#[derive(Debug, Clone, Default)]
pub struct TubeMesh {
    pub vertices: Vec<DVec3>,
    pub normals: Vec<DVec3>,
    pub indices: Vec<[u32; 3]>,
}

impl TubeMesh {
    /// Rings of `radial_segments` vertices at every path point, oriented with
    /// parallel-transported frames so the tube does not twist.
    pub fn along(path: &[DVec3], radius: f64, radial_segments: usize) -> Self {
        let radial = radial_segments.max(3);
        if path.len() < 2 {
            return Self::default();
        }

        let tangents = path_tangents(path);
        let mut normal = initial_normal(tangents[0]);

        let mut mesh = Self {
            vertices: Vec::with_capacity(path.len() * radial),
            normals: Vec::with_capacity(path.len() * radial),
            indices: Vec::with_capacity((path.len() - 1) * radial * 2),
        };

        for (i, (&center, &tangent)) in path.iter().zip(&tangents).enumerate() {
            if i > 0 {
                normal = transport(normal, tangents[i - 1], tangent);
            }
            let binormal = tangent.cross(normal);

            for j in 0..radial {
                let angle = j as f64 / radial as f64 * std::f64::consts::TAU;
                let (sin, cos) = angle.sin_cos();
                let n = normal * cos + binormal * sin;
                mesh.normals.push(n);
                mesh.vertices.push(center + n * radius);
            }
        }

        for i in 0..path.len() - 1 {
            for j in 0..radial {
                let a = (i * radial + j) as u32;
                let b = ((i + 1) * radial + j) as u32;
                let c = ((i + 1) * radial + (j + 1) % radial) as u32;
                let d = (i * radial + (j + 1) % radial) as u32;
                mesh.indices.push([a, b, d]);
                mesh.indices.push([b, c, d]);
            }
        }

        mesh
    }
}

/// Central-difference tangents; collapsed paths fall back to +X.
fn path_tangents(path: &[DVec3]) -> Vec<DVec3> {
    let last = path.len() - 1;
    let mut fallback = DVec3::X;
    (0..path.len())
        .map(|i| {
            let prev = path[i.saturating_sub(1)];
            let next = path[(i + 1).min(last)];
            let tangent = (next - prev).try_normalize().unwrap_or(fallback);
            fallback = tangent;
            tangent
        })
        .collect()
}

fn initial_normal(tangent: DVec3) -> DVec3 {
    let axis = if tangent.x.abs() <= tangent.y.abs() && tangent.x.abs() <= tangent.z.abs() {
        DVec3::X
    } else if tangent.y.abs() <= tangent.z.abs() {
        DVec3::Y
    } else {
        DVec3::Z
    };
    (axis - tangent * axis.dot(tangent)).normalize()
}

/// Rotate `normal` by the rotation taking `from` onto `to`.
fn transport(normal: DVec3, from: DVec3, to: DVec3) -> DVec3 {
    let axis = from.cross(to);
    let sin = axis.length();
    if sin < 1e-12 {
        return normal;
    }
    let axis = axis / sin;
    let cos = from.dot(to).clamp(-1.0, 1.0);
    // Rodrigues
    let rotated = normal * cos + axis.cross(normal) * sin + axis * axis.dot(normal) * (1.0 - cos);
    (rotated - to * rotated.dot(to)).normalize()
}
