//! Local coordinate axes for 1D and 2D entities.
//!
//! All functions are pure. Degenerate geometry never fails: it falls back
//! to documented default directions, and angles that come out as NaN are
//! reported as zero.
//!
//! Conventions:
//! - 1D without an orientation reference: local x runs from start to end.
//!   A member with no projection on the global XY plane is vertical and
//!   takes global Y as local y; otherwise local y = Z × x and z = x × y.
//! - 1D with a reference point: z = x × (reference - start), y = z × x.
//! - 2D [`AxisMode2D::Local`]: x along corner 0→1 for triangles and along
//!   the diagonal 0→2 for quads, z normal to the corner order.
//! - 2D [`AxisMode2D::GlobalProjected`]: z as above, x is global X projected
//!   into the element plane, or global Y when the normal is parallel to X.
//!
//! The rotation angle (degrees) turns the triad about local x (1D) or
//! local z (2D).

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

pub type Vec3 = Vector3<f64>;

/// Lengths below this are treated as zero.
pub const GEOMETRY_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AxisMode2D {
    /// Triad derived from corner order.
    #[default]
    Local,
    /// Global X/Y projected onto the element plane.
    GlobalProjected,
}

/// Orthonormal right-handed triad with an origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub origin: Vec3,
    pub x: Vec3,
    pub y: Vec3,
    pub z: Vec3,
}

impl Default for Axis {
    fn default() -> Self {
        Self::global()
    }
}

impl Axis {
    pub fn global() -> Self {
        Self {
            origin: Vec3::zeros(),
            x: Vec3::x(),
            y: Vec3::y(),
            z: Vec3::z(),
        }
    }

    /// Builds a triad from an x direction and a second vector in the local
    /// XY plane. Falls back to the global triad when the two are parallel.
    pub fn from_xy_plane(origin: Vec3, x_dir: Vec3, xy_dir: Vec3) -> Self {
        let (Some(x), Some(z)) = (unit(x_dir), unit(x_dir.cross(&xy_dir))) else {
            return Self {
                origin,
                ..Self::global()
            };
        };
        Self {
            origin,
            x,
            y: z.cross(&x),
            z,
        }
    }

    pub fn is_global(&self, tolerance: f64) -> bool {
        let global = Self::global();
        self.same_directions(&global, tolerance)
    }

    /// Compares directions only; origins are ignored.
    pub fn same_directions(&self, other: &Axis, tolerance: f64) -> bool {
        (self.x - other.x).norm() <= tolerance
            && (self.y - other.y).norm() <= tolerance
            && (self.z - other.z).norm() <= tolerance
    }

    fn rotated_about_x(self, angle_deg: f64) -> Self {
        let r = rodrigues(&self.x, angle_deg.to_radians());
        Self {
            y: r * self.y,
            z: r * self.z,
            ..self
        }
    }

    fn rotated_about_z(self, angle_deg: f64) -> Self {
        let r = rodrigues(&self.z, angle_deg.to_radians());
        Self {
            x: r * self.x,
            y: r * self.y,
            ..self
        }
    }
}

/// Rodrigues rotation matrix `I + sin(θ)K + (1 - cos(θ))K²` about `axis`.
pub fn rodrigues(axis: &Vec3, angle_rad: f64) -> Matrix3<f64> {
    let Some(k) = unit(*axis) else {
        return Matrix3::identity();
    };
    let kx = k.cross_matrix();
    Matrix3::identity() + kx * angle_rad.sin() + kx * kx * (1.0 - angle_rad.cos())
}

pub fn rotate_about(vector: &Vec3, axis: &Vec3, angle_rad: f64) -> Vec3 {
    rodrigues(axis, angle_rad) * vector
}

/// Local axis of a 1D entity without an orientation reference.
pub fn axis_1d(start: &Vec3, end: &Vec3, angle_deg: f64) -> Axis {
    let Some(x) = unit(end - start) else {
        return Axis {
            origin: *start,
            ..Axis::global()
        };
    };

    let vertical = x.x.abs() < GEOMETRY_EPSILON && x.y.abs() < GEOMETRY_EPSILON;
    let y = if vertical {
        Vec3::y()
    } else {
        Vec3::z().cross(&x).normalize()
    };
    let z = x.cross(&y);

    Axis {
        origin: *start,
        x,
        y,
        z,
    }
    .rotated_about_x(angle_deg)
}

/// Local axis of a 1D entity oriented by a reference point. Falls back to
/// [`axis_1d`] when the reference lies on the element line.
pub fn axis_1d_oriented(start: &Vec3, end: &Vec3, reference: &Vec3, angle_deg: f64) -> Axis {
    let Some(x) = unit(end - start) else {
        return axis_1d(start, end, angle_deg);
    };
    let Some(z) = unit(x.cross(&(reference - start))) else {
        return axis_1d(start, end, angle_deg);
    };

    Axis {
        origin: *start,
        x,
        y: z.cross(&x),
        z,
    }
    .rotated_about_x(angle_deg)
}

/// Local axis of a 2D entity from its corners (three or four).
pub fn axis_2d(corners: &[Vec3], mode: AxisMode2D, angle_deg: f64) -> Axis {
    match reference_axis_2d(corners, mode) {
        Some(reference) => reference.rotated_about_z(angle_deg),
        None => Axis {
            origin: centroid(corners),
            ..Axis::global()
        },
    }
}

/// Angle (degrees) that turns the zero-angle triad of a 1D entity into
/// `axis`, measured about local x.
pub fn angle_1d(start: &Vec3, end: &Vec3, axis: &Axis) -> f64 {
    let reference = axis_1d(start, end, 0.0);
    signed_angle(&reference.y, &axis.y, &reference.x)
}

/// Same as [`angle_1d`] for an entity oriented by a reference point.
pub fn angle_1d_oriented(start: &Vec3, end: &Vec3, reference: &Vec3, axis: &Axis) -> f64 {
    let zero = axis_1d_oriented(start, end, reference, 0.0);
    signed_angle(&zero.y, &axis.y, &zero.x)
}

/// Angle (degrees) that turns the zero-angle triad of a 2D entity into
/// `axis`, measured about local z.
pub fn angle_2d(corners: &[Vec3], mode: AxisMode2D, axis: &Axis) -> f64 {
    match reference_axis_2d(corners, mode) {
        Some(reference) => signed_angle(&reference.x, &axis.x, &reference.z),
        None => 0.0,
    }
}

pub fn centroid(points: &[Vec3]) -> Vec3 {
    if points.is_empty() {
        return Vec3::zeros();
    }
    points.iter().sum::<Vec3>() / points.len() as f64
}

/// NaN or infinite angles become zero; finite angles are kept.
pub fn clean_angle(angle_deg: f64) -> f64 {
    if angle_deg.is_finite() { angle_deg } else { 0.0 }
}

fn reference_axis_2d(corners: &[Vec3], mode: AxisMode2D) -> Option<Axis> {
    let (local_x, z) = corner_frame(corners)?;

    let x = match mode {
        AxisMode2D::Local => local_x,
        AxisMode2D::GlobalProjected => {
            project_onto_plane(&Vec3::x(), &z)
                .or_else(|| project_onto_plane(&Vec3::y(), &z))
                .unwrap_or(local_x)
        }
    };

    Some(Axis {
        origin: centroid(corners),
        x,
        y: z.cross(&x),
        z,
    })
}

fn corner_frame(corners: &[Vec3]) -> Option<(Vec3, Vec3)> {
    match corners {
        [p0, p1, p2] => {
            let x = p1 - p0;
            Some((unit(x)?, unit(x.cross(&(p2 - p0)))?))
        }
        [p0, p1, p2, p3, ..] => {
            let x = p2 - p0;
            Some((unit(x)?, unit(x.cross(&(p3 - p1)))?))
        }
        _ => None,
    }
}

fn project_onto_plane(v: &Vec3, normal: &Vec3) -> Option<Vec3> {
    unit(v - normal * v.dot(normal))
}

fn signed_angle(from: &Vec3, to: &Vec3, about: &Vec3) -> f64 {
    let angle = from.cross(to).dot(about).atan2(from.dot(to)).to_degrees();
    clean_angle(angle)
}

fn unit(v: Vec3) -> Option<Vec3> {
    let norm = v.norm();
    if norm < GEOMETRY_EPSILON || !norm.is_finite() {
        None
    } else {
        Some(v / norm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_vec(actual: &Vec3, expected: [f64; 3]) {
        let expected = Vec3::new(expected[0], expected[1], expected[2]);
        assert!(
            (actual - expected).norm() < 1e-9,
            "expected {expected:?}, got {actual:?}"
        );
    }

    fn assert_orthonormal(axis: &Axis) {
        assert!((axis.x.norm() - 1.0).abs() < 1e-9);
        assert!((axis.y.norm() - 1.0).abs() < 1e-9);
        assert!(axis.x.dot(&axis.y).abs() < 1e-9);
        assert!((axis.x.cross(&axis.y) - axis.z).norm() < 1e-9);
    }

    #[test]
    fn horizontal_beam_has_default_triad() {
        let axis = axis_1d(&Vec3::zeros(), &Vec3::new(10.0, 0.0, 0.0), 0.0);
        assert_vec(&axis.x, [1.0, 0.0, 0.0]);
        assert_vec(&axis.y, [0.0, 1.0, 0.0]);
        assert_vec(&axis.z, [0.0, 0.0, 1.0]);
        let angle = angle_1d(&Vec3::zeros(), &Vec3::new(10.0, 0.0, 0.0), &axis);
        assert!(angle.abs() < 1e-6);
    }

    #[test]
    fn vertical_column_uses_global_y() {
        let axis = axis_1d(&Vec3::zeros(), &Vec3::new(0.0, 0.0, 3.0), 0.0);
        assert_vec(&axis.x, [0.0, 0.0, 1.0]);
        assert_vec(&axis.y, [0.0, 1.0, 0.0]);
        assert_vec(&axis.z, [-1.0, 0.0, 0.0]);
    }

    #[test]
    fn rotation_about_local_x_is_recovered() {
        let start = Vec3::new(1.0, 2.0, 0.5);
        let end = Vec3::new(4.0, -1.0, 2.0);
        for angle in [-150.0, -30.0, 0.0, 45.0, 90.0, 179.0] {
            let axis = axis_1d(&start, &end, angle);
            assert_orthonormal(&axis);
            let back = angle_1d(&start, &end, &axis);
            assert!((back - angle).abs() < 1e-6, "{angle} -> {back}");
        }
    }

    #[test]
    fn rotating_default_beam_by_90_degrees() {
        let axis = axis_1d(&Vec3::zeros(), &Vec3::new(5.0, 0.0, 0.0), 90.0);
        assert_vec(&axis.y, [0.0, 0.0, 1.0]);
        assert_vec(&axis.z, [0.0, -1.0, 0.0]);
    }

    #[test]
    fn orientation_point_defines_xy_plane() {
        let axis = axis_1d_oriented(
            &Vec3::zeros(),
            &Vec3::new(2.0, 0.0, 0.0),
            &Vec3::new(0.0, 0.0, 5.0),
            0.0,
        );
        assert_vec(&axis.z, [0.0, -1.0, 0.0]);
        assert_vec(&axis.y, [0.0, 0.0, 1.0]);
        assert_orthonormal(&axis);
    }

    #[test]
    fn collinear_reference_falls_back() {
        let start = Vec3::zeros();
        let end = Vec3::new(2.0, 0.0, 0.0);
        let fallback = axis_1d_oriented(&start, &end, &Vec3::new(7.0, 0.0, 0.0), 0.0);
        assert_eq!(fallback, axis_1d(&start, &end, 0.0));
    }

    #[test]
    fn zero_length_element_gets_global_triad() {
        let p = Vec3::new(1.0, 1.0, 1.0);
        let axis = axis_1d(&p, &p, 30.0);
        assert!(axis.is_global(1e-12));
        assert_eq!(angle_1d(&p, &p, &axis), 0.0);
    }

    #[test]
    fn triangle_local_axis_follows_first_edge() {
        let corners = [
            Vec3::zeros(),
            Vec3::new(0.0, 2.0, 0.0),
            Vec3::new(-1.0, 1.0, 0.0),
        ];
        let axis = axis_2d(&corners, AxisMode2D::Local, 0.0);
        assert_vec(&axis.x, [0.0, 1.0, 0.0]);
        assert_vec(&axis.z, [0.0, 0.0, 1.0]);
        assert_vec(&axis.y, [-1.0, 0.0, 0.0]);
    }

    #[test]
    fn quad_local_axis_follows_diagonal() {
        let corners = [
            Vec3::zeros(),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let axis = axis_2d(&corners, AxisMode2D::Local, 0.0);
        let d = 1.0 / 2f64.sqrt();
        assert_vec(&axis.x, [d, d, 0.0]);
        assert_vec(&axis.z, [0.0, 0.0, 1.0]);
        assert_orthonormal(&axis);
    }

    #[test]
    fn global_projected_axis_uses_global_x() {
        let corners = [
            Vec3::zeros(),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(1.0, 0.0, 1.0),
        ];
        let axis = axis_2d(&corners, AxisMode2D::GlobalProjected, 0.0);
        assert!(axis.x.y.abs() < 1e-9, "x stays in global XZ plane");
        assert!(axis.x.x > 0.0);
        assert_orthonormal(&axis);
    }

    #[test]
    fn global_projected_falls_back_to_global_y() {
        // Wall in the global YZ plane: normal parallel to global X.
        let corners = [
            Vec3::zeros(),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 1.0),
        ];
        let axis = axis_2d(&corners, AxisMode2D::GlobalProjected, 0.0);
        assert_vec(&axis.x, [0.0, 1.0, 0.0]);
        assert_orthonormal(&axis);
    }

    #[test]
    fn rotation_about_local_z_is_recovered() {
        let corners = [
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(2.0, 0.0, 1.5),
            Vec3::new(2.0, 3.0, 2.0),
            Vec3::new(0.0, 3.0, 1.0),
        ];
        for mode in [AxisMode2D::Local, AxisMode2D::GlobalProjected] {
            for angle in [-90.0, -12.5, 0.0, 33.0, 135.0] {
                let axis = axis_2d(&corners, mode, angle);
                let back = angle_2d(&corners, mode, &axis);
                assert!((back - angle).abs() < 1e-6, "{mode:?} {angle} -> {back}");
            }
        }
    }

    #[test]
    fn degenerate_corners_give_global_triad() {
        let corners = [Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0)];
        let axis = axis_2d(&corners, AxisMode2D::Local, 45.0);
        assert!(axis.is_global(1e-12));
        assert_eq!(clean_angle(f64::NAN), 0.0);
    }

    #[test]
    fn rodrigues_matches_quarter_turn() {
        let v = rotate_about(&Vec3::x(), &Vec3::z(), std::f64::consts::FRAC_PI_2);
        assert_vec(&v, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn from_xy_plane_orthogonalises() {
        let axis = Axis::from_xy_plane(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
        );
        assert_vec(&axis.y, [0.0, 1.0, 0.0]);
        assert_vec(&axis.z, [0.0, 0.0, 1.0]);
        assert_vec(&axis.origin, [1.0, 2.0, 3.0]);
    }
}
