//! Frenet frames, point-line distance, and sampling-based bounding
//! boxes built on the [`Curve`]/[`Surface`] capability traits.
//!
//! Grounded on `SPEC_FULL.md` §4's "Generic geometry algorithms"
//! component: curvature and fundamental-form routines themselves live
//! as default methods on the capability traits (see
//! `entities::interfaces`); this module holds the remaining
//! curve-level utilities that are not per-parameter queries.

use nalgebra::{Point3, Vector3};

use crate::entities::interfaces::Curve;
use crate::error::Result;
use crate::numerics::BoundingBox;

/// The orthonormal (tangent, normal, binormal) frame at a curve
/// parameter.
#[derive(Debug, Clone, Copy)]
pub struct FrenetFrame {
    /// Unit tangent.
    pub tangent: Vector3<f64>,
    /// Unit principal normal.
    pub normal: Vector3<f64>,
    /// Unit binormal (`tangent x normal`).
    pub binormal: Vector3<f64>,
}

/// The Frenet frame of `curve` at parameter `t`.
pub fn frenet_frame<C: Curve + ?Sized>(curve: &C, t: f64) -> Result<FrenetFrame> {
    let tangent = curve.tangent_at(t)?;
    let normal = curve.normal_at(t)?;
    let binormal = tangent.cross(&normal);
    Ok(FrenetFrame {
        tangent,
        normal,
        binormal,
    })
}

/// Shortest distance from `point` to the infinite line through
/// `line_start` in direction `line_start + t*line_dir`.
pub fn distance_point_to_line(point: Vector3<f64>, line_start: Vector3<f64>, line_dir: Vector3<f64>) -> f64 {
    let dir = line_dir.normalize();
    let to_point = point - line_start;
    let projection = to_point.dot(&dir) * dir;
    (to_point - projection).norm()
}

/// An axis-aligned-in-local-frame bounding box for `curve`, computed
/// by sampling the curve's domain and expanding a seed box around the
/// first point, used by curve kinds with no closed-form box (e.g.
/// composite curves).
pub fn sampled_bounding_box<C: Curve + ?Sized>(curve: &C, samples: usize) -> Result<BoundingBox> {
    let range = curve.parameter_range();
    let (a, b) = if range.is_finite() {
        (range.start, range.end)
    } else {
        // Non-finite domains (rays/lines) cannot be sampled uniformly;
        // callers should special-case these curve kinds instead.
        (range.start.max(-1e6), range.end.min(1e6))
    };
    let points = crate::algorithms::discretize::sample_points_between(curve, a, b, samples.max(1))?;
    let first = points[0];
    let mut min = first;
    let mut max = first;
    for p in &points[1..] {
        min = Vector3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z));
        max = Vector3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z));
    }
    let sizes = max - min;
    Ok(BoundingBox::axis_aligned(
        Point3::from(min),
        [sizes.x, sizes.y, sizes.z],
        [false, false, false],
    )?)
}
