//! Oriented bounding box algebra.
//!
//! Grounded on `original_source/include/igesio/numerics/bounding_box.h`:
//! a box is a control point `P0`, three mutually orthonormal direction
//! vectors `{D0, D1, D2}` forming a right-handed frame (`D0 × D1 =
//! D2`), and per-axis sizes `{s0, s1, s2}` each of kind Segment (finite
//! extent), Ray (half-infinite), or Line (bi-infinite). See
//! `SPEC_FULL.md` §4.2 for the full operation contract.

use nalgebra::{Matrix3, Point3, Vector3};

use crate::core::precision::EPSILON_ROUGH;
use crate::error::{IgesError, Result};

/// The extent kind of one axis of an oriented bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionKind {
    /// Finite interval `[P0, P0 + s*Di]`.
    Segment,
    /// Half-infinite along `+Di` from `P0`.
    Ray,
    /// Bi-infinite along `Di` through `P0`.
    Line,
}

/// An oriented bounding box with per-axis Segment/Ray/Line extent.
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    control: Point3<f64>,
    directions: [Vector3<f64>; 3],
    /// Internal sizes: finite and non-negative for Segment, `+inf` for
    /// Ray, `-inf` for Line (so `GetSizes()`-equivalent callers get
    /// `+inf` for both Ray and Line via `sizes()`, matching the header's
    /// documented distinction between the private representation and
    /// the public accessor).
    sizes: [f64; 3],
}

fn is_unit(v: &Vector3<f64>) -> bool {
    (v.norm() - 1.0).abs() < EPSILON_ROUGH
}

fn is_orthonormal_frame(d: &[Vector3<f64>; 3]) -> bool {
    is_unit(&d[0])
        && is_unit(&d[1])
        && is_unit(&d[2])
        && d[0].dot(&d[1]).abs() < EPSILON_ROUGH
        && (d[0].cross(&d[1]) - d[2]).norm() < EPSILON_ROUGH
}

impl BoundingBox {
    /// Empty box at the origin, axes aligned with world X/Y/Z.
    pub fn new() -> Self {
        Self {
            control: Point3::origin(),
            directions: [Vector3::x(), Vector3::y(), Vector3::z()],
            sizes: [0.0, 0.0, 0.0],
        }
    }

    /// Full 3D constructor: explicit frame, sizes, and per-axis Line flags.
    pub fn from_frame(
        control: Point3<f64>,
        directions: [Vector3<f64>; 3],
        sizes: [f64; 3],
        is_line: [bool; 3],
    ) -> Result<Self> {
        if !control.coords.iter().all(|c| c.is_finite()) {
            return Err(IgesError::InvalidArgument(
                "bounding box control point must be finite".to_string(),
            ));
        }
        if !is_orthonormal_frame(&directions) {
            return Err(IgesError::InvalidArgument(
                "bounding box directions must form a right-handed orthonormal frame".to_string(),
            ));
        }
        if sizes[0] < 0.0 || sizes[1] < 0.0 || sizes[2] < 0.0 {
            return Err(IgesError::InvalidArgument(
                "bounding box sizes must be non-negative".to_string(),
            ));
        }
        if sizes[0] == 0.0 || sizes[1] == 0.0 {
            return Err(IgesError::InvalidArgument(
                "bounding box sizes s0 and s1 must be strictly positive; only s2 may be zero \
                 (to denote a 2D box)"
                    .to_string(),
            ));
        }
        let stored = [
            encode_size(sizes[0], is_line[0]),
            encode_size(sizes[1], is_line[1]),
            encode_size(sizes[2], is_line[2]),
        ];
        Ok(Self {
            control,
            directions,
            sizes: stored,
        })
    }

    /// Axis-aligned box from a corner and three extents along +X/+Y/+Z.
    pub fn axis_aligned(
        control: Point3<f64>,
        sizes: [f64; 3],
        is_line: [bool; 3],
    ) -> Result<Self> {
        Self::from_frame(control, [Vector3::x(), Vector3::y(), Vector3::z()], sizes, is_line)
    }

    /// Box spanning two opposite finite corners. Detects 2D vs 3D
    /// automatically: an axis along which the corners agree gets zero
    /// size and becomes the implicit `D2`. Corners may agree on at
    /// most one axis — agreement on two or more would collapse the
    /// box to 1D or a point, which has no well-defined frame.
    pub fn from_two_points(p1: Point3<f64>, p2: Point3<f64>) -> Result<Self> {
        if !p1.coords.iter().all(|c| c.is_finite()) || !p2.coords.iter().all(|c| c.is_finite()) {
            return Err(IgesError::InvalidArgument(
                "bounding box corners must be finite".to_string(),
            ));
        }
        if p1 == p2 {
            return Err(IgesError::InvalidArgument(
                "bounding box corners must differ".to_string(),
            ));
        }
        let min = Point3::new(p1.x.min(p2.x), p1.y.min(p2.y), p1.z.min(p2.z));
        let max = Point3::new(p1.x.max(p2.x), p1.y.max(p2.y), p1.z.max(p2.z));
        let sizes = [max.x - min.x, max.y - min.y, max.z - min.z];
        let degenerate_axes = sizes.iter().filter(|&&s| s == 0.0).count();
        if degenerate_axes >= 2 {
            return Err(IgesError::InvalidArgument(
                "bounding box corners may coincide along at most one axis".to_string(),
            ));
        }
        // Permute the frame so the degenerate axis (if any) becomes D2, per
        // D0 x D1 = D2: x1==x2 -> D0=Y,D1=Z,D2=X; y1==y2 -> D0=Z,D1=X,D2=Y;
        // z1==z2 (or no degenerate axis) keeps the world X/Y/Z frame.
        if sizes[0] == 0.0 {
            Self::from_frame(
                min,
                [Vector3::y(), Vector3::z(), Vector3::x()],
                [sizes[1], sizes[2], sizes[0]],
                [false, false, false],
            )
        } else if sizes[1] == 0.0 {
            Self::from_frame(
                min,
                [Vector3::z(), Vector3::x(), Vector3::y()],
                [sizes[2], sizes[0], sizes[1]],
                [false, false, false],
            )
        } else {
            Self::axis_aligned(min, sizes, [false, false, false])
        }
    }

    /// The control point `P0`.
    pub fn control(&self) -> Point3<f64> {
        self.control
    }

    /// The orthonormal direction frame `{D0, D1, D2}`.
    pub fn directions(&self) -> [Vector3<f64>; 3] {
        self.directions
    }

    /// Per-axis sizes, with Ray and Line axes both reported as `+inf`.
    pub fn sizes(&self) -> [f64; 3] {
        [self.sizes[0].abs(), self.sizes[1].abs(), self.sizes[2].abs()]
    }

    /// Per-axis Line flags.
    pub fn is_lines(&self) -> [bool; 3] {
        [
            self.sizes[0] == f64::NEG_INFINITY,
            self.sizes[1] == f64::NEG_INFINITY,
            self.sizes[2] == f64::NEG_INFINITY,
        ]
    }

    /// Per-axis extent kind.
    pub fn direction_types(&self) -> [DirectionKind; 3] {
        let kind = |s: f64| {
            if s == f64::NEG_INFINITY {
                DirectionKind::Line
            } else if s == f64::INFINITY {
                DirectionKind::Ray
            } else {
                DirectionKind::Segment
            }
        };
        [kind(self.sizes[0]), kind(self.sizes[1]), kind(self.sizes[2])]
    }

    /// Whether this box was never given a non-zero extent.
    pub fn is_empty(&self) -> bool {
        self.sizes.iter().all(|s| *s == 0.0)
    }

    /// Whether the enclosed region is 2D (`s2 == 0`).
    pub fn is_2d(&self) -> bool {
        self.sizes[2] == 0.0
    }

    /// Whether the enclosed region is 3D.
    pub fn is_3d(&self) -> bool {
        !self.is_2d()
    }

    /// Whether every axis has finite extent.
    pub fn is_finite(&self) -> bool {
        self.sizes.iter().all(|s| s.is_finite())
    }

    /// Whether the box lies entirely in the Z=0 plane (2D, D2 parallel
    /// to the Z axis, and P0.z == 0).
    pub fn is_on_z_plane(&self) -> bool {
        self.is_2d()
            && (self.directions[2].cross(&Vector3::z()).norm() < EPSILON_ROUGH)
            && self.control.z.abs() < EPSILON_ROUGH
    }

    /// Translate `P0` by `v`.
    pub fn translate(&mut self, v: Vector3<f64>) -> Result<()> {
        if !v.iter().all(|c| c.is_finite()) {
            return Err(IgesError::InvalidArgument(
                "translation vector must be finite".to_string(),
            ));
        }
        self.control += v;
        Ok(())
    }

    /// Rotate the direction frame by an orthonormal matrix `r` about
    /// the origin (P0 is left unchanged).
    pub fn rotate(&mut self, r: &Matrix3<f64>) -> Result<()> {
        check_orthonormal(r)?;
        for d in &mut self.directions {
            *d = r * *d;
        }
        Ok(())
    }

    /// Rotate the direction frame by `r` and P0 about `center`.
    pub fn rotate_about(&mut self, r: &Matrix3<f64>, center: Point3<f64>) -> Result<()> {
        check_orthonormal(r)?;
        if !center.coords.iter().all(|c| c.is_finite()) {
            return Err(IgesError::InvalidArgument(
                "rotation center must be finite".to_string(),
            ));
        }
        self.control = center + r * (self.control - center);
        for d in &mut self.directions {
            *d = r * *d;
        }
        Ok(())
    }

    /// Rotate and translate in one step (rotation first).
    pub fn transform(&mut self, r: &Matrix3<f64>, v: Vector3<f64>) -> Result<()> {
        self.rotate(r)?;
        self.translate(v)
    }

    fn local_to_world(&self) -> Matrix3<f64> {
        Matrix3::from_columns(&self.directions)
    }

    fn world_to_local_point(&self, p: Point3<f64>) -> Vector3<f64> {
        let rot = self.local_to_world().transpose();
        rot * (p - self.control)
    }

    /// Whether `point` lies within the box (a Line axis is treated as
    /// `(-inf, inf)` for that component).
    pub fn contains_point(&self, point: Point3<f64>) -> bool {
        let local = self.world_to_local_point(point);
        for i in 0..3 {
            let s = self.sizes[i];
            let lo = if s == f64::NEG_INFINITY {
                f64::NEG_INFINITY
            } else {
                0.0
            };
            let hi = s.abs();
            if local[i] < lo - EPSILON_ROUGH || local[i] > hi + EPSILON_ROUGH {
                return false;
            }
        }
        true
    }

    /// Whether every finite vertex of `other` lies within this box.
    pub fn contains_box(&self, other: &BoundingBox) -> bool {
        other
            .finite_vertices()
            .into_iter()
            .all(|v| self.contains_point(v))
    }

    /// All 2D (4) or 3D (8) vertices. A Line axis contributes `±inf`
    /// for that component.
    pub fn vertices(&self) -> Vec<Point3<f64>> {
        let axis_count = if self.is_2d() { 2 } else { 3 };
        let corners = 1usize << axis_count;
        let mut out = Vec::with_capacity(corners);
        for mask in 0..corners {
            let mut p = self.control.coords;
            for i in 0..axis_count {
                let bit = (mask >> i) & 1;
                let s = self.sizes[i];
                let extent = match (bit, s) {
                    (0, _) => 0.0,
                    (_, v) if v == f64::NEG_INFINITY => f64::NEG_INFINITY,
                    (_, v) => v.abs(),
                };
                p += self.directions[i] * extent;
            }
            out.push(Point3::from(p));
        }
        out
    }

    /// Like [`BoundingBox::vertices`] but empty if the box is not
    /// finite.
    pub fn finite_vertices(&self) -> Vec<Point3<f64>> {
        if !self.is_finite() {
            return Vec::new();
        }
        self.vertices()
    }

    /// Grow this box to the minimum box (along the same directions)
    /// that contains both `self` and `other`.
    pub fn expand_to_include(&mut self, other: &BoundingBox) -> Result<()> {
        let mut local_min = [0.0f64; 3];
        let mut local_max = self.sizes;
        for i in 0..3 {
            if self.sizes[i] == f64::NEG_INFINITY {
                local_max[i] = f64::NEG_INFINITY;
            }
        }
        for v in other.vertices() {
            let local = self.world_to_local_point(v);
            for i in 0..3 {
                if local[i].is_nan() {
                    continue;
                }
                local_min[i] = local_min[i].min(local[i]);
                local_max[i] = local_max[i].max(local[i]);
            }
        }
        // A negative local_min means `other` extends opposite this
        // box's direction on that axis; this box's direction frame
        // would have to flip to contain it, which Expand() refuses to
        // do.
        for i in 0..3 {
            if local_min[i] < -EPSILON_ROUGH {
                return Err(IgesError::InvalidArgument(format!(
                    "cannot expand without changing direction {i}"
                )));
            }
        }
        self.control += self.local_to_world() * Vector3::new(0.0, 0.0, 0.0);
        for i in 0..3 {
            let was_line = self.sizes[i] == f64::NEG_INFINITY;
            self.sizes[i] = if was_line || local_max[i] == f64::NEG_INFINITY {
                f64::NEG_INFINITY
            } else {
                local_max[i].max(0.0)
            };
        }
        Ok(())
    }

    /// Slab-method line/ray/segment intersection test. `start`/`end`
    /// define the tested line's direction (`end - start`); `kind`
    /// selects which `t`-range of that line is actually tested.
    pub fn intersects(
        &self,
        start: Point3<f64>,
        end: Point3<f64>,
        kind: DirectionKind,
    ) -> Result<bool> {
        if start == end {
            return Err(IgesError::InvalidArgument(
                "start and end must differ".to_string(),
            ));
        }
        if !start.coords.iter().all(|c| c.is_finite()) || !end.coords.iter().all(|c| c.is_finite())
        {
            return Err(IgesError::InvalidArgument(
                "start/end must be finite".to_string(),
            ));
        }
        let dir = end - start;
        let local_origin = self.world_to_local_point(start);
        let rot = self.local_to_world().transpose();
        let local_dir = rot * dir;

        let (mut t_lo, mut t_hi) = match kind {
            DirectionKind::Segment => (0.0_f64, 1.0_f64),
            DirectionKind::Ray => (0.0_f64, f64::INFINITY),
            DirectionKind::Line => (f64::NEG_INFINITY, f64::INFINITY),
        };

        for i in 0..3 {
            let s = self.sizes[i];
            let (axis_lo, axis_hi) = if s == f64::NEG_INFINITY {
                (f64::NEG_INFINITY, f64::INFINITY)
            } else {
                (0.0, s.abs())
            };
            if local_dir[i].abs() < EPSILON_ROUGH {
                if local_origin[i] < axis_lo - EPSILON_ROUGH || local_origin[i] > axis_hi + EPSILON_ROUGH
                {
                    return Ok(false);
                }
                continue;
            }
            let mut t1 = (axis_lo - local_origin[i]) / local_dir[i];
            let mut t2 = (axis_hi - local_origin[i]) / local_dir[i];
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }
            t_lo = t_lo.max(t1);
            t_hi = t_hi.min(t2);
            if t_lo > t_hi {
                return Ok(false);
            }
        }
        Ok(t_lo <= t_hi)
    }

    /// Shortest Euclidean distance from `point` to the box (0 if
    /// contained).
    pub fn distance_to(&self, point: Point3<f64>) -> f64 {
        let local = self.world_to_local_point(point);
        let mut sq = 0.0;
        for i in 0..3 {
            let s = self.sizes[i];
            let (lo, hi) = if s == f64::NEG_INFINITY {
                (f64::NEG_INFINITY, f64::INFINITY)
            } else {
                (0.0, s.abs())
            };
            let clamped = local[i].clamp(lo, hi);
            let d = local[i] - clamped;
            if d.is_finite() {
                sq += d * d;
            }
        }
        sq.sqrt()
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::new()
    }
}

fn encode_size(size: f64, is_line: bool) -> f64 {
    if is_line {
        f64::NEG_INFINITY
    } else {
        size
    }
}

fn check_orthonormal(r: &Matrix3<f64>) -> Result<()> {
    let rt = r.transpose();
    let identity = r * rt;
    let is_orthonormal = (0..3).all(|i| (identity[(i, i)] - 1.0).abs() < EPSILON_ROUGH)
        && (identity[(0, 1)]).abs() < EPSILON_ROUGH
        && (identity[(0, 2)]).abs() < EPSILON_ROUGH
        && (identity[(1, 2)]).abs() < EPSILON_ROUGH;
    if !is_orthonormal {
        return Err(IgesError::InvalidArgument(
            "rotation matrix must be orthonormal".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_aligned_box_contains_interior_point() {
        let bbox = BoundingBox::axis_aligned(Point3::new(10.0, 10.0, 10.0), [10.0, 10.0, 10.0], [false; 3]).unwrap();
        assert!(bbox.contains_point(Point3::new(15.0, 15.0, 15.0)));
        assert!(!bbox.contains_point(Point3::new(25.0, 15.0, 15.0)));
    }

    #[test]
    fn ray_intersects_but_short_segment_does_not() {
        let bbox = BoundingBox::axis_aligned(Point3::new(10.0, 10.0, 10.0), [10.0, 10.0, 10.0], [false; 3]).unwrap();
        assert!(bbox
            .intersects(Point3::new(0.0, 15.0, 15.0), Point3::new(30.0, 15.0, 15.0), DirectionKind::Ray)
            .unwrap());
        assert!(!bbox
            .intersects(Point3::new(0.0, 15.0, 15.0), Point3::new(9.9, 15.0, 15.0), DirectionKind::Segment)
            .unwrap());
    }

    #[test]
    fn expand_to_include_contains_both_boxes() {
        let mut a = BoundingBox::axis_aligned(Point3::new(0.0, 0.0, 0.0), [1.0, 1.0, 1.0], [false; 3]).unwrap();
        let pre_expansion = a;
        let b = BoundingBox::axis_aligned(Point3::new(2.0, 2.0, 2.0), [1.0, 1.0, 1.0], [false; 3]).unwrap();
        a.expand_to_include(&b).unwrap();
        assert!(a.contains_box(&b));
        assert!(a.contains_box(&pre_expansion));
    }

    #[test]
    fn from_two_points_detects_2d() {
        let bbox = BoundingBox::from_two_points(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.0)).unwrap();
        assert!(bbox.is_2d());
    }

    #[test]
    fn from_two_points_detects_2d_with_degenerate_x_axis() {
        // The corners agree on X, so the box is 2D in the Y/Z plane;
        // D2 must be permuted to X so `sizes[2] == 0` still holds.
        let bbox = BoundingBox::from_two_points(Point3::new(1.0, 2.0, 3.0), Point3::new(1.0, 5.0, 8.0)).unwrap();
        assert!(bbox.is_2d());
        assert_eq!(bbox.sizes(), [3.0, 5.0, 0.0]);
    }

    #[test]
    fn from_two_points_detects_2d_with_degenerate_y_axis() {
        let bbox = BoundingBox::from_two_points(Point3::new(1.0, 2.0, 3.0), Point3::new(4.0, 2.0, 8.0)).unwrap();
        assert!(bbox.is_2d());
        assert_eq!(bbox.sizes(), [5.0, 3.0, 0.0]);
    }

    #[test]
    fn from_two_points_rejects_two_degenerate_axes() {
        assert!(BoundingBox::from_two_points(Point3::new(1.0, 2.0, 3.0), Point3::new(1.0, 2.0, 8.0)).is_err());
    }

    #[test]
    fn from_frame_rejects_zero_s0_or_s1() {
        assert!(BoundingBox::axis_aligned(Point3::origin(), [0.0, 1.0, 1.0], [false; 3]).is_err());
        assert!(BoundingBox::axis_aligned(Point3::origin(), [1.0, 0.0, 1.0], [false; 3]).is_err());
        assert!(BoundingBox::axis_aligned(Point3::origin(), [1.0, 1.0, 0.0], [false; 3]).is_ok());
    }

    #[test]
    fn vertices_count_matches_dimension() {
        let bbox3 = BoundingBox::axis_aligned(Point3::origin(), [1.0, 1.0, 1.0], [false; 3]).unwrap();
        assert_eq!(bbox3.vertices().len(), 8);
        let bbox2 = BoundingBox::axis_aligned(Point3::origin(), [1.0, 1.0, 0.0], [false; 3]).unwrap();
        assert_eq!(bbox2.vertices().len(), 4);
    }
}
