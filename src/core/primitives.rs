//! Geometric primitives module
//!
//! Provides fundamental geometric types shared across the kernel:
//! points (distinct from vectors), rays for projection/closest-point
//! queries, and planes. The oriented bounding box lives in
//! `crate::numerics::bounding_box`; stable entity identity lives in
//! `crate::identity`.

use nalgebra::{Point2 as NPoint2, Point3 as NPoint3, Vector2, Vector3};
use serde::{Deserialize, Serialize};

use super::precision::{ApproxEq, EPSILON};

// ============================================================================
// Point Types
// ============================================================================

/// 2D point (distinct from Vector2 for CAD semantics)
pub type Point2 = NPoint2<f64>;

/// 3D point (distinct from Vector3 for CAD semantics)
pub type Point3 = NPoint3<f64>;

// ============================================================================
// Ray Types
// ============================================================================

/// 2D ray for picking and intersection testing
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Ray2 {
    /// Ray origin point
    pub origin: Point2,
    /// Normalized direction vector
    pub direction: Vector2<f64>,
}

impl Ray2 {
    /// Create a new ray with normalized direction
    #[inline]
    pub fn new(origin: Point2, direction: Vector2<f64>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Get a point along the ray at parameter t
    #[inline]
    pub fn point_at(&self, t: f64) -> Point2 {
        self.origin + self.direction * t
    }

    /// Find the closest point on the ray to a given point
    #[inline]
    pub fn closest_point(&self, point: &Point2) -> Point2 {
        let v = point - self.origin;
        let t = v.dot(&self.direction).max(0.0);
        self.point_at(t)
    }

    /// Calculate distance from ray to a point
    #[inline]
    pub fn distance_to_point(&self, point: &Point2) -> f64 {
        let closest = self.closest_point(point);
        nalgebra::distance(&closest, point)
    }
}

impl ApproxEq for Ray2 {
    fn approx_eq(&self, other: &Self) -> bool {
        self.origin.coords.approx_eq(&other.origin.coords)
            && self.direction.approx_eq(&other.direction)
    }

    fn approx_eq_eps(&self, other: &Self, epsilon: f64) -> bool {
        self.origin.coords.approx_eq_eps(&other.origin.coords, epsilon)
            && self.direction.approx_eq_eps(&other.direction, epsilon)
    }

    fn approx_zero(&self) -> bool {
        self.origin.coords.approx_zero() && self.direction.approx_zero()
    }

    fn approx_zero_eps(&self, epsilon: f64) -> bool {
        self.origin.coords.approx_zero_eps(epsilon) && self.direction.approx_zero_eps(epsilon)
    }
}

/// 3D ray for picking and intersection testing
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Ray3 {
    /// Ray origin point
    pub origin: Point3,
    /// Normalized direction vector
    pub direction: Vector3<f64>,
}

impl Ray3 {
    /// Create a new ray with normalized direction
    #[inline]
    pub fn new(origin: Point3, direction: Vector3<f64>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Get a point along the ray at parameter t
    #[inline]
    pub fn point_at(&self, t: f64) -> Point3 {
        self.origin + self.direction * t
    }

    /// Find the closest point on the ray to a given point
    #[inline]
    pub fn closest_point(&self, point: &Point3) -> Point3 {
        let v = point - self.origin;
        let t = v.dot(&self.direction).max(0.0);
        self.point_at(t)
    }

    /// Calculate distance from ray to a point
    #[inline]
    pub fn distance_to_point(&self, point: &Point3) -> f64 {
        let closest = self.closest_point(point);
        nalgebra::distance(&closest, point)
    }

    /// Intersect with a plane, returns t parameter if intersection exists
    #[inline]
    pub fn intersect_plane(&self, plane: &Plane) -> Option<f64> {
        let denom = self.direction.dot(&plane.normal);
        if denom.abs() < EPSILON {
            return None; // Ray is parallel to plane
        }
        let t = (plane.distance - self.origin.coords.dot(&plane.normal)) / denom;
        if t >= 0.0 {
            Some(t)
        } else {
            None
        }
    }
}

impl ApproxEq for Ray3 {
    fn approx_eq(&self, other: &Self) -> bool {
        self.origin.coords.approx_eq(&other.origin.coords)
            && self.direction.approx_eq(&other.direction)
    }

    fn approx_eq_eps(&self, other: &Self, epsilon: f64) -> bool {
        self.origin.coords.approx_eq_eps(&other.origin.coords, epsilon)
            && self.direction.approx_eq_eps(&other.direction, epsilon)
    }

    fn approx_zero(&self) -> bool {
        self.origin.coords.approx_zero() && self.direction.approx_zero()
    }

    fn approx_zero_eps(&self, epsilon: f64) -> bool {
        self.origin.coords.approx_zero_eps(epsilon) && self.direction.approx_zero_eps(epsilon)
    }
}

// ============================================================================
// Plane
// ============================================================================

/// 3D plane defined by normal and distance from origin
///
/// Plane equation: normal Â· p = distance
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Plane {
    /// Unit normal vector
    pub normal: Vector3<f64>,
    /// Signed distance from origin
    pub distance: f64,
}

impl Plane {
    /// Create a plane from a normal and distance
    #[inline]
    pub fn new(normal: Vector3<f64>, distance: f64) -> Self {
        Self {
            normal: normal.normalize(),
            distance,
        }
    }

    /// Create a plane from a point and normal
    #[inline]
    pub fn from_point_normal(point: Point3, normal: Vector3<f64>) -> Self {
        let normal = normal.normalize();
        let distance = point.coords.dot(&normal);
        Self { normal, distance }
    }

    /// Create a plane from three points
    pub fn from_points(p0: Point3, p1: Point3, p2: Point3) -> Option<Self> {
        let v1 = p1 - p0;
        let v2 = p2 - p0;
        let normal = v1.cross(&v2);

        if normal.norm() < EPSILON {
            return None; // Points are colinear
        }

        Some(Self::from_point_normal(p0, normal))
    }

    /// Calculate signed distance from plane to a point
    #[inline]
    pub fn distance_to_point(&self, point: &Point3) -> f64 {
        self.normal.dot(&point.coords) - self.distance
    }

    /// Project a point onto the plane
    #[inline]
    pub fn project_point(&self, point: &Point3) -> Point3 {
        let dist = self.distance_to_point(point);
        point - self.normal * dist
    }

    /// Check if a point is on the plane (within epsilon)
    #[inline]
    pub fn contains_point(&self, point: &Point3) -> bool {
        self.distance_to_point(point).abs() < EPSILON
    }

    /// Flip the plane (reverse normal)
    #[inline]
    pub fn flip(&self) -> Self {
        Self {
            normal: -self.normal,
            distance: -self.distance,
        }
    }
}

impl ApproxEq for Plane {
    fn approx_eq(&self, other: &Self) -> bool {
        self.normal.approx_eq(&other.normal) && self.distance.approx_eq(&other.distance)
    }

    fn approx_eq_eps(&self, other: &Self, epsilon: f64) -> bool {
        self.normal.approx_eq_eps(&other.normal, epsilon)
            && self.distance.approx_eq_eps(&other.distance, epsilon)
    }

    fn approx_zero(&self) -> bool {
        self.normal.approx_zero() && self.distance.approx_zero()
    }

    fn approx_zero_eps(&self, epsilon: f64) -> bool {
        self.normal.approx_zero_eps(epsilon) && self.distance.approx_zero_eps(epsilon)
    }
}

// All types are automatically Send + Sync because they contain only primitive types
// and nalgebra types which are Send + Sync

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray2_distance() {
        let ray = Ray2::new(Point2::new(0.0, 0.0), Vector2::new(1.0, 0.0));
        let point = Point2::new(5.0, 3.0);
        let dist = ray.distance_to_point(&point);
        assert!(dist.approx_eq(&3.0));
    }

    #[test]
    fn test_ray3_plane_intersection() {
        let ray = Ray3::new(Point3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 1.0));
        let plane = Plane::from_point_normal(Point3::new(0.0, 0.0, 5.0), Vector3::new(0.0, 0.0, 1.0));
        let t = ray.intersect_plane(&plane).unwrap();
        assert!(t.approx_eq(&5.0));
    }

    #[test]
    fn test_plane_from_points() {
        let p0 = Point3::new(0.0, 0.0, 0.0);
        let p1 = Point3::new(1.0, 0.0, 0.0);
        let p2 = Point3::new(0.0, 1.0, 0.0);
        let plane = Plane::from_points(p0, p1, p2).unwrap();

        assert!(plane.contains_point(&p0));
        assert!(plane.contains_point(&p1));
        assert!(plane.contains_point(&p2));
    }
}
