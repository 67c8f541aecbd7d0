//! Capability interfaces shared across entity kinds.
//!
//! Grounded on `original_source/include/igesio/entities/interfaces/i_curve.h`
//! and `i_surface.h`: `Curve` and `Surface` each publish a parameter
//! domain, closed-flags, and a `derivatives` operation producing
//! values to arbitrary order, with the convenience readers
//! (`point_at`, `tangent_at`, `length`, curvature, …) derived from it
//! rather than reimplemented per entity.

use nalgebra::Vector3;

use crate::error::{IgesError, Result};

/// `C(t), C'(t), …, C⁽ⁿ⁾(t)` for some parameter `t`, indexable by
/// derivative order.
///
/// Mirrors `original_source`'s `CurveDerivatives`.
#[derive(Debug, Clone)]
pub struct CurveDerivatives {
    values: Vec<Vector3<f64>>,
}

impl CurveDerivatives {
    /// Build from the ordered `[C(t), C'(t), ...]` vector.
    pub fn new(values: Vec<Vector3<f64>>) -> Self {
        Self { values }
    }

    /// The highest derivative order present (`values.len() - 1`).
    pub fn order(&self) -> usize {
        self.values.len().saturating_sub(1)
    }

    /// The `k`-th derivative, `k = 0` being the point itself.
    pub fn get(&self, k: usize) -> Option<&Vector3<f64>> {
        self.values.get(k)
    }

    /// The point `C(t)`.
    pub fn point(&self) -> Vector3<f64> {
        self.values[0]
    }

    /// The tangent `C'(t)`.
    pub fn tangent(&self) -> Option<&Vector3<f64>> {
        self.values.get(1)
    }
}

/// The parametric domain of a curve. Endpoints may be infinite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterRange {
    /// Domain start.
    pub start: f64,
    /// Domain end.
    pub end: f64,
}

impl ParameterRange {
    /// A new finite or infinite range; `start` must be `< end`.
    pub fn new(start: f64, end: f64) -> Result<Self> {
        if !(start < end) {
            return Err(IgesError::InvalidArgument(
                "parameter range start must be less than end".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    /// Whether both endpoints are finite.
    pub fn is_finite(&self) -> bool {
        self.start.is_finite() && self.end.is_finite()
    }

    /// Whether `t` lies within the range (inclusive).
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t <= self.end
    }
}

/// A parametric curve producing derivatives to arbitrary order.
///
/// Default-method convenience readers (`point_at`, `tangent_at`,
/// `normal_at`, `binormal_at`, `curvature`, `length`) are all derived
/// from [`Curve::derivatives`]; concrete entities only need to
/// implement the domain queries and `derivatives` itself. `length` has
/// a numeric-quadrature default but concrete curves with a closed form
/// (e.g. `Line`) should override it.
pub trait Curve {
    /// The curve's parameter domain.
    fn parameter_range(&self) -> ParameterRange;

    /// Whether `point_at(start) ≈ point_at(end)` within geometric
    /// tolerance.
    fn is_closed(&self) -> bool;

    /// `C(t), C'(t), …, C⁽ⁿ⁾(t)`. Fails if `t` is outside the domain or
    /// order `n` is not supported at this parameter.
    fn derivatives(&self, t: f64, n: usize) -> Result<CurveDerivatives>;

    /// The point `C(t)`.
    fn point_at(&self, t: f64) -> Result<Vector3<f64>> {
        Ok(self.derivatives(t, 0)?.point())
    }

    /// The unit tangent at `t`.
    fn tangent_at(&self, t: f64) -> Result<Vector3<f64>> {
        let d = self.derivatives(t, 1)?;
        let tangent = *d.tangent().ok_or_else(|| {
            IgesError::ImplementationError("derivatives(t, 1) did not return a tangent")
        })?;
        if tangent.norm() < crate::core::precision::EPSILON_ROUGH {
            return Err(IgesError::NotImplementedError(
                "tangent undefined at a singular parameter".to_string(),
            ));
        }
        Ok(tangent.normalize())
    }

    /// The principal normal at `t`, derived from the curvature vector
    /// `C'' - (C''·T)T`.
    fn normal_at(&self, t: f64) -> Result<Vector3<f64>> {
        let d = self.derivatives(t, 2)?;
        let c1 = *d.get(1).ok_or_else(|| {
            IgesError::ImplementationError("derivatives(t, 2) missing first derivative")
        })?;
        let c2 = *d.get(2).ok_or_else(|| {
            IgesError::ImplementationError("derivatives(t, 2) missing second derivative")
        })?;
        let tangent = c1.normalize();
        let normal_component = c2 - tangent * c2.dot(&tangent);
        if normal_component.norm() < crate::core::precision::EPSILON_ROUGH {
            return Err(IgesError::NotImplementedError(
                "normal undefined where curvature vanishes".to_string(),
            ));
        }
        Ok(normal_component.normalize())
    }

    /// The binormal at `t` (`tangent × normal`).
    fn binormal_at(&self, t: f64) -> Result<Vector3<f64>> {
        Ok(self.tangent_at(t)?.cross(&self.normal_at(t)?))
    }

    /// Scalar curvature `|C' × C''| / |C'|^3` at `t`.
    fn curvature(&self, t: f64) -> Result<f64> {
        let d = self.derivatives(t, 2)?;
        let c1 = *d.get(1).ok_or_else(|| {
            IgesError::ImplementationError("derivatives(t, 2) missing first derivative")
        })?;
        let c2 = *d.get(2).ok_or_else(|| {
            IgesError::ImplementationError("derivatives(t, 2) missing second derivative")
        })?;
        let speed = c1.norm();
        if speed < crate::core::precision::EPSILON_ROUGH {
            return Err(IgesError::NotImplementedError(
                "curvature undefined at a singular parameter".to_string(),
            ));
        }
        Ok(c1.cross(&c2).norm() / speed.powi(3))
    }

    /// Arc length over the full parameter domain.
    fn length(&self) -> Result<f64> {
        let range = self.parameter_range();
        self.length_between(range.start, range.end)
    }

    /// Arc length between `a` and `b`, by adaptive Gauss-Legendre-style
    /// composite Simpson quadrature on the speed `|C'(t)|`. Bounded by
    /// [`crate::core::precision::MAX_SUBDIVISION_DEPTH`].
    fn length_between(&self, a: f64, b: f64) -> Result<f64> {
        crate::algorithms::discretize::arc_length(self, a, b)
    }
}

/// `S^(i,j)(u,v)` for `0 ≤ i+j ≤ order`, triangularly indexed.
///
/// Mirrors `original_source`'s `SurfaceDerivatives`.
#[derive(Debug, Clone)]
pub struct SurfaceDerivatives {
    order: usize,
    values: Vec<Vector3<f64>>,
}

impl SurfaceDerivatives {
    /// Build a triangular derivative array for the given `order`,
    /// filled in row-major `(i, j)` order with `i + j <= order`.
    pub fn new(order: usize, values: Vec<Vector3<f64>>) -> Self {
        Self { order, values }
    }

    fn index(order: usize, i: usize, j: usize) -> usize {
        // Triangular packing: row i starts after rows 0..i, each of
        // length (order - i' + 1) ... equivalently count all (i',j')
        // with i' < i first.
        let mut idx = 0;
        for ip in 0..i {
            idx += order + 1 - ip;
        }
        idx + j
    }

    /// `S^(i,j)(u,v)`, the mixed partial of order `(i, j)`.
    pub fn get(&self, i: usize, j: usize) -> Option<&Vector3<f64>> {
        if i + j > self.order {
            return None;
        }
        self.values.get(Self::index(self.order, i, j))
    }

    /// The surface point `S(u,v)`.
    pub fn point(&self) -> Vector3<f64> {
        self.values[0]
    }

    /// `∂S/∂u`.
    pub fn du(&self) -> Option<&Vector3<f64>> {
        self.get(1, 0)
    }

    /// `∂S/∂v`.
    pub fn dv(&self) -> Option<&Vector3<f64>> {
        self.get(0, 1)
    }
}

/// The `(u, v)` parameter rectangle of a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceParameterRange {
    /// U domain start.
    pub u_start: f64,
    /// U domain end.
    pub u_end: f64,
    /// V domain start.
    pub v_start: f64,
    /// V domain end.
    pub v_end: f64,
}

/// A parametric surface producing derivatives to arbitrary order.
pub trait Surface {
    /// The surface's `(u, v)` parameter rectangle.
    fn parameter_range(&self) -> SurfaceParameterRange;

    /// Whether the surface closes on itself in `u`.
    fn is_u_closed(&self) -> bool;

    /// Whether the surface closes on itself in `v`.
    fn is_v_closed(&self) -> bool;

    /// `S^(i,j)(u,v)` for all `0 ≤ i+j ≤ order`.
    fn derivatives(&self, u: f64, v: f64, order: usize) -> Result<SurfaceDerivatives>;

    /// The point `S(u,v)`.
    fn point_at(&self, u: f64, v: f64) -> Result<Vector3<f64>> {
        Ok(self.derivatives(u, v, 0)?.point())
    }

    /// The unit normal at `(u,v)`, `(∂S/∂u) × (∂S/∂v)` normalized.
    fn normal_at(&self, u: f64, v: f64) -> Result<Vector3<f64>> {
        let d = self.derivatives(u, v, 1)?;
        let su = *d
            .du()
            .ok_or_else(|| IgesError::ImplementationError("derivatives(u,v,1) missing du"))?;
        let sv = *d
            .dv()
            .ok_or_else(|| IgesError::ImplementationError("derivatives(u,v,1) missing dv"))?;
        let n = su.cross(&sv);
        if n.norm() < crate::core::precision::EPSILON_ROUGH {
            return Err(IgesError::NotImplementedError(
                "normal undefined at a singular parameter".to_string(),
            ));
        }
        Ok(n.normalize())
    }

    /// First fundamental form coefficients `(E, F, G)`.
    fn first_fundamental_form(&self, u: f64, v: f64) -> Result<(f64, f64, f64)> {
        let d = self.derivatives(u, v, 1)?;
        let su = *d.du().unwrap();
        let sv = *d.dv().unwrap();
        Ok((su.dot(&su), su.dot(&sv), sv.dot(&sv)))
    }

    /// Second fundamental form coefficients `(L, M, N)`.
    fn second_fundamental_form(&self, u: f64, v: f64) -> Result<(f64, f64, f64)> {
        let d = self.derivatives(u, v, 2)?;
        let suu = *d.get(2, 0).unwrap();
        let suv = *d.get(1, 1).unwrap();
        let svv = *d.get(0, 2).unwrap();
        let n = self.normal_at(u, v)?;
        Ok((suu.dot(&n), suv.dot(&n), svv.dot(&n)))
    }

    /// Gaussian curvature `K = (LN - M^2) / (EG - F^2)`.
    fn gaussian_curvature(&self, u: f64, v: f64) -> Result<f64> {
        let (e, f, g) = self.first_fundamental_form(u, v)?;
        let (l, m, n) = self.second_fundamental_form(u, v)?;
        let denom = e * g - f * f;
        if denom.abs() < crate::core::precision::EPSILON_ROUGH {
            return Err(IgesError::NotImplementedError(
                "Gaussian curvature undefined at a degenerate parametrization".to_string(),
            ));
        }
        Ok((l * n - m * m) / denom)
    }

    /// Mean curvature `H = (EN - 2FM + GL) / (2(EG - F^2))`.
    fn mean_curvature(&self, u: f64, v: f64) -> Result<f64> {
        let (e, f, g) = self.first_fundamental_form(u, v)?;
        let (l, m, n) = self.second_fundamental_form(u, v)?;
        let denom = 2.0 * (e * g - f * f);
        if denom.abs() < crate::core::precision::EPSILON_ROUGH {
            return Err(IgesError::NotImplementedError(
                "mean curvature undefined at a degenerate parametrization".to_string(),
            ));
        }
        Ok((e * n - 2.0 * f * m + g * l) / denom)
    }

    /// The two principal curvatures `(k1, k2)`, `k1 >= k2`, solved from
    /// `k^2 - 2H*k + K = 0`.
    fn principal_curvatures(&self, u: f64, v: f64) -> Result<(f64, f64)> {
        let h = self.mean_curvature(u, v)?;
        let k = self.gaussian_curvature(u, v)?;
        let disc = (h * h - k).max(0.0).sqrt();
        Ok((h + disc, h - disc))
    }

    /// Surface area over the full parameter rectangle.
    fn area(&self) -> Result<f64> {
        let r = self.parameter_range();
        self.area_over(r.u_start, r.u_end, r.v_start, r.v_end)
    }

    /// Surface area over a `[u0,u1]×[v0,v1]` sub-rectangle, by 2D
    /// adaptive quadrature of `|Su × Sv|`.
    fn area_over(&self, u0: f64, u1: f64, v0: f64, v1: f64) -> Result<f64> {
        crate::algorithms::discretize::surface_area(self, u0, u1, v0, v1)
    }
}

/// A 3x3-rotation-plus-translation rigid transform, optionally chained
/// to another transformation (type 124).
pub trait Transformation {
    /// Apply to a point: `R·p + t`.
    fn apply_point(&self, p: Vector3<f64>) -> Vector3<f64>;

    /// Apply to a direction vector: `R·v` (no translation).
    fn apply_direction(&self, v: Vector3<f64>) -> Vector3<f64>;
}

/// A color-definition entity (type 314): percentage RGB triple.
pub trait ColorDefinition {
    /// Red/Green/Blue as percentages in `[0, 100]`.
    fn rgb_percent(&self) -> (f64, f64, f64);
}
