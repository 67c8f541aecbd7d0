//! Adaptive discretization, arc length, and surface area quadrature.
//!
//! Grounded on `SPEC_FULL.md` §4's "Generic geometry algorithms"
//! component and §5's bound ("max subdivision depth ~20; initial
//! subdivisions defaults to 10, 3 for closed curves"): every curve and
//! surface gets these for free by implementing
//! [`crate::entities::interfaces::Curve`]/[`crate::entities::interfaces::Surface`],
//! rather than each entity hand-rolling its own quadrature.

use nalgebra::Vector3;

use crate::core::precision::{
    DISCRETIZATION_TOLERANCE, INITIAL_SUBDIVISIONS_CLOSED, INITIAL_SUBDIVISIONS_OPEN,
    MAX_SUBDIVISION_DEPTH,
};
use crate::entities::interfaces::{Curve, Surface};
use crate::error::Result;

/// Composite-Simpson arc length of `curve` over `[a, b]`, refined by
/// adaptive bisection until successive estimates agree within
/// [`DISCRETIZATION_TOLERANCE`] or [`MAX_SUBDIVISION_DEPTH`] is
/// reached.
pub fn arc_length<C: Curve + ?Sized>(curve: &C, a: f64, b: f64) -> Result<f64> {
    let speed = |t: f64| -> Result<f64> {
        Ok(curve.derivatives(t, 1)?.tangent().copied().unwrap_or_default().norm())
    };
    adaptive_simpson(a, b, speed, DISCRETIZATION_TOLERANCE, MAX_SUBDIVISION_DEPTH)
}

/// Composite 2D quadrature of `|Su x Sv|` over `[u0,u1] x [v0,v1]`,
/// nesting an adaptive 1D Simpson rule in each parameter direction.
pub fn surface_area<S: Surface + ?Sized>(
    surface: &S,
    u0: f64,
    u1: f64,
    v0: f64,
    v1: f64,
) -> Result<f64> {
    let inner = |u: f64| -> Result<f64> {
        let integrand = |v: f64| -> Result<f64> {
            let d = surface.derivatives(u, v, 1)?;
            let su = *d.du().unwrap_or(&Vector3::zeros());
            let sv = *d.dv().unwrap_or(&Vector3::zeros());
            Ok(su.cross(&sv).norm())
        };
        adaptive_simpson(v0, v1, integrand, DISCRETIZATION_TOLERANCE, MAX_SUBDIVISION_DEPTH)
    };
    adaptive_simpson(u0, u1, inner, DISCRETIZATION_TOLERANCE, MAX_SUBDIVISION_DEPTH)
}

/// Adaptive Simpson quadrature of `f` over `[a, b]` to absolute
/// tolerance `tol`, recursing at most `max_depth` times.
fn adaptive_simpson(
    a: f64,
    b: f64,
    f: impl Fn(f64) -> Result<f64> + Copy,
    tol: f64,
    max_depth: u32,
) -> Result<f64> {
    let fa = f(a)?;
    let fb = f(b)?;
    let fm = f((a + b) / 2.0)?;
    let whole = simpson(a, b, fa, fm, fb);
    adaptive_simpson_recurse(a, b, fa, fm, fb, whole, tol, max_depth, f)
}

fn simpson(a: f64, b: f64, fa: f64, fm: f64, fb: f64) -> f64 {
    (b - a) / 6.0 * (fa + 4.0 * fm + fb)
}

#[allow(clippy::too_many_arguments)]
fn adaptive_simpson_recurse(
    a: f64,
    b: f64,
    fa: f64,
    fm: f64,
    fb: f64,
    whole: f64,
    tol: f64,
    depth: u32,
    f: impl Fn(f64) -> Result<f64> + Copy,
) -> Result<f64> {
    let mid = (a + b) / 2.0;
    let flm = f((a + mid) / 2.0)?;
    let frm = f((mid + b) / 2.0)?;
    let left = simpson(a, mid, fa, flm, fm);
    let right = simpson(mid, b, fm, frm, fb);
    if depth == 0 || (left + right - whole).abs() < 15.0 * tol {
        return Ok(left + right + (left + right - whole) / 15.0);
    }
    let left_refined =
        adaptive_simpson_recurse(a, mid, fa, flm, fm, left, tol / 2.0, depth - 1, f)?;
    let right_refined =
        adaptive_simpson_recurse(mid, b, fm, frm, fb, right, tol / 2.0, depth - 1, f)?;
    Ok(left_refined + right_refined)
}

/// Uniformly sample `curve.point_at` at `n` parameter values spanning
/// its domain (or `[a, b]` via [`sample_points_between`]). The initial
/// count should be [`INITIAL_SUBDIVISIONS_OPEN`] or
/// [`INITIAL_SUBDIVISIONS_CLOSED`] per `SPEC_FULL.md` §5, with callers
/// free to refine further.
pub fn sample_points<C: Curve + ?Sized>(curve: &C) -> Result<Vec<Vector3<f64>>> {
    let range = curve.parameter_range();
    let n = if curve.is_closed() {
        INITIAL_SUBDIVISIONS_CLOSED
    } else {
        INITIAL_SUBDIVISIONS_OPEN
    };
    sample_points_between(curve, range.start, range.end, n)
}

/// Uniformly sample `curve.point_at` at `n` parameter values spanning
/// `[a, b]`.
pub fn sample_points_between<C: Curve + ?Sized>(
    curve: &C,
    a: f64,
    b: f64,
    n: usize,
) -> Result<Vec<Vector3<f64>>> {
    let mut points = Vec::with_capacity(n + 1);
    for i in 0..=n {
        let t = a + (b - a) * (i as f64) / (n as f64);
        points.push(curve.point_at(t)?);
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adaptive_simpson_integrates_polynomial_exactly() {
        let result = adaptive_simpson(0.0, 1.0, |x| Ok(x * x), 1e-10, 20).unwrap();
        assert!((result - 1.0 / 3.0).abs() < 1e-9);
    }
}
