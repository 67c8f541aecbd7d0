//! Rational B-spline surface entity (type 128, NURBS surface).
//!
//! Grounded on `original_source/include/igesio/entities/surfaces/
//! rational_b_spline_surface.h` for the field layout: independent
//! degrees `(M1, M2)` and knot vectors per parametric direction, a
//! `(K1+1) x (K2+1)` weight and control-point grid, and a form number
//! asserting a classical quadric sub-type. No `.cpp` companion exists
//! in the original source for this entity, so the evaluation kernel
//! below is this crate's own tensor-product generalization of
//! `nurbs_curve`'s Piegl & Tiller machinery: basis-function
//! derivatives (A2.3) per parametric direction, combined into
//! homogeneous surface derivatives and unrationalized via the rational
//! surface derivative recursion (A4.4), the 2D analogue of the curve's
//! A4.2.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::entities::directory_entry::DirectoryEntry;
use crate::entities::entity_base::{Entity, EntityBase, EntityKind};
use crate::entities::interfaces::{Surface, SurfaceDerivatives, SurfaceParameterRange};
use crate::entities::parameter_vector::{Parameter, ParameterVector};
use crate::error::{IgesError, Result, ValidationResult};
use crate::identity::ObjectID;

/// The classical quadric surface type a rational B-spline surface's
/// form number may assert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RationalSurfaceForm {
    /// Form 0: no special geometric type asserted.
    Undetermined,
    /// Form 1.
    Plane,
    /// Form 2.
    RightCircularCylinder,
    /// Form 3.
    Cone,
    /// Form 4.
    Sphere,
    /// Form 5.
    Torus,
    /// Form 6.
    SurfaceOfRevolution,
    /// Form 7.
    TabulatedCylinder,
    /// Form 8.
    RuledSurface,
    /// Form 9.
    GeneralQuadricSurface,
}

impl RationalSurfaceForm {
    fn from_form_number(n: i32) -> Self {
        match n {
            1 => Self::Plane,
            2 => Self::RightCircularCylinder,
            3 => Self::Cone,
            4 => Self::Sphere,
            5 => Self::Torus,
            6 => Self::SurfaceOfRevolution,
            7 => Self::TabulatedCylinder,
            8 => Self::RuledSurface,
            9 => Self::GeneralQuadricSurface,
            _ => Self::Undetermined,
        }
    }

    fn form_number(self) -> i32 {
        match self {
            Self::Undetermined => 0,
            Self::Plane => 1,
            Self::RightCircularCylinder => 2,
            Self::Cone => 3,
            Self::Sphere => 4,
            Self::Torus => 5,
            Self::SurfaceOfRevolution => 6,
            Self::TabulatedCylinder => 7,
            Self::RuledSurface => 8,
            Self::GeneralQuadricSurface => 9,
        }
    }
}

/// A non-uniform rational B-spline (tensor-product) surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NurbsSurface {
    base: EntityBase,
    degree_u: usize,
    degree_v: usize,
    knots_u: Vec<f64>,
    knots_v: Vec<f64>,
    n1: usize,
    n2: usize,
    /// Row-major `(n1+1) x (n2+1)` weight grid, `weights[i*(n2+1)+j]`.
    weights: Vec<f64>,
    /// Row-major `(n1+1) x (n2+1)` control-point grid, same indexing.
    control_points: Vec<Vector3<f64>>,
    parameter_range: SurfaceParameterRange,
    closed_u: bool,
    closed_v: bool,
    periodic_u: bool,
    periodic_v: bool,
    classical_form: RationalSurfaceForm,
}

impl NurbsSurface {
    /// Construct and validate. `control_points`/`weights` are given
    /// row-major, `(n1+1)` rows of `(n2+1)` entries each.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: ObjectID,
        degree_u: usize,
        degree_v: usize,
        n1: usize,
        n2: usize,
        control_points: Vec<Vector3<f64>>,
        weights: Vec<f64>,
        knots_u: Vec<f64>,
        knots_v: Vec<f64>,
        parameter_range: SurfaceParameterRange,
        closed_u: bool,
        closed_v: bool,
        periodic_u: bool,
        periodic_v: bool,
        classical_form: RationalSurfaceForm,
    ) -> Result<Self> {
        let expected_points = (n1 + 1) * (n2 + 1);
        if control_points.len() != expected_points || weights.len() != expected_points {
            return Err(IgesError::DataFormatError(format!(
                "expected {expected_points} control points and weights, got {} and {}",
                control_points.len(),
                weights.len()
            )));
        }
        if n1 + 1 < degree_u + 1 || n2 + 1 < degree_v + 1 {
            return Err(IgesError::DataFormatError(
                "too few control points for the given degrees".to_string(),
            ));
        }
        if knots_u.len() != n1 + degree_u + 2 {
            return Err(IgesError::DataFormatError(format!(
                "expected {} U knots, got {}",
                n1 + degree_u + 2,
                knots_u.len()
            )));
        }
        if knots_v.len() != n2 + degree_v + 2 {
            return Err(IgesError::DataFormatError(format!(
                "expected {} V knots, got {}",
                n2 + degree_v + 2,
                knots_v.len()
            )));
        }
        if knots_u.windows(2).any(|w| w[0] > w[1]) || knots_v.windows(2).any(|w| w[0] > w[1]) {
            return Err(IgesError::DataFormatError(
                "knot vectors must be non-decreasing".to_string(),
            ));
        }
        if weights.iter().any(|w| *w <= 0.0) {
            return Err(IgesError::DataFormatError(
                "weights must be strictly positive".to_string(),
            ));
        }
        let mut de = DirectoryEntry::new(128);
        de.form_number = classical_form.form_number();
        let base = EntityBase::new(id, EntityKind::NurbsSurface, de);
        Ok(Self {
            base,
            degree_u,
            degree_v,
            knots_u,
            knots_v,
            n1,
            n2,
            weights,
            control_points,
            parameter_range,
            closed_u,
            closed_v,
            periodic_u,
            periodic_v,
            classical_form,
        })
    }

    fn index(&self, i: usize, j: usize) -> usize {
        i * (self.n2 + 1) + j
    }

    /// The weight at control-grid position `(i, j)`.
    pub fn weight_at(&self, i: usize, j: usize) -> f64 {
        self.weights[self.index(i, j)]
    }

    /// The control point at grid position `(i, j)`.
    pub fn control_point_at(&self, i: usize, j: usize) -> Vector3<f64> {
        self.control_points[self.index(i, j)]
    }

    /// Whether this surface asserts a specific classical quadric form.
    pub fn classical_form(&self) -> RationalSurfaceForm {
        self.classical_form
    }

    /// Build from the raw DE-128 main-parameter vector: `[K1, K2, M1,
    /// M2, PROP1..5, U-knots, V-knots, weights, control points, U0, U1,
    /// V0, V1]`.
    #[allow(clippy::many_single_char_names)]
    pub fn from_parameters(id: ObjectID, params: &ParameterVector, form_number: i32) -> Result<Self> {
        let k1 = params.integer(0)? as usize;
        let k2 = params.integer(1)? as usize;
        let degree_u = params.integer(2)? as usize;
        let degree_v = params.integer(3)? as usize;
        let closed_u = params.integer(4)? != 0;
        let closed_v = params.integer(5)? != 0;
        let _polynomial = params.integer(6)? != 0;
        let periodic_u = params.integer(7)? != 0;
        let periodic_v = params.integer(8)? != 0;

        let mut cursor = 9;
        let n_knots_u = k1 + degree_u + 2;
        let mut knots_u = Vec::with_capacity(n_knots_u);
        for _ in 0..n_knots_u {
            knots_u.push(params.real(cursor)?);
            cursor += 1;
        }
        let n_knots_v = k2 + degree_v + 2;
        let mut knots_v = Vec::with_capacity(n_knots_v);
        for _ in 0..n_knots_v {
            knots_v.push(params.real(cursor)?);
            cursor += 1;
        }
        let n_points = (k1 + 1) * (k2 + 1);
        let mut weights = Vec::with_capacity(n_points);
        for _ in 0..n_points {
            weights.push(params.real(cursor)?);
            cursor += 1;
        }
        let mut control_points = Vec::with_capacity(n_points);
        for _ in 0..n_points {
            control_points.push(Vector3::new(
                params.real(cursor)?,
                params.real(cursor + 1)?,
                params.real(cursor + 2)?,
            ));
            cursor += 3;
        }
        let u0 = params.real(cursor)?;
        let u1 = params.real(cursor + 1)?;
        let v0 = params.real(cursor + 2)?;
        let v1 = params.real(cursor + 3)?;

        Self::new(
            id,
            degree_u,
            degree_v,
            k1,
            k2,
            control_points,
            weights,
            knots_u,
            knots_v,
            SurfaceParameterRange {
                u_start: u0,
                u_end: u1,
                v_start: v0,
                v_end: v1,
            },
            closed_u,
            closed_v,
            periodic_u,
            periodic_v,
            RationalSurfaceForm::from_form_number(form_number),
        )
    }

    /// Homogeneous numerator/weight derivatives `A[k][l]`, `w[k][l]`
    /// through total order `n`, packed in [`SurfaceDerivatives`]'s
    /// triangular layout.
    fn homogeneous_derivatives(&self, u: f64, v: f64, n: usize) -> (SurfaceDerivatives, Vec<f64>) {
        let span_u = find_span(self.degree_u, self.n1, &self.knots_u, u);
        let span_v = find_span(self.degree_v, self.n2, &self.knots_v, v);
        let nders = basis_derivatives(self.degree_u, &self.knots_u, span_u, u, n);
        let mders = basis_derivatives(self.degree_v, &self.knots_v, span_v, v, n);

        let mut a_values = Vec::new();
        let mut w_values = Vec::new();
        for k in 0..=n {
            for l in 0..=(n - k) {
                let mut a = Vector3::zeros();
                let mut w = 0.0f64;
                for p in 0..=self.degree_u {
                    let nu = nders[k][p];
                    if nu == 0.0 {
                        continue;
                    }
                    let i = span_u - self.degree_u + p;
                    for q in 0..=self.degree_v {
                        let mv = mders[l][q];
                        let j = span_v - self.degree_v + q;
                        let weight = self.weight_at(i, j);
                        let basis = nu * mv;
                        a += self.control_point_at(i, j) * weight * basis;
                        w += weight * basis;
                    }
                }
                a_values.push(a);
                w_values.push(w);
            }
        }
        (SurfaceDerivatives::new(n, a_values), w_values)
    }
}

/// Piegl & Tiller Algorithm A2.1, the knot-span index containing `u`.
fn find_span(degree: usize, n_ctrl_minus_one: usize, knots: &[f64], u: f64) -> usize {
    let n = n_ctrl_minus_one;
    let p = degree;
    if u >= knots[n + 1] {
        return n;
    }
    if u <= knots[p] {
        return p;
    }
    let (mut low, mut high) = (p, n + 1);
    let mut mid = (low + high) / 2;
    while u < knots[mid] || u >= knots[mid + 1] {
        if u < knots[mid] {
            high = mid;
        } else {
            low = mid;
        }
        mid = (low + high) / 2;
    }
    mid
}

/// Piegl & Tiller Algorithm A2.3, nonzero basis function derivatives
/// through order `n` at `u` in the span `span`. `ders[k][j]` is the
/// `k`-th derivative of `N_{span-p+j,p}`.
fn basis_derivatives(degree: usize, knots: &[f64], span: usize, u: f64, n: usize) -> Vec<Vec<f64>> {
    let p = degree;
    let mut ndu = vec![vec![0.0f64; p + 1]; p + 1];
    ndu[0][0] = 1.0;
    let mut left = vec![0.0f64; p + 1];
    let mut right = vec![0.0f64; p + 1];

    for j in 1..=p {
        left[j] = u - knots[span + 1 - j];
        right[j] = knots[span + j] - u;
        let mut saved = 0.0;
        for r in 0..j {
            ndu[j][r] = right[r + 1] + left[j - r];
            let temp = ndu[r][j - 1] / ndu[j][r];
            ndu[r][j] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        ndu[j][j] = saved;
    }

    let max_order = n.min(p);
    let mut ders = vec![vec![0.0f64; p + 1]; max_order + 1];
    for j in 0..=p {
        ders[0][j] = ndu[j][p];
    }

    let mut a = vec![vec![0.0f64; p + 1]; 2];
    for r in 0..=p {
        let (mut s1, mut s2) = (0usize, 1usize);
        a[0][0] = 1.0;
        for k in 1..=max_order {
            let mut d = 0.0;
            let rk = r as isize - k as isize;
            let pk = p as isize - k as isize;
            if r >= k {
                a[s2][0] = a[s1][0] / ndu[(pk + 1) as usize][rk as usize];
                d = a[s2][0] * ndu[rk as usize][pk as usize];
            }
            let j1 = if rk >= -1 { 1 } else { (-rk) as usize };
            let j2 = if r as isize - 1 <= pk { k - 1 } else { p - r };
            for j in j1..=j2 {
                a[s2][j] = (a[s1][j] - a[s1][j - 1]) / ndu[(pk + 1) as usize][(rk + j as isize) as usize];
                d += a[s2][j] * ndu[(rk + j as isize) as usize][pk as usize];
            }
            if r <= pk as usize {
                a[s2][k] = -a[s1][k - 1] / ndu[(pk + 1) as usize][r];
                d += a[s2][k] * ndu[r][pk as usize];
            }
            ders[k][r] = d;
            std::mem::swap(&mut s1, &mut s2);
        }
    }

    let mut factor = p as f64;
    for k in 1..=max_order {
        for j in 0..=p {
            ders[k][j] *= factor;
        }
        factor *= (p - k) as f64;
    }
    while ders.len() <= n {
        ders.push(vec![0.0; p + 1]);
    }
    ders
}

/// The same triangular `(i, j)` packing [`SurfaceDerivatives`] uses
/// internally, replicated here for indexing the parallel `wders` array
/// (which has no `Vector3` payload and so isn't itself a
/// `SurfaceDerivatives`).
fn tri_index(order: usize, i: usize, j: usize) -> usize {
    let mut idx = 0;
    for ip in 0..i {
        idx += order + 1 - ip;
    }
    idx + j
}

fn binomial(n: usize, k: usize) -> u64 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut result = 1u64;
    for i in 0..k {
        result = result * (n - i) as u64 / (i + 1) as u64;
    }
    result
}

impl Entity for NurbsSurface {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }

    fn main_pd_parameters(&self) -> ParameterVector {
        let mut v = vec![
            Parameter::Integer(self.n1 as i64),
            Parameter::Integer(self.n2 as i64),
            Parameter::Integer(self.degree_u as i64),
            Parameter::Integer(self.degree_v as i64),
            Parameter::Integer(self.closed_u as i64),
            Parameter::Integer(self.closed_v as i64),
            Parameter::Integer(1),
            Parameter::Integer(self.periodic_u as i64),
            Parameter::Integer(self.periodic_v as i64),
        ];
        v.extend(self.knots_u.iter().map(|k| Parameter::Real(*k)));
        v.extend(self.knots_v.iter().map(|k| Parameter::Real(*k)));
        v.extend(self.weights.iter().map(|w| Parameter::Real(*w)));
        for p in &self.control_points {
            v.push(Parameter::Real(p.x));
            v.push(Parameter::Real(p.y));
            v.push(Parameter::Real(p.z));
        }
        v.push(Parameter::Real(self.parameter_range.u_start));
        v.push(Parameter::Real(self.parameter_range.u_end));
        v.push(Parameter::Real(self.parameter_range.v_start));
        v.push(Parameter::Real(self.parameter_range.v_end));
        ParameterVector::from_values(v)
    }

    fn validate_pd(&self) -> ValidationResult {
        let mut result = ValidationResult::ok();
        let expected_points = (self.n1 + 1) * (self.n2 + 1);
        if self.control_points.len() != expected_points || self.weights.len() != expected_points {
            result.push("control point/weight grid size inconsistent with N1, N2".to_string());
        }
        if self.knots_u.len() != self.n1 + self.degree_u + 2 {
            result.push("U knot count inconsistent with degree and N1".to_string());
        }
        if self.knots_v.len() != self.n2 + self.degree_v + 2 {
            result.push("V knot count inconsistent with degree and N2".to_string());
        }
        if self.weights.iter().any(|w| *w <= 0.0) {
            result.push("all weights must be strictly positive".to_string());
        }
        result
    }
}

impl Surface for NurbsSurface {
    fn parameter_range(&self) -> SurfaceParameterRange {
        self.parameter_range
    }

    fn is_u_closed(&self) -> bool {
        self.closed_u
    }

    fn is_v_closed(&self) -> bool {
        self.closed_v
    }

    fn derivatives(&self, u: f64, v: f64, order: usize) -> Result<SurfaceDerivatives> {
        let range = self.parameter_range();
        if !(range.u_start..=range.u_end).contains(&u) || !(range.v_start..=range.v_end).contains(&v) {
            return Err(IgesError::OutOfRange(format!(
                "parameter ({u}, {v}) outside NURBS surface's domain"
            )));
        }
        let (aders, wders) = self.homogeneous_derivatives(u, v, order);
        let w00 = *wders
            .first()
            .ok_or(IgesError::ImplementationError("empty homogeneous weight derivatives"))?;
        if w00.abs() < crate::core::precision::EPSILON_NORMAL {
            return Err(IgesError::ImplementationError(
                "surface weight vanished at evaluation point",
            ));
        }

        // Piegl & Tiller Algorithm A4.4 (rational surface derivatives
        // via the homogeneous numerator/weight derivatives above).
        let mut skl = vec![vec![Vector3::zeros(); order + 1]; order + 1];
        for k in 0..=order {
            for l in 0..=(order - k) {
                let mut value = *aders.get(k, l).unwrap();
                for j in 1..=l {
                    let wj = wders[tri_index(order, 0, j)];
                    value -= skl[k][l - j] * (binomial(l, j) as f64 * wj);
                }
                for i in 1..=k {
                    let wi0 = wders[tri_index(order, i, 0)];
                    value -= skl[k - i][l] * (binomial(k, i) as f64 * wi0);
                    let mut nested = Vector3::zeros();
                    for j in 1..=l {
                        let wij = wders[tri_index(order, i, j)];
                        nested += skl[k - i][l - j] * (binomial(l, j) as f64 * wij);
                    }
                    value -= nested * binomial(k, i) as f64;
                }
                skl[k][l] = value / w00;
            }
        }

        let mut values = Vec::new();
        for k in 0..=order {
            for l in 0..=(order - k) {
                values.push(skl[k][l]);
            }
        }
        Ok(SurfaceDerivatives::new(order, values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{IdGenerator, ObjectKind};

    fn new_id() -> ObjectID {
        IdGenerator::generate_entity(ObjectKind::EntityNew, 128).unwrap().0
    }

    /// A flat 2x2-degree-1 bilinear patch spanning the unit square at
    /// z = 0, all weights 1 (equivalent to a polynomial patch).
    fn unit_bilinear_patch() -> NurbsSurface {
        let control_points = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
        ];
        let weights = vec![1.0, 1.0, 1.0, 1.0];
        NurbsSurface::new(
            new_id(),
            1,
            1,
            1,
            1,
            control_points,
            weights,
            vec![0.0, 0.0, 1.0, 1.0],
            vec![0.0, 0.0, 1.0, 1.0],
            SurfaceParameterRange {
                u_start: 0.0,
                u_end: 1.0,
                v_start: 0.0,
                v_end: 1.0,
            },
            false,
            false,
            false,
            false,
            RationalSurfaceForm::Plane,
        )
        .unwrap()
    }

    #[test]
    fn corners_match_control_points() {
        let surface = unit_bilinear_patch();
        assert!((surface.point_at(0.0, 0.0).unwrap() - Vector3::new(0.0, 0.0, 0.0)).norm() < 1e-9);
        assert!((surface.point_at(1.0, 1.0).unwrap() - Vector3::new(1.0, 1.0, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn center_is_bilinear_average() {
        let surface = unit_bilinear_patch();
        let p = surface.point_at(0.5, 0.5).unwrap();
        assert!((p - Vector3::new(0.5, 0.5, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn partial_derivatives_match_central_difference() {
        let surface = unit_bilinear_patch();
        let (u, v, h) = (0.4, 0.6, 1e-5);
        let numeric_du =
            (surface.point_at(u + h, v).unwrap() - surface.point_at(u - h, v).unwrap()) / (2.0 * h);
        let derivs = surface.derivatives(u, v, 1).unwrap();
        assert!((numeric_du - derivs.du().unwrap()).norm() < 1e-3);
    }

    #[test]
    fn mismatched_grid_size_is_rejected() {
        assert!(NurbsSurface::new(
            new_id(),
            1,
            1,
            1,
            1,
            vec![Vector3::zeros(); 3],
            vec![1.0; 3],
            vec![0.0, 0.0, 1.0, 1.0],
            vec![0.0, 0.0, 1.0, 1.0],
            SurfaceParameterRange {
                u_start: 0.0,
                u_end: 1.0,
                v_start: 0.0,
                v_end: 1.0
            },
            false,
            false,
            false,
            false,
            RationalSurfaceForm::Undetermined,
        )
        .is_err());
    }
}
