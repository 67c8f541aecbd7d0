//! Conic arc entity (type 104): ellipse, parabola, or hyperbola arc.
//!
//! Grounded on `SPEC_FULL.md` §4.5 "Conic arc": implicit quadratic `A
//! x^2 + B xy + C y^2 + D x + E y + F = 0` plus start/end points in the
//! plane `z = z_t`. The form number must match the conic kind inferred
//! from `q2 = AC - B^2/4` (q2 > 0 ellipse, = 0 parabola, < 0
//! hyperbola); the degenerate case `q1 = 0` is rejected.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::entities::directory_entry::DirectoryEntry;
use crate::entities::entity_base::{Entity, EntityBase, EntityKind};
use crate::entities::interfaces::{Curve, CurveDerivatives, ParameterRange};
use crate::entities::parameter_vector::{Parameter, ParameterVector};
use crate::error::{IgesError, Result, ValidationResult};
use crate::identity::ObjectID;

/// The conic kind inferred from the implicit quadratic's
/// discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConicKind {
    /// Form 1: `q2 > 0`.
    Ellipse,
    /// Form 2: `q2 < 0`.
    Hyperbola,
    /// Form 3: `q2 == 0`.
    Parabola,
}

impl ConicKind {
    fn form_number(self) -> i32 {
        match self {
            ConicKind::Ellipse => 1,
            ConicKind::Hyperbola => 2,
            ConicKind::Parabola => 3,
        }
    }

    fn from_form_number(n: i32) -> Result<Self> {
        match n {
            1 => Ok(ConicKind::Ellipse),
            2 => Ok(ConicKind::Hyperbola),
            3 => Ok(ConicKind::Parabola),
            other => Err(IgesError::DataFormatError(format!(
                "conic arc form number must be 1, 2, or 3, got {other}"
            ))),
        }
    }
}

/// The implicit-quadratic coefficients `A x^2 + B xy + C y^2 + D x + E
/// y + F = 0`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConicCoefficients {
    /// `A`.
    pub a: f64,
    /// `B`.
    pub b: f64,
    /// `C`.
    pub c: f64,
    /// `D`.
    pub d: f64,
    /// `E`.
    pub e: f64,
    /// `F`.
    pub f: f64,
}

impl ConicCoefficients {
    fn q2(&self) -> f64 {
        self.a * self.c - self.b * self.b / 4.0
    }

    fn q1(&self) -> f64 {
        // The 3x3 determinant of the conic's matrix form; a degenerate
        // conic (pair of lines, point) has q1 == 0.
        self.a * self.c * self.f + self.b * self.e * self.d / 4.0 - self.a * self.e * self.e / 4.0
            - self.c * self.d * self.d / 4.0
            - self.f * self.b * self.b / 4.0
    }

    fn on_conic(&self, x: f64, y: f64) -> f64 {
        self.a * x * x + self.b * x * y + self.c * y * y + self.d * x + self.e * y + self.f
    }
}

/// An ellipse, parabola, or hyperbola arc in the plane `z = z_t`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConicArc {
    base: EntityBase,
    z_t: f64,
    coeffs: ConicCoefficients,
    start: (f64, f64),
    end: (f64, f64),
    kind: ConicKind,
}

impl ConicArc {
    /// Construct and validate against the form number / quadratic
    /// discriminant and the on-conic constraint for `start`/`end`.
    pub fn new(
        id: ObjectID,
        z_t: f64,
        coeffs: ConicCoefficients,
        start: (f64, f64),
        end: (f64, f64),
    ) -> Result<Self> {
        if coeffs.q1().abs() < crate::core::precision::GEOMETRIC_TOLERANCE {
            return Err(IgesError::DataFormatError(
                "conic arc coefficients describe a degenerate conic (q1 = 0)".to_string(),
            ));
        }
        let q2 = coeffs.q2();
        let kind = if q2 > crate::core::precision::EPSILON_ROUGH {
            ConicKind::Ellipse
        } else if q2 < -crate::core::precision::EPSILON_ROUGH {
            ConicKind::Hyperbola
        } else {
            ConicKind::Parabola
        };
        if coeffs.on_conic(start.0, start.1).abs() > crate::core::precision::DISCRETIZATION_TOLERANCE
            || coeffs.on_conic(end.0, end.1).abs() > crate::core::precision::DISCRETIZATION_TOLERANCE
        {
            return Err(IgesError::DataFormatError(
                "conic arc start/end points do not lie on the conic".to_string(),
            ));
        }
        let mut de = DirectoryEntry::new(104);
        de.form_number = kind.form_number();
        let base = EntityBase::new(id, EntityKind::ConicArc, de);
        Ok(Self {
            base,
            z_t,
            coeffs,
            start,
            end,
            kind,
        })
    }

    /// Build from the raw main-parameter vector `{a,b,c,d,e,f,z_t,
    /// xs,ys,xt,yt}`, checking the declared form number agrees with
    /// the coefficients' inferred kind.
    pub fn from_parameters(id: ObjectID, params: &ParameterVector, form_number: i32) -> Result<Self> {
        let declared = ConicKind::from_form_number(form_number)?;
        let coeffs = ConicCoefficients {
            a: params.real(0)?,
            b: params.real(1)?,
            c: params.real(2)?,
            d: params.real(3)?,
            e: params.real(4)?,
            f: params.real(5)?,
        };
        let z_t = params.real(6)?;
        let start = (params.real(7)?, params.real(8)?);
        let end = (params.real(9)?, params.real(10)?);
        let arc = Self::new(id, z_t, coeffs, start, end)?;
        if arc.kind != declared {
            return Err(IgesError::DataFormatError(
                "declared form number does not match the conic inferred from its coefficients"
                    .to_string(),
            ));
        }
        Ok(arc)
    }

    /// The inferred conic kind.
    pub fn kind(&self) -> ConicKind {
        self.kind
    }

    fn point_for_angle_like_parameter(&self, t: f64) -> Result<Vector3<f64>> {
        // Ellipses are parametrized angularly about the conic's
        // center; parabolas axis-aligned by coordinate; hyperbolas via
        // `t = atan(y * sqrt(C/F))` or the symmetric branch, matching
        // `SPEC_FULL.md` §4.5.
        match self.kind {
            ConicKind::Ellipse => {
                let (cx, cy, rx, ry, rotation) = self.ellipse_geometry();
                let (x, y) = (rx * t.cos(), ry * t.sin());
                let (xr, yr) = (
                    x * rotation.cos() - y * rotation.sin(),
                    x * rotation.sin() + y * rotation.cos(),
                );
                Ok(Vector3::new(cx + xr, cy + yr, self.z_t))
            }
            ConicKind::Parabola => Ok(self.parabola_derivatives(t, 0)[0]),
            ConicKind::Hyperbola => Ok(self.hyperbola_derivatives(t, 0)?[0]),
        }
    }

    /// Closed-form derivatives `C(t), C'(t), ..., C^(n)(t)` for the
    /// `Y = k*X^2` / `X = k*Y^2` axis-aligned parabola forms. Orders
    /// beyond 2 are identically zero (a parabola's defining polynomial
    /// is quadratic), so no error case is needed here.
    fn parabola_derivatives(&self, t: f64, n: usize) -> Vec<Vector3<f64>> {
        let ConicCoefficients { a, c, d, e, .. } = self.coeffs;
        let (xs, ys) = self.start;
        let (xe, ye) = self.end;
        let mut values = vec![Vector3::new(0.0, 0.0, 0.0); n + 1];
        if a.abs() > crate::core::precision::EPSILON_ROUGH && e.abs() > crate::core::precision::EPSILON_ROUGH {
            // Y = k * X^2
            let x_coef = if xs < xe { 1.0 } else { -1.0 };
            values[0] = Vector3::new(x_coef * t, -(a / e) * t * t, self.z_t);
            if n >= 1 {
                values[1] = Vector3::new(x_coef, -2.0 * (a / e) * t, 0.0);
            }
            if n >= 2 {
                values[2] = Vector3::new(0.0, -2.0 * (a / e), 0.0);
            }
        } else {
            // X = k * Y^2
            let y_coef = if ys < ye { 1.0 } else { -1.0 };
            values[0] = Vector3::new(-(c / d) * t * t, y_coef * t, self.z_t);
            if n >= 1 {
                values[1] = Vector3::new(-2.0 * (c / d) * t, y_coef, 0.0);
            }
            if n >= 2 {
                values[2] = Vector3::new(-2.0 * (c / d), 0.0, 0.0);
            }
        }
        values
    }

    /// Closed-form derivatives `C(t), C'(t), C''(t)` for the
    /// secant/tangent hyperbola parametrization, picking the
    /// transverse axis from the sign of `F*A`/`F*C`. Orders beyond 2
    /// are not implemented, matching the grounding source.
    fn hyperbola_derivatives(&self, t: f64, n: usize) -> Result<Vec<Vector3<f64>>> {
        if n > 2 {
            return Err(IgesError::NotImplementedError(
                "derivatives of hyperbolic conic arcs higher than order 2 are not implemented"
                    .to_string(),
            ));
        }
        let ConicCoefficients { a, c, f, .. } = self.coeffs;
        let (xs, ys) = self.start;
        let (xe, ye) = self.end;
        let sec_t = 1.0 / t.cos();
        let tan_t = t.tan();
        let sec_t2 = sec_t * sec_t;
        let sec3_sec1tan2 = sec_t * (sec_t * sec_t + tan_t * tan_t);
        let mut values = Vec::with_capacity(n + 1);
        if f * a < 0.0 {
            // X-axis is the transverse axis.
            let aa = (-f / a).sqrt();
            let bb = (f / c).sqrt();
            let sgn = if ys < ye { 1.0 } else { -1.0 };
            for k in 0..=n {
                values.push(match k {
                    0 => Vector3::new(aa * sec_t, sgn * bb * tan_t, self.z_t),
                    1 => Vector3::new(aa * sec_t * tan_t, sgn * bb * sec_t2, 0.0),
                    _ => Vector3::new(aa * sec3_sec1tan2, sgn * 2.0 * bb * sec_t2 * tan_t, 0.0),
                });
            }
        } else {
            // Y-axis is the transverse axis.
            let aa = (f / a).sqrt();
            let bb = (-f / c).sqrt();
            let sgn = if xs < xe { 1.0 } else { -1.0 };
            for k in 0..=n {
                values.push(match k {
                    0 => Vector3::new(sgn * aa * tan_t, bb * sec_t, self.z_t),
                    1 => Vector3::new(sgn * aa * sec_t2, bb * sec_t * tan_t, 0.0),
                    _ => Vector3::new(sgn * 2.0 * aa * sec_t2 * tan_t, bb * sec3_sec1tan2, 0.0),
                });
            }
        }
        Ok(values)
    }

    /// Axis-aligned parameter range for the `Y=k*X^2` / `X=k*Y^2`
    /// parabola forms, oriented so the range increases from start to
    /// end.
    fn parabola_range(&self) -> ParameterRange {
        let ConicCoefficients { a, c, d, e, .. } = self.coeffs;
        let (xs, ys) = self.start;
        let (xe, ye) = self.end;
        if a.abs() > crate::core::precision::EPSILON_ROUGH && e.abs() > crate::core::precision::EPSILON_ROUGH {
            if xs < xe {
                ParameterRange { start: xs, end: xe }
            } else {
                ParameterRange { start: -xs, end: -xe }
            }
        } else if c.abs() > crate::core::precision::EPSILON_ROUGH && d.abs() > crate::core::precision::EPSILON_ROUGH {
            if ys < ye {
                ParameterRange { start: ys, end: ye }
            } else {
                ParameterRange { start: -ys, end: -ye }
            }
        } else {
            ParameterRange { start: 0.0, end: 0.0 }
        }
    }

    /// Parameter range for the secant/tangent hyperbola
    /// parametrization, picking the transverse axis from the sign of
    /// `F*A`/`F*C`.
    fn hyperbola_range(&self) -> ParameterRange {
        let ConicCoefficients { a, c, f, .. } = self.coeffs;
        let (xs, ys) = self.start;
        let (xe, ye) = self.end;
        if f * a < 0.0 && f * c > 0.0 {
            let t_s = (ys * (c / f).sqrt()).atan();
            let t_e = (ye * (c / f).sqrt()).atan();
            if t_s < t_e {
                ParameterRange { start: t_s, end: t_e }
            } else {
                ParameterRange { start: -t_s, end: -t_e }
            }
        } else if f * a > 0.0 && f * c < 0.0 {
            let t_s = (xs * (a / f).sqrt()).atan();
            let t_e = (xe * (a / f).sqrt()).atan();
            if t_s < t_e {
                ParameterRange { start: t_s, end: t_e }
            } else {
                ParameterRange { start: -t_s, end: -t_e }
            }
        } else {
            ParameterRange { start: 0.0, end: 0.0 }
        }
    }

    fn ellipse_geometry(&self) -> (f64, f64, f64, f64, f64) {
        // Standard conversion of a general conic into center + radii +
        // rotation, valid when `kind == Ellipse`.
        let ConicCoefficients { a, b, c, d, e, f } = self.coeffs;
        let denom = 4.0 * a * c - b * b;
        let cx = (b * e - 2.0 * c * d) / denom;
        let cy = (b * d - 2.0 * a * e) / denom;
        let rotation = if b.abs() < crate::core::precision::EPSILON_ROUGH {
            if a < c {
                0.0
            } else {
                std::f64::consts::FRAC_PI_2
            }
        } else {
            0.5 * (b / (a - c)).atan()
        };
        let cos_t = rotation.cos();
        let sin_t = rotation.sin();
        let a_p = a * cos_t * cos_t + b * cos_t * sin_t + c * sin_t * sin_t;
        let c_p = a * sin_t * sin_t - b * cos_t * sin_t + c * cos_t * cos_t;
        let f_p = a * cx * cx + b * cx * cy + c * cy * cy + d * cx + e * cy + f;
        let rx = (-f_p / a_p).abs().sqrt();
        let ry = (-f_p / c_p).abs().sqrt();
        (cx, cy, rx, ry, rotation)
    }
}

impl Entity for ConicArc {
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
        let c = self.coeffs;
        ParameterVector::from_values([
            Parameter::Real(c.a),
            Parameter::Real(c.b),
            Parameter::Real(c.c),
            Parameter::Real(c.d),
            Parameter::Real(c.e),
            Parameter::Real(c.f),
            Parameter::Real(self.z_t),
            Parameter::Real(self.start.0),
            Parameter::Real(self.start.1),
            Parameter::Real(self.end.0),
            Parameter::Real(self.end.1),
        ])
    }

    fn validate_pd(&self) -> ValidationResult {
        let mut result = ValidationResult::ok();
        if self.coeffs.q1().abs() < crate::core::precision::GEOMETRIC_TOLERANCE {
            result.push("conic coefficients describe a degenerate conic".to_string());
        }
        result
    }
}

impl Curve for ConicArc {
    fn parameter_range(&self) -> ParameterRange {
        match self.kind {
            ConicKind::Ellipse => {
                let (cx, cy, _, _, rotation) = self.ellipse_geometry();
                let angle_of = |x: f64, y: f64| -> f64 {
                    let dx = x - cx;
                    let dy = y - cy;
                    let (lx, ly) = (
                        dx * rotation.cos() + dy * rotation.sin(),
                        -dx * rotation.sin() + dy * rotation.cos(),
                    );
                    ly.atan2(lx)
                };
                let mut start_angle = angle_of(self.start.0, self.start.1);
                let mut end_angle = angle_of(self.end.0, self.end.1);
                if end_angle <= start_angle {
                    end_angle += crate::core::precision::TAU;
                }
                if start_angle < 0.0 {
                    start_angle += crate::core::precision::TAU;
                    end_angle += crate::core::precision::TAU;
                }
                ParameterRange {
                    start: start_angle,
                    end: end_angle,
                }
            }
            ConicKind::Parabola => self.parabola_range(),
            ConicKind::Hyperbola => self.hyperbola_range(),
        }
    }

    fn is_closed(&self) -> bool {
        false
    }

    fn derivatives(&self, t: f64, n: usize) -> Result<CurveDerivatives> {
        if !self.parameter_range().contains(t) {
            return Err(IgesError::OutOfRange(format!(
                "parameter {t} outside conic arc's domain"
            )));
        }
        match self.kind {
            ConicKind::Ellipse => {
                let (_, _, rx, ry, rotation) = self.ellipse_geometry();
                let mut values = Vec::with_capacity(n + 1);
                for k in 0..=n {
                    let phase = (k as f64) * std::f64::consts::FRAC_PI_2;
                    let (dx, dy) = (rx * (t + phase).cos(), ry * (t + phase).sin());
                    let (xr, yr) = (
                        dx * rotation.cos() - dy * rotation.sin(),
                        dx * rotation.sin() + dy * rotation.cos(),
                    );
                    values.push(if k == 0 {
                        self.point_for_angle_like_parameter(t)?
                    } else {
                        Vector3::new(xr, yr, 0.0)
                    });
                }
                Ok(CurveDerivatives::new(values))
            }
            ConicKind::Parabola => Ok(CurveDerivatives::new(self.parabola_derivatives(t, n))),
            ConicKind::Hyperbola => Ok(CurveDerivatives::new(self.hyperbola_derivatives(t, n)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{IdGenerator, ObjectKind};

    fn new_id() -> ObjectID {
        IdGenerator::generate_entity(ObjectKind::EntityNew, 104).unwrap().0
    }

    #[test]
    fn unit_circle_quarter_is_classified_as_ellipse() {
        let coeffs = ConicCoefficients {
            a: 1.0,
            b: 0.0,
            c: 1.0,
            d: 0.0,
            e: 0.0,
            f: -1.0,
        };
        let arc = ConicArc::new(new_id(), 0.0, coeffs, (1.0, 0.0), (0.0, 1.0)).unwrap();
        assert_eq!(arc.kind(), ConicKind::Ellipse);
        let p = arc.point_at(std::f64::consts::FRAC_PI_2).unwrap();
        assert!((p - Vector3::new(0.0, 1.0, 0.0)).norm() < 1e-8);
    }

    #[test]
    fn off_conic_endpoint_is_rejected() {
        let coeffs = ConicCoefficients {
            a: 1.0,
            b: 0.0,
            c: 1.0,
            d: 0.0,
            e: 0.0,
            f: -1.0,
        };
        assert!(ConicArc::new(new_id(), 0.0, coeffs, (2.0, 0.0), (0.0, 1.0)).is_err());
    }

    #[test]
    fn y_equals_x_squared_is_classified_as_parabola_and_evaluates() {
        let coeffs = ConicCoefficients {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 0.0,
            e: -1.0,
            f: 0.0,
        };
        let arc = ConicArc::new(new_id(), 0.0, coeffs, (0.0, 0.0), (1.0, 1.0)).unwrap();
        assert_eq!(arc.kind(), ConicKind::Parabola);
        let p = arc.point_at(0.5).unwrap();
        assert!((p - Vector3::new(0.5, 0.25, 0.0)).norm() < 1e-8);
    }

    #[test]
    fn x_squared_minus_y_squared_is_classified_as_hyperbola_and_evaluates() {
        let coeffs = ConicCoefficients {
            a: 1.0,
            b: 0.0,
            c: -1.0,
            d: 0.0,
            e: 0.0,
            f: -1.0,
        };
        let arc = ConicArc::new(
            new_id(),
            0.0,
            coeffs,
            (1.0, 0.0),
            (std::f64::consts::SQRT_2, 1.0),
        )
        .unwrap();
        assert_eq!(arc.kind(), ConicKind::Hyperbola);
        let start = arc.point_at(0.0).unwrap();
        assert!((start - Vector3::new(1.0, 0.0, 0.0)).norm() < 1e-8);
        let end_t = arc.parameter_range().end;
        let end = arc.point_at(end_t).unwrap();
        assert!((end - Vector3::new(std::f64::consts::SQRT_2, 1.0, 0.0)).norm() < 1e-8);
    }

    #[test]
    fn degenerate_conic_is_rejected() {
        let coeffs = ConicCoefficients {
            a: 0.0,
            b: 0.0,
            c: 0.0,
            d: 0.0,
            e: 0.0,
            f: 0.0,
        };
        assert!(ConicArc::new(new_id(), 0.0, coeffs, (0.0, 0.0), (1.0, 0.0)).is_err());
    }
}
