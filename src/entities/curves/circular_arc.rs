//! Circular arc entity (type 100): a 2D arc in the plane `z = zt`.
//!
//! Grounded on `SPEC_FULL.md` §4.5 "Circular arc" and Testable
//! Properties' concrete scenario: center `(xc, yc, zt)`, start `(xs,
//! ys)`, terminate `(xt, yt)`; `C^(k)(t) = center (k=0) + r*(cos(t +
//! k*pi/2), sin(t + k*pi/2), 0)`.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::core::precision::{ApproxEq, TAU};
use crate::entities::directory_entry::DirectoryEntry;
use crate::entities::entity_base::{Entity, EntityBase, EntityKind};
use crate::entities::interfaces::{Curve, CurveDerivatives, ParameterRange};
use crate::entities::parameter_vector::{Parameter, ParameterVector};
use crate::error::{IgesError, Result, ValidationResult};
use crate::identity::ObjectID;

/// A circular arc lying in the plane `z = z_t`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircularArc {
    base: EntityBase,
    z_t: f64,
    center: (f64, f64),
    radius: f64,
    start_angle: f64,
    end_angle: f64,
}

impl CircularArc {
    /// Build from the raw PD layout `{z_t, xc, yc, xs, ys, xt, yt}`.
    /// Radii of the start and end points must agree with each other
    /// within geometric tolerance.
    pub fn new(
        id: ObjectID,
        z_t: f64,
        center: (f64, f64),
        start: (f64, f64),
        terminate: (f64, f64),
    ) -> Result<Self> {
        let (xc, yc) = center;
        let r_start = ((start.0 - xc).powi(2) + (start.1 - yc).powi(2)).sqrt();
        let r_end = ((terminate.0 - xc).powi(2) + (terminate.1 - yc).powi(2)).sqrt();
        if !r_start.approx_eq(&r_end) {
            return Err(IgesError::DataFormatError(
                "circular arc start/end points are not equidistant from the center".to_string(),
            ));
        }
        if r_start < crate::core::precision::GEOMETRIC_TOLERANCE {
            return Err(IgesError::DataFormatError(
                "circular arc radius must be positive".to_string(),
            ));
        }
        let mut start_angle = (start.1 - yc).atan2(start.0 - xc);
        if start_angle < 0.0 {
            start_angle += TAU;
        }
        let mut end_angle = (terminate.1 - yc).atan2(terminate.0 - xc);
        if end_angle < 0.0 {
            end_angle += TAU;
        }
        if end_angle <= start_angle {
            end_angle += TAU;
        }
        let de = DirectoryEntry::new(100);
        let base = EntityBase::new(id, EntityKind::CircularArc, de);
        Ok(Self {
            base,
            z_t,
            center,
            radius: r_start,
            start_angle,
            end_angle,
        })
    }

    /// Build from the raw main-parameter vector.
    pub fn from_parameters(id: ObjectID, params: &ParameterVector) -> Result<Self> {
        Self::new(
            id,
            params.real(0)?,
            (params.real(1)?, params.real(2)?),
            (params.real(3)?, params.real(4)?),
            (params.real(5)?, params.real(6)?),
        )
    }

    /// The arc's radius.
    pub fn radius(&self) -> f64 {
        self.radius
    }
}

impl Entity for CircularArc {
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
        let (xc, yc) = self.center;
        let xs = xc + self.radius * self.start_angle.cos();
        let ys = yc + self.radius * self.start_angle.sin();
        let xt = xc + self.radius * self.end_angle.cos();
        let yt = yc + self.radius * self.end_angle.sin();
        ParameterVector::from_values([
            Parameter::Real(self.z_t),
            Parameter::Real(xc),
            Parameter::Real(yc),
            Parameter::Real(xs),
            Parameter::Real(ys),
            Parameter::Real(xt),
            Parameter::Real(yt),
        ])
    }

    fn validate_pd(&self) -> ValidationResult {
        let mut result = ValidationResult::ok();
        if self.radius <= 0.0 {
            result.push("circular arc radius must be positive".to_string());
        }
        if self.end_angle <= self.start_angle {
            result.push("circular arc end angle must exceed start angle".to_string());
        }
        result
    }
}

impl Curve for CircularArc {
    fn parameter_range(&self) -> ParameterRange {
        ParameterRange {
            start: self.start_angle,
            end: self.end_angle,
        }
    }

    fn is_closed(&self) -> bool {
        (self.end_angle - self.start_angle - TAU).abs() < crate::core::precision::EPSILON_NORMAL
    }

    fn derivatives(&self, t: f64, n: usize) -> Result<CurveDerivatives> {
        if !self.parameter_range().contains(t) {
            return Err(IgesError::OutOfRange(format!(
                "parameter {t} outside circular arc's domain"
            )));
        }
        let (xc, yc) = self.center;
        let mut values = Vec::with_capacity(n + 1);
        for k in 0..=n {
            let phase = t + (k as f64) * std::f64::consts::FRAC_PI_2;
            let vector = self.radius * Vector3::new(phase.cos(), phase.sin(), 0.0);
            values.push(if k == 0 {
                Vector3::new(xc, yc, self.z_t) + vector
            } else {
                vector
            });
        }
        Ok(CurveDerivatives::new(values))
    }

    fn length_between(&self, a: f64, b: f64) -> Result<f64> {
        Ok(self.radius * (b - a).abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{IdGenerator, ObjectKind};

    fn new_id() -> ObjectID {
        IdGenerator::generate_entity(ObjectKind::EntityNew, 100).unwrap().0
    }

    #[test]
    fn unit_quarter_arc_matches_concrete_scenario() {
        let arc = CircularArc::new(new_id(), 0.0, (0.0, 0.0), (1.0, 0.0), (0.0, 1.0)).unwrap();
        assert!((arc.radius() - 1.0).abs() < 1e-12);
        assert!(arc.parameter_range().start.abs() < 1e-12);
        assert!((arc.parameter_range().end - std::f64::consts::FRAC_PI_2).abs() < 1e-12);

        let p_quarter = arc.point_at(std::f64::consts::FRAC_PI_4).unwrap();
        let expected = std::f64::consts::FRAC_1_SQRT_2;
        assert!((p_quarter - Vector3::new(expected, expected, 0.0)).norm() < 1e-9);

        let p_end = arc.point_at(std::f64::consts::FRAC_PI_2).unwrap();
        assert!((p_end - Vector3::new(0.0, 1.0, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn mismatched_radii_are_rejected() {
        assert!(CircularArc::new(new_id(), 0.0, (0.0, 0.0), (1.0, 0.0), (0.0, 2.0)).is_err());
    }
}
