//! Line entity (type 110): segment, ray, or bi-infinite line.
//!
//! Grounded on `SPEC_FULL.md` §4.5 "Line": two anchor points; form 0
//! is a finite segment, form 1 a ray, form 2 bi-infinite. `C'(t) = P2
//! - P1` is constant; higher derivatives vanish.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::entities::directory_entry::DirectoryEntry;
use crate::entities::entity_base::{Entity, EntityBase, EntityKind};
use crate::entities::interfaces::{Curve, CurveDerivatives, ParameterRange};
use crate::entities::parameter_vector::{Parameter, ParameterVector};
use crate::error::{IgesError, Result, ValidationResult};
use crate::identity::ObjectID;

/// Which sub-range of the defining line is actually part of the
/// entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineForm {
    /// Form 0: finite segment `[P1, P2]`, parameter range `[0, 1]`.
    Segment,
    /// Form 1: ray from `P1` through `P2`, parameter range `[0, +inf)`.
    Ray,
    /// Form 2: bi-infinite line through `P1` and `P2`, parameter range
    /// `(-inf, +inf)`.
    BiInfinite,
}

impl LineForm {
    fn from_form_number(n: i32) -> Result<Self> {
        match n {
            0 => Ok(LineForm::Segment),
            1 => Ok(LineForm::Ray),
            2 => Ok(LineForm::BiInfinite),
            other => Err(IgesError::DataFormatError(format!(
                "line form number must be 0, 1, or 2, got {other}"
            ))),
        }
    }

    fn form_number(self) -> i32 {
        match self {
            LineForm::Segment => 0,
            LineForm::Ray => 1,
            LineForm::BiInfinite => 2,
        }
    }
}

/// A line segment, ray, or bi-infinite line between two anchor points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Line {
    base: EntityBase,
    p1: Vector3<f64>,
    p2: Vector3<f64>,
    form: LineForm,
}

impl Line {
    /// Construct a new line entity. `p1 != p2` is required.
    pub fn new(id: ObjectID, p1: Vector3<f64>, p2: Vector3<f64>, form: LineForm) -> Result<Self> {
        if (p1 - p2).norm() < crate::core::precision::GEOMETRIC_TOLERANCE {
            return Err(IgesError::InvalidArgument(
                "line anchor points must differ".to_string(),
            ));
        }
        let mut de = DirectoryEntry::new(110);
        de.form_number = form.form_number();
        let base = EntityBase::new(id, EntityKind::Line, de);
        Ok(Self { base, p1, p2, form })
    }

    /// Construct from a raw main-parameter vector
    /// `[x1, y1, z1, x2, y2, z2]` plus the form number from the
    /// directory entry.
    pub fn from_parameters(id: ObjectID, params: &ParameterVector, form_number: i32) -> Result<Self> {
        let form = LineForm::from_form_number(form_number)?;
        let p1 = Vector3::new(params.real(0)?, params.real(1)?, params.real(2)?);
        let p2 = Vector3::new(params.real(3)?, params.real(4)?, params.real(5)?);
        Self::new(id, p1, p2, form)
    }

    /// The two defining anchor points, `(P1, P2)`.
    pub fn anchor_points(&self) -> (Vector3<f64>, Vector3<f64>) {
        (self.p1, self.p2)
    }
}

impl Entity for Line {
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
        ParameterVector::from_values([
            Parameter::Real(self.p1.x),
            Parameter::Real(self.p1.y),
            Parameter::Real(self.p1.z),
            Parameter::Real(self.p2.x),
            Parameter::Real(self.p2.y),
            Parameter::Real(self.p2.z),
        ])
    }

    fn validate_pd(&self) -> ValidationResult {
        let mut result = ValidationResult::ok();
        if (self.p1 - self.p2).norm() < crate::core::precision::GEOMETRIC_TOLERANCE {
            result.push("line anchor points must differ".to_string());
        }
        result
    }
}

impl Curve for Line {
    fn parameter_range(&self) -> ParameterRange {
        match self.form {
            LineForm::Segment => ParameterRange { start: 0.0, end: 1.0 },
            LineForm::Ray => ParameterRange {
                start: 0.0,
                end: f64::INFINITY,
            },
            LineForm::BiInfinite => ParameterRange {
                start: f64::NEG_INFINITY,
                end: f64::INFINITY,
            },
        }
    }

    fn is_closed(&self) -> bool {
        false
    }

    fn derivatives(&self, t: f64, n: usize) -> Result<CurveDerivatives> {
        if !self.parameter_range().contains(t) {
            return Err(IgesError::OutOfRange(format!(
                "parameter {t} outside line's domain"
            )));
        }
        let direction = self.p2 - self.p1;
        let mut values = vec![self.p1 + direction * t];
        if n >= 1 {
            values.push(direction);
        }
        for _ in 2..=n {
            values.push(Vector3::zeros());
        }
        Ok(CurveDerivatives::new(values))
    }

    fn length_between(&self, a: f64, b: f64) -> Result<f64> {
        Ok((self.p2 - self.p1).norm() * (b - a).abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{IdGenerator, ObjectKind};

    fn new_id() -> ObjectID {
        IdGenerator::generate_entity(ObjectKind::EntityNew, 110).unwrap().0
    }

    #[test]
    fn bi_infinite_line_evaluates_beyond_unit_range() {
        let line = Line::new(
            new_id(),
            Vector3::new(0.0, -1.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
            LineForm::BiInfinite,
        )
        .unwrap();
        let p = line.point_at(2.0).unwrap();
        assert!((p - Vector3::new(2.0, 3.0, 0.0)).norm() < 1e-9);
        let tangent = line.tangent_at(0.5).unwrap();
        assert!((tangent - Vector3::new(1.0, 2.0, 0.0).normalize()).norm() < 1e-9);
    }

    #[test]
    fn segment_rejects_out_of_range_parameter() {
        let line = Line::new(
            new_id(),
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            LineForm::Segment,
        )
        .unwrap();
        assert!(line.point_at(2.0).is_err());
    }

    #[test]
    fn coincident_anchors_are_rejected() {
        let p = Vector3::new(1.0, 1.0, 1.0);
        assert!(Line::new(new_id(), p, p, LineForm::Segment).is_err());
    }
}
