//! Copious data entity (type 106): points, polylines, or planar loops.
//!
//! Grounded on `SPEC_FULL.md` §4.5 "Copious data": a 3xN coordinate
//! matrix (form 13 additionally carries a 3xN associated-vector
//! matrix). Points forms (1-3) have undefined tangent/normal and are
//! not discretizable; polyline forms (11-13, 63) expose piecewise-
//! linear derivatives.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::entities::directory_entry::DirectoryEntry;
use crate::entities::entity_base::{Entity, EntityBase, EntityKind};
use crate::entities::interfaces::{Curve, CurveDerivatives, ParameterRange};
use crate::entities::parameter_vector::{Parameter, ParameterVector};
use crate::error::{IgesError, Result, ValidationResult};
use crate::identity::ObjectID;

/// The copious-data form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CopiousDataForm {
    /// Forms 1-3: a disconnected point cloud (2D, 3D, or with vectors).
    Points,
    /// Forms 11-13: a connected polyline.
    Polyline,
    /// Form 63: a closed planar loop.
    PlanarLoop,
}

/// A collection of 3D points, optionally with per-point associated
/// vectors (form 13), interpreted per `CopiousDataForm`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopiousData {
    base: EntityBase,
    form: CopiousDataForm,
    form_number: i32,
    points: Vec<Vector3<f64>>,
    vectors: Option<Vec<Vector3<f64>>>,
}

impl CopiousData {
    /// Construct and validate: at least one point, and `vectors` (if
    /// present) matching `points` in length.
    pub fn new(
        id: ObjectID,
        form_number: i32,
        points: Vec<Vector3<f64>>,
        vectors: Option<Vec<Vector3<f64>>>,
    ) -> Result<Self> {
        if points.is_empty() {
            return Err(IgesError::DataFormatError(
                "copious data must contain at least one point".to_string(),
            ));
        }
        let form = match form_number {
            1..=3 => CopiousDataForm::Points,
            11..=13 => CopiousDataForm::Polyline,
            63 => CopiousDataForm::PlanarLoop,
            other => {
                return Err(IgesError::DataFormatError(format!(
                    "unsupported copious data form number {other}"
                )))
            }
        };
        if form_number == 13 {
            let v = vectors.as_ref().ok_or_else(|| {
                IgesError::DataFormatError("form 13 requires an associated-vector matrix".to_string())
            })?;
            if v.len() != points.len() {
                return Err(IgesError::DataFormatError(
                    "associated-vector matrix must match the point count".to_string(),
                ));
            }
        }
        let mut de = DirectoryEntry::new(106);
        de.form_number = form_number;
        let base = EntityBase::new(id, EntityKind::CopiousData, de);
        Ok(Self {
            base,
            form,
            form_number,
            points,
            vectors,
        })
    }

    /// Construct from the main parameter vector: `IP` (1 = 2D points,
    /// 2 = 3D points, 3 = 3D points with an associated vector per
    /// point), a point count, then that many coordinate (and, for
    /// `IP=3`, vector) tuples.
    pub fn from_parameters(id: ObjectID, params: &ParameterVector, form_number: i32) -> Result<Self> {
        let ip = params.integer(0)?;
        let n = params.integer(1)?;
        if n < 1 {
            return Err(IgesError::DataFormatError(
                "copious data must contain at least one point".to_string(),
            ));
        }
        let tuple_len = match ip {
            1 => 2,
            2 => 3,
            3 => 6,
            other => {
                return Err(IgesError::DataFormatError(format!(
                    "unknown copious data IP value {other}"
                )))
            }
        };
        let mut points = Vec::with_capacity(n as usize);
        let mut vectors = if ip == 3 { Some(Vec::with_capacity(n as usize)) } else { None };
        let mut cursor = 2;
        for _ in 0..n {
            let x = params.real(cursor)?;
            let y = params.real(cursor + 1)?;
            let z = if ip >= 2 { params.real(cursor + 2)? } else { 0.0 };
            points.push(Vector3::new(x, y, z));
            if ip == 3 {
                let vx = params.real(cursor + 3)?;
                let vy = params.real(cursor + 4)?;
                let vz = params.real(cursor + 5)?;
                vectors.as_mut().unwrap().push(Vector3::new(vx, vy, vz));
            }
            cursor += tuple_len;
        }
        Self::new(id, form_number, points, vectors)
    }

    /// Whether this record is in a discretizable (polyline/loop) form.
    pub fn is_discretizable(&self) -> bool {
        !matches!(self.form, CopiousDataForm::Points)
    }

    /// The raw point list, in entity order.
    pub fn points(&self) -> &[Vector3<f64>] {
        &self.points
    }
}

impl Entity for CopiousData {
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
        let mut v = vec![Parameter::Integer(3), Parameter::Integer(self.points.len() as i64)];
        for (i, p) in self.points.iter().enumerate() {
            v.push(Parameter::Real(p.x));
            v.push(Parameter::Real(p.y));
            v.push(Parameter::Real(p.z));
            if let Some(vectors) = &self.vectors {
                let vec = vectors[i];
                v.push(Parameter::Real(vec.x));
                v.push(Parameter::Real(vec.y));
                v.push(Parameter::Real(vec.z));
            }
        }
        ParameterVector::from_values(v)
    }

    fn validate_pd(&self) -> ValidationResult {
        let mut result = ValidationResult::ok();
        if self.points.is_empty() {
            result.push("copious data must contain at least one point".to_string());
        }
        if self.form_number == 63 {
            let first = self.points.first();
            let last = self.points.last();
            if let (Some(first), Some(last)) = (first, last) {
                if (first - last).norm() > crate::core::precision::GEOMETRIC_TOLERANCE {
                    result.push("planar loop (form 63) must close on itself".to_string());
                }
            }
        }
        result
    }
}

impl Curve for CopiousData {
    fn parameter_range(&self) -> ParameterRange {
        ParameterRange {
            start: 0.0,
            end: (self.points.len() - 1).max(1) as f64,
        }
    }

    fn is_closed(&self) -> bool {
        self.form_number == 63
    }

    fn derivatives(&self, t: f64, n: usize) -> Result<CurveDerivatives> {
        if !self.is_discretizable() {
            return Err(IgesError::NotImplementedError(
                "points-form copious data has no tangent/normal".to_string(),
            ));
        }
        if !self.parameter_range().contains(t) {
            return Err(IgesError::OutOfRange(format!(
                "parameter {t} outside copious data's domain"
            )));
        }
        let segment = (t.floor() as usize).min(self.points.len() - 2);
        let local = t - segment as f64;
        let p0 = self.points[segment];
        let p1 = self.points[segment + 1];
        let mut values = vec![p0 + (p1 - p0) * local];
        if n >= 1 {
            values.push(p1 - p0);
        }
        for _ in 2..=n {
            values.push(Vector3::zeros());
        }
        Ok(CurveDerivatives::new(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{IdGenerator, ObjectKind};

    fn new_id() -> ObjectID {
        IdGenerator::generate_entity(ObjectKind::EntityNew, 106).unwrap().0
    }

    #[test]
    fn polyline_evaluates_piecewise_linearly() {
        let points = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
        ];
        let data = CopiousData::new(new_id(), 11, points, None).unwrap();
        let p = data.point_at(1.5).unwrap();
        assert!((p - Vector3::new(1.0, 0.5, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn points_form_rejects_derivatives() {
        let points = vec![Vector3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0)];
        let data = CopiousData::new(new_id(), 1, points, None).unwrap();
        assert!(data.tangent_at(0.0).is_err());
    }
}
