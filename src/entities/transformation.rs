//! Transformation matrix entity (type 124).
//!
//! Grounded on `original_source/include/igesio/entities/transformations/transformation_matrix.h`
//! and its `.cpp`: a 3x3 rotation plus a translation vector, with a
//! form-number-dependent validation profile and an optional chained
//! reference to another [`TransformationMatrix`] (DE field 7 on the
//! transformation's own directory entry). Cycle prevention walks the
//! chain by ObjectID, per `SetReference`'s loop over
//! `GetRefTransformation()`.

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::entities::directory_entry::DirectoryEntry;
use crate::entities::entity_base::{Entity, EntityBase, EntityKind};
use crate::entities::interfaces::Transformation;
use crate::entities::parameter_vector::{Parameter, ParameterVector};
use crate::error::{IgesError, Result, ValidationResult};
use crate::identity::ObjectID;

/// The form-number-selected kind of transformation, per `SPEC_FULL.md`
/// §4.7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatrixForm {
    /// Form 0: right-handed orthonormal (det = +1).
    RightHanded,
    /// Form 1: left-handed orthonormal (det = -1).
    LeftHanded,
    /// Form 10: Cartesian coordinate offset (R = I).
    CartesianOffset,
    /// Form 11: cylindrical coordinate system.
    Cylindrical,
    /// Form 12: spherical coordinate system.
    Spherical,
}

impl MatrixForm {
    fn from_form_number(n: i32) -> Result<Self> {
        match n {
            0 => Ok(MatrixForm::RightHanded),
            1 => Ok(MatrixForm::LeftHanded),
            10 => Ok(MatrixForm::CartesianOffset),
            11 => Ok(MatrixForm::Cylindrical),
            12 => Ok(MatrixForm::Spherical),
            other => Err(IgesError::DataFormatError(format!(
                "transformation matrix form number must be one of 0, 1, 10, 11, 12, got {other}"
            ))),
        }
    }

    fn form_number(self) -> i32 {
        match self {
            MatrixForm::RightHanded => 0,
            MatrixForm::LeftHanded => 1,
            MatrixForm::CartesianOffset => 10,
            MatrixForm::Cylindrical => 11,
            MatrixForm::Spherical => 12,
        }
    }
}

/// A 3x3-rotation-plus-translation rigid transform entity (type 124).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformationMatrix {
    base: EntityBase,
    rotation: Matrix3<f64>,
    translation: Vector3<f64>,
    form: MatrixForm,
}

impl TransformationMatrix {
    /// Construct directly from a rotation matrix and translation
    /// vector. `form` must match the structure of `rotation` (checked
    /// by [`TransformationMatrix::validate_pd`], not here — callers
    /// that need the hard constructor-time failure should call
    /// `validate()` themselves, mirroring the reference
    /// architecture's constructor which validates immediately after
    /// building).
    pub fn new(
        id: ObjectID,
        rotation: Matrix3<f64>,
        translation: Vector3<f64>,
        form: MatrixForm,
    ) -> Self {
        let mut de = DirectoryEntry::new(124);
        de.form_number = form.form_number();
        let base = EntityBase::new(id, EntityKind::TransformationMatrix, de);
        Self {
            base,
            rotation,
            translation,
            form,
        }
    }

    /// A pure translation (identity rotation).
    pub fn translation_only(id: ObjectID, t: Vector3<f64>) -> Self {
        Self::new(id, Matrix3::identity(), t, MatrixForm::RightHanded)
    }

    /// A pure rotation about the given axis by `angle` radians (no
    /// translation).
    pub fn rotation_only(id: ObjectID, axis: Vector3<f64>, angle: f64) -> Self {
        let r = Matrix3::from_axis_angle(&nalgebra::Unit::new_normalize(axis), angle);
        Self::new(id, r, Vector3::zeros(), MatrixForm::RightHanded)
    }

    /// Construct from the 12-real main parameter vector `[R00, R01,
    /// R02, T0, R10, R11, R12, T1, R20, R21, R22, T2]` (row-major,
    /// translation interleaved per IGES type 124 layout).
    pub fn from_parameters(
        id: ObjectID,
        params: &ParameterVector,
        form_number: i32,
    ) -> Result<Self> {
        let form = MatrixForm::from_form_number(form_number)?;
        if params.len() != 12 {
            return Err(IgesError::DataFormatError(
                "transformation matrix requires exactly 12 parameters".to_string(),
            ));
        }
        let rotation = Matrix3::new(
            params.real(0)?,
            params.real(1)?,
            params.real(2)?,
            params.real(4)?,
            params.real(5)?,
            params.real(6)?,
            params.real(8)?,
            params.real(9)?,
            params.real(10)?,
        );
        let translation = Vector3::new(params.real(3)?, params.real(7)?, params.real(11)?);
        Ok(Self::new(id, rotation, translation, form))
    }

    /// The local rotation matrix.
    pub fn rotation(&self) -> Matrix3<f64> {
        self.rotation
    }

    /// The local translation vector.
    pub fn translation(&self) -> Vector3<f64> {
        self.translation
    }

    /// The form-number-selected matrix kind.
    pub fn matrix_form(&self) -> MatrixForm {
        self.form
    }

    /// The ObjectID of the chained transformation this one references
    /// (DE field 7 on its own directory entry), if any.
    pub fn reference_id(&self) -> Option<ObjectID> {
        self.base.directory_entry().transformation_matrix.target()
    }

    /// Set (or clear, with `target = None`) the chained reference.
    /// `next_reference` maps an already-registered
    /// [`TransformationMatrix`]'s ID to *its own* chained reference
    /// ID (if any) — supplied by the model container — so the chain
    /// can be walked without this entity needing a live handle to the
    /// others. Returns `false` (without mutating `self`) if `target`
    /// is `self`'s own ID or any transformation in `target`'s chain
    /// is.
    pub fn set_reference(
        &mut self,
        target: Option<ObjectID>,
        next_reference: impl Fn(ObjectID) -> Option<ObjectID>,
    ) -> Result<bool> {
        let Some(target) = target else {
            self.base.directory_entry_mut().transformation_matrix.reset();
            return Ok(true);
        };
        let mut current = Some(target);
        let mut steps = 0usize;
        while let Some(id) = current {
            if id == self.base.id() {
                return Ok(false);
            }
            current = next_reference(id);
            steps += 1;
            if steps > 10_000 {
                return Err(IgesError::ImplementationError(
                    "transformation reference chain did not terminate",
                ));
            }
        }
        self.base
            .directory_entry_mut()
            .transformation_matrix
            .overwrite_pointer(target);
        Ok(true)
    }

    /// The effective rotation/translation after composing with the
    /// chained reference (innermost transform applied first, this
    /// one applied last): `R_eff = R * R_ref`, `t_eff = R * t_ref +
    /// t`. `resolve` supplies the referenced transform's own
    /// *already-composed* effective rotation/translation, so a
    /// multi-link chain composes correctly by calling this method
    /// outward from the root.
    pub fn effective_transform(
        &self,
        resolve: impl Fn(ObjectID) -> Option<(Matrix3<f64>, Vector3<f64>)>,
    ) -> (Matrix3<f64>, Vector3<f64>) {
        match self.reference_id().and_then(resolve) {
            Some((r_ref, t_ref)) => (self.rotation * r_ref, self.rotation * t_ref + self.translation),
            None => (self.rotation, self.translation),
        }
    }
}

impl Entity for TransformationMatrix {
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
        let r = self.rotation;
        let t = self.translation;
        ParameterVector::from_values([
            Parameter::Real(r[(0, 0)]),
            Parameter::Real(r[(0, 1)]),
            Parameter::Real(r[(0, 2)]),
            Parameter::Real(t.x),
            Parameter::Real(r[(1, 0)]),
            Parameter::Real(r[(1, 1)]),
            Parameter::Real(r[(1, 2)]),
            Parameter::Real(t.y),
            Parameter::Real(r[(2, 0)]),
            Parameter::Real(r[(2, 1)]),
            Parameter::Real(r[(2, 2)]),
            Parameter::Real(t.z),
        ])
    }

    fn validate_pd(&self) -> ValidationResult {
        use crate::core::precision::GEOMETRIC_TOLERANCE;
        let mut result = ValidationResult::ok();
        let rot = self.rotation;
        let cols = [rot.column(0), rot.column(1), rot.column(2)];
        for (i, c) in cols.iter().enumerate() {
            if (c.norm() - 1.0).abs() > GEOMETRIC_TOLERANCE {
                result.push(format!("column {i} of rotation matrix is not a unit vector"));
            }
        }
        if cols[0].dot(&cols[1]).abs() > GEOMETRIC_TOLERANCE {
            result.push("columns 0 and 1 of rotation matrix are not orthogonal".to_string());
        }
        if cols[0].dot(&cols[2]).abs() > GEOMETRIC_TOLERANCE {
            result.push("columns 0 and 2 of rotation matrix are not orthogonal".to_string());
        }
        if cols[1].dot(&cols[2]).abs() > GEOMETRIC_TOLERANCE {
            result.push("columns 1 and 2 of rotation matrix are not orthogonal".to_string());
        }

        let det = rot.determinant();
        match self.form {
            MatrixForm::RightHanded => {
                if (det - 1.0).abs() > GEOMETRIC_TOLERANCE {
                    result.push("form 0 requires determinant +1 (right-handed)".to_string());
                }
            }
            MatrixForm::LeftHanded => {
                if (det + 1.0).abs() > GEOMETRIC_TOLERANCE {
                    result.push("form 1 requires determinant -1 (left-handed)".to_string());
                }
            }
            MatrixForm::CartesianOffset => {
                if (rot - Matrix3::identity()).norm() > GEOMETRIC_TOLERANCE {
                    result.push("form 10 requires an identity rotation matrix".to_string());
                }
            }
            MatrixForm::Cylindrical => {
                if (rot.column(2) - Vector3::z()).norm() > GEOMETRIC_TOLERANCE {
                    result.push("form 11 requires the third column to be [0, 0, 1]".to_string());
                }
                if rot[(2, 0)].abs() > GEOMETRIC_TOLERANCE || rot[(2, 1)].abs() > GEOMETRIC_TOLERANCE {
                    result.push("form 11 requires the first two columns to lie in the xy-plane".to_string());
                }
            }
            MatrixForm::Spherical => {
                if rot[(2, 2)].abs() < GEOMETRIC_TOLERANCE {
                    result.push("form 12 requires a nonzero third component in the third column".to_string());
                }
            }
        }
        result
    }
}

impl Transformation for TransformationMatrix {
    fn apply_point(&self, p: Vector3<f64>) -> Vector3<f64> {
        self.rotation * p + self.translation
    }

    fn apply_direction(&self, v: Vector3<f64>) -> Vector3<f64> {
        self.rotation * v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{IdGenerator, ObjectKind};
    use std::f64::consts::FRAC_PI_2;

    fn new_id() -> ObjectID {
        IdGenerator::generate_entity(ObjectKind::EntityNew, 124).unwrap().0
    }

    #[test]
    fn translation_only_round_trips_point() {
        let t = TransformationMatrix::translation_only(new_id(), Vector3::new(1.0, 2.0, 3.0));
        let p = t.apply_point(Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(p, Vector3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn chained_transform_composes_reference_first() {
        let t2_id = new_id();
        let t2 = TransformationMatrix::rotation_only(t2_id, Vector3::z(), FRAC_PI_2);
        let mut t1 = TransformationMatrix::translation_only(new_id(), Vector3::new(1.0, 0.0, 0.0));
        t1.set_reference(Some(t2_id), |_| None).unwrap();

        let (r_eff, t_eff) = t1.effective_transform(|id| {
            if id == t2_id {
                Some((t2.rotation(), t2.translation()))
            } else {
                None
            }
        });
        let result = r_eff * Vector3::new(0.0, 1.0, 0.0) + t_eff;
        assert!((result - Vector3::new(0.0, 0.0, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn set_reference_to_self_is_rejected() {
        let id = new_id();
        let mut t = TransformationMatrix::translation_only(id, Vector3::zeros());
        assert!(!t.set_reference(Some(id), |_| None).unwrap());
        assert!(t.reference_id().is_none());
    }

    #[test]
    fn set_reference_rejects_indirect_cycle() {
        let id_a = new_id();
        let id_b = new_id();
        let mut a = TransformationMatrix::translation_only(id_a, Vector3::zeros());
        // b already (notionally) references a; walking from b hits a == self.
        assert!(!a
            .set_reference(Some(id_b), |id| if id == id_b { Some(id_a) } else { None })
            .unwrap());
    }

    #[test]
    fn right_handed_validation_rejects_left_handed_matrix() {
        let id = new_id();
        let mut left_handed = Matrix3::identity();
        left_handed[(2, 2)] = -1.0;
        let t = TransformationMatrix::new(id, left_handed, Vector3::zeros(), MatrixForm::RightHanded);
        assert!(!t.validate_pd().is_valid());
    }
}
