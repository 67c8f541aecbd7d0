//! Tabulated cylinder entity (type 122): a directrix curve extruded
//! along a straight-line generator.
//!
//! Grounded on `original_source/include/igesio/entities/surfaces/
//! tabulated_cylinder.h`/`.cpp`: `S(u,v) = C(t(u)) + v * direction`,
//! where `direction = location_vector - C(C's own parameter-range
//! start)`, and `t(u)` is one of four affine branches depending on
//! whether the directrix's own domain is finite or semi/bi-infinite.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::entities::directory_entry::DirectoryEntry;
use crate::entities::entity_base::{Entity, EntityBase, EntityKind};
use crate::entities::interfaces::{Curve, Surface, SurfaceDerivatives, SurfaceParameterRange};
use crate::entities::parameter_vector::{Parameter, ParameterVector};
use crate::error::{IgesError, Result, ValidationResult};
use crate::identity::ObjectID;

/// A ruled surface extruded from a directrix curve along a fixed
/// direction to a terminating point.
#[derive(Clone, Serialize, Deserialize)]
pub struct TabulatedCylinder {
    base: EntityBase,
    directrix_id: ObjectID,
    location_vector: Vector3<f64>,
    #[serde(skip)]
    directrix: Option<Arc<dyn Curve + Send + Sync>>,
}

impl std::fmt::Debug for TabulatedCylinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TabulatedCylinder")
            .field("base", &self.base)
            .field("directrix_id", &self.directrix_id)
            .field("location_vector", &self.location_vector)
            .field("resolved", &self.directrix.is_some())
            .finish()
    }
}

impl TabulatedCylinder {
    /// Construct with the directrix reference unresolved.
    pub fn from_reference(id: ObjectID, directrix_id: ObjectID, location_vector: Vector3<f64>) -> Self {
        let de = DirectoryEntry::new(122);
        let base = EntityBase::new(id, EntityKind::TabulatedCylinder, de);
        Self {
            base,
            directrix_id,
            location_vector,
            directrix: None,
        }
    }

    /// Construct from the main parameter vector: the directrix
    /// pointer followed by the terminating location vector.
    pub fn from_parameters(id: ObjectID, params: &ParameterVector, _form_number: i32) -> Result<Self> {
        let directrix_id = params.pointer(0)?;
        let location_vector = Vector3::new(params.real(1)?, params.real(2)?, params.real(3)?);
        Ok(Self::from_reference(id, directrix_id, location_vector))
    }

    /// Construct from an already-resolved directrix.
    pub fn new(
        id: ObjectID,
        directrix: Arc<dyn Curve + Send + Sync>,
        location_vector: Vector3<f64>,
    ) -> Result<Self> {
        let mut surface = Self::from_reference(id, ObjectID::unset(), location_vector);
        surface.directrix = Some(directrix);
        Ok(surface)
    }

    /// Supply the resolved directrix curve.
    pub fn resolve_directrix(&mut self, directrix: Arc<dyn Curve + Send + Sync>) {
        self.directrix = Some(directrix);
    }

    /// Whether the referenced directrix has been resolved.
    pub fn is_fully_resolved(&self) -> bool {
        self.directrix.is_some()
    }

    /// The directrix curve's reference ID.
    pub fn directrix_id(&self) -> ObjectID {
        self.directrix_id
    }

    fn directrix(&self) -> Result<&Arc<dyn Curve + Send + Sync>> {
        self.directrix
            .as_ref()
            .ok_or_else(|| IgesError::OutOfRange("directrix is not resolved".to_string()))
    }

    fn direction(&self) -> Result<Vector3<f64>> {
        let directrix = self.directrix()?;
        let start = directrix.parameter_range().start;
        let origin = directrix.point_at(start)?;
        Ok(self.location_vector - origin)
    }

    /// `(t(u), dt/du)`: four affine branches over the directrix's own
    /// domain shape, always constant slope in `u`.
    fn parameter_map(&self, u: f64) -> Result<(f64, f64)> {
        let directrix = self.directrix()?;
        let range = directrix.parameter_range();
        let (start, end) = (range.start, range.end);
        let (t, ta) = match (start.is_finite(), end.is_finite()) {
            (true, true) => (start + u * (end - start), end - start),
            (true, false) => (start + u, 1.0),
            (false, true) => (end - (1.0 - u), 1.0),
            (false, false) => (u, 1.0),
        };
        Ok((t, ta))
    }
}

impl Entity for TabulatedCylinder {
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
            Parameter::Pointer(self.directrix_id),
            Parameter::Real(self.location_vector.x),
            Parameter::Real(self.location_vector.y),
            Parameter::Real(self.location_vector.z),
        ])
    }

    fn unresolved_pd_references(&self) -> Vec<ObjectID> {
        if self.directrix.is_none() {
            vec![self.directrix_id]
        } else {
            Vec::new()
        }
    }

    fn validate_pd(&self) -> ValidationResult {
        let mut result = ValidationResult::ok();
        if self.directrix.is_none() {
            result.push("directrix reference is not set".to_string());
            return result;
        }
        if let Ok(direction) = self.direction() {
            if direction.norm() < crate::core::precision::GEOMETRIC_TOLERANCE {
                result.push(
                    "location vector must differ from the directrix's start point".to_string(),
                );
            }
        }
        result
    }
}

impl Surface for TabulatedCylinder {
    fn parameter_range(&self) -> SurfaceParameterRange {
        SurfaceParameterRange {
            u_start: 0.0,
            u_end: 1.0,
            v_start: 0.0,
            v_end: 1.0,
        }
    }

    fn is_u_closed(&self) -> bool {
        self.directrix.as_ref().map(|c| c.is_closed()).unwrap_or(false)
    }

    fn is_v_closed(&self) -> bool {
        false
    }

    fn derivatives(&self, u: f64, v: f64, order: usize) -> Result<SurfaceDerivatives> {
        let directrix = self.directrix()?;
        let (t, ta) = self.parameter_map(u)?;
        let direction = self.direction()?;
        let d = directrix.derivatives(t, order)?;
        let mut values = Vec::new();
        for nu in 0..=order {
            let cn = d.get(nu).copied().unwrap_or_default() * ta.powi(nu as i32);
            for nv in 0..=(order - nu) {
                let value = if nv == 0 {
                    cn + v * if nu == 0 { direction } else { Vector3::zeros() }
                } else if nv == 1 && nu == 0 {
                    direction
                } else {
                    Vector3::zeros()
                };
                values.push(value);
            }
        }
        Ok(SurfaceDerivatives::new(order, values))
    }
}

#[allow(dead_code)]
fn _assert_send_sync() {
    fn check<T: Send + Sync>() {}
    check::<TabulatedCylinder>();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::curves::line::{Line, LineForm};
    use crate::identity::{IdGenerator, ObjectKind};

    fn new_id() -> ObjectID {
        IdGenerator::generate_entity(ObjectKind::EntityNew, 122).unwrap().0
    }

    fn unit_square() -> TabulatedCylinder {
        let directrix = Line::new(
            new_id(),
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            LineForm::Segment,
        )
        .unwrap();
        TabulatedCylinder::new(new_id(), Arc::new(directrix), Vector3::new(0.0, 0.0, 1.0)).unwrap()
    }

    #[test]
    fn v0_matches_directrix_and_v1_is_extruded() {
        let surface = unit_square();
        let p0 = surface.point_at(0.5, 0.0).unwrap();
        let p1 = surface.point_at(0.5, 1.0).unwrap();
        assert!((p0 - Vector3::new(0.5, 0.0, 0.0)).norm() < 1e-9);
        assert!((p1 - Vector3::new(0.5, 0.0, 1.0)).norm() < 1e-9);
    }

    #[test]
    fn degenerate_direction_is_rejected_by_validation() {
        let directrix = Line::new(
            new_id(),
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            LineForm::Segment,
        )
        .unwrap();
        let surface =
            TabulatedCylinder::new(new_id(), Arc::new(directrix), Vector3::new(0.0, 0.0, 0.0))
                .unwrap();
        assert!(!surface.validate_pd().is_valid());
    }
}
