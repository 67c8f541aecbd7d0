//! Ruled surface entity (type 118): a linear blend between two curves.
//!
//! Grounded on `original_source/include/igesio/entities/surfaces/
//! ruled_surface.h`/`.cpp`: `S(u,v) = (1-v)*C1(t(u)) + v*C2(s(u))`,
//! where `t(u)` maps `u` linearly over `C1`'s own parameter range and
//! `s(u)` maps `u` linearly over `C2`'s range, reversed when `DIRFLG`
//! (`reversed`) is set. Like [`super::super::curves::composite_curve`],
//! the two referenced curves are non-owning [`ObjectID`]s resolved late
//! by the model container and cached as shared `Arc` handles.

use std::sync::Arc;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::entities::directory_entry::DirectoryEntry;
use crate::entities::entity_base::{Entity, EntityBase, EntityKind};
use crate::entities::interfaces::{Curve, Surface, SurfaceDerivatives, SurfaceParameterRange};
use crate::entities::parameter_vector::{Parameter, ParameterVector};
use crate::error::{IgesError, Result, ValidationResult};
use crate::identity::ObjectID;

/// A surface ruled between two curves, `curve1` at `v=0` and `curve2`
/// at `v=1`.
#[derive(Clone, Serialize, Deserialize)]
pub struct RuledSurface {
    base: EntityBase,
    curve1_id: ObjectID,
    curve2_id: ObjectID,
    reversed: bool,
    developable: bool,
    #[serde(skip)]
    curve1: Option<Arc<dyn Curve + Send + Sync>>,
    #[serde(skip)]
    curve2: Option<Arc<dyn Curve + Send + Sync>>,
}

impl std::fmt::Debug for RuledSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuledSurface")
            .field("base", &self.base)
            .field("curve1_id", &self.curve1_id)
            .field("curve2_id", &self.curve2_id)
            .field("reversed", &self.reversed)
            .field("developable", &self.developable)
            .field("resolved", &self.is_fully_resolved())
            .finish()
    }
}

impl RuledSurface {
    /// Construct with both curves' references, unresolved.
    pub fn from_references(
        id: ObjectID,
        curve1_id: ObjectID,
        curve2_id: ObjectID,
        reversed: bool,
        developable: bool,
    ) -> Self {
        let mut de = DirectoryEntry::new(118);
        de.form_number = developable as i32;
        let base = EntityBase::new(id, EntityKind::RuledSurface, de);
        Self {
            base,
            curve1_id,
            curve2_id,
            reversed,
            developable,
            curve1: None,
            curve2: None,
        }
    }

    /// Construct from the main parameter vector: the two curve
    /// pointers, the direction flag, and the developable flag.
    pub fn from_parameters(id: ObjectID, params: &ParameterVector, _form_number: i32) -> Result<Self> {
        let curve1_id = params.pointer(0)?;
        let curve2_id = params.pointer(1)?;
        let reversed = params.integer(2)? != 0;
        let developable = params.integer(3)? != 0;
        Ok(Self::from_references(id, curve1_id, curve2_id, reversed, developable))
    }

    /// Construct directly from already-resolved curves. Validates that
    /// the two are distinct before returning.
    pub fn new(
        id: ObjectID,
        curve1: Arc<dyn Curve + Send + Sync>,
        curve2: Arc<dyn Curve + Send + Sync>,
        reversed: bool,
        developable: bool,
    ) -> Result<Self> {
        let mut surface =
            Self::from_references(id, ObjectID::unset(), ObjectID::unset(), reversed, developable);
        surface.curve1 = Some(curve1);
        surface.curve2 = Some(curve2);
        Ok(surface)
    }

    /// Supply the resolved first curve.
    pub fn resolve_curve1(&mut self, curve: Arc<dyn Curve + Send + Sync>) {
        self.curve1 = Some(curve);
    }

    /// Supply the resolved second curve.
    pub fn resolve_curve2(&mut self, curve: Arc<dyn Curve + Send + Sync>) {
        self.curve2 = Some(curve);
    }

    /// Whether both referenced curves have been resolved.
    pub fn is_fully_resolved(&self) -> bool {
        self.curve1.is_some() && self.curve2.is_some()
    }

    /// The first ruling curve's reference ID.
    pub fn curve1_id(&self) -> ObjectID {
        self.curve1_id
    }

    /// The second ruling curve's reference ID.
    pub fn curve2_id(&self) -> ObjectID {
        self.curve2_id
    }

    fn curves(&self) -> Result<(&Arc<dyn Curve + Send + Sync>, &Arc<dyn Curve + Send + Sync>)> {
        let c1 = self
            .curve1
            .as_ref()
            .ok_or_else(|| IgesError::OutOfRange("curve1 is not resolved".to_string()))?;
        let c2 = self
            .curve2
            .as_ref()
            .ok_or_else(|| IgesError::OutOfRange("curve2 is not resolved".to_string()))?;
        Ok((c1, c2))
    }

    /// `(t(u), ds_u/du)` for `curve1`, and `(s(u), ds_u/du)` for
    /// `curve2`: both maps are affine in `u`, so the slope is a
    /// parameter-independent constant.
    fn parameter_maps(&self, u: f64) -> Result<((f64, f64), (f64, f64))> {
        let (c1, c2) = self.curves()?;
        let r1 = c1.parameter_range();
        let r2 = c2.parameter_range();
        let ta = r1.end - r1.start;
        let t = r1.start + u * ta;
        let (s, sb) = if self.reversed {
            let sb = -(r2.end - r2.start);
            (r2.end + u * sb, sb)
        } else {
            let sb = r2.end - r2.start;
            (r2.start + u * sb, sb)
        };
        Ok(((t, ta), (s, sb)))
    }
}

impl Entity for RuledSurface {
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
            Parameter::Pointer(self.curve1_id),
            Parameter::Pointer(self.curve2_id),
            Parameter::Integer(self.reversed as i64),
            Parameter::Integer(self.developable as i64),
        ])
    }

    fn unresolved_pd_references(&self) -> Vec<ObjectID> {
        let mut refs = Vec::new();
        if self.curve1.is_none() {
            refs.push(self.curve1_id);
        }
        if self.curve2.is_none() {
            refs.push(self.curve2_id);
        }
        refs
    }

    fn validate_pd(&self) -> ValidationResult {
        let mut result = ValidationResult::ok();
        if self.curve1.is_none() {
            result.push("curve1 reference is not set".to_string());
        }
        if self.curve2.is_none() {
            result.push("curve2 reference is not set".to_string());
        }
        if self.curve1_id.is_set() && self.curve1_id == self.curve2_id {
            result.push("curve1 and curve2 must be distinct entities".to_string());
        }
        result
    }
}

impl Surface for RuledSurface {
    fn parameter_range(&self) -> SurfaceParameterRange {
        SurfaceParameterRange {
            u_start: 0.0,
            u_end: 1.0,
            v_start: 0.0,
            v_end: 1.0,
        }
    }

    fn is_u_closed(&self) -> bool {
        false
    }

    fn is_v_closed(&self) -> bool {
        false
    }

    fn derivatives(&self, u: f64, v: f64, order: usize) -> Result<SurfaceDerivatives> {
        let (c1, c2) = self.curves()?;
        let ((t, ta), (s, sb)) = self.parameter_maps(u)?;
        let d1 = c1.derivatives(t, order)?;
        let d2 = c2.derivatives(s, order)?;
        let mut values = Vec::new();
        for nu in 0..=order {
            let c1n = d1.get(nu).copied().unwrap_or_default();
            let c2n = d2.get(nu).copied().unwrap_or_default();
            let c1n = c1n * ta.powi(nu as i32);
            let c2n = c2n * sb.powi(nu as i32);
            for nv in 0..=(order - nu) {
                let value = if nv == 0 {
                    (1.0 - v) * c1n + v * c2n
                } else if nv == 1 {
                    c2n - c1n
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
    check::<RuledSurface>();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::curves::line::{Line, LineForm};
    use crate::identity::{IdGenerator, ObjectKind};

    fn new_id() -> ObjectID {
        IdGenerator::generate_entity(ObjectKind::EntityNew, 118).unwrap().0
    }

    fn unit_plane() -> RuledSurface {
        let c1 = Line::new(
            new_id(),
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            LineForm::Segment,
        )
        .unwrap();
        let c2 = Line::new(
            new_id(),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
            LineForm::Segment,
        )
        .unwrap();
        RuledSurface::new(new_id(), Arc::new(c1), Arc::new(c2), false, false).unwrap()
    }

    #[test]
    fn midpoint_blends_both_curves() {
        let surface = unit_plane();
        let p = surface.point_at(0.5, 0.5).unwrap();
        assert!((p - Vector3::new(0.5, 0.5, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn v0_and_v1_match_the_defining_curves() {
        let surface = unit_plane();
        let p0 = surface.point_at(0.25, 0.0).unwrap();
        let p1 = surface.point_at(0.25, 1.0).unwrap();
        assert!((p0 - Vector3::new(0.25, 0.0, 0.0)).norm() < 1e-9);
        assert!((p1 - Vector3::new(0.25, 1.0, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn distinctness_validation_fails_on_shared_reference() {
        let id = new_id();
        let surface = RuledSurface::from_references(new_id(), id, id, false, false);
        assert!(!surface.validate_pd().is_valid());
    }

    #[test]
    fn unresolved_surface_reports_both_references() {
        let surface =
            RuledSurface::from_references(new_id(), new_id(), new_id(), false, false);
        assert_eq!(surface.unresolved_pd_references().len(), 2);
    }
}
