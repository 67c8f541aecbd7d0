//! Surface of revolution entity (type 120): a generatrix curve swept
//! about an axis line.
//!
//! Grounded on `original_source/include/igesio/entities/surfaces/
//! surface_of_revolution.h`/`.cpp`: axis defined by a [`Line`]'s own
//! anchor points `P0` (point on the axis) and `D = P2 - P1`
//! (normalized axis direction); `S(u,v) = P0 + R(v*D) * (C(u) - P0)`,
//! a Rodrigues rotation of the generatrix about the axis by angle
//! `start_angle + v * (end_angle - start_angle)`.

use std::f64::consts::TAU;
use std::sync::Arc;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::entities::curves::line::Line;
use crate::entities::directory_entry::DirectoryEntry;
use crate::entities::entity_base::{Entity, EntityBase, EntityKind};
use crate::entities::interfaces::{Curve, Surface, SurfaceDerivatives, SurfaceParameterRange};
use crate::entities::parameter_vector::{Parameter, ParameterVector};
use crate::error::{IgesError, Result, ValidationResult};
use crate::identity::ObjectID;

/// A surface swept by revolving a generatrix curve about an axis.
#[derive(Clone, Serialize, Deserialize)]
pub struct SurfaceOfRevolution {
    base: EntityBase,
    axis_id: ObjectID,
    generatrix_id: ObjectID,
    start_angle: f64,
    end_angle: f64,
    #[serde(skip)]
    axis: Option<Arc<Line>>,
    #[serde(skip)]
    generatrix: Option<Arc<dyn Curve + Send + Sync>>,
}

impl std::fmt::Debug for SurfaceOfRevolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceOfRevolution")
            .field("base", &self.base)
            .field("axis_id", &self.axis_id)
            .field("generatrix_id", &self.generatrix_id)
            .field("start_angle", &self.start_angle)
            .field("end_angle", &self.end_angle)
            .field("resolved", &self.is_fully_resolved())
            .finish()
    }
}

impl SurfaceOfRevolution {
    /// Construct with both references unresolved. `0 <= start_angle <
    /// end_angle <= 2*pi` is required.
    pub fn from_references(
        id: ObjectID,
        axis_id: ObjectID,
        generatrix_id: ObjectID,
        start_angle: f64,
        end_angle: f64,
    ) -> Result<Self> {
        if !(0.0..=TAU).contains(&start_angle)
            || !(start_angle..=TAU).contains(&end_angle)
        {
            return Err(IgesError::OutOfRange(
                "surface of revolution angles must satisfy 0 <= start < end <= 2*pi".to_string(),
            ));
        }
        let de = DirectoryEntry::new(120);
        let base = EntityBase::new(id, EntityKind::SurfaceOfRevolution, de);
        Ok(Self {
            base,
            axis_id,
            generatrix_id,
            start_angle,
            end_angle,
            axis: None,
            generatrix: None,
        })
    }

    /// Construct from the main parameter vector: the axis and
    /// generatrix pointers followed by the start/end angles.
    pub fn from_parameters(id: ObjectID, params: &ParameterVector, _form_number: i32) -> Result<Self> {
        let axis_id = params.pointer(0)?;
        let generatrix_id = params.pointer(1)?;
        let start_angle = params.real(2)?;
        let end_angle = params.real(3)?;
        Self::from_references(id, axis_id, generatrix_id, start_angle, end_angle)
    }

    /// Construct from already-resolved axis and generatrix.
    pub fn new(
        id: ObjectID,
        axis: Arc<Line>,
        generatrix: Arc<dyn Curve + Send + Sync>,
        start_angle: f64,
        end_angle: f64,
    ) -> Result<Self> {
        let mut surface = Self::from_references(
            id,
            ObjectID::unset(),
            ObjectID::unset(),
            start_angle,
            end_angle,
        )?;
        surface.axis = Some(axis);
        surface.generatrix = Some(generatrix);
        Ok(surface)
    }

    /// Supply the resolved axis line.
    pub fn resolve_axis(&mut self, axis: Arc<Line>) {
        self.axis = Some(axis);
    }

    /// Supply the resolved generatrix curve.
    pub fn resolve_generatrix(&mut self, generatrix: Arc<dyn Curve + Send + Sync>) {
        self.generatrix = Some(generatrix);
    }

    /// Whether both referenced entities have been resolved.
    pub fn is_fully_resolved(&self) -> bool {
        self.axis.is_some() && self.generatrix.is_some()
    }

    /// The axis line's reference ID.
    pub fn axis_id(&self) -> ObjectID {
        self.axis_id
    }

    /// The generatrix curve's reference ID.
    pub fn generatrix_id(&self) -> ObjectID {
        self.generatrix_id
    }

    fn axis_point_and_direction(&self) -> Result<(Vector3<f64>, Vector3<f64>)> {
        let axis = self
            .axis
            .as_ref()
            .ok_or_else(|| IgesError::OutOfRange("axis is not resolved".to_string()))?;
        let (p1, p2) = axis.anchor_points();
        let direction = p2 - p1;
        let norm = direction.norm();
        if norm < crate::core::precision::GEOMETRIC_TOLERANCE {
            return Err(IgesError::InvalidArgument(
                "surface of revolution axis has zero length".to_string(),
            ));
        }
        Ok((p1, direction / norm))
    }

    fn generatrix(&self) -> Result<&Arc<dyn Curve + Send + Sync>> {
        self.generatrix
            .as_ref()
            .ok_or_else(|| IgesError::OutOfRange("generatrix is not resolved".to_string()))
    }

    fn angle(&self, v: f64) -> f64 {
        self.start_angle + v * (self.end_angle - self.start_angle)
    }

    /// Rotate `vector` about `axis` (unit length) by `angle`, via
    /// Rodrigues' formula.
    fn rotate(axis: Vector3<f64>, angle: f64, vector: Vector3<f64>) -> Vector3<f64> {
        let (sin, cos) = angle.sin_cos();
        vector * cos + axis.cross(&vector) * sin + axis * axis.dot(&vector) * (1.0 - cos)
    }
}

impl Entity for SurfaceOfRevolution {
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
            Parameter::Pointer(self.axis_id),
            Parameter::Pointer(self.generatrix_id),
            Parameter::Real(self.start_angle),
            Parameter::Real(self.end_angle),
        ])
    }

    fn unresolved_pd_references(&self) -> Vec<ObjectID> {
        let mut refs = Vec::new();
        if self.axis.is_none() {
            refs.push(self.axis_id);
        }
        if self.generatrix.is_none() {
            refs.push(self.generatrix_id);
        }
        refs
    }

    fn validate_pd(&self) -> ValidationResult {
        let mut result = ValidationResult::ok();
        if self.axis.is_none() {
            result.push("axis reference is not set".to_string());
        }
        if self.generatrix.is_none() {
            result.push("generatrix reference is not set".to_string());
        }
        if !(0.0..=TAU).contains(&self.start_angle) || self.end_angle > TAU {
            result.push("revolution angles must lie within [0, 2*pi]".to_string());
        }
        if self.start_angle >= self.end_angle {
            result.push("start angle must be strictly less than end angle".to_string());
        }
        result
    }
}

impl Surface for SurfaceOfRevolution {
    fn parameter_range(&self) -> SurfaceParameterRange {
        let generatrix_range = self
            .generatrix
            .as_ref()
            .map(|c| c.parameter_range())
            .unwrap_or(crate::entities::interfaces::ParameterRange { start: 0.0, end: 1.0 });
        SurfaceParameterRange {
            u_start: generatrix_range.start,
            u_end: generatrix_range.end,
            v_start: 0.0,
            v_end: 1.0,
        }
    }

    fn is_u_closed(&self) -> bool {
        self.generatrix.as_ref().map(|c| c.is_closed()).unwrap_or(false)
    }

    fn is_v_closed(&self) -> bool {
        (self.end_angle - self.start_angle - TAU).abs() < crate::core::precision::EPSILON_NORMAL
    }

    fn derivatives(&self, u: f64, v: f64, order: usize) -> Result<SurfaceDerivatives> {
        let (p0, axis) = self.axis_point_and_direction()?;
        let generatrix = self.generatrix()?;
        let d = generatrix.derivatives(u, order)?;
        let angle = self.angle(v);
        let delta_angle = self.end_angle - self.start_angle;
        let mut values = Vec::new();
        for nu in 0..=order {
            let cn = d.get(nu).copied().unwrap_or_default();
            let radial = if nu == 0 { cn - p0 } else { cn };
            for nv in 0..=(order - nu) {
                let rotated = Self::rotate_nth_angle_derivative(axis, angle, delta_angle, nv, radial);
                values.push(rotated);
            }
        }
        Ok(SurfaceDerivatives::new(order, values))
    }
}

impl SurfaceOfRevolution {
    /// The `nv`-th derivative with respect to `v` of `R(angle) *
    /// radial`, where `angle = angle(v)` is affine in `v` with slope
    /// `delta_angle`. Each `v`-derivative contributes a factor of
    /// `delta_angle` and rotates the Rodrigues terms by a further
    /// quarter turn (`cos -> -sin -> -cos -> sin -> cos`, the same
    /// cycle as differentiating `sin`/`cos` repeatedly).
    fn rotate_nth_angle_derivative(
        axis: Vector3<f64>,
        angle: f64,
        delta_angle: f64,
        nv: usize,
        radial: Vector3<f64>,
    ) -> Vector3<f64> {
        // R(angle) * radial = radial*cos(angle) + (axis x radial)*sin(angle)
        //                     + axis*(axis . radial)*(1 - cos(angle))
        // d/dangle cycles cos -> -sin, sin -> cos; the parallel
        // (axis-aligned) component is constant in angle, so only its
        // zeroth derivative survives.
        let phase = (nv % 4) as f64 * std::f64::consts::FRAC_PI_2;
        let cos_term = (angle + phase).cos();
        let sin_term = (angle + phase).sin();
        let scale = delta_angle.powi(nv as i32);
        let perpendicular = radial - axis * axis.dot(&radial);
        let parallel = axis * axis.dot(&radial);
        let rotated_perp = perpendicular * cos_term + axis.cross(&perpendicular) * sin_term;
        let base = rotated_perp * scale;
        if nv == 0 {
            base + parallel
        } else {
            base
        }
    }
}

#[allow(dead_code)]
fn _assert_send_sync() {
    fn check<T: Send + Sync>() {}
    check::<SurfaceOfRevolution>();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::curves::line::LineForm;
    use crate::identity::{IdGenerator, ObjectKind};

    fn new_id() -> ObjectID {
        IdGenerator::generate_entity(ObjectKind::EntityNew, 120).unwrap().0
    }

    fn full_revolution_of_offset_point() -> SurfaceOfRevolution {
        let axis = Line::new(
            new_id(),
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
            LineForm::Segment,
        )
        .unwrap();
        let generatrix = Line::new(
            new_id(),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 1.0),
            LineForm::Segment,
        )
        .unwrap();
        SurfaceOfRevolution::new(new_id(), Arc::new(axis), Arc::new(generatrix), 0.0, TAU).unwrap()
    }

    #[test]
    fn quarter_turn_rotates_in_plane() {
        let surface = full_revolution_of_offset_point();
        let p = surface.point_at(0.0, 0.25).unwrap();
        assert!((p - Vector3::new(0.0, 1.0, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn full_sweep_is_v_closed() {
        let surface = full_revolution_of_offset_point();
        assert!(surface.is_v_closed());
    }

    #[test]
    fn angle_order_is_validated() {
        assert!(SurfaceOfRevolution::from_references(
            new_id(),
            new_id(),
            new_id(),
            1.0,
            0.5
        )
        .is_err());
    }

    #[test]
    fn unresolved_axis_is_rejected_until_resolve_axis_is_called() {
        let axis = Line::new(
            new_id(),
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
            LineForm::Segment,
        )
        .unwrap();
        let mut surface = SurfaceOfRevolution::from_references(
            new_id(),
            new_id(),
            new_id(),
            0.0,
            std::f64::consts::PI,
        )
        .unwrap();
        assert!(surface.axis_point_and_direction().is_err());
        surface.resolve_axis(Arc::new(axis));
        assert!(surface.axis_point_and_direction().is_ok());
    }
}
