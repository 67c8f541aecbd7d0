//! The entity map a loaded (or programmatically assembled) IGES model
//! is built from.
//!
//! Grounded on `original_source/include/igesio/models/iges_data.h`'s
//! `IgesData`: owns every entity by [`ObjectID`], resolves references
//! incrementally as entities are added, and reports readiness/validity
//! across the whole set. Capability-specific cross-references (a
//! composite curve's sub-curves, a ruled surface's two rails, and so
//! on) are wired through read-only `Arc` snapshots cached alongside
//! the owning entry, per each entity type's own `resolve_*` contract.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::curves::{CompositeCurve, CurveOnSurface, Line};
use crate::entities::surfaces::{RuledSurface, SurfaceOfRevolution, TabulatedCylinder};
use crate::entities::transformation::TransformationMatrix;
use crate::entities::{Curve, Entity, EntityKind, Surface};
use crate::error::{IgesError, Result, ValidationResult};
use crate::identity::ObjectID;

use super::global_section::GlobalParameters;

/// The entity map and file-level defaults for a single IGES model.
///
/// `entities` is this container's sole ownership of the entity graph;
/// `curve_cache`/`surface_cache`/`line_cache` hold cloned, read-only
/// `Arc` snapshots used only to satisfy another entity's cross-
/// reference — mutating an entity after it has been cross-referenced
/// does not retroactively update already-wired consumers.
pub struct Model {
    id: ObjectID,
    global: GlobalParameters,
    entities: HashMap<ObjectID, Box<dyn Entity>>,
    curve_cache: HashMap<ObjectID, Arc<dyn Curve + Send + Sync>>,
    surface_cache: HashMap<ObjectID, Arc<dyn Surface + Send + Sync>>,
    line_cache: HashMap<ObjectID, Arc<Line>>,
}

impl Model {
    /// Construct an empty model with default global parameters.
    pub fn new() -> Result<Self> {
        let (id, _) = crate::identity::IdGenerator::generate(crate::identity::ObjectKind::IgesData)?;
        Ok(Self {
            id,
            global: GlobalParameters::default(),
            entities: HashMap::new(),
            curve_cache: HashMap::new(),
            surface_cache: HashMap::new(),
            line_cache: HashMap::new(),
        })
    }

    /// This model's own identity.
    pub fn id(&self) -> ObjectID {
        self.id
    }

    /// The file-level defaults.
    pub fn global(&self) -> &GlobalParameters {
        &self.global
    }

    /// Mutable access to the file-level defaults.
    pub fn global_mut(&mut self) -> &mut GlobalParameters {
        &mut self.global
    }

    /// The number of entities currently held.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Look up an entity by ID.
    pub fn entity(&self, id: ObjectID) -> Option<&dyn Entity> {
        self.entities.get(&id).map(|b| b.as_ref())
    }

    /// Mutable lookup by ID.
    pub fn entity_mut(&mut self, id: ObjectID) -> Option<&mut (dyn Entity + 'static)> {
        self.entities.get_mut(&id).map(|b| b.as_mut())
    }

    /// Every entity currently held.
    pub fn entities(&self) -> impl Iterator<Item = (&ObjectID, &Box<dyn Entity>)> {
        self.entities.iter()
    }

    /// Insert an entity, then attempt to wire any cross-references it
    /// or its existing neighbors are waiting on. Returns the entity's
    /// own ID.
    pub fn add_entity(&mut self, entity: Box<dyn Entity>) -> ObjectID {
        let id = entity.base().id();
        self.cache_capability_handle(id, entity.as_ref());
        self.entities.insert(id, entity);
        self.resolve_pending();
        id
    }

    /// If `entity` implements a capability trait this container
    /// cross-references by, clone a read-only `Arc` snapshot into the
    /// matching cache.
    fn cache_capability_handle(&mut self, id: ObjectID, entity: &dyn Entity) {
        match entity.base().kind() {
            EntityKind::Line => {
                if let Some(line) = entity.as_any().downcast_ref::<Line>() {
                    self.line_cache.insert(id, Arc::new(line.clone()));
                    self.curve_cache.insert(id, Arc::new(line.clone()));
                }
            }
            EntityKind::CircularArc => {
                if let Some(c) = entity.as_any().downcast_ref::<crate::entities::curves::CircularArc>() {
                    self.curve_cache.insert(id, Arc::new(c.clone()));
                }
            }
            EntityKind::ConicArc => {
                if let Some(c) = entity.as_any().downcast_ref::<crate::entities::curves::ConicArc>() {
                    self.curve_cache.insert(id, Arc::new(c.clone()));
                }
            }
            EntityKind::CopiousData => {
                if let Some(c) = entity.as_any().downcast_ref::<crate::entities::curves::CopiousData>() {
                    self.curve_cache.insert(id, Arc::new(c.clone()));
                }
            }
            EntityKind::ParametricSplineCurve => {
                if let Some(c) = entity
                    .as_any()
                    .downcast_ref::<crate::entities::curves::ParametricSplineCurve>()
                {
                    self.curve_cache.insert(id, Arc::new(c.clone()));
                }
            }
            EntityKind::NurbsCurve => {
                if let Some(c) = entity.as_any().downcast_ref::<crate::entities::curves::NurbsCurve>() {
                    self.curve_cache.insert(id, Arc::new(c.clone()));
                }
            }
            EntityKind::NurbsSurface => {
                if let Some(s) = entity.as_any().downcast_ref::<crate::entities::surfaces::NurbsSurface>() {
                    self.surface_cache.insert(id, Arc::new(s.clone()));
                }
            }
            _ => {}
        }
    }

    /// Re-attempt wiring every entity whose PD references are not yet
    /// fully resolved. Runs to a fixed point: wiring one entity can
    /// make another newly resolvable (e.g. a ruled surface over a
    /// composite curve that just became whole).
    fn resolve_pending(&mut self) {
        loop {
            let pending: Vec<ObjectID> = self
                .entities
                .iter()
                .filter(|(_, e)| !e.unresolved_pd_references().is_empty())
                .map(|(id, _)| *id)
                .collect();
            let mut progressed = false;
            for id in pending {
                if self.try_wire(id) {
                    progressed = true;
                }
            }
            if !progressed {
                break;
            }
        }
    }

    /// Attempt to supply every reference a single entity is waiting
    /// on from the current caches. Returns whether any reference was
    /// newly wired.
    fn try_wire(&mut self, id: ObjectID) -> bool {
        let kind = match self.entities.get(&id) {
            Some(e) => e.base().kind(),
            None => return false,
        };
        let mut progressed = false;
        match kind {
            EntityKind::CompositeCurve => {
                let (ids, indices) = {
                    let Some(entity) = self.entities.get(&id) else { return false };
                    let Some(composite) = entity.as_any().downcast_ref::<CompositeCurve>() else {
                        return false;
                    };
                    (composite.sub_curve_ids().to_vec(), composite.unresolved_indices())
                };
                for index in indices {
                    if let Some(curve) = self.curve_cache.get(&ids[index]).cloned() {
                        if let Some(entity) = self.entities.get_mut(&id) {
                            if let Some(composite) = entity.as_any_mut().downcast_mut::<CompositeCurve>() {
                                if composite.resolve_sub_curve(index, curve).is_ok() {
                                    progressed = true;
                                }
                            }
                        }
                    }
                }
            }
            EntityKind::RuledSurface => {
                let Some(entity) = self.entities.get_mut(&id) else { return false };
                if let Some(surface) = entity.as_any_mut().downcast_mut::<RuledSurface>() {
                    let (c1_id, c2_id) = (surface.curve1_id(), surface.curve2_id());
                    if let Some(curve) = self.curve_cache.get(&c1_id).cloned() {
                        surface.resolve_curve1(curve);
                        progressed = true;
                    }
                    if let Some(curve) = self.curve_cache.get(&c2_id).cloned() {
                        surface.resolve_curve2(curve);
                        progressed = true;
                    }
                }
            }
            EntityKind::SurfaceOfRevolution => {
                let Some(entity) = self.entities.get_mut(&id) else { return false };
                if let Some(surface) = entity.as_any_mut().downcast_mut::<SurfaceOfRevolution>() {
                    let (axis_id, gen_id) = (surface.axis_id(), surface.generatrix_id());
                    if let Some(axis) = self.line_cache.get(&axis_id).cloned() {
                        surface.resolve_axis(axis);
                        progressed = true;
                    }
                    if let Some(curve) = self.curve_cache.get(&gen_id).cloned() {
                        surface.resolve_generatrix(curve);
                        progressed = true;
                    }
                }
            }
            EntityKind::TabulatedCylinder => {
                let Some(entity) = self.entities.get_mut(&id) else { return false };
                if let Some(surface) = entity.as_any_mut().downcast_mut::<TabulatedCylinder>() {
                    let directrix_id = surface.directrix_id();
                    if let Some(curve) = self.curve_cache.get(&directrix_id).cloned() {
                        surface.resolve_directrix(curve);
                        progressed = true;
                    }
                }
            }
            EntityKind::CurveOnSurface => {
                let Some(entity) = self.entities.get_mut(&id) else { return false };
                if let Some(cos) = entity.as_any_mut().downcast_mut::<CurveOnSurface>() {
                    let surface_id = cos.surface_id();
                    let base_curve_id = cos.base_curve_id();
                    let world_curve_id = cos.world_curve_id();
                    if let Some(surface) = self.surface_cache.get(&surface_id).cloned() {
                        cos.resolve_surface(surface);
                        progressed = true;
                    }
                    if let Some(curve) = self.curve_cache.get(&base_curve_id).cloned() {
                        cos.resolve_base_curve(curve);
                        progressed = true;
                    }
                    if let Some(world_id) = world_curve_id {
                        if let Some(curve) = self.curve_cache.get(&world_id).cloned() {
                            cos.resolve_world_curve(curve);
                            progressed = true;
                        }
                    }
                }
            }
            _ => {}
        }
        progressed
    }

    /// Every entity with at least one unresolved reference, DE fields
    /// and PD fields combined.
    pub fn unresolved_references(&self) -> Vec<ObjectID> {
        let mut ids: Vec<ObjectID> = self
            .entities
            .values()
            .flat_map(|e| e.unresolved_references())
            .collect();
        ids.sort_by_key(|id| (id.prefix(), id.suffix()));
        ids.dedup();
        ids
    }

    /// Whether every entity's references are resolved.
    pub fn are_all_references_set(&self) -> bool {
        self.entities.values().all(|e| e.unresolved_references().is_empty())
    }

    /// Chained transformation matrices compose correctly: whether
    /// `id`'s own reference chain, and every transformation reachable
    /// from it, terminates without a cycle. Used by [`Self::is_ready`]
    /// indirectly via [`Self::validate`].
    fn transformation_chain_resolves(&self, id: ObjectID) -> Result<(nalgebra::Matrix3<f64>, nalgebra::Vector3<f64>)> {
        let entity = self
            .entities
            .get(&id)
            .ok_or_else(|| IgesError::OutOfRange(format!("no entity with id {id}")))?;
        let t = entity
            .as_any()
            .downcast_ref::<TransformationMatrix>()
            .ok_or_else(|| IgesError::InvalidArgument("entity is not a transformation matrix".to_string()))?;
        Ok(t.effective_transform(|ref_id| self.transformation_chain_resolves(ref_id).ok()))
    }

    /// Whether every entity is present, resolved, and individually
    /// valid.
    pub fn is_ready(&self) -> bool {
        self.are_all_references_set() && self.entities.values().all(|e| e.validate().is_valid())
    }

    /// Whole-model validation: unresolved references plus every
    /// entity's own validity.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::ok();
        for id in self.unresolved_references() {
            result.push(format!("reference to {id} is not resolved by any entity in this model"));
        }
        for entity in self.entities.values() {
            result.merge(entity.validate());
        }
        for (id, entity) in &self.entities {
            if entity.base().kind() == EntityKind::TransformationMatrix {
                if let Err(e) = self.transformation_chain_resolves(*id) {
                    result.push(format!("transformation {id}'s reference chain is invalid: {e}"));
                }
            }
        }
        result
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new().expect("identity generation should not fail for an empty model")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::curves::{Line, LineForm};
    use crate::entities::surfaces::RuledSurface;
    use crate::identity::{IdGenerator, ObjectKind};
    use nalgebra::Vector3;

    #[test]
    fn empty_model_is_ready() {
        let model = Model::new().unwrap();
        assert!(model.is_ready());
        assert!(model.validate().is_valid());
    }

    #[test]
    fn ruled_surface_resolves_once_both_curves_are_present() {
        let mut model = Model::new().unwrap();
        let (l1_id, _) = IdGenerator::generate_entity(ObjectKind::EntityNew, 110).unwrap();
        let (l2_id, _) = IdGenerator::generate_entity(ObjectKind::EntityNew, 110).unwrap();
        let (s_id, _) = IdGenerator::generate_entity(ObjectKind::EntityNew, 118).unwrap();

        let l1 = Line::new(l1_id, Vector3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0), LineForm::Segment)
            .unwrap();
        let l2 = Line::new(l2_id, Vector3::new(0.0, 1.0, 0.0), Vector3::new(1.0, 1.0, 0.0), LineForm::Segment)
            .unwrap();
        let surface = RuledSurface::from_references(s_id, l1_id, l2_id, false, false);

        model.add_entity(Box::new(surface));
        assert!(!model.are_all_references_set());
        model.add_entity(Box::new(l1));
        model.add_entity(Box::new(l2));

        assert!(model.are_all_references_set());
        assert!(model.is_ready());
    }
}
