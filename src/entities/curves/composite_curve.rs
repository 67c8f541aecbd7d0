//! Composite curve entity (type 102): an ordered chain of sub-curves.
//!
//! Grounded on `SPEC_FULL.md` §4.5 "Composite curve" and §9's
//! "Cyclic references in the entity graph" design note: a composite
//! curve's sub-curves are non-owning references by [`ObjectID`],
//! resolved late by the model container. Because [`Curve::derivatives`]
//! takes only `&self`, a resolved sub-curve is cached here as a shared,
//! read-only handle (`Arc<dyn Curve + Send + Sync>`) once the
//! container supplies it — the `Arc` is a shared view, not ownership;
//! the model container remains the entity graph's sole owner.

use std::sync::Arc;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::entities::directory_entry::DirectoryEntry;
use crate::entities::entity_base::{Entity, EntityBase, EntityKind};
use crate::entities::interfaces::{Curve, CurveDerivatives, ParameterRange};
use crate::entities::parameter_vector::{Parameter, ParameterVector};
use crate::error::{IgesError, Result, ValidationResult};
use crate::identity::ObjectID;

/// An ordered chain of sub-curves reparametrized over a single
/// cumulative parameter.
#[derive(Clone, Serialize, Deserialize)]
pub struct CompositeCurve {
    base: EntityBase,
    sub_curve_ids: Vec<ObjectID>,
    #[serde(skip)]
    resolved: Vec<Option<Arc<dyn Curve + Send + Sync>>>,
}

impl std::fmt::Debug for CompositeCurve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeCurve")
            .field("base", &self.base)
            .field("sub_curve_ids", &self.sub_curve_ids)
            .field("resolved_count", &self.resolved.iter().filter(|r| r.is_some()).count())
            .finish()
    }
}

impl CompositeCurve {
    /// Construct from the main parameter vector: a count followed by
    /// that many sub-curve pointers.
    pub fn from_parameters(id: ObjectID, params: &ParameterVector, _form_number: i32) -> Result<Self> {
        let count = params.integer(0)?;
        if count < 1 {
            return Err(IgesError::DataFormatError(
                "composite curve must reference at least one sub-curve".to_string(),
            ));
        }
        let mut sub_curve_ids = Vec::with_capacity(count as usize);
        for i in 0..count as usize {
            sub_curve_ids.push(params.pointer(1 + i)?);
        }
        Self::new(id, sub_curve_ids)
    }

    /// Construct with an ordered list of sub-curve IDs, none yet
    /// resolved.
    pub fn new(id: ObjectID, sub_curve_ids: Vec<ObjectID>) -> Result<Self> {
        if sub_curve_ids.is_empty() {
            return Err(IgesError::DataFormatError(
                "composite curve must reference at least one sub-curve".to_string(),
            ));
        }
        let base = EntityBase::new(id, EntityKind::CompositeCurve, DirectoryEntry::new(102));
        let resolved = vec![None; sub_curve_ids.len()];
        Ok(Self {
            base,
            sub_curve_ids,
            resolved,
        })
    }

    /// Append a new sub-curve reference, flipping `sub_entity`'s
    /// subordinate-switch to physically-dependent is the reader's
    /// responsibility; this call only enforces the continuity
    /// invariant once both ends are resolved.
    pub fn add_sub_curve(&mut self, id: ObjectID) {
        self.sub_curve_ids.push(id);
        self.resolved.push(None);
    }

    /// Supply the resolved curve for sub-curve `index`. Validates
    /// end-point continuity with its already-resolved neighbor(s)
    /// within geometric tolerance.
    pub fn resolve_sub_curve(&mut self, index: usize, curve: Arc<dyn Curve + Send + Sync>) -> Result<()> {
        if index >= self.resolved.len() {
            return Err(IgesError::OutOfRange(format!(
                "sub-curve index {index} out of range"
            )));
        }
        if index > 0 {
            if let Some(prev) = &self.resolved[index - 1] {
                let prev_range = prev.parameter_range();
                let this_range = curve.parameter_range();
                let prev_end = prev.point_at(prev_range.end)?;
                let this_start = curve.point_at(this_range.start)?;
                if (prev_end - this_start).norm() > crate::core::precision::GEOMETRIC_TOLERANCE {
                    return Err(IgesError::DataFormatError(
                        "sub-curve does not connect to its predecessor within tolerance"
                            .to_string(),
                    ));
                }
            }
        }
        self.resolved[index] = Some(curve);
        Ok(())
    }

    /// Whether every sub-curve reference has been resolved.
    pub fn is_fully_resolved(&self) -> bool {
        self.resolved.iter().all(Option::is_some)
    }

    /// The sub-curve reference IDs, in chain order.
    pub fn sub_curve_ids(&self) -> &[ObjectID] {
        &self.sub_curve_ids
    }

    /// Indices not yet supplied a resolved sub-curve.
    pub fn unresolved_indices(&self) -> Vec<usize> {
        self.resolved
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.is_none().then_some(i))
            .collect()
    }

    fn cumulative_starts(&self) -> Result<Vec<f64>> {
        let mut starts = Vec::with_capacity(self.resolved.len());
        let mut acc = 0.0;
        for curve in &self.resolved {
            let curve = curve.as_ref().ok_or_else(|| {
                IgesError::OutOfRange("composite curve has unresolved sub-curve references".to_string())
            })?;
            starts.push(acc);
            let r = curve.parameter_range();
            acc += r.end - r.start;
        }
        Ok(starts)
    }

    fn locate(&self, t: f64) -> Result<(usize, f64)> {
        let starts = self.cumulative_starts()?;
        let mut index = 0;
        for (i, &s) in starts.iter().enumerate() {
            if t >= s {
                index = i;
            }
        }
        let curve = self.resolved[index].as_ref().unwrap();
        let r = curve.parameter_range();
        let local_t = r.start + (t - starts[index]);
        Ok((index, local_t))
    }
}

impl Entity for CompositeCurve {
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
        let mut v = vec![Parameter::Integer(self.sub_curve_ids.len() as i64)];
        v.extend(self.sub_curve_ids.iter().map(|id| Parameter::Pointer(*id)));
        ParameterVector::from_values(v)
    }

    fn unresolved_pd_references(&self) -> Vec<ObjectID> {
        self.sub_curve_ids
            .iter()
            .zip(self.resolved.iter())
            .filter(|(_, r)| r.is_none())
            .map(|(id, _)| *id)
            .collect()
    }

    fn validate_pd(&self) -> ValidationResult {
        let mut result = ValidationResult::ok();
        if self.sub_curve_ids.is_empty() {
            result.push("composite curve must reference at least one sub-curve".to_string());
        }
        result
    }
}

impl Curve for CompositeCurve {
    fn parameter_range(&self) -> ParameterRange {
        match self.cumulative_starts() {
            Ok(starts) => {
                let last_curve = self.resolved.last().and_then(|c| c.as_ref());
                let total = match last_curve {
                    Some(curve) => {
                        let r = curve.parameter_range();
                        starts.last().copied().unwrap_or(0.0) + (r.end - r.start)
                    }
                    None => 0.0,
                };
                ParameterRange { start: 0.0, end: total.max(f64::MIN_POSITIVE) }
            }
            Err(_) => ParameterRange { start: 0.0, end: f64::MIN_POSITIVE },
        }
    }

    fn is_closed(&self) -> bool {
        match (self.point_at(0.0), self.point_at(self.parameter_range().end)) {
            (Ok(a), Ok(b)) => (a - b).norm() < crate::core::precision::GEOMETRIC_TOLERANCE,
            _ => false,
        }
    }

    fn derivatives(&self, t: f64, n: usize) -> Result<CurveDerivatives> {
        let (index, local_t) = self.locate(t)?;
        let curve = self.resolved[index].as_ref().unwrap();
        curve.derivatives(local_t, n)
    }
}

#[allow(dead_code)]
fn _assert_send_sync() {
    fn check<T: Send + Sync>() {}
    check::<CompositeCurve>();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::curves::line::{Line, LineForm};
    use crate::identity::{IdGenerator, ObjectKind};

    fn new_id() -> ObjectID {
        IdGenerator::generate_entity(ObjectKind::EntityNew, 102).unwrap().0
    }

    #[test]
    fn two_connected_segments_reparametrize_cumulatively() {
        let l1 = Line::new(
            new_id(),
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            LineForm::Segment,
        )
        .unwrap();
        let l2 = Line::new(
            new_id(),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
            LineForm::Segment,
        )
        .unwrap();
        let mut composite = CompositeCurve::new(new_id(), vec![new_id(), new_id()]).unwrap();
        composite.resolve_sub_curve(0, Arc::new(l1)).unwrap();
        composite.resolve_sub_curve(1, Arc::new(l2)).unwrap();
        assert!(composite.is_fully_resolved());
        let p = composite.point_at(1.5).unwrap();
        assert!((p - Vector3::new(1.0, 0.5, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn discontinuous_sub_curve_is_rejected() {
        let l1 = Line::new(
            new_id(),
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            LineForm::Segment,
        )
        .unwrap();
        let l2 = Line::new(
            new_id(),
            Vector3::new(5.0, 0.0, 0.0),
            Vector3::new(5.0, 1.0, 0.0),
            LineForm::Segment,
        )
        .unwrap();
        let mut composite = CompositeCurve::new(new_id(), vec![new_id(), new_id()]).unwrap();
        composite.resolve_sub_curve(0, Arc::new(l1)).unwrap();
        assert!(composite.resolve_sub_curve(1, Arc::new(l2)).is_err());
    }
}
