//! The polymorphic entity root.
//!
//! Grounded on `original_source/include/igesio/entities/entity_base.h`'s
//! `EntityBase`: carries DE metadata, the main parameter vector, and
//! the two additional-pointer groups, and defines the base
//! construction/serialization/reference-resolution protocol every
//! concrete entity builds on.

use serde::{Deserialize, Serialize};

use crate::error::{IgesError, Result, ValidationResult};
use crate::identity::ObjectID;

use super::directory_entry::DirectoryEntry;
use super::parameter_vector::ParameterVector;
use super::reference_field::ReferenceField;

/// The tagged set of concrete entity kinds, used for factory dispatch
/// and as the parameter vector's variant discriminant.
///
/// Mirrors `SPEC_FULL.md` §9's "Deep polymorphism" design note: each
/// capability is a trait implemented on the concrete struct, while
/// `EntityKind` lets the factory and the model container work with a
/// flat, matchable tag instead of a trait-object vtable alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// Type 0.
    Null,
    /// Type 100.
    CircularArc,
    /// Type 102.
    CompositeCurve,
    /// Type 104.
    ConicArc,
    /// Type 106.
    CopiousData,
    /// Type 110.
    Line,
    /// Type 112.
    ParametricSplineCurve,
    /// Type 118.
    RuledSurface,
    /// Type 120.
    SurfaceOfRevolution,
    /// Type 122.
    TabulatedCylinder,
    /// Type 124.
    TransformationMatrix,
    /// Type 126.
    NurbsCurve,
    /// Type 128.
    NurbsSurface,
    /// Type 142.
    CurveOnSurface,
    /// Type 314.
    ColorDefinition,
    /// Any entity type not implemented as a first-class kind; preserves
    /// its raw parameters for round-trip fidelity.
    Unsupported,
}

impl EntityKind {
    /// The canonical entity-type code for kinds with exactly one
    /// (`Unsupported` has none; callers must track the raw code
    /// separately for it).
    pub fn entity_type_code(self) -> Option<u16> {
        use EntityKind::*;
        Some(match self {
            Null => 0,
            CircularArc => 100,
            CompositeCurve => 102,
            ConicArc => 104,
            CopiousData => 106,
            Line => 110,
            ParametricSplineCurve => 112,
            RuledSurface => 118,
            SurfaceOfRevolution => 120,
            TabulatedCylinder => 122,
            TransformationMatrix => 124,
            NurbsCurve => 126,
            NurbsSurface => 128,
            CurveOnSurface => 142,
            ColorDefinition => 314,
            Unsupported => return None,
        })
    }
}

/// The two optional trailing additional-pointer groups in a PD record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdditionalPointers {
    /// Associativity / general-note / text-template references.
    pub former: Vec<ReferenceField>,
    /// Property / attribute table references.
    pub latter: Vec<ReferenceField>,
}

/// Fields and protocol common to every concrete entity.
///
/// Concrete entities embed an `EntityBase` and implement
/// [`crate::entities::interfaces::Curve`]/`Surface`/etc. as
/// appropriate, plus the per-entity hooks this struct's methods call
/// through an owning [`Entity`] implementation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityBase {
    id: ObjectID,
    directory_entry: DirectoryEntry,
    kind: EntityKind,
    additional_pointers: AdditionalPointers,
}

impl EntityBase {
    /// Construct from an assigned ObjectID and directory entry. Per
    /// `SPEC_FULL.md`'s deferred-construction design note, IGES-sourced
    /// entities must be given the ID returned by
    /// `IdGenerator::get_reserved`, never a freshly generated one.
    pub fn new(id: ObjectID, kind: EntityKind, directory_entry: DirectoryEntry) -> Self {
        Self {
            id,
            directory_entry,
            kind,
            additional_pointers: AdditionalPointers::default(),
        }
    }

    /// The entity's stable identity.
    pub fn id(&self) -> ObjectID {
        self.id
    }

    /// The entity's kind tag.
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// The Directory-Entry record.
    pub fn directory_entry(&self) -> &DirectoryEntry {
        &self.directory_entry
    }

    /// Mutable access to the Directory-Entry record.
    pub fn directory_entry_mut(&mut self) -> &mut DirectoryEntry {
        &mut self.directory_entry
    }

    /// The additional-pointer groups.
    pub fn additional_pointers(&self) -> &AdditionalPointers {
        &self.additional_pointers
    }

    /// Split trailing additional-pointer groups off `parameters`,
    /// starting at `main_len` (the index returned by the concrete
    /// entity's `set_main_pd_parameters`). Each group, if present,
    /// starts with an integer count followed by that many pointer
    /// values.
    pub fn set_additional_pointers(
        &mut self,
        parameters: &ParameterVector,
        main_len: usize,
        de2id: &std::collections::HashMap<u32, ObjectID>,
    ) -> Result<()> {
        let mut cursor = main_len;
        self.additional_pointers.former = read_pointer_group(parameters, &mut cursor, de2id)?;
        self.additional_pointers.latter = read_pointer_group(parameters, &mut cursor, de2id)?;
        Ok(())
    }

    /// `get_parameters()`'s additional-pointer suffix: each group
    /// prefixed by its element count.
    pub fn additional_pointer_suffix(
        &self,
        small_id_of: impl Fn(ObjectID) -> Option<i32>,
    ) -> ParameterVector {
        let mut out = ParameterVector::new();
        append_pointer_group(&mut out, &self.additional_pointers.former, &small_id_of);
        append_pointer_group(&mut out, &self.additional_pointers.latter, &small_id_of);
        out
    }

    /// Union of unresolved references across DE fields and additional
    /// pointers. Concrete entities must union in their own PD
    /// reference fields via [`Entity::unresolved_pd_references`].
    pub fn unresolved_de_references(&self) -> Vec<ObjectID> {
        let de = &self.directory_entry;
        [
            de.structure.target(),
            de.line_font_pattern.target(),
            de.level.target(),
            de.view.target(),
            de.transformation_matrix.target(),
            de.label_display_associativity.target(),
            de.color.target(),
        ]
        .into_iter()
        .flatten()
        .chain(
            self.additional_pointers
                .former
                .iter()
                .chain(self.additional_pointers.latter.iter())
                .filter_map(|f| f.target()),
        )
        .collect()
    }

    /// Validate DE-level field combinations: label/subscript bounds
    /// plus "at most one of {positive, pointer}" per reference field
    /// (already enforced by construction, so this mainly re-checks
    /// field-level constraints).
    pub fn validate_de(&self) -> ValidationResult {
        let mut result = ValidationResult::ok();
        for message in self.directory_entry.validate() {
            result.push(message);
        }
        result
    }
}

fn read_pointer_group(
    parameters: &ParameterVector,
    cursor: &mut usize,
    de2id: &std::collections::HashMap<u32, ObjectID>,
) -> Result<Vec<ReferenceField>> {
    if parameters.get(*cursor).is_none() {
        return Ok(Vec::new());
    }
    let count = parameters.integer(*cursor)? as usize;
    *cursor += 1;
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let id = parameters.pointer(*cursor).or_else(|_| {
            // Tolerate a raw signed-integer encoding (pre-resolution).
            let raw = parameters.integer(*cursor)?;
            if raw == 0 {
                return Ok::<ObjectID, IgesError>(ObjectID::unset());
            }
            let key = raw.unsigned_abs() as u32;
            de2id.get(&key).copied().ok_or_else(|| {
                IgesError::OutOfRange(format!("pointer {key} not found in ID mapping"))
            })
        })?;
        out.push(if id.is_set() {
            ReferenceField::from_pointer(id)
        } else {
            ReferenceField::default_field()
        });
        *cursor += 1;
    }
    Ok(out)
}

fn append_pointer_group(
    out: &mut ParameterVector,
    group: &[ReferenceField],
    small_id_of: &impl Fn(ObjectID) -> Option<i32>,
) {
    use super::parameter_vector::Parameter;
    out.push(Parameter::Integer(group.len() as i64));
    for field in group {
        let value = field.serialized_value(|id| small_id_of(id));
        out.push(Parameter::Integer(value as i64));
    }
}

/// Per-entity hooks that [`EntityBase`]'s base protocol calls through.
///
/// Mirrors `original_source`'s pure-virtual `GetMainPDParameters`,
/// `SetMainPDParameters`, `ValidatePD`, and the optional
/// `GetChildIDs`/`GetUnresolvedPDReferences`/`SetUnresolvedPDReferences`
/// overrides.
pub trait Entity {
    /// Shared base fields.
    fn base(&self) -> &EntityBase;

    /// Mutable shared base fields.
    fn base_mut(&mut self) -> &mut EntityBase;

    /// Downcast support, so a model container holding `Box<dyn Entity>`
    /// can recover the concrete type to wire a capability-specific
    /// reference (e.g. a composite curve's resolved sub-curves).
    fn as_any(&self) -> &dyn std::any::Any;

    /// Mutable downcast support.
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;

    /// This entity's main parameters (excluding additional-pointer
    /// groups), in the order the factory expects on reconstruction.
    fn main_pd_parameters(&self) -> ParameterVector;

    /// Per-entity parameter-data validation.
    fn validate_pd(&self) -> ValidationResult;

    /// IDs of entities this one references from its PD section
    /// (excluding DE fields and additional pointers, which
    /// [`EntityBase`] already covers).
    fn unresolved_pd_references(&self) -> Vec<ObjectID> {
        Vec::new()
    }

    /// IDs of entities this one is a physical parent of (e.g. a
    /// composite curve's sub-curves).
    fn child_ids(&self) -> Vec<ObjectID> {
        Vec::new()
    }

    /// Whole-entity validation: DE-level plus PD-level.
    fn validate(&self) -> ValidationResult {
        let mut result = self.base().validate_de();
        result.merge(self.validate_pd());
        result
    }

    /// All unresolved references, DE and PD combined.
    fn unresolved_references(&self) -> Vec<ObjectID> {
        let mut refs = self.base().unresolved_de_references();
        refs.extend(self.unresolved_pd_references());
        refs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::directory_entry::DirectoryEntry;
    use crate::identity::{IdGenerator, ObjectKind};

    #[test]
    fn additional_pointer_round_trip_is_empty_for_short_vector() {
        let (id, _) = IdGenerator::generate_entity(ObjectKind::EntityNew, 100).unwrap();
        let mut base = EntityBase::new(id, EntityKind::CircularArc, DirectoryEntry::new(100));
        let params = ParameterVector::from_values([
            super::super::parameter_vector::Parameter::Real(0.0),
        ]);
        base.set_additional_pointers(&params, 1, &Default::default())
            .unwrap();
        assert!(base.additional_pointers().former.is_empty());
        assert!(base.additional_pointers().latter.is_empty());
    }

    #[test]
    fn entity_kind_maps_to_type_code() {
        assert_eq!(EntityKind::Line.entity_type_code(), Some(110));
        assert_eq!(EntityKind::Unsupported.entity_type_code(), None);
    }
}
