//! The tri-state Directory-Entry reference field.
//!
//! Grounded on `original_source/include/igesio/entities/de/de_field_wrapper.h`'s
//! `DEFieldWrapper<Args...>`: a DE field that can carry a resolved or
//! not-yet-resolved pointer to another entity, a positive catalog
//! enum value, or sit at its default. The C++ template's `weak_ptr`
//! tuple (one slot per acceptable target capability) becomes, here, a
//! single `Option<ObjectID>` plus resolution left to the model
//! container: this crate has no owning `shared_ptr` graph to weakly
//! alias, so "resolved" is represented by the container's lookup
//! succeeding rather than by a live weak handle cached on the field.

use serde::{Deserialize, Serialize};

use crate::error::{IgesError, Result};
use crate::identity::ObjectID;

/// The state of a reference-bearing Directory-Entry field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceState {
    /// Integer value 0: no reference, no enumerated value.
    Default,
    /// A positive small integer naming a catalog entry (line-font
    /// pattern, level, or color number).
    Positive(u32),
    /// A reference, by [`ObjectID`], to another entity. Resolution is
    /// queried on demand from the model container rather than cached.
    Pointer(ObjectID),
}

/// A tri-state Directory-Entry field. At most one of {positive,
/// pointer} is ever live; `Default` covers the remaining case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceField {
    state: ReferenceState,
}

impl ReferenceField {
    /// A field at its default (unset) state.
    pub fn default_field() -> Self {
        Self {
            state: ReferenceState::Default,
        }
    }

    /// A field constructed directly in the Pointer state.
    pub fn from_pointer(id: ObjectID) -> Self {
        Self {
            state: ReferenceState::Pointer(id),
        }
    }

    /// A field constructed directly in the Positive state.
    pub fn from_positive(value: u32) -> Result<Self> {
        if value == 0 {
            return Err(IgesError::InvalidArgument(
                "positive reference-field value must be nonzero".to_string(),
            ));
        }
        Ok(Self {
            state: ReferenceState::Positive(value),
        })
    }

    /// The field's current state.
    pub fn state(&self) -> ReferenceState {
        self.state
    }

    /// Whether the field currently holds a pointer.
    pub fn is_pointer(&self) -> bool {
        matches!(self.state, ReferenceState::Pointer(_))
    }

    /// The referenced ObjectID, if the field is in the Pointer state.
    pub fn target(&self) -> Option<ObjectID> {
        match self.state {
            ReferenceState::Pointer(id) => Some(id),
            _ => None,
        }
    }

    /// Set the field to point at `target`. If the field already holds
    /// a pointer, `target` must match it exactly (mirrors the header's
    /// `SetPointerImpl`'s ID-mismatch check); use
    /// [`ReferenceField::overwrite_pointer`] to replace it unconditionally.
    pub fn set_pointer(&mut self, target: ObjectID) -> Result<()> {
        if let ReferenceState::Pointer(existing) = self.state {
            if existing != target {
                return Err(IgesError::InvalidArgument(format!(
                    "pointer target mismatch: expected {existing}, got {target}"
                )));
            }
        }
        self.state = ReferenceState::Pointer(target);
        Ok(())
    }

    /// Replace the field with a pointer to `target`, discarding any
    /// prior state unconditionally.
    pub fn overwrite_pointer(&mut self, target: ObjectID) {
        self.state = ReferenceState::Pointer(target);
    }

    /// Set the field to a positive catalog value, clearing any
    /// pointer.
    pub fn set_positive_value(&mut self, value: u32) -> Result<()> {
        if value == 0 {
            return Err(IgesError::InvalidArgument(
                "positive reference-field value must be nonzero".to_string(),
            ));
        }
        self.state = ReferenceState::Positive(value);
        Ok(())
    }

    /// Return the field to its default state.
    pub fn reset(&mut self) {
        self.state = ReferenceState::Default;
    }

    /// The signed small-integer value this field serializes to: 0 for
    /// Default, the positive enum for Positive, or the negated
    /// small-integer alias of the pointer target (looked up via
    /// `small_id_of`), falling back to 0 if the target cannot be
    /// resolved to a small integer (a dangling pointer is reported as
    /// unresolved and is functionally a default until reset).
    pub fn serialized_value(&self, small_id_of: impl Fn(ObjectID) -> Option<i32>) -> i32 {
        match self.state {
            ReferenceState::Default => 0,
            ReferenceState::Positive(v) => v as i32,
            ReferenceState::Pointer(id) => small_id_of(id).map(|i| -i).unwrap_or(0),
        }
    }
}

impl Default for ReferenceField {
    fn default() -> Self {
        Self::default_field()
    }
}

/// Build a [`ReferenceField`] from a raw signed DE-field integer, per
/// `original_source`'s `CreateDEFieldWrapper`: zero is Default, a
/// negative value is a pointer resolved through `de2id` (the reader's
/// DE-sequence-number→ObjectID map), and a positive value is accepted
/// as a catalog enum only when `allow_positive_enum` is set — otherwise
/// it is reinterpreted as an unsigned pointer reference, matching
/// non-conforming writers the header tolerates.
pub fn field_from_raw(
    value: i32,
    de2id: &std::collections::HashMap<u32, ObjectID>,
    allow_positive_enum: bool,
) -> Result<ReferenceField> {
    if value == 0 {
        return Ok(ReferenceField::default_field());
    }
    if value > 0 && allow_positive_enum {
        return ReferenceField::from_positive(value as u32);
    }
    let pointer_key = value.unsigned_abs();
    if de2id.is_empty() {
        return Err(IgesError::DataFormatError(format!(
            "no ID mapping provided for pointer value {pointer_key}"
        )));
    }
    let id = de2id.get(&pointer_key).ok_or_else(|| {
        IgesError::OutOfRange(format!("pointer value {pointer_key} not found in ID mapping"))
    })?;
    Ok(ReferenceField::from_pointer(*id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{IdGenerator, ObjectKind};

    #[test]
    fn default_field_serializes_to_zero() {
        let field = ReferenceField::default_field();
        assert_eq!(field.serialized_value(|_| None), 0);
    }

    #[test]
    fn positive_then_pointer_clears_positive() {
        let mut field = ReferenceField::from_positive(3).unwrap();
        let (id, _) = IdGenerator::generate(ObjectKind::IgesData).unwrap();
        field.overwrite_pointer(id);
        assert!(field.is_pointer());
        assert_eq!(field.target(), Some(id));
    }

    #[test]
    fn set_pointer_rejects_mismatched_target() {
        let (a, _) = IdGenerator::generate(ObjectKind::IgesData).unwrap();
        let (b, _) = IdGenerator::generate(ObjectKind::IgesData).unwrap();
        let mut field = ReferenceField::from_pointer(a);
        assert!(field.set_pointer(b).is_err());
    }

    #[test]
    fn reset_returns_to_default() {
        let mut field = ReferenceField::from_positive(7).unwrap();
        field.reset();
        assert_eq!(field.state(), ReferenceState::Default);
    }
}
