//! Null entity (type 0).
//!
//! Grounded on `original_source/include/igesio/entities/structures/null_entity.h`:
//! a no-op placeholder a processor is meant to ignore. Carries no
//! parameter data and is always considered valid at the PD level.

use serde::{Deserialize, Serialize};

use crate::entities::directory_entry::DirectoryEntry;
use crate::entities::entity_base::{Entity, EntityBase, EntityKind};
use crate::entities::parameter_vector::ParameterVector;
use crate::error::ValidationResult;
use crate::identity::ObjectID;

/// A no-op passthrough entity (type 0, any form).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NullEntity {
    base: EntityBase,
}

impl NullEntity {
    /// Construct a null entity with the given identity.
    pub fn new(id: ObjectID) -> Self {
        Self {
            base: EntityBase::new(id, EntityKind::Null, DirectoryEntry::new(0)),
        }
    }
}

impl Entity for NullEntity {
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
        ParameterVector::new()
    }

    fn validate_pd(&self) -> ValidationResult {
        ValidationResult::ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{IdGenerator, ObjectKind};

    #[test]
    fn null_entity_has_no_parameters_and_is_always_valid() {
        let (id, _) = IdGenerator::generate_entity(ObjectKind::EntityNew, 0).unwrap();
        let null = NullEntity::new(id);
        assert!(null.main_pd_parameters().is_empty());
        assert!(null.validate().is_valid());
    }
}
