//! The 20-field Directory-Entry record.
//!
//! Grounded on `original_source/include/igesio/entities/de/raw_entity_de.h`
//! (`RawEntityDE`, `EntityStatus`) and `SPEC_FULL.md` §3 "Directory-entry
//! record".

use serde::{Deserialize, Serialize};

use super::reference_field::ReferenceField;

/// DE parameter 9's "subordinate entity switch" sub-field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubordinateEntitySwitch {
    /// Entity is independent.
    Independent,
    /// Entity is physically dependent on another (e.g. a sub-curve of
    /// a composite curve).
    PhysicallyDependent,
    /// Entity is logically dependent.
    LogicallyDependent,
    /// Entity is both physically and logically dependent.
    Both,
}

/// DE parameter 9's "entity use flag" sub-field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityUseFlag {
    /// Ordinary geometry.
    Geometry,
    /// Annotation.
    Annotation,
    /// Definition (e.g. a subfigure definition).
    Definition,
    /// Other.
    Other,
    /// Logical/positional.
    Logical,
    /// 2D parametric geometry.
    Parametric2D,
    /// Construction geometry.
    Construction,
}

/// DE parameter 9's "hierarchy" sub-field: how DE fields 4-8 propagate
/// to physically dependent children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HierarchyType {
    /// Children inherit this entity's DE fields 4-8.
    AllDependentsPropagate,
    /// Children use their own DE fields 4-8.
    NoPropagation,
    /// Only the immediate DE fields propagate; further nesting does not.
    DefinitionLevelPropagates,
}

/// DE parameter 9, the "status number", as a 4-tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityStatus {
    /// Blank status: whether the entity should be displayed.
    pub blank: bool,
    /// Subordinate-entity switch.
    pub subordinate: SubordinateEntitySwitch,
    /// Entity use flag.
    pub use_flag: EntityUseFlag,
    /// Hierarchy type.
    pub hierarchy: HierarchyType,
}

impl Default for EntityStatus {
    fn default() -> Self {
        Self {
            blank: false,
            subordinate: SubordinateEntitySwitch::Independent,
            use_flag: EntityUseFlag::Geometry,
            hierarchy: HierarchyType::AllDependentsPropagate,
        }
    }
}

/// The fixed 20-field Directory-Entry record carried by every entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// Field 1/11: entity-type code.
    pub entity_type: u16,
    /// Field 14/19 (duplicated): form number, the intra-type discriminant.
    pub form_number: i32,
    /// Field 3: structure.
    pub structure: ReferenceField,
    /// Field 4: line-font pattern.
    pub line_font_pattern: ReferenceField,
    /// Field 5: level.
    pub level: ReferenceField,
    /// Field 6: view.
    pub view: ReferenceField,
    /// Field 7: transformation matrix.
    pub transformation_matrix: ReferenceField,
    /// Field 8: label-display associativity.
    pub label_display_associativity: ReferenceField,
    /// Field 9: status.
    pub status: EntityStatus,
    /// Field 12: line weight (non-negative).
    pub line_weight: u32,
    /// Field 13: color.
    pub color: ReferenceField,
    /// Field 18: entity label, at most 8 characters.
    pub label: String,
    /// Field 19: entity subscript number, at most 8 decimal digits.
    pub subscript: u32,
}

impl DirectoryEntry {
    /// A directory entry with sensible defaults for the given entity
    /// type, form 0, fully independent, visible, no additional
    /// references set.
    pub fn new(entity_type: u16) -> Self {
        Self {
            entity_type,
            form_number: 0,
            structure: ReferenceField::default_field(),
            line_font_pattern: ReferenceField::default_field(),
            level: ReferenceField::default_field(),
            view: ReferenceField::default_field(),
            transformation_matrix: ReferenceField::default_field(),
            label_display_associativity: ReferenceField::default_field(),
            status: EntityStatus::default(),
            line_weight: 0,
            color: ReferenceField::default_field(),
            label: String::new(),
            subscript: 0,
        }
    }

    /// Validate field-level constraints: label length, subscript digit
    /// count, line weight sign. Returns accumulated messages rather
    /// than failing on the first violation.
    pub fn validate(&self) -> Vec<String> {
        let mut messages = Vec::new();
        if self.label.len() > 8 {
            messages.push(format!(
                "entity label {:?} exceeds 8 characters",
                self.label
            ));
        }
        if self.subscript > 99_999_999 {
            messages.push(format!(
                "entity subscript {} exceeds 8 decimal digits",
                self.subscript
            ));
        }
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_directory_entry_is_independent_and_visible() {
        let de = DirectoryEntry::new(100);
        assert!(!de.status.blank);
        assert_eq!(de.status.subordinate, SubordinateEntitySwitch::Independent);
        assert!(de.validate().is_empty());
    }

    #[test]
    fn overlong_label_fails_validation() {
        let mut de = DirectoryEntry::new(100);
        de.label = "TOOLONGLABEL".to_string();
        assert_eq!(de.validate().len(), 1);
    }
}
