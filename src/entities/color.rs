//! Color definition entity (type 314).
//!
//! Grounded on `original_source/include/igesio/entities/structures/color_definition.h`
//! and its `.cpp`: an RGB percentage triple (each component in `[0,
//! 100]`, not `[0, 1]` or `[0, 255]`) plus an optional color name, and
//! a closest-standard-color helper used when a new `ColorDefinition`
//! is built programmatically (the DE color field itself then carries
//! that standard color number rather than pointing back at this
//! entity).

use serde::{Deserialize, Serialize};

use crate::entities::directory_entry::DirectoryEntry;
use crate::entities::entity_base::{Entity, EntityBase, EntityKind};
use crate::entities::interfaces::ColorDefinition;
use crate::entities::parameter_vector::{Parameter, ParameterVector};
use crate::error::{IgesError, Result, ValidationResult};
use crate::identity::ObjectID;

/// The IGES DE-field-13 standard color catalog, index order matching
/// `original_source`'s `kColorVectors`.
pub const STANDARD_COLOR_VECTORS: [[f64; 3]; 9] = [
    [0.0, 0.0, 0.0],
    [0.0, 0.0, 0.0],
    [100.0, 0.0, 0.0],
    [0.0, 100.0, 0.0],
    [0.0, 0.0, 100.0],
    [100.0, 100.0, 0.0],
    [100.0, 0.0, 100.0],
    [0.0, 100.0, 100.0],
    [100.0, 100.0, 100.0],
];

/// A color-definition entity (type 314, form 0): an RGB percentage
/// triple plus an optional name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorDefinitionEntity {
    base: EntityBase,
    rgb: [f64; 3],
    name: Option<String>,
}

impl ColorDefinitionEntity {
    /// Construct from an RGB percentage triple and optional name.
    pub fn new(id: ObjectID, rgb: [f64; 3], name: Option<String>) -> Self {
        let base = EntityBase::new(id, EntityKind::ColorDefinition, DirectoryEntry::new(314));
        Self { base, rgb, name }
    }

    /// Construct from the main parameter vector: 3 reals, plus an
    /// optional trailing name string.
    pub fn from_parameters(id: ObjectID, params: &ParameterVector) -> Result<Self> {
        if params.len() < 3 {
            return Err(IgesError::DataFormatError(
                "color definition requires 3 or 4 parameters".to_string(),
            ));
        }
        let rgb = [params.real(0)?, params.real(1)?, params.real(2)?];
        let name = if params.len() >= 4 {
            params.string(3).ok().map(|s| s.to_string())
        } else {
            None
        };
        Ok(Self::new(id, rgb, name))
    }

    /// The color name, if one was supplied.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The RGB percentage triple rescaled to `[0.0, 1.0]`.
    pub fn rgb_fraction(&self) -> (f64, f64, f64) {
        (self.rgb[0] / 100.0, self.rgb[1] / 100.0, self.rgb[2] / 100.0)
    }

    /// The index (1-8) of the standard catalog color closest to this
    /// one by Euclidean distance in percentage space, used to populate
    /// a referencing entity's DE color field when no explicit pointer
    /// is wanted.
    pub fn closest_standard_color(&self) -> u32 {
        let mut best_index = 0u32;
        let mut best_distance = f64::MAX;
        for (i, candidate) in STANDARD_COLOR_VECTORS.iter().enumerate().skip(1) {
            let d = ((self.rgb[0] - candidate[0]).powi(2)
                + (self.rgb[1] - candidate[1]).powi(2)
                + (self.rgb[2] - candidate[2]).powi(2))
            .sqrt();
            if d < best_distance {
                best_distance = d;
                best_index = i as u32;
            }
        }
        best_index
    }
}

impl Entity for ColorDefinitionEntity {
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
        let mut params = ParameterVector::from_values([
            Parameter::Real(self.rgb[0]),
            Parameter::Real(self.rgb[1]),
            Parameter::Real(self.rgb[2]),
        ]);
        if let Some(name) = &self.name {
            params.push(Parameter::String(name.clone()));
        }
        params
    }

    fn validate_pd(&self) -> ValidationResult {
        let mut result = ValidationResult::ok();
        for (label, value) in [("red", self.rgb[0]), ("green", self.rgb[1]), ("blue", self.rgb[2])] {
            if !(0.0..=100.0).contains(&value) {
                result.push(format!("{label} component {value} is out of range [0, 100]"));
            }
        }
        result
    }
}

impl ColorDefinition for ColorDefinitionEntity {
    fn rgb_percent(&self) -> (f64, f64, f64) {
        (self.rgb[0], self.rgb[1], self.rgb[2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{IdGenerator, ObjectKind};

    fn new_id() -> ObjectID {
        IdGenerator::generate_entity(ObjectKind::EntityNew, 314).unwrap().0
    }

    #[test]
    fn rgb_fraction_rescales_to_unit_interval() {
        let color = ColorDefinitionEntity::new(new_id(), [100.0, 0.0, 50.0], None);
        assert_eq!(color.rgb_fraction(), (1.0, 0.0, 0.5));
    }

    #[test]
    fn out_of_range_component_fails_validation() {
        let color = ColorDefinitionEntity::new(new_id(), [150.0, 0.0, 0.0], None);
        assert!(!color.validate_pd().is_valid());
    }

    #[test]
    fn closest_standard_color_matches_pure_red() {
        let color = ColorDefinitionEntity::new(new_id(), [100.0, 0.0, 0.0], None);
        assert_eq!(color.closest_standard_color(), 2);
    }

    #[test]
    fn name_round_trips_through_parameters() {
        let id = new_id();
        let color = ColorDefinitionEntity::new(id, [10.0, 20.0, 30.0], Some("SKY".to_string()));
        let rebuilt = ColorDefinitionEntity::from_parameters(id, &color.main_pd_parameters()).unwrap();
        assert_eq!(rebuilt.name(), Some("SKY"));
    }
}
