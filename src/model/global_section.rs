//! File-level defaults shared across every entity in a model.
//!
//! Grounded on the reference architecture's `io::iges::GlobalSection`,
//! minus the textual delimiter fields (those belong to an external
//! IGES reader/writer, not the geometric core).

use serde::{Deserialize, Serialize};

/// File-level parameters a [`super::Model`] carries alongside its
/// entity map: units, resolution, and provenance metadata that entity
/// validators and discretization routines consult.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalParameters {
    /// Sending system/application product identification.
    pub product_id_sender: String,
    /// Name of the file as known to the sending system.
    pub file_name: String,
    /// Native CAD system identification.
    pub native_system_id: String,
    /// Preprocessor version string.
    pub preprocessor_version: String,
    /// Number of bits in an integer on the sending system.
    pub integer_bits: u32,
    /// Largest single-precision exponent magnitude.
    pub single_precision_magnitude: f64,
    /// Single-precision significant digits.
    pub single_precision_significance: u32,
    /// Largest double-precision exponent magnitude.
    pub double_precision_magnitude: f64,
    /// Double-precision significant digits.
    pub double_precision_significance: u32,
    /// Receiving system/application product identification.
    pub product_id_receiver: String,
    /// Model space scale factor.
    pub model_space_scale: f64,
    /// Units flag (IGES table, e.g. `2` = millimeters).
    pub units_flag: u32,
    /// Units name, paired with `units_flag`.
    pub units_name: String,
    /// Maximum line weight in model units.
    pub max_line_weight: f64,
    /// File generation date and time.
    pub date_time: String,
    /// Minimum user-intended resolution/granularity.
    pub min_resolution: f64,
    /// Maximum coordinate value used in the file, if known.
    pub max_coordinate: f64,
    /// Author name.
    pub author: String,
    /// Author's organization.
    pub organization: String,
    /// IGES specification version flag.
    pub iges_version: u32,
    /// Drafting standard flag.
    pub drafting_standard: u32,
    /// Date the model was last modified.
    pub modified_date: String,
}

impl Default for GlobalParameters {
    fn default() -> Self {
        Self {
            product_id_sender: String::new(),
            file_name: String::new(),
            native_system_id: String::new(),
            preprocessor_version: String::new(),
            integer_bits: 32,
            single_precision_magnitude: 10.0,
            single_precision_significance: 6,
            double_precision_magnitude: 10.0,
            double_precision_significance: 15,
            product_id_receiver: String::new(),
            model_space_scale: 1.0,
            units_flag: 2,
            units_name: "MM".to_string(),
            max_line_weight: 1.0,
            date_time: String::new(),
            min_resolution: 1e-6,
            max_coordinate: 1e6,
            author: String::new(),
            organization: String::new(),
            iges_version: 11,
            drafting_standard: 0,
            modified_date: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_parameters_report_millimeters() {
        let params = GlobalParameters::default();
        assert_eq!(params.units_flag, 2);
        assert_eq!(params.units_name, "MM");
    }
}
