//! Typed heterogeneous Parameter-Data values.
//!
//! Grounded on `original_source/include/igesio/common/iges_parameter_vector.h`
//! (not read verbatim in this pass, but its role is fixed by `SPEC_FULL.md`
//! §3 "Parameter vector"): a PD record is a flat ordered sequence of
//! typed values — integer, real, string, logical, or an object
//! reference — each carrying an optional formatting hint so textual
//! round-trips preserve the source file's number width/precision.

use serde::{Deserialize, Serialize};

use crate::error::{IgesError, Result};
use crate::identity::ObjectID;

/// A single typed Parameter-Data value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Parameter {
    /// An integer value.
    Integer(i64),
    /// A real (floating point) value.
    Real(f64),
    /// A Hollerith string value.
    String(String),
    /// A logical (boolean) value.
    Logical(bool),
    /// A reference to another entity, by small-integer DE pointer sign
    /// convention resolved to a stable [`ObjectID`].
    Pointer(ObjectID),
}

/// Per-element formatting hint preserved across a read/write cycle.
///
/// `width`/`precision` follow IGES's column-oriented free-format
/// real-number convention; `scientific` selects `E`-exponent notation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FormatHint {
    /// Minimum field width, if the source specified one.
    pub width: Option<u8>,
    /// Digits after the decimal point, if the source specified one.
    pub precision: Option<u8>,
    /// Whether the source used scientific notation.
    pub scientific: bool,
}

/// One parameter value plus its formatting hint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterElement {
    /// The typed value.
    pub value: Parameter,
    /// Formatting hint to preserve on re-serialization.
    pub hint: FormatHint,
}

impl From<Parameter> for ParameterElement {
    fn from(value: Parameter) -> Self {
        Self {
            value,
            hint: FormatHint::default(),
        }
    }
}

/// An ordered sequence of [`ParameterElement`]s: the normalized form of
/// one Parameter-Data record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterVector {
    elements: Vec<ParameterElement>,
}

impl ParameterVector {
    /// An empty parameter vector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from plain values, each given a default formatting hint.
    pub fn from_values(values: impl IntoIterator<Item = Parameter>) -> Self {
        Self {
            elements: values.into_iter().map(ParameterElement::from).collect(),
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the vector has no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Append a value with a default formatting hint.
    pub fn push(&mut self, value: Parameter) {
        self.elements.push(ParameterElement::from(value));
    }

    /// Append a value with an explicit formatting hint.
    pub fn push_with_hint(&mut self, value: Parameter, hint: FormatHint) {
        self.elements.push(ParameterElement { value, hint });
    }

    /// Truncate to the first `len` elements (used when splitting off
    /// trailing additional-pointer groups).
    pub fn truncate(&mut self, len: usize) {
        self.elements.truncate(len);
    }

    /// All elements after index `from` (used to read additional-pointer
    /// groups off the tail of a raw PD record).
    pub fn tail(&self, from: usize) -> &[ParameterElement] {
        &self.elements[from.min(self.elements.len())..]
    }

    /// The element at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&ParameterElement> {
        self.elements.get(index)
    }

    /// Preserve `hint` at `index` while replacing the typed value, if
    /// `index` is in range and the vector's length did not change —
    /// matches the round-trip invariant that setters preserve
    /// formatting hints across rewrites of equal length.
    pub fn set_preserving_hint(&mut self, index: usize, value: Parameter) -> Result<()> {
        let el = self.elements.get_mut(index).ok_or_else(|| {
            IgesError::OutOfRange(format!("parameter index {index} out of range"))
        })?;
        el.value = value;
        Ok(())
    }

    /// The integer at `index`, or a [`IgesError::TypeConversionError`]
    /// if absent or not an integer.
    pub fn integer(&self, index: usize) -> Result<i64> {
        match self.get(index).map(|e| &e.value) {
            Some(Parameter::Integer(v)) => Ok(*v),
            Some(other) => Err(IgesError::TypeConversionError(format!(
                "expected Integer at index {index}, found {other:?}"
            ))),
            None => Err(IgesError::DataFormatError(format!(
                "missing parameter at index {index}"
            ))),
        }
    }

    /// The real at `index` (integers widen), or a type-conversion error.
    pub fn real(&self, index: usize) -> Result<f64> {
        match self.get(index).map(|e| &e.value) {
            Some(Parameter::Real(v)) => Ok(*v),
            Some(Parameter::Integer(v)) => Ok(*v as f64),
            Some(other) => Err(IgesError::TypeConversionError(format!(
                "expected Real at index {index}, found {other:?}"
            ))),
            None => Err(IgesError::DataFormatError(format!(
                "missing parameter at index {index}"
            ))),
        }
    }

    /// The string at `index`, or a type-conversion error.
    pub fn string(&self, index: usize) -> Result<&str> {
        match self.get(index).map(|e| &e.value) {
            Some(Parameter::String(v)) => Ok(v.as_str()),
            Some(other) => Err(IgesError::TypeConversionError(format!(
                "expected String at index {index}, found {other:?}"
            ))),
            None => Err(IgesError::DataFormatError(format!(
                "missing parameter at index {index}"
            ))),
        }
    }

    /// The logical at `index`, or a type-conversion error.
    pub fn logical(&self, index: usize) -> Result<bool> {
        match self.get(index).map(|e| &e.value) {
            Some(Parameter::Logical(v)) => Ok(*v),
            Some(other) => Err(IgesError::TypeConversionError(format!(
                "expected Logical at index {index}, found {other:?}"
            ))),
            None => Err(IgesError::DataFormatError(format!(
                "missing parameter at index {index}"
            ))),
        }
    }

    /// The pointer at `index`, or a type-conversion error.
    pub fn pointer(&self, index: usize) -> Result<ObjectID> {
        match self.get(index).map(|e| &e.value) {
            Some(Parameter::Pointer(v)) => Ok(*v),
            Some(other) => Err(IgesError::TypeConversionError(format!(
                "expected Pointer at index {index}, found {other:?}"
            ))),
            None => Err(IgesError::DataFormatError(format!(
                "missing parameter at index {index}"
            ))),
        }
    }

    /// Iterate the contained elements.
    pub fn iter(&self) -> impl Iterator<Item = &ParameterElement> {
        self.elements.iter()
    }
}

impl FromIterator<Parameter> for ParameterVector {
    fn from_iter<T: IntoIterator<Item = Parameter>>(iter: T) -> Self {
        Self::from_values(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_accessors_round_trip() {
        let mut v = ParameterVector::new();
        v.push(Parameter::Integer(100));
        v.push(Parameter::Real(3.5));
        v.push(Parameter::String("ARC".to_string()));
        assert_eq!(v.integer(0).unwrap(), 100);
        assert_eq!(v.real(1).unwrap(), 3.5);
        assert_eq!(v.string(2).unwrap(), "ARC");
    }

    #[test]
    fn wrong_type_is_a_conversion_error() {
        let v = ParameterVector::from_values([Parameter::String("x".to_string())]);
        assert!(v.integer(0).is_err());
    }

    #[test]
    fn set_preserving_hint_keeps_hint() {
        let mut v = ParameterVector::new();
        v.push_with_hint(
            Parameter::Real(1.0),
            FormatHint {
                width: Some(12),
                precision: Some(6),
                scientific: true,
            },
        );
        v.set_preserving_hint(0, Parameter::Real(2.0)).unwrap();
        assert_eq!(v.real(0).unwrap(), 2.0);
        assert_eq!(v.get(0).unwrap().hint.width, Some(12));
    }
}
