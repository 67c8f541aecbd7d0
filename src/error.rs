//! Error taxonomy and validation reporting for the geometry kernel.
//!
//! Mirrors the reference architecture's `io::iges::IgesError` pattern
//! (a `thiserror`-derived enum with one variant per failure kind) but
//! scoped to the core's own taxonomy rather than textual-format parsing.

use thiserror::Error;

/// Errors produced by the entity graph, evaluation kernel, and identity
/// service.
#[derive(Debug, Error)]
pub enum IgesError {
    /// Parameter count/shape wrong, or a field value does not conform
    /// to its entity/form-number (e.g. an ellipse form with hyperbolic
    /// coefficients, an invalid enum code).
    #[error("data format error: {0}")]
    DataFormatError(String),

    /// A parameter-vector element had the wrong dynamic type (e.g. a
    /// string where a real was expected).
    #[error("type conversion error: {0}")]
    TypeConversionError(String),

    /// A DE-pointer was not present in the DE-to-ObjectID map, or a
    /// small-integer ID was not found.
    #[error("out of range: {0}")]
    OutOfRange(String),

    /// A null pointer was passed to a setter, or a reservation ID did
    /// not match.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The requested operation is not supported for this entity (e.g.
    /// third-order hyperbolic derivatives).
    #[error("not implemented: {0}")]
    NotImplementedError(String),

    /// Internal inconsistency — an invariant the kernel itself should
    /// have upheld was violated. Should never be observed by end
    /// users; if it is, it is a bug in this crate.
    #[error("internal invariant violated: {0}")]
    ImplementationError(&'static str),
}

/// Result alias used throughout the kernel.
pub type Result<T> = std::result::Result<T, IgesError>;

/// A composable validation report.
///
/// Unlike [`IgesError`], this never represents a thrown error: entity
/// and model validation *collects* problems instead of failing on the
/// first one, per the "validation never throws; it collects" rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    messages: Vec<String>,
}

impl ValidationResult {
    /// A report with no problems.
    pub fn ok() -> Self {
        Self::default()
    }

    /// A report with a single problem message.
    pub fn err(message: impl Into<String>) -> Self {
        let mut result = Self::default();
        result.push(message);
        result
    }

    /// Append a problem message.
    pub fn push(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    /// Merge another report's messages into this one.
    pub fn merge(&mut self, other: ValidationResult) {
        self.messages.extend(other.messages);
    }

    /// Whether the entity/model this report describes is valid.
    pub fn is_valid(&self) -> bool {
        self.messages.is_empty()
    }

    /// The collected problem messages.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_report_is_valid() {
        assert!(ValidationResult::ok().is_valid());
    }

    #[test]
    fn merge_accumulates_messages() {
        let mut a = ValidationResult::err("bad radius");
        let b = ValidationResult::err("bad center");
        a.merge(b);
        assert!(!a.is_valid());
        assert_eq!(a.messages().len(), 2);
    }
}
