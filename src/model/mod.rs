//! The model container: the entity map and file-level defaults a
//! single IGES model is built from.

pub mod container;
pub mod global_section;

pub use container::Model;
pub use global_section::GlobalParameters;
