//! # igeskernel
//!
//! A geometric-entity model and evaluation kernel for IGES (v5.3) CAD
//! files: stable object identity, an oriented bounding-box algebra, a
//! directory-entry/parameter-data entity model, and curve/surface
//! evaluation (point, derivative, curvature) for the entity kinds
//! `SPEC_FULL.md` names.
//!
//! ## Architecture
//!
//! - `error`: the crate's error taxonomy and non-throwing validation reports
//! - `identity`: stable [`identity::ObjectID`]s and the process-wide small-integer allocator
//! - `numerics`: oriented bounding-box algebra
//! - `core`: vector/matrix primitives, precision tolerances, rays and planes
//! - `entities`: the directory-entry/parameter-data entity model and its curve/surface kinds
//! - `algorithms`: discretization, arc length, and curvature
//! - `model`: the global-parameters record and the entity container

#![warn(missing_docs)]
#![warn(clippy::all)]

// Error taxonomy and validation reports
pub mod error;

// Object identity service
pub mod identity;

// Oriented bounding-box algebra
pub mod numerics;

// Core modules - foundational math and primitives
pub mod core;

// Entity model: directory entries, parameter vectors, curves, surfaces
pub mod entities;

// Discretization and curvature algorithms
pub mod algorithms;

// Global parameters and the entity container
pub mod model;

// Re-export commonly used types
pub use core::{
    math::{Matrix3, Matrix4, Quaternion, Transform2D, Transform3D, Vector2, Vector3, Vector4},
    precision::{ApproxEq, EPSILON, EPSILON_FINE, EPSILON_NORMAL, EPSILON_ROUGH},
    primitives::{Plane, Point2, Point3, Ray2, Ray3},
};
pub use entities::{
    build_entity, is_supported, ColorDefinitionEntity, Curve, Entity, EntityKind, NullEntity, Surface,
    TransformationMatrix,
};
pub use error::{IgesError, Result, ValidationResult};
pub use identity::{IdGenerator, ObjectID, ObjectKind};
pub use model::{GlobalParameters, Model};
pub use numerics::{BoundingBox, DirectionKind};

/// Re-export version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-export crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
