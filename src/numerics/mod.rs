//! Numeric primitives beyond plain vector/matrix algebra: the oriented
//! [`bounding_box::BoundingBox`] used throughout the entity model for
//! spatial queries.

pub mod bounding_box;

pub use bounding_box::{BoundingBox, DirectionKind};
