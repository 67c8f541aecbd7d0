//! Object identity: stable 128-bit [`ObjectID`]s and the process-wide
//! [`IdGenerator`] that mints them and their reusable small-integer
//! aliases.
//!
//! See `SPEC_FULL.md` §3/§4.1 and `original_source/include/igesio/
//! common/id_generator.h` for the model this module implements.

mod generator;
mod object_id;

pub use generator::IdGenerator;
pub use object_id::{ObjectID, ObjectKind};
