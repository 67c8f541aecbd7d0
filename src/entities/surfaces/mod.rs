//! Concrete surface entity kinds, each implementing
//! [`crate::entities::interfaces::Surface`] and
//! [`crate::entities::entity_base::Entity`].

pub mod nurbs_surface;
pub mod ruled_surface;
pub mod surface_of_revolution;
pub mod tabulated_cylinder;

pub use nurbs_surface::{NurbsSurface, RationalSurfaceForm};
pub use ruled_surface::RuledSurface;
pub use surface_of_revolution::SurfaceOfRevolution;
pub use tabulated_cylinder::TabulatedCylinder;
