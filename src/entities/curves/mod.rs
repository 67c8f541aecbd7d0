//! Concrete curve entity kinds, each implementing
//! [`crate::entities::interfaces::Curve`] and
//! [`crate::entities::entity_base::Entity`].

pub mod circular_arc;
pub mod composite_curve;
pub mod conic_arc;
pub mod copious_data;
pub mod curve_on_surface;
pub mod line;
pub mod nurbs_curve;
pub mod parametric_spline;

pub use circular_arc::CircularArc;
pub use composite_curve::CompositeCurve;
pub use conic_arc::{ConicArc, ConicCoefficients, ConicKind};
pub use copious_data::{CopiousData, CopiousDataForm};
pub use curve_on_surface::CurveOnSurface;
pub use line::{Line, LineForm};
pub use nurbs_curve::{NurbsCurve, RationalCurveForm};
pub use parametric_spline::{ParametricSplineCurve, SplineSegment};
