//! Generic geometry algorithms built on the `Curve`/`Surface`
//! capability traits: adaptive discretization, arc length, surface
//! area, Frenet frames, and point-line distance.

pub mod curvature;
pub mod discretize;

pub use curvature::{distance_point_to_line, frenet_frame, sampled_bounding_box, FrenetFrame};
pub use discretize::{arc_length, sample_points, sample_points_between, surface_area};
