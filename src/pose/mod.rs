pub mod geometry;
pub mod landmark;

pub use geometry::{angle_between, midpoint, tilt_from_vertical, Point2};
pub use landmark::{Landmark, LandmarkFrame, LandmarkIndex};
