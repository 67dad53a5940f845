//! Geometry utilities: poses, rays, bearing parameterization.

pub mod pose;
pub mod rays;

pub use pose::Pose;
pub use rays::{
    Bearing, PARALLEL_EPSILON, Ray, bearing_to_local, closest_point_between, direction_at_bearing,
};
