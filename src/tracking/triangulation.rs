//! Multi-ray triangulation from bearing-only readings.
//!
//! 1. Each valid reading is decoded back into a world-space ray from the
//!    sensor origin (inverse of the bearing encoding).
//! 2. Every unordered pair of rays yields the midpoint of its closest-point
//!    pair (origin midpoint for parallel rays).
//! 3. The position is the mean of all pairwise estimates.
//!
//! The mean over pairs is biased under noise and does no outlier rejection,
//! but it is simple and never produces NaN for finite input. Orientation is
//! not observable from bearings and is not estimated here.

use nalgebra::Vector3;
use thiserror::Error;
use tracing::debug;

use crate::geometry::{Ray, closest_point_between, direction_at_bearing};
use crate::optical::BearingReading;

/// Fewest rays that define a position.
pub const MIN_RAYS: usize = 2;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TriangulationError {
    #[error("triangulation needs at least 2 rays, got {count}")]
    InsufficientRays { count: usize },
}

/// Triangulated position with a little diagnostic context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangulationEstimate {
    pub position: Vector3<f64>,
    pub num_rays: usize,
    pub num_pairs: usize,
    /// Mean distance of the pairwise estimates from `position` (m). Zero when
    /// all rays agree.
    pub spread: f64,
}

/// Outcome of one engine update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriangulationOutcome {
    Updated(TriangulationEstimate),
    /// Too few valid readings; the previous estimate stands.
    NoUpdate { num_rays: usize },
}

/// World-space ray for a valid reading, `None` for an invalid one.
pub fn ray_from_reading(reading: &BearingReading) -> Option<Ray> {
    let bearing = reading.bearing()?;
    Some(Ray::from_unit(
        reading.origin,
        direction_at_bearing(&reading.orientation, &bearing),
    ))
}

/// Mean of pairwise closest points over all unordered ray pairs.
///
/// Calling this with fewer than [`MIN_RAYS`] rays is a contract violation and
/// is reported as an error rather than answered with a stale value.
pub fn triangulate(rays: &[Ray]) -> Result<TriangulationEstimate, TriangulationError> {
    if rays.len() < MIN_RAYS {
        return Err(TriangulationError::InsufficientRays { count: rays.len() });
    }

    let mut pair_points = Vec::with_capacity(rays.len() * (rays.len() - 1) / 2);
    for (i, a) in rays.iter().enumerate() {
        for b in &rays[i + 1..] {
            pair_points.push(closest_point_between(a, b));
        }
    }

    let num_pairs = pair_points.len();
    let position = pair_points.iter().sum::<Vector3<f64>>() / num_pairs as f64;
    let spread = pair_points
        .iter()
        .map(|p| (p - position).norm())
        .sum::<f64>()
        / num_pairs as f64;

    Ok(TriangulationEstimate {
        position,
        num_rays: rays.len(),
        num_pairs,
        spread,
    })
}

/// Stateful wrapper that keeps the last good estimate.
#[derive(Debug, Clone, Default)]
pub struct TriangulationEngine {
    last_estimate: Option<TriangulationEstimate>,
}

impl TriangulationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_estimate(&self) -> Option<&TriangulationEstimate> {
        self.last_estimate.as_ref()
    }

    /// Triangulate from whichever readings are valid.
    pub fn update(&mut self, readings: &[BearingReading]) -> TriangulationOutcome {
        let rays: Vec<Ray> = readings.iter().filter_map(ray_from_reading).collect();

        match triangulate(&rays) {
            Ok(estimate) => {
                debug!(
                    "[Triangulation] {} rays, {} pairs -> [{:.3}, {:.3}, {:.3}] spread={:.4}m",
                    estimate.num_rays,
                    estimate.num_pairs,
                    estimate.position.x,
                    estimate.position.y,
                    estimate.position.z,
                    estimate.spread
                );
                self.last_estimate = Some(estimate);
                TriangulationOutcome::Updated(estimate)
            }
            Err(TriangulationError::InsufficientRays { count }) => {
                TriangulationOutcome::NoUpdate { num_rays: count }
            }
        }
    }

    pub fn reset(&mut self) {
        self.last_estimate = None;
    }
}
