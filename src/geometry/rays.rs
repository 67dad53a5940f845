//! Rays, closest points between skew lines, and the bearing parameterization
//! shared by the optical sensors (encode) and the triangulation engine
//! (decode).
//!
//! A bearing is a pair of angles measured in the sensor's local frame:
//!
//! ```text
//! horizontal = atan2(x, z)
//! vertical   = atan2(y, z)
//! ```
//!
//! This is not a spherical azimuth/elevation pair. Decoding must invert the
//! same parameterization, so both directions live in this module.

use nalgebra::{Unit, UnitQuaternion, Vector3};

/// Squared cross-product norm below which two unit directions are treated
/// as parallel.
pub const PARALLEL_EPSILON: f64 = 1e-6;

/// Half-line starting at `origin` along a unit `direction`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vector3<f64>,
    pub direction: Unit<Vector3<f64>>,
}

impl Ray {
    /// Returns `None` if `direction` has (near) zero length.
    pub fn new(origin: Vector3<f64>, direction: Vector3<f64>) -> Option<Self> {
        let direction = Unit::try_new(direction, 1e-12)?;
        Some(Self { origin, direction })
    }

    pub fn from_unit(origin: Vector3<f64>, direction: Unit<Vector3<f64>>) -> Self {
        Self { origin, direction }
    }

    #[inline]
    pub fn point_at(&self, t: f64) -> Vector3<f64> {
        self.origin + self.direction.into_inner() * t
    }
}

/// Best estimate of the point where two rays meet.
///
/// Returns the midpoint of the closest-point pair between the two lines. If
/// the directions are (near) parallel there is no unique closest pair and the
/// midpoint of the two origins is returned instead.
pub fn closest_point_between(a: &Ray, b: &Ray) -> Vector3<f64> {
    let d1 = a.direction.into_inner();
    let d2 = b.direction.into_inner();
    let cross = d1.cross(&d2);
    let denom = cross.norm_squared();

    if denom < PARALLEL_EPSILON {
        return (a.origin + b.origin) * 0.5;
    }

    // s = ((o2 - o1) × d2)·(d1 × d2) / |d1 × d2|², rewritten with the
    // scalar triple product so both offsets share one cross vector.
    let cross1 = d1.cross(&cross);
    let cross2 = d2.cross(&cross);
    let r = b.origin - a.origin;
    let s = r.dot(&cross2) / denom;
    let t = r.dot(&cross1) / denom;

    (a.point_at(s) + b.point_at(t)) * 0.5
}

/// Horizontal/vertical angle pair (radians) in a sensor's local frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bearing {
    pub horizontal: f64,
    pub vertical: f64,
}

impl Bearing {
    pub fn new(horizontal: f64, vertical: f64) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    pub fn from_degrees(horizontal_deg: f64, vertical_deg: f64) -> Self {
        Self::new(horizontal_deg.to_radians(), vertical_deg.to_radians())
    }

    /// Encode a local-frame direction (need not be normalized).
    pub fn from_local_direction(local: &Vector3<f64>) -> Self {
        Self {
            horizontal: local.x.atan2(local.z),
            vertical: local.y.atan2(local.z),
        }
    }

    pub fn horizontal_deg(&self) -> f64 {
        self.horizontal.to_degrees()
    }

    pub fn vertical_deg(&self) -> f64 {
        self.vertical.to_degrees()
    }
}

/// Decode a bearing into a unit direction in the sensor's local frame.
///
/// Starting from local +Z, yaw by `horizontal` about local up, then pitch
/// about the yawed right axis. The pitch is not `vertical` itself: because
/// `vertical` is measured as atan2(y, z) rather than as an elevation, the
/// elevation that reproduces it is `atan(tan(vertical) * cos(horizontal))`.
///
/// Only bearings in the forward hemisphere (|angles| < 90°) round-trip.
pub fn bearing_to_local(bearing: &Bearing) -> Unit<Vector3<f64>> {
    let elevation = (bearing.vertical.tan() * bearing.horizontal.cos()).atan();
    let yaw = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), bearing.horizontal);
    // Right-handed rotation about +X tilts +Z towards -Y, hence the sign.
    let pitch = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), -elevation);
    Unit::new_normalize((yaw * pitch) * Vector3::z())
}

/// World-frame direction at `bearing` from a sensor with the given orientation.
pub fn direction_at_bearing(
    orientation: &UnitQuaternion<f64>,
    bearing: &Bearing,
) -> Unit<Vector3<f64>> {
    Unit::new_normalize(orientation * bearing_to_local(bearing).into_inner())
}
