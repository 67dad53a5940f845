//! Open-loop position propagation between optical fixes.

use nalgebra::Vector3;

/// Euler dead-reckoning from the last fused position.
///
/// There is no correction between fixes, so error grows without bound for
/// as long as optical tracking stays unavailable.
#[derive(Debug, Clone, Default)]
pub struct DeadReckoner {
    last_fix: Option<Vector3<f64>>,
    since_fix: f64,
}

impl DeadReckoner {
    pub fn new() -> Self {
        Self::default()
    }

    /// `from + velocity * dt`, or `from` for a non-positive `dt`.
    pub fn extrapolate(from: &Vector3<f64>, velocity: &Vector3<f64>, dt: f64) -> Vector3<f64> {
        if dt > 0.0 {
            from + velocity * dt
        } else {
            *from
        }
    }

    /// Record an externally corrected position.
    pub fn fix(&mut self, position: Vector3<f64>) {
        self.last_fix = Some(position);
        self.since_fix = 0.0;
    }

    /// Propagate `from` by one tick and account the elapsed time.
    pub fn advance(
        &mut self,
        from: &Vector3<f64>,
        velocity: &Vector3<f64>,
        dt: f64,
    ) -> Vector3<f64> {
        if dt > 0.0 {
            self.since_fix += dt;
        }
        Self::extrapolate(from, velocity, dt)
    }

    /// Seconds since the last fix, `None` before the first one.
    pub fn time_since_fix(&self) -> Option<f64> {
        self.last_fix.map(|_| self.since_fix)
    }

    pub fn last_fix(&self) -> Option<&Vector3<f64>> {
        self.last_fix.as_ref()
    }

    pub fn reset(&mut self) {
        self.last_fix = None;
        self.since_fix = 0.0;
    }
}
