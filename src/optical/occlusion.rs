//! Line-of-sight tests.
//!
//! Sensors only need a yes/no answer to "does anything block this segment",
//! so the seam is a single-method trait. Closures with the matching
//! signature implement it, which is how a host scene can plug in its own
//! raycaster.

use nalgebra::{Unit, Vector3};

/// Answers whether a segment starting at `origin`, running along `direction`
/// for `max_distance`, hits an obstruction.
pub trait Occluder {
    fn blocks(
        &self,
        origin: &Vector3<f64>,
        direction: &Unit<Vector3<f64>>,
        max_distance: f64,
    ) -> bool;
}

impl<F> Occluder for F
where
    F: Fn(&Vector3<f64>, &Unit<Vector3<f64>>, f64) -> bool,
{
    fn blocks(
        &self,
        origin: &Vector3<f64>,
        direction: &Unit<Vector3<f64>>,
        max_distance: f64,
    ) -> bool {
        self(origin, direction, max_distance)
    }
}

/// Empty scene.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoObstructions;

impl Occluder for NoObstructions {
    fn blocks(&self, _: &Vector3<f64>, _: &Unit<Vector3<f64>>, _: f64) -> bool {
        false
    }
}

/// Axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vector3<f64>,
    pub max: Vector3<f64>,
}

impl Aabb {
    /// Corners in any order.
    pub fn new(a: Vector3<f64>, b: Vector3<f64>) -> Self {
        Self {
            min: a.inf(&b),
            max: a.sup(&b),
        }
    }

    /// Slab test against the segment `[0, max_distance]` along the ray.
    pub fn intersects(
        &self,
        origin: &Vector3<f64>,
        direction: &Unit<Vector3<f64>>,
        max_distance: f64,
    ) -> bool {
        let mut t_enter = 0.0_f64;
        let mut t_exit = max_distance;

        for axis in 0..3 {
            let o = origin[axis];
            let d = direction[axis];
            if d.abs() < 1e-12 {
                if o < self.min[axis] || o > self.max[axis] {
                    return false;
                }
                continue;
            }
            let t1 = (self.min[axis] - o) / d;
            let t2 = (self.max[axis] - o) / d;
            t_enter = t_enter.max(t1.min(t2));
            t_exit = t_exit.min(t1.max(t2));
            if t_enter > t_exit {
                return false;
            }
        }
        true
    }
}

/// Height-adjustable wall standing on `base_y`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wall {
    /// Footprint corners in the XZ plane.
    pub footprint_min: (f64, f64),
    pub footprint_max: (f64, f64),
    pub base_y: f64,
    height: f64,
}

impl Wall {
    pub const HEIGHT_STEP: f64 = 0.1;
    pub const MIN_HEIGHT: f64 = 0.0;
    pub const MAX_HEIGHT: f64 = 4.0;

    pub fn new(
        footprint_min: (f64, f64),
        footprint_max: (f64, f64),
        base_y: f64,
        height: f64,
    ) -> Self {
        Self {
            footprint_min: (
                footprint_min.0.min(footprint_max.0),
                footprint_min.1.min(footprint_max.1),
            ),
            footprint_max: (
                footprint_min.0.max(footprint_max.0),
                footprint_min.1.max(footprint_max.1),
            ),
            base_y,
            height: height.clamp(Self::MIN_HEIGHT, Self::MAX_HEIGHT),
        }
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn set_height(&mut self, height: f64) {
        self.height = height.clamp(Self::MIN_HEIGHT, Self::MAX_HEIGHT);
    }

    /// One step up, saturating at [`Wall::MAX_HEIGHT`].
    pub fn raise(&mut self) -> f64 {
        self.set_height(self.height + Self::HEIGHT_STEP);
        self.height
    }

    /// One step down, saturating at [`Wall::MIN_HEIGHT`].
    pub fn lower(&mut self) -> f64 {
        self.set_height(self.height - Self::HEIGHT_STEP);
        self.height
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(
            Vector3::new(self.footprint_min.0, self.base_y, self.footprint_min.1),
            Vector3::new(
                self.footprint_max.0,
                self.base_y + self.height,
                self.footprint_max.1,
            ),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Obstruction {
    Sphere { center: Vector3<f64>, radius: f64 },
    Box(Aabb),
    Wall(Wall),
}

impl Obstruction {
    pub fn intersects(
        &self,
        origin: &Vector3<f64>,
        direction: &Unit<Vector3<f64>>,
        max_distance: f64,
    ) -> bool {
        match self {
            Obstruction::Sphere { center, radius } => {
                let oc = origin - center;
                let b = direction.dot(&oc);
                let c = oc.norm_squared() - radius * radius;
                let disc = b * b - c;
                if disc < 0.0 {
                    return false;
                }
                let root = disc.sqrt();
                let t_near = -b - root;
                let t_far = -b + root;
                t_far >= 0.0 && t_near <= max_distance
            }
            Obstruction::Box(aabb) => aabb.intersects(origin, direction, max_distance),
            Obstruction::Wall(wall) => {
                wall.height() > 0.0 && wall.bounds().intersects(origin, direction, max_distance)
            }
        }
    }
}

/// A static collection of obstructions.
#[derive(Debug, Clone, Default)]
pub struct ObstructionSet {
    obstructions: Vec<Obstruction>,
}

impl ObstructionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an obstruction and returns its index.
    pub fn push(&mut self, obstruction: Obstruction) -> usize {
        self.obstructions.push(obstruction);
        self.obstructions.len() - 1
    }

    pub fn len(&self) -> usize {
        self.obstructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstructions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Obstruction> {
        self.obstructions.iter()
    }

    /// The wall at `index`, if that obstruction is a wall.
    pub fn wall_mut(&mut self, index: usize) -> Option<&mut Wall> {
        match self.obstructions.get_mut(index) {
            Some(Obstruction::Wall(wall)) => Some(wall),
            _ => None,
        }
    }
}

impl Occluder for ObstructionSet {
    fn blocks(
        &self,
        origin: &Vector3<f64>,
        direction: &Unit<Vector3<f64>>,
        max_distance: f64,
    ) -> bool {
        self.obstructions
            .iter()
            .any(|o| o.intersects(origin, direction, max_distance))
    }
}
