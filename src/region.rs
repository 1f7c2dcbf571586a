//! Axis-aligned mine regions

use glam::{DVec3, IVec3};

/// The rectangular volume a mine occupies, spanned by two world-space corners.
///
/// Corners are stored exactly as given and need not be ordered; every consumer
/// normalizes to per-axis (min, max) first. Immutable after construction - a
/// mine that moves gets a new region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionVolume {
    world: String,
    corner_a: IVec3,
    corner_b: IVec3,
}

impl RegionVolume {
    pub fn new(world: impl Into<String>, corner_a: IVec3, corner_b: IVec3) -> Self {
        Self {
            world: world.into(),
            corner_a,
            corner_b,
        }
    }

    pub fn world(&self) -> &str {
        &self.world
    }

    /// The corners as given at construction (unordered).
    pub fn corners(&self) -> (IVec3, IVec3) {
        (self.corner_a, self.corner_b)
    }

    /// Per-axis (min, max) bounds.
    pub fn normalize(&self) -> (IVec3, IVec3) {
        (
            self.corner_a.min(self.corner_b),
            self.corner_a.max(self.corner_b),
        )
    }

    /// True iff `point` is in this region's world and inside its bounds.
    /// World coordinates are floored to their block cell before comparison.
    pub fn contains(&self, world: &str, point: DVec3) -> bool {
        let block = IVec3::new(
            point.x.floor() as i32,
            point.y.floor() as i32,
            point.z.floor() as i32,
        );
        self.contains_block(world, block)
    }

    /// Inclusive bounds check against an integer block coordinate.
    pub fn contains_block(&self, world: &str, block: IVec3) -> bool {
        if world != self.world {
            return false;
        }
        let (min, max) = self.normalize();
        block.x >= min.x
            && block.x <= max.x
            && block.y >= min.y
            && block.y <= max.y
            && block.z >= min.z
            && block.z <= max.z
    }

    /// Number of blocks in the region, extents inclusive.
    pub fn volume(&self) -> i64 {
        let (min, max) = self.normalize();
        let ext = max - min + IVec3::ONE;
        ext.x as i64 * ext.y as i64 * ext.z as i64
    }
}
