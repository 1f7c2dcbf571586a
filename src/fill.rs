//! Region repopulation through the host world surface

use glam::IVec3;
use rand::Rng;

use crate::distribution::BlockDistribution;
use crate::error::{Error, Result};
use crate::mine::ResetDirection;
use crate::region::RegionVolume;

/// The host engine's block-placement interface.
///
/// Everything behind this trait is opaque to the core. `world_exists` also
/// backs the load-time teleport-anchor check, mirroring how the host resolves
/// world names.
pub trait WorldSurface {
    /// True if the named world is currently loaded.
    fn world_exists(&self, world: &str) -> bool;

    /// Writes one block. Implementations report failures as
    /// [`Error::FillSurface`].
    fn place_block(&mut self, world: &str, pos: IVec3, material: &str) -> Result<()>;
}

/// Stateless region repopulation.
pub struct RegionFiller;

impl RegionFiller {
    /// Assigns a sampled material to every block in `region` exactly once,
    /// layer by layer along Y in the order `direction` dictates. X/Z order
    /// within a layer is an implementation detail.
    ///
    /// Fails before any write when the distribution is unfillable; a write
    /// failure mid-walk surfaces immediately. Returns the blocks written.
    pub fn fill<R: Rng + ?Sized>(
        region: &RegionVolume,
        distribution: &BlockDistribution,
        direction: ResetDirection,
        surface: &mut dyn WorldSurface,
        rng: &mut R,
    ) -> Result<u64> {
        if distribution.is_empty() {
            return Err(Error::Configuration(format!(
                "refusing to fill region in '{}': empty block distribution",
                region.world()
            )));
        }

        let (min, max) = region.normalize();
        let layers: Box<dyn Iterator<Item = i32>> = match direction {
            ResetDirection::TopToBottom => Box::new((min.y..=max.y).rev()),
            ResetDirection::BottomToTop => Box::new(min.y..=max.y),
        };

        let mut placed = 0u64;
        for y in layers {
            for x in min.x..=max.x {
                for z in min.z..=max.z {
                    let entry = distribution.sample(rng)?;
                    surface.place_block(region.world(), IVec3::new(x, y, z), &entry.material)?;
                    placed += 1;
                }
            }
        }

        log::debug!(
            "filled region in '{}' with {} blocks ({:?})",
            region.world(),
            placed,
            direction
        );
        Ok(placed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::BlockEntry;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[derive(Default)]
    struct RecordingSurface {
        placed: Vec<(IVec3, String)>,
        fail_after: Option<usize>,
    }

    impl WorldSurface for RecordingSurface {
        fn world_exists(&self, _world: &str) -> bool {
            true
        }

        fn place_block(&mut self, world: &str, pos: IVec3, material: &str) -> Result<()> {
            if let Some(limit) = self.fail_after {
                if self.placed.len() >= limit {
                    return Err(Error::FillSurface {
                        world: world.to_string(),
                        x: pos.x,
                        y: pos.y,
                        z: pos.z,
                        message: "chunk not loaded".to_string(),
                    });
                }
            }
            self.placed.push((pos, material.to_string()));
            Ok(())
        }
    }

    fn dist() -> BlockDistribution {
        BlockDistribution::from_entries(vec![
            BlockEntry::new("STONE", 75.0, false, false),
            BlockEntry::new("COAL_ORE", 25.0, false, false),
        ])
    }

    #[test]
    fn test_fill_covers_volume_exactly_once() {
        let region = RegionVolume::new("world", IVec3::new(0, 0, 0), IVec3::new(3, 2, 3));
        let mut surface = RecordingSurface::default();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(11);

        let placed = RegionFiller::fill(
            &region,
            &dist(),
            ResetDirection::BottomToTop,
            &mut surface,
            &mut rng,
        )
        .unwrap();

        assert_eq!(placed, region.volume() as u64);
        assert_eq!(surface.placed.len(), region.volume() as usize);

        let mut unique: Vec<IVec3> = surface.placed.iter().map(|(p, _)| *p).collect();
        unique.sort_by_key(|p| (p.x, p.y, p.z));
        unique.dedup();
        assert_eq!(unique.len(), region.volume() as usize);
        assert!(unique.iter().all(|p| region.contains_block("world", *p)));
    }

    #[test]
    fn test_fill_layer_order_follows_direction() {
        let region = RegionVolume::new("world", IVec3::new(0, 10, 0), IVec3::new(1, 13, 1));
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(2);

        let mut down = RecordingSurface::default();
        RegionFiller::fill(
            &region,
            &dist(),
            ResetDirection::TopToBottom,
            &mut down,
            &mut rng,
        )
        .unwrap();
        let ys: Vec<i32> = down.placed.iter().map(|(p, _)| p.y).collect();
        assert!(ys.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(ys.first(), Some(&13));
        assert_eq!(ys.last(), Some(&10));

        let mut up = RecordingSurface::default();
        RegionFiller::fill(
            &region,
            &dist(),
            ResetDirection::BottomToTop,
            &mut up,
            &mut rng,
        )
        .unwrap();
        let ys: Vec<i32> = up.placed.iter().map(|(p, _)| p.y).collect();
        assert!(ys.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(ys.first(), Some(&10));
    }

    #[test]
    fn test_fill_is_deterministic_for_a_fixed_seed() {
        let region = RegionVolume::new("world", IVec3::new(0, 0, 0), IVec3::new(4, 4, 4));

        let run = || {
            let mut surface = RecordingSurface::default();
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
            RegionFiller::fill(
                &region,
                &dist(),
                ResetDirection::TopToBottom,
                &mut surface,
                &mut rng,
            )
            .unwrap();
            surface.placed
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn test_fill_surfaces_write_failure() {
        let region = RegionVolume::new("world", IVec3::new(0, 0, 0), IVec3::new(2, 2, 2));
        let mut surface = RecordingSurface {
            fail_after: Some(5),
            ..Default::default()
        };
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(9);

        let result = RegionFiller::fill(
            &region,
            &dist(),
            ResetDirection::TopToBottom,
            &mut surface,
            &mut rng,
        );
        assert!(matches!(result, Err(Error::FillSurface { .. })));
        assert_eq!(surface.placed.len(), 5);
    }

    #[test]
    fn test_fill_empty_distribution_writes_nothing() {
        let region = RegionVolume::new("world", IVec3::new(0, 0, 0), IVec3::new(2, 2, 2));
        let mut surface = RecordingSurface::default();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(9);

        let result = RegionFiller::fill(
            &region,
            &BlockDistribution::new(),
            ResetDirection::TopToBottom,
            &mut surface,
            &mut rng,
        );
        assert!(matches!(result, Err(Error::Configuration(_))));
        assert!(surface.placed.is_empty());
    }
}
