//! Mine entity - region, distribution, reset policy, progress counters

use std::time::Instant;

use glam::DVec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::distribution::BlockDistribution;
use crate::error::{Error, Result};
use crate::fill::{RegionFiller, WorldSurface};
use crate::region::RegionVolume;

/// How a reset writes the region back. `Gradual` is a pacing hint for the
/// host; the core fill itself always walks the full volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResetType {
    Instant,
    Gradual,
}

/// Y-axis walk order during a fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResetDirection {
    TopToBottom,
    BottomToTop,
}

/// Where players are parked when a mine regenerates. A host concern, persisted
/// verbatim; dropped at load time when its world is not loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct TeleportAnchor {
    pub world: String,
    pub pos: DVec3,
    pub yaw: f32,
    pub pitch: f32,
}

/// When and how a mine regenerates. Fields are private; mutation goes through
/// the validating setters on [`Mine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetPolicy {
    pub(crate) use_timer: bool,
    pub(crate) timer_seconds: u64,
    pub(crate) use_percentage: bool,
    pub(crate) percentage_threshold: u32,
    pub(crate) reset_type: ResetType,
    pub(crate) reset_direction: ResetDirection,
    pub(crate) use_messages: bool,
}

impl Default for ResetPolicy {
    fn default() -> Self {
        Self {
            use_timer: false,
            timer_seconds: 0,
            use_percentage: false,
            percentage_threshold: 70,
            reset_type: ResetType::Instant,
            reset_direction: ResetDirection::TopToBottom,
            use_messages: false,
        }
    }
}

impl ResetPolicy {
    /// Invariant check used after constructing a policy from stored data.
    pub(crate) fn validate(&self) -> std::result::Result<(), String> {
        if self.percentage_threshold > 100 {
            return Err(format!(
                "percentage threshold {} outside 0-100",
                self.percentage_threshold
            ));
        }
        Ok(())
    }
}

/// A named, reconfigurable volume that regenerates its block contents.
///
/// The name is the primary key in both persistence stores and is immutable.
#[derive(Debug, Clone)]
pub struct Mine {
    name: String,
    region: RegionVolume,
    distribution: BlockDistribution,
    policy: ResetPolicy,
    blocks_mined_cumulative: i64,
    blocks_mined_since_reset: i64,
    last_reset: Instant,
    teleport: Option<TeleportAnchor>,
}

impl Mine {
    /// Fresh mine: empty distribution, default policy, zero counters.
    pub fn new(name: impl Into<String>, region: RegionVolume) -> Self {
        Self {
            name: name.into(),
            region,
            distribution: BlockDistribution::new(),
            policy: ResetPolicy::default(),
            blocks_mined_cumulative: 0,
            blocks_mined_since_reset: 0,
            last_reset: Instant::now(),
            teleport: None,
        }
    }

    /// Reconstruction from a persisted snapshot (used by the store).
    pub(crate) fn from_parts(
        name: String,
        region: RegionVolume,
        distribution: BlockDistribution,
        policy: ResetPolicy,
        blocks_mined_cumulative: i64,
        blocks_mined_since_reset: i64,
        teleport: Option<TeleportAnchor>,
    ) -> Self {
        Self {
            name,
            region,
            distribution,
            policy,
            blocks_mined_cumulative,
            blocks_mined_since_reset,
            last_reset: Instant::now(),
            teleport,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn region(&self) -> &RegionVolume {
        &self.region
    }

    pub fn distribution(&self) -> &BlockDistribution {
        &self.distribution
    }

    pub fn set_distribution(&mut self, distribution: BlockDistribution) {
        self.distribution = distribution;
    }

    pub fn teleport_anchor(&self) -> Option<&TeleportAnchor> {
        self.teleport.as_ref()
    }

    pub fn set_teleport_anchor(&mut self, anchor: Option<TeleportAnchor>) {
        self.teleport = anchor;
    }

    // --- reset policy -----------------------------------------------------

    pub fn use_timer(&self) -> bool {
        self.policy.use_timer
    }

    pub fn set_use_timer(&mut self, on: bool) {
        self.policy.use_timer = on;
    }

    pub fn timer_seconds(&self) -> u64 {
        self.policy.timer_seconds
    }

    pub fn set_timer_seconds(&mut self, seconds: u64) {
        self.policy.timer_seconds = seconds;
    }

    pub fn use_percentage(&self) -> bool {
        self.policy.use_percentage
    }

    pub fn set_use_percentage(&mut self, on: bool) {
        self.policy.use_percentage = on;
    }

    pub fn percentage_threshold(&self) -> u32 {
        self.policy.percentage_threshold
    }

    /// Threshold must stay in 0-100.
    pub fn set_percentage_threshold(&mut self, percent: u32) -> Result<()> {
        if percent > 100 {
            return Err(Error::Configuration(format!(
                "mine '{}': percentage threshold {} outside 0-100",
                self.name, percent
            )));
        }
        self.policy.percentage_threshold = percent;
        Ok(())
    }

    pub fn reset_type(&self) -> ResetType {
        self.policy.reset_type
    }

    pub fn set_reset_type(&mut self, reset_type: ResetType) {
        self.policy.reset_type = reset_type;
    }

    pub fn reset_direction(&self) -> ResetDirection {
        self.policy.reset_direction
    }

    pub fn set_reset_direction(&mut self, direction: ResetDirection) {
        self.policy.reset_direction = direction;
    }

    pub fn use_messages(&self) -> bool {
        self.policy.use_messages
    }

    pub fn set_use_messages(&mut self, on: bool) {
        self.policy.use_messages = on;
    }

    // --- progress ---------------------------------------------------------

    pub fn blocks_mined_cumulative(&self) -> i64 {
        self.blocks_mined_cumulative
    }

    /// Reconciliation hook: the registry overwrites the cumulative counter
    /// with the ledger value at load time.
    pub fn set_blocks_mined_cumulative(&mut self, count: i64) {
        self.blocks_mined_cumulative = count;
    }

    pub fn blocks_mined_since_reset(&self) -> i64 {
        self.blocks_mined_since_reset
    }

    pub fn last_reset(&self) -> Instant {
        self.last_reset
    }

    /// Records one removed block: bumps both counters.
    pub fn increment_mined(&mut self) {
        self.blocks_mined_since_reset += 1;
        self.blocks_mined_cumulative += 1;
    }

    /// Undoes a mis-fired increment (e.g. a cancelled removal). Only the
    /// per-cycle counter moves; the cumulative counter keeps its value.
    /// Clamped at zero - a clamp means callers decremented more than they
    /// incremented, which is logged as a logic error.
    pub fn decrement_mined(&mut self) {
        if self.blocks_mined_since_reset == 0 {
            log::warn!(
                "mine '{}': decrement below zero ignored (unbalanced decrement_mined)",
                self.name
            );
            return;
        }
        self.blocks_mined_since_reset -= 1;
    }

    // --- trigger and reset ------------------------------------------------

    /// Short-circuit OR of the timer and percentage conditions. A mine with
    /// neither flag enabled never auto-resets.
    pub fn should_reset(&self) -> bool {
        self.should_reset_at(Instant::now())
    }

    /// Trigger evaluation against an explicit clock, so tests can inject time.
    pub fn should_reset_at(&self, now: Instant) -> bool {
        if self.policy.use_timer {
            let elapsed = now.saturating_duration_since(self.last_reset);
            if elapsed.as_secs() >= self.policy.timer_seconds {
                return true;
            }
        }

        if self.policy.use_percentage {
            let target = (self.policy.percentage_threshold as f64 / 100.0
                * self.region.volume() as f64)
                .ceil() as i64;
            if self.blocks_mined_since_reset >= target {
                return true;
            }
        }

        false
    }

    /// Clears per-cycle progress and repopulates the region.
    ///
    /// Counters are cleared before the fill and are not rolled back if a
    /// world write fails partway. The fill is idempotent over the volume, so
    /// retrying the whole reset after a failure is safe.
    pub fn reset<R: Rng + ?Sized>(
        &mut self,
        surface: &mut dyn WorldSurface,
        rng: &mut R,
    ) -> Result<u64> {
        self.blocks_mined_since_reset = 0;
        self.last_reset = Instant::now();

        let placed = RegionFiller::fill(
            &self.region,
            &self.distribution,
            self.policy.reset_direction,
            surface,
            rng,
        )
        .map_err(|e| {
            log::error!("mine '{}': reset fill failed: {}", self.name, e);
            e
        })?;

        if self.policy.use_messages {
            log::info!("mine '{}' has been reset ({} blocks placed)", self.name, placed);
        }
        Ok(placed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::{BlockDistribution, BlockEntry};
    use glam::IVec3;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;
    use std::time::Duration;

    fn region_100() -> RegionVolume {
        // 10 x 1 x 10 = 100 blocks
        RegionVolume::new("world", IVec3::new(0, 5, 0), IVec3::new(9, 5, 9))
    }

    fn stone_mine(name: &str) -> Mine {
        let mut mine = Mine::new(name, region_100());
        mine.set_distribution(BlockDistribution::from_entries(vec![BlockEntry::new(
            "STONE", 100.0, false, false,
        )]));
        mine
    }

    #[test]
    fn test_counters_increment_together_decrement_apart() {
        let mut mine = stone_mine("alpha");
        mine.increment_mined();
        mine.increment_mined();
        assert_eq!(mine.blocks_mined_since_reset(), 2);
        assert_eq!(mine.blocks_mined_cumulative(), 2);

        mine.decrement_mined();
        assert_eq!(mine.blocks_mined_since_reset(), 1);
        // Cumulative keeps the original asymmetry.
        assert_eq!(mine.blocks_mined_cumulative(), 2);
    }

    #[test]
    fn test_decrement_clamps_at_zero() {
        let mut mine = stone_mine("alpha");
        mine.decrement_mined();
        assert_eq!(mine.blocks_mined_since_reset(), 0);
    }

    #[test]
    fn test_percentage_trigger_boundary() {
        let mut mine = stone_mine("alpha");
        mine.set_use_percentage(true);
        mine.set_percentage_threshold(70).unwrap();
        assert_eq!(mine.region().volume(), 100);

        for _ in 0..69 {
            mine.increment_mined();
        }
        assert!(!mine.should_reset());

        mine.increment_mined();
        assert!(mine.should_reset());
    }

    #[test]
    fn test_percentage_target_uses_ceiling() {
        // volume 100, threshold 1 -> target ceil(1.0) = 1
        let mut mine = stone_mine("alpha");
        mine.set_use_percentage(true);
        mine.set_percentage_threshold(1).unwrap();
        assert!(!mine.should_reset());
        mine.increment_mined();
        assert!(mine.should_reset());
    }

    #[test]
    fn test_timer_trigger_independent_of_counters() {
        let mut mine = stone_mine("alpha");
        mine.set_use_timer(true);
        mine.set_timer_seconds(60);

        let before = mine.last_reset() + Duration::from_secs(59);
        let at = mine.last_reset() + Duration::from_secs(60);
        assert!(!mine.should_reset_at(before));
        assert!(mine.should_reset_at(at));
    }

    #[test]
    fn test_no_flags_never_auto_resets() {
        let mut mine = stone_mine("alpha");
        for _ in 0..1_000 {
            mine.increment_mined();
        }
        let far_future = mine.last_reset() + Duration::from_secs(1_000_000);
        assert!(!mine.should_reset_at(far_future));
    }

    #[test]
    fn test_percentage_threshold_validation() {
        let mut mine = stone_mine("alpha");
        assert!(mine.set_percentage_threshold(100).is_ok());
        assert!(mine.set_percentage_threshold(101).is_err());
        assert_eq!(mine.percentage_threshold(), 100);
    }

    struct CountingSurface {
        placed: u64,
    }

    impl WorldSurface for CountingSurface {
        fn world_exists(&self, _world: &str) -> bool {
            true
        }

        fn place_block(&mut self, _world: &str, _pos: IVec3, _material: &str) -> Result<()> {
            self.placed += 1;
            Ok(())
        }
    }

    #[test]
    fn test_reset_clears_counter_and_fills_volume() {
        let mut mine = stone_mine("alpha");
        for _ in 0..40 {
            mine.increment_mined();
        }

        let mut surface = CountingSurface { placed: 0 };
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        let placed = mine.reset(&mut surface, &mut rng).unwrap();

        assert_eq!(placed, 100);
        assert_eq!(surface.placed, 100);
        assert_eq!(mine.blocks_mined_since_reset(), 0);
        assert_eq!(mine.blocks_mined_cumulative(), 40);
    }

    #[test]
    fn test_reset_with_empty_distribution_fails_but_counters_stay_cleared() {
        let mut mine = Mine::new("bare", region_100());
        for _ in 0..10 {
            mine.increment_mined();
        }

        let mut surface = CountingSurface { placed: 0 };
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        let result = mine.reset(&mut surface, &mut rng);

        assert!(matches!(result, Err(Error::Configuration(_))));
        // No rollback: the counter was cleared before the fill attempt.
        assert_eq!(mine.blocks_mined_since_reset(), 0);
        assert_eq!(surface.placed, 0);
    }
}
