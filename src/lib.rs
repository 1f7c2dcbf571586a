//! # Mineyard - regenerating mine regions with dual-store persistence
//!
//! Manages named "mines": rectangular volumes of a block world whose contents
//! are procedurally regenerated on configurable triggers (timer and
//! percentage-of-volume), with progress counters that survive restarts through
//! a per-mine snapshot file plus a relational counter ledger.
//!
//! The host engine stays behind the [`fill::WorldSurface`] trait; the host's
//! scheduler drives [`registry::MineRegistry::tick`] on a fixed interval.

pub mod config;
pub mod distribution;
pub mod error;
pub mod fill;
pub mod ledger;
pub mod materials;
pub mod mine;
pub mod region;
pub mod registry;
pub mod store;

pub use error::{Error, Result};

/// Common imports for consumers
pub mod prelude {
    pub use crate::distribution::{BlockDistribution, BlockEntry};
    pub use crate::fill::{RegionFiller, WorldSurface};
    pub use crate::ledger::ProgressLedger;
    pub use crate::materials::MaterialCatalog;
    pub use crate::mine::{Mine, ResetDirection, ResetType, TeleportAnchor};
    pub use crate::region::RegionVolume;
    pub use crate::registry::{LoadReport, MineRegistry};
    pub use crate::store::MineStore;
    pub use glam::{DVec3, IVec3};
}
