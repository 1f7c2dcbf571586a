use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use glam::IVec3;

use mineyard::config::RuntimeConfig;
use mineyard::fill::WorldSurface;
use mineyard::ledger::ProgressLedger;
use mineyard::materials::MaterialCatalog;
use mineyard::registry::MineRegistry;
use mineyard::store::MineStore;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the runtime config file
    #[arg(long, default_value = "mineyard.ron")]
    config: PathBuf,

    /// Run a single sync tick and exit
    #[arg(long)]
    once: bool,
}

/// Stand-in world surface for running the engine without a host engine:
/// every world counts as loaded and block writes are logged, not applied.
struct LoggingSurface;

impl WorldSurface for LoggingSurface {
    fn world_exists(&self, _world: &str) -> bool {
        true
    }

    fn place_block(&mut self, world: &str, pos: IVec3, material: &str) -> mineyard::Result<()> {
        log::debug!(
            "place {} in '{}' at ({}, {}, {})",
            material,
            world,
            pos.x,
            pos.y,
            pos.z
        );
        Ok(())
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = RuntimeConfig::load(&args.config);
    log::info!(
        "starting mineyardd (mines: {:?}, ledger: {:?}, sync every {}s)",
        config.mines_dir,
        config.ledger_path,
        config.sync_interval_seconds
    );

    let store = MineStore::open(&config.mines_dir).context("opening mine snapshot directory")?;
    let ledger = ProgressLedger::open(&config.ledger_path).context("opening progress ledger")?;
    ledger.ensure_schema().context("creating ledger schema")?;

    let mut registry = MineRegistry::new(store, ledger, MaterialCatalog::new());
    let report = registry.load_all(&LoggingSurface)?;
    for skipped in &report.skipped_records {
        log::warn!("snapshot '{}' skipped: {}", skipped.name, skipped.reason);
    }
    log::info!("{} mines loaded", report.loaded.len());

    loop {
        registry.tick();
        if args.once {
            break;
        }
        std::thread::sleep(Duration::from_secs(config.sync_interval_seconds));
    }

    Ok(())
}
