//! In-memory mine collection and persistence orchestration

use std::collections::HashMap;

use glam::DVec3;

use crate::error::Result;
use crate::fill::WorldSurface;
use crate::ledger::ProgressLedger;
use crate::materials::MaterialCatalog;
use crate::mine::Mine;
use crate::store::{MineStore, SkippedLine};

/// A snapshot record `load_all` could not parse. The mine is absent from the
/// registry until the file is repaired.
#[derive(Debug, Clone)]
pub struct SkippedRecord {
    pub name: String,
    pub reason: String,
}

/// What `load_all` did: which mines made it in and what was dropped on the
/// way, so callers (and tests) can see the loss instead of grepping logs.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: Vec<String>,
    pub skipped_records: Vec<SkippedRecord>,
    /// Distribution lines dropped from otherwise-loaded mines, by mine name.
    pub skipped_lines: Vec<(String, SkippedLine)>,
}

/// Owns the authoritative in-memory mines and both persistence stores.
///
/// All mutation goes through `&mut self`, which confines it to one thread;
/// `tick()` reads counters under the same borrow discipline, so it can never
/// observe a torn per-mine state.
pub struct MineRegistry {
    store: MineStore,
    ledger: ProgressLedger,
    catalog: MaterialCatalog,
    mines: HashMap<String, Mine>,
}

impl MineRegistry {
    pub fn new(store: MineStore, ledger: ProgressLedger, catalog: MaterialCatalog) -> Self {
        Self {
            store,
            ledger,
            catalog,
            mines: HashMap::new(),
        }
    }

    /// Drops in-memory state and reloads every snapshot, reconciling each
    /// cumulative counter against the ledger: the ledger value wins when a
    /// row exists, otherwise the ledger is seeded from the snapshot.
    pub fn load_all(&mut self, worlds: &dyn WorldSurface) -> Result<LoadReport> {
        self.mines.clear();
        let mut report = LoadReport::default();

        for name in self.store.list_all()? {
            match self.store.load(&name, worlds, &self.catalog) {
                Ok(loaded) => {
                    let mut mine = loaded.mine;
                    for skip in loaded.skipped_lines {
                        report.skipped_lines.push((name.clone(), skip));
                    }
                    self.reconcile(&mut mine);
                    report.loaded.push(mine.name().to_string());
                    self.mines.insert(mine.name().to_string(), mine);
                }
                Err(e) => {
                    log::error!("failed to load mine '{}': {}", name, e);
                    report.skipped_records.push(SkippedRecord {
                        name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        log::info!(
            "loaded {} mines ({} snapshots skipped)",
            report.loaded.len(),
            report.skipped_records.len()
        );
        Ok(report)
    }

    fn reconcile(&self, mine: &mut Mine) {
        match self.ledger.lookup(mine.name()) {
            Ok(Some(count)) => mine.set_blocks_mined_cumulative(count),
            Ok(None) => {
                if let Err(e) = self
                    .ledger
                    .upsert(mine.name(), mine.blocks_mined_cumulative())
                {
                    log::error!("failed to seed ledger row for '{}': {}", mine.name(), e);
                }
            }
            Err(e) => {
                log::error!(
                    "ledger lookup failed for '{}', keeping snapshot counter: {}",
                    mine.name(),
                    e
                );
            }
        }
    }

    /// Registers and persists a mine. In-memory registration is put-if-absent
    /// (an already-registered object is kept); the snapshot and ledger row
    /// always refresh from `mine`. A ledger outage only costs the counter
    /// write - the next sync cycle retries it.
    pub fn save(&mut self, mine: Mine) -> Result<()> {
        self.store.save(&mine)?;
        if let Err(e) = self
            .ledger
            .upsert(mine.name(), mine.blocks_mined_cumulative())
        {
            log::error!("ledger write failed for '{}': {}", mine.name(), e);
        }
        self.mines.entry(mine.name().to_string()).or_insert(mine);
        Ok(())
    }

    /// Removes the mine from memory, its snapshot, and its ledger row.
    /// False if the name was not registered; store failures along the way are
    /// logged, the in-memory removal stands.
    pub fn delete(&mut self, name: &str) -> bool {
        if self.mines.remove(name).is_none() {
            return false;
        }

        match self.store.delete(name) {
            Ok(true) => {}
            Ok(false) => log::warn!("no snapshot file found for deleted mine '{}'", name),
            Err(e) => log::warn!("failed to delete snapshot for '{}': {}", name, e),
        }
        match self.ledger.delete(name) {
            Ok(_) => {}
            Err(e) => log::error!("failed to delete ledger row for '{}': {}", name, e),
        }
        true
    }

    /// Periodic batched counter sync: one transaction covering every mine.
    /// A failed batch is dropped for this cycle; the next tick resynthesizes
    /// it from the in-memory counters.
    pub fn tick(&mut self) {
        if self.mines.is_empty() {
            return;
        }

        let entries: Vec<(String, i64)> = self
            .mines
            .values()
            .map(|m| (m.name().to_string(), m.blocks_mined_cumulative()))
            .collect();
        let count = entries.len();

        match self.ledger.batch_upsert(&entries) {
            Ok(()) => log::debug!("synced {} mine counters", count),
            Err(e) => log::error!("counter sync failed, dropping batch of {}: {}", count, e),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Mine> {
        self.mines.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Mine> {
        self.mines.get_mut(name)
    }

    /// The mine owning the given world position, if any. Block-removal events
    /// resolve to a mine through this.
    pub fn find_containing(&mut self, world: &str, point: DVec3) -> Option<&mut Mine> {
        self.mines
            .values_mut()
            .find(|m| m.region().contains(world, point))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mine> {
        self.mines.values()
    }

    pub fn len(&self) -> usize {
        self.mines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mines.is_empty()
    }

    pub fn catalog(&self) -> &MaterialCatalog {
        &self.catalog
    }

    pub fn ledger(&self) -> &ProgressLedger {
        &self.ledger
    }
}
