//! Durable per-mine snapshots - one RON file per mine name

use std::fs;
use std::path::{Path, PathBuf};

use glam::{DVec3, IVec3};
use serde::{Deserialize, Serialize};

use crate::distribution::{BlockDistribution, BlockEntry};
use crate::error::{Error, Result};
use crate::fill::WorldSurface;
use crate::materials::MaterialCatalog;
use crate::mine::{Mine, ResetDirection, ResetPolicy, ResetType, TeleportAnchor};
use crate::region::RegionVolume;

/// On-disk snapshot record. Field names are the stable file schema.
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotRecord {
    mine_name: String,
    /// `material:chance:silkTouch:explodeProof` lines, in distribution order.
    blocks: Vec<String>,
    region: RegionRecord,
    reset: ResetRecord,
    #[serde(default)]
    blocks_mined: i64,
    #[serde(default)]
    teleport_location: Option<TeleportRecord>,
    /// Informational stamp; ignored on load.
    #[serde(default)]
    saved_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct RegionRecord {
    world: String,
    xmin: i32,
    ymin: i32,
    zmin: i32,
    xmax: i32,
    ymax: i32,
    zmax: i32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ResetRecord {
    use_timer: bool,
    timer: u64,
    use_percentage: bool,
    percentage: u32,
    reset_type: ResetType,
    use_messages: bool,
    #[serde(default)]
    blocks_mined_current: i64,
    reset_direction: ResetDirection,
}

#[derive(Debug, Serialize, Deserialize)]
struct TeleportRecord {
    world: String,
    x: f64,
    y: f64,
    z: f64,
    #[serde(default)]
    yaw: f32,
    #[serde(default)]
    pitch: f32,
}

/// A distribution line the loader had to drop, with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedLine {
    pub line: String,
    pub reason: String,
}

/// Result of loading one snapshot: the mine plus anything dropped on the way.
#[derive(Debug)]
pub struct LoadedMine {
    pub mine: Mine,
    pub skipped_lines: Vec<SkippedLine>,
}

/// Snapshot persistence over a directory of `<name>.ron` files.
pub struct MineStore {
    dir: PathBuf,
}

impl MineStore {
    /// Opens the snapshot directory, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn snapshot_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.ron"))
    }

    /// Serializes every field of the mine, counters included, and atomically
    /// replaces the record. Safe to call repeatedly for the same name.
    pub fn save(&self, mine: &Mine) -> Result<()> {
        let record = record_from_mine(mine);
        let serialized = ron::ser::to_string_pretty(&record, Default::default())
            .map_err(|e| Error::Configuration(format!("serialize '{}': {e}", mine.name())))?;

        // Atomic replace: write to a temp file, then rename.
        let path = self.snapshot_path(mine.name());
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, serialized)?;
        fs::rename(&temp_path, &path)?;

        log::debug!("saved snapshot for mine '{}'", mine.name());
        Ok(())
    }

    /// Parses the named snapshot into a mine. Malformed distribution lines
    /// are skipped (and reported), never fatal; a teleport anchor whose world
    /// is not loaded is dropped with a warning.
    pub fn load(
        &self,
        name: &str,
        worlds: &dyn WorldSurface,
        catalog: &MaterialCatalog,
    ) -> Result<LoadedMine> {
        let contents = fs::read_to_string(self.snapshot_path(name))?;
        let record: SnapshotRecord = ron::from_str(&contents)
            .map_err(|e| Error::Configuration(format!("snapshot '{name}': {e}")))?;
        mine_from_record(record, worlds, catalog)
    }

    /// Removes the record; true if one existed.
    pub fn delete(&self, name: &str) -> Result<bool> {
        let path = self.snapshot_path(name);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(path)?;
        Ok(true)
    }

    /// Names of every persisted snapshot, for bulk load at startup. Parse
    /// failures are the caller's to handle per record.
    pub fn list_all(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for dir_entry in fs::read_dir(&self.dir)? {
            let path = dir_entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("ron") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

fn record_from_mine(mine: &Mine) -> SnapshotRecord {
    let (corner_a, corner_b) = mine.region().corners();
    SnapshotRecord {
        mine_name: mine.name().to_string(),
        blocks: mine
            .distribution()
            .entries()
            .iter()
            .map(BlockEntry::to_line)
            .collect(),
        region: RegionRecord {
            world: mine.region().world().to_string(),
            xmin: corner_a.x,
            ymin: corner_a.y,
            zmin: corner_a.z,
            xmax: corner_b.x,
            ymax: corner_b.y,
            zmax: corner_b.z,
        },
        reset: ResetRecord {
            use_timer: mine.use_timer(),
            timer: mine.timer_seconds(),
            use_percentage: mine.use_percentage(),
            percentage: mine.percentage_threshold(),
            reset_type: mine.reset_type(),
            use_messages: mine.use_messages(),
            blocks_mined_current: mine.blocks_mined_since_reset(),
            reset_direction: mine.reset_direction(),
        },
        blocks_mined: mine.blocks_mined_cumulative(),
        teleport_location: mine.teleport_anchor().map(|tp| TeleportRecord {
            world: tp.world.clone(),
            x: tp.pos.x,
            y: tp.pos.y,
            z: tp.pos.z,
            yaw: tp.yaw,
            pitch: tp.pitch,
        }),
        saved_at: chrono::Local::now().to_rfc3339(),
    }
}

fn mine_from_record(
    record: SnapshotRecord,
    worlds: &dyn WorldSurface,
    catalog: &MaterialCatalog,
) -> Result<LoadedMine> {
    let name = record.mine_name;

    let mut distribution = BlockDistribution::new();
    let mut skipped_lines = Vec::new();
    for line in &record.blocks {
        match BlockEntry::parse_line(line, catalog) {
            Ok(entry) => distribution.push(entry),
            Err(reason) => {
                log::warn!("mine '{}': skipping block line '{}': {}", name, line, reason);
                skipped_lines.push(SkippedLine {
                    line: line.clone(),
                    reason,
                });
            }
        }
    }

    let region = RegionVolume::new(
        record.region.world,
        IVec3::new(record.region.xmin, record.region.ymin, record.region.zmin),
        IVec3::new(record.region.xmax, record.region.ymax, record.region.zmax),
    );

    let policy = ResetPolicy {
        use_timer: record.reset.use_timer,
        timer_seconds: record.reset.timer,
        use_percentage: record.reset.use_percentage,
        percentage_threshold: record.reset.percentage,
        reset_type: record.reset.reset_type,
        reset_direction: record.reset.reset_direction,
        use_messages: record.reset.use_messages,
    };
    policy
        .validate()
        .map_err(|reason| Error::Configuration(format!("mine '{name}': {reason}")))?;

    let teleport = record.teleport_location.and_then(|tp| {
        if worlds.world_exists(&tp.world) {
            Some(TeleportAnchor {
                world: tp.world,
                pos: DVec3::new(tp.x, tp.y, tp.z),
                yaw: tp.yaw,
                pitch: tp.pitch,
            })
        } else {
            log::warn!(
                "mine '{}': world '{}' not loaded, dropping teleport anchor",
                name,
                tp.world
            );
            None
        }
    });

    let mine = Mine::from_parts(
        name,
        region,
        distribution,
        policy,
        record.blocks_mined,
        record.reset.blocks_mined_current,
        teleport,
    );

    Ok(LoadedMine {
        mine,
        skipped_lines,
    })
}
