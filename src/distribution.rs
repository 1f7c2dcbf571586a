//! Weighted block distributions

use crate::error::{Error, Result};
use crate::materials::MaterialCatalog;
use rand::Rng;

/// One weighted entry in a mine's block table.
///
/// `chance` is a relative weight: stored data is not normalized, so weights
/// need not sum to 100. The two flags are hints for external consumers (the
/// block-removal handler); the core only carries them through persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockEntry {
    pub material: String,
    pub chance: f64,
    pub silk_touch_exempt: bool,
    pub explosion_proof: bool,
}

impl BlockEntry {
    pub fn new(
        material: impl Into<String>,
        chance: f64,
        silk_touch_exempt: bool,
        explosion_proof: bool,
    ) -> Self {
        Self {
            material: material.into(),
            chance,
            silk_touch_exempt,
            explosion_proof,
        }
    }

    /// The `material:chance:silkTouch:explodeProof` snapshot line.
    pub fn to_line(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.material, self.chance, self.silk_touch_exempt, self.explosion_proof
        )
    }

    /// Parses a snapshot line. The error is the human-readable reason used in
    /// skip warnings; a bad line never aborts loading its siblings.
    ///
    /// Booleans are lenient: anything other than "true" reads as false.
    pub fn parse_line(line: &str, catalog: &MaterialCatalog) -> std::result::Result<Self, String> {
        let parts: Vec<&str> = line.split(':').collect();
        if parts.len() < 4 {
            return Err(format!("expected 4 fields, got {}", parts.len()));
        }

        let material = catalog
            .resolve(parts[0])
            .ok_or_else(|| format!("unknown material '{}'", parts[0]))?;
        let chance: f64 = parts[1]
            .trim()
            .parse()
            .map_err(|_| format!("unparsable chance '{}'", parts[1]))?;
        let silk_touch_exempt = parts[2].trim().eq_ignore_ascii_case("true");
        let explosion_proof = parts[3].trim().eq_ignore_ascii_case("true");

        Ok(Self {
            material,
            chance,
            silk_touch_exempt,
            explosion_proof,
        })
    }
}

/// Ordered list of weighted material entries.
///
/// Order carries no semantic weight beyond deterministic serialization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockDistribution {
    entries: Vec<BlockEntry>,
}

impl BlockDistribution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<BlockEntry>) -> Self {
        Self { entries }
    }

    pub fn push(&mut self, entry: BlockEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[BlockEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Weighted-random pick: entry `i` is chosen with probability
    /// `chance_i / sum(chances)`. Negative weights count as zero.
    ///
    /// An empty distribution (or one with no positive weight) is a
    /// configuration error - callers must not fill an unfillable mine.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&BlockEntry> {
        let total: f64 = self.entries.iter().map(|e| e.chance.max(0.0)).sum();
        if self.entries.is_empty() || total <= 0.0 {
            return Err(Error::Configuration(
                "block distribution is empty or has no positive weight".to_string(),
            ));
        }

        let mut roll = rng.random_range(0.0..total);
        for entry in &self.entries {
            let weight = entry.chance.max(0.0);
            if roll < weight {
                return Ok(entry);
            }
            roll -= weight;
        }

        // Float drift can push the roll past the last bucket; fall back to the
        // last entry that actually has weight.
        self.entries
            .iter()
            .rev()
            .find(|e| e.chance > 0.0)
            .ok_or_else(|| {
                Error::Configuration("block distribution has no positive weight".to_string())
            })
    }
}
