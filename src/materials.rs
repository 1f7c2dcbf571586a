//! Known material identifiers

use std::collections::HashSet;

/// The set of material names a mine may be filled with.
///
/// Snapshot block lines naming a material outside the catalog are treated as
/// unknown and skipped at load time. Names are canonicalized to uppercase so
/// stored data is case-insensitive.
#[derive(Debug, Clone)]
pub struct MaterialCatalog {
    names: HashSet<String>,
}

impl MaterialCatalog {
    /// Catalog with the built-in mining materials registered.
    pub fn new() -> Self {
        let mut catalog = Self {
            names: HashSet::new(),
        };
        catalog.register_defaults();
        catalog
    }

    fn register_defaults(&mut self) {
        for name in [
            "AIR",
            "STONE",
            "DIRT",
            "SAND",
            "WOOD",
            "ICE",
            "GLASS",
            "METAL",
            "BEDROCK",
            "COAL_ORE",
            "IRON_ORE",
            "COPPER_ORE",
            "GOLD_ORE",
        ] {
            self.register(name);
        }
    }

    /// Adds a material name to the catalog (host engines extend the set).
    pub fn register(&mut self, name: impl AsRef<str>) {
        self.names.insert(name.as_ref().to_ascii_uppercase());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&name.to_ascii_uppercase())
    }

    /// Canonical form of a known material name, or None if unknown.
    pub fn resolve(&self, name: &str) -> Option<String> {
        let canonical = name.trim().to_ascii_uppercase();
        self.names.contains(&canonical).then_some(canonical)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for MaterialCatalog {
    fn default() -> Self {
        Self::new()
    }
}
