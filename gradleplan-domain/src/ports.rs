use gradleplan_types::document::{ArtifactId, BomRef};
use std::collections::{BTreeMap, HashMap};

/// Read-only access to values owned by the external toolchain (e.g. the Flutter Gradle plugin).
///
/// The resolver treats it as an opaque key-value lookup.
pub trait ToolchainProvider {
    fn lookup(&self, key: &str) -> Option<String>;
}

impl ToolchainProvider for BTreeMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl ToolchainProvider for HashMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Toolchain that knows nothing. Documents with only literal bindings resolve against it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoToolchain;

impl ToolchainProvider for NoToolchain {
    fn lookup(&self, _key: &str) -> Option<String> {
        None
    }
}

/// Version sets pinned by Bill-of-Materials artifacts.
pub trait BomCatalog {
    /// Managed artifact versions for `bom`, or `None` when the BOM is unknown.
    fn members(&self, bom: &BomRef) -> Option<BTreeMap<ArtifactId, String>>;
}

/// In-memory catalog keyed by the BOM's `group:artifact:version` coordinate.
#[derive(Debug, Clone, Default)]
pub struct StaticBomCatalog {
    entries: BTreeMap<String, BTreeMap<ArtifactId, String>>,
}

impl StaticBomCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog preloaded with the BOMs gradleplan ships with.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        catalog.insert(
            "com.google.firebase:firebase-bom:32.2.2",
            [
                ("com.google.firebase:firebase-analytics", "21.3.0"),
                ("com.google.firebase:firebase-auth", "22.1.1"),
                ("com.google.firebase:firebase-firestore", "24.7.0"),
                ("com.google.firebase:firebase-messaging", "23.2.1"),
            ]
            .into_iter()
            .filter_map(|(id, v)| id.parse::<ArtifactId>().ok().map(|id| (id, v.to_string())))
            .collect(),
        );
        catalog
    }

    /// Insert or replace a BOM entry.
    pub fn insert(&mut self, coordinate: impl Into<String>, members: BTreeMap<ArtifactId, String>) {
        self.entries.insert(coordinate.into(), members);
    }

    pub fn coordinates(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }
}

impl BomCatalog for StaticBomCatalog {
    fn members(&self, bom: &BomRef) -> Option<BTreeMap<ArtifactId, String>> {
        self.entries.get(&bom.coordinate()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn firebase_bom(version: &str) -> BomRef {
        BomRef {
            configuration: "implementation".to_string(),
            artifact: ArtifactId::new("com.google.firebase", "firebase-bom"),
            version: version.to_string(),
        }
    }

    #[test]
    fn builtin_catalog_knows_firebase_bom() {
        let catalog = StaticBomCatalog::builtin();
        let members = catalog.members(&firebase_bom("32.2.2")).expect("known bom");
        let auth = ArtifactId::new("com.google.firebase", "firebase-auth");
        assert_eq!(members.get(&auth).map(String::as_str), Some("22.1.1"));
        assert!(catalog.members(&firebase_bom("0.0.1")).is_none());
    }

    #[test]
    fn insert_replaces_entry() {
        let mut catalog = StaticBomCatalog::builtin();
        catalog.insert("com.google.firebase:firebase-bom:32.2.2", BTreeMap::new());
        let members = catalog.members(&firebase_bom("32.2.2")).expect("known bom");
        assert!(members.is_empty());
    }

    #[test]
    fn map_toolchains_lookup() {
        let mut values = BTreeMap::new();
        values.insert("flutter.minSdkVersion".to_string(), "21".to_string());
        assert_eq!(values.lookup("flutter.minSdkVersion").as_deref(), Some("21"));
        assert!(NoToolchain.lookup("flutter.minSdkVersion").is_none());
    }
}
