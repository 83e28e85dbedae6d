//! Clap-free settings for the pipelines.

use camino::Utf8PathBuf;
use std::collections::BTreeMap;

/// Settings for the plan and check pipelines.
#[derive(Debug, Clone)]
pub struct PlanSettings {
    /// Configuration document to resolve.
    pub document: Utf8PathBuf,
    pub out_dir: Utf8PathBuf,
}

impl Default for PlanSettings {
    fn default() -> Self {
        Self {
            document: Utf8PathBuf::from("android/app/build.gradle.kts"),
            out_dir: Utf8PathBuf::from("artifacts/gradleplan"),
        }
    }
}

/// Where toolchain values come from, highest precedence first.
#[derive(Debug, Clone, Default)]
pub struct ToolchainSettings {
    /// Explicit `key = value` pairs (command line merged over config file).
    pub values: BTreeMap<String, String>,

    /// Java `.properties` files, consulted in order after `values`.
    pub properties: Vec<Utf8PathBuf>,
}

/// BOM declarations added to the built-in catalog, keyed by `group:artifact:version`.
pub type BomOverrides = BTreeMap<String, BTreeMap<String, String>>;
