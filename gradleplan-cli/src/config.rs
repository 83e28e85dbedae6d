//! Configuration file loading for gradleplan.
//!
//! Discovers and loads `gradleplan.toml` from the project root.
//! Merges config file settings with CLI arguments (CLI takes precedence).

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use gradleplan_core::settings::{BomOverrides, ToolchainSettings};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "gradleplan.toml";

/// Properties file Flutter generates next to the Android project.
pub const LOCAL_PROPERTIES: &str = "android/local.properties";

/// Top-level configuration from gradleplan.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GradleplanConfig {
    /// Default document and output locations.
    pub plan: PlanConfig,

    /// Toolchain values and properties files.
    pub toolchain: ToolchainConfig,

    /// Extra BOMs, keyed by `group:artifact:version`, mapping `group:artifact` to a version.
    pub boms: BomOverrides,
}

/// Plan section of the config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    /// Configuration document, relative to the project root.
    pub document: Option<Utf8PathBuf>,

    /// Output directory, relative to the project root.
    pub out_dir: Option<Utf8PathBuf>,
}

/// Toolchain section of the config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// Properties files, relative to the project root.
    pub properties: Vec<Utf8PathBuf>,

    /// Explicit toolchain values (e.g. `"flutter.minSdkVersion" = 21`).
    pub values: BTreeMap<String, ToolchainValue>,
}

/// A toolchain value as written in TOML; integers are accepted for convenience.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ToolchainValue {
    Int(i64),
    Text(String),
}

impl ToolchainValue {
    fn into_string(self) -> String {
        match self {
            ToolchainValue::Int(n) => n.to_string(),
            ToolchainValue::Text(s) => s,
        }
    }
}

/// Discover the gradleplan.toml config file.
///
/// Returns `None` if no config file is found in the project root.
pub fn discover_config(project_root: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = project_root.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse a gradleplan.toml config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<GradleplanConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

/// Parse a config file from a string.
pub fn parse_config(contents: &str) -> anyhow::Result<GradleplanConfig> {
    let config: GradleplanConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load config from the project root, or return default if not found.
pub fn load_or_default(project_root: &Utf8Path) -> anyhow::Result<GradleplanConfig> {
    match discover_config(project_root) {
        Some(path) => load_config(&path),
        None => Ok(GradleplanConfig::default()),
    }
}

/// Merged configuration combining config file and CLI arguments.
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub document: Utf8PathBuf,
    pub out_dir: Utf8PathBuf,
    pub toolchain: ToolchainSettings,
    pub boms: BomOverrides,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: GradleplanConfig,
    project_root: Utf8PathBuf,
    local_root: Option<Utf8PathBuf>,
}

impl ConfigMerger {
    pub fn new(config: GradleplanConfig, project_root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            config,
            project_root: project_root.into(),
            local_root: None,
        }
    }

    /// Look for `android/local.properties` under `root` instead of the project root.
    pub fn with_local_root(mut self, root: impl Into<Utf8PathBuf>) -> Self {
        self.local_root = Some(root.into());
        self
    }

    /// Merge with plan/check command CLI arguments.
    ///
    /// CLI toolchain values override config values key by key. CLI properties files are
    /// consulted before configured ones. With no properties file anywhere, Flutter's
    /// `android/local.properties` is used when it exists.
    pub fn merge(
        self,
        cli_document: Option<Utf8PathBuf>,
        cli_out_dir: Option<Utf8PathBuf>,
        cli_values: &BTreeMap<String, String>,
        cli_properties: &[Utf8PathBuf],
    ) -> MergedConfig {
        let root = self.project_root;

        let document = cli_document.unwrap_or_else(|| {
            root.join(
                self.config
                    .plan
                    .document
                    .unwrap_or_else(|| Utf8PathBuf::from("android/app/build.gradle.kts")),
            )
        });
        let out_dir = cli_out_dir.unwrap_or_else(|| {
            root.join(
                self.config
                    .plan
                    .out_dir
                    .unwrap_or_else(|| Utf8PathBuf::from("artifacts/gradleplan")),
            )
        });

        let mut values: BTreeMap<String, String> = self
            .config
            .toolchain
            .values
            .into_iter()
            .map(|(k, v)| (k, v.into_string()))
            .collect();
        for (k, v) in cli_values {
            values.insert(k.clone(), v.clone());
        }

        let mut properties: Vec<Utf8PathBuf> = cli_properties.to_vec();
        properties.extend(
            self.config
                .toolchain
                .properties
                .iter()
                .map(|p| root.join(p)),
        );
        if properties.is_empty() {
            let local = self.local_root.as_ref().unwrap_or(&root).join(LOCAL_PROPERTIES);
            if local.exists() {
                debug!("using {}", local);
                properties.push(local);
            }
        }

        MergedConfig {
            document,
            out_dir,
            toolchain: ToolchainSettings { values, properties },
            boms: self.config.boms,
        }
    }
}

/// Parse CLI toolchain values from key=value strings.
pub fn parse_key_values(entries: &[String]) -> anyhow::Result<BTreeMap<String, String>> {
    let mut out = BTreeMap::new();
    for entry in entries {
        let mut parts = entry.splitn(2, '=');
        let key = parts
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow::anyhow!("invalid toolchain value '{}': missing key", entry))?;
        let value = parts
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow::anyhow!("invalid toolchain value '{}': missing value", entry))?;
        out.insert(key.to_string(), value.to_string());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_root() -> (TempDir, Utf8PathBuf) {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        (temp, root)
    }

    #[test]
    fn test_parse_full_config() {
        let contents = r#"
[plan]
document = "android/app/build.gradle.kts"
out_dir = "build/gradleplan"

[toolchain]
properties = ["android/local.properties"]

[toolchain.values]
"flutter.minSdkVersion" = 21
"flutter.versionName" = "1.0.0"

[boms."com.example:platform-bom:2.0.0"]
"com.example:core" = "2.0.1"
"#;

        let config = parse_config(contents).unwrap();
        assert_eq!(config.plan.out_dir.as_deref(), Some(Utf8Path::new("build/gradleplan")));
        assert_eq!(config.toolchain.properties.len(), 1);
        assert_eq!(
            config.toolchain.values.get("flutter.minSdkVersion"),
            Some(&ToolchainValue::Int(21))
        );
        assert_eq!(
            config.toolchain.values.get("flutter.versionName"),
            Some(&ToolchainValue::Text("1.0.0".to_string()))
        );
        assert_eq!(
            config.boms["com.example:platform-bom:2.0.0"].get("com.example:core"),
            Some(&"2.0.1".to_string())
        );
    }

    #[test]
    fn test_parse_empty_config() {
        let config = parse_config("").unwrap();
        assert!(config.plan.document.is_none());
        assert!(config.toolchain.values.is_empty());
        assert!(config.boms.is_empty());
    }

    #[test]
    fn test_parse_rejects_bad_toml() {
        let err = parse_config("[toolchain\n").unwrap_err();
        assert!(err.to_string().contains("invalid TOML"));
    }

    #[test]
    fn test_merge_cli_values_win() {
        let config = parse_config(
            r#"
[toolchain.values]
"flutter.minSdkVersion" = 21
"flutter.targetSdkVersion" = 34
"#,
        )
        .unwrap();

        let mut cli = BTreeMap::new();
        cli.insert("flutter.minSdkVersion".to_string(), "23".to_string());

        let merged = ConfigMerger::new(config, "/proj").merge(None, None, &cli, &[]);
        assert_eq!(merged.toolchain.values["flutter.minSdkVersion"], "23");
        assert_eq!(merged.toolchain.values["flutter.targetSdkVersion"], "34");
        assert_eq!(
            merged.document,
            Utf8PathBuf::from("/proj/android/app/build.gradle.kts")
        );
        assert_eq!(merged.out_dir, Utf8PathBuf::from("/proj/artifacts/gradleplan"));
    }

    #[test]
    fn test_merge_cli_properties_come_first() {
        let config = parse_config("[toolchain]\nproperties = [\"gradle.properties\"]\n").unwrap();
        let cli_props = vec![Utf8PathBuf::from("/tmp/override.properties")];

        let merged =
            ConfigMerger::new(config, "/proj").merge(None, None, &BTreeMap::new(), &cli_props);
        assert_eq!(
            merged.toolchain.properties,
            vec![
                Utf8PathBuf::from("/tmp/override.properties"),
                Utf8PathBuf::from("/proj/gradle.properties"),
            ]
        );
    }

    #[test]
    fn test_merge_falls_back_to_local_properties() {
        let (_temp, root) = temp_root();
        let merged = ConfigMerger::new(GradleplanConfig::default(), root.clone()).merge(
            None,
            None,
            &BTreeMap::new(),
            &[],
        );
        assert!(merged.toolchain.properties.is_empty());

        std::fs::create_dir_all(root.join("android")).unwrap();
        std::fs::write(root.join(LOCAL_PROPERTIES), "flutter.minSdkVersion=21\n").unwrap();
        let merged = ConfigMerger::new(GradleplanConfig::default(), root.clone()).merge(
            None,
            None,
            &BTreeMap::new(),
            &[],
        );
        assert_eq!(merged.toolchain.properties, vec![root.join(LOCAL_PROPERTIES)]);
    }

    #[test]
    fn test_merge_local_properties_from_scan_root() {
        let (_temp, root) = temp_root();
        let scan = root.join("workspace");
        std::fs::create_dir_all(scan.join("android")).unwrap();
        std::fs::write(scan.join(LOCAL_PROPERTIES), "flutter.minSdkVersion=21\n").unwrap();

        let merged = ConfigMerger::new(GradleplanConfig::default(), root.clone())
            .with_local_root(scan.clone())
            .merge(None, None, &BTreeMap::new(), &[]);
        assert_eq!(merged.toolchain.properties, vec![scan.join(LOCAL_PROPERTIES)]);
    }

    #[test]
    fn test_parse_key_values() {
        let entries = vec![
            "flutter.minSdkVersion=21".to_string(),
            "flutter.versionName = 1.0.0".to_string(),
        ];
        let parsed = parse_key_values(&entries).expect("parse values");
        assert_eq!(parsed["flutter.minSdkVersion"], "21");
        assert_eq!(parsed["flutter.versionName"], "1.0.0");
    }

    #[test]
    fn test_parse_key_values_missing_parts() {
        let err = parse_key_values(&["=21".to_string()]).expect_err("missing key");
        assert!(err.to_string().contains("missing key"));
        let err = parse_key_values(&["flutter.minSdkVersion".to_string()]).expect_err("missing value");
        assert!(err.to_string().contains("missing value"));
    }

    #[test]
    fn test_load_or_default_when_missing() {
        let (_temp, root) = temp_root();
        assert!(discover_config(&root).is_none());
        let cfg = load_or_default(&root).expect("load default");
        assert!(cfg.toolchain.properties.is_empty());

        std::fs::write(root.join(CONFIG_FILE_NAME), "").expect("write config");
        assert!(discover_config(&root).is_some());
    }
}
