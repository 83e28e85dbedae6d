//! Normalised configuration document.
//!
//! Every input format (`build.gradle.kts`, TOML, JSON) is lowered into a
//! [`ConfigDocument`] before resolution.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigDocument {
    #[serde(default)]
    pub plugins: Vec<PluginDeclaration>,

    #[serde(default)]
    pub android: AndroidBlock,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flutter: Option<FlutterBlock>,

    /// `platform(...)` entries, in declaration order.
    #[serde(default)]
    pub boms: Vec<BomRef>,

    #[serde(default)]
    pub dependencies: Vec<DependencyDeclaration>,
}

impl ConfigDocument {
    /// Append a plugin, assigning the next applied order.
    pub fn push_plugin(&mut self, id: impl Into<String>) {
        let applied_order = self.plugins.len() as u32;
        self.plugins.push(PluginDeclaration {
            id: id.into(),
            applied_order,
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDeclaration {
    pub id: String,
    pub applied_order: u32,
}

/// SDK and version fields that can be bound literally or through the toolchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SdkField {
    CompileSdk,
    MinSdk,
    TargetSdk,
    VersionCode,
    VersionName,
    NdkVersion,
}

impl SdkField {
    pub const ALL: [SdkField; 6] = [
        SdkField::CompileSdk,
        SdkField::MinSdk,
        SdkField::TargetSdk,
        SdkField::VersionCode,
        SdkField::VersionName,
        SdkField::NdkVersion,
    ];

    /// Property name as written in a Gradle build script.
    pub fn gradle_name(self) -> &'static str {
        match self {
            SdkField::CompileSdk => "compileSdk",
            SdkField::MinSdk => "minSdk",
            SdkField::TargetSdk => "targetSdk",
            SdkField::VersionCode => "versionCode",
            SdkField::VersionName => "versionName",
            SdkField::NdkVersion => "ndkVersion",
        }
    }

    pub fn from_gradle_name(name: &str) -> Option<Self> {
        // Legacy `*Version` spellings are accepted for the SDK levels.
        match name {
            "compileSdk" | "compileSdkVersion" => Some(SdkField::CompileSdk),
            "minSdk" | "minSdkVersion" => Some(SdkField::MinSdk),
            "targetSdk" | "targetSdkVersion" => Some(SdkField::TargetSdk),
            "versionCode" => Some(SdkField::VersionCode),
            "versionName" => Some(SdkField::VersionName),
            "ndkVersion" => Some(SdkField::NdkVersion),
            _ => None,
        }
    }

    /// Whether the field must resolve to an integer.
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            SdkField::CompileSdk | SdkField::MinSdk | SdkField::TargetSdk | SdkField::VersionCode
        )
    }

    /// Whether a plan cannot be built without this field.
    pub fn is_required(self) -> bool {
        !matches!(self, SdkField::NdkVersion)
    }
}

impl fmt::Display for SdkField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.gradle_name())
    }
}

/// A literal value written in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    Int(i64),
    Text(String),
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Int(n) => write!(f, "{}", n),
            LiteralValue::Text(s) => f.write_str(s),
        }
    }
}

/// Where an SDK field takes its value from.
///
/// Serialized untagged: `21`, `"1.0"` or `{ "toolchain": "flutter.minSdkVersion" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BindingSource {
    Literal(LiteralValue),
    Indirect { toolchain: String },
}

impl BindingSource {
    pub fn literal_int(n: i64) -> Self {
        BindingSource::Literal(LiteralValue::Int(n))
    }

    pub fn literal_text(s: impl Into<String>) -> Self {
        BindingSource::Literal(LiteralValue::Text(s.into()))
    }

    pub fn indirect(key: impl Into<String>) -> Self {
        BindingSource::Indirect {
            toolchain: key.into(),
        }
    }

    pub fn mode(&self) -> BindingMode {
        match self {
            BindingSource::Literal(_) => BindingMode::Literal,
            BindingSource::Indirect { .. } => BindingMode::Indirect,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingMode {
    Literal,
    Indirect,
}

/// One binding per field; the map makes a second binding for the same field unrepresentable.
pub type SdkBindings = BTreeMap<SdkField, BindingSource>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AndroidBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,

    #[serde(default)]
    pub sdk: SdkBindings,

    #[serde(default)]
    pub compile_options: CompileOptions,

    #[serde(default)]
    pub kotlin_options: KotlinOptions,

    #[serde(default)]
    pub build_types: BTreeMap<String, BuildType>,

    /// Signing configs declared in the document. `debug` always exists implicitly.
    #[serde(default)]
    pub signing_configs: BTreeSet<String>,
}

/// Java language levels, normalised to `"1.8"`, `"11"`, `"17"`, ...
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_compatibility: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_compatibility: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KotlinOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jvm_target: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_config: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minify_enabled: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlutterBlock {
    pub source: String,
}

/// `group:artifact` without a version.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactId {
    pub group: String,
    pub artifact: String,
}

impl ArtifactId {
    pub fn new(group: impl Into<String>, artifact: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
        }
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.artifact)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinateError(pub String);

impl fmt::Display for CoordinateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid dependency coordinate '{}'", self.0)
    }
}

impl std::error::Error for CoordinateError {}

impl FromStr for ArtifactId {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match parse_coordinate(s)? {
            (id, None) => Ok(id),
            (_, Some(_)) => Err(CoordinateError(s.to_string())),
        }
    }
}

impl TryFrom<String> for ArtifactId {
    type Error = CoordinateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ArtifactId> for String {
    fn from(id: ArtifactId) -> Self {
        id.to_string()
    }
}

/// Split `group:artifact[:version]`.
pub fn parse_coordinate(s: &str) -> Result<(ArtifactId, Option<String>), CoordinateError> {
    let parts: Vec<&str> = s.trim().split(':').collect();
    if parts.iter().any(|p| p.trim().is_empty()) {
        return Err(CoordinateError(s.to_string()));
    }
    match parts.as_slice() {
        [group, artifact] => Ok((ArtifactId::new(*group, *artifact), None)),
        [group, artifact, version] => Ok((
            ArtifactId::new(*group, *artifact),
            Some(version.to_string()),
        )),
        _ => Err(CoordinateError(s.to_string())),
    }
}

/// A `platform("group:artifact:version")` import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomRef {
    pub configuration: String,
    pub artifact: ArtifactId,
    pub version: String,
}

impl BomRef {
    /// Full `group:artifact:version` coordinate.
    pub fn coordinate(&self) -> String {
        format!("{}:{}", self.artifact, self.version)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyDeclaration {
    pub configuration: String,
    pub artifact: ArtifactId,
    pub version: VersionConstraint,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "version", rename_all = "snake_case")]
pub enum VersionConstraint {
    Explicit(String),
    /// No version written; inherited from a BOM.
    FromBom,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_coordinate_with_and_without_version() {
        let (id, v) = parse_coordinate("com.google.firebase:firebase-bom:32.2.2").unwrap();
        assert_eq!(id.to_string(), "com.google.firebase:firebase-bom");
        assert_eq!(v.as_deref(), Some("32.2.2"));

        let (id, v) = parse_coordinate("com.google.firebase:firebase-auth").unwrap();
        assert_eq!(id.artifact, "firebase-auth");
        assert!(v.is_none());
    }

    #[test]
    fn parse_coordinate_rejects_malformed() {
        assert!(parse_coordinate("firebase-auth").is_err());
        assert!(parse_coordinate("a::1").is_err());
        assert!(parse_coordinate("a:b:c:d").is_err());
    }

    #[test]
    fn artifact_id_serializes_as_string() {
        let id = ArtifactId::new("com.google.firebase", "firebase-auth");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"com.google.firebase:firebase-auth\"");
        let back: ArtifactId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn binding_source_untagged_forms() {
        let lit: BindingSource = serde_json::from_str("21").unwrap();
        assert_eq!(lit, BindingSource::literal_int(21));

        let text: BindingSource = serde_json::from_str("\"1.0\"").unwrap();
        assert_eq!(text, BindingSource::literal_text("1.0"));

        let ind: BindingSource =
            serde_json::from_str(r#"{"toolchain":"flutter.minSdkVersion"}"#).unwrap();
        assert_eq!(ind.mode(), BindingMode::Indirect);
    }

    #[test]
    fn sdk_field_accepts_legacy_names() {
        assert_eq!(
            SdkField::from_gradle_name("minSdkVersion"),
            Some(SdkField::MinSdk)
        );
        assert_eq!(SdkField::from_gradle_name("namespace"), None);
        assert!(SdkField::VersionCode.is_integer());
        assert!(!SdkField::VersionName.is_integer());
        assert!(!SdkField::NdkVersion.is_required());
    }

    #[test]
    fn push_plugin_assigns_sequential_order() {
        let mut doc = ConfigDocument::default();
        doc.push_plugin("com.android.application");
        doc.push_plugin("kotlin-android");
        assert_eq!(doc.plugins[1].applied_order, 1);
    }
}
