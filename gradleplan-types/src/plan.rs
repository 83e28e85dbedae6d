use crate::document::{
    ArtifactId, BomRef, BuildType, CompileOptions, KotlinOptions, LiteralValue, PluginDeclaration,
    SdkField,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The resolved, immutable output of a resolver run.
///
/// Contains no timestamps or host-specific data: identical inputs produce a byte-identical plan,
/// so `digest` doubles as a build-cache key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPlan {
    pub schema: String,

    /// UUID v5 derived from `digest`.
    pub plan_id: String,

    /// sha256 over the canonical plan content (every field below).
    pub digest: String,

    pub namespace: String,
    pub application_id: String,

    pub plugins: Vec<PluginDeclaration>,

    pub sdk: ResolvedSdk,

    #[serde(default)]
    pub compile_options: CompileOptions,

    #[serde(default)]
    pub kotlin_options: KotlinOptions,

    #[serde(default)]
    pub build_types: BTreeMap<String, BuildType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flutter_source: Option<String>,

    #[serde(default)]
    pub boms: Vec<BomRef>,

    #[serde(default)]
    pub dependencies: Vec<ResolvedDependency>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<PlanWarning>,
}

impl BuildPlan {
    pub fn sdk_value(&self, field: SdkField) -> Option<&LiteralValue> {
        self.sdk.get(&field).map(|v| &v.value)
    }

    pub fn sdk_int(&self, field: SdkField) -> Option<i64> {
        match self.sdk_value(field)? {
            LiteralValue::Int(n) => Some(*n),
            LiteralValue::Text(_) => None,
        }
    }

    /// First resolved dependency for `group:artifact`.
    pub fn dependency(&self, artifact: &str) -> Option<&ResolvedDependency> {
        self.dependencies
            .iter()
            .find(|d| d.artifact.to_string() == artifact)
    }
}

pub type ResolvedSdk = BTreeMap<SdkField, ResolvedSdkValue>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSdkValue {
    pub value: LiteralValue,
    pub origin: ValueOrigin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueOrigin {
    Literal,
    Toolchain { key: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDependency {
    pub configuration: String,
    pub artifact: ArtifactId,
    pub version: String,
    pub origin: VersionOrigin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VersionOrigin {
    Explicit,
    /// Pinned by the BOM with this `group:artifact:version` coordinate.
    Bom { bom: String },
}

/// Non-fatal observation attached to a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanWarning {
    pub code: String,
    pub message: String,
}

/// Stable tokens for warning codes.
pub mod warning_codes {
    pub const TARGET_ABOVE_COMPILE: &str = "target_sdk_above_compile_sdk";
    pub const MIN_ABOVE_TARGET: &str = "min_sdk_above_target_sdk";
    pub const JVM_TARGET_MISMATCH: &str = "jvm_target_mismatch";
}
