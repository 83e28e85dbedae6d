use crate::document::{BindingMode, SdkField};
use serde::{Deserialize, Serialize};

/// Side-by-side view of two drafts of the same configuration.
///
/// Neither side is treated as authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftComparison {
    pub schema: String,
    pub left: String,
    pub right: String,

    /// One row per SDK field bound in either draft.
    #[serde(default)]
    pub fields: Vec<FieldComparison>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plugins_only_left: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plugins_only_right: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies_only_left: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies_only_right: Vec<String>,

    /// Non-SDK settings that differ, such as `namespace` or `plugin_order`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub settings: Vec<SettingComparison>,
}

impl DraftComparison {
    /// Fields bound literally on one side and through the toolchain on the other.
    pub fn mode_drift(&self) -> Vec<SdkField> {
        self.fields
            .iter()
            .filter(|f| f.drift == Some(FieldDrift::Mode))
            .map(|f| f.field)
            .collect()
    }

    pub fn is_identical(&self) -> bool {
        self.fields.iter().all(|f| f.drift.is_none())
            && self.plugins_only_left.is_empty()
            && self.plugins_only_right.is_empty()
            && self.dependencies_only_left.is_empty()
            && self.dependencies_only_right.is_empty()
            && self.settings.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldComparison {
    pub field: SdkField,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_mode: Option<BindingMode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_mode: Option<BindingMode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drift: Option<FieldDrift>,
}

/// A setting whose value differs between the drafts; `None` means unset on that side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingComparison {
    pub setting: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldDrift {
    /// Literal on one side, indirect on the other.
    Mode,
    /// Same mode, different literal value or toolchain key.
    Value,
    /// Bound on one side only.
    Missing,
}
