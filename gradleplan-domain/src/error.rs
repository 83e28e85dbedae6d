//! Validation error taxonomy.
//!
//! Every variant is non-retryable and is raised before any build side effect. Each one lists all
//! the problems found in its stage, not only the first.

use gradleplan_types::document::{ArtifactId, SdkField};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("plugin order error: {}", join(.violations))]
    PluginOrder { violations: Vec<PluginViolation> },

    #[error("unresolved binding: {}", join(.failures))]
    UnresolvedBinding { failures: Vec<BindingFailure> },

    #[error("dependency conflict: {}", join(.issues))]
    DependencyConflict { issues: Vec<DependencyIssue> },

    #[error("incomplete configuration: missing {}", .missing.join(", "))]
    IncompleteConfiguration { missing: Vec<String> },
}

impl ResolveError {
    /// Stable machine-readable code, used in reports and by `gradleplan explain`.
    pub fn code(&self) -> &'static str {
        match self {
            ResolveError::PluginOrder { .. } => "plugin_order",
            ResolveError::UnresolvedBinding { .. } => "unresolved_binding",
            ResolveError::DependencyConflict { .. } => "dependency_conflict",
            ResolveError::IncompleteConfiguration { .. } => "incomplete_configuration",
        }
    }

    /// One human-readable line per problem.
    pub fn reasons(&self) -> Vec<String> {
        match self {
            ResolveError::PluginOrder { violations } => to_strings(violations),
            ResolveError::UnresolvedBinding { failures } => to_strings(failures),
            ResolveError::DependencyConflict { issues } => to_strings(issues),
            ResolveError::IncompleteConfiguration { missing } => missing.clone(),
        }
    }
}

fn to_strings<T: fmt::Display>(items: &[T]) -> Vec<String> {
    items.iter().map(|i| i.to_string()).collect()
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    to_strings(items).join("; ")
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PluginViolation {
    #[error("plugin #{position} has an empty id")]
    EmptyId { position: u32 },

    #[error("plugin '{id}' declared twice (#{first} and #{second})")]
    Duplicate { id: String, first: u32, second: u32 },

    #[error("plugins '{first}' and '{second}' share position #{position}")]
    SharedPosition {
        first: String,
        second: String,
        position: u32,
    },

    #[error("plugin '{id}' (#{position}) must be declared after '{must_follow}' (#{prerequisite_position})")]
    OutOfOrder {
        id: String,
        position: u32,
        must_follow: String,
        prerequisite_position: u32,
    },

    #[error("plugin '{id}' (#{position}) requires one of [{}] declared before it", .requires.join(", "))]
    MissingPrerequisite {
        id: String,
        position: u32,
        requires: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct BindingFailure {
    pub field: SdkField,
    pub reason: BindingFailureReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingFailureReason {
    #[error("toolchain provides no value for '{key}'")]
    MissingToolchainValue { key: String },

    #[error("expected an integer, got '{value}'")]
    NotAnInteger { value: String },

    #[error("expected a positive integer, got {value}")]
    NotPositive { value: i64 },

    #[error("value is empty")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DependencyIssue {
    #[error("{artifact} declared with conflicting versions [{}]", .versions.join(", "))]
    ConflictingVersions {
        artifact: ArtifactId,
        versions: Vec<String>,
    },

    #[error("{artifact} declared at {explicit} but {bom} pins {managed}")]
    BomVersionMismatch {
        artifact: ArtifactId,
        explicit: String,
        managed: String,
        bom: String,
    },

    #[error("{artifact} pinned differently by [{}]", .boms.join(", "))]
    OverlappingBoms {
        artifact: ArtifactId,
        boms: Vec<String>,
    },

    #[error("BOM {bom} imported at several versions [{}]", .versions.join(", "))]
    DuplicateBom {
        bom: ArtifactId,
        versions: Vec<String>,
    },

    #[error("BOM {bom} is not in the catalog")]
    UnknownBom { bom: String },

    #[error("{artifact} has no version and no imported BOM manages it")]
    Unmanaged { artifact: ArtifactId },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        let err = ResolveError::IncompleteConfiguration {
            missing: vec!["applicationId".to_string()],
        };
        assert_eq!(err.code(), "incomplete_configuration");
        assert_eq!(
            err.to_string(),
            "incomplete configuration: missing applicationId"
        );
    }

    #[test]
    fn display_lists_every_violation() {
        let err = ResolveError::PluginOrder {
            violations: vec![
                PluginViolation::Duplicate {
                    id: "kotlin-android".to_string(),
                    first: 0,
                    second: 2,
                },
                PluginViolation::EmptyId { position: 3 },
            ],
        };
        let msg = err.to_string();
        assert!(msg.starts_with("plugin order error: "));
        assert!(msg.contains("declared twice (#0 and #2)"));
        assert!(msg.contains("; plugin #3 has an empty id"));
        assert_eq!(err.reasons().len(), 2);
    }

    #[test]
    fn binding_failure_display_names_field() {
        let f = BindingFailure {
            field: SdkField::MinSdk,
            reason: BindingFailureReason::MissingToolchainValue {
                key: "flutter.minSdkVersion".to_string(),
            },
        };
        assert_eq!(
            f.to_string(),
            "minSdk: toolchain provides no value for 'flutter.minSdkVersion'"
        );
    }
}
