//! Shared DTOs (schemas-as-code) for the gradleplan workspace.
//!
//! # Design constraints
//! - Plans and reports are serialized to disk and read by build executors.
//! - Be conservative with breaking changes.
//! - Prefer adding optional fields over changing semantics.

pub mod compare;
pub mod document;
pub mod plan;
pub mod report;

/// Schema identifiers.
pub mod schema {
    pub const GRADLEPLAN_PLAN_V1: &str = "gradleplan.plan.v1";
    pub const GRADLEPLAN_REPORT_V1: &str = "gradleplan.report.v1";
    pub const GRADLEPLAN_COMPARE_V1: &str = "gradleplan.compare.v1";
}
