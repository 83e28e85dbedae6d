//! Domain logic: turn a configuration document into a deterministic build plan.
//!
//! This crate owns *what* a valid configuration is and how it resolves. It does not read files or
//! write artifacts; that's `gradleplan-ingest` and `gradleplan-core`.

mod compare;
mod dependencies;
mod error;
mod planner;
mod plugins;
mod ports;
mod sdk;

pub use compare::compare_drafts;
pub use dependencies::{ResolvedDependencies, resolve_dependencies};
pub use error::{
    BindingFailure, BindingFailureReason, DependencyIssue, PluginViolation, ResolveError,
};
pub use planner::{build_plan, compose_plan};
pub use plugins::{ORDERING_RULES, OrderingRule, canonical_plugin_id, validate_plugins};
pub use ports::{BomCatalog, NoToolchain, StaticBomCatalog, ToolchainProvider};
pub use sdk::resolve_sdk_bindings;
