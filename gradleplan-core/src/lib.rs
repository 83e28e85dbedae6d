//! Embeddable core library for gradleplan.
//!
//! Provides a clap-free, I/O-abstracted entry point suitable for linking
//! into a build orchestrator or other host process.
//!
//! # Port traits
//!
//! All I/O is abstracted behind port traits in [`ports`]:
//! - [`DocumentSource`](ports::DocumentSource) loads configuration documents
//! - [`WritePort`](ports::WritePort) writes files and creates directories
//!
//! The [`adapters`] module provides default filesystem-backed implementations,
//! plus the toolchain providers fed from `.properties` files.
//!
//! # Entry points
//!
//! - [`run_plan`](pipeline::run_plan) resolves a document into a plan + report
//! - [`run_check`](pipeline::run_check) resolves and reports without a plan
//! - [`run_compare`](pipeline::run_compare) compares two drafts

pub mod adapters;
pub mod pipeline;
pub mod ports;
pub mod settings;

// Re-export the domain's seams so callers don't need gradleplan-domain directly.
pub use gradleplan_domain::{
    BomCatalog, NoToolchain, ResolveError, StaticBomCatalog, ToolchainProvider,
};
