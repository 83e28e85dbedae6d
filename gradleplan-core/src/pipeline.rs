//! Core plan, check and compare pipelines, extracted from the CLI.
//!
//! These entry points are I/O-agnostic: documents are read through a
//! [`DocumentSource`] and artifacts are written through a [`WritePort`].

use crate::ports::{DocumentSource, WritePort};
use crate::settings::PlanSettings;
use anyhow::Context;
use camino::Utf8Path;
use chrono::{DateTime, Utc};
use diffy::PatchFormatter;
use gradleplan_domain::{BomCatalog, ResolveError, ToolchainProvider, build_plan, compare_drafts};
use gradleplan_render::{render_plan_md, render_report_md};
use gradleplan_types::compare::DraftComparison;
use gradleplan_types::plan::BuildPlan;
use gradleplan_types::report::{RunInfo, RunReport, ToolInfo, Verdict, VerdictStatus};
use tracing::{debug, info};

/// Error type for pipeline results. Exit code 2 = validation failure, 1 = tool error.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("{0}")]
    Validation(#[from] ResolveError),
    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

impl ToolError {
    pub fn exit_code(&self) -> u8 {
        match self {
            ToolError::Validation(_) => 2,
            ToolError::Internal(_) => 1,
        }
    }
}

/// Outcome of `run_plan`.
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub plan: BuildPlan,
    pub report: RunReport,
}

/// Resolve the configured document into a plan.
///
/// Validation failures come back as [`ToolError::Validation`]. The caller is responsible for
/// writing artifacts (via `WritePort`) or the convenience `write_plan_artifacts` helper.
pub fn run_plan(
    settings: &PlanSettings,
    source: &dyn DocumentSource,
    toolchain: &dyn ToolchainProvider,
    catalog: &dyn BomCatalog,
) -> Result<PlanOutcome, ToolError> {
    let started_at = Utc::now();
    let document = source.load_document(&settings.document)?;

    let plan = build_plan(&document, toolchain, catalog)?;
    info!(
        document = %settings.document,
        plan_id = %plan.plan_id,
        warnings = plan.warnings.len(),
        "resolved build plan"
    );

    let report = report_from_plan(&settings.document, &plan, started_at);
    Ok(PlanOutcome { plan, report })
}

/// Resolve the configured document and report the verdict without producing a plan.
///
/// Validation failures are part of the report (`fail` verdict); only tool errors are `Err`.
pub fn run_check(
    settings: &PlanSettings,
    source: &dyn DocumentSource,
    toolchain: &dyn ToolchainProvider,
    catalog: &dyn BomCatalog,
) -> Result<RunReport, ToolError> {
    let started_at = Utc::now();
    let document = source.load_document(&settings.document)?;

    let report = match build_plan(&document, toolchain, catalog) {
        Ok(plan) => report_from_plan(&settings.document, &plan, started_at),
        Err(err) => {
            debug!(document = %settings.document, code = err.code(), "document failed validation");
            report_from_error(&settings.document, &err, started_at)
        }
    };
    Ok(report)
}

/// Check every configuration document discovered under `root`.
pub fn run_check_root(
    root: &Utf8Path,
    source: &dyn DocumentSource,
    toolchain: &dyn ToolchainProvider,
    catalog: &dyn BomCatalog,
) -> Result<Vec<RunReport>, ToolError> {
    let documents = gradleplan_ingest::discover_documents(root)
        .with_context(|| format!("discover documents under {}", root))?;
    if documents.is_empty() {
        return Err(anyhow::anyhow!("no configuration documents found under {}", root).into());
    }

    let mut reports = Vec::with_capacity(documents.len());
    for document in documents {
        let settings = PlanSettings {
            document,
            ..PlanSettings::default()
        };
        reports.push(run_check(&settings, source, toolchain, catalog)?);
    }
    Ok(reports)
}

/// Outcome of `run_compare`.
#[derive(Debug, Clone)]
pub struct CompareOutcome {
    pub comparison: DraftComparison,
    /// Unified diff of the two documents' canonical JSON; empty when they are equal.
    pub diff: String,
}

/// Compare two drafts of the same configuration.
pub fn run_compare(
    left: &Utf8Path,
    right: &Utf8Path,
    source: &dyn DocumentSource,
) -> Result<CompareOutcome, ToolError> {
    let left_doc = source.load_document(left)?;
    let right_doc = source.load_document(right)?;

    let comparison = compare_drafts(left.as_str(), &left_doc, right.as_str(), &right_doc);

    let left_json = canonical_json(&left_doc).context("serialize left document")?;
    let right_json = canonical_json(&right_doc).context("serialize right document")?;
    let diff = if left_json == right_json {
        String::new()
    } else {
        let mut out = format!("--- a/{}\n+++ b/{}\n", left, right);
        let patch = diffy::create_patch(&left_json, &right_json);
        let body = PatchFormatter::new().fmt_patch(&patch).to_string();
        // diffy emits its own ---/+++ header; keep only the hunks.
        for line in body.lines().skip_while(|l| !l.starts_with("@@")) {
            out.push_str(line);
            out.push('\n');
        }
        out
    };

    debug!(
        mode_drift = comparison.mode_drift().len(),
        diff_bytes = diff.len(),
        "compared drafts"
    );
    Ok(CompareOutcome { comparison, diff })
}

fn canonical_json<T: serde::Serialize>(value: &T) -> anyhow::Result<String> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    Ok(json)
}

/// Write `plan.json`, `plan.md`, `report.json` and `report.md` to the output directory.
pub fn write_plan_artifacts(
    outcome: &PlanOutcome,
    out_dir: &Utf8Path,
    writer: &dyn WritePort,
) -> anyhow::Result<()> {
    writer.create_dir_all(out_dir)?;

    let plan_json = canonical_json(&outcome.plan).context("serialize plan")?;
    writer.write_file(&out_dir.join("plan.json"), plan_json.as_bytes())?;

    let plan_md = render_plan_md(&outcome.plan);
    writer.write_file(&out_dir.join("plan.md"), plan_md.as_bytes())?;

    write_report(&outcome.report, out_dir, writer)
}

/// Write `report.json` and `report.md` to the output directory.
pub fn write_report(
    report: &RunReport,
    out_dir: &Utf8Path,
    writer: &dyn WritePort,
) -> anyhow::Result<()> {
    writer.create_dir_all(out_dir)?;

    let report_json = canonical_json(report).context("serialize report")?;
    writer.write_file(&out_dir.join("report.json"), report_json.as_bytes())?;

    let report_md = render_report_md(report);
    writer.write_file(&out_dir.join("report.md"), report_md.as_bytes())?;
    Ok(())
}

pub fn tool_info() -> ToolInfo {
    ToolInfo {
        name: "gradleplan".to_string(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    }
}

pub(crate) fn report_from_plan(
    document: &Utf8Path,
    plan: &BuildPlan,
    started_at: DateTime<Utc>,
) -> RunReport {
    let status = if plan.warnings.is_empty() {
        VerdictStatus::Pass
    } else {
        VerdictStatus::Warn
    };
    RunReport {
        schema: gradleplan_types::schema::GRADLEPLAN_REPORT_V1.to_string(),
        tool: tool_info(),
        run: RunInfo {
            started_at,
            ended_at: Some(Utc::now()),
        },
        verdict: Verdict {
            status,
            code: None,
            reasons: plan.warnings.iter().map(|w| w.message.clone()).collect(),
        },
        document: document.to_string(),
        plan_id: Some(plan.plan_id.clone()),
        digest: Some(plan.digest.clone()),
        warnings: plan.warnings.len() as u64,
    }
}

/// Report for a document that failed validation.
pub fn report_from_error(
    document: &Utf8Path,
    err: &ResolveError,
    started_at: DateTime<Utc>,
) -> RunReport {
    RunReport {
        schema: gradleplan_types::schema::GRADLEPLAN_REPORT_V1.to_string(),
        tool: tool_info(),
        run: RunInfo {
            started_at,
            ended_at: Some(Utc::now()),
        },
        verdict: Verdict {
            status: VerdictStatus::Fail,
            code: Some(err.code().to_string()),
            reasons: err.reasons(),
        },
        document: document.to_string(),
        plan_id: None,
        digest: None,
        warnings: 0,
    }
}
