mod config;
mod explain;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use clap::{Parser, Subcommand};
use config::{ConfigMerger, MergedConfig};
use gradleplan_core::adapters::{FsDocumentSource, FsWritePort, bom_catalog, toolchain_from_settings};
use gradleplan_core::pipeline::{
    ToolError, report_from_error, run_check, run_check_root, run_compare, run_plan,
    write_plan_artifacts, write_report,
};
use gradleplan_core::settings::PlanSettings;
use gradleplan_render::{render_comparison_md, render_report_md};
use gradleplan_types::report::{RunReport, VerdictStatus};
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "gradleplan",
    version,
    about = "Deterministic build plans for Flutter Android Gradle modules."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve a configuration document into a build plan.
    Plan(PlanArgs),
    /// Validate configuration documents without writing a plan.
    Check(CheckArgs),
    /// Compare two drafts of the same module configuration.
    Compare(CompareArgs),
    /// Explain an error or warning code.
    Explain(ExplainArgs),
    /// List all error and warning codes.
    ListCodes(ListCodesArgs),
}

#[derive(Debug, Parser)]
struct ToolchainArgs {
    /// Project root holding gradleplan.toml (default: current directory).
    #[arg(long, default_value = ".")]
    project_root: Utf8PathBuf,

    /// Toolchain value as KEY=VALUE (e.g. flutter.minSdkVersion=21). Repeatable.
    #[arg(long = "toolchain", value_name = "KEY=VALUE")]
    toolchain: Vec<String>,

    /// Java .properties file to read toolchain values from. Repeatable.
    #[arg(long = "properties", value_name = "FILE")]
    properties: Vec<Utf8PathBuf>,
}

#[derive(Debug, Parser)]
struct PlanArgs {
    #[command(flatten)]
    toolchain: ToolchainArgs,

    /// Configuration document (default: <project_root>/android/app/build.gradle.kts).
    #[arg(long)]
    doc: Option<Utf8PathBuf>,

    /// Output directory for artifacts (default: <project_root>/artifacts/gradleplan).
    #[arg(long)]
    out_dir: Option<Utf8PathBuf>,
}

#[derive(Debug, Parser)]
struct CheckArgs {
    #[command(flatten)]
    toolchain: ToolchainArgs,

    /// Configuration document to check.
    #[arg(long, conflicts_with = "root")]
    doc: Option<Utf8PathBuf>,

    /// Check every build.gradle.kts and gradleplan.doc.toml under this directory.
    #[arg(long)]
    root: Option<Utf8PathBuf>,

    /// Also write report.json and report.md here (single document only).
    #[arg(long, conflicts_with = "root")]
    out_dir: Option<Utf8PathBuf>,

    /// Print reports as JSON instead of markdown.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Debug, Parser)]
struct CompareArgs {
    /// First draft.
    left: Utf8PathBuf,

    /// Second draft.
    right: Utf8PathBuf,

    /// Print the comparison as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Print the unified diff of both documents after the comparison.
    #[arg(long, default_value_t = false)]
    diff: bool,
}

#[derive(Debug, Parser)]
struct ExplainArgs {
    /// Code to explain (e.g., "plugin_order", "UnresolvedBindingError").
    code: String,
}

#[derive(Debug, Parser)]
struct ListCodesArgs {
    /// Output format (text, json).
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match real_main() {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn real_main() -> Result<u8, ToolError> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Plan(args) => cmd_plan(args),
        Command::Check(args) => cmd_check(args),
        Command::Compare(args) => cmd_compare(args),
        Command::Explain(args) => {
            cmd_explain(args)?;
            Ok(0)
        }
        Command::ListCodes(args) => {
            cmd_list_codes(args)?;
            Ok(0)
        }
    }
}

fn merged_config(
    toolchain: &ToolchainArgs,
    doc: Option<Utf8PathBuf>,
    out_dir: Option<Utf8PathBuf>,
    scan_root: Option<&Utf8Path>,
) -> anyhow::Result<MergedConfig> {
    let root = &toolchain.project_root;
    let file_config = config::load_or_default(root).context("load gradleplan.toml config")?;
    let cli_values = config::parse_key_values(&toolchain.toolchain)?;
    let mut merger = ConfigMerger::new(file_config, root.clone());
    if let Some(scan_root) = scan_root {
        merger = merger.with_local_root(scan_root);
    }
    let merged = merger.merge(doc, out_dir, &cli_values, &toolchain.properties);
    debug!(
        "merged config: document={}, out_dir={}, values={:?}, properties={:?}, boms={}",
        merged.document,
        merged.out_dir,
        merged.toolchain.values,
        merged.toolchain.properties,
        merged.boms.len()
    );
    Ok(merged)
}

fn cmd_plan(args: PlanArgs) -> Result<u8, ToolError> {
    let merged = merged_config(&args.toolchain, args.doc, args.out_dir, None)?;
    let toolchain = toolchain_from_settings(&merged.toolchain)?;
    let catalog = bom_catalog(&merged.boms)?;
    let settings = PlanSettings {
        document: merged.document,
        out_dir: merged.out_dir,
    };

    let started_at = Utc::now();
    match run_plan(&settings, &FsDocumentSource, &toolchain, &catalog) {
        Ok(outcome) => {
            write_plan_artifacts(&outcome, &settings.out_dir, &FsWritePort)
                .with_context(|| format!("write artifacts to {}", settings.out_dir))?;
            info!("wrote plan to {}", settings.out_dir);
            println!("{}", settings.out_dir.join("plan.json"));
            Ok(0)
        }
        Err(ToolError::Validation(err)) => {
            // The failed verdict still lands next to where the plan would have been.
            let report = report_from_error(&settings.document, &err, started_at);
            write_report(&report, &settings.out_dir, &FsWritePort)
                .with_context(|| format!("write report to {}", settings.out_dir))?;
            Err(ToolError::Validation(err))
        }
        Err(other) => Err(other),
    }
}

fn cmd_check(args: CheckArgs) -> Result<u8, ToolError> {
    let merged = merged_config(&args.toolchain, args.doc, None, args.root.as_deref())?;
    let toolchain = toolchain_from_settings(&merged.toolchain)?;
    let catalog = bom_catalog(&merged.boms)?;

    let reports = match &args.root {
        Some(root) => run_check_root(root, &FsDocumentSource, &toolchain, &catalog)?,
        None => {
            let settings = PlanSettings {
                document: merged.document,
                out_dir: merged.out_dir,
            };
            let report = run_check(&settings, &FsDocumentSource, &toolchain, &catalog)?;
            if let Some(out_dir) = &args.out_dir {
                write_report(&report, out_dir, &FsWritePort)
                    .with_context(|| format!("write report to {}", out_dir))?;
            }
            vec![report]
        }
    };

    // A scan always yields a list, even when it finds a single document.
    print_reports(&reports, args.json, args.root.is_some())?;

    let failed = reports
        .iter()
        .filter(|r| r.verdict.status == VerdictStatus::Fail)
        .count();
    info!(checked = reports.len(), failed, "check finished");
    Ok(if failed > 0 { 2 } else { 0 })
}

fn print_reports(reports: &[RunReport], json: bool, as_list: bool) -> anyhow::Result<()> {
    if json {
        let s = match reports {
            [single] if !as_list => serde_json::to_string_pretty(single),
            _ => serde_json::to_string_pretty(reports),
        }
        .context("serialize reports")?;
        println!("{}", s);
    } else {
        let rendered: Vec<String> = reports.iter().map(render_report_md).collect();
        print!("{}", rendered.join("\n"));
    }
    Ok(())
}

fn cmd_compare(args: CompareArgs) -> Result<u8, ToolError> {
    let outcome = run_compare(&args.left, &args.right, &FsDocumentSource)?;

    if args.json {
        let s = serde_json::to_string_pretty(&outcome.comparison).context("serialize comparison")?;
        println!("{}", s);
    } else {
        print!("{}", render_comparison_md(&outcome.comparison));
    }
    if args.diff && !outcome.diff.is_empty() {
        println!();
        print!("{}", outcome.diff);
    }
    Ok(0)
}

fn cmd_explain(args: ExplainArgs) -> anyhow::Result<()> {
    use explain::{format_kind, kind_meaning, list_codes, lookup_code};

    let Some(entry) = lookup_code(&args.code) else {
        let available = list_codes().join(", ");
        anyhow::bail!(
            "Unknown code: '{}'\n\nAvailable codes: {}",
            args.code,
            available
        );
    };

    println!("================================================================================");
    println!("{}: {}", format_kind(entry.kind).to_uppercase(), entry.title);
    println!("================================================================================");
    println!();
    println!("Code:    {}", entry.code);
    if !entry.aliases.is_empty() {
        println!("Aliases: {}", entry.aliases.join(", "));
    }
    println!("Kind:    {}", format_kind(entry.kind));
    println!();

    println!("DESCRIPTION");
    println!("--------------------------------------------------------------------------------");
    println!("{}", entry.description);
    println!();

    println!("EFFECT");
    println!("--------------------------------------------------------------------------------");
    println!("{}", kind_meaning(entry.kind));
    println!();

    println!("REMEDIATION GUIDANCE");
    println!("--------------------------------------------------------------------------------");
    println!("{}", entry.remediation);
    println!();

    Ok(())
}

fn cmd_list_codes(args: ListCodesArgs) -> anyhow::Result<()> {
    use explain::{CODE_REGISTRY, format_kind};

    match args.format {
        OutputFormat::Text => {
            println!("Available codes:\n");
            println!("  {:<30} {:<8} TITLE", "CODE", "KIND");
            println!("  {:<30} {:<8} -----", "----", "----");
            for entry in CODE_REGISTRY {
                println!(
                    "  {:<30} {:<8} {}",
                    entry.code,
                    format_kind(entry.kind),
                    entry.title
                );
            }
            println!();
            println!("Use 'gradleplan explain <code>' for details.");
        }
        OutputFormat::Json => {
            let codes: Vec<_> = CODE_REGISTRY
                .iter()
                .map(|e| {
                    serde_json::json!({
                        "code": e.code,
                        "kind": format_kind(e.kind).to_lowercase(),
                        "title": e.title,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&codes)?);
        }
    }
    Ok(())
}
