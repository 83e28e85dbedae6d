//! Rendering helpers (markdown) for human-readable artifacts.

use gradleplan_types::compare::{DraftComparison, FieldDrift};
use gradleplan_types::document::BindingMode;
use gradleplan_types::plan::{BuildPlan, ValueOrigin, VersionOrigin};
use gradleplan_types::report::{RunReport, VerdictStatus};

pub fn render_plan_md(plan: &BuildPlan) -> String {
    let mut out = String::new();
    out.push_str("# gradleplan plan\n\n");
    out.push_str(&format!("- Namespace: `{}`\n", plan.namespace));
    out.push_str(&format!("- Application id: `{}`\n", plan.application_id));
    out.push_str(&format!("- Plan id: `{}`\n", plan.plan_id));
    out.push_str(&format!("- Digest: `{}`\n", plan.digest));
    if let Some(source) = &plan.flutter_source {
        out.push_str(&format!("- Flutter source: `{}`\n", source));
    }
    out.push('\n');

    out.push_str("## Plugins\n\n");
    for (i, p) in plan.plugins.iter().enumerate() {
        out.push_str(&format!("{}. `{}`\n", i + 1, p.id));
    }
    out.push('\n');

    out.push_str("## SDK\n\n");
    out.push_str("| Field | Value | Origin |\n|---|---|---|\n");
    for (field, resolved) in &plan.sdk {
        let origin = match &resolved.origin {
            ValueOrigin::Literal => "literal".to_string(),
            ValueOrigin::Toolchain { key } => format!("toolchain `{}`", key),
        };
        out.push_str(&format!(
            "| `{}` | `{}` | {} |\n",
            field, resolved.value, origin
        ));
    }
    out.push('\n');

    let java = [
        (
            "sourceCompatibility",
            plan.compile_options.source_compatibility.as_deref(),
        ),
        (
            "targetCompatibility",
            plan.compile_options.target_compatibility.as_deref(),
        ),
        ("jvmTarget", plan.kotlin_options.jvm_target.as_deref()),
    ];
    if java.iter().any(|(_, v)| v.is_some()) {
        out.push_str("## JVM\n\n");
        for (name, value) in java {
            if let Some(v) = value {
                out.push_str(&format!("- {}: `{}`\n", name, v));
            }
        }
        out.push('\n');
    }

    if !plan.build_types.is_empty() {
        out.push_str("## Build types\n\n");
        for (name, bt) in &plan.build_types {
            let signing = bt.signing_config.as_deref().unwrap_or("-");
            out.push_str(&format!("- `{}`: signing config `{}`", name, signing));
            if let Some(minify) = bt.minify_enabled {
                out.push_str(&format!(", minify `{}`", minify));
            }
            out.push('\n');
        }
        out.push('\n');
    }

    out.push_str("## Dependencies\n\n");
    if plan.boms.is_empty() && plan.dependencies.is_empty() {
        out.push_str("_No dependencies declared._\n");
    } else {
        for bom in &plan.boms {
            out.push_str(&format!(
                "- {}(platform(`{}`))\n",
                bom.configuration,
                bom.coordinate()
            ));
        }
        for dep in &plan.dependencies {
            let origin = match &dep.origin {
                VersionOrigin::Explicit => "explicit".to_string(),
                VersionOrigin::Bom { bom } => format!("from `{}`", bom),
            };
            out.push_str(&format!(
                "- {}(`{}:{}`) ({})\n",
                dep.configuration, dep.artifact, dep.version, origin
            ));
        }
    }

    if !plan.warnings.is_empty() {
        out.push_str("\n## Warnings\n\n");
        for w in &plan.warnings {
            out.push_str(&format!("- `{}`: {}\n", w.code, w.message));
        }
    }

    out
}

pub fn render_report_md(report: &RunReport) -> String {
    let mut out = String::new();
    out.push_str("# gradleplan report\n\n");
    out.push_str(&format!("- Document: `{}`\n", report.document));
    out.push_str(&format!(
        "- Verdict: `{}`\n",
        status_label(report.verdict.status)
    ));
    if let Some(code) = &report.verdict.code {
        out.push_str(&format!("- Code: `{}`\n", code));
    }
    if let Some(digest) = &report.digest {
        out.push_str(&format!("- Digest: `{}`\n", digest));
    }
    if report.warnings > 0 {
        out.push_str(&format!("- Warnings: {}\n", report.warnings));
    }
    if !report.verdict.reasons.is_empty() {
        out.push_str("\n## Reasons\n\n");
        for r in &report.verdict.reasons {
            out.push_str(&format!("- {}\n", r));
        }
    }
    out
}

pub fn render_comparison_md(cmp: &DraftComparison) -> String {
    let mut out = String::new();
    out.push_str("# gradleplan compare\n\n");
    out.push_str(&format!("- Left: `{}`\n- Right: `{}`\n\n", cmp.left, cmp.right));

    if cmp.is_identical() {
        out.push_str("_Drafts are equivalent._\n");
        return out;
    }

    if !cmp.fields.is_empty() {
        out.push_str("## SDK bindings\n\n");
        out.push_str("| Field | Left | Right | Drift |\n|---|---|---|---|\n");
        for f in &cmp.fields {
            out.push_str(&format!(
                "| `{}` | {} | {} | {} |\n",
                f.field,
                side(f.left.as_deref(), f.left_mode),
                side(f.right.as_deref(), f.right_mode),
                f.drift.map(drift_label).unwrap_or("-"),
            ));
        }
    }

    if !cmp.settings.is_empty() {
        out.push_str("\n## Settings\n\n");
        out.push_str("| Setting | Left | Right |\n|---|---|---|\n");
        for s in &cmp.settings {
            out.push_str(&format!(
                "| `{}` | {} | {} |\n",
                s.setting,
                side(s.left.as_deref(), None),
                side(s.right.as_deref(), None),
            ));
        }
    }

    for (title, items) in [
        (format!("Plugins only in `{}`", cmp.left), &cmp.plugins_only_left),
        (format!("Plugins only in `{}`", cmp.right), &cmp.plugins_only_right),
        (
            format!("Dependencies only in `{}`", cmp.left),
            &cmp.dependencies_only_left,
        ),
        (
            format!("Dependencies only in `{}`", cmp.right),
            &cmp.dependencies_only_right,
        ),
    ] {
        if items.is_empty() {
            continue;
        }
        out.push_str(&format!("\n## {}\n\n", title));
        for item in items {
            out.push_str(&format!("- `{}`\n", item));
        }
    }

    out
}

fn side(value: Option<&str>, mode: Option<BindingMode>) -> String {
    match (value, mode) {
        (Some(v), Some(BindingMode::Literal)) => format!("`{}`", v),
        (Some(v), Some(BindingMode::Indirect)) => format!("`{}` (toolchain)", v),
        (Some(v), None) => format!("`{}`", v),
        (None, _) => "-".to_string(),
    }
}

fn drift_label(d: FieldDrift) -> &'static str {
    match d {
        FieldDrift::Mode => "mode",
        FieldDrift::Value => "value",
        FieldDrift::Missing => "missing",
    }
}

fn status_label(s: VerdictStatus) -> &'static str {
    match s {
        VerdictStatus::Pass => "pass",
        VerdictStatus::Warn => "warn",
        VerdictStatus::Fail => "fail",
    }
}
