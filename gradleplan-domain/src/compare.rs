use crate::plugins::canonical_plugin_id;
use gradleplan_types::compare::{DraftComparison, FieldComparison, FieldDrift, SettingComparison};
use gradleplan_types::document::{BindingSource, ConfigDocument, SdkField};
use std::collections::{BTreeMap, BTreeSet};

/// Compare two drafts of the same configuration without preferring either one.
pub fn compare_drafts(
    left_label: &str,
    left: &ConfigDocument,
    right_label: &str,
    right: &ConfigDocument,
) -> DraftComparison {
    let mut fields = Vec::new();
    for field in SdkField::ALL {
        let l = left.android.sdk.get(&field);
        let r = right.android.sdk.get(&field);
        if l.is_none() && r.is_none() {
            continue;
        }
        fields.push(FieldComparison {
            field,
            left: l.map(describe),
            left_mode: l.map(BindingSource::mode),
            right: r.map(describe),
            right_mode: r.map(BindingSource::mode),
            drift: drift(l, r),
        });
    }

    let (plugins_only_left, plugins_only_right) =
        set_difference(plugin_set(left), plugin_set(right));
    let (dependencies_only_left, dependencies_only_right) =
        set_difference(dependency_set(left), dependency_set(right));
    let settings = setting_drift(&settings_of(left), &settings_of(right));

    DraftComparison {
        schema: gradleplan_types::schema::GRADLEPLAN_COMPARE_V1.to_string(),
        left: left_label.to_string(),
        right: right_label.to_string(),
        fields,
        plugins_only_left,
        plugins_only_right,
        dependencies_only_left,
        dependencies_only_right,
        settings,
    }
}

/// Flatten every non-SDK setting of a draft into `name -> value`.
fn settings_of(doc: &ConfigDocument) -> BTreeMap<String, String> {
    let android = &doc.android;
    let mut out = BTreeMap::new();
    let mut put = |name: String, value: Option<String>| {
        if let Some(v) = value {
            out.insert(name, v);
        }
    };

    put("namespace".into(), android.namespace.clone());
    put("application_id".into(), android.application_id.clone());
    put(
        "compile_options.source_compatibility".into(),
        android.compile_options.source_compatibility.clone(),
    );
    put(
        "compile_options.target_compatibility".into(),
        android.compile_options.target_compatibility.clone(),
    );
    put(
        "kotlin_options.jvm_target".into(),
        android.kotlin_options.jvm_target.clone(),
    );
    for (name, bt) in &android.build_types {
        put(format!("build_types.{}", name), Some("declared".into()));
        put(
            format!("build_types.{}.signing_config", name),
            bt.signing_config.clone(),
        );
        put(
            format!("build_types.{}.minify_enabled", name),
            bt.minify_enabled.map(|b| b.to_string()),
        );
    }
    if !android.signing_configs.is_empty() {
        let names: Vec<&str> = android.signing_configs.iter().map(String::as_str).collect();
        put("signing_configs".into(), Some(names.join(", ")));
    }
    put("flutter.source".into(), doc.flutter.as_ref().map(|f| f.source.clone()));

    let mut plugins: Vec<_> = doc.plugins.iter().collect();
    plugins.sort_by_key(|p| p.applied_order);
    if !plugins.is_empty() {
        let order: Vec<&str> = plugins.iter().map(|p| canonical_plugin_id(&p.id)).collect();
        put("plugin_order".into(), Some(order.join(" -> ")));
    }
    out
}

fn setting_drift(
    left: &BTreeMap<String, String>,
    right: &BTreeMap<String, String>,
) -> Vec<SettingComparison> {
    let names: BTreeSet<&String> = left.keys().chain(right.keys()).collect();
    names
        .into_iter()
        .filter(|name| left.get(*name) != right.get(*name))
        .map(|name| SettingComparison {
            setting: name.clone(),
            left: left.get(name).cloned(),
            right: right.get(name).cloned(),
        })
        .collect()
}

fn describe(source: &BindingSource) -> String {
    match source {
        BindingSource::Literal(v) => v.to_string(),
        BindingSource::Indirect { toolchain } => format!("<{}>", toolchain),
    }
}

fn drift(left: Option<&BindingSource>, right: Option<&BindingSource>) -> Option<FieldDrift> {
    match (left, right) {
        (Some(l), Some(r)) if l == r => None,
        (Some(l), Some(r)) if l.mode() != r.mode() => Some(FieldDrift::Mode),
        (Some(_), Some(_)) => Some(FieldDrift::Value),
        _ => Some(FieldDrift::Missing),
    }
}

fn plugin_set(doc: &ConfigDocument) -> BTreeSet<String> {
    doc.plugins
        .iter()
        .map(|p| canonical_plugin_id(&p.id).to_string())
        .collect()
}

fn dependency_set(doc: &ConfigDocument) -> BTreeSet<String> {
    let boms = doc.boms.iter().map(|b| format!("platform({})", b.coordinate()));
    let deps = doc.dependencies.iter().map(|d| match &d.version {
        gradleplan_types::document::VersionConstraint::Explicit(v) => {
            format!("{}({}:{})", d.configuration, d.artifact, v)
        }
        gradleplan_types::document::VersionConstraint::FromBom => {
            format!("{}({})", d.configuration, d.artifact)
        }
    });
    boms.chain(deps).collect()
}

fn set_difference(left: BTreeSet<String>, right: BTreeSet<String>) -> (Vec<String>, Vec<String>) {
    (
        left.difference(&right).cloned().collect(),
        right.difference(&left).cloned().collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with(field: SdkField, source: BindingSource) -> ConfigDocument {
        let mut doc = ConfigDocument::default();
        doc.push_plugin("com.android.application");
        doc.android.sdk.insert(field, source);
        doc
    }

    #[test]
    fn literal_vs_indirect_is_mode_drift() {
        let a = doc_with(SdkField::MinSdk, BindingSource::literal_int(21));
        let b = doc_with(
            SdkField::MinSdk,
            BindingSource::indirect("flutter.minSdkVersion"),
        );
        let cmp = compare_drafts("a", &a, "b", &b);
        assert_eq!(cmp.mode_drift(), vec![SdkField::MinSdk]);
        assert_eq!(cmp.fields[0].left.as_deref(), Some("21"));
        assert_eq!(
            cmp.fields[0].right.as_deref(),
            Some("<flutter.minSdkVersion>")
        );
        assert!(!cmp.is_identical());
    }

    #[test]
    fn identical_documents_have_no_drift() {
        let a = doc_with(SdkField::MinSdk, BindingSource::literal_int(21));
        let cmp = compare_drafts("a", &a, "b", &a.clone());
        assert!(cmp.is_identical());
        assert_eq!(cmp.fields.len(), 1);
    }

    #[test]
    fn value_and_missing_drift() {
        let mut a = doc_with(SdkField::MinSdk, BindingSource::literal_int(21));
        let b = doc_with(SdkField::MinSdk, BindingSource::literal_int(23));
        a.android
            .sdk
            .insert(SdkField::NdkVersion, BindingSource::literal_text("27.0.12077973"));

        let cmp = compare_drafts("a", &a, "b", &b);
        let drifts: Vec<_> = cmp.fields.iter().map(|f| (f.field, f.drift)).collect();
        assert_eq!(
            drifts,
            vec![
                (SdkField::MinSdk, Some(FieldDrift::Value)),
                (SdkField::NdkVersion, Some(FieldDrift::Missing)),
            ]
        );
    }

    #[test]
    fn differing_identity_is_not_identical() {
        let mut a = doc_with(SdkField::MinSdk, BindingSource::literal_int(21));
        a.android.namespace = Some("com.example.mad".into());
        a.android.application_id = Some("com.example.mad".into());
        let mut b = a.clone();
        b.android.namespace = Some("com.example.other".into());
        b.android.application_id = None;

        let cmp = compare_drafts("a", &a, "b", &b);
        assert!(cmp.fields.iter().all(|f| f.drift.is_none()));
        assert!(!cmp.is_identical());
        assert_eq!(
            cmp.settings,
            vec![
                SettingComparison {
                    setting: "application_id".into(),
                    left: Some("com.example.mad".into()),
                    right: None,
                },
                SettingComparison {
                    setting: "namespace".into(),
                    left: Some("com.example.mad".into()),
                    right: Some("com.example.other".into()),
                },
            ]
        );
    }

    #[test]
    fn options_build_types_flutter_and_order_are_compared() {
        let mut a = ConfigDocument::default();
        a.push_plugin("com.android.application");
        a.push_plugin("kotlin-android");
        a.android.kotlin_options.jvm_target = Some("1.8".into());
        a.android
            .build_types
            .insert("release".into(), Default::default());
        a.flutter = Some(gradleplan_types::document::FlutterBlock {
            source: "../..".into(),
        });

        let mut b = ConfigDocument::default();
        b.push_plugin("kotlin-android");
        b.push_plugin("com.android.application");
        b.android.kotlin_options.jvm_target = Some("17".into());
        b.android.build_types.insert(
            "release".into(),
            gradleplan_types::document::BuildType {
                signing_config: Some("debug".into()),
                minify_enabled: None,
            },
        );
        b.flutter = Some(gradleplan_types::document::FlutterBlock {
            source: "..".into(),
        });

        let cmp = compare_drafts("a", &a, "b", &b);
        assert!(cmp.plugins_only_left.is_empty() && cmp.plugins_only_right.is_empty());
        let names: Vec<&str> = cmp.settings.iter().map(|s| s.setting.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "build_types.release.signing_config",
                "flutter.source",
                "kotlin_options.jvm_target",
                "plugin_order",
            ]
        );
        assert!(!cmp.is_identical());
    }

    #[test]
    fn plugin_aliases_compare_equal() {
        let mut a = ConfigDocument::default();
        a.push_plugin("kotlin-android");
        let mut b = ConfigDocument::default();
        b.push_plugin("org.jetbrains.kotlin.android");
        b.push_plugin("com.google.gms.google-services");

        let cmp = compare_drafts("a", &a, "b", &b);
        assert!(cmp.plugins_only_left.is_empty());
        assert_eq!(
            cmp.plugins_only_right,
            vec!["com.google.gms.google-services".to_string()]
        );
    }
}
