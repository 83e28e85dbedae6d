//! End-to-end resolver scenarios for a Flutter app module using Firebase.
//!
//! The two documents below mirror the two drafts of the same `android/app` build script: one
//! hardcodes SDK levels and versions, the other defers them to the Flutter toolchain.

use gradleplan_domain::{NoToolchain, ResolveError, StaticBomCatalog, build_plan};
use gradleplan_types::document::{
    ArtifactId, BindingSource, BomRef, BuildType, ConfigDocument, DependencyDeclaration,
    FlutterBlock, SdkField, VersionConstraint,
};
use gradleplan_types::plan::VersionOrigin;
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;

const FIREBASE_BOM: &str = "com.google.firebase:firebase-bom:32.2.2";

fn base_document() -> ConfigDocument {
    let mut doc = ConfigDocument::default();
    for id in [
        "com.android.application",
        "com.google.gms.google-services",
        "kotlin-android",
        "dev.flutter.flutter-gradle-plugin",
    ] {
        doc.push_plugin(id);
    }
    doc.android.namespace = Some("com.example.mad".to_string());
    doc.android.application_id = Some("com.example.mad".to_string());
    doc.android.compile_options.source_compatibility = Some("11".to_string());
    doc.android.compile_options.target_compatibility = Some("11".to_string());
    doc.android.kotlin_options.jvm_target = Some("11".to_string());
    doc.android.build_types.insert(
        "release".to_string(),
        BuildType {
            signing_config: Some("debug".to_string()),
            minify_enabled: None,
        },
    );
    doc.flutter = Some(FlutterBlock {
        source: "../..".to_string(),
    });
    doc.boms.push(BomRef {
        configuration: "implementation".to_string(),
        artifact: ArtifactId::new("com.google.firebase", "firebase-bom"),
        version: "32.2.2".to_string(),
    });
    for artifact in ["firebase-auth", "firebase-firestore", "firebase-messaging"] {
        doc.dependencies.push(DependencyDeclaration {
            configuration: "implementation".to_string(),
            artifact: ArtifactId::new("com.google.firebase", artifact),
            version: VersionConstraint::FromBom,
        });
    }
    doc
}

fn literal_draft() -> ConfigDocument {
    let mut doc = base_document();
    let sdk = &mut doc.android.sdk;
    sdk.insert(
        SdkField::CompileSdk,
        BindingSource::indirect("flutter.compileSdkVersion"),
    );
    sdk.insert(
        SdkField::NdkVersion,
        BindingSource::literal_text("27.0.12077973"),
    );
    sdk.insert(SdkField::MinSdk, BindingSource::literal_int(21));
    sdk.insert(SdkField::TargetSdk, BindingSource::literal_int(33));
    sdk.insert(SdkField::VersionCode, BindingSource::literal_int(1));
    sdk.insert(SdkField::VersionName, BindingSource::literal_text("1.0"));
    doc
}

fn indirect_draft() -> ConfigDocument {
    let mut doc = base_document();
    let sdk = &mut doc.android.sdk;
    for (field, key) in [
        (SdkField::CompileSdk, "flutter.compileSdkVersion"),
        (SdkField::NdkVersion, "flutter.ndkVersion"),
        (SdkField::MinSdk, "flutter.minSdkVersion"),
        (SdkField::TargetSdk, "flutter.targetSdkVersion"),
        (SdkField::VersionCode, "flutter.versionCode"),
        (SdkField::VersionName, "flutter.versionName"),
    ] {
        sdk.insert(field, BindingSource::indirect(key));
    }
    doc
}

fn flutter_toolchain() -> BTreeMap<String, String> {
    [
        ("flutter.compileSdkVersion", "34"),
        ("flutter.ndkVersion", "26.1.10909125"),
        ("flutter.minSdkVersion", "21"),
        ("flutter.targetSdkVersion", "34"),
        ("flutter.versionCode", "1"),
        ("flutter.versionName", "1.0.0"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

#[test]
fn literal_min_sdk_and_firebase_bom_resolve() {
    let plan = build_plan(
        &literal_draft(),
        &flutter_toolchain(),
        &StaticBomCatalog::builtin(),
    )
    .expect("plan");

    assert_eq!(plan.sdk_int(SdkField::MinSdk), Some(21));

    let pinned: Vec<(String, String, VersionOrigin)> = plan
        .dependencies
        .iter()
        .map(|d| (d.artifact.to_string(), d.version.clone(), d.origin.clone()))
        .collect();
    let bom = VersionOrigin::Bom {
        bom: FIREBASE_BOM.to_string(),
    };
    assert_eq!(
        pinned,
        vec![
            (
                "com.google.firebase:firebase-auth".to_string(),
                "22.1.1".to_string(),
                bom.clone()
            ),
            (
                "com.google.firebase:firebase-firestore".to_string(),
                "24.7.0".to_string(),
                bom.clone()
            ),
            (
                "com.google.firebase:firebase-messaging".to_string(),
                "23.2.1".to_string(),
                bom
            ),
        ]
    );
}

#[test]
fn indirect_min_sdk_without_toolchain_is_unresolved() {
    let err = build_plan(
        &indirect_draft(),
        &NoToolchain,
        &StaticBomCatalog::builtin(),
    )
    .unwrap_err();

    let ResolveError::UnresolvedBinding { failures } = err else {
        panic!("expected unresolved binding, got {err:?}");
    };
    assert!(failures.iter().any(|f| f.field == SdkField::MinSdk));
}

#[test]
fn both_drafts_resolve_with_their_own_inputs() {
    let literal = build_plan(
        &literal_draft(),
        &flutter_toolchain(),
        &StaticBomCatalog::builtin(),
    )
    .expect("literal draft");
    let indirect = build_plan(
        &indirect_draft(),
        &flutter_toolchain(),
        &StaticBomCatalog::builtin(),
    )
    .expect("indirect draft");

    // Same module, different pinned values: neither draft is preferred.
    assert_eq!(literal.application_id, indirect.application_id);
    assert_eq!(literal.sdk_int(SdkField::TargetSdk), Some(33));
    assert_eq!(indirect.sdk_int(SdkField::TargetSdk), Some(34));
    assert_ne!(literal.digest, indirect.digest);
}

#[test]
fn kotlin_before_application_plugin_fails() {
    let mut doc = literal_draft();
    doc.plugins.swap(0, 2);
    for (i, p) in doc.plugins.iter_mut().enumerate() {
        p.applied_order = i as u32;
    }

    let err = build_plan(&doc, &flutter_toolchain(), &StaticBomCatalog::builtin()).unwrap_err();
    assert_eq!(err.code(), "plugin_order");
}

#[test]
fn conflicting_explicit_versions_fail() {
    let mut doc = literal_draft();
    for v in ["1.10.0", "1.12.0"] {
        doc.dependencies.push(DependencyDeclaration {
            configuration: "implementation".to_string(),
            artifact: ArtifactId::new("androidx.core", "core-ktx"),
            version: VersionConstraint::Explicit(v.to_string()),
        });
    }

    let err = build_plan(&doc, &flutter_toolchain(), &StaticBomCatalog::builtin()).unwrap_err();
    assert_eq!(err.code(), "dependency_conflict");
}

#[test]
fn missing_application_id_is_incomplete() {
    let mut doc = literal_draft();
    doc.android.application_id = None;

    let err = build_plan(&doc, &flutter_toolchain(), &StaticBomCatalog::builtin()).unwrap_err();
    assert_eq!(
        err,
        ResolveError::IncompleteConfiguration {
            missing: vec!["applicationId".to_string()]
        }
    );
}
