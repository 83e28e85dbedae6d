use crate::dependencies::{ResolvedDependencies, resolve_dependencies};
use crate::error::ResolveError;
use crate::plugins::validate_plugins;
use crate::ports::{BomCatalog, ToolchainProvider};
use crate::sdk::resolve_sdk_bindings;
use gradleplan_types::document::{
    BomRef, BuildType, CompileOptions, ConfigDocument, KotlinOptions, PluginDeclaration, SdkField,
};
use gradleplan_types::plan::{
    BuildPlan, PlanWarning, ResolvedDependency, ResolvedSdk, warning_codes,
};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use tracing::debug;
use uuid::Uuid;

/// Signing config every Android module has without declaring it.
const IMPLICIT_SIGNING_CONFIG: &str = "debug";

/// Resolve a configuration document into a build plan.
///
/// Stages run in a fixed order (plugins, SDK bindings, dependencies, composition) and the first
/// failing stage is reported.
pub fn build_plan(
    document: &ConfigDocument,
    toolchain: &dyn ToolchainProvider,
    catalog: &dyn BomCatalog,
) -> Result<BuildPlan, ResolveError> {
    let plugins = validate_plugins(&document.plugins)?;
    let sdk = resolve_sdk_bindings(&document.android.sdk, toolchain)?;
    let deps = resolve_dependencies(&document.dependencies, &document.boms, catalog)?;
    compose_plan(document, plugins, sdk, deps)
}

/// Compose already-resolved parts into an immutable plan.
///
/// Fails when a required field is absent or a build type points at an undeclared signing config.
pub fn compose_plan(
    document: &ConfigDocument,
    plugins: Vec<PluginDeclaration>,
    sdk: ResolvedSdk,
    deps: ResolvedDependencies,
) -> Result<BuildPlan, ResolveError> {
    let android = &document.android;
    let mut missing = Vec::new();

    let namespace = non_empty(&android.namespace);
    if namespace.is_none() {
        missing.push("namespace".to_string());
    }
    let application_id = non_empty(&android.application_id);
    if application_id.is_none() {
        missing.push("applicationId".to_string());
    }
    for field in SdkField::ALL {
        if field.is_required() && !sdk.contains_key(&field) {
            missing.push(field.gradle_name().to_string());
        }
    }
    for (name, build_type) in &android.build_types {
        if let Some(cfg) = &build_type.signing_config
            && cfg != IMPLICIT_SIGNING_CONFIG
            && !android.signing_configs.contains(cfg)
        {
            missing.push(format!(
                "signingConfigs.{} (used by buildTypes.{})",
                cfg, name
            ));
        }
    }

    let (Some(namespace), Some(application_id)) = (namespace, application_id) else {
        return Err(ResolveError::IncompleteConfiguration { missing });
    };
    if !missing.is_empty() {
        return Err(ResolveError::IncompleteConfiguration { missing });
    }

    let warnings = collect_warnings(&sdk, &android.compile_options, &android.kotlin_options);

    let content = PlanContent {
        schema: gradleplan_types::schema::GRADLEPLAN_PLAN_V1,
        namespace: &namespace,
        application_id: &application_id,
        plugins: &plugins,
        sdk: &sdk,
        compile_options: &android.compile_options,
        kotlin_options: &android.kotlin_options,
        build_types: &android.build_types,
        flutter_source: document.flutter.as_ref().map(|f| f.source.as_str()),
        boms: &deps.boms,
        dependencies: &deps.dependencies,
        warnings: &warnings,
    };
    let digest = content_digest(&content);
    let plan_id = deterministic_plan_id(&digest);

    debug!(plan_id = %plan_id, digest = %digest, "composed build plan");

    Ok(BuildPlan {
        schema: gradleplan_types::schema::GRADLEPLAN_PLAN_V1.to_string(),
        plan_id: plan_id.to_string(),
        digest,
        namespace,
        application_id,
        plugins,
        sdk,
        compile_options: android.compile_options.clone(),
        kotlin_options: android.kotlin_options.clone(),
        build_types: android.build_types.clone(),
        flutter_source: document.flutter.as_ref().map(|f| f.source.clone()),
        boms: deps.boms,
        dependencies: deps.dependencies,
        warnings,
    })
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn collect_warnings(
    sdk: &ResolvedSdk,
    compile: &CompileOptions,
    kotlin: &KotlinOptions,
) -> Vec<PlanWarning> {
    let int = |field: SdkField| match sdk.get(&field).map(|v| &v.value) {
        Some(gradleplan_types::document::LiteralValue::Int(n)) => Some(*n),
        _ => None,
    };

    let mut warnings = Vec::new();

    if let (Some(target), Some(compile_sdk)) = (int(SdkField::TargetSdk), int(SdkField::CompileSdk))
        && target > compile_sdk
    {
        warnings.push(PlanWarning {
            code: warning_codes::TARGET_ABOVE_COMPILE.to_string(),
            message: format!("targetSdk {} is above compileSdk {}", target, compile_sdk),
        });
    }

    if let (Some(min), Some(target)) = (int(SdkField::MinSdk), int(SdkField::TargetSdk))
        && min > target
    {
        warnings.push(PlanWarning {
            code: warning_codes::MIN_ABOVE_TARGET.to_string(),
            message: format!("minSdk {} is above targetSdk {}", min, target),
        });
    }

    if let (Some(jvm), Some(java)) = (&kotlin.jvm_target, &compile.target_compatibility)
        && jvm != java
    {
        warnings.push(PlanWarning {
            code: warning_codes::JVM_TARGET_MISMATCH.to_string(),
            message: format!(
                "kotlinOptions.jvmTarget {} differs from compileOptions.targetCompatibility {}",
                jvm, java
            ),
        });
    }

    warnings
}

/// Everything that identifies a plan. Field order is fixed and maps are ordered, so the JSON
/// encoding is canonical.
#[derive(Serialize)]
struct PlanContent<'a> {
    schema: &'a str,
    namespace: &'a str,
    application_id: &'a str,
    plugins: &'a [PluginDeclaration],
    sdk: &'a ResolvedSdk,
    compile_options: &'a CompileOptions,
    kotlin_options: &'a KotlinOptions,
    build_types: &'a BTreeMap<String, BuildType>,
    flutter_source: Option<&'a str>,
    boms: &'a [BomRef],
    dependencies: &'a [ResolvedDependency],
    warnings: &'a [PlanWarning],
}

fn content_digest(content: &PlanContent<'_>) -> String {
    let mut hasher = Sha256::new();
    // Map keys are strings or unit enum variants, so serialization cannot fail.
    serde_json::to_writer(&mut hasher, content).expect("plan content serializes to JSON");
    hex::encode(hasher.finalize())
}

fn deterministic_plan_id(digest: &str) -> Uuid {
    // Deterministic ID: v5(namespace, digest)
    const NAMESPACE: Uuid = Uuid::from_bytes([
        0x9a, 0x1f, 0x6c, 0x2e, 0x51, 0x0b, 0x4e, 0x87, 0xb3, 0x44, 0x0d, 0x7e, 0x2a, 0x63, 0xc9,
        0x15,
    ]);
    Uuid::new_v5(&NAMESPACE, digest.as_bytes())
}
