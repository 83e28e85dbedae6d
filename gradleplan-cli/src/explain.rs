//! Code explanations for the `gradleplan explain` command.
//!
//! Covers the four validation error codes that stop a plan and the warning
//! codes a resolved plan may carry.

/// Whether a code stops resolution or only annotates the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeKind {
    Error,
    Warning,
}

/// Information about a gradleplan report code.
#[derive(Debug, Clone)]
pub struct CodeExplanation {
    /// Stable code as written in reports (e.g., "plugin_order").
    pub code: &'static str,
    /// Other accepted spellings (e.g., "PluginOrderError").
    pub aliases: &'static [&'static str],
    pub title: &'static str,
    pub kind: CodeKind,
    pub description: &'static str,
    pub remediation: &'static str,
}

/// Registry of all explained codes.
pub static CODE_REGISTRY: &[CodeExplanation] = &[
    CodeExplanation {
        code: "plugin_order",
        aliases: &["PluginOrderError"],
        title: "Plugin Order",
        kind: CodeKind::Error,
        description: r#"The plugin list violates an ordering or uniqueness rule.

Plugins are applied in declaration order. `kotlin-android`, the Google services
plugin and the Flutter Gradle plugin all configure an Android module, so one of
`com.android.application` or `com.android.library` must be declared before
them. The Flutter Gradle plugin must also come after `kotlin-android` when both
are present. A plugin id may appear only once; `org.jetbrains.kotlin.android`
and `kotlin-android` count as the same plugin. No two plugins may share an
applied position."#,
        remediation: r#"Reorder the `plugins { }` block so the Android platform plugin comes first:

    plugins {
        id("com.android.application")
        id("kotlin-android")
        id("dev.flutter.flutter-gradle-plugin")
    }

Remove any duplicate declarations."#,
    },
    CodeExplanation {
        code: "unresolved_binding",
        aliases: &["UnresolvedBindingError"],
        title: "Unresolved Binding",
        kind: CodeKind::Error,
        description: r#"An SDK or version field could not be bound to a usable value.

Fields written as toolchain references (`flutter.minSdkVersion`) are looked up
in the toolchain: `--toolchain KEY=VALUE`, `[toolchain.values]` in
gradleplan.toml, then `.properties` files. The failure is reported when no
source provides the key, when an integer field (compileSdk, minSdk, targetSdk,
versionCode) receives a non-integer or non-positive value, or when a text
field (ndkVersion, versionName) is empty."#,
        remediation: r#"Provide the missing key, for example:

    gradleplan plan --toolchain flutter.minSdkVersion=21

or add it to `android/local.properties`, or write the value literally in the
build script (`minSdk = 21`)."#,
    },
    CodeExplanation {
        code: "dependency_conflict",
        aliases: &["DependencyConflictError"],
        title: "Dependency Conflict",
        kind: CodeKind::Error,
        description: r#"Dependency versions cannot be settled unambiguously.

Reported when the same artifact is declared at different versions, when an
explicit version disagrees with the version an imported BOM pins, when two
BOMs pin one artifact differently, when one BOM is imported at several
versions, when a BOM is not in the catalog, or when a versionless artifact is
not managed by any imported BOM."#,
        remediation: r#"Let the BOM manage versions: drop explicit versions from artifacts the BOM
covers, import each BOM once, and declare unknown BOMs in gradleplan.toml:

    [boms."com.example:platform-bom:2.0.0"]
    "com.example:core" = "2.0.1""#,
    },
    CodeExplanation {
        code: "incomplete_configuration",
        aliases: &["IncompleteConfigurationError"],
        title: "Incomplete Configuration",
        kind: CodeKind::Error,
        description: r#"A required field is absent from the configuration document.

A plan needs `namespace`, `applicationId`, and every required SDK field
(compileSdk, minSdk, targetSdk, versionCode, versionName), either as a
literal or as a toolchain reference. A build type that names a signing config
also needs that config declared under `signingConfigs`."#,
        remediation: r#"Add the missing fields to the `android { }` and `defaultConfig { }` blocks,
or declare the referenced signing config."#,
    },
    CodeExplanation {
        code: "target_sdk_above_compile_sdk",
        aliases: &[],
        title: "Target SDK Above Compile SDK",
        kind: CodeKind::Warning,
        description: r#"The resolved targetSdk is higher than the resolved compileSdk.

The plan is still produced. Android tooling may refuse to build against an
SDK older than the target."#,
        remediation: r#"Raise compileSdk to at least targetSdk."#,
    },
    CodeExplanation {
        code: "min_sdk_above_target_sdk",
        aliases: &[],
        title: "Min SDK Above Target SDK",
        kind: CodeKind::Warning,
        description: r#"The resolved minSdk is higher than the resolved targetSdk.

The plan is still produced, but no device could satisfy both bounds as
intended."#,
        remediation: r#"Lower minSdk or raise targetSdk."#,
    },
    CodeExplanation {
        code: "jvm_target_mismatch",
        aliases: &[],
        title: "JVM Target Mismatch",
        kind: CodeKind::Warning,
        description: r#"kotlinOptions.jvmTarget differs from compileOptions.targetCompatibility.

The plan is still produced. Kotlin and Java sources would be compiled for
different bytecode levels."#,
        remediation: r#"Use the same level in both blocks, e.g. `JavaVersion.VERSION_11` and `"11"`."#,
    },
];

/// Look up a code by its name or an alias.
///
/// Matching ignores case and treats hyphens as underscores.
pub fn lookup_code(query: &str) -> Option<&'static CodeExplanation> {
    let normalized = query.trim().to_lowercase().replace('-', "_");

    CODE_REGISTRY.iter().find(|entry| {
        entry.code == normalized
            || entry
                .aliases
                .iter()
                .any(|alias| alias.to_lowercase() == normalized)
    })
}

/// List all explained codes.
pub fn list_codes() -> Vec<&'static str> {
    CODE_REGISTRY.iter().map(|e| e.code).collect()
}

pub fn format_kind(kind: CodeKind) -> &'static str {
    match kind {
        CodeKind::Error => "Error",
        CodeKind::Warning => "Warning",
    }
}

/// What a code of this kind means for the exit status.
pub fn kind_meaning(kind: CodeKind) -> &'static str {
    match kind {
        CodeKind::Error => {
            "ERROR codes stop resolution. No plan is produced and the command exits with 2."
        }
        CodeKind::Warning => {
            "WARNING codes are attached to a resolved plan. The verdict is `warn` and the\n\
             command exits with 0."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_code() {
        let entry = lookup_code("plugin_order").expect("should find plugin_order");
        assert_eq!(entry.kind, CodeKind::Error);
    }

    #[test]
    fn test_lookup_by_alias_and_case() {
        let entry = lookup_code("unresolvedbindingerror").expect("should find by alias");
        assert_eq!(entry.code, "unresolved_binding");
        let entry = lookup_code("Dependency-Conflict").expect("should find with hyphens");
        assert_eq!(entry.code, "dependency_conflict");
    }

    #[test]
    fn test_unknown_code() {
        assert!(lookup_code("no_such_code").is_none());
    }

    #[test]
    fn test_all_codes_registered() {
        assert_eq!(CODE_REGISTRY.len(), 7);
        for code in [
            "plugin_order",
            "unresolved_binding",
            "dependency_conflict",
            "incomplete_configuration",
            "target_sdk_above_compile_sdk",
            "min_sdk_above_target_sdk",
            "jvm_target_mismatch",
        ] {
            assert!(lookup_code(code).is_some(), "{code} missing");
        }
    }
}
