use crate::error::IngestError;
use crate::kts::parse_kts;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use glob::glob;
use gradleplan_types::document::ConfigDocument;
use tracing::debug;

/// File name of a TOML document found by [`discover_documents`].
pub const DOC_TOML_NAME: &str = "gradleplan.doc.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    GradleKts,
    Toml,
    Json,
}

impl DocumentFormat {
    pub fn from_path(path: &Utf8Path) -> Option<Self> {
        let name = path.file_name()?;
        if name.ends_with(".gradle.kts") {
            Some(DocumentFormat::GradleKts)
        } else if name.ends_with(".toml") {
            Some(DocumentFormat::Toml)
        } else if name.ends_with(".json") {
            Some(DocumentFormat::Json)
        } else {
            None
        }
    }
}

/// Read and parse a configuration document, choosing the parser from the file name.
pub fn load_document(path: &Utf8Path) -> Result<ConfigDocument, IngestError> {
    let format = DocumentFormat::from_path(path).ok_or_else(|| IngestError::UnsupportedFormat {
        path: path.to_string(),
    })?;
    debug!(path = %path, ?format, "loading configuration document");

    let text = fs::read_to_string(path)?;
    parse_document(&text, format)
}

pub fn parse_document(text: &str, format: DocumentFormat) -> Result<ConfigDocument, IngestError> {
    match format {
        DocumentFormat::GradleKts => parse_kts(text),
        DocumentFormat::Toml => parse_toml(text),
        DocumentFormat::Json => parse_json(text),
    }
}

pub fn parse_toml(text: &str) -> Result<ConfigDocument, IngestError> {
    Ok(toml::from_str(text)?)
}

pub fn parse_json(text: &str) -> Result<ConfigDocument, IngestError> {
    Ok(serde_json::from_str(text)?)
}

/// Find every configuration document under `root`.
///
/// Gradle output and cache directories are skipped. Paths are returned sorted.
pub fn discover_documents(root: &Utf8Path) -> anyhow::Result<Vec<Utf8PathBuf>> {
    let mut out = Vec::new();
    for name in ["build.gradle.kts", DOC_TOML_NAME] {
        let pattern = root.join("**").join(name);
        debug!(pattern = %pattern, "scanning for configuration documents");

        for entry in glob(pattern.as_str()).with_context(|| format!("glob {}", pattern))? {
            let path = entry.map_err(|e| anyhow::anyhow!("glob error: {e}"))?;
            let path = Utf8PathBuf::from_path_buf(path)
                .map_err(|p| anyhow::anyhow!("non-UTF-8 path: {}", p.display()))?;

            let relative = path.strip_prefix(root).unwrap_or(&path);
            if relative
                .components()
                .any(|c| matches!(c.as_str(), "build" | ".gradle" | ".dart_tool"))
            {
                debug!(path = %path, "skipping generated directory");
                continue;
            }
            out.push(path);
        }
    }

    // Deterministic order matters.
    out.sort();
    out.dedup();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gradleplan_types::document::{BindingSource, SdkField, VersionConstraint};

    #[test]
    fn format_from_file_name() {
        assert_eq!(
            DocumentFormat::from_path(Utf8Path::new("android/app/build.gradle.kts")),
            Some(DocumentFormat::GradleKts)
        );
        assert_eq!(
            DocumentFormat::from_path(Utf8Path::new("gradleplan.doc.toml")),
            Some(DocumentFormat::Toml)
        );
        assert_eq!(
            DocumentFormat::from_path(Utf8Path::new("doc.json")),
            Some(DocumentFormat::Json)
        );
        assert_eq!(
            DocumentFormat::from_path(Utf8Path::new("build.gradle")),
            None
        );
    }

    #[test]
    fn toml_form() {
        let doc = parse_toml(
            r#"
plugins = [
  { id = "com.android.application", applied_order = 0 },
  { id = "kotlin-android", applied_order = 1 },
]

[android]
namespace = "com.example.mad"
application_id = "com.example.mad"

[android.sdk]
compile_sdk = { toolchain = "flutter.compileSdkVersion" }
min_sdk = 21
version_name = "1.0"

[[dependencies]]
configuration = "implementation"
artifact = "com.google.firebase:firebase-auth"
version = { kind = "from_bom" }
"#,
        )
        .expect("toml");

        assert_eq!(doc.plugins.len(), 2);
        assert_eq!(
            doc.android.sdk[&SdkField::CompileSdk],
            BindingSource::indirect("flutter.compileSdkVersion")
        );
        assert_eq!(doc.android.sdk[&SdkField::MinSdk], BindingSource::literal_int(21));
        assert_eq!(doc.dependencies[0].version, VersionConstraint::FromBom);
    }

    #[test]
    fn json_form_rejects_bad_coordinates() {
        let err = parse_json(
            r#"{"dependencies":[{"configuration":"implementation","artifact":"firebase-auth","version":{"kind":"from_bom"}}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, IngestError::Json(_)));
    }

    #[test]
    fn unsupported_extension() {
        let err = load_document(Utf8Path::new("app/build.gradle")).unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedFormat { .. }));
    }
}
