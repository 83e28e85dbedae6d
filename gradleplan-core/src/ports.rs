//! Port traits abstracting all I/O away from the pipeline.

use camino::Utf8Path;
use gradleplan_types::document::ConfigDocument;

/// Source of configuration documents.
pub trait DocumentSource {
    fn load_document(&self, path: &Utf8Path) -> anyhow::Result<ConfigDocument>;
}

/// File-system write operations.
pub trait WritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()>;
    fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()>;
}
