//! Default filesystem-backed port implementations and toolchain providers.

use crate::ports::{DocumentSource, WritePort};
use crate::settings::{BomOverrides, ToolchainSettings};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use gradleplan_domain::{StaticBomCatalog, ToolchainProvider};
use gradleplan_types::document::{ArtifactId, ConfigDocument, parse_coordinate};
use std::collections::BTreeMap;
use tracing::debug;

/// Loads documents from disk via `gradleplan_ingest::load_document`.
#[derive(Debug, Clone, Default)]
pub struct FsDocumentSource;

impl DocumentSource for FsDocumentSource {
    fn load_document(&self, path: &Utf8Path) -> anyhow::Result<ConfigDocument> {
        gradleplan_ingest::load_document(path).with_context(|| format!("load document {}", path))
    }
}

/// In-memory document source for embedding and testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentSource {
    documents: BTreeMap<Utf8PathBuf, ConfigDocument>,
}

impl InMemoryDocumentSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, path: impl Into<Utf8PathBuf>, doc: ConfigDocument) -> Self {
        self.documents.insert(path.into(), doc);
        self
    }
}

impl DocumentSource for InMemoryDocumentSource {
    fn load_document(&self, path: &Utf8Path) -> anyhow::Result<ConfigDocument> {
        self.documents
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no document at {}", path))
    }
}

/// Filesystem write operations.
#[derive(Debug, Clone, Default)]
pub struct FsWritePort;

impl WritePort for FsWritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create parent dir for {}", path))?;
        }
        fs::write(path, contents).with_context(|| format!("write {}", path))
    }

    fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()> {
        fs::create_dir_all(path).with_context(|| format!("create_dir_all {}", path))
    }
}

/// Toolchain values read from a Java `.properties` file, such as Flutter's `local.properties`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertiesToolchain {
    values: BTreeMap<String, String>,
}

impl PropertiesToolchain {
    pub fn from_path(path: &Utf8Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("read {}", path))?;
        let toolchain = Self::parse(&text);
        debug!(path = %path, keys = toolchain.values.len(), "loaded properties");
        Ok(toolchain)
    }

    /// Parse `key=value` / `key: value` lines. `#` and `!` start comments, a trailing backslash
    /// continues the line, and the last assignment of a key wins.
    pub fn parse(text: &str) -> Self {
        let mut values = BTreeMap::new();
        let mut pending = String::new();

        for raw in text.lines() {
            let line = raw.trim_start();
            if pending.is_empty() && (line.starts_with('#') || line.starts_with('!')) {
                continue;
            }
            if let Some(cont) = line.strip_suffix('\\')
                && !cont.ends_with('\\')
            {
                pending.push_str(cont);
                continue;
            }
            pending.push_str(line);
            let logical = std::mem::take(&mut pending);
            if let Some((key, value)) = split_property(&logical) {
                values.insert(key, value);
            }
        }
        if let Some((key, value)) = split_property(&pending) {
            values.insert(key, value);
        }
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ToolchainProvider for PropertiesToolchain {
    fn lookup(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

fn split_property(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let mut key = String::new();
    let mut escaped = false;
    let mut rest = "";
    let mut consumed = 0;
    for c in line.chars() {
        consumed += c.len_utf8();
        if escaped {
            key.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                rest = &line[consumed..];
                break;
            }
            c if c.is_whitespace() => {
                rest = line[consumed..]
                    .trim_start()
                    .trim_start_matches(['=', ':']);
                break;
            }
            _ => key.push(c),
        }
    }
    if key.is_empty() {
        return None;
    }
    Some((key, unescape(rest.trim())))
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Stack of toolchain providers; the first layer that knows a key wins.
#[derive(Default)]
pub struct LayeredToolchain {
    layers: Vec<Box<dyn ToolchainProvider>>,
}

impl LayeredToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer below the existing ones.
    pub fn with_layer(mut self, layer: impl ToolchainProvider + 'static) -> Self {
        self.layers.push(Box::new(layer));
        self
    }

    pub fn depth(&self) -> usize {
        self.layers.len()
    }
}

impl ToolchainProvider for LayeredToolchain {
    fn lookup(&self, key: &str) -> Option<String> {
        self.layers.iter().find_map(|layer| layer.lookup(key))
    }
}

/// Build the layered toolchain: explicit values first, then each properties file in order.
pub fn toolchain_from_settings(settings: &ToolchainSettings) -> anyhow::Result<LayeredToolchain> {
    let mut toolchain = LayeredToolchain::new().with_layer(settings.values.clone());
    for path in &settings.properties {
        toolchain = toolchain.with_layer(PropertiesToolchain::from_path(path)?);
    }
    Ok(toolchain)
}

/// Built-in BOM catalog extended (or overridden) by configured BOMs.
pub fn bom_catalog(overrides: &BomOverrides) -> anyhow::Result<StaticBomCatalog> {
    let mut catalog = StaticBomCatalog::builtin();
    for (coordinate, members) in overrides {
        match parse_coordinate(coordinate) {
            Ok((_, Some(_))) => {}
            _ => anyhow::bail!("BOM key `{}` must be group:artifact:version", coordinate),
        }
        let mut managed = BTreeMap::new();
        for (artifact, version) in members {
            let id: ArtifactId = artifact
                .parse()
                .with_context(|| format!("BOM {} member", coordinate))?;
            managed.insert(id, version.clone());
        }
        debug!(bom = %coordinate, members = managed.len(), "registered BOM");
        catalog.insert(coordinate.clone(), managed);
    }
    Ok(catalog)
}
