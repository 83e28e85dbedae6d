//! Parser for the declarative subset of the Gradle Kotlin DSL found in Flutter app modules.
//!
//! Line oriented and tolerant: statements outside the recognised blocks are skipped. Statements
//! inside them must be well formed.

use crate::error::IngestError;
use gradleplan_types::document::{
    BindingSource, BomRef, ConfigDocument, DependencyDeclaration, FlutterBlock, SdkField,
    VersionConstraint, parse_coordinate,
};
use std::collections::BTreeMap;
use tracing::debug;

/// Parse `build.gradle.kts` text into a configuration document.
pub fn parse_kts(text: &str) -> Result<ConfigDocument, IngestError> {
    let mut parser = KtsParser::default();
    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        for segment in parser.split(raw, line) {
            match segment {
                Segment::Open(header, at) => parser.open(header, at)?,
                Segment::Close => parser.close(line)?,
                Segment::Statement(stmt, at) => parser.statement(&stmt, at)?,
            }
        }
    }
    parser.finish()
}

/// Pieces of source, each with the line it starts on.
enum Segment {
    Open(String, usize),
    Close,
    Statement(String, usize),
}

struct Block {
    name: String,
    line: usize,
}

/// Where a statement sits in the block tree.
enum Context {
    Plugins,
    Android,
    CompileOptions,
    KotlinOptions,
    BuildType(String),
    Flutter,
    Dependencies,
    Other,
}

#[derive(Default)]
struct KtsParser {
    doc: ConfigDocument,
    blocks: Vec<Block>,
    in_block_comment: bool,
    /// Statement text carried across lines while parentheses are open.
    buf: String,
    buf_line: usize,
    paren_depth: usize,
    /// Property key -> line of its first assignment.
    assigned: BTreeMap<String, usize>,
}

impl KtsParser {
    /// Cut one source line into block openers, closers and statements.
    ///
    /// A statement with an open parenthesis continues on the next line.
    fn split(&mut self, text: &str, line: usize) -> Vec<Segment> {
        let mut out = Vec::new();
        let mut in_string = false;
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            if self.in_block_comment {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    self.in_block_comment = false;
                }
                continue;
            }
            if in_string {
                self.push(c, line);
                if c == '\\' {
                    if let Some(next) = chars.next() {
                        self.push(next, line);
                    }
                } else if c == '"' {
                    in_string = false;
                }
                continue;
            }
            match c {
                '"' => {
                    in_string = true;
                    self.push(c, line);
                }
                '/' if chars.peek() == Some(&'/') => break,
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    self.in_block_comment = true;
                }
                '(' => {
                    self.paren_depth += 1;
                    self.push(c, line);
                }
                ')' => {
                    self.paren_depth = self.paren_depth.saturating_sub(1);
                    self.push(c, line);
                }
                _ if self.paren_depth > 0 => self.push(c, line),
                '{' => {
                    let at = if self.buf.trim().is_empty() { line } else { self.buf_line };
                    out.push(Segment::Open(self.buf.trim().to_string(), at));
                    self.buf.clear();
                }
                '}' => {
                    self.flush(&mut out);
                    out.push(Segment::Close);
                }
                ';' => self.flush(&mut out),
                _ => self.push(c, line),
            }
        }
        if self.paren_depth == 0 {
            self.flush(&mut out);
        } else {
            self.buf.push(' ');
        }
        out
    }

    fn push(&mut self, c: char, line: usize) {
        if self.buf.trim().is_empty() {
            self.buf_line = line;
        }
        self.buf.push(c);
    }

    fn flush(&mut self, out: &mut Vec<Segment>) {
        let stmt = self.buf.trim();
        if !stmt.is_empty() {
            out.push(Segment::Statement(stmt.to_string(), self.buf_line));
        }
        self.buf.clear();
    }

    fn context(&self) -> Context {
        let names: Vec<&str> = self.blocks.iter().map(|b| b.name.as_str()).collect();
        match names.as_slice() {
            ["plugins"] => Context::Plugins,
            ["android"] | ["android", "defaultConfig"] => Context::Android,
            ["android", "compileOptions"] => Context::CompileOptions,
            ["android", "kotlinOptions"] | ["kotlin", "compilerOptions"] => Context::KotlinOptions,
            ["android", "buildTypes", name] => Context::BuildType(name.to_string()),
            ["flutter"] => Context::Flutter,
            ["dependencies"] => Context::Dependencies,
            _ => Context::Other,
        }
    }

    fn open(&mut self, header: String, line: usize) -> Result<(), IngestError> {
        let name = block_name(&header);
        let parent = self
            .blocks
            .iter()
            .map(|b| b.name.as_str())
            .collect::<Vec<_>>()
            .join(".");
        match parent.as_str() {
            "android.signingConfigs" => {
                self.doc.android.signing_configs.insert(name.clone());
            }
            "android.buildTypes" => {
                self.doc.android.build_types.entry(name.clone()).or_default();
            }
            // `implementation("g:a:v") { exclude(...) }` still declares the dependency.
            "dependencies" => self.dependency(&header, line)?,
            _ => {}
        }
        self.blocks.push(Block { name, line });
        Ok(())
    }

    fn close(&mut self, line: usize) -> Result<(), IngestError> {
        match self.blocks.pop() {
            Some(_) => Ok(()),
            None => Err(IngestError::UnbalancedBraces { line }),
        }
    }

    fn statement(&mut self, stmt: &str, line: usize) -> Result<(), IngestError> {
        match self.context() {
            Context::Plugins => self.plugin(stmt, line),
            Context::Android => self.android_property(stmt, line),
            Context::CompileOptions => self.java_option(stmt, line),
            Context::KotlinOptions => self.kotlin_option(stmt, line),
            Context::BuildType(name) => self.build_type(&name, stmt, line),
            Context::Flutter => self.flutter(stmt, line),
            Context::Dependencies => self.dependency(stmt, line),
            Context::Other => {
                skip(stmt, line);
                Ok(())
            }
        }
    }

    fn finish(self) -> Result<ConfigDocument, IngestError> {
        if self.paren_depth > 0 {
            return Err(malformed(self.buf_line, "unclosed parenthesis"));
        }
        if let Some(block) = self.blocks.last() {
            return Err(IngestError::UnbalancedBraces { line: block.line });
        }
        debug!(
            plugins = self.doc.plugins.len(),
            sdk_fields = self.doc.android.sdk.len(),
            boms = self.doc.boms.len(),
            dependencies = self.doc.dependencies.len(),
            "parsed build script"
        );
        Ok(self.doc)
    }

    fn record(&mut self, key: &str, line: usize) -> Result<(), IngestError> {
        if let Some(first) = self.assigned.get(key) {
            return Err(IngestError::DuplicateAssignment {
                line,
                first: *first,
                field: key.to_string(),
            });
        }
        self.assigned.insert(key.to_string(), line);
        Ok(())
    }

    fn plugin(&mut self, stmt: &str, line: usize) -> Result<(), IngestError> {
        let id = match leading_call(stmt) {
            Some(("id", arg, _)) => string_literal(arg.trim())
                .ok_or_else(|| malformed(line, format!("plugin id must be a string: {stmt}")))?,
            Some(("kotlin", arg, _)) => {
                let module = string_literal(arg.trim()).ok_or_else(|| {
                    malformed(line, format!("kotlin plugin must be a string: {stmt}"))
                })?;
                format!("org.jetbrains.kotlin.{module}")
            }
            Some(_) => {
                skip(stmt, line);
                return Ok(());
            }
            None => match stmt.strip_prefix('`').and_then(|s| s.strip_suffix('`')) {
                Some(id) => id.to_string(),
                None if is_identifier(stmt) => stmt.to_string(),
                None => {
                    skip(stmt, line);
                    return Ok(());
                }
            },
        };
        self.doc.push_plugin(id);
        Ok(())
    }

    fn android_property(&mut self, stmt: &str, line: usize) -> Result<(), IngestError> {
        let Some((name, value)) = property(stmt) else {
            skip(stmt, line);
            return Ok(());
        };
        match name {
            "namespace" | "applicationId" => {
                let text = string_literal(value)
                    .ok_or_else(|| malformed(line, format!("{name} must be a string literal")))?;
                self.record(name, line)?;
                if name == "namespace" {
                    self.doc.android.namespace = Some(text);
                } else {
                    self.doc.android.application_id = Some(text);
                }
            }
            _ => match SdkField::from_gradle_name(name) {
                Some(field) => {
                    let binding = parse_binding(value).ok_or_else(|| {
                        malformed(line, format!("cannot read value `{value}` for {field}"))
                    })?;
                    self.record(field.gradle_name(), line)?;
                    self.doc.android.sdk.insert(field, binding);
                }
                None => skip(stmt, line),
            },
        }
        Ok(())
    }

    fn java_option(&mut self, stmt: &str, line: usize) -> Result<(), IngestError> {
        let Some((name, value)) = property(stmt) else {
            skip(stmt, line);
            return Ok(());
        };
        let slot = match name {
            "sourceCompatibility" => &mut self.doc.android.compile_options.source_compatibility,
            "targetCompatibility" => &mut self.doc.android.compile_options.target_compatibility,
            _ => {
                skip(stmt, line);
                return Ok(());
            }
        };
        let level = java_level(value)
            .ok_or_else(|| malformed(line, format!("unrecognised Java version `{value}`")))?;
        *slot = Some(level);
        self.record(&format!("compileOptions.{name}"), line)
    }

    fn kotlin_option(&mut self, stmt: &str, line: usize) -> Result<(), IngestError> {
        match property(stmt) {
            Some(("jvmTarget", value)) => {
                let level = java_level(value)
                    .ok_or_else(|| malformed(line, format!("unrecognised JVM target `{value}`")))?;
                self.record("kotlinOptions.jvmTarget", line)?;
                self.doc.android.kotlin_options.jvm_target = Some(level);
            }
            _ => skip(stmt, line),
        }
        Ok(())
    }

    fn build_type(&mut self, build_type: &str, stmt: &str, line: usize) -> Result<(), IngestError> {
        let Some((name, value)) = property(stmt) else {
            skip(stmt, line);
            return Ok(());
        };
        match name {
            "signingConfig" => {
                let cfg = signing_config_ref(value).ok_or_else(|| {
                    malformed(line, format!("unrecognised signing config `{value}`"))
                })?;
                self.record(&format!("buildTypes.{build_type}.signingConfig"), line)?;
                self.doc
                    .android
                    .build_types
                    .entry(build_type.to_string())
                    .or_default()
                    .signing_config = cfg;
            }
            "isMinifyEnabled" | "minifyEnabled" => {
                let enabled = match value {
                    "true" => true,
                    "false" => false,
                    _ => return Err(malformed(line, format!("{name} must be true or false"))),
                };
                self.record(&format!("buildTypes.{build_type}.minifyEnabled"), line)?;
                self.doc
                    .android
                    .build_types
                    .entry(build_type.to_string())
                    .or_default()
                    .minify_enabled = Some(enabled);
            }
            _ => skip(stmt, line),
        }
        Ok(())
    }

    fn flutter(&mut self, stmt: &str, line: usize) -> Result<(), IngestError> {
        match property(stmt) {
            Some(("source", value)) => {
                let source = string_literal(value)
                    .ok_or_else(|| malformed(line, "flutter.source must be a string literal"))?;
                self.record("flutter.source", line)?;
                self.doc.flutter = Some(FlutterBlock { source });
            }
            _ => skip(stmt, line),
        }
        Ok(())
    }

    fn dependency(&mut self, stmt: &str, line: usize) -> Result<(), IngestError> {
        let Some((configuration, arg)) = call(stmt).filter(|(name, _)| is_identifier(name)) else {
            skip(stmt, line);
            return Ok(());
        };
        let arg = arg.trim();

        if let Some((wrapper, inner)) = call(arg) {
            if !matches!(wrapper, "platform" | "enforcedPlatform") {
                // project(...), files(...), kotlin("stdlib") and friends carry no coordinate.
                skip(stmt, line);
                return Ok(());
            }
            let coordinate = string_literal(inner.trim())
                .ok_or_else(|| malformed(line, format!("{wrapper}(...) needs a string coordinate")))?;
            let (artifact, version) =
                parse_coordinate(&coordinate).map_err(|e| malformed(line, e.to_string()))?;
            let version = version
                .ok_or_else(|| malformed(line, format!("BOM `{coordinate}` has no version")))?;
            self.doc.boms.push(BomRef {
                configuration: configuration.to_string(),
                artifact,
                version,
            });
            return Ok(());
        }

        let Some(coordinate) = string_literal(arg) else {
            // Version catalog accessors (`libs.foo`) are resolved by Gradle, not here.
            skip(stmt, line);
            return Ok(());
        };
        let (artifact, version) =
            parse_coordinate(&coordinate).map_err(|e| malformed(line, e.to_string()))?;
        self.doc.dependencies.push(DependencyDeclaration {
            configuration: configuration.to_string(),
            artifact,
            version: version.map_or(VersionConstraint::FromBom, VersionConstraint::Explicit),
        });
        Ok(())
    }
}

fn skip(stmt: &str, line: usize) {
    debug!(line, statement = stmt, "skipping unrecognised statement");
}

fn malformed(line: usize, message: impl Into<String>) -> IngestError {
    IngestError::Malformed {
        line,
        message: message.into(),
    }
}

/// `create("upload")` and `getByName("release")` open blocks named after their argument.
fn block_name(header: &str) -> String {
    if let Some((func, arg)) = call(header)
        && matches!(
            func,
            "create" | "getByName" | "named" | "maybeCreate" | "register"
        )
        && let Some(name) = string_literal(arg.trim())
    {
        return name;
    }
    header.trim().to_string()
}

/// `name = value` or `name(value)`.
fn property(stmt: &str) -> Option<(&str, &str)> {
    assignment(stmt).or_else(|| call(stmt).filter(|(name, _)| is_identifier(name)))
}

fn assignment(stmt: &str) -> Option<(&str, &str)> {
    let bytes = stmt.as_bytes();
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'=' => {
                let name = stmt[..i].trim();
                if bytes.get(i + 1) == Some(&b'=') || !is_identifier(name) {
                    return None;
                }
                return Some((name, stmt[i + 1..].trim()));
            }
            _ => {}
        }
    }
    None
}

/// Split `name(args)rest` at the parenthesis matching the first one.
fn leading_call(s: &str) -> Option<(&str, &str, &str)> {
    let s = s.trim();
    let open = s.find('(')?;
    let name = s[..open].trim();
    if !is_reference(name) {
        return None;
    }
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, b) in s.bytes().enumerate().skip(open) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some((name, &s[open + 1..i], &s[i + 1..]));
                }
            }
            _ => {}
        }
    }
    None
}

/// A call with nothing after its closing parenthesis.
fn call(s: &str) -> Option<(&str, &str)> {
    let (name, args, rest) = leading_call(s)?;
    rest.trim().is_empty().then_some((name, args))
}

/// Unquote a plain `"..."` literal. String templates are not literals.
fn string_literal(expr: &str) -> Option<String> {
    let inner = expr.trim().strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next()? {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                other => out.push(other),
            },
            '"' | '$' => return None,
            _ => out.push(c),
        }
    }
    Some(out)
}

fn parse_binding(expr: &str) -> Option<BindingSource> {
    let expr = expr.trim();
    if let Some(text) = string_literal(expr) {
        return Some(BindingSource::literal_text(text));
    }
    if let Ok(n) = expr.parse::<i64>() {
        return Some(BindingSource::literal_int(n));
    }
    let key = strip_conversions(expr);
    is_reference(key).then(|| BindingSource::indirect(key))
}

fn strip_conversions(mut expr: &str) -> &str {
    const CONVERSIONS: [&str; 3] = [".toInteger()", ".toInt()", ".toString()"];
    while let Some(stripped) = CONVERSIONS.iter().find_map(|c| expr.strip_suffix(c)) {
        expr = stripped.trim_end();
    }
    expr
}

/// `JavaVersion.VERSION_1_8` -> `1.8`, `JvmTarget.JVM_11` -> `11`, `"17"` -> `17`.
fn java_level(expr: &str) -> Option<String> {
    let expr = strip_conversions(expr.trim());
    if let Some(text) = string_literal(expr) {
        return Some(text);
    }
    let tail = expr
        .strip_prefix("JavaVersion.VERSION_")
        .or_else(|| expr.strip_prefix("JvmTarget.JVM_"))?;
    let level = tail.replace('_', ".");
    level
        .split('.')
        .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
        .then_some(level)
}

fn signing_config_ref(expr: &str) -> Option<Option<String>> {
    let expr = expr.trim();
    if expr == "null" {
        return Some(None);
    }
    let rest = expr.strip_prefix("signingConfigs")?;
    if let Some(index) = rest.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
        return string_literal(index).map(Some);
    }
    let rest = rest.strip_prefix('.')?;
    if let Some((func, arg)) = call(rest) {
        if matches!(func, "getByName" | "named" | "getAt") {
            return string_literal(arg).map(Some);
        }
        return None;
    }
    is_identifier(rest).then(|| Some(rest.to_string()))
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Dotted identifier path such as `flutter.minSdkVersion`.
fn is_reference(s: &str) -> bool {
    !s.is_empty() && s.split('.').all(is_identifier)
}
