//! Configuration persistence.
//!
//! `ConfigStore` owns the in-memory document and the storage it came from.
//! Every mutation that should survive the process goes through `save`, which
//! rewrites the whole document.
use super::{
    default_document, type_issues, validate_document, ConfigIssue, Document, ExecutionPolicy,
    GlobalSettings, Section, SectionTable,
};
use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;

/// Backing store for the serialized document.
pub trait Storage {
    /// Human-readable location used in messages.
    fn location(&self) -> String;

    /// Return the stored text, or `None` when nothing has been stored yet.
    fn read(&self) -> Result<Option<String>>;

    /// Replace the stored text.
    fn write(&mut self, contents: &str) -> Result<()>;
}

/// File-backed storage.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Storage at `path`; nothing is touched until the first read or write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path as given, before symlink resolution.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The file a write lands in: the symlink target when `path` is a link.
    fn write_target(&self) -> PathBuf {
        fs::canonicalize(&self.path).unwrap_or_else(|_| self.path.clone())
    }
}

impl Storage for FileStorage {
    fn location(&self) -> String {
        self.path().display().to_string()
    }

    fn read(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("read config {}", self.path.display())),
        }
    }

    fn write(&mut self, contents: &str) -> Result<()> {
        let target = self.write_target();
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).with_context(|| format!("create config dir {}", dir.display()))?;

        let existing = match fs::metadata(&target) {
            Ok(metadata) => metadata,
            Err(_) => {
                fs::write(&target, contents.as_bytes())
                    .with_context(|| format!("write {}", target.display()))?;
                return Ok(());
            }
        };
        // Replace an existing file by rename so a crash never leaves it truncated.
        let mut staged = NamedTempFile::new_in(&dir)
            .with_context(|| format!("stage config in {}", dir.display()))?;
        staged
            .write_all(contents.as_bytes())
            .context("write staged config")?;
        fs::set_permissions(staged.path(), existing.permissions())
            .context("copy config permissions")?;
        staged
            .persist(&target)
            .map_err(|err| err.error)
            .with_context(|| format!("write {}", target.display()))?;
        Ok(())
    }
}

/// In-memory storage, mainly for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    contents: Option<String>,
    writes: usize,
}

impl MemoryStorage {
    /// Empty storage; `load_or_init` will create the default document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-filled with `contents`.
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Some(contents.into()),
            writes: 0,
        }
    }

    /// Text from the last write, if any.
    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }

    /// Number of writes performed since construction.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl Storage for MemoryStorage {
    fn location(&self) -> String {
        "<memory>".to_string()
    }

    fn read(&self) -> Result<Option<String>> {
        Ok(self.contents.clone())
    }

    fn write(&mut self, contents: &str) -> Result<()> {
        self.contents = Some(contents.to_string());
        self.writes += 1;
        Ok(())
    }
}

/// Whether `load_or_init` read an existing document or synthesized one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOrigin {
    Loaded,
    Created,
}

/// Owner of the configuration document and its storage.
#[derive(Debug)]
pub struct ConfigStore<S> {
    storage: S,
    document: Document,
}

impl<S: Storage> ConfigStore<S> {
    /// Load the stored document, or create and persist the default one.
    ///
    /// Unparsable documents are an error. Wrong-typed fields and semantic
    /// issues are only logged.
    pub fn load_or_init(mut storage: S) -> Result<(Self, LoadOrigin)> {
        let (document, issues, origin) = match storage.read()? {
            Some(text) => {
                let (document, issues) = parse_document_checked(&text)
                    .with_context(|| format!("load config {}", storage.location()))?;
                (document, issues, LoadOrigin::Loaded)
            }
            None => {
                let document = default_document();
                storage.write(&render_document(&document)?)?;
                tracing::info!(location = %storage.location(), "created default configuration");
                let issues = validate_document(&document);
                (document, issues, LoadOrigin::Created)
            }
        };
        for issue in issues {
            tracing::warn!(path = %issue.path, "{}", issue.message);
        }
        tracing::debug!(
            location = %storage.location(),
            sections = document.sections.len(),
            "configuration loaded"
        );
        Ok((Self { storage, document }, origin))
    }

    /// Wrap an already-built document without touching storage.
    pub fn from_document(storage: S, document: Document) -> Self {
        Self { storage, document }
    }

    /// Rewrite the whole document to storage.
    pub fn save(&mut self) -> Result<()> {
        let text = render_document(&self.document)?;
        self.storage.write(&text)?;
        tracing::debug!(location = %self.storage.location(), "configuration saved");
        Ok(())
    }

    /// Where the document is stored, for messages.
    pub fn location(&self) -> String {
        self.storage.location()
    }

    /// The backing storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// The in-memory document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Global settings (`test_configuration`).
    pub fn settings(&self) -> &GlobalSettings {
        &self.document.settings
    }

    /// Execution policy (`test_execution`).
    pub fn policy(&self) -> &ExecutionPolicy {
        &self.document.policy
    }

    /// All sections in document order.
    pub fn sections(&self) -> &SectionTable {
        &self.document.sections
    }

    /// Look up a section by name.
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.document.sections.get(name)
    }

    /// Set a section's enabled flag in memory. Returns false for unknown names.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.document.sections.get_mut(name) {
            Some(section) => {
                section.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Section timeout, falling back to the global default.
    pub fn effective_timeout(&self, section: &Section) -> Duration {
        Duration::from_secs(self.document.settings.timeout_for(section))
    }
}

/// Parse a JSON configuration document.
///
/// Known fields with the wrong JSON type load as their defaults; only
/// malformed JSON is an error.
pub fn parse_document(text: &str) -> Result<Document> {
    serde_json::from_str(text).context("parse config JSON")
}

/// Parse a document and collect every issue: wrong-typed fields plus
/// `validate_document` findings.
pub fn parse_document_checked(text: &str) -> Result<(Document, Vec<ConfigIssue>)> {
    let document = parse_document(text)?;
    let raw: Value = serde_json::from_str(text).context("parse config JSON")?;
    let mut issues = type_issues(&raw);
    issues.extend(validate_document(&document));
    Ok((document, issues))
}

/// Render a document as pretty JSON with a trailing newline.
pub fn render_document(document: &Document) -> Result<String> {
    let mut text = serde_json::to_string_pretty(document).context("serialize config")?;
    text.push('\n');
    Ok(text)
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
