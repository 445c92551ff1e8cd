//! Error types for the edgequake-md2pdf library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Md2PdfError`] is **fatal**: the run cannot proceed at all (unreadable
//!   input, malformed front matter, an unknown plugin, a plugin that threw,
//!   a browser that would not start). Returned as `Err(Md2PdfError)` from the
//!   top-level `convert*` functions; the CLI exits non-zero.
//!
//! * [`Diagnostic`] is **non-fatal**: something worth telling the author about
//!   (an invalid stylesheet entry, an undefined link reference, a heading with
//!   no text) that does not stop artifacts from being produced. Collected in
//!   [`crate::report::Report`] and printed after processing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Boxed error returned by plugin transforms.
pub type StageError = Box<dyn std::error::Error + Send + Sync>;

/// All fatal errors returned by the edgequake-md2pdf library.
///
/// Advisory problems use [`Diagnostic`] and are stored in
/// [`crate::report::Report`] rather than propagated here.
#[derive(Debug, Error)]
pub enum Md2PdfError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Markdown file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file was read but is not valid UTF-8 text.
    #[error("Input '{path}' is not valid UTF-8 (invalid byte at offset {offset})")]
    NotUtf8 { path: PathBuf, offset: usize },

    // ── Configuration errors ──────────────────────────────────────────────
    /// The front matter block is not valid YAML or has a field of the wrong shape.
    #[error("Malformed front matter: {detail}")]
    FrontMatter { detail: String },

    /// A declared plugin identifier is not known to the plugin registry.
    #[error(
        "Could not find {kind} plugin \"{name}\". Make sure it is registered in the \
PluginRegistry (known {kind} plugins: {available}).\nAborting..."
    )]
    PluginNotFound {
        kind: PluginKind,
        name: String,
        available: String,
    },

    // ── Pipeline errors ───────────────────────────────────────────────────
    /// A stage (usually a plugin transform) failed. Displayed verbatim.
    #[error("{source}")]
    Stage {
        stage: String,
        #[source]
        source: StageError,
    },

    // ── Render errors ─────────────────────────────────────────────────────
    /// No browser executable could be located.
    #[error("No headless browser available: {0}")]
    BrowserNotFound(String),

    /// The browser process could not be started or the CDP connection failed.
    #[error("Failed to launch browser '{path}': {detail}")]
    BrowserLaunch { path: PathBuf, detail: String },

    /// The rendered HTML could not be loaded into the page.
    #[error("Failed to load document into the browser page: {detail}")]
    ContentLoad { detail: String },

    /// PDF or PNG capture failed.
    #[error("{artifact} capture failed: {detail}")]
    Capture { artifact: ArtifactKind, detail: String },

    /// A browser step exceeded its time budget.
    #[error("Browser step '{step}' timed out after {secs}s\nIncrease --render-timeout or --launch-timeout.")]
    RenderTimeout { step: &'static str, secs: u64 },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output artifact.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// The two extension points a plugin can be declared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginKind {
    /// Syntax-tree plugins, declared under `remarkPlugins`.
    Remark,
    /// Markup-tree plugins, declared under `rehypePlugins`.
    Rehype,
}

impl fmt::Display for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginKind::Remark => f.write_str("remark"),
            PluginKind::Rehype => f.write_str("rehype"),
        }
    }
}

/// Artifacts written by a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Html,
    Pdf,
    Png,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Html => f.write_str("HTML"),
            ArtifactKind::Pdf => f.write_str("PDF"),
            ArtifactKind::Png => f.write_str("PNG"),
        }
    }
}

/// How serious a [`Diagnostic`] is. None of them stop the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => f.write_str("info"),
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// A non-fatal message surfaced by a resolver or a pipeline stage.
///
/// `origin` names who raised it (`"stylesheets"`, `"parse"`, `"rehype-slug"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl Diagnostic {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<8} {}", self.severity, self.message)?;
        if let Some(ref origin) = self.origin {
            write!(f, "  {origin}")?;
        }
        Ok(())
    }
}
