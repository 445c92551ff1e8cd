//! Configuration types for Markdown-to-PDF conversion.
//!
//! Run-level behaviour is controlled through [`ConversionConfig`], built via
//! its [`ConversionConfigBuilder`]. Per-document behaviour (plugins,
//! stylesheets, title) lives in the document's own front matter instead; see
//! [`crate::pipeline::matter::FrontMatter`].
//!
//! # Design choice: builder over constructor
//! The builder lets callers set only what they care about and rely on
//! documented defaults for the rest, and clamps numeric knobs into ranges the
//! browser accepts.

use crate::error::Md2PdfError;
use crate::plugins::PluginRegistry;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File name of the input document.
pub const INPUT_FILE: &str = "input.md";
/// File name of the intermediate HTML artifact.
pub const HTML_FILE: &str = "pdf.html";
/// File name of the PDF artifact.
pub const PDF_FILE: &str = "pdf.pdf";
/// File name of the PNG artifact.
pub const PNG_FILE: &str = "pdf.png";

/// Where the run reads its input and writes its three artifacts.
///
/// The file names are fixed; only the directory they live in can change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    pub input: PathBuf,
    pub html: PathBuf,
    pub pdf: PathBuf,
    pub png: PathBuf,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            input: PathBuf::from(INPUT_FILE),
            html: PathBuf::from(HTML_FILE),
            pdf: PathBuf::from(PDF_FILE),
            png: PathBuf::from(PNG_FILE),
        }
    }
}

impl ArtifactPaths {
    /// The fixed file names, resolved under `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            input: dir.join(INPUT_FILE),
            html: dir.join(HTML_FILE),
            pdf: dir.join(PDF_FILE),
            png: dir.join(PNG_FILE),
        }
    }
}

/// Configuration for one Markdown-to-PDF run.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_md2pdf::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .workdir("build")
///     .viewport(1280, 800)
///     .render_timeout_secs(30)
///     .build()
///     .unwrap();
/// assert!(config.paths.pdf.ends_with("pdf.pdf"));
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Input and artifact locations. Default: the fixed names in the current directory.
    pub paths: ArtifactPaths,

    /// Plugins that front matter may name. Default: the built-in set.
    pub registry: Arc<PluginRegistry>,

    /// Chrome/Chromium executable. If None, discovered via `chrome-auto`.
    pub browser_path: Option<PathBuf>,

    /// Launch the browser with `--no-sandbox`. Default: false.
    ///
    /// Needed when running as root inside containers, where Chromium refuses
    /// to start its sandbox.
    pub no_sandbox: bool,

    /// Viewport width in CSS pixels. Range: 320–7680. Default: 800.
    pub viewport_width: u32,

    /// Viewport height in CSS pixels. Range: 240–4320. Default: 600.
    ///
    /// The PNG captures exactly this viewport unless `full_page_screenshot`
    /// is set.
    pub viewport_height: u32,

    /// Capture the whole scrollable page in the PNG. Default: false.
    pub full_page_screenshot: bool,

    /// Time budget for starting the browser, in seconds. Default: 30.
    pub launch_timeout_secs: u64,

    /// Time budget for each of content load, PDF capture and PNG capture,
    /// in seconds. Default: 60.
    pub render_timeout_secs: u64,

    /// Stop after writing the intermediate HTML. Default: false.
    pub html_only: bool,

    /// Optional observer for plugin, stage, render and write events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            paths: ArtifactPaths::default(),
            registry: Arc::new(PluginRegistry::default()),
            browser_path: None,
            no_sandbox: false,
            viewport_width: 800,
            viewport_height: 600,
            full_page_screenshot: false,
            launch_timeout_secs: 30,
            render_timeout_secs: 60,
            html_only: false,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("paths", &self.paths)
            .field("registry", &self.registry)
            .field("browser_path", &self.browser_path)
            .field("no_sandbox", &self.no_sandbox)
            .field("viewport_width", &self.viewport_width)
            .field("viewport_height", &self.viewport_height)
            .field("full_page_screenshot", &self.full_page_screenshot)
            .field("launch_timeout_secs", &self.launch_timeout_secs)
            .field("render_timeout_secs", &self.render_timeout_secs)
            .field("html_only", &self.html_only)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn paths(mut self, paths: ArtifactPaths) -> Self {
        self.config.paths = paths;
        self
    }

    /// Read `input.md` from and write the artifacts into `dir`.
    pub fn workdir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.paths = ArtifactPaths::in_dir(dir);
        self
    }

    pub fn registry(mut self, registry: PluginRegistry) -> Self {
        self.config.registry = Arc::new(registry);
        self
    }

    pub fn browser_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.browser_path = Some(path.into());
        self
    }

    pub fn no_sandbox(mut self, v: bool) -> Self {
        self.config.no_sandbox = v;
        self
    }

    pub fn viewport(mut self, width: u32, height: u32) -> Self {
        self.config.viewport_width = width.clamp(320, 7680);
        self.config.viewport_height = height.clamp(240, 4320);
        self
    }

    pub fn full_page_screenshot(mut self, v: bool) -> Self {
        self.config.full_page_screenshot = v;
        self
    }

    pub fn launch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.launch_timeout_secs = secs;
        self
    }

    pub fn render_timeout_secs(mut self, secs: u64) -> Self {
        self.config.render_timeout_secs = secs;
        self
    }

    pub fn html_only(mut self, v: bool) -> Self {
        self.config.html_only = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Md2PdfError> {
        let c = &self.config;
        if c.launch_timeout_secs == 0 || c.render_timeout_secs == 0 {
            return Err(Md2PdfError::InvalidConfig(
                "Timeouts must be ≥ 1 second".into(),
            ));
        }
        if let Some(ref path) = c.browser_path {
            if path.as_os_str().is_empty() {
                return Err(Md2PdfError::InvalidConfig(
                    "Browser path must not be empty".into(),
                ));
            }
        }
        Ok(self.config)
    }
}
