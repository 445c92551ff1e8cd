//! Conversion entry points.
//!
//! ## Why two halves?
//!
//! [`process_markdown`] is pure: text in, HTML and a report out, no I/O and
//! no browser. [`convert`] wraps it with the file boundary and the render
//! step. Keeping them apart lets callers (and tests) exercise the whole
//! pipeline without Chromium installed.
//!
//! Nothing is written until processing has succeeded, so an unknown plugin
//! or a failing transform leaves the working directory untouched.

use crate::config::ConversionConfig;
use crate::error::{ArtifactKind, Md2PdfError};
use crate::output::{ConversionOutput, ConversionStats, ProcessedDocument};
use crate::pipeline::builder::PipelineBuilder;
use crate::pipeline::document::{DocumentOptions, DEFAULT_LANG};
use crate::pipeline::{input, matter, render, stylesheet};
use crate::plugins::PluginRegistry;
use crate::progress::ProgressCallback;
use crate::report::Report;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

pub use crate::pipeline::render::render_html;

/// Run the processing half on an in-memory document.
///
/// Extracts front matter, resolves both plugin lists and the stylesheets,
/// then runs the eight-stage pipeline once.
///
/// # Errors
/// - [`Md2PdfError::FrontMatter`] for malformed YAML
/// - [`Md2PdfError::PluginNotFound`] for the first unknown plugin identifier
/// - [`Md2PdfError::Stage`] when a plugin transform fails
///
/// # Example
/// ```rust
/// use edgequake_md2pdf::{process_markdown, PluginRegistry};
///
/// let doc = process_markdown("---\nstylesheets: [style.css]\n---\n# Hello\n",
///     &PluginRegistry::default(), None).unwrap();
/// assert!(doc.html.contains("<h1>Hello</h1>"));
/// assert!(doc.html.contains("<link rel=\"stylesheet\" href=\"style.css\">"));
/// ```
pub fn process_markdown(
    source: &str,
    registry: &PluginRegistry,
    progress: Option<&ProgressCallback>,
) -> Result<ProcessedDocument, Md2PdfError> {
    let matter::Matter { data, content } = matter::extract(source)?;

    let syntax_plugins = registry.resolve_syntax(&data.remark_plugins, progress)?;
    let markup_plugins = registry.resolve_markup(&data.rehype_plugins, progress)?;

    let mut report = Report::new();
    let stylesheets = stylesheet::resolve_stylesheets(&data.stylesheets, &mut report, progress);

    let pipeline = PipelineBuilder::new()
        .syntax_plugins(syntax_plugins)
        .markup_plugins(markup_plugins)
        .document(DocumentOptions {
            lang: data.lang.clone().unwrap_or_else(|| DEFAULT_LANG.to_string()),
            title: data.title.clone(),
            links: stylesheets.clone(),
        })
        .progress(progress.cloned())
        .build();
    let syntax_names = owned(pipeline.syntax_plugin_names());
    let markup_names = owned(pipeline.markup_plugin_names());

    let out = pipeline.run(&content, report)?;

    Ok(ProcessedDocument {
        html: out.html,
        report: out.report,
        front_matter: data,
        syntax_plugins: syntax_names,
        markup_plugins: markup_names,
        stylesheets,
        syntax_nodes: out.syntax_nodes,
        markup_nodes: out.markup_nodes,
    })
}

/// Convert `input.md` into `pdf.html`, `pdf.pdf` and `pdf.png`.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(ConversionOutput)` once every artifact is on disk. The report inside
/// may be non-empty; diagnostics never block the run.
///
/// # Errors
/// Any [`Md2PdfError`]. Processing errors leave no files behind. Render
/// errors leave `pdf.html` in place, since it was already written.
pub async fn convert(config: &ConversionConfig) -> Result<ConversionOutput, Md2PdfError> {
    let total_start = Instant::now();
    let paths = &config.paths;
    let progress = config.progress_callback.as_ref();
    info!("Starting conversion: {}", paths.input.display());

    // ── Step 1: Read input ───────────────────────────────────────────────
    let source = input::read_document(&paths.input).await?;

    // ── Step 2: Process ──────────────────────────────────────────────────
    let processing_start = Instant::now();
    let doc = process_markdown(&source, &config.registry, progress)?;
    let processing_duration_ms = processing_start.elapsed().as_millis() as u64;
    info!(
        "Processed document in {}ms ({} diagnostic(s))",
        processing_duration_ms,
        doc.report.len()
    );

    // ── Step 3: Surface the report before anything can fail in the browser ─
    if let Some(cb) = progress {
        cb.on_report(&doc.report);
    }

    // ── Step 4: Write intermediate HTML ──────────────────────────────────
    let mut written: Vec<PathBuf> = Vec::with_capacity(3);
    write_artifact(&paths.html, doc.html.as_bytes(), ArtifactKind::Html, progress).await?;
    written.push(paths.html.clone());

    let mut stats = ConversionStats {
        html_bytes: doc.html.len(),
        syntax_nodes: doc.syntax_nodes,
        markup_nodes: doc.markup_nodes,
        processing_duration_ms,
        ..Default::default()
    };

    // ── Step 5: Render and write PDF + PNG ───────────────────────────────
    if config.html_only {
        debug!("HTML-only run; skipping the browser");
    } else {
        let render_start = Instant::now();
        let artifacts = render::render_html(&doc.html, config).await?;
        stats.render_duration_ms = render_start.elapsed().as_millis() as u64;

        write_artifact(&paths.pdf, &artifacts.pdf, ArtifactKind::Pdf, progress).await?;
        written.push(paths.pdf.clone());
        write_artifact(&paths.png, &artifacts.png, ArtifactKind::Png, progress).await?;
        written.push(paths.png.clone());

        stats.pdf_bytes = artifacts.pdf.len();
        stats.png_bytes = artifacts.png.len();
        stats.png_width = artifacts.png_width;
        stats.png_height = artifacts.png_height;
    }

    stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
    info!(
        "Conversion complete: {} file(s), {}ms total",
        written.len(),
        stats.total_duration_ms
    );
    if let Some(cb) = progress {
        cb.on_conversion_complete(written.len());
    }

    Ok(ConversionOutput {
        paths: paths.clone(),
        written,
        report: doc.report,
        title: doc.front_matter.title,
        remark_plugins: doc.syntax_plugins,
        rehype_plugins: doc.markup_plugins,
        stylesheets: doc.stylesheets.iter().map(|l| l.href().to_string()).collect(),
        stats,
        html: doc.html,
    })
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(config: &ConversionConfig) -> Result<ConversionOutput, Md2PdfError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Md2PdfError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Atomic write: temp file next to the target, then rename over it.
async fn write_artifact(
    path: &Path,
    bytes: &[u8],
    kind: ArtifactKind,
    progress: Option<&ProgressCallback>,
) -> Result<(), Md2PdfError> {
    let write_failed = |e| Md2PdfError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
    }

    let tmp_path = tmp_path_for(path);
    tokio::fs::write(&tmp_path, bytes).await.map_err(write_failed)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_failed)?;

    debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
    if let Some(cb) = progress {
        cb.on_artifact_written(kind, path, bytes.len());
    }
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let ext = path
        .extension()
        .map(|e| format!("{}.tmp", e.to_string_lossy()))
        .unwrap_or_else(|| "tmp".to_string());
    path.with_extension(ext)
}

fn owned(names: Vec<&str>) -> Vec<String> {
    names.into_iter().map(str::to_string).collect()
}
