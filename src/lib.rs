//! # edgequake-md2pdf
//!
//! Turn a Markdown document into a styled HTML page, then into a PDF and a
//! PNG snapshot using headless Chromium.
//!
//! ## Why this crate?
//!
//! "Document as code": the document itself declares how it is processed.
//! Its YAML front matter names the syntax-tree plugins, the markup-tree
//! plugins and the stylesheets to apply, so the same `input.md` produces the
//! same artifacts on every machine with no extra build configuration.
//!
//! ## Pipeline Overview
//!
//! ```text
//! input.md
//!  │
//!  ├─ front matter   remarkPlugins / rehypePlugins / stylesheets / title / lang
//!  ├─ resolve        plugin identifiers → registry factories (fail-fast)
//!  │
//!  ├─ 1. Parse             pulldown-cmark events → syntax tree
//!  ├─ 2. Syntax plugins    remark-*
//!  ├─ 3. Bridge            syntax tree → markup tree
//!  ├─ 4. Root rewrite      synthesized root → transparent placeholder
//!  ├─ 5. Markup plugins    rehype-*
//!  ├─ 6. Document wrap     doctype, <html lang>, <head> with links
//!  ├─ 7. Format            two-space indentation
//!  ├─ 8. Stringify         → pdf.html
//!  │
//!  └─ render         one Chromium page, screen media → pdf.pdf + pdf.png
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_md2pdf::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads ./input.md, writes ./pdf.html, ./pdf.pdf and ./pdf.png
//!     let config = ConversionConfig::default();
//!     let output = convert(&config).await?;
//!     eprintln!("Reporter: {}", output.report);
//!     eprintln!("PNG: {}x{}", output.stats.png_width, output.stats.png_height);
//!     Ok(())
//! }
//! ```
//!
//! Without a browser, [`process_markdown`] runs the processing half alone:
//!
//! ```rust
//! use edgequake_md2pdf::{process_markdown, PluginRegistry};
//!
//! let doc = process_markdown("# Hello", &PluginRegistry::default(), None).unwrap();
//! assert!(doc.html.contains("<h1>Hello</h1>"));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `md2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! edgequake-md2pdf = { version = "0.1", default-features = false }
//! ```
//!
//! ## Built-in Plugins
//!
//! | Identifier | Kind | Effect |
//! |------------|------|--------|
//! | `remark-gfm` | remark | tables, strikethrough, task lists, footnotes, alerts |
//! | `remark-math` | remark | `$inline$` and `$$display$$` math |
//! | `remark-smartypants` | remark | curly quotes, dashes, ellipses |
//! | `remark-unwrap-images` | remark | image-only paragraphs become bare images |
//! | `rehype-slug` | rehype | GitHub-style heading ids |
//! | `rehype-autolink-headings` | rehype | self-link anchors in headings |
//! | `rehype-external-links` | rehype | `rel="nofollow"` on absolute links |
//!
//! Register more through [`PluginRegistry::register_syntax`] and
//! [`PluginRegistry::register_markup`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod plugins;
pub mod progress;
pub mod report;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ArtifactPaths, ConversionConfig, ConversionConfigBuilder};
pub use convert::{convert, convert_sync, process_markdown, render_html};
pub use error::{ArtifactKind, Diagnostic, Md2PdfError, PluginKind, Severity, StageError};
pub use output::{ConversionOutput, ConversionStats, ProcessedDocument, RenderArtifacts};
pub use pipeline::StageKind;
pub use plugins::{MarkupPlugin, PluginRegistry, SyntaxPlugin};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use report::Report;
