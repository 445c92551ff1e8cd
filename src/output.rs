//! Result types returned by the conversion entry points.

use crate::config::ArtifactPaths;
use crate::pipeline::matter::FrontMatter;
use crate::pipeline::stylesheet::LinkDescriptor;
use crate::report::Report;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Output of the processing half of a run (everything before the browser).
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedDocument {
    /// Final HTML text, as written to `pdf.html`.
    pub html: String,
    /// Every diagnostic raised while processing, in order.
    pub report: Report,
    /// The document's parsed front matter.
    pub front_matter: FrontMatter,
    /// Resolved syntax plugins, in application order.
    pub syntax_plugins: Vec<String>,
    /// Resolved markup plugins, in application order.
    pub markup_plugins: Vec<String>,
    /// Head links, in emission order.
    pub stylesheets: Vec<LinkDescriptor>,
    pub syntax_nodes: usize,
    pub markup_nodes: usize,
}

/// PDF and PNG captured from the same loaded page.
#[derive(Clone, PartialEq, Eq)]
pub struct RenderArtifacts {
    pub pdf: Vec<u8>,
    pub png: Vec<u8>,
    pub png_width: u32,
    pub png_height: u32,
}

impl fmt::Debug for RenderArtifacts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderArtifacts")
            .field("pdf", &format_args!("<{} bytes>", self.pdf.len()))
            .field("png", &format_args!("<{} bytes>", self.png.len()))
            .field("png_width", &self.png_width)
            .field("png_height", &self.png_height)
            .finish()
    }
}

/// Sizes and timings for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    pub html_bytes: usize,
    pub pdf_bytes: usize,
    pub png_bytes: usize,
    pub png_width: u32,
    pub png_height: u32,
    pub syntax_nodes: usize,
    pub markup_nodes: usize,
    /// Front matter, plugin resolution and the eight pipeline stages.
    pub processing_duration_ms: u64,
    /// Browser launch through capture and shutdown. Zero for HTML-only runs.
    pub render_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Where the input was read and the artifacts were written.
    pub paths: ArtifactPaths,
    /// Files actually written, in write order.
    pub written: Vec<PathBuf>,
    pub report: Report,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub remark_plugins: Vec<String>,
    pub rehype_plugins: Vec<String>,
    /// `href` of each linked stylesheet.
    pub stylesheets: Vec<String>,
    pub stats: ConversionStats,
    /// Final HTML text. Not serialized; it is already in `pdf.html`.
    #[serde(skip)]
    pub html: String,
}

impl ConversionOutput {
    /// True when the run stopped after writing the HTML.
    pub fn html_only(&self) -> bool {
        !self.written.contains(&self.paths.pdf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_artifacts_debug_hides_bytes() {
        let a = RenderArtifacts {
            pdf: vec![0; 2048],
            png: vec![0; 16],
            png_width: 800,
            png_height: 600,
        };
        let s = format!("{a:?}");
        assert!(s.contains("<2048 bytes>"));
        assert!(s.contains("png_width: 800"));
    }

    #[test]
    fn output_json_skips_html() {
        let out = ConversionOutput {
            paths: ArtifactPaths::default(),
            written: vec![PathBuf::from("pdf.html")],
            report: Report::new(),
            title: None,
            remark_plugins: vec!["remark-gfm".into()],
            rehype_plugins: Vec::new(),
            stylesheets: vec!["style.css".into()],
            stats: ConversionStats::default(),
            html: "<!doctype html>".into(),
        };
        let json = serde_json::to_string(&out).unwrap();
        assert!(!json.contains("doctype"));
        assert!(!json.contains("\"title\""));
        assert!(json.contains("remark-gfm"));
        assert!(out.html_only());
    }
}
