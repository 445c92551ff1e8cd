//! Stage composition ([`PipelineBuilder`]) and single-shot execution
//! ([`Pipeline::run`]).
//!
//! The skeleton is fixed; builders only choose which plugins fill the two
//! extension points and what goes into the document head.

use crate::error::Md2PdfError;
use crate::pipeline::document::{wrap_document, DocumentOptions};
use crate::pipeline::markup::MarkupNode;
use crate::pipeline::syntax::SyntaxNode;
use crate::pipeline::{bridge, format, rewrite, stringify, syntax, StageKind};
use crate::plugins::{MarkupPlugin, SyntaxPlugin};
use crate::progress::ProgressCallback;
use crate::report::Report;
use pulldown_cmark::Options;
use std::time::Instant;
use tracing::{debug, error};

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutput {
    /// Final HTML text.
    pub html: String,
    /// Diagnostics raised by the parser and plugins, in order.
    pub report: Report,
    /// Syntax tree size after the syntax plugins ran.
    pub syntax_nodes: usize,
    /// Markup tree size after the markup plugins ran.
    pub markup_nodes: usize,
}

/// Collects resolved plugins and document options into a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    syntax_plugins: Vec<Box<dyn SyntaxPlugin>>,
    markup_plugins: Vec<Box<dyn MarkupPlugin>>,
    document: DocumentOptions,
    progress: Option<ProgressCallback>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Syntax plugins for stage 2, in application order.
    pub fn syntax_plugins(mut self, plugins: Vec<Box<dyn SyntaxPlugin>>) -> Self {
        self.syntax_plugins = plugins;
        self
    }

    /// Markup plugins for stage 5, in application order.
    pub fn markup_plugins(mut self, plugins: Vec<Box<dyn MarkupPlugin>>) -> Self {
        self.markup_plugins = plugins;
        self
    }

    pub fn document(mut self, options: DocumentOptions) -> Self {
        self.document = options;
        self
    }

    pub fn progress(mut self, progress: Option<ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    pub fn build(self) -> Pipeline {
        let parser_options = self
            .syntax_plugins
            .iter()
            .fold(Options::empty(), |acc, p| acc | p.parser_options());

        debug!(
            "Pipeline: {} syntax plugin(s), {} markup plugin(s), {} stylesheet link(s)",
            self.syntax_plugins.len(),
            self.markup_plugins.len(),
            self.document.links.len()
        );

        Pipeline {
            parser_options,
            syntax_plugins: self.syntax_plugins,
            markup_plugins: self.markup_plugins,
            document: self.document,
            progress: self.progress,
        }
    }
}

/// A composed, ready-to-run pipeline. [`Pipeline::run`] consumes it.
pub struct Pipeline {
    parser_options: Options,
    syntax_plugins: Vec<Box<dyn SyntaxPlugin>>,
    markup_plugins: Vec<Box<dyn MarkupPlugin>>,
    document: DocumentOptions,
    progress: Option<ProgressCallback>,
}

impl Pipeline {
    /// The stage skeleton, in execution order.
    pub fn stages(&self) -> [StageKind; 8] {
        StageKind::ALL
    }

    /// Parser options contributed by the syntax plugins.
    pub fn parser_options(&self) -> Options {
        self.parser_options
    }

    pub fn syntax_plugin_names(&self) -> Vec<&str> {
        self.syntax_plugins.iter().map(|p| p.name()).collect()
    }

    pub fn markup_plugin_names(&self) -> Vec<&str> {
        self.markup_plugins.iter().map(|p| p.name()).collect()
    }

    /// Run every stage once over `content`.
    ///
    /// Diagnostics are appended to `report`, which may already hold messages
    /// from earlier steps (e.g. stylesheet resolution).
    ///
    /// # Errors
    ///
    /// [`Md2PdfError::Stage`] when a plugin transform fails; the remaining
    /// stages do not run.
    pub fn run(self, content: &str, mut report: Report) -> Result<PipelineOutput, Md2PdfError> {
        let Pipeline {
            parser_options,
            syntax_plugins,
            markup_plugins,
            document,
            progress,
        } = self;
        let progress = progress.as_ref();

        let mut tree: SyntaxNode = stage(progress, StageKind::Parse, || {
            Ok(syntax::parse(content, parser_options, &mut report))
        })?;

        stage(progress, StageKind::SyntaxTransforms, || {
            for plugin in &syntax_plugins {
                debug!("Applying syntax plugin {}", plugin.name());
                plugin
                    .transform(&mut tree, &mut report)
                    .map_err(|source| plugin_failed(plugin.name(), source))?;
            }
            Ok(())
        })?;
        let syntax_nodes = tree.node_count();

        let mut markup: MarkupNode =
            stage(progress, StageKind::Bridge, || Ok(bridge::to_markup(tree)))?;

        stage(progress, StageKind::RootRewrite, || {
            rewrite::rewrite_root(&mut markup);
            Ok(())
        })?;

        stage(progress, StageKind::MarkupTransforms, || {
            for plugin in &markup_plugins {
                debug!("Applying markup plugin {}", plugin.name());
                plugin
                    .transform(&mut markup, &mut report)
                    .map_err(|source| plugin_failed(plugin.name(), source))?;
            }
            Ok(())
        })?;
        let markup_nodes = markup.node_count();

        let mut document_tree = stage(progress, StageKind::DocumentWrap, || {
            Ok(wrap_document(markup, &document))
        })?;

        stage(progress, StageKind::Format, || {
            format::format(&mut document_tree);
            Ok(())
        })?;

        let html = stage(progress, StageKind::Stringify, || {
            Ok(stringify::to_html(&document_tree))
        })?;

        Ok(PipelineOutput {
            html,
            report,
            syntax_nodes,
            markup_nodes,
        })
    }
}

fn plugin_failed(name: &str, source: crate::error::StageError) -> Md2PdfError {
    error!("Plugin {name} failed: {source}");
    Md2PdfError::Stage {
        stage: name.to_string(),
        source,
    }
}

/// Run one stage with timing, tracing and progress notification.
fn stage<T>(
    progress: Option<&ProgressCallback>,
    kind: StageKind,
    f: impl FnOnce() -> Result<T, Md2PdfError>,
) -> Result<T, Md2PdfError> {
    if let Some(cb) = progress {
        cb.on_stage_start(kind);
    }
    let start = Instant::now();
    let out = f()?;
    let elapsed_ms = start.elapsed().as_millis() as u64;
    debug!("Stage {kind} done in {elapsed_ms}ms");
    if let Some(cb) = progress {
        cb.on_stage_complete(kind, elapsed_ms);
    }
    Ok(out)
}
