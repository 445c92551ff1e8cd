//! Built-in syntax-tree plugins.

use super::{PluginRegistry, SyntaxPlugin};
use crate::error::StageError;
use crate::pipeline::syntax::{SyntaxKind, SyntaxNode};
use crate::report::Report;
use pulldown_cmark::Options;

pub fn register_builtins(registry: &mut PluginRegistry) {
    registry.register_syntax("remark-gfm", || Box::new(Gfm));
    registry.register_syntax("remark-smartypants", || Box::new(SmartyPants));
    registry.register_syntax("remark-math", || Box::new(Math));
    registry.register_syntax("remark-unwrap-images", || Box::new(UnwrapImages));
}

/// GitHub Flavored Markdown: tables, strikethrough, task lists, footnotes
/// and `> [!NOTE]` alerts.
pub struct Gfm;

impl SyntaxPlugin for Gfm {
    fn name(&self) -> &str {
        "remark-gfm"
    }

    fn parser_options(&self) -> Options {
        Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_GFM
    }
}

/// Curly quotes, en/em dashes and ellipses.
pub struct SmartyPants;

impl SyntaxPlugin for SmartyPants {
    fn name(&self) -> &str {
        "remark-smartypants"
    }

    fn parser_options(&self) -> Options {
        Options::ENABLE_SMART_PUNCTUATION
    }
}

/// `$inline$` and `$$display$$` math.
pub struct Math;

impl SyntaxPlugin for Math {
    fn name(&self) -> &str {
        "remark-math"
    }

    fn parser_options(&self) -> Options {
        Options::ENABLE_MATH
    }
}

/// Replace paragraphs that hold only images (optionally linked) with the
/// images themselves.
pub struct UnwrapImages;

impl SyntaxPlugin for UnwrapImages {
    fn name(&self) -> &str {
        "remark-unwrap-images"
    }

    fn transform(&self, tree: &mut SyntaxNode, _report: &mut Report) -> Result<(), StageError> {
        unwrap_images(tree);
        Ok(())
    }
}

fn unwrap_images(node: &mut SyntaxNode) {
    let mut children = Vec::with_capacity(node.children.len());
    for mut child in std::mem::take(&mut node.children) {
        if child.kind == SyntaxKind::Paragraph && only_images(&child.children) {
            children.extend(child.children.into_iter().filter(is_image_like));
            continue;
        }
        unwrap_images(&mut child);
        children.push(child);
    }
    node.children = children;
}

fn is_image_like(node: &SyntaxNode) -> bool {
    match &node.kind {
        SyntaxKind::Image { .. } => true,
        SyntaxKind::Link { .. } => {
            !node.children.is_empty() && node.children.iter().all(is_image_like)
        }
        _ => false,
    }
}

fn is_blank(node: &SyntaxNode) -> bool {
    match &node.kind {
        SyntaxKind::Text(t) => t.trim().is_empty(),
        SyntaxKind::SoftBreak | SyntaxKind::HardBreak => true,
        _ => false,
    }
}

fn only_images(children: &[SyntaxNode]) -> bool {
    children.iter().any(is_image_like) && children.iter().all(|c| is_image_like(c) || is_blank(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::syntax::parse;

    #[test]
    fn gfm_enables_tables() {
        let opts = Gfm.parser_options();
        assert!(opts.contains(Options::ENABLE_TABLES));
        assert!(opts.contains(Options::ENABLE_FOOTNOTES));
        let tree = parse("| a |\n|---|\n| 1 |\n", opts, &mut Report::new());
        assert!(matches!(tree.children[0].kind, SyntaxKind::Table { .. }));
    }

    #[test]
    fn smartypants_curls_quotes() {
        let tree = parse("\"hi\" -- there...", SmartyPants.parser_options(), &mut Report::new());
        let text = tree.text_content();
        assert!(text.contains('“'), "got: {text}");
        assert!(text.contains('–'), "got: {text}");
        assert!(text.contains('…'), "got: {text}");
    }

    #[test]
    fn image_only_paragraph_is_unwrapped() {
        let mut tree = parse("![a](a.png)\n![b](b.png)\n\ntext ![c](c.png)\n", Options::empty(), &mut Report::new());
        UnwrapImages.transform(&mut tree, &mut Report::new()).unwrap();

        assert!(matches!(tree.children[0].kind, SyntaxKind::Image { .. }));
        assert!(matches!(tree.children[1].kind, SyntaxKind::Image { .. }));
        assert_eq!(tree.children[2].kind, SyntaxKind::Paragraph);
        assert_eq!(tree.children.len(), 3);
    }

    #[test]
    fn linked_image_counts_as_image() {
        let mut tree = parse("[![a](a.png)](https://x.test)\n", Options::empty(), &mut Report::new());
        UnwrapImages.transform(&mut tree, &mut Report::new()).unwrap();
        assert!(matches!(tree.children[0].kind, SyntaxKind::Link { .. }));
    }
}
