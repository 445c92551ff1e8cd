//! Syntax tree and stage 1: Markdown → [`SyntaxNode`].
//!
//! `pulldown-cmark` tokenizes; this module assembles its flat event stream
//! into an owned tree that syntax plugins can rewrite before it is bridged
//! to markup.

use crate::report::Report;
use pulldown_cmark::{
    Alignment, BlockQuoteKind, BrokenLink, BrokenLinkCallback, CodeBlockKind, CowStr, Event,
    HeadingLevel, LinkType, Options, Parser, Tag, TagEnd,
};
use tracing::debug;

/// Column alignment of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    None,
    Left,
    Center,
    Right,
}

impl Align {
    pub fn as_attr(self) -> Option<&'static str> {
        match self {
            Align::None => None,
            Align::Left => Some("left"),
            Align::Center => Some("center"),
            Align::Right => Some("right"),
        }
    }
}

/// What a [`SyntaxNode`] is. Leaf kinds carry their own text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxKind {
    Root,

    // ── Blocks ────────────────────────────────────────────────────────────
    Paragraph,
    Heading { level: u8 },
    /// `alert` is the lowercase GFM alert kind (`note`, `warning`, ...).
    BlockQuote { alert: Option<String> },
    CodeBlock { lang: Option<String> },
    HtmlBlock,
    /// `start` is `Some` for ordered lists.
    List { start: Option<u64> },
    /// `checked` is `Some` for task list items.
    ListItem { checked: Option<bool> },
    FootnoteDefinition { label: String },
    DefinitionList,
    DefinitionTerm,
    DefinitionDescription,
    Table { align: Vec<Align> },
    /// Holds the header cells directly.
    TableHead,
    TableRow,
    TableCell,
    ThematicBreak,
    DisplayMath(String),

    // ── Inline ────────────────────────────────────────────────────────────
    Emphasis,
    Strong,
    Delete,
    Superscript,
    Subscript,
    Link { url: String, title: String },
    /// Alt text is the text of the children.
    Image { url: String, title: String },
    Text(String),
    InlineCode(String),
    InlineMath(String),
    Html(String),
    FootnoteReference { label: String },
    SoftBreak,
    HardBreak,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    pub kind: SyntaxKind,
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    pub fn new(kind: SyntaxKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
        }
    }

    pub fn with_children(kind: SyntaxKind, children: Vec<SyntaxNode>) -> Self {
        Self { kind, children }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::new(SyntaxKind::Text(value.into()))
    }

    /// Concatenated text of this node and its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match &self.kind {
            SyntaxKind::Text(s)
            | SyntaxKind::InlineCode(s)
            | SyntaxKind::InlineMath(s)
            | SyntaxKind::DisplayMath(s) => out.push_str(s),
            SyntaxKind::SoftBreak | SyntaxKind::HardBreak => out.push(' '),
            _ => {}
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }

    /// Pre-order, mutable visit of this node and every descendant.
    pub fn visit_mut(&mut self, f: &mut impl FnMut(&mut SyntaxNode)) {
        f(self);
        for child in &mut self.children {
            child.visit_mut(f);
        }
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(SyntaxNode::node_count).sum::<usize>()
    }
}

// ── Parse ─────────────────────────────────────────────────────────────────

/// Parse `content` with `options` into a syntax tree rooted at
/// [`SyntaxKind::Root`].
///
/// Parsing never fails. Full and collapsed reference links whose label has no
/// definition are reported as warnings; the text stays literal.
pub fn parse(content: &str, options: Options, report: &mut Report) -> SyntaxNode {
    let mut undefined = Vec::new();
    let mut tree = TreeBuilder::new();

    let parser = Parser::new_with_broken_link_callback(
        content,
        options,
        Some(UndefinedReferences(&mut undefined)),
    );
    for event in parser {
        tree.event(event);
    }

    for label in undefined {
        report.warn("parse", format!("Undefined link reference `{label}`"));
    }

    let root = tree.finish();
    debug!("Parsed syntax tree: {} nodes", root.node_count());
    root
}

/// Records labels of `[text][label]` and `[label][]` links with no definition.
struct UndefinedReferences<'a>(&'a mut Vec<String>);

impl<'input> BrokenLinkCallback<'input> for UndefinedReferences<'_> {
    fn handle_broken_link(
        &mut self,
        link: BrokenLink<'input>,
    ) -> Option<(CowStr<'input>, CowStr<'input>)> {
        if matches!(link.link_type, LinkType::Reference | LinkType::Collapsed) {
            self.0.push(link.reference.to_string());
        }
        None
    }
}

/// Stack-based assembly of nested events into owned nodes.
struct TreeBuilder {
    stack: Vec<SyntaxNode>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            stack: vec![SyntaxNode::new(SyntaxKind::Root)],
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.open(start_kind(tag)),
            Event::End(end) => self.close(end),
            Event::Text(text) => self.append(SyntaxNode::text(text.into_string())),
            Event::Code(code) => {
                self.append(SyntaxNode::new(SyntaxKind::InlineCode(code.into_string())))
            }
            Event::InlineMath(math) => {
                self.append(SyntaxNode::new(SyntaxKind::InlineMath(math.into_string())))
            }
            Event::DisplayMath(math) => {
                self.append(SyntaxNode::new(SyntaxKind::DisplayMath(math.into_string())))
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                self.append(SyntaxNode::new(SyntaxKind::Html(html.into_string())))
            }
            Event::FootnoteReference(label) => self.append(SyntaxNode::new(
                SyntaxKind::FootnoteReference {
                    label: label.into_string(),
                },
            )),
            Event::SoftBreak => self.append(SyntaxNode::new(SyntaxKind::SoftBreak)),
            Event::HardBreak => self.append(SyntaxNode::new(SyntaxKind::HardBreak)),
            Event::Rule => self.append(SyntaxNode::new(SyntaxKind::ThematicBreak)),
            Event::TaskListMarker(done) => {
                let item = self
                    .stack
                    .iter_mut()
                    .rev()
                    .find(|n| matches!(n.kind, SyntaxKind::ListItem { .. }));
                if let Some(SyntaxNode {
                    kind: SyntaxKind::ListItem { checked },
                    ..
                }) = item
                {
                    *checked = Some(done);
                }
            }
        }
    }

    fn open(&mut self, kind: Option<SyntaxKind>) {
        // Metadata blocks are never enabled; front matter is split off earlier.
        if let Some(kind) = kind {
            self.stack.push(SyntaxNode::new(kind));
        }
    }

    fn close(&mut self, end: TagEnd) {
        if matches!(end, TagEnd::MetadataBlock(_)) || self.stack.len() < 2 {
            return;
        }
        if let Some(node) = self.stack.pop() {
            self.append(node);
        }
    }

    /// Append to the innermost open node, merging adjacent text.
    fn append(&mut self, node: SyntaxNode) {
        let Some(parent) = self.stack.last_mut() else {
            return;
        };
        if let SyntaxKind::Text(ref incoming) = node.kind {
            if let Some(SyntaxNode {
                kind: SyntaxKind::Text(existing),
                ..
            }) = parent.children.last_mut()
            {
                existing.push_str(incoming);
                return;
            }
        }
        parent.children.push(node);
    }

    fn finish(mut self) -> SyntaxNode {
        while self.stack.len() > 1 {
            if let Some(node) = self.stack.pop() {
                self.append(node);
            }
        }
        self.stack
            .pop()
            .unwrap_or_else(|| SyntaxNode::new(SyntaxKind::Root))
    }
}

fn start_kind(tag: Tag<'_>) -> Option<SyntaxKind> {
    let kind = match tag {
        Tag::Paragraph => SyntaxKind::Paragraph,
        Tag::Heading { level, .. } => SyntaxKind::Heading {
            level: heading_level(level),
        },
        Tag::BlockQuote(kind) => SyntaxKind::BlockQuote {
            alert: kind.map(|k| alert_name(k).to_string()),
        },
        Tag::CodeBlock(kind) => SyntaxKind::CodeBlock {
            lang: match kind {
                CodeBlockKind::Fenced(info) => info
                    .split_whitespace()
                    .next()
                    .map(|lang| lang.to_string()),
                CodeBlockKind::Indented => None,
            },
        },
        Tag::HtmlBlock => SyntaxKind::HtmlBlock,
        Tag::List(start) => SyntaxKind::List { start },
        Tag::Item => SyntaxKind::ListItem { checked: None },
        Tag::FootnoteDefinition(label) => SyntaxKind::FootnoteDefinition {
            label: label.into_string(),
        },
        Tag::DefinitionList => SyntaxKind::DefinitionList,
        Tag::DefinitionListTitle => SyntaxKind::DefinitionTerm,
        Tag::DefinitionListDefinition => SyntaxKind::DefinitionDescription,
        Tag::Table(alignments) => SyntaxKind::Table {
            align: alignments.into_iter().map(align).collect(),
        },
        Tag::TableHead => SyntaxKind::TableHead,
        Tag::TableRow => SyntaxKind::TableRow,
        Tag::TableCell => SyntaxKind::TableCell,
        Tag::Emphasis => SyntaxKind::Emphasis,
        Tag::Strong => SyntaxKind::Strong,
        Tag::Strikethrough => SyntaxKind::Delete,
        Tag::Superscript => SyntaxKind::Superscript,
        Tag::Subscript => SyntaxKind::Subscript,
        Tag::Link {
            dest_url, title, ..
        } => SyntaxKind::Link {
            url: dest_url.into_string(),
            title: title.into_string(),
        },
        Tag::Image {
            dest_url, title, ..
        } => SyntaxKind::Image {
            url: dest_url.into_string(),
            title: title.into_string(),
        },
        Tag::MetadataBlock(_) => return None,
    };
    Some(kind)
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn alert_name(kind: BlockQuoteKind) -> &'static str {
    match kind {
        BlockQuoteKind::Note => "note",
        BlockQuoteKind::Tip => "tip",
        BlockQuoteKind::Important => "important",
        BlockQuoteKind::Warning => "warning",
        BlockQuoteKind::Caution => "caution",
    }
}

fn align(a: Alignment) -> Align {
    match a {
        Alignment::None => Align::None,
        Alignment::Left => Align::Left,
        Alignment::Center => Align::Center,
        Alignment::Right => Align::Right,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_plain(md: &str) -> SyntaxNode {
        parse(md, Options::empty(), &mut Report::new())
    }

    #[test]
    fn heading_becomes_heading_node() {
        let root = parse_plain("# Hello");
        assert_eq!(root.kind, SyntaxKind::Root);
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].kind, SyntaxKind::Heading { level: 1 });
        assert_eq!(root.children[0].text_content(), "Hello");
    }

    #[test]
    fn adjacent_text_events_are_merged() {
        // pulldown-cmark splits text around characters it considered as syntax
        let root = parse_plain("a [b c");
        let para = &root.children[0];
        assert_eq!(para.children, vec![SyntaxNode::text("a [b c")]);
    }

    #[test]
    fn nested_lists_and_inline_marks() {
        let root = parse_plain("1. **bold** and *em*\n   - inner\n");
        let list = &root.children[0];
        assert_eq!(list.kind, SyntaxKind::List { start: Some(1) });
        let item = &list.children[0];
        assert!(item.children.iter().any(|c| c.kind == SyntaxKind::Strong));
        assert!(item
            .children
            .iter()
            .any(|c| c.kind == SyntaxKind::List { start: None }));
    }

    #[test]
    fn fenced_code_keeps_first_info_word() {
        let root = parse_plain("```rust ignore\nfn main() {}\n```\n");
        assert_eq!(
            root.children[0].kind,
            SyntaxKind::CodeBlock {
                lang: Some("rust".into())
            }
        );
        assert_eq!(root.children[0].text_content(), "fn main() {}\n");
    }

    #[test]
    fn tables_need_the_option() {
        let md = "| a | b |\n|:--|--:|\n| 1 | 2 |\n";
        let plain = parse_plain(md);
        assert_eq!(plain.children[0].kind, SyntaxKind::Paragraph);

        let gfm = parse(md, Options::ENABLE_TABLES, &mut Report::new());
        assert_eq!(
            gfm.children[0].kind,
            SyntaxKind::Table {
                align: vec![Align::Left, Align::Right]
            }
        );
        assert_eq!(gfm.children[0].children[0].kind, SyntaxKind::TableHead);
    }

    #[test]
    fn task_marker_sets_item_state() {
        let root = parse("- [x] done\n- [ ] todo\n", Options::ENABLE_TASKLISTS, &mut Report::new());
        let list = &root.children[0];
        assert_eq!(list.children[0].kind, SyntaxKind::ListItem { checked: Some(true) });
        assert_eq!(list.children[1].kind, SyntaxKind::ListItem { checked: Some(false) });
    }

    #[test]
    fn undefined_reference_is_reported() {
        let mut report = Report::new();
        parse("see [docs][missing] and [shortcut]", Options::empty(), &mut report);
        assert_eq!(report.len(), 1);
        assert!(report.messages[0].message.contains("missing"));
    }

    #[test]
    fn defined_reference_is_not_reported() {
        let mut report = Report::new();
        let root = parse("[docs][d]\n\n[d]: https://example.com\n", Options::empty(), &mut report);
        assert!(report.is_empty());
        assert!(matches!(
            root.children[0].children[0].kind,
            SyntaxKind::Link { ref url, .. } if url == "https://example.com"
        ));
    }

    #[test]
    fn visit_mut_reaches_every_node() {
        let mut root = parse_plain("# a\n\nb *c*\n");
        let mut seen = 0;
        root.visit_mut(&mut |_| seen += 1);
        assert_eq!(seen, root.node_count());
    }

    #[test]
    fn empty_input_is_bare_root() {
        let root = parse_plain("");
        assert_eq!(root, SyntaxNode::new(SyntaxKind::Root));
    }
}
