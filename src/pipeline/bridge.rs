//! Stage 3: syntax tree → markup tree.
//!
//! The result is always a single [`MarkupNode::Root`] whose children are the
//! converted blocks interleaved with `"\n"` text nodes. That synthesized
//! wrapper is what [`crate::pipeline::rewrite`] neutralizes next.
//!
//! Raw HTML from the source is dropped. Footnote definitions are lifted out
//! of the flow and emitted, in order of first reference, in a trailing
//! `section.footnotes`.

use crate::pipeline::markup::{Element, MarkupNode};
use crate::pipeline::syntax::{Align, SyntaxKind, SyntaxNode};
use std::collections::HashMap;

/// Convert a syntax tree rooted at [`SyntaxKind::Root`] into a markup tree.
pub fn to_markup(mut root: SyntaxNode) -> MarkupNode {
    let mut bridge = Bridge::default();
    bridge.take_definitions(&mut root);

    let mut blocks = bridge.nodes(root.children);
    if let Some(section) = bridge.footnote_section() {
        blocks.push(section);
    }

    MarkupNode::Root(wrap(blocks, false))
}

#[derive(Default)]
struct Bridge {
    definitions: HashMap<String, Vec<SyntaxNode>>,
    /// Footnote labels, in order of first reference. Number = index + 1.
    order: Vec<String>,
    /// References seen so far, parallel to `order`.
    ref_counts: Vec<usize>,
}

impl Bridge {
    fn take_definitions(&mut self, node: &mut SyntaxNode) {
        let mut kept = Vec::with_capacity(node.children.len());
        for mut child in std::mem::take(&mut node.children) {
            if let SyntaxKind::FootnoteDefinition { label } = child.kind {
                self.definitions.entry(label).or_insert(child.children);
                continue;
            }
            self.take_definitions(&mut child);
            kept.push(child);
        }
        node.children = kept;
    }

    /// Convert a sibling list, merging adjacent text.
    fn nodes(&mut self, nodes: Vec<SyntaxNode>) -> Vec<MarkupNode> {
        let mut out: Vec<MarkupNode> = Vec::with_capacity(nodes.len());
        for node in nodes {
            for converted in self.node(node) {
                if let MarkupNode::Text(next) = &converted {
                    if let Some(MarkupNode::Text(prev)) = out.last_mut() {
                        prev.push_str(next);
                        continue;
                    }
                }
                out.push(converted);
            }
        }
        out
    }

    fn node(&mut self, node: SyntaxNode) -> Vec<MarkupNode> {
        let SyntaxNode { kind, children } = node;
        let converted = match kind {
            SyntaxKind::Root => return self.nodes(children),

            // ── Blocks ────────────────────────────────────────────────────
            SyntaxKind::Paragraph => match lone_display_math(&children) {
                Some(math) => element("pre", vec![math_code(math, "math-display")]),
                None => element("p", self.nodes(children)),
            },
            SyntaxKind::Heading { level } => element(&format!("h{level}"), self.nodes(children)),
            SyntaxKind::BlockQuote { alert } => self.blockquote(alert, children),
            SyntaxKind::CodeBlock { lang } => {
                let text = SyntaxNode::with_children(SyntaxKind::Root, children).text_content();
                let mut code = Element::new("code");
                if let Some(lang) = lang {
                    code.set_attr("class", format!("language-{lang}"));
                }
                element("pre", vec![code.with_child(MarkupNode::text(text)).into()])
            }
            SyntaxKind::HtmlBlock | SyntaxKind::Html(_) => return Vec::new(),
            SyntaxKind::List { start } => self.list(start, children),
            SyntaxKind::ListItem { checked } => self.list_item(checked, children),
            SyntaxKind::FootnoteDefinition { .. } => return Vec::new(),
            SyntaxKind::DefinitionList => element("dl", wrap(self.nodes(children), true)),
            SyntaxKind::DefinitionTerm => element("dt", self.nodes(children)),
            SyntaxKind::DefinitionDescription => element("dd", self.nodes(children)),
            SyntaxKind::Table { align } => self.table(&align, children),
            SyntaxKind::TableHead | SyntaxKind::TableRow => self.row(children, "td", &[]),
            SyntaxKind::TableCell => element("td", self.nodes(children)),
            SyntaxKind::ThematicBreak => element("hr", Vec::new()),
            SyntaxKind::DisplayMath(math) => math_code(math, "math-display"),

            // ── Inline ────────────────────────────────────────────────────
            SyntaxKind::Emphasis => element("em", self.nodes(children)),
            SyntaxKind::Strong => element("strong", self.nodes(children)),
            SyntaxKind::Delete => element("del", self.nodes(children)),
            SyntaxKind::Superscript => element("sup", self.nodes(children)),
            SyntaxKind::Subscript => element("sub", self.nodes(children)),
            SyntaxKind::Link { url, title } => {
                let mut a = Element::new("a").with_attr("href", url);
                if !title.is_empty() {
                    a.set_attr("title", title);
                }
                a.with_children(self.nodes(children)).into()
            }
            SyntaxKind::Image { url, title } => {
                let alt = SyntaxNode::with_children(SyntaxKind::Root, children).text_content();
                let mut img = Element::new("img").with_attr("src", url).with_attr("alt", alt);
                if !title.is_empty() {
                    img.set_attr("title", title);
                }
                img.into()
            }
            SyntaxKind::Text(text) => MarkupNode::Text(text),
            SyntaxKind::InlineCode(code) => element("code", vec![MarkupNode::Text(code)]),
            SyntaxKind::InlineMath(math) => math_code(math, "math-inline"),
            SyntaxKind::FootnoteReference { label } => self.footnote_ref(label),
            SyntaxKind::SoftBreak => MarkupNode::text("\n"),
            SyntaxKind::HardBreak => {
                return vec![element("br", Vec::new()), MarkupNode::text("\n")];
            }
        };
        vec![converted]
    }

    fn blockquote(&mut self, alert: Option<String>, children: Vec<SyntaxNode>) -> MarkupNode {
        let mut body = self.nodes(children);
        let mut quote = Element::new("blockquote");
        if let Some(kind) = alert {
            quote.add_class("markdown-alert");
            quote.add_class(&format!("markdown-alert-{kind}"));
            let title = Element::new("p")
                .with_attr("class", "markdown-alert-title")
                .with_child(MarkupNode::text(capitalize(&kind)));
            body.insert(0, title.into());
        }
        quote.with_children(wrap(body, true)).into()
    }

    fn list(&mut self, start: Option<u64>, children: Vec<SyntaxNode>) -> MarkupNode {
        let has_tasks = children
            .iter()
            .any(|c| matches!(c.kind, SyntaxKind::ListItem { checked: Some(_) }));

        let mut list = match start {
            Some(n) if n != 1 => Element::new("ol").with_attr("start", n.to_string()),
            Some(_) => Element::new("ol"),
            None => Element::new("ul"),
        };
        if has_tasks {
            list.add_class("contains-task-list");
        }
        list.with_children(wrap(self.nodes(children), true)).into()
    }

    fn list_item(&mut self, checked: Option<bool>, children: Vec<SyntaxNode>) -> MarkupNode {
        let loose = children
            .iter()
            .any(|c| matches!(c.kind, SyntaxKind::Paragraph));
        let mut body = self.nodes(children);
        let mut li = Element::new("li");

        if let Some(done) = checked {
            li.add_class("task-list-item");
            let mut input = Element::new("input").with_attr("type", "checkbox");
            if done {
                input.set_attr("checked", "");
            }
            input.set_attr("disabled", "");
            let marker = [input.into(), MarkupNode::text(" ")];

            match body.first_mut() {
                Some(MarkupNode::Element(p)) if p.tag == "p" => {
                    p.children.splice(0..0, marker);
                }
                _ => {
                    body.splice(0..0, marker);
                }
            }
        }

        let body = if loose { wrap(body, true) } else { body };
        li.with_children(body).into()
    }

    fn table(&mut self, align: &[Align], rows: Vec<SyntaxNode>) -> MarkupNode {
        let mut sections = Vec::new();
        let mut body = Vec::new();
        for row in rows {
            match row.kind {
                SyntaxKind::TableHead => {
                    let head = self.row(row.children, "th", align);
                    sections.push(element("thead", wrap(vec![head], true)));
                }
                _ => body.push(self.row(row.children, "td", align)),
            }
        }
        if !body.is_empty() {
            sections.push(element("tbody", wrap(body, true)));
        }
        element("table", wrap(sections, true))
    }

    fn row(&mut self, cells: Vec<SyntaxNode>, cell_tag: &str, align: &[Align]) -> MarkupNode {
        let mut out = Vec::with_capacity(cells.len());
        for (i, cell) in cells.into_iter().enumerate() {
            let mut el = Element::new(cell_tag).with_children(self.nodes(cell.children));
            if let Some(value) = align.get(i).and_then(|a| a.as_attr()) {
                el.set_attr("align", value);
            }
            out.push(el.into());
        }
        element("tr", wrap(out, true))
    }

    // ── Footnotes ─────────────────────────────────────────────────────────

    fn footnote_ref(&mut self, label: String) -> MarkupNode {
        if !self.definitions.contains_key(&label) {
            return MarkupNode::Text(format!("[^{label}]"));
        }

        let n = match self.order.iter().position(|l| *l == label) {
            Some(i) => {
                self.ref_counts[i] += 1;
                i + 1
            }
            None => {
                self.order.push(label);
                self.ref_counts.push(1);
                self.order.len()
            }
        };

        let a = Element::new("a")
            .with_attr("href", format!("#fn-{n}"))
            .with_attr("id", ref_id(n, self.ref_counts[n - 1]))
            .with_attr("data-footnote-ref", "")
            .with_attr("aria-describedby", "footnote-label")
            .with_child(MarkupNode::text(n.to_string()));
        element("sup", vec![a.into()])
    }

    fn footnote_section(&mut self) -> Option<MarkupNode> {
        if self.order.is_empty() {
            return None;
        }

        let mut items = Vec::new();
        // Definitions may reference further footnotes, growing `order`.
        let mut i = 0;
        while i < self.order.len() {
            let label = self.order[i].clone();
            i += 1;
            let content = self.definitions.get(&label).cloned().unwrap_or_default();
            let mut body = self.nodes(content);

            // One back-reference per reference, counted after the body so
            // references inside the definition itself are included.
            let mut backrefs = Vec::new();
            for k in 1..=self.ref_counts[i - 1] {
                let id = ref_id(i, k);
                let mut a = Element::new("a")
                    .with_attr("href", format!("#{id}"))
                    .with_attr("data-footnote-backref", "")
                    .with_attr(
                        "aria-label",
                        format!("Back to reference {}", id.trim_start_matches("fnref-")),
                    )
                    .with_attr("class", "data-footnote-backref")
                    .with_child(MarkupNode::text("↩"));
                if k > 1 {
                    a = a.with_child(element("sup", vec![MarkupNode::text(k.to_string())]));
                }
                backrefs.push(MarkupNode::text(" "));
                backrefs.push(a.into());
            }
            match body.last_mut() {
                Some(MarkupNode::Element(p)) if p.tag == "p" => p.children.extend(backrefs),
                _ => body.extend(backrefs.into_iter().filter(|n| n.as_element().is_some())),
            }

            items.push(
                Element::new("li")
                    .with_attr("id", format!("fn-{i}"))
                    .with_children(wrap(body, true))
                    .into(),
            );
        }

        let heading = Element::new("h2")
            .with_attr("class", "sr-only")
            .with_attr("id", "footnote-label")
            .with_child(MarkupNode::text("Footnotes"));
        Some(
            Element::new("section")
                .with_attr("data-footnotes", "")
                .with_attr("class", "footnotes")
                .with_children(wrap(
                    vec![heading.into(), element("ol", wrap(items, true))],
                    true,
                ))
                .into(),
        )
    }
}

fn element(tag: &str, children: Vec<MarkupNode>) -> MarkupNode {
    Element::new(tag).with_children(children).into()
}

/// `fnref-N` for the first reference to footnote N, `fnref-N-K` after that.
fn ref_id(n: usize, k: usize) -> String {
    if k <= 1 {
        format!("fnref-{n}")
    } else {
        format!("fnref-{n}-{k}")
    }
}

fn math_code(math: String, display: &str) -> MarkupNode {
    // Display math keeps the newlines next to its `$$` fences; drop one of each.
    let math = if display == "math-display" {
        let inner = math.strip_prefix('\n').unwrap_or(&math);
        inner.strip_suffix('\n').unwrap_or(inner).to_string()
    } else {
        math
    };
    Element::new("code")
        .with_attr("class", format!("language-math {display}"))
        .with_child(MarkupNode::Text(math))
        .into()
}

/// A paragraph holding nothing but one `$$…$$` span becomes a display block.
fn lone_display_math(children: &[SyntaxNode]) -> Option<String> {
    let mut significant = children.iter().filter(|c| match &c.kind {
        SyntaxKind::Text(t) => !t.trim().is_empty(),
        SyntaxKind::SoftBreak => false,
        _ => true,
    });
    match (significant.next(), significant.next()) {
        (
            Some(SyntaxNode {
                kind: SyntaxKind::DisplayMath(math),
                ..
            }),
            None,
        ) => Some(math.clone()),
        _ => None,
    }
}

/// Interleave `"\n"` text between nodes; `loose` also pads both ends.
fn wrap(nodes: Vec<MarkupNode>, loose: bool) -> Vec<MarkupNode> {
    let mut out = Vec::with_capacity(nodes.len() * 2 + 1);
    if loose {
        out.push(MarkupNode::text("\n"));
    }
    let count = nodes.len();
    for (i, node) in nodes.into_iter().enumerate() {
        out.push(node);
        if i + 1 < count {
            out.push(MarkupNode::text("\n"));
        }
    }
    if loose && count > 0 {
        out.push(MarkupNode::text("\n"));
    }
    out
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
