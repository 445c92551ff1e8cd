//! Stage 7: re-indent the document for readability.
//!
//! Elements whose children include block-level content get each block (and
//! each run of inline content) on its own line, indented two spaces per
//! level. Whitespace-only text between blocks is replaced by that layout.
//! Inline runs keep their inner whitespace; `pre`, `textarea`, `script` and
//! `style` are left exactly as they are.
//!
//! Placeholder elements are transparent: their children are laid out as if
//! they were children of the placeholder's parent.

use crate::pipeline::markup::MarkupNode;

const INDENT: &str = "  ";

/// Elements that flow inline with text.
const PHRASING: &[&str] = &[
    "a", "abbr", "audio", "b", "bdi", "bdo", "br", "button", "canvas", "cite", "code", "data",
    "del", "dfn", "em", "i", "img", "input", "ins", "kbd", "label", "mark", "math", "meter",
    "output", "picture", "progress", "q", "ruby", "s", "samp", "select", "small", "span",
    "strong", "sub", "sup", "svg", "textarea", "time", "u", "var", "video", "wbr",
];

/// Elements whose content is whitespace-sensitive.
const PRESERVE: &[&str] = &["pre", "textarea", "script", "style"];

/// Indent `tree` in place.
///
/// A [`MarkupNode::Root`] is laid out with no leading newline and exactly one
/// trailing newline.
pub fn format(tree: &mut MarkupNode) {
    match tree {
        MarkupNode::Root(children) => {
            let mut at_start = true;
            let mut laid_out = layout(std::mem::take(children), 0, &mut at_start);
            laid_out.push(MarkupNode::text("\n"));
            *children = laid_out;
        }
        other => format_node(other, 0),
    }
}

fn is_phrasing(tag: &str) -> bool {
    PHRASING.contains(&tag)
}

/// Whether `node` has to start on its own line.
fn needs_break(node: &MarkupNode) -> bool {
    match node {
        MarkupNode::Element(el) if el.is_placeholder() => el.children.iter().any(needs_break),
        MarkupNode::Element(el) => !is_phrasing(&el.tag),
        MarkupNode::Root(_) | MarkupNode::Doctype => true,
        MarkupNode::Text(_) | MarkupNode::Comment(_) => false,
    }
}

/// Format the element at `depth`; its children sit at `depth + 1`.
fn format_node(node: &mut MarkupNode, depth: usize) {
    let MarkupNode::Element(el) = node else {
        return;
    };
    if PRESERVE.contains(&el.tag.as_str()) {
        return;
    }

    if !el.children.iter().any(needs_break) {
        for child in &mut el.children {
            format_node(child, depth + 1);
        }
        return;
    }

    let mut at_start = false;
    let mut children = layout(std::mem::take(&mut el.children), depth + 1, &mut at_start);
    children.push(line_break(depth));
    el.children = children;
}

/// Lay out siblings at `depth`: one line per block, one per inline run.
///
/// `at_start` suppresses the very first break (document start).
fn layout(children: Vec<MarkupNode>, depth: usize, at_start: &mut bool) -> Vec<MarkupNode> {
    let mut out = Vec::with_capacity(children.len() * 2);
    let mut run: Vec<MarkupNode> = Vec::new();

    for mut child in children {
        if !needs_break(&child) && !is_placeholder(&child) {
            format_node(&mut child, depth);
            run.push(child);
            continue;
        }

        flush_run(&mut run, &mut out, depth, at_start);
        match child {
            MarkupNode::Element(mut el) if el.is_placeholder() => {
                el.children = layout(std::mem::take(&mut el.children), depth, at_start);
                out.push(el.into());
            }
            mut block => {
                format_node(&mut block, depth);
                push_break(&mut out, depth, at_start);
                out.push(block);
            }
        }
    }
    flush_run(&mut run, &mut out, depth, at_start);

    out
}

/// Emit a pending inline run on its own line, trimmed at both ends.
fn flush_run(
    run: &mut Vec<MarkupNode>,
    out: &mut Vec<MarkupNode>,
    depth: usize,
    at_start: &mut bool,
) {
    if run.is_empty() {
        return;
    }
    let mut nodes = std::mem::take(run);

    if let Some(MarkupNode::Text(first)) = nodes.first_mut() {
        *first = first.trim_start().to_string();
    }
    if let Some(MarkupNode::Text(last)) = nodes.last_mut() {
        *last = last.trim_end().to_string();
    }
    nodes.retain(|n| !matches!(n, MarkupNode::Text(t) if t.is_empty()));
    if nodes.is_empty() {
        return;
    }

    push_break(out, depth, at_start);
    out.extend(nodes);
}

fn push_break(out: &mut Vec<MarkupNode>, depth: usize, at_start: &mut bool) {
    if *at_start {
        *at_start = false;
        return;
    }
    out.push(line_break(depth));
}

fn line_break(depth: usize) -> MarkupNode {
    MarkupNode::Text(format!("\n{}", INDENT.repeat(depth)))
}

fn is_placeholder(node: &MarkupNode) -> bool {
    matches!(node, MarkupNode::Element(el) if el.is_placeholder())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::markup::Element;
    use crate::pipeline::stringify::to_html;

    fn formatted(mut tree: MarkupNode) -> String {
        format(&mut tree);
        to_html(&tree)
    }

    #[test]
    fn blocks_are_indented_two_spaces() {
        let tree = MarkupNode::Root(vec![Element::new("div")
            .with_child(MarkupNode::text("\n"))
            .with_child(Element::new("p").with_child(MarkupNode::text("a")))
            .with_child(MarkupNode::text("\n"))
            .into()]);
        assert_eq!(formatted(tree), "<div>\n  <p>a</p>\n</div>\n");
    }

    #[test]
    fn inline_content_is_untouched() {
        let tree = MarkupNode::Root(vec![Element::new("p")
            .with_child(MarkupNode::text("a  "))
            .with_child(Element::new("em").with_child(MarkupNode::text("b")))
            .with_child(MarkupNode::text(" c"))
            .into()]);
        assert_eq!(formatted(tree), "<p>a  <em>b</em> c</p>\n");
    }

    #[test]
    fn pre_is_preserved() {
        let pre = Element::new("pre").with_child(
            Element::new("code").with_child(MarkupNode::text("  x\n    y\n")),
        );
        let tree = MarkupNode::Root(vec![Element::new("div").with_child(pre).into()]);
        assert_eq!(
            formatted(tree),
            "<div>\n  <pre><code>  x\n    y\n</code></pre>\n</div>\n"
        );
    }

    #[test]
    fn placeholder_is_transparent_for_indentation() {
        let body = Element::new("body").with_child(Element::placeholder(vec![
            Element::new("h1").with_child(MarkupNode::text("Hello")).into(),
            MarkupNode::text("\n"),
            Element::new("p").with_child(MarkupNode::text("x")).into(),
        ]));
        let tree = MarkupNode::Root(vec![body.into()]);
        assert_eq!(
            formatted(tree),
            "<body>\n  <h1>Hello</h1>\n  <p>x</p>\n</body>\n"
        );
    }

    #[test]
    fn mixed_content_puts_inline_run_on_its_own_line() {
        let li = Element::new("li")
            .with_child(MarkupNode::text("item\n"))
            .with_child(Element::new("ul").with_child(
                Element::new("li").with_child(MarkupNode::text("inner")),
            ));
        let tree = MarkupNode::Root(vec![li.into()]);
        assert_eq!(
            formatted(tree),
            "<li>\n  item\n  <ul>\n    <li>inner</li>\n  </ul>\n</li>\n"
        );
    }

    #[test]
    fn doctype_starts_the_document() {
        let tree = MarkupNode::Root(vec![MarkupNode::Doctype, Element::new("html").into()]);
        assert_eq!(formatted(tree), "<!doctype html>\n<html></html>\n");
    }

    #[test]
    fn formatting_twice_is_stable() {
        let mut tree = MarkupNode::Root(vec![Element::new("div")
            .with_child(Element::new("p").with_child(MarkupNode::text("a")))
            .into()]);
        format(&mut tree);
        let once = to_html(&tree);
        format(&mut tree);
        assert_eq!(to_html(&tree), once);
    }
}
