//! Stage 8: serialize the markup tree to HTML text.

use crate::pipeline::markup::{is_attribute_name, Element, MarkupNode};

/// Elements that never have a closing tag.
const VOID: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose text content is emitted without escaping.
const RAW_TEXT: &[&str] = &["script", "style"];

/// Serialize `tree`. Placeholder elements contribute only their children.
pub fn to_html(tree: &MarkupNode) -> String {
    let mut out = String::new();
    write_node(tree, &mut out, false);
    out
}

fn write_node(node: &MarkupNode, out: &mut String, raw: bool) {
    match node {
        MarkupNode::Root(children) => {
            for child in children {
                write_node(child, out, raw);
            }
        }
        MarkupNode::Doctype => out.push_str("<!doctype html>"),
        MarkupNode::Text(text) if raw => out.push_str(text),
        MarkupNode::Text(text) => escape_text(text, out),
        MarkupNode::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        MarkupNode::Element(el) => write_element(el, out, raw),
    }
}

fn write_element(el: &Element, out: &mut String, raw: bool) {
    if el.is_placeholder() {
        for child in &el.children {
            write_node(child, out, raw);
        }
        return;
    }

    out.push('<');
    out.push_str(&el.tag);
    for (name, value) in &el.attributes {
        // Names that would break out of the tag are never written.
        if !is_attribute_name(name) {
            continue;
        }
        out.push(' ');
        out.push_str(name);
        // Boolean attributes (`checked`, `disabled`) are written bare.
        if !value.is_empty() {
            out.push_str("=\"");
            escape_attr(value, out);
            out.push('"');
        }
    }
    out.push('>');

    if VOID.contains(&el.tag.as_str()) {
        return;
    }

    let raw = RAW_TEXT.contains(&el.tag.as_str());
    for child in &el.children {
        write_node(child, out, raw);
    }

    out.push_str("</");
    out.push_str(&el.tag);
    out.push('>');
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}
