//! Stage 6: wrap the transformed tree in a complete HTML document shell.

use crate::pipeline::markup::{Element, MarkupNode};
use crate::pipeline::stylesheet::LinkDescriptor;

pub const DEFAULT_LANG: &str = "en";

/// Head and root-element settings for the document shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentOptions {
    pub lang: String,
    pub title: Option<String>,
    /// One `<link>` per descriptor, in this order.
    pub links: Vec<LinkDescriptor>,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            lang: DEFAULT_LANG.to_string(),
            title: None,
            links: Vec::new(),
        }
    }
}

/// Wrap `tree` as:
///
/// ```text
/// <!doctype html>
/// <html lang="…">
///   <head> charset, [title], viewport, links… </head>
///   <body> tree </body>
/// </html>
/// ```
pub fn wrap_document(tree: MarkupNode, options: &DocumentOptions) -> MarkupNode {
    let body_children = match tree {
        MarkupNode::Root(children) => children,
        other => vec![other],
    };

    let mut head = Element::new("head")
        .with_child(Element::new("meta").with_attr("charset", "utf-8"));
    if let Some(ref title) = options.title {
        head = head.with_child(Element::new("title").with_child(MarkupNode::text(title.as_str())));
    }
    head = head.with_child(
        Element::new("meta")
            .with_attr("name", "viewport")
            .with_attr("content", "width=device-width, initial-scale=1"),
    );
    for link in &options.links {
        let mut el = Element::new("link");
        for (name, value) in &link.attributes {
            el.set_attr(name.as_str(), value.as_str());
        }
        head = head.with_child(el);
    }

    let html = Element::new("html")
        .with_attr("lang", options.lang.as_str())
        .with_child(head)
        .with_child(Element::new("body").with_children(body_children));

    MarkupNode::Root(vec![MarkupNode::Doctype, html.into()])
}
