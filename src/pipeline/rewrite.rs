//! Stage 4: neutralize the root wrapper synthesized by the bridge.
//!
//! The bridge hands back a [`MarkupNode::Root`] whose children are the
//! document blocks separated by newline text it made up. This stage visits
//! every node and, on the root only, replaces those children with a single
//! placeholder element that adopts the blocks and drops the made-up
//! whitespace. Every other node passes through untouched.
//!
//! Markup plugins therefore always see exactly one root-level child, and the
//! document wrap receives one transparent container to put in `<body>`.

use crate::pipeline::markup::{Element, MarkupNode};
use tracing::debug;

/// Rewrite every [`MarkupNode::Root`] in `tree`; returns how many were touched.
///
/// Bridge output has exactly one root, so the result is 1.
pub fn rewrite_root(tree: &mut MarkupNode) -> usize {
    let mut touched = 0;
    tree.visit_mut(&mut |node| {
        if let MarkupNode::Root(children) = node {
            let content: Vec<MarkupNode> = std::mem::take(children)
                .into_iter()
                .filter(|child| !child.is_blank_text())
                .collect();
            children.push(Element::placeholder(content).into());
            touched += 1;
        }
    });
    debug!("Root rewrite touched {touched} node(s)");
    touched
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bridged() -> MarkupNode {
        MarkupNode::Root(vec![
            Element::new("h1").with_child(MarkupNode::text("Hello")).into(),
            MarkupNode::text("\n"),
            Element::new("p")
                .with_child(MarkupNode::text("a\n"))
                .with_child(MarkupNode::text("\n"))
                .into(),
        ])
    }

    #[test]
    fn root_gets_single_placeholder_child() {
        let mut tree = bridged();
        assert_eq!(rewrite_root(&mut tree), 1);

        let MarkupNode::Root(children) = &tree else {
            panic!("root variant must be kept");
        };
        assert_eq!(children.len(), 1);
        let placeholder = children[0].as_element().unwrap();
        assert!(placeholder.is_placeholder());
        assert_eq!(placeholder.children.len(), 2);
    }

    #[test]
    fn non_root_nodes_are_unchanged() {
        let original = bridged();
        let mut tree = original.clone();
        rewrite_root(&mut tree);

        let placeholder = tree.children()[0].as_element().unwrap();
        assert_eq!(placeholder.children[0], original.children()[0]);
        // Newlines inside blocks are content, not wrapper material.
        assert_eq!(placeholder.children[1], original.children()[2]);
    }

    #[test]
    fn empty_root_gets_empty_placeholder() {
        let mut tree = MarkupNode::Root(Vec::new());
        assert_eq!(rewrite_root(&mut tree), 1);
        assert_eq!(
            tree,
            MarkupNode::Root(vec![Element::placeholder(Vec::new()).into()])
        );
    }

    #[test]
    fn tree_without_root_is_untouched() {
        let mut tree: MarkupNode = Element::new("p").into();
        let before = tree.clone();
        assert_eq!(rewrite_root(&mut tree), 0);
        assert_eq!(tree, before);
    }
}
