//! Markup tree: the HTML-shaped structure transformed by markup plugins and
//! serialized by the last stage.

/// One node of the markup tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupNode {
    /// The synthesized tree root. Exactly one per tree, at the top.
    Root(Vec<MarkupNode>),
    /// `<!doctype html>`.
    Doctype,
    Element(Element),
    Text(String),
    Comment(String),
}

/// An element with ordered attributes.
///
/// An element whose `tag` is empty is a placeholder: it serializes as its
/// children only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<MarkupNode>,
}

/// Whether `name` can be written as an HTML attribute name as-is.
///
/// Non-empty, with no whitespace, control characters, quotes, `>`, `/` or `=`.
pub fn is_attribute_name(name: &str) -> bool {
    !name.is_empty()
        && !name.chars().any(|c| {
            c.is_whitespace() || c.is_control() || matches!(c, '"' | '\'' | '>' | '/' | '=' | '<')
        })
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// A transparent element wrapping `children`.
    pub fn placeholder(children: Vec<MarkupNode>) -> Self {
        Self {
            tag: String::new(),
            attributes: Vec::new(),
            children,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.tag.is_empty()
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_children(mut self, children: Vec<MarkupNode>) -> Self {
        self.children = children;
        self
    }

    pub fn with_child(mut self, child: impl Into<MarkupNode>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set `name`, replacing an existing value in place.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|v| v.split_whitespace().any(|c| c == class))
    }

    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let value = match self.attr("class") {
            Some(existing) if !existing.is_empty() => format!("{existing} {class}"),
            _ => class.to_string(),
        };
        self.set_attr("class", value);
    }

    /// `h1`–`h6` → 1–6.
    pub fn heading_rank(&self) -> Option<u8> {
        match self.tag.as_str() {
            "h1" => Some(1),
            "h2" => Some(2),
            "h3" => Some(3),
            "h4" => Some(4),
            "h5" => Some(5),
            "h6" => Some(6),
            _ => None,
        }
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.collect_text(&mut out);
        }
        out
    }
}

impl From<Element> for MarkupNode {
    fn from(element: Element) -> Self {
        MarkupNode::Element(element)
    }
}

impl MarkupNode {
    pub fn text(value: impl Into<String>) -> Self {
        MarkupNode::Text(value.into())
    }

    pub fn children(&self) -> &[MarkupNode] {
        match self {
            MarkupNode::Root(children) => children,
            MarkupNode::Element(el) => &el.children,
            MarkupNode::Doctype | MarkupNode::Text(_) | MarkupNode::Comment(_) => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<MarkupNode>> {
        match self {
            MarkupNode::Root(children) => Some(children),
            MarkupNode::Element(el) => Some(&mut el.children),
            MarkupNode::Doctype | MarkupNode::Text(_) | MarkupNode::Comment(_) => None,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            MarkupNode::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Text node containing only whitespace.
    pub fn is_blank_text(&self) -> bool {
        matches!(self, MarkupNode::Text(t) if t.trim().is_empty())
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            MarkupNode::Text(t) => out.push_str(t),
            MarkupNode::Root(children) => children.iter().for_each(|c| c.collect_text(out)),
            MarkupNode::Element(el) => el.children.iter().for_each(|c| c.collect_text(out)),
            MarkupNode::Doctype | MarkupNode::Comment(_) => {}
        }
    }

    /// Pre-order, mutable visit of this node and every descendant.
    pub fn visit_mut(&mut self, f: &mut impl FnMut(&mut MarkupNode)) {
        f(self);
        if let Some(children) = self.children_mut() {
            for child in children {
                child.visit_mut(f);
            }
        }
    }

    /// Pre-order visit of every element in this subtree.
    pub fn visit_elements_mut(&mut self, f: &mut impl FnMut(&mut Element)) {
        self.visit_mut(&mut |node| {
            if let MarkupNode::Element(el) = node {
                f(el);
            }
        });
    }

    /// First element (pre-order) with the given tag.
    pub fn find_element(&self, tag: &str) -> Option<&Element> {
        if let MarkupNode::Element(el) = self {
            if el.tag == tag {
                return Some(el);
            }
        }
        self.children().iter().find_map(|c| c.find_element(tag))
    }

    /// Every element (pre-order) with the given tag.
    pub fn find_elements<'a>(&'a self, tag: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        self.collect_elements(tag, &mut found);
        found
    }

    fn collect_elements<'a>(&'a self, tag: &str, found: &mut Vec<&'a Element>) {
        if let MarkupNode::Element(el) = self {
            if el.tag == tag {
                found.push(el);
            }
        }
        for child in self.children() {
            child.collect_elements(tag, found);
        }
    }

    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(MarkupNode::node_count).sum::<usize>()
    }
}
