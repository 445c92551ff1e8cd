//! Normalize declared stylesheet entries into `<link>` descriptors.

use crate::pipeline::markup::is_attribute_name;
use crate::pipeline::matter::StylesheetEntry;
use crate::progress::ProgressCallback;
use crate::report::Report;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use tracing::{debug, warn};

const ORIGIN: &str = "stylesheets";

/// Attributes for one `<link>` element, in emission order.
///
/// The first attribute is always `rel`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDescriptor {
    pub attributes: Vec<(String, String)>,
}

impl LinkDescriptor {
    /// `rel="stylesheet" href="<href>"`.
    pub fn stylesheet(href: impl Into<String>) -> Self {
        Self {
            attributes: vec![
                ("rel".to_string(), "stylesheet".to_string()),
                ("href".to_string(), href.into()),
            ],
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn href(&self) -> &str {
        self.get("href").unwrap_or_default()
    }

    /// Set `name`, replacing an existing value in place.
    fn set(&mut self, name: String, value: String) {
        match self.attributes.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }
}

/// Turn declared entries into link descriptors, keeping declared order.
///
/// Invalid entries are logged, recorded in `report` and dropped; they never
/// fail the run.
pub fn resolve_stylesheets(
    entries: &[StylesheetEntry],
    report: &mut Report,
    progress: Option<&ProgressCallback>,
) -> Vec<LinkDescriptor> {
    let mut links = Vec::with_capacity(entries.len());

    for entry in entries {
        match normalize(entry, report) {
            Some(link) => {
                debug!("Stylesheet: {}", link.href());
                if let Some(cb) = progress {
                    cb.on_stylesheet_added(link.href());
                }
                links.push(link);
            }
            None => {
                let shown = describe(entry);
                warn!("Invalid stylesheet value {shown}");
                report.warn(ORIGIN, format!("Invalid stylesheet value: {shown}"));
            }
        }
    }

    links
}

fn normalize(entry: &StylesheetEntry, report: &mut Report) -> Option<LinkDescriptor> {
    match entry {
        StylesheetEntry::Href(href) => Some(LinkDescriptor::stylesheet(href.as_str())),
        StylesheetEntry::Descriptor(map) => {
            // A descriptor without a usable href is not a stylesheet.
            map.get("href").and_then(scalar_text)?;
            let mut link = LinkDescriptor {
                attributes: vec![("rel".to_string(), "stylesheet".to_string())],
            };
            for (key, value) in map {
                let (Some(key), Some(value)) = (scalar_text(key), scalar_text(value)) else {
                    continue;
                };
                if !is_attribute_name(&key) {
                    warn!("Invalid stylesheet attribute name {key:?}");
                    report.warn(ORIGIN, format!("Invalid stylesheet attribute name: {key:?}"));
                    continue;
                }
                link.set(key, value);
            }
            Some(link)
        }
        StylesheetEntry::Invalid(_) => None,
    }
}

/// Text of a YAML scalar; `None` for null, sequences and mappings.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

fn describe(entry: &StylesheetEntry) -> String {
    let value = match entry {
        StylesheetEntry::Href(s) => return format!("{s:?}"),
        StylesheetEntry::Descriptor(map) => Value::Mapping(map.clone()),
        StylesheetEntry::Invalid(v) => v.clone(),
    };
    serde_json::to_string(&value).unwrap_or_else(|_| format!("{value:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::matter::FrontMatter;

    fn entries(yaml: &str) -> Vec<StylesheetEntry> {
        FrontMatter::from_yaml(yaml).unwrap().stylesheets
    }

    #[test]
    fn string_entry_becomes_stylesheet_link() {
        let mut report = Report::new();
        let links = resolve_stylesheets(&entries("stylesheets: [style.css]"), &mut report, None);
        assert_eq!(links, vec![LinkDescriptor::stylesheet("style.css")]);
        assert!(report.is_empty());
    }

    #[test]
    fn descriptor_keeps_extra_attributes_in_order() {
        let mut report = Report::new();
        let links = resolve_stylesheets(
            &entries("stylesheets:\n  - { href: print.css, media: print, crossorigin: anonymous }"),
            &mut report,
            None,
        );
        let attrs: Vec<_> = links[0].attributes.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(attrs, vec!["rel", "href", "media", "crossorigin"]);
        assert_eq!(links[0].get("media"), Some("print"));
    }

    #[test]
    fn explicit_rel_overrides_default_in_place() {
        let mut report = Report::new();
        let links = resolve_stylesheets(
            &entries("stylesheets:\n  - { href: alt.css, rel: alternate stylesheet }"),
            &mut report,
            None,
        );
        assert_eq!(links[0].attributes[0], ("rel".into(), "alternate stylesheet".into()));
        assert_eq!(links[0].attributes.len(), 2);
    }

    #[test]
    fn invalid_entries_are_dropped_and_reported() {
        let mut report = Report::new();
        let links = resolve_stylesheets(
            &entries("stylesheets:\n  - a.css\n  - 42\n  - { media: print }\n  - [x]\n  - b.css"),
            &mut report,
            None,
        );
        let hrefs: Vec<_> = links.iter().map(|l| l.href()).collect();
        assert_eq!(hrefs, vec!["a.css", "b.css"]);
        assert_eq!(report.len(), 3);
        assert!(report.messages[0].message.contains("Invalid stylesheet value"));
        assert!(report.messages[0].message.contains("42"));
    }

    #[test]
    fn scalar_attribute_values_are_stringified() {
        let mut report = Report::new();
        let links = resolve_stylesheets(
            &entries("stylesheets:\n  - { href: a.css, disabled: true, nested: { x: 1 } }"),
            &mut report,
            None,
        );
        assert_eq!(links[0].get("disabled"), Some("true"));
        assert_eq!(links[0].get("nested"), None);
    }

    #[test]
    fn unusable_attribute_names_are_dropped_and_reported() {
        let mut report = Report::new();
        let links = resolve_stylesheets(
            &entries(
                "stylesheets:\n  - { href: a.css, '\"><script>alert(1)</script><x y': z }\n  - { href: b.css, '': q, media: print }",
            ),
            &mut report,
            None,
        );

        assert_eq!(links.len(), 2);
        assert_eq!(links[0].attributes.len(), 2);
        assert_eq!(links[1].get("media"), Some("print"));
        assert!(links[1].attributes.iter().all(|(k, _)| !k.is_empty()));
        assert_eq!(report.len(), 2);
        assert!(report.messages[0].message.contains("attribute name"));
    }

    #[test]
    fn injected_attribute_name_never_reaches_the_head() {
        use crate::pipeline::builder::PipelineBuilder;
        use crate::pipeline::document::DocumentOptions;

        let mut report = Report::new();
        let links = resolve_stylesheets(
            &entries("stylesheets:\n  - { href: a.css, '\"><script>alert(1)</script><x y': z }"),
            &mut report,
            None,
        );
        let html = PipelineBuilder::new()
            .document(DocumentOptions {
                links,
                ..Default::default()
            })
            .build()
            .run("# Hi", report)
            .unwrap()
            .html;

        assert!(!html.contains("<script>"));
        assert!(html.contains("<link rel=\"stylesheet\" href=\"a.css\">"));
    }

    #[test]
    fn empty_input_yields_no_links() {
        let mut report = Report::new();
        assert!(resolve_stylesheets(&[], &mut report, None).is_empty());
        assert!(report.is_empty());
    }
}
