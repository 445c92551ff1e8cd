//! Built-in markup-tree plugins.

use super::{MarkupPlugin, PluginRegistry};
use crate::error::StageError;
use crate::pipeline::markup::{Element, MarkupNode};
use crate::report::Report;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::warn;

pub fn register_builtins(registry: &mut PluginRegistry) {
    registry.register_markup("rehype-slug", || Box::new(Slug));
    registry.register_markup("rehype-autolink-headings", || Box::new(AutolinkHeadings));
    registry.register_markup("rehype-external-links", || Box::new(ExternalLinks));
}

// ── rehype-slug ───────────────────────────────────────────────────────────

/// Characters GitHub strips when deriving an anchor from heading text.
static RE_SLUG_STRIP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{M}\p{N}\p{Pc} -]").unwrap());

/// Give every `h1`–`h6` without an `id` one derived from its text.
///
/// Follows GitHub's rules: lowercase, punctuation stripped, spaces become
/// hyphens, repeats get `-1`, `-2`, ... suffixes.
pub struct Slug;

impl MarkupPlugin for Slug {
    fn name(&self) -> &str {
        "rehype-slug"
    }

    fn transform(&self, tree: &mut MarkupNode, report: &mut Report) -> Result<(), StageError> {
        let mut slugger = Slugger::default();
        tree.visit_elements_mut(&mut |el| {
            if el.heading_rank().is_none() || el.attr("id").is_some() {
                return;
            }
            let text = el.text_content();
            let slug = slugger.slug(&text);
            if slug.is_empty() {
                warn!("Heading <{}> has no text to derive an id from", el.tag);
                report.warn(
                    "rehype-slug",
                    format!("Heading <{}> has no text to derive an id from", el.tag),
                );
                return;
            }
            el.set_attr("id", slug);
        });
        Ok(())
    }
}

/// Per-document slug generator with GitHub's duplicate handling.
#[derive(Debug, Default)]
pub struct Slugger {
    occurrences: HashMap<String, usize>,
}

impl Slugger {
    pub fn slug(&mut self, text: &str) -> String {
        let original = slugify(text);
        if original.is_empty() {
            return original;
        }
        let mut result = original.clone();
        while self.occurrences.contains_key(&result) {
            let count = self.occurrences.entry(original.clone()).or_insert(0);
            *count += 1;
            result = format!("{original}-{count}");
        }
        self.occurrences.insert(result.clone(), 0);
        result
    }
}

fn slugify(text: &str) -> String {
    RE_SLUG_STRIP
        .replace_all(&text.to_lowercase(), "")
        .replace(' ', "-")
}

// ── rehype-autolink-headings ──────────────────────────────────────────────

/// Prepend a self-link to every heading that has an `id`.
pub struct AutolinkHeadings;

impl MarkupPlugin for AutolinkHeadings {
    fn name(&self) -> &str {
        "rehype-autolink-headings"
    }

    fn transform(&self, tree: &mut MarkupNode, _report: &mut Report) -> Result<(), StageError> {
        tree.visit_elements_mut(&mut |el| {
            if el.heading_rank().is_none() {
                return;
            }
            let Some(id) = el.attr("id").map(str::to_string) else {
                return;
            };
            let anchor = Element::new("a")
                .with_attr("aria-hidden", "true")
                .with_attr("tabindex", "-1")
                .with_attr("href", format!("#{id}"))
                .with_child(Element::new("span").with_attr("class", "icon icon-link"));
            el.children.insert(0, anchor.into());
        });
        Ok(())
    }
}

// ── rehype-external-links ─────────────────────────────────────────────────

/// Mark absolute `http(s)` links with `rel="nofollow"`.
pub struct ExternalLinks;

impl MarkupPlugin for ExternalLinks {
    fn name(&self) -> &str {
        "rehype-external-links"
    }

    fn transform(&self, tree: &mut MarkupNode, _report: &mut Report) -> Result<(), StageError> {
        tree.visit_elements_mut(&mut |el| {
            if el.tag != "a" {
                return;
            }
            let external = el
                .attr("href")
                .is_some_and(|h| h.starts_with("http://") || h.starts_with("https://"));
            if external {
                el.set_attr("rel", "nofollow");
            }
        });
        Ok(())
    }
}
