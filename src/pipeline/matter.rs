//! Front matter extraction: split a document into its YAML block and body.
//!
//! A document may start with a block fenced by `---` lines:
//!
//! ```text
//! ---
//! remarkPlugins: [remark-gfm]
//! rehypePlugins: [rehype-slug]
//! stylesheets:
//!   - style.css
//!   - { href: print.css, media: print }
//! ---
//! # Body starts here
//! ```
//!
//! Only the first line may open the block; it closes at the next line that is
//! exactly `---` or `...`. A document without an opening fence has empty
//! front matter. An opening fence that is never closed is ordinary Markdown
//! (a thematic break), not a parse error.

use crate::error::Md2PdfError;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

/// The recognised front matter keys. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontMatter {
    /// Syntax-tree plugins, applied in this order.
    #[serde(default, deserialize_with = "nullable_seq")]
    pub remark_plugins: Vec<String>,

    /// Markup-tree plugins, applied in this order.
    #[serde(default, deserialize_with = "nullable_seq")]
    pub rehype_plugins: Vec<String>,

    /// Stylesheets linked from the document head, in cascade order.
    #[serde(default, deserialize_with = "nullable_seq")]
    pub stylesheets: Vec<StylesheetEntry>,

    /// Document `<title>`. Omitted from the head when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// `lang` attribute of the `<html>` element. Default: `en`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

/// One declared stylesheet: a bare URL or a mapping of link attributes.
///
/// Anything else lands in [`StylesheetEntry::Invalid`] so one bad entry does
/// not fail the whole front matter; the stylesheet resolver reports and drops
/// it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StylesheetEntry {
    Href(String),
    Descriptor(serde_yaml::Mapping),
    Invalid(serde_yaml::Value),
}

impl FrontMatter {
    /// Parse front matter from the YAML between the fences.
    ///
    /// Empty, whitespace-only and `null` blocks yield the default instance.
    ///
    /// # Errors
    ///
    /// Returns [`Md2PdfError::FrontMatter`] if the YAML is malformed or a
    /// recognised key has the wrong shape.
    pub fn from_yaml(yaml: &str) -> Result<Self, Md2PdfError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let value: serde_yaml::Value =
            serde_yaml::from_str(yaml).map_err(|e| Md2PdfError::FrontMatter {
                detail: format!("Invalid YAML: {e}"),
            })?;
        if value.is_null() {
            return Ok(Self::default());
        }

        serde_yaml::from_value(value).map_err(|e| Md2PdfError::FrontMatter {
            detail: e.to_string(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.remark_plugins.is_empty()
            && self.rehype_plugins.is_empty()
            && self.stylesheets.is_empty()
            && self.title.is_none()
            && self.lang.is_none()
    }
}

/// A document split into configuration and content.
#[derive(Debug, Clone, PartialEq)]
pub struct Matter {
    pub data: FrontMatter,
    pub content: String,
}

/// Split `source` into front matter and content body.
///
/// A leading UTF-8 BOM is ignored.
pub fn extract(source: &str) -> Result<Matter, Md2PdfError> {
    let text = source.strip_prefix('\u{feff}').unwrap_or(source);

    match split_front_matter(text) {
        Some((yaml, body)) => {
            debug!("Front matter block: {} bytes", yaml.len());
            Ok(Matter {
                data: FrontMatter::from_yaml(yaml)?,
                content: body.to_string(),
            })
        }
        None => Ok(Matter {
            data: FrontMatter::default(),
            content: text.to_string(),
        }),
    }
}

/// Returns `(yaml, body)` slices when `text` opens with a closed `---` block.
fn split_front_matter(text: &str) -> Option<(&str, &str)> {
    let mut lines = text.split_inclusive('\n');
    let opener = lines.next()?;
    if opener.trim_end() != "---" {
        return None;
    }

    let yaml_start = opener.len();
    let mut offset = yaml_start;
    for line in lines {
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            return Some((&text[yaml_start..offset], &text[offset + line.len()..]));
        }
        offset += line.len();
    }

    None
}

/// `key:` with no value means the same as an absent key.
fn nullable_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
