//! Pipeline stages for Markdown-to-PDF conversion.
//!
//! Each submodule implements exactly one step. Keeping stages separate makes
//! each independently testable and lets plugins slot in at fixed extension
//! points without knowing about the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ matter ──▶ [plugins, stylesheet] ──▶ builder ──▶ render
//! (read)    (YAML)      (resolve)                (8 stages)  (chromium)
//! ```
//!
//! The eight stages run by [`builder::Pipeline::run`]:
//!
//! 1. [`syntax`]   : Markdown → syntax tree
//! 2. syntax plugins, declared order
//! 3. [`bridge`]   : syntax tree → markup tree (synthesizes the root wrapper)
//! 4. [`rewrite`]  : neutralize the synthesized wrapper under one placeholder
//! 5. markup plugins, declared order
//! 6. [`document`] : doctype, head with stylesheet links, body
//! 7. [`format`]   : indentation
//! 8. [`stringify`]: HTML text
//!
//! [`render`] then loads the text into headless Chromium and captures the
//! PDF and PNG.

pub mod bridge;
pub mod builder;
pub mod document;
pub mod format;
pub mod input;
pub mod markup;
pub mod matter;
pub mod render;
pub mod rewrite;
pub mod stringify;
pub mod stylesheet;
pub mod syntax;

use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed stage skeleton, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageKind {
    Parse,
    SyntaxTransforms,
    Bridge,
    RootRewrite,
    MarkupTransforms,
    DocumentWrap,
    Format,
    Stringify,
}

impl StageKind {
    /// All stages, in the order the pipeline runs them.
    pub const ALL: [StageKind; 8] = [
        StageKind::Parse,
        StageKind::SyntaxTransforms,
        StageKind::Bridge,
        StageKind::RootRewrite,
        StageKind::MarkupTransforms,
        StageKind::DocumentWrap,
        StageKind::Format,
        StageKind::Stringify,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StageKind::Parse => "parse",
            StageKind::SyntaxTransforms => "syntax-transforms",
            StageKind::Bridge => "bridge",
            StageKind::RootRewrite => "root-rewrite",
            StageKind::MarkupTransforms => "markup-transforms",
            StageKind::DocumentWrap => "document-wrap",
            StageKind::Format => "format",
            StageKind::Stringify => "stringify",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
