//! Plugin traits and the registry that front matter identifiers resolve
//! against.
//!
//! A document names its plugins by string (`remarkPlugins: [remark-gfm]`).
//! The [`PluginRegistry`] maps each identifier to a factory; resolution walks
//! the declared list in order and stops at the first identifier it does not
//! know, so nothing after it is ever constructed.
//!
//! ```rust
//! use edgequake_md2pdf::plugins::{MarkupPlugin, PluginRegistry};
//! use edgequake_md2pdf::pipeline::markup::MarkupNode;
//! use edgequake_md2pdf::{Report, StageError};
//!
//! struct Lowercase;
//!
//! impl MarkupPlugin for Lowercase {
//!     fn name(&self) -> &str {
//!         "rehype-lowercase"
//!     }
//!
//!     fn transform(&self, tree: &mut MarkupNode, _report: &mut Report) -> Result<(), StageError> {
//!         tree.visit_mut(&mut |node| {
//!             if let MarkupNode::Text(t) = node {
//!                 *t = t.to_lowercase();
//!             }
//!         });
//!         Ok(())
//!     }
//! }
//!
//! let mut registry = PluginRegistry::default();
//! registry.register_markup("rehype-lowercase", || Box::new(Lowercase));
//! assert!(registry.markup_names().contains(&"rehype-lowercase"));
//! ```

pub mod rehype;
pub mod remark;

use crate::error::{Md2PdfError, PluginKind, StageError};
use crate::pipeline::markup::MarkupNode;
use crate::pipeline::syntax::SyntaxNode;
use crate::progress::ProgressCallback;
use crate::report::Report;
use pulldown_cmark::Options;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{error, info};

/// A syntax-tree plugin (`remarkPlugins`).
///
/// It may widen the parser's options, rewrite the parsed tree, or both.
pub trait SyntaxPlugin: Send + Sync {
    fn name(&self) -> &str;

    /// Extra parser options; merged with those of every other syntax plugin.
    fn parser_options(&self) -> Options {
        Options::empty()
    }

    fn transform(&self, tree: &mut SyntaxNode, report: &mut Report) -> Result<(), StageError> {
        let _ = (tree, report);
        Ok(())
    }
}

/// A markup-tree plugin (`rehypePlugins`).
pub trait MarkupPlugin: Send + Sync {
    fn name(&self) -> &str;

    fn transform(&self, tree: &mut MarkupNode, report: &mut Report) -> Result<(), StageError>;
}

type Factory<P> = Box<dyn Fn() -> Box<P> + Send + Sync>;

/// Identifier → factory tables for both plugin kinds.
///
/// `PluginRegistry::default()` holds the built-in plugins;
/// [`PluginRegistry::empty`] holds none.
pub struct PluginRegistry {
    syntax: BTreeMap<String, Factory<dyn SyntaxPlugin>>,
    markup: BTreeMap<String, Factory<dyn MarkupPlugin>>,
}

impl Default for PluginRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        remark::register_builtins(&mut registry);
        rehype::register_builtins(&mut registry);
        registry
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("syntax", &self.syntax_names())
            .field("markup", &self.markup_names())
            .finish()
    }
}

impl PluginRegistry {
    pub fn empty() -> Self {
        Self {
            syntax: BTreeMap::new(),
            markup: BTreeMap::new(),
        }
    }

    /// Register a syntax plugin factory. A later registration for the same
    /// name replaces the earlier one.
    pub fn register_syntax<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn SyntaxPlugin> + Send + Sync + 'static,
    {
        self.syntax.insert(name.into(), Box::new(factory));
    }

    /// Register a markup plugin factory. A later registration for the same
    /// name replaces the earlier one.
    pub fn register_markup<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn MarkupPlugin> + Send + Sync + 'static,
    {
        self.markup.insert(name.into(), Box::new(factory));
    }

    /// Known syntax plugin identifiers, sorted.
    pub fn syntax_names(&self) -> Vec<&str> {
        self.syntax.keys().map(String::as_str).collect()
    }

    /// Known markup plugin identifiers, sorted.
    pub fn markup_names(&self) -> Vec<&str> {
        self.markup.keys().map(String::as_str).collect()
    }

    /// Resolve `names` in order into syntax plugins.
    ///
    /// # Errors
    ///
    /// [`Md2PdfError::PluginNotFound`] for the first unknown identifier.
    /// Identifiers after it are not looked up.
    pub fn resolve_syntax(
        &self,
        names: &[String],
        progress: Option<&ProgressCallback>,
    ) -> Result<Vec<Box<dyn SyntaxPlugin>>, Md2PdfError> {
        resolve(PluginKind::Remark, &self.syntax, names, progress)
    }

    /// Resolve `names` in order into markup plugins.
    ///
    /// # Errors
    ///
    /// [`Md2PdfError::PluginNotFound`] for the first unknown identifier.
    /// Identifiers after it are not looked up.
    pub fn resolve_markup(
        &self,
        names: &[String],
        progress: Option<&ProgressCallback>,
    ) -> Result<Vec<Box<dyn MarkupPlugin>>, Md2PdfError> {
        resolve(PluginKind::Rehype, &self.markup, names, progress)
    }
}

fn resolve<P: ?Sized>(
    kind: PluginKind,
    table: &BTreeMap<String, Factory<P>>,
    names: &[String],
    progress: Option<&ProgressCallback>,
) -> Result<Vec<Box<P>>, Md2PdfError> {
    let mut resolved = Vec::with_capacity(names.len());

    for name in names {
        info!("Trying to import {kind} plugin \"{name}\"...");
        let Some(factory) = table.get(name) else {
            error!("Could not find {kind} plugin \"{name}\"");
            return Err(Md2PdfError::PluginNotFound {
                kind,
                name: name.clone(),
                available: table
                    .keys()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        };
        resolved.push(factory());
        info!("Success.");
        if let Some(cb) = progress {
            cb.on_plugin_resolved(kind, name);
        }
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Named(&'static str);

    impl SyntaxPlugin for Named {
        fn name(&self) -> &str {
            self.0
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn default_registry_has_builtins() {
        let registry = PluginRegistry::default();
        assert!(registry.syntax_names().contains(&"remark-gfm"));
        assert!(registry.markup_names().contains(&"rehype-slug"));
    }

    #[test]
    fn resolves_in_declared_order() {
        let registry = PluginRegistry::default();
        let plugins = registry
            .resolve_syntax(&names(&["remark-math", "remark-gfm"]), None)
            .unwrap();
        let got: Vec<_> = plugins.iter().map(|p| p.name()).collect();
        assert_eq!(got, vec!["remark-math", "remark-gfm"]);
    }

    #[test]
    fn empty_list_resolves_to_nothing() {
        let registry = PluginRegistry::default();
        assert!(registry.resolve_markup(&[], None).unwrap().is_empty());
    }

    #[test]
    fn unknown_identifier_fails_without_touching_later_ones() {
        let constructed = Arc::new(AtomicUsize::new(0));
        let mut registry = PluginRegistry::empty();
        for name in ["first", "last"] {
            let counter = Arc::clone(&constructed);
            registry.register_syntax(name, move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Box::new(Named("x"))
            });
        }

        let err = registry
            .resolve_syntax(&names(&["first", "nonexistent-plugin-xyz", "last"]), None)
            .err()
            .unwrap();

        assert_eq!(constructed.load(Ordering::SeqCst), 1);
        match err {
            Md2PdfError::PluginNotFound {
                kind,
                name,
                available,
            } => {
                assert_eq!(kind, PluginKind::Remark);
                assert_eq!(name, "nonexistent-plugin-xyz");
                assert_eq!(available, "first, last");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn later_registration_wins() {
        let mut registry = PluginRegistry::empty();
        registry.register_syntax("p", || Box::new(Named("old")));
        registry.register_syntax("p", || Box::new(Named("new")));
        let plugins = registry.resolve_syntax(&names(&["p"]), None).unwrap();
        assert_eq!(plugins[0].name(), "new");
    }

    #[test]
    fn progress_is_notified_per_plugin() {
        use crate::progress::ConversionProgressCallback;

        #[derive(Default)]
        struct Count(AtomicUsize);
        impl ConversionProgressCallback for Count {
            fn on_plugin_resolved(&self, _kind: PluginKind, _name: &str) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let count = Arc::new(Count::default());
        let cb: ProgressCallback = count.clone();
        PluginRegistry::default()
            .resolve_markup(&names(&["rehype-slug", "rehype-external-links"]), Some(&cb))
            .unwrap();
        assert_eq!(count.0.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn debug_lists_names() {
        let s = format!("{:?}", PluginRegistry::default());
        assert!(s.contains("remark-gfm"));
    }
}
