//! The diagnostic report carried alongside the processed document.
//!
//! Resolvers and stages push [`Diagnostic`]s into a [`Report`] as they run.
//! The report never blocks the run; it is rendered once, after processing,
//! in the same shape for every document so operators can grep it.

use crate::error::{Diagnostic, Severity};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered list of diagnostics raised during one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub messages: Vec<Diagnostic>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.messages.push(diagnostic);
    }

    /// Record a warning raised by `origin`.
    pub fn warn(&mut self, origin: &str, message: impl Into<String>) {
        self.push(Diagnostic::warning(message).with_origin(origin));
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.messages
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.messages.iter()
    }
}

impl fmt::Display for Report {
    /// `no issues found`, or one line per diagnostic followed by a tally
    /// such as `⚠ 2 warnings`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.messages.is_empty() {
            return f.write_str("no issues found");
        }

        for d in &self.messages {
            writeln!(f, "  {d}")?;
        }

        let errors = self.count(Severity::Error);
        let warnings = self.count(Severity::Warning);
        let infos = self.count(Severity::Info);
        let mut parts = Vec::new();
        if errors > 0 {
            parts.push(format!("✖ {} {}", errors, plural(errors, "error")));
        }
        if warnings > 0 {
            parts.push(format!("⚠ {} {}", warnings, plural(warnings, "warning")));
        }
        if infos > 0 {
            parts.push(format!("{} {}", infos, plural(infos, "message")));
        }
        write!(f, "{}", parts.join(", "))
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_has_no_issues() {
        assert_eq!(Report::new().to_string(), "no issues found");
    }

    #[test]
    fn report_lists_messages_in_order_with_tally() {
        let mut r = Report::new();
        r.warn("parse", "Undefined link reference `x`");
        r.warn("stylesheets", "Invalid stylesheet value: 42");
        r.push(Diagnostic {
            severity: Severity::Error,
            message: "something worse".into(),
            origin: None,
        });

        let s = r.to_string();
        let first = s.find("Undefined link").unwrap();
        let second = s.find("Invalid stylesheet").unwrap();
        assert!(first < second);
        assert!(s.ends_with("✖ 1 error, ⚠ 2 warnings"), "got: {s}");
    }

    #[test]
    fn count_by_severity() {
        let mut r = Report::new();
        r.push(Diagnostic {
            severity: Severity::Info,
            message: "ok".into(),
            origin: Some("rehype-slug".into()),
        });
        r.warn("rehype-slug", "empty heading");
        assert_eq!(r.count(Severity::Info), 1);
        assert_eq!(r.count(Severity::Warning), 1);
        assert_eq!(r.len(), 2);
    }
}
