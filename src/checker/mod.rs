//! # Conformance checks
//!
//! Each checker runs once at construction and keeps its findings. A finding
//! is data, not an error: `Err` is only returned when the graph and the
//! architecture contradict each other.
//!
//! [`DependencyChecker`] marks the rules it used on the component nodes, so
//! [`AllExplicitRulesUsedChecker`] has to run after it on the same graph.

pub mod dependency;
pub mod completeness;
pub mod rules;

pub use completeness::AllComponentsImplementedChecker;
pub use dependency::DependencyChecker;
pub use rules::AllExplicitRulesUsedChecker;

/// Common result surface of all checks.
pub trait Checker {
    /// One entry per finding.
    fn violation_messages(&self) -> &[String];

    /// One-line description of all findings.
    fn summary(&self) -> String;

    fn is_ok(&self) -> bool {
        self.violation_messages().is_empty()
    }

    /// The summary, or `None` when there is nothing to report.
    fn violation_message(&self) -> Option<String> {
        if self.is_ok() { None } else { Some(self.summary()) }
    }
}

/// `[a, b, c]`
pub fn format_list<S: AsRef<str>>(items: &[S]) -> String {
    let joined: Vec<&str> = items.iter().map(AsRef::as_ref).collect();
    format!("[{}]", joined.join(", "))
}
