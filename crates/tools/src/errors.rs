use std::fmt::Display;

use colored::*;

use crate::span::SourceRange;

/// Fully rendered error, ready to be printed to the user. Stage-specific
/// error enums are converted into this before leaving their crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic(String);

impl Diagnostic {
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Implemented by every stage error enum so the driver only ever deals
/// with [`Diagnostic`] values.
pub trait ReportDiag {
    /// Static errors, reported by the lexer, parser and resolver.
    fn to_diagnostic(&self, range: SourceRange) -> Diagnostic
    where
        Self: Display,
    {
        Diagnostic(format!("{} {}: {}", range, "Error".red().bold(), self))
    }

    /// Errors raised while the program is running.
    fn to_runtime_diagnostic(&self, range: SourceRange) -> Diagnostic
    where
        Self: Display,
    {
        Diagnostic(format!(
            "{} {}: {}",
            range,
            "Runtime error".red().bold(),
            self
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::SourceLocation;

    struct DummyErr;

    impl Display for DummyErr {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "boom")
        }
    }

    impl ReportDiag for DummyErr {}

    fn range() -> SourceRange {
        SourceRange::new(SourceLocation::new(1, 2), SourceLocation::new(1, 6))
    }

    #[test]
    fn static_diagnostic_format() {
        colored::control::set_override(false);
        let diag = DummyErr.to_diagnostic(range());
        assert_eq!(diag.message(), "[1:2-6] Error: boom");
    }

    #[test]
    fn runtime_diagnostic_format() {
        colored::control::set_override(false);
        let diag = DummyErr.to_runtime_diagnostic(range());
        assert_eq!(diag.message(), "[1:2-6] Runtime error: boom");
    }
}
