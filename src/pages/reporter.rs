//! Build diagnostics

use crate::error::{BuildError, QueryError};

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Fatal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

/// Collects the diagnostics of one build and mirrors them to the log
#[derive(Debug, Default)]
pub struct Reporter {
    diagnostics: Vec<Diagnostic>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{}", message);
        self.diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            message,
        });
    }

    /// Report a build-stopping query failure; the returned error must be propagated
    pub fn panic_on_build(&mut self, message: &str, errors: Vec<QueryError>) -> BuildError {
        tracing::error!("{}", message);
        for error in &errors {
            tracing::error!("  {}", error);
        }
        self.diagnostics.push(Diagnostic {
            severity: Severity::Fatal,
            message: message.to_string(),
        });
        BuildError::QueryFailed {
            message: message.to_string(),
            errors,
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn warnings(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn has_fatal(&self) -> bool {
        self.count(Severity::Fatal) > 0
    }

    fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}
