//! Diagnostics emitted while evaluating expressions.

use std::fmt;

use crate::logging::{sieve_log, LogContext};

const DIAGNOSTIC_LOG_CTX: LogContext = LogContext::new("component=diagnostics");

/// How bad a diagnostic is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Evaluation continued with a degraded result.
    Warning,
    /// Evaluation cannot produce a meaningful result.
    Error,
}

/// A message reported to a [`DiagnosticHandler`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity.
    pub severity: Severity,
    /// Primary message.
    pub message: String,
    /// Additional context lines.
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// A warning with `message`.
    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            notes: Vec::new(),
        }
    }

    /// An error with `message`.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            notes: Vec::new(),
        }
    }

    /// Appends a note.
    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{severity}: {}", self.message)?;
        for note in &self.notes {
            write!(f, " (note: {note})")?;
        }
        Ok(())
    }
}

/// Sink for diagnostics.
///
/// One handler serves one evaluation context; it is not shared between
/// concurrent evaluations.
pub trait DiagnosticHandler {
    /// Receives a diagnostic.
    fn emit(&mut self, diagnostic: Diagnostic);
}

/// Keeps diagnostics in memory until they are forwarded or inspected.
#[derive(Clone, Debug, Default)]
pub struct CollectingDiagnosticHandler {
    diagnostics: Vec<Diagnostic>,
}

impl CollectingDiagnosticHandler {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collected diagnostics in emission order.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Returns true if an error was collected.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diagnostic| diagnostic.severity == Severity::Error)
    }

    /// Emits every collected diagnostic into `handler`.
    pub fn forward_to(self, handler: &mut dyn DiagnosticHandler) {
        for diagnostic in self.diagnostics {
            handler.emit(diagnostic);
        }
    }

    /// Consumes the collector.
    #[must_use]
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl DiagnosticHandler for CollectingDiagnosticHandler {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

/// Writes diagnostics to the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingDiagnosticHandler;

impl DiagnosticHandler for LoggingDiagnosticHandler {
    fn emit(&mut self, diagnostic: Diagnostic) {
        let level = match diagnostic.severity {
            Severity::Warning => log::Level::Warn,
            Severity::Error => log::Level::Error,
        };
        sieve_log!(
            level,
            ctx: DIAGNOSTIC_LOG_CTX,
            "diagnostic",
            "{}",
            diagnostic,
        );
    }
}

/// Forwards to another handler and remembers whether an error went through.
pub(crate) struct ErrorTracker<'a> {
    inner: &'a mut dyn DiagnosticHandler,
    failed: bool,
}

impl<'a> ErrorTracker<'a> {
    pub(crate) fn new(inner: &'a mut dyn DiagnosticHandler) -> Self {
        Self {
            inner,
            failed: false,
        }
    }

    pub(crate) fn failed(&self) -> bool {
        self.failed
    }
}

impl DiagnosticHandler for ErrorTracker<'_> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.failed |= diagnostic.severity == Severity::Error;
        self.inner.emit(diagnostic);
    }
}
