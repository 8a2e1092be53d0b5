//! Structural diagnostics collected while decoding

use std::fmt;

/// How serious a reported problem is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Kind of structural problem found in archive text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// End marker name differs from the innermost open section
    MismatchedClose { expected: String, found: String },
    /// End marker with no open section
    UnmatchedClose { name: String },
    /// Section still open at end of input
    UnclosedSection { name: String, opened_at: usize },
    /// Body block still open at end of input
    UnterminatedBody { field: String, opened_at: usize },
    /// Body end marker outside any body block
    StrayBodyClose { field: String },
    /// Lone line read as a section name
    BareSectionName { name: String },
    /// Bare section name dropped before any field used it
    UnusedSectionName { name: String },
    /// Field outside of any section
    StrayField { key: String },
    /// Text line with nowhere to go
    StrayText { text: String },
    /// Text field set again, dropping its earlier text
    DuplicateField { key: String },
    /// Section or field name that the encoder cannot write back
    UnwritableName { name: String, reason: &'static str },
    /// Field value replaced by a value of a different shape
    FieldReplaced {
        key: String,
        previous: &'static str,
        current: &'static str,
    },
}

impl DiagnosticKind {
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticKind::BareSectionName { .. }
            | DiagnosticKind::UnusedSectionName { .. }
            | DiagnosticKind::StrayText { .. } => Severity::Info,
            _ => Severity::Warning,
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::MismatchedClose { expected, found } => {
                write!(f, "End marker '{}' closes open section '{}'", found, expected)
            }
            DiagnosticKind::UnmatchedClose { name } => {
                write!(f, "End marker '{}' has no open section", name)
            }
            DiagnosticKind::UnclosedSection { name, opened_at } => {
                write!(f, "Section '{}' opened at line {} is never closed", name, opened_at)
            }
            DiagnosticKind::UnterminatedBody { field, opened_at } => {
                write!(f, "Body '{}' opened at line {} is never closed", field, opened_at)
            }
            DiagnosticKind::StrayBodyClose { field } => {
                write!(f, "End marker for body '{}' outside a body block", field)
            }
            DiagnosticKind::BareSectionName { name } => {
                write!(f, "Bare line '{}' read as a section name", name)
            }
            DiagnosticKind::UnusedSectionName { name } => {
                write!(f, "Section name '{}' is not followed by any field", name)
            }
            DiagnosticKind::StrayField { key } => {
                write!(f, "Field '{}' is outside any section", key)
            }
            DiagnosticKind::StrayText { text } => {
                write!(f, "Text '{}' has no field to continue", text)
            }
            DiagnosticKind::DuplicateField { key } => {
                write!(f, "Field '{}' is set again, replacing its earlier text", key)
            }
            DiagnosticKind::UnwritableName { name, reason } => {
                write!(f, "Name '{}' cannot be written back: {}", name, reason)
            }
            DiagnosticKind::FieldReplaced { key, previous, current } => {
                write!(f, "Field '{}' changed from {} to {}", key, previous, current)
            }
        }
    }
}

/// A structural problem and the 1-based line it was found on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: usize,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn new(line: usize, kind: DiagnosticKind) -> Self {
        Self { line, kind }
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}: {}", self.line, self.severity(), self.kind)
    }
}
