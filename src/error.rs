//! Error types for archive encoding, decoding and conversion

use crate::archive::KeyPath;
use crate::diagnostic::Diagnostic;
use thiserror::Error;

/// A document that cannot be written as archive text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Section or field name that would not read back as written
    #[error("{path}: invalid name '{name}': {reason}")]
    InvalidName {
        path: KeyPath,
        name: String,
        reason: &'static str,
    },

    /// Nested or top-level section list with no sections in it
    #[error("{path}: section list is empty")]
    EmptySectionList { path: KeyPath },

    /// Multi-line text containing the marker that would end its own body block
    #[error("{path}: body text line {line} is the block's own end marker")]
    BodyContainsCloseMarker { path: KeyPath, line: usize },
}

/// Strict decoding failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Input produced structural diagnostics at warning level or above
    #[error("malformed archive: {} problem(s), first at {}", .diagnostics.len(), first_problem(.diagnostics))]
    Malformed { diagnostics: Vec<Diagnostic> },
}

fn first_problem(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .first()
        .map(ToString::to_string)
        .unwrap_or_else(|| "<none>".to_string())
}

/// Failure converting between a document and JSON or YAML
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Value whose shape has no archive counterpart
    #[error("{path}: expected {expected}, found {found}")]
    Shape {
        path: KeyPath,
        expected: &'static str,
        found: &'static str,
    },
}
