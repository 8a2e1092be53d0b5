//! # textarchive
//!
//! Reader and writer for the plain-text archive format used by message board
//! exports.
//!
//! ## Format
//!
//! An archive is a sequence of lines. Sections are bracketed by paired
//! markers and hold `Key: value` fields, nested sections and multi-line
//! bodies:
//!
//! ```text
//! --- Start User Info ---
//! User: 1
//! Name: Test User
//! Signature:
//! --- Start Signature Body ---
//! First line
//!
//! Last line
//! --- End Signature Body ---
//! --- End User Info ---
//! ```
//!
//! A bare `Key:` line followed by unmarked lines also builds multi-line text.
//! A section name may repeat within one parent; every occurrence is kept, in
//! order.
//!
//! ## Round trip
//!
//! Decoding the output of [`Encoder::encode`] gives back an equal
//! [`Document`], field order included. A document decoded without warnings
//! always encodes; names the encoder cannot write back are reported as
//! warning-level diagnostics when they are read.
//!
//! ## Malformed input
//!
//! [`Decoder::decode`] never fails. Unbalanced markers, truncated bodies and
//! stray lines are recovered from and reported as [`Diagnostic`]s next to the
//! document. [`Parsed::into_strict`] turns structural problems into a
//! [`ParseError`].
//!
//! ```
//! use textarchive::{Decoder, Encoder};
//!
//! let parsed = Decoder::new().decode("--- Start User Info ---\nUser: 1\n--- End User Info ---\n");
//! assert!(parsed.diagnostics.is_empty());
//! assert_eq!(parsed.document.sections("User Info")[0].get_text("User"), Some("1"));
//!
//! let text = Encoder::new().encode(&parsed.document).unwrap();
//! assert_eq!(text, "--- Start User Info ---\nUser: 1\n--- End User Info ---\n");
//! ```

pub mod archive;
pub mod config;
pub mod convert;
pub mod decoder;
pub mod diagnostic;
pub mod encoder;
pub mod error;
pub mod line;
pub mod validate;

pub use archive::{Document, FieldValue, KeyPath, Section};
pub use config::{BareNamePolicy, FormatConfig, LineEnding, ReferencePolicy, ValidationConfig};
pub use convert::{document_from_value, from_json, from_yaml, to_json, to_yaml};
pub use decoder::{normalize_newlines, Decoder, Parsed};
pub use diagnostic::{Diagnostic, DiagnosticKind, Severity};
pub use encoder::Encoder;
pub use error::{ConvertError, EncodeError, ParseError};
pub use validate::{has_errors, Finding, FindingKind, Validator};
