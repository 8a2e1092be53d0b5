//! Archive text decoder

use crate::archive::{Document, FieldValue, Section};
use crate::config::{BareNamePolicy, FormatConfig};
use crate::diagnostic::{Diagnostic, DiagnosticKind, Severity};
use crate::error::ParseError;
use crate::line::{
    body_field_problem, classify, classify_marker, section_name_problem, LineKind,
};
use anyhow::{Context, Result};
use std::borrow::Cow;
use std::path::Path;
use tracing::{debug, trace};

/// Result of decoding: the best-effort document plus every structural problem
/// noticed on the way
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed {
    pub document: Document,
    pub diagnostics: Vec<Diagnostic>,
}

impl Parsed {
    /// Highest severity among the diagnostics
    pub fn max_severity(&self) -> Option<Severity> {
        self.diagnostics.iter().map(Diagnostic::severity).max()
    }

    /// True when nothing at warning level or above was reported
    pub fn is_well_formed(&self) -> bool {
        self.max_severity().map_or(true, |s| s < Severity::Warning)
    }

    /// Return the document, or fail if any warning-level diagnostic was reported
    pub fn into_strict(self) -> std::result::Result<Document, ParseError> {
        if self.is_well_formed() {
            Ok(self.document)
        } else {
            let diagnostics = self
                .diagnostics
                .into_iter()
                .filter(|d| d.severity() >= Severity::Warning)
                .collect();
            Err(ParseError::Malformed { diagnostics })
        }
    }
}

/// Decodes archive text into a [`Document`]
pub struct Decoder {
    config: FormatConfig,
}

impl Decoder {
    /// Create a decoder with the default configuration
    pub fn new() -> Self {
        Self::with_config(FormatConfig::default())
    }

    pub fn with_config(config: FormatConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FormatConfig {
        &self.config
    }

    /// Decode archive text
    ///
    /// Never fails: malformed structure is repaired as well as possible and
    /// reported through [`Parsed::diagnostics`].
    pub fn decode(&self, input: &str) -> Parsed {
        let mut builder = Builder::new(&self.config);
        let mut last_line = 0;
        for (index, line) in input.lines().enumerate() {
            last_line = index + 1;
            builder.feed(last_line, line);
        }
        let parsed = builder.finish(last_line);
        debug!(
            sections = parsed.document.section_count(),
            diagnostics = parsed.diagnostics.len(),
            "decoded archive"
        );
        parsed
    }

    /// Read, newline-normalize and decode an archive file
    pub fn decode_file(&self, path: &Path) -> Result<Parsed> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read archive: {}", path.display()))?;
        Ok(self.decode(&normalize_newlines(&text)))
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert `\r\n` and lone `\r` line endings to `\n`
pub fn normalize_newlines(input: &str) -> Cow<'_, str> {
    if input.contains('\r') {
        Cow::Owned(input.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(input)
    }
}

/// An open section waiting for its end marker
struct Frame {
    name: String,
    section: Section,
    opened_at: usize,
    /// Opened by a bare name line rather than a Start marker
    implicit: bool,
}

/// A body block being captured verbatim
struct BodyCapture {
    field: String,
    lines: Vec<String>,
    opened_at: usize,
}

/// Stack-driven tree builder fed one line at a time
struct Builder<'c> {
    config: &'c FormatConfig,
    document: Document,
    stack: Vec<Frame>,
    active_key: Option<String>,
    body: Option<BodyCapture>,
    pending_name: Option<String>,
    diagnostics: Vec<Diagnostic>,
}

impl<'c> Builder<'c> {
    fn new(config: &'c FormatConfig) -> Self {
        Self {
            config,
            document: Document::new(),
            stack: Vec::new(),
            active_key: None,
            body: None,
            pending_name: None,
            diagnostics: Vec::new(),
        }
    }

    fn feed(&mut self, line_num: usize, line: &str) {
        trace!(line = line_num, text = line, "archive line");

        if let Some(body) = &mut self.body {
            let closes = matches!(
                classify_marker(line.trim()),
                Some(LineKind::BodyClose(field)) if field == body.field
            );
            if closes {
                self.finish_body(line_num);
            } else {
                body.lines.push(line.to_string());
            }
            return;
        }

        match classify(line, self.active_key.is_some()) {
            LineKind::Blank => {}
            LineKind::BodyOpen(field) => self.open_body(line_num, field),
            LineKind::BodyClose(field) => self.report(
                line_num,
                DiagnosticKind::StrayBodyClose {
                    field: field.to_string(),
                },
            ),
            LineKind::SectionOpen(name) => self.open_section(line_num, name),
            LineKind::SectionClose(name) => self.close_section(line_num, name),
            LineKind::KeyValue(key, value) => self.set_field(line_num, key, value),
            LineKind::BareKey(key) => self.set_field(line_num, key, ""),
            LineKind::Continuation(text) => self.continue_field(line_num, text),
            LineKind::BareSectionName(name) => self.bare_name(line_num, name),
        }
    }

    fn report(&mut self, line: usize, kind: DiagnosticKind) {
        debug!(line, severity = %kind.severity(), "{}", kind);
        self.diagnostics.push(Diagnostic::new(line, kind));
    }

    fn current(&mut self) -> Option<&mut Section> {
        self.stack.last_mut().map(|frame| &mut frame.section)
    }

    fn open_section(&mut self, line_num: usize, name: &str) {
        self.close_implicit();
        self.drop_pending_name(line_num);
        debug!(line = line_num, depth = self.stack.len(), name, "open section");
        self.stack.push(Frame {
            name: name.to_string(),
            section: Section::new(),
            opened_at: line_num,
            implicit: false,
        });
        self.active_key = None;
    }

    fn close_section(&mut self, line_num: usize, name: &str) {
        self.close_implicit();
        self.drop_pending_name(line_num);
        self.active_key = None;

        // Close the innermost frame whatever its name; a mismatch is only reported.
        let Some(frame) = self.stack.pop() else {
            self.report(
                line_num,
                DiagnosticKind::UnmatchedClose {
                    name: name.to_string(),
                },
            );
            return;
        };
        if frame.name != name {
            self.report(
                line_num,
                DiagnosticKind::MismatchedClose {
                    expected: frame.name.clone(),
                    found: name.to_string(),
                },
            );
        }
        debug!(line = line_num, depth = self.stack.len(), name = %frame.name, "close section");
        self.attach(line_num, frame);
    }

    /// Hand a closed frame to its parent (or the document root)
    fn attach(&mut self, line_num: usize, frame: Frame) {
        let Frame { name, section, .. } = frame;
        match self.stack.last_mut() {
            Some(parent) => {
                if let Some(previous) = parent.section.push_section(name.clone(), section) {
                    self.report(
                        line_num,
                        DiagnosticKind::FieldReplaced {
                            key: name,
                            previous: previous.shape(),
                            current: "section list",
                        },
                    );
                }
            }
            None => self.document.push_section(name, section),
        }
    }

    /// Close implicit sections opened by bare name lines
    fn close_implicit(&mut self) {
        while self.stack.last().is_some_and(|frame| frame.implicit) {
            if let Some(frame) = self.stack.pop() {
                debug!(name = %frame.name, "close implicit section");
                self.attach(frame.opened_at, frame);
            }
        }
    }

    fn drop_pending_name(&mut self, line_num: usize) {
        if let Some(name) = self.pending_name.take() {
            self.report(line_num, DiagnosticKind::UnusedSectionName { name });
        }
    }

    /// Open the implicit section named by a pending bare line, if any
    fn open_pending(&mut self, line_num: usize) {
        if let Some(name) = self.pending_name.take() {
            self.close_implicit();
            self.check_writable(line_num, &name, section_name_problem(&name));
            debug!(line = line_num, name = %name, "open implicit section");
            self.stack.push(Frame {
                name,
                section: Section::new(),
                opened_at: line_num,
                implicit: true,
            });
        }
    }

    fn set_field(&mut self, line_num: usize, key: &str, value: &str) {
        self.open_pending(line_num);
        let Some(section) = self.current() else {
            self.report(
                line_num,
                DiagnosticKind::StrayField {
                    key: key.to_string(),
                },
            );
            return;
        };
        let previous = section.insert(key, FieldValue::Scalar(value.to_string()));
        match previous {
            Some(FieldValue::Sections(_)) => self.report(
                line_num,
                DiagnosticKind::FieldReplaced {
                    key: key.to_string(),
                    previous: "section list",
                    current: "scalar",
                },
            ),
            Some(_) => self.report(
                line_num,
                DiagnosticKind::DuplicateField {
                    key: key.to_string(),
                },
            ),
            None => {}
        }
        self.active_key = Some(key.to_string());
    }

    fn continue_field(&mut self, line_num: usize, text: &str) {
        let Some(key) = self.active_key.clone() else {
            self.report(
                line_num,
                DiagnosticKind::StrayText {
                    text: text.to_string(),
                },
            );
            return;
        };
        let Some(section) = self.current() else {
            return;
        };
        let promotes = matches!(section.get(&key), Some(FieldValue::Scalar(_)));
        if !section.append_line(&key, text) {
            self.report(
                line_num,
                DiagnosticKind::StrayText {
                    text: text.to_string(),
                },
            );
        } else if promotes {
            self.check_writable(line_num, &key, body_field_problem(&key));
        }
    }

    /// Warn about a name that decodes fine but cannot be encoded again
    fn check_writable(&mut self, line_num: usize, name: &str, problem: Option<&'static str>) {
        if let Some(reason) = problem {
            self.report(
                line_num,
                DiagnosticKind::UnwritableName {
                    name: name.to_string(),
                    reason,
                },
            );
        }
    }

    fn bare_name(&mut self, line_num: usize, name: &str) {
        self.report(
            line_num,
            DiagnosticKind::BareSectionName {
                name: name.to_string(),
            },
        );
        match self.config.bare_names {
            BareNamePolicy::ImplicitSection => {
                self.close_implicit();
                self.drop_pending_name(line_num);
                self.pending_name = Some(name.to_string());
            }
            BareNamePolicy::Ignore => {}
        }
    }

    fn open_body(&mut self, line_num: usize, field: &str) {
        self.open_pending(line_num);
        self.check_writable(line_num, field, body_field_problem(field));
        debug!(line = line_num, field, "open body");
        self.body = Some(BodyCapture {
            field: field.to_string(),
            lines: Vec::new(),
            opened_at: line_num,
        });
    }

    /// Store the captured body, minus trailing blank lines, in the current section
    fn finish_body(&mut self, line_num: usize) {
        let Some(BodyCapture { field, mut lines, .. }) = self.body.take() else {
            return;
        };
        while lines.last().is_some_and(|line| line.trim().is_empty()) {
            lines.pop();
        }
        let text = lines.join("\n");
        debug!(line = line_num, field = %field, lines = lines.len(), "close body");
        self.active_key = None;

        let Some(section) = self.current() else {
            self.report(line_num, DiagnosticKind::StrayField { key: field });
            return;
        };
        let previous = section.insert(field.clone(), FieldValue::MultiLineText(text));
        match previous {
            Some(FieldValue::Sections(_)) => self.report(
                line_num,
                DiagnosticKind::FieldReplaced {
                    key: field,
                    previous: "section list",
                    current: "multi-line text",
                },
            ),
            // Empty placeholder from the `Key:` line announcing this body
            Some(FieldValue::Scalar(placeholder)) if placeholder.is_empty() => {}
            Some(_) => self.report(line_num, DiagnosticKind::DuplicateField { key: field }),
            None => {}
        }
    }

    /// Flush anything left open at end of input
    fn finish(mut self, last_line: usize) -> Parsed {
        if let Some(body) = &self.body {
            let kind = DiagnosticKind::UnterminatedBody {
                field: body.field.clone(),
                opened_at: body.opened_at,
            };
            self.report(last_line, kind);
            self.finish_body(last_line);
        }

        self.close_implicit();
        self.drop_pending_name(last_line);

        while let Some(frame) = self.stack.pop() {
            if !frame.implicit {
                let kind = DiagnosticKind::UnclosedSection {
                    name: frame.name.clone(),
                    opened_at: frame.opened_at,
                };
                self.report(last_line, kind);
            }
            self.attach(last_line, frame);
        }

        Parsed {
            document: self.document,
            diagnostics: self.diagnostics,
        }
    }
}
