//! Archive text encoder

use crate::archive::{Document, FieldValue, KeyPath, Section};
use crate::config::{FormatConfig, LineEnding};
use crate::error::EncodeError;
use crate::line::{
    bare_key_line, body_end_marker, body_field_problem, body_start_marker, end_marker,
    field_line, field_line_problem, section_name_problem, start_marker,
};
use anyhow::{Context, Result};
use tracing::debug;

/// Encodes a [`Document`] into archive text
pub struct Encoder {
    config: FormatConfig,
}

impl Encoder {
    /// Create an encoder with the default configuration
    pub fn new() -> Self {
        Self::with_config(FormatConfig::default())
    }

    pub fn with_config(config: FormatConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FormatConfig {
        &self.config
    }

    /// Encode a document to a string
    ///
    /// Each top-level section instance becomes its own Start/End block, in
    /// document order.
    pub fn encode(&self, document: &Document) -> std::result::Result<String, EncodeError> {
        let mut output = String::new();

        for (name, sections) in document.iter() {
            if sections.is_empty() {
                return Err(EncodeError::EmptySectionList {
                    path: KeyPath::root().field(name),
                });
            }
            for (index, section) in sections.iter().enumerate() {
                let path = KeyPath::root().section(name, index);
                self.encode_section(&mut output, &path, name, section)?;
            }
        }

        if !self.config.trailing_newline && output.ends_with('\n') {
            output.pop();
        }

        debug!(
            sections = document.section_count(),
            bytes = output.len(),
            "encoded archive"
        );

        Ok(match self.config.line_ending {
            LineEnding::Lf => output,
            ending => output.replace('\n', ending.as_str()),
        })
    }

    /// Encode one section and everything below it
    fn encode_section(
        &self,
        output: &mut String,
        path: &KeyPath,
        name: &str,
        section: &Section,
    ) -> std::result::Result<(), EncodeError> {
        check_section_name(path, name)?;
        push_line(output, &start_marker(name));

        for (key, value) in section.iter() {
            match value {
                FieldValue::Sections(children) => {
                    if children.is_empty() {
                        return Err(EncodeError::EmptySectionList {
                            path: path.field(key),
                        });
                    }
                    for (index, child) in children.iter().enumerate() {
                        self.encode_section(output, &path.section(key, index), key, child)?;
                    }
                }
                FieldValue::MultiLineText(text) => {
                    self.encode_body(output, &path.field(key), key, text)?;
                }
                FieldValue::Scalar(text) if text.contains('\n') => {
                    self.encode_body(output, &path.field(key), key, text)?;
                }
                FieldValue::Scalar(text) => {
                    if let Some(reason) = field_line_problem(key, text) {
                        return Err(invalid_name(&path.field(key), key, reason));
                    }
                    push_line(output, &field_line(key, text));
                }
            }
        }

        push_line(output, &end_marker(name));
        Ok(())
    }

    /// Encode multi-line text as `Key:` followed by a Body block
    ///
    /// The `Key:` line is left out when it would not read back as that key.
    fn encode_body(
        &self,
        output: &mut String,
        path: &KeyPath,
        key: &str,
        text: &str,
    ) -> std::result::Result<(), EncodeError> {
        if let Some(reason) = body_field_problem(key) {
            return Err(invalid_name(path, key, reason));
        }

        let close = body_end_marker(key);
        if let Some(index) = text.split('\n').position(|line| line.trim() == close) {
            return Err(EncodeError::BodyContainsCloseMarker {
                path: path.clone(),
                line: index + 1,
            });
        }

        if let Some(line) = bare_key_line(key) {
            push_line(output, &line);
        }
        push_line(output, &body_start_marker(key));
        if !text.is_empty() {
            push_line(output, text);
        }
        push_line(output, &close);
        Ok(())
    }

    /// Encode a document directly to a writer
    pub fn encode_to_writer<W: std::io::Write>(&self, document: &Document, mut writer: W) -> Result<()> {
        let encoded = self.encode(document)?;
        writer.write_all(encoded.as_bytes())?;
        Ok(())
    }

    /// Encode a document to a file
    pub fn encode_to_file(&self, document: &Document, path: &std::path::Path) -> Result<()> {
        let encoded = self.encode(document)?;
        std::fs::write(path, encoded)
            .with_context(|| format!("Failed to write archive: {}", path.display()))?;
        Ok(())
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

fn push_line(output: &mut String, line: &str) {
    output.push_str(line);
    output.push('\n');
}

fn check_section_name(path: &KeyPath, name: &str) -> std::result::Result<(), EncodeError> {
    match section_name_problem(name) {
        Some(reason) => Err(invalid_name(path, name, reason)),
        None => Ok(()),
    }
}

fn invalid_name(path: &KeyPath, name: &str, reason: &'static str) -> EncodeError {
    EncodeError::InvalidName {
        path: path.clone(),
        name: name.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::Decoder;

    fn user(name: &str) -> Section {
        let mut section = Section::new();
        section.set_text("Name", name);
        section
    }

    #[test]
    fn test_encode_simple_section() {
        let mut doc = Document::new();
        let mut info = Section::new();
        info.set_text("User", "1");
        info.set_text("Name", "Test User");
        doc.push_section("User Info", info);

        let result = Encoder::new().encode(&doc).unwrap();
        assert_eq!(
            result,
            "--- Start User Info ---\nUser: 1\nName: Test User\n--- End User Info ---\n"
        );
    }

    #[test]
    fn test_encode_repeated_sections_in_order() {
        let mut doc = Document::new();
        doc.push_section("Thread", user("A"));
        doc.push_section("Thread", user("B"));
        doc.push_section("Thread", user("C"));

        let result = Encoder::new().encode(&doc).unwrap();
        let a = result.find("Name: A").unwrap();
        let b = result.find("Name: B").unwrap();
        let c = result.find("Name: C").unwrap();
        assert!(a < b && b < c);
        assert_eq!(result.matches("--- Start Thread ---").count(), 3);
    }

    #[test]
    fn test_encode_multiline_as_body() {
        let mut doc = Document::new();
        let mut note = Section::new();
        note.insert("Key", FieldValue::MultiLineText("hello\nworld".into()));
        doc.push_section("Note", note);

        let result = Encoder::new().encode(&doc).unwrap();
        assert_eq!(
            result,
            "--- Start Note ---\nKey:\n--- Start Key Body ---\nhello\nworld\n--- End Key Body ---\n--- End Note ---\n"
        );
    }

    #[test]
    fn test_encode_single_line_body_stays_body() {
        let mut doc = Document::new();
        let mut note = Section::new();
        note.insert("Info", FieldValue::MultiLineText("one line".into()));
        note.insert("Empty", FieldValue::MultiLineText(String::new()));
        doc.push_section("Note", note);

        let result = Encoder::new().encode(&doc).unwrap();
        assert!(result.contains("Info:\n--- Start Info Body ---\none line\n--- End Info Body ---\n"));
        assert!(result.contains("Empty:\n--- Start Empty Body ---\n--- End Empty Body ---\n"));
    }

    #[test]
    fn test_encode_nested_sections() {
        let mut thread = Section::new();
        thread.set_text("Thread", "1");
        thread.push_section("Message Post", user("A"));
        thread.push_section("Message Post", user("B"));
        let mut list = Section::new();
        list.push_section("Message Thread", thread);
        let mut doc = Document::new();
        doc.push_section("Message List", list);

        let result = Encoder::new().encode(&doc).unwrap();
        let expected = "--- Start Message List ---
--- Start Message Thread ---
Thread: 1
--- Start Message Post ---
Name: A
--- End Message Post ---
--- Start Message Post ---
Name: B
--- End Message Post ---
--- End Message Thread ---
--- End Message List ---
";
        assert_eq!(result, expected);
    }

    #[test]
    fn test_encode_line_endings() {
        let mut doc = Document::new();
        doc.push_section("User", user("A"));

        let crlf = Encoder::with_config(FormatConfig::default().with_line_ending(LineEnding::CrLf))
            .encode(&doc)
            .unwrap();
        assert_eq!(crlf, "--- Start User ---\r\nName: A\r\n--- End User ---\r\n");

        let cr = Encoder::with_config(
            FormatConfig::default()
                .with_line_ending(LineEnding::Cr)
                .with_trailing_newline(false),
        )
        .encode(&doc)
        .unwrap();
        assert_eq!(cr, "--- Start User ---\rName: A\r--- End User ---");
    }

    #[test]
    fn test_encode_rejects_bad_key() {
        let mut doc = Document::new();
        let mut section = Section::new();
        section.set_text("Bad: key", "v");
        doc.push_section("User", section);

        let err = Encoder::new().encode(&doc).unwrap_err();
        assert!(matches!(err, EncodeError::InvalidName { .. }));
        assert!(err.to_string().starts_with("User[0]/Bad: key:"));
    }

    #[test]
    fn test_encode_rejects_field_line_that_reads_as_marker() {
        let mut doc = Document::new();
        let mut section = Section::new();
        section.set_text("--- Start A", "B ---");
        doc.push_section("User", section);

        let err = Encoder::new().encode(&doc).unwrap_err();
        assert!(matches!(err, EncodeError::InvalidName { ref name, .. } if name == "--- Start A"));
    }

    #[test]
    fn test_encode_unusual_keys_read_back() {
        let mut doc = Document::new();
        let mut section = Section::new();
        section.set_text("--- Note", "x");
        section.set_text("  Indented", "y");
        section.set_text("Trailing ", "");
        section.set_text("Re: topic", "first\nsecond");
        doc.push_section("Note", section);

        let text = Encoder::new().encode(&doc).unwrap();
        assert!(text.contains("--- Note: x\n"));
        // No `Key:` line for a key that would split on ': '
        assert!(text.contains("--- End Note ---") && !text.contains("Re: topic:"));

        let parsed = Decoder::new().decode(&text);
        assert!(parsed.diagnostics.is_empty());
        assert_eq!(parsed.document, doc);
    }

    #[test]
    fn test_encode_rejects_body_section_name() {
        let mut doc = Document::new();
        doc.push_section("Poll Body", Section::new());

        let err = Encoder::new().encode(&doc).unwrap_err();
        assert!(matches!(err, EncodeError::InvalidName { ref name, .. } if name == "Poll Body"));
    }

    #[test]
    fn test_encode_rejects_close_marker_in_body() {
        let mut doc = Document::new();
        let mut section = Section::new();
        section.set_text("Bio", "first\n--- End Bio Body ---\nlast");
        doc.push_section("User", section);

        let err = Encoder::new().encode(&doc).unwrap_err();
        assert_eq!(
            err,
            EncodeError::BodyContainsCloseMarker {
                path: KeyPath::root().section("User", 0).field("Bio"),
                line: 2,
            }
        );
    }

    #[test]
    fn test_encode_rejects_empty_section_list() {
        let mut doc = Document::new();
        let mut section = Section::new();
        section.insert("Polls", FieldValue::Sections(Vec::new()));
        doc.push_section("Post", section);

        let err = Encoder::new().encode(&doc).unwrap_err();
        assert_eq!(
            err,
            EncodeError::EmptySectionList {
                path: KeyPath::root().section("Post", 0).field("Polls"),
            }
        );
    }

    #[test]
    fn test_encode_output_decodes_cleanly() {
        let mut doc = Document::new();
        let mut post = Section::new();
        post.set_text("Author", "@a");
        post.set_text("Message", "Hi: there\n\nbye");
        post.set_text("Post", "1");
        doc.push_section("Message Post", post);

        let text = Encoder::new().encode(&doc).unwrap();
        let parsed = Decoder::new().decode(&text);
        assert!(parsed.diagnostics.is_empty());
        assert_eq!(parsed.document, doc);
    }

    #[test]
    fn test_encode_to_file() {
        let mut doc = Document::new();
        doc.push_section("User", user("A"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        Encoder::new().encode_to_file(&doc, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("Name: A"));

        let mut buffer = Vec::new();
        Encoder::new().encode_to_writer(&doc, &mut buffer).unwrap();
        assert_eq!(buffer, written.into_bytes());
    }
}
