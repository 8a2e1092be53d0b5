//! Line classification for archive text
//!
//! Every line of an archive is one of a handful of shapes. Markers use the
//! `--- Start Name ---` / `--- End Name ---` brackets; a marker whose name ends
//! in ` Body` opens or closes a verbatim text block for the field named by the
//! rest. Anything else is a `Key: value` pair, a bare `Key:`, or free text.

use crate::archive::{
    BARE_KEY_SUFFIX, BODY_SUFFIX, END_VERB, KEY_SEPARATOR, MARKER_DELIMITER, MARKER_PREFIX,
    MARKER_SUFFIX, START_VERB,
};

/// Classification of a single archive line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// `--- Start Name ---`
    SectionOpen(&'a str),
    /// `--- End Name ---`
    SectionClose(&'a str),
    /// `--- Start Field Body ---`, carrying `Field`
    BodyOpen(&'a str),
    /// `--- End Field Body ---`, carrying `Field`
    BodyClose(&'a str),
    /// `Key: value`, split on the first `: `
    KeyValue(&'a str, &'a str),
    /// `Key:` with nothing after the colon
    BareKey(&'a str),
    /// Free text while a key is active
    Continuation(&'a str),
    /// Free text with no active key
    BareSectionName(&'a str),
    /// Empty or whitespace-only line
    Blank,
}

/// Classify one line (already stripped of its terminator)
///
/// `key_active` decides whether free text continues the current field or
/// names a section. Malformed markers fall through to ordinary text.
pub fn classify(line: &str, key_active: bool) -> LineKind<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineKind::Blank;
    }

    if let Some(marker) = classify_marker(trimmed) {
        return marker;
    }

    if let Some((key, value)) = line.split_once(KEY_SEPARATOR) {
        if !key.trim().is_empty() {
            return LineKind::KeyValue(key, value);
        }
    }

    if let Some(key) = line.trim_end().strip_suffix(BARE_KEY_SUFFIX) {
        if !key.trim().is_empty() {
            return LineKind::BareKey(key);
        }
    }

    if key_active {
        LineKind::Continuation(line)
    } else {
        LineKind::BareSectionName(trimmed)
    }
}

/// Parse a marker line like `--- Start User Info ---` or `--- End Bio Body ---`
///
/// `trimmed` must already have surrounding whitespace removed.
pub fn classify_marker(trimmed: &str) -> Option<LineKind<'_>> {
    let inner = trimmed
        .strip_prefix(MARKER_PREFIX)?
        .strip_suffix(MARKER_SUFFIX)?;

    let (is_start, name) = if let Some(name) = inner.strip_prefix(START_VERB) {
        (true, name)
    } else if let Some(name) = inner.strip_prefix(END_VERB) {
        (false, name)
    } else {
        return None;
    };

    if !is_valid_marker_name(name) {
        return None;
    }

    let kind = match name.strip_suffix(BODY_SUFFIX) {
        Some(field) if !field.is_empty() => {
            if is_start {
                LineKind::BodyOpen(field)
            } else {
                LineKind::BodyClose(field)
            }
        }
        _ => {
            if is_start {
                LineKind::SectionOpen(name)
            } else {
                LineKind::SectionClose(name)
            }
        }
    };
    Some(kind)
}

/// Whether `name` can sit between marker brackets and be read back unchanged
pub fn is_valid_marker_name(name: &str) -> bool {
    !name.is_empty()
        && name.trim() == name
        && !name.contains(MARKER_DELIMITER)
        && !name.contains(['\n', '\r'])
}

/// Whether `name` would be read back as a body marker rather than a section
pub fn is_body_name(name: &str) -> bool {
    matches!(name.strip_suffix(BODY_SUFFIX), Some(field) if !field.is_empty())
}

/// Why a section called `name` cannot be written as a marker pair
pub fn section_name_problem(name: &str) -> Option<&'static str> {
    if !is_valid_marker_name(name) {
        Some("section names must be non-empty, trimmed, single-line and free of '---'")
    } else if is_body_name(name) {
        Some("section names ending in ' Body' read back as body blocks")
    } else {
        None
    }
}

/// Why multi-line text under `field` cannot be written as a body block
pub fn body_field_problem(field: &str) -> Option<&'static str> {
    if is_valid_marker_name(field) {
        None
    } else {
        Some("multi-line field names must be trimmed, single-line and free of '---'")
    }
}

/// Why `key: value` cannot be written as a single field line
pub fn field_line_problem(key: &str, value: &str) -> Option<&'static str> {
    if key.trim().is_empty() {
        Some("field names must not be blank")
    } else if key.contains(['\n', '\r']) {
        Some("field names must be a single line")
    } else if key.contains(KEY_SEPARATOR) {
        Some("field names must not contain ': '")
    } else if classify(&field_line(key, value), false) != LineKind::KeyValue(key, value) {
        Some("field line would read back as a marker")
    } else {
        None
    }
}

pub fn field_line(key: &str, value: &str) -> String {
    format!("{}{}{}", key, KEY_SEPARATOR, value)
}

/// `Key:` line announcing a body block, when it reads back as that key
pub fn bare_key_line(key: &str) -> Option<String> {
    let line = format!("{}{}", key, BARE_KEY_SUFFIX);
    let reads_back = classify(&line, false) == LineKind::BareKey(key);
    reads_back.then_some(line)
}

pub fn start_marker(name: &str) -> String {
    format!("{}{}{}{}", MARKER_PREFIX, START_VERB, name, MARKER_SUFFIX)
}

pub fn end_marker(name: &str) -> String {
    format!("{}{}{}{}", MARKER_PREFIX, END_VERB, name, MARKER_SUFFIX)
}

pub fn body_start_marker(field: &str) -> String {
    start_marker(&format!("{}{}", field, BODY_SUFFIX))
}

pub fn body_end_marker(field: &str) -> String {
    end_marker(&format!("{}{}", field, BODY_SUFFIX))
}
