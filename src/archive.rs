//! Archive data structures

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

// Archive marker grammar
pub const MARKER_PREFIX: &str = "--- ";
pub const MARKER_SUFFIX: &str = " ---";
pub const MARKER_DELIMITER: &str = "---";
pub const START_VERB: &str = "Start ";
pub const END_VERB: &str = "End ";
pub const BODY_SUFFIX: &str = " Body";
pub const KEY_SEPARATOR: &str = ": ";
pub const BARE_KEY_SUFFIX: char = ':';

/// Value stored under a field name in a [`Section`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Single-line text from a `Key: value` or bare `Key:` line
    Scalar(String),
    /// Text captured by a Body block or grown by continuation lines
    MultiLineText(String),
    /// Child sections opened under this field name, in order of appearance
    Sections(Vec<Section>),
}

impl FieldValue {
    /// Build a text value, choosing the multi-line variant when `text` has a line break
    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.contains('\n') {
            FieldValue::MultiLineText(text)
        } else {
            FieldValue::Scalar(text)
        }
    }

    /// Text content for scalar and multi-line values
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Scalar(text) | FieldValue::MultiLineText(text) => Some(text),
            FieldValue::Sections(_) => None,
        }
    }

    pub fn as_sections(&self) -> Option<&[Section]> {
        match self {
            FieldValue::Sections(sections) => Some(sections),
            _ => None,
        }
    }

    /// Short name of the value's shape, used in diagnostics
    pub fn shape(&self) -> &'static str {
        match self {
            FieldValue::Scalar(_) => "scalar",
            FieldValue::MultiLineText(_) => "multi-line text",
            FieldValue::Sections(_) => "section list",
        }
    }
}

/// An ordered mapping from field name to [`FieldValue`]
///
/// Field order is the order in which keys were first inserted. Replacing the
/// value of an existing key keeps its position.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Section {
    fields: IndexMap<String, FieldValue>,
}

impl Section {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Text of a scalar or multi-line field
    pub fn get_text(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(FieldValue::as_text)
    }

    /// Child sections stored under `key` (empty when the field is absent or text)
    pub fn sections(&self, key: &str) -> &[Section] {
        self.fields
            .get(key)
            .and_then(FieldValue::as_sections)
            .unwrap_or(&[])
    }

    /// Iterate fields in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Set a field, returning the value it replaced
    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) -> Option<FieldValue> {
        self.fields.insert(key.into(), value)
    }

    /// Set a text field, picking scalar or multi-line by content
    pub fn set_text(&mut self, key: impl Into<String>, text: impl Into<String>) -> Option<FieldValue> {
        self.insert(key, FieldValue::text(text))
    }

    /// Append a child section under `key`
    ///
    /// Creates the section list on first use. If `key` currently holds text, that
    /// text is replaced by the new list and returned.
    pub fn push_section(&mut self, key: impl Into<String>, section: Section) -> Option<FieldValue> {
        let key = key.into();
        match self.fields.get_mut(&key) {
            Some(FieldValue::Sections(list)) => {
                list.push(section);
                None
            }
            _ => self.fields.insert(key, FieldValue::Sections(vec![section])),
        }
    }

    /// Remove a field, keeping the order of the rest
    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        self.fields.shift_remove(key)
    }

    /// Remove the `index`-th child section under `key`
    ///
    /// The field itself goes away with its last section.
    pub fn remove_section(&mut self, key: &str, index: usize) -> Option<Section> {
        let Some(FieldValue::Sections(list)) = self.fields.get_mut(key) else {
            return None;
        };
        if index >= list.len() {
            return None;
        }
        let removed = list.remove(index);
        if list.is_empty() {
            self.fields.shift_remove(key);
        }
        Some(removed)
    }

    /// Count of nested sections at each name path below this section
    ///
    /// Paths are relative and joined with `/`, e.g. `Message Thread/Message Post`.
    pub fn outline(&self) -> Vec<(String, usize)> {
        let mut counts = IndexMap::new();
        tally_children(&mut counts, "", self);
        counts.into_iter().collect()
    }

    /// Append a continuation line to a text field, promoting it to multi-line text
    ///
    /// Returns `false` when the field is missing or holds child sections.
    pub fn append_line(&mut self, key: &str, line: &str) -> bool {
        let Some(value) = self.fields.get_mut(key) else {
            return false;
        };
        let merged = match value {
            FieldValue::Scalar(text) | FieldValue::MultiLineText(text) => {
                let mut merged = std::mem::take(text);
                merged.push('\n');
                merged.push_str(line);
                merged
            }
            FieldValue::Sections(_) => return false,
        };
        *value = FieldValue::MultiLineText(merged);
        true
    }
}

// Field order is part of the structure, so equality is positional.
impl PartialEq for Section {
    fn eq(&self, other: &Self) -> bool {
        self.fields.len() == other.fields.len() && self.fields.iter().eq(other.fields.iter())
    }
}

impl Eq for Section {}

/// Root of a parsed archive: top-level section names mapped to every occurrence
/// of that section, in order
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Document {
    sections: IndexMap<String, Vec<Section>>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct top-level section names
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Total number of top-level section instances
    pub fn section_count(&self) -> usize {
        self.sections.values().map(Vec::len).sum()
    }

    /// Every top-level section called `name`
    pub fn sections(&self, name: &str) -> &[Section] {
        self.sections.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn sections_mut(&mut self, name: &str) -> Option<&mut Vec<Section>> {
        self.sections.get_mut(name)
    }

    /// Append a top-level section, keeping the first-seen position of `name`
    pub fn push_section(&mut self, name: impl Into<String>, section: Section) {
        self.sections.entry(name.into()).or_default().push(section);
    }

    /// Iterate top-level names and their sections in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Section])> {
        self.sections
            .iter()
            .map(|(name, sections)| (name.as_str(), sections.as_slice()))
    }

    /// Remove every top-level section called `name`, keeping the order of the rest
    pub fn remove(&mut self, name: &str) -> Option<Vec<Section>> {
        self.sections.shift_remove(name)
    }

    /// Remove the `index`-th top-level section called `name`
    pub fn remove_section(&mut self, name: &str, index: usize) -> Option<Section> {
        let list = self.sections.get_mut(name)?;
        if index >= list.len() {
            return None;
        }
        let removed = list.remove(index);
        if list.is_empty() {
            self.sections.shift_remove(name);
        }
        Some(removed)
    }

    /// Count of sections at each name path, top level included
    pub fn outline(&self) -> Vec<(String, usize)> {
        let mut counts: IndexMap<String, usize> = IndexMap::new();
        for (name, sections) in self.iter() {
            *counts.entry(name.to_string()).or_default() += sections.len();
            for section in sections {
                tally_children(&mut counts, name, section);
            }
        }
        counts.into_iter().collect()
    }
}

fn tally_children(counts: &mut IndexMap<String, usize>, prefix: &str, section: &Section) {
    for (key, value) in section.iter() {
        let FieldValue::Sections(children) = value else {
            continue;
        };
        let path = if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}/{}", prefix, key)
        };
        *counts.entry(path.clone()).or_default() += children.len();
        for child in children {
            tally_children(counts, &path, child);
        }
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.sections.len() == other.sections.len()
            && self.sections.iter().eq(other.sections.iter())
    }
}

impl Eq for Document {}

/// Location of a section or field inside a [`Document`]
///
/// Rendered as `Message List[0]/Message Thread[2]/Title`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPath {
    segments: Vec<String>,
}

impl KeyPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Path of the `index`-th section called `name` below this one
    pub fn section(&self, name: &str, index: usize) -> Self {
        self.child(format!("{}[{}]", name, index))
    }

    /// Path of the field `key` below this one
    pub fn field(&self, key: &str) -> Self {
        self.child(key.to_string())
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    fn child(&self, segment: String) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            write!(f, "<root>")
        } else {
            write!(f, "{}", self.segments.join("/"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_text_picks_variant() {
        assert_eq!(FieldValue::text("one line"), FieldValue::Scalar("one line".into()));
        assert_eq!(
            FieldValue::text("two\nlines"),
            FieldValue::MultiLineText("two\nlines".into())
        );
    }

    #[test]
    fn test_section_preserves_insertion_order() {
        let mut section = Section::new();
        section.set_text("Zeta", "1");
        section.set_text("Alpha", "2");
        section.set_text("Mid", "3");
        // Replacing keeps the original position
        section.set_text("Zeta", "4");

        let keys: Vec<&str> = section.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["Zeta", "Alpha", "Mid"]);
        assert_eq!(section.get_text("Zeta"), Some("4"));
    }

    #[test]
    fn test_section_equality_is_order_sensitive() {
        let mut a = Section::new();
        a.set_text("Name", "A");
        a.set_text("Handle", "@a");

        let mut b = Section::new();
        b.set_text("Handle", "@a");
        b.set_text("Name", "A");

        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_append_line_promotes_scalar() {
        let mut section = Section::new();
        section.set_text("Key", "hello");
        assert!(section.append_line("Key", "world"));
        assert_eq!(
            section.get("Key"),
            Some(&FieldValue::MultiLineText("hello\nworld".into()))
        );
        assert!(!section.append_line("Missing", "text"));
    }

    #[test]
    fn test_push_section_creates_and_extends_list() {
        let mut parent = Section::new();
        let mut post = Section::new();
        post.set_text("Post", "1");
        assert!(parent.push_section("Message Post", post.clone()).is_none());
        post.set_text("Post", "2");
        assert!(parent.push_section("Message Post", post).is_none());

        let posts = parent.sections("Message Post");
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[1].get_text("Post"), Some("2"));
    }

    #[test]
    fn test_push_section_replaces_text() {
        let mut parent = Section::new();
        parent.set_text("Polls", "");
        let replaced = parent.push_section("Polls", Section::new());
        assert_eq!(replaced, Some(FieldValue::Scalar(String::new())));
        assert_eq!(parent.sections("Polls").len(), 1);
    }

    #[test]
    fn test_document_groups_repeated_names() {
        let mut doc = Document::new();
        doc.push_section("Thread", Section::new());
        doc.push_section("User", Section::new());
        doc.push_section("Thread", Section::new());

        let names: Vec<&str> = doc.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["Thread", "User"]);
        assert_eq!(doc.sections("Thread").len(), 2);
        assert_eq!(doc.section_count(), 3);
        assert!(doc.sections("Missing").is_empty());
    }

    #[test]
    fn test_section_remove_keeps_order() {
        let mut section = Section::new();
        section.set_text("A", "1");
        section.set_text("B", "2");
        section.set_text("C", "3");

        assert_eq!(section.remove("B"), Some(FieldValue::Scalar("2".into())));
        assert_eq!(section.remove("B"), None);
        let keys: Vec<&str> = section.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["A", "C"]);
    }

    #[test]
    fn test_remove_nested_section() {
        let mut thread = Section::new();
        thread.set_text("Thread", "1");
        for number in ["1", "2"] {
            let mut post = Section::new();
            post.set_text("Post", number);
            thread.push_section("Message Post", post);
        }
        thread.set_text("Title", "Welcome");

        let removed = thread.remove_section("Message Post", 0).unwrap();
        assert_eq!(removed.get_text("Post"), Some("1"));
        assert_eq!(thread.sections("Message Post")[0].get_text("Post"), Some("2"));
        assert!(thread.remove_section("Message Post", 5).is_none());
        assert!(thread.remove_section("Title", 0).is_none());

        // Removing the last post drops the field
        thread.remove_section("Message Post", 0).unwrap();
        let keys: Vec<&str> = thread.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["Thread", "Title"]);
    }

    #[test]
    fn test_document_remove_section() {
        let mut doc = Document::new();
        let mut user = Section::new();
        user.set_text("User", "1");
        doc.push_section("User Info", user.clone());
        user.set_text("User", "2");
        doc.push_section("User Info", user);
        doc.push_section("Category List", Section::new());

        let removed = doc.remove_section("User Info", 1).unwrap();
        assert_eq!(removed.get_text("User"), Some("2"));
        assert_eq!(doc.sections("User Info").len(), 1);

        doc.remove_section("User Info", 0).unwrap();
        let names: Vec<&str> = doc.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["Category List"]);
        assert!(doc.remove_section("User Info", 0).is_none());
        assert_eq!(doc.remove("Category List").map(|list| list.len()), Some(1));
        assert!(doc.is_empty());
    }

    #[test]
    fn test_document_outline() {
        let mut thread = Section::new();
        thread.push_section("Message Post", Section::new());
        thread.push_section("Message Post", Section::new());
        let mut list = Section::new();
        list.push_section("Message Thread", thread.clone());
        list.push_section("Message Thread", thread);
        let mut service = Section::new();
        service.set_text("Entry", "1");
        service.push_section("Message List", list);
        let mut doc = Document::new();
        doc.push_section("Archive Service", service);

        assert_eq!(
            doc.outline(),
            vec![
                ("Archive Service".to_string(), 1),
                ("Archive Service/Message List".to_string(), 1),
                ("Archive Service/Message List/Message Thread".to_string(), 2),
                ("Archive Service/Message List/Message Thread/Message Post".to_string(), 4),
            ]
        );

        let service = &doc.sections("Archive Service")[0];
        assert_eq!(service.outline()[2], ("Message List/Message Thread/Message Post".to_string(), 4));
    }

    #[test]
    fn test_key_path_display() {
        let path = KeyPath::root()
            .section("Message List", 0)
            .section("Message Thread", 2)
            .field("Title");
        assert_eq!(path.to_string(), "Message List[0]/Message Thread[2]/Title");
        assert_eq!(KeyPath::root().to_string(), "<root>");
    }
}
