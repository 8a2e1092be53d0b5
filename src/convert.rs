//! JSON and YAML views of a document
//!
//! A [`Document`] maps onto plain data one to one: sections become objects,
//! section lists become arrays and text fields become strings. Going back,
//! numbers and booleans are accepted as text, `null` as an empty string, and a
//! single object where a list is expected as a one-element list.

use crate::archive::{Document, FieldValue, KeyPath, Section};
use crate::error::ConvertError;
use serde_json::{Map, Value};

type Result<T> = std::result::Result<T, ConvertError>;

/// Serialize a document as JSON
pub fn to_json(document: &Document, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(document)?
    } else {
        serde_json::to_string(document)?
    };
    Ok(json)
}

/// Serialize a document as YAML
pub fn to_yaml(document: &Document) -> Result<String> {
    Ok(serde_yaml::to_string(document)?)
}

/// Build a document from JSON text
pub fn from_json(input: &str) -> Result<Document> {
    let value: Value = serde_json::from_str(input)?;
    document_from_value(&value)
}

/// Build a document from YAML text
pub fn from_yaml(input: &str) -> Result<Document> {
    let value: Value = serde_yaml::from_str(input)?;
    document_from_value(&value)
}

/// Build a document from an already-parsed JSON value
pub fn document_from_value(value: &Value) -> Result<Document> {
    let root = KeyPath::root();
    let Value::Object(map) = value else {
        return Err(shape_error(root, "an object of sections", value));
    };

    let mut document = Document::new();
    for (name, entry) in map {
        for section in sections_from_value(&root, name, entry)? {
            document.push_section(name.as_str(), section);
        }
    }
    Ok(document)
}

/// Sections stored under `name` in the container at `parent`
fn sections_from_value(parent: &KeyPath, name: &str, value: &Value) -> Result<Vec<Section>> {
    match value {
        Value::Array(items) if items.is_empty() => Err(ConvertError::Shape {
            path: parent.field(name),
            expected: "at least one section",
            found: "an empty array",
        }),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let path = parent.section(name, index);
                match item {
                    Value::Object(fields) => section_from_map(&path, fields),
                    other => Err(shape_error(path, "a section object", other)),
                }
            })
            .collect(),
        Value::Object(fields) => Ok(vec![section_from_map(&parent.section(name, 0), fields)?]),
        other => Err(shape_error(parent.field(name), "a section or list of sections", other)),
    }
}

fn section_from_map(path: &KeyPath, fields: &Map<String, Value>) -> Result<Section> {
    let mut section = Section::new();
    for (key, value) in fields {
        let field = match value {
            Value::String(text) => FieldValue::text(text.as_str()),
            Value::Number(number) => FieldValue::Scalar(number.to_string()),
            Value::Bool(flag) => FieldValue::Scalar(flag.to_string()),
            Value::Null => FieldValue::Scalar(String::new()),
            Value::Array(_) | Value::Object(_) => {
                FieldValue::Sections(sections_from_value(path, key, value)?)
            }
        };
        section.insert(key.as_str(), field);
    }
    Ok(section)
}

fn shape_error(path: KeyPath, expected: &'static str, found: &Value) -> ConvertError {
    ConvertError::Shape {
        path,
        expected,
        found: value_kind(found),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
