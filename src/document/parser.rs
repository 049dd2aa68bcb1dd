//! YAML parsing and printing for resource documents.
//!
//! Converts between `serde_yaml::Value` and the internal [`Value`] model and
//! handles `---`-separated multi-document streams.
//!
//! # Example
//!
//! ```
//! use yamlrelay::document::parser::{parse_documents, print_documents};
//!
//! let docs = parse_documents("kind: A\n---\nkind: B\n").unwrap();
//! assert_eq!(docs.len(), 2);
//! assert_eq!(docs[1].kind(), "B");
//!
//! let yaml = print_documents(&docs).unwrap();
//! assert!(yaml.contains("---"));
//! ```

use super::resource::{Document, DocumentError};
use super::value::{Number, Value};
use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_yaml::Value as SerdeValue;

/// Parses a multi-document YAML stream into documents.
///
/// Empty documents are skipped. Every other document must be a mapping.
pub fn parse_documents(yaml: &str) -> Result<Vec<Document>> {
    let mut documents = Vec::new();

    for (idx, de) in serde_yaml::Deserializer::from_str(yaml).enumerate() {
        let raw = SerdeValue::deserialize(de)
            .with_context(|| format!("Failed to parse YAML document {}", idx + 1))?;
        if raw.is_null() {
            continue;
        }

        let value = from_serde(&raw).with_context(|| format!("Invalid document {}", idx + 1))?;
        let document =
            Document::from_map_view(value).with_context(|| format!("Invalid document {}", idx + 1))?;
        documents.push(document);
    }

    Ok(documents)
}

/// Prints documents as a `---`-separated YAML stream.
pub fn print_documents(documents: &[Document]) -> Result<String> {
    let mut out = String::new();
    for document in documents {
        out.push_str("---\n");
        let yaml = serde_yaml::to_string(&to_serde(document.map_view()))
            .context("Failed to serialize document")?;
        out.push_str(&yaml);
    }
    Ok(out)
}

/// Converts a `serde_yaml::Value` into a [`Value`].
///
/// Tags are dropped, scalar mapping keys are turned into strings, and
/// collection keys are rejected.
pub fn from_serde(value: &SerdeValue) -> Result<Value, DocumentError> {
    let converted = match value {
        SerdeValue::Null => Value::Null,
        SerdeValue::Bool(b) => Value::Boolean(*b),
        SerdeValue::Number(n) => Value::Number(convert_number(n)),
        SerdeValue::String(s) => Value::String(s.clone()),
        SerdeValue::Sequence(items) => {
            Value::Array(items.iter().map(from_serde).collect::<Result<_, _>>()?)
        }
        SerdeValue::Mapping(map) => {
            let mut entries = IndexMap::with_capacity(map.len());
            for (key, item) in map {
                entries.insert(key_to_string(key)?, from_serde(item)?);
            }
            Value::Object(entries)
        }
        SerdeValue::Tagged(tagged) => from_serde(&tagged.value)?,
    };
    Ok(converted)
}

fn convert_number(n: &serde_yaml::Number) -> Number {
    if let Some(i) = n.as_i64() {
        Number::Integer(i)
    } else {
        Number::Float(n.as_f64().unwrap_or(f64::NAN))
    }
}

fn key_to_string(key: &SerdeValue) -> Result<String, DocumentError> {
    match key {
        SerdeValue::String(s) => Ok(s.clone()),
        SerdeValue::Bool(b) => Ok(b.to_string()),
        SerdeValue::Number(n) => Ok(n.to_string()),
        SerdeValue::Null => Ok("null".to_string()),
        SerdeValue::Tagged(tagged) => key_to_string(&tagged.value),
        SerdeValue::Sequence(_) | SerdeValue::Mapping(_) => Err(DocumentError::Conversion {
            message: "mapping keys must be scalars".to_string(),
        }),
    }
}

/// Converts a [`Value`] back into a `serde_yaml::Value`.
pub fn to_serde(value: &Value) -> SerdeValue {
    match value {
        Value::Null => SerdeValue::Null,
        Value::Boolean(b) => SerdeValue::Bool(*b),
        Value::Number(Number::Integer(i)) => SerdeValue::Number((*i).into()),
        Value::Number(Number::Float(f)) => SerdeValue::Number((*f).into()),
        Value::String(s) => SerdeValue::String(s.clone()),
        Value::Array(items) => SerdeValue::Sequence(items.iter().map(to_serde).collect()),
        Value::Object(map) => {
            let mut mapping = serde_yaml::Mapping::with_capacity(map.len());
            for (key, item) in map {
                mapping.insert(SerdeValue::String(key.clone()), to_serde(item));
            }
            SerdeValue::Mapping(mapping)
        }
    }
}

/// Parses a YAML snippet into a [`Value`] of any shape.
pub fn parse_value(yaml: &str) -> Result<Value> {
    let raw: SerdeValue = serde_yaml::from_str(yaml).context("Failed to parse YAML")?;
    Ok(from_serde(&raw)?)
}
