//! A single resource document.
//!
//! `Document` owns an object-shaped [`Value`] and exposes the identity fields
//! selectors look at. Content can only be swapped for another object, so a
//! document never stops being map-shaped.

use super::resid::{Gvk, ResId};
use super::value::Value;
use indexmap::IndexMap;
use thiserror::Error;

/// String-to-string mapping used for labels and annotations.
pub type StringMap = IndexMap<String, String>;

/// Errors raised when a value cannot serve as document content.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    #[error("document content must be an object, got {found}")]
    NotAnObject { found: &'static str },

    #[error("unable to convert document: {message}")]
    Conversion { message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    content: Value,
}

impl Document {
    /// Creates a document from its map-view.
    ///
    /// # Example
    ///
    /// ```
    /// use yamlrelay::document::resource::Document;
    /// use yamlrelay::document::value::Value;
    ///
    /// assert!(Document::from_map_view(Value::from(1)).is_err());
    /// ```
    pub fn from_map_view(content: Value) -> Result<Self, DocumentError> {
        check_shape(&content)?;
        Ok(Self { content })
    }

    pub fn map_view(&self) -> &Value {
        &self.content
    }

    pub fn into_map_view(self) -> Value {
        self.content
    }

    /// Replaces the whole content of this document in place.
    ///
    /// The document is left untouched when `content` is not an object.
    pub fn replace_content(&mut self, content: Value) -> Result<(), DocumentError> {
        check_shape(&content)?;
        self.content = content;
        Ok(())
    }

    fn string_at(&self, keys: &[&str]) -> &str {
        self.content
            .pointer(keys.iter().copied())
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    pub fn api_version(&self) -> &str {
        self.string_at(&["apiVersion"])
    }

    pub fn kind(&self) -> &str {
        self.string_at(&["kind"])
    }

    pub fn name(&self) -> &str {
        self.string_at(&["metadata", "name"])
    }

    /// Declared namespace; empty when the document has none.
    pub fn namespace(&self) -> &str {
        self.string_at(&["metadata", "namespace"])
    }

    pub fn gvk(&self) -> Gvk {
        Gvk::from_api_version(self.api_version(), self.kind())
    }

    pub fn res_id(&self) -> ResId {
        ResId::new(self.gvk(), self.name(), self.namespace())
    }

    pub fn labels(&self) -> StringMap {
        self.string_map(&["metadata", "labels"])
    }

    pub fn annotations(&self) -> StringMap {
        self.string_map(&["metadata", "annotations"])
    }

    /// Reads a mapping of scalars, stringifying numbers and booleans.
    fn string_map(&self, keys: &[&str]) -> StringMap {
        let mut result = StringMap::new();
        if let Some(Value::Object(map)) = self.content.pointer(keys.iter().copied()) {
            for (key, value) in map {
                let text = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Boolean(b) => b.to_string(),
                    Value::Null => String::new(),
                    Value::Array(_) | Value::Object(_) => continue,
                };
                result.insert(key.clone(), text);
            }
        }
        result
    }
}

fn check_shape(content: &Value) -> Result<(), DocumentError> {
    if content.is_object() {
        Ok(())
    } else {
        Err(DocumentError::NotAnObject {
            found: content.type_name(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parser::parse_documents;

    fn deployment() -> Document {
        let docs = parse_documents(
            r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
  namespace: prod
  labels:
    app: web
    tier: "1"
    canary: true
  annotations:
    owner: platform
spec:
  replicas: 2
"#,
        )
        .unwrap();
        docs.into_iter().next().unwrap()
    }

    #[test]
    fn test_identity_accessors() {
        let doc = deployment();
        assert_eq!(doc.name(), "web");
        assert_eq!(doc.namespace(), "prod");
        assert_eq!(doc.gvk(), Gvk::new("apps", "v1", "Deployment"));
    }

    #[test]
    fn test_labels_are_stringified() {
        let labels = deployment().labels();
        assert_eq!(labels.get("app").map(String::as_str), Some("web"));
        assert_eq!(labels.get("tier").map(String::as_str), Some("1"));
        assert_eq!(labels.get("canary").map(String::as_str), Some("true"));
    }

    #[test]
    fn test_missing_metadata_is_empty() {
        let doc = Document::from_map_view(Value::Object(IndexMap::new())).unwrap();
        assert_eq!(doc.name(), "");
        assert!(doc.labels().is_empty());
        assert!(doc.annotations().is_empty());
    }

    #[test]
    fn test_replace_content_rejects_scalars() {
        let mut doc = deployment();
        let before = doc.clone();
        let err = doc.replace_content(Value::from("oops")).unwrap_err();
        assert_eq!(err, DocumentError::NotAnObject { found: "string" });
        assert_eq!(doc, before);
    }
}
