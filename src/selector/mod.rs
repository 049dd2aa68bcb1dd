//! Structural selection of documents.
//!
//! A [`Selector`] names the criteria a document must meet: type
//! discriminator, name, namespace, labels, annotations and an optional
//! predicate expression. [`CompiledSelector`] turns the structural part into
//! a [`StructuralMatcher`]; predicates are left to the engine, which owns the
//! evaluator.
//!
//! # Example
//!
//! ```
//! use yamlrelay::document::parser::parse_documents;
//! use yamlrelay::selector::{select, CompiledSelector, Selector};
//!
//! let docs = parse_documents(
//!     "apiVersion: v1\nkind: ConfigMap\nmetadata: {name: app-config}\n---\n\
//!      apiVersion: apps/v1\nkind: Deployment\nmetadata: {name: app}\n",
//! )
//! .unwrap();
//!
//! let selector = Selector::default().with_kind("ConfigMap").with_name("app-.*");
//! let matcher = CompiledSelector::compile(&selector).unwrap();
//! assert_eq!(select(&matcher, &docs, "default").unwrap(), vec![0]);
//! ```

pub mod labels;
pub mod matcher;

pub use labels::LabelSelector;
pub use matcher::{CompiledSelector, StructuralMatcher};

use crate::document::Document;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised while compiling or applying a selector.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectorError {
    #[error("invalid {field} pattern '{pattern}': {message}")]
    InvalidPattern {
        field: &'static str,
        pattern: String,
        message: String,
    },

    #[error("invalid selector '{selector}': {message}")]
    InvalidRequirement { selector: String, message: String },
}

/// Match criteria for documents.
///
/// Empty fields match anything. `group`, `version`, `kind`, `name` and
/// `namespace` are regular expressions anchored at both ends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Selector {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub group: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub label_selector: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub annotation_selector: String,
    /// Expression that must evaluate to `true` for a candidate.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub predicate: String,
}

impl Selector {
    pub fn with_group(mut self, group: &str) -> Self {
        self.group = group.to_string();
        self
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    pub fn with_kind(mut self, kind: &str) -> Self {
        self.kind = kind.to_string();
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = namespace.to_string();
        self
    }

    pub fn with_labels(mut self, selector: &str) -> Self {
        self.label_selector = selector.to_string();
        self
    }

    pub fn with_annotations(mut self, selector: &str) -> Self {
        self.annotation_selector = selector.to_string();
        self
    }

    pub fn with_predicate(mut self, predicate: &str) -> Self {
        self.predicate = predicate.to_string();
        self
    }

    /// The predicate, if one is set.
    pub fn predicate(&self) -> Option<&str> {
        let trimmed = self.predicate.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    }
}

impl fmt::Display for Selector {
    /// Renders the non-empty criteria, e.g. `{kind=Deployment, name=web}`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = [
            ("group", &self.group),
            ("version", &self.version),
            ("kind", &self.kind),
            ("name", &self.name),
            ("namespace", &self.namespace),
            ("labelSelector", &self.label_selector),
            ("annotationSelector", &self.annotation_selector),
        ];
        let parts: Vec<String> = fields
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(field, value)| format!("{}={}", field, value))
            .collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

/// Returns the indices of the documents `matcher` accepts, in input order.
pub fn select<M: StructuralMatcher + ?Sized>(
    matcher: &M,
    documents: &[Document],
    default_namespace: &str,
) -> Result<Vec<usize>, SelectorError> {
    let mut selected = Vec::new();
    for (idx, document) in documents.iter().enumerate() {
        if matcher.matches(document, default_namespace)? {
            selected.push(idx);
        }
    }
    Ok(selected)
}
