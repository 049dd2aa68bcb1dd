//! Declarative replacement rules and the function config that carries them.

use crate::selector::Selector;
use serde::{Deserialize, Serialize};

/// API version expected on function config documents.
pub const API_VERSION: &str = "yamlrelay.io/v1alpha1";

/// Kind expected on function config documents.
pub const KIND: &str = "Relay";

/// A function config document:
///
/// ```yaml
/// apiVersion: yamlrelay.io/v1alpha1
/// kind: Relay
/// metadata:
///   name: relay
/// spec:
///   replacements:
///     - sources:
///         - selector: {kind: ConfigMap, name: settings}
///           name: $cfg
///       targets:
///         - selector: {kind: Deployment}
///           expressions:
///             - '.spec.replicas = ($cfg.data.replicas | tonumber)'
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionConfig {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub metadata: ConfigMeta,
    #[serde(default)]
    pub spec: ConfigSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigMeta {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigSpec {
    #[serde(default)]
    pub replacements: Vec<Replacement>,
}

impl FunctionConfig {
    pub fn replacements(&self) -> &[Replacement] {
        &self.spec.replacements
    }
}

/// One rule: read from the sources, rewrite the targets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Replacement {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Source>,
    /// Single-source shorthand; resolved before `sources`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    #[serde(default)]
    pub targets: Vec<Target>,
}

impl Replacement {
    pub fn new(sources: Vec<Source>, targets: Vec<Target>) -> Self {
        Self {
            sources,
            source: None,
            targets,
        }
    }

    /// The shorthand source, if any, followed by `sources`.
    pub fn all_sources(&self) -> impl Iterator<Item = &Source> {
        self.source.iter().chain(self.sources.iter())
    }
}

/// A document to read from, bound under a variable name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Source {
    #[serde(default)]
    pub selector: Selector,
    /// Explicit binding name; defaults to the source document's name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

impl Source {
    pub fn new(selector: Selector) -> Self {
        Self {
            selector,
            name: String::new(),
        }
    }

    pub fn named(selector: Selector, name: &str) -> Self {
        Self {
            selector,
            name: name.to_string(),
        }
    }

    pub fn explicit_name(&self) -> Option<&str> {
        let trimmed = self.name.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    }
}

/// Documents to rewrite, and the expressions to rewrite them with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Target {
    #[serde(default)]
    pub selector: Selector,
    #[serde(default)]
    pub expressions: Vec<String>,
}

impl Target {
    pub fn new(selector: Selector, expressions: &[&str]) -> Self {
        Self {
            selector,
            expressions: expressions.iter().map(|e| e.to_string()).collect(),
        }
    }
}
