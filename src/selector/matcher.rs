use super::labels::LabelSelector;
use super::{Selector, SelectorError};
use crate::document::{Document, Gvk, StringMap};
use regex::Regex;

/// Structural matching primitives.
///
/// Each check may fail; a failure is an error, never a non-match.
pub trait StructuralMatcher {
    fn match_type(&self, gvk: &Gvk) -> Result<bool, SelectorError>;

    fn match_name(&self, name: &str) -> Result<bool, SelectorError>;

    /// `namespace` is the document's effective namespace.
    fn match_namespace(&self, namespace: &str) -> Result<bool, SelectorError>;

    fn match_labels(&self, labels: &StringMap) -> Result<bool, SelectorError>;

    fn match_annotations(&self, annotations: &StringMap) -> Result<bool, SelectorError>;

    /// All criteria at once, checked in order: type, name, namespace,
    /// labels, annotations.
    fn matches(&self, document: &Document, default_namespace: &str) -> Result<bool, SelectorError> {
        let id = document.res_id();
        Ok(self.match_type(&id.gvk)?
            && self.match_name(&id.name)?
            && self.match_namespace(id.effective_namespace_with(default_namespace))?
            && self.match_labels(&document.labels())?
            && self.match_annotations(&document.annotations())?)
    }
}

/// A [`Selector`] with its patterns compiled.
#[derive(Debug, Clone)]
pub struct CompiledSelector {
    group: Option<Regex>,
    version: Option<Regex>,
    kind: Option<Regex>,
    name: Option<Regex>,
    namespace: Option<Regex>,
    labels: LabelSelector,
    annotations: LabelSelector,
}

impl CompiledSelector {
    pub fn compile(selector: &Selector) -> Result<Self, SelectorError> {
        Ok(Self {
            group: anchored("group", &selector.group)?,
            version: anchored("version", &selector.version)?,
            kind: anchored("kind", &selector.kind)?,
            name: anchored("name", &selector.name)?,
            namespace: anchored("namespace", &selector.namespace)?,
            labels: LabelSelector::parse(&selector.label_selector)?,
            annotations: LabelSelector::parse(&selector.annotation_selector)?,
        })
    }
}

fn anchored(field: &'static str, pattern: &str) -> Result<Option<Regex>, SelectorError> {
    if pattern.is_empty() {
        return Ok(None);
    }
    Regex::new(&format!("^(?:{})$", pattern))
        .map(Some)
        .map_err(|e| SelectorError::InvalidPattern {
            field,
            pattern: pattern.to_string(),
            message: e.to_string(),
        })
}

fn is_match(regex: &Option<Regex>, text: &str) -> bool {
    regex.as_ref().map_or(true, |r| r.is_match(text))
}

impl StructuralMatcher for CompiledSelector {
    fn match_type(&self, gvk: &Gvk) -> Result<bool, SelectorError> {
        Ok(is_match(&self.group, &gvk.group)
            && is_match(&self.version, &gvk.version)
            && is_match(&self.kind, &gvk.kind))
    }

    fn match_name(&self, name: &str) -> Result<bool, SelectorError> {
        Ok(is_match(&self.name, name))
    }

    fn match_namespace(&self, namespace: &str) -> Result<bool, SelectorError> {
        Ok(is_match(&self.namespace, namespace))
    }

    fn match_labels(&self, labels: &StringMap) -> Result<bool, SelectorError> {
        Ok(self.labels.matches(labels))
    }

    fn match_annotations(&self, annotations: &StringMap) -> Result<bool, SelectorError> {
        Ok(self.annotations.matches(annotations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parser::parse_documents;
    use crate::selector::select;

    fn docs() -> Vec<Document> {
        parse_documents(
            r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
  labels:
    app: web
    tier: front
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: worker
  namespace: jobs
  annotations:
    team: batch
---
apiVersion: v1
kind: Namespace
metadata:
  name: jobs
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: web-config
  namespace: default
"#,
        )
        .unwrap()
    }

    fn indices(selector: Selector) -> Vec<usize> {
        let matcher = CompiledSelector::compile(&selector).unwrap();
        select(&matcher, &docs(), "default").unwrap()
    }

    #[test]
    fn test_empty_selector_matches_all() {
        assert_eq!(indices(Selector::default()), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_type_fields() {
        assert_eq!(indices(Selector::default().with_group("apps")), vec![0, 1]);
        assert_eq!(indices(Selector::default().with_group("")), vec![0, 1, 2, 3]);
        assert_eq!(indices(Selector::default().with_version("v1").with_kind("ConfigMap")), vec![3]);
        assert_eq!(indices(Selector::default().with_kind("Deploy")), Vec::<usize>::new());
    }

    #[test]
    fn test_name_patterns_are_anchored() {
        assert_eq!(indices(Selector::default().with_name("web")), vec![0]);
        assert_eq!(indices(Selector::default().with_name("web.*")), vec![0, 3]);
        assert_eq!(indices(Selector::default().with_name("w.*|jobs")), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_effective_namespace() {
        assert_eq!(indices(Selector::default().with_namespace("default")), vec![0, 3]);
        assert_eq!(indices(Selector::default().with_namespace("jobs")), vec![1]);
        assert_eq!(
            indices(Selector::default().with_namespace("_non_namespaceable_")),
            vec![2]
        );
    }

    #[test]
    fn test_custom_default_namespace() {
        let matcher = CompiledSelector::compile(&Selector::default().with_namespace("staging")).unwrap();
        assert_eq!(select(&matcher, &docs(), "staging").unwrap(), vec![0, 3]);
    }

    #[test]
    fn test_labels_and_annotations() {
        assert_eq!(indices(Selector::default().with_labels("app=web,tier")), vec![0]);
        assert_eq!(indices(Selector::default().with_labels("tier!=front")), vec![1, 2, 3]);
        assert_eq!(indices(Selector::default().with_annotations("team in (batch)")), vec![1]);
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        let err = CompiledSelector::compile(&Selector::default().with_name("web(")).unwrap_err();
        assert!(matches!(err, SelectorError::InvalidPattern { field: "name", .. }));
        assert!(err.to_string().contains("web("));

        let err = CompiledSelector::compile(&Selector::default().with_labels("a in (b")).unwrap_err();
        assert!(matches!(err, SelectorError::InvalidRequirement { .. }));
    }
}
