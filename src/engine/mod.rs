//! The replacement engine.
//!
//! For every rule, in order:
//!
//! 1. each source resolves to exactly one document and is bound under a
//!    normalized `$name` ([`source`], [`environment`]);
//! 2. each target selects the documents to rewrite ([`target`]);
//! 3. every expression of the target runs against the document's current
//!    content with the rule's bindings, and its output replaces the
//!    document's content in place.
//!
//! Documents are addressed by index and never added, removed or reordered.
//! A later rule sees the rewrites made by earlier ones.
//!
//! # Example
//!
//! ```
//! use yamlrelay::document::parser::parse_documents;
//! use yamlrelay::document::Value;
//! use yamlrelay::engine::{ReplacementEngine, Replacement, Source, Target};
//! use yamlrelay::selector::Selector;
//!
//! let docs = parse_documents(
//!     "kind: Config\nmetadata: {name: c}\nspec: {replicas: 3}\n---\n\
//!      kind: Deployment\nmetadata: {name: d}\nspec: {replicas: 1}\n",
//! )
//! .unwrap();
//!
//! let rule = Replacement::new(
//!     vec![Source::new(Selector::default().with_kind("Config").with_name("c"))],
//!     vec![Target::new(
//!         Selector::default().with_kind("Deployment").with_name("d"),
//!         &[".spec.replicas = $c.spec.replicas"],
//!     )],
//! );
//!
//! let out = ReplacementEngine::new().apply(docs, &[rule]).unwrap();
//! assert_eq!(out[1].map_view().pointer(["spec", "replicas"]), Some(&Value::from(3)));
//! ```

pub mod environment;
pub mod error;
pub mod rule;
pub mod source;
pub mod target;

pub use environment::{binding_name, Environment, ResolvedSource};
pub use error::EngineError;
pub use rule::{FunctionConfig, Replacement, Source, Target};
pub use source::{CompiledSource, SourceResolver};
pub use target::{CompiledTarget, TargetResolver};

use crate::document::resid::DEFAULT_NAMESPACE;
use crate::document::Document;
use crate::query::{Evaluator, JqEvaluator};
use crate::selector::{CompiledSelector, Selector};
use std::collections::HashMap;

/// A rule with every selector and expression compiled.
#[derive(Debug)]
pub struct CompiledRule<Q> {
    pub index: usize,
    pub sources: Vec<CompiledSource<Q>>,
    pub targets: Vec<CompiledTarget<Q>>,
}

/// What a run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub rules_applied: usize,
    /// Rules skipped because no source satisfied its predicate.
    pub rules_skipped: usize,
    /// Expression results written back into documents.
    pub rewrites: usize,
}

pub struct ReplacementEngine<E: Evaluator = JqEvaluator> {
    evaluator: E,
    default_namespace: String,
}

impl ReplacementEngine<JqEvaluator> {
    pub fn new() -> Self {
        Self::with_evaluator(JqEvaluator::new())
    }
}

impl Default for ReplacementEngine<JqEvaluator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Evaluator> ReplacementEngine<E> {
    pub fn with_evaluator(evaluator: E) -> Self {
        Self {
            evaluator,
            default_namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }

    /// Namespace that documents without one (or with `default`) are
    /// matched in.
    pub fn default_namespace(mut self, namespace: &str) -> Self {
        self.default_namespace = namespace.to_string();
        self
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Validates and compiles rules without touching any document.
    pub fn compile(&self, rules: &[Replacement]) -> Result<Vec<CompiledRule<E::Query>>, EngineError> {
        rules
            .iter()
            .enumerate()
            .map(|(index, rule)| self.compile_rule(index, rule))
            .collect()
    }

    fn compile_rule(&self, index: usize, rule: &Replacement) -> Result<CompiledRule<E::Query>, EngineError> {
        let configuration = |message: String| EngineError::Configuration { rule: index, message };

        if rule.all_sources().next().is_none() {
            return Err(configuration("at least one source is required".to_string()));
        }
        if rule.targets.is_empty() {
            return Err(configuration("at least one target is required".to_string()));
        }

        let mut explicit_names: HashMap<String, usize> = HashMap::new();
        let mut sources = Vec::new();
        for (pos, source) in rule.all_sources().enumerate() {
            let binding = source.explicit_name().map(binding_name);
            if let Some(name) = &binding {
                if let Some(first) = explicit_names.insert(name.clone(), pos) {
                    return Err(configuration(format!(
                        "sources {} and {} both bind {}",
                        first, pos, name
                    )));
                }
            }
            sources.push(CompiledSource {
                selector: source.selector.clone(),
                matcher: self.compile_selector(index, &source.selector)?,
                predicate: self.compile_predicate(index, &source.selector)?,
                binding,
            });
        }

        let mut targets = Vec::new();
        for (pos, target) in rule.targets.iter().enumerate() {
            if target.expressions.is_empty() {
                return Err(configuration(format!("target {} has no expressions", pos)));
            }
            let expressions = target
                .expressions
                .iter()
                .map(|text| self.parse(index, text).map(|query| (text.clone(), query)))
                .collect::<Result<Vec<_>, _>>()?;
            targets.push(CompiledTarget {
                selector: target.selector.clone(),
                matcher: self.compile_selector(index, &target.selector)?,
                predicate: self.compile_predicate(index, &target.selector)?,
                expressions,
            });
        }

        Ok(CompiledRule {
            index,
            sources,
            targets,
        })
    }

    fn compile_selector(&self, rule: usize, selector: &Selector) -> Result<CompiledSelector, EngineError> {
        CompiledSelector::compile(selector).map_err(|e| EngineError::Selector { rule, source: e })
    }

    fn compile_predicate(&self, rule: usize, selector: &Selector) -> Result<Option<E::Query>, EngineError> {
        selector
            .predicate()
            .map(|predicate| self.parse(rule, predicate))
            .transpose()
    }

    fn parse(&self, rule: usize, expression: &str) -> Result<E::Query, EngineError> {
        self.evaluator
            .parse(expression)
            .map_err(|e| EngineError::Parse {
                rule,
                expression: expression.to_string(),
                source: e,
            })
    }

    /// Applies `rules` to `documents` and returns the same documents,
    /// rewritten.
    pub fn apply(&self, mut documents: Vec<Document>, rules: &[Replacement]) -> Result<Vec<Document>, EngineError> {
        self.apply_in_place(&mut documents, rules)?;
        Ok(documents)
    }

    /// Like [`ReplacementEngine::apply`], rewriting the slice in place.
    ///
    /// Every rule is compiled before the first document is touched. After a
    /// fatal error the documents are left in an unspecified state.
    pub fn apply_in_place(&self, documents: &mut [Document], rules: &[Replacement]) -> Result<Summary, EngineError> {
        let compiled = self.compile(rules)?;
        self.apply_compiled(documents, &compiled)
    }

    pub fn apply_compiled(
        &self,
        documents: &mut [Document],
        rules: &[CompiledRule<E::Query>],
    ) -> Result<Summary, EngineError> {
        let sources = SourceResolver::new(&self.evaluator, &self.default_namespace);
        let targets = TargetResolver::new(&self.evaluator, &self.default_namespace);
        let mut summary = Summary::default();

        for rule in rules {
            log::debug!(
                "replacements[{}]: resolving {} source(s)",
                rule.index,
                rule.sources.len()
            );
            let environment = match sources.resolve_all(rule.index, &rule.sources, documents) {
                Ok(environment) => environment,
                Err(e) if !e.is_fatal() => {
                    log::info!("{}; skipping", e);
                    summary.rules_skipped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            for target in &rule.targets {
                let selected = targets.resolve(rule.index, target, documents, &environment)?;
                if selected.is_empty() {
                    log::warn!(
                        "replacements[{}]: target selector {} matched no documents",
                        rule.index,
                        target.selector
                    );
                }
                for idx in selected {
                    summary.rewrites += self.rewrite(rule.index, target, &mut documents[idx], &environment)?;
                }
            }
            summary.rules_applied += 1;
        }

        Ok(summary)
    }

    /// Runs every expression of `target` against `document` in order.
    fn rewrite(
        &self,
        rule: usize,
        target: &CompiledTarget<E::Query>,
        document: &mut Document,
        environment: &Environment,
    ) -> Result<usize, EngineError> {
        for (text, query) in &target.expressions {
            let id = document.res_id().to_string();
            log::debug!("replacements[{}]: applying '{}' to {}", rule, text, id);

            let shape = |message: String| EngineError::Shape {
                rule,
                expression: text.clone(),
                document: id.clone(),
                message,
            };
            let output = self
                .evaluator
                .run(query, document.map_view(), environment.bindings())
                .map_err(|e| EngineError::Evaluation {
                    rule,
                    expression: text.clone(),
                    document: id.clone(),
                    source: e,
                })?
                .ok_or_else(|| shape("produced no output".to_string()))?;
            document
                .replace_content(output)
                .map_err(|e| shape(format!("did not produce a document: {}", e)))?;
        }
        Ok(target.expressions.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parser::parse_documents;
    use crate::document::Value;

    fn batch() -> Vec<Document> {
        parse_documents(
            r#"
apiVersion: v1
kind: ConfigMap
metadata:
  name: settings
  labels: {role: primary}
data:
  replicas: "4"
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: fallback
  labels: {role: secondary}
data:
  replicas: "2"
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
spec:
  replicas: 1
"#,
        )
        .unwrap()
    }

    fn set_replicas(source: Source) -> Replacement {
        Replacement::new(
            vec![source],
            vec![Target::new(
                Selector::default().with_kind("Deployment"),
                &[".spec.replicas = ($cm.data.replicas | tonumber)"],
            )],
        )
    }

    fn replicas(docs: &[Document]) -> Option<&Value> {
        docs[2].map_view().pointer(["spec", "replicas"])
    }

    #[test]
    fn test_source_resolved_by_predicate() {
        let source = Source::named(
            Selector::default()
                .with_kind("ConfigMap")
                .with_predicate(".metadata.labels.role == \"secondary\""),
            "cm",
        );
        let out = ReplacementEngine::new().apply(batch(), &[set_replicas(source)]).unwrap();
        assert_eq!(replicas(&out), Some(&Value::from(2)));
    }

    #[test]
    fn test_predicate_must_be_boolean_true() {
        let source = Source::named(
            Selector::default().with_kind("ConfigMap").with_predicate(".data.replicas"),
            "cm",
        );
        let mut docs = batch();
        let summary = ReplacementEngine::new()
            .apply_in_place(&mut docs, &[set_replicas(source)])
            .unwrap();
        assert_eq!(summary.rules_skipped, 1);
        assert_eq!(summary.rewrites, 0);
        assert_eq!(docs, batch());
    }

    #[test]
    fn test_ambiguous_source_is_fatal() {
        let source = Source::named(Selector::default().with_kind("ConfigMap"), "cm");
        let err = ReplacementEngine::new().apply(batch(), &[set_replicas(source)]).unwrap_err();
        assert!(matches!(err, EngineError::AmbiguousSource { candidates: 2, .. }));
    }

    #[test]
    fn test_label_selector_disambiguates() {
        let source = Source::named(
            Selector::default().with_kind("ConfigMap").with_labels("role=primary"),
            "cm",
        );
        let out = ReplacementEngine::new().apply(batch(), &[set_replicas(source)]).unwrap();
        assert_eq!(replicas(&out), Some(&Value::from(4)));
    }

    #[test]
    fn test_compile_rejects_missing_parts() {
        let engine = ReplacementEngine::new();

        let no_sources = Replacement::new(vec![], vec![Target::new(Selector::default(), &["."])]);
        assert!(matches!(
            engine.compile(&[no_sources]),
            Err(EngineError::Configuration { rule: 0, .. })
        ));

        let no_expressions = Replacement::new(
            vec![Source::new(Selector::default())],
            vec![Target::new(Selector::default(), &[])],
        );
        assert!(matches!(
            engine.compile(&[no_expressions]),
            Err(EngineError::Configuration { .. })
        ));
    }

    #[test]
    fn test_compile_rejects_duplicate_explicit_names() {
        let rule = Replacement::new(
            vec![
                Source::named(Selector::default().with_name("a"), "My-Cm"),
                Source::named(Selector::default().with_name("b"), "$my_cm"),
            ],
            vec![Target::new(Selector::default(), &["."])],
        );
        let err = ReplacementEngine::new().compile(&[rule]).unwrap_err();
        assert_eq!(err.to_string(), "replacements[0]: sources 0 and 1 both bind $my_cm");
    }

    #[test]
    fn test_compile_reports_bad_expressions_and_patterns() {
        let engine = ReplacementEngine::new();
        let bad_expression = set_replicas(Source::new(Selector::default().with_name("settings")));
        let mut rules = vec![bad_expression.clone()];
        rules[0].targets[0].expressions.push(".spec |".to_string());
        assert!(matches!(engine.compile(&rules), Err(EngineError::Parse { .. })));

        let bad_pattern = set_replicas(Source::new(Selector::default().with_kind("Config[")));
        assert!(matches!(
            engine.compile(&[bad_expression, bad_pattern]),
            Err(EngineError::Selector { rule: 1, .. })
        ));
    }

    #[test]
    fn test_shorthand_source_is_bound_first() {
        let mut rule = set_replicas(Source::named(Selector::default().with_name("fallback"), "other"));
        rule.source = Some(Source::named(Selector::default().with_name("settings"), "cm"));
        let out = ReplacementEngine::new().apply(batch(), &[rule]).unwrap();
        assert_eq!(replicas(&out), Some(&Value::from(4)));
    }
}
