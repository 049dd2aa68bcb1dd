//! Resolution of rule sources to exactly one document each.

use super::environment::{binding_name, Environment, ResolvedSource};
use super::error::EngineError;
use crate::document::{Document, Value};
use crate::query::{Bindings, Evaluator};
use crate::selector::{select, CompiledSelector, Selector};

/// A source with its selector and predicate compiled.
#[derive(Debug)]
pub struct CompiledSource<Q> {
    pub selector: Selector,
    pub matcher: CompiledSelector,
    pub predicate: Option<Q>,
    /// Normalized explicit binding name.
    pub binding: Option<String>,
}

pub struct SourceResolver<'a, E: Evaluator> {
    evaluator: &'a E,
    default_namespace: &'a str,
}

impl<'a, E: Evaluator> SourceResolver<'a, E> {
    pub fn new(evaluator: &'a E, default_namespace: &'a str) -> Self {
        Self {
            evaluator,
            default_namespace,
        }
    }

    /// Resolves every source of a rule and builds its environment.
    pub fn resolve_all(
        &self,
        rule: usize,
        sources: &[CompiledSource<E::Query>],
        documents: &[Document],
    ) -> Result<Environment, EngineError> {
        let resolved = sources
            .iter()
            .map(|source| self.resolve(rule, source, documents))
            .collect::<Result<Vec<_>, _>>()?;
        Environment::build(rule, resolved)
    }

    /// Picks the one document a source refers to.
    ///
    /// Without a predicate exactly one document must match the selector.
    /// With one, the first candidate whose predicate yields `true` wins;
    /// when none does the result is [`EngineError::NoSourceMatched`].
    pub fn resolve(
        &self,
        rule: usize,
        source: &CompiledSource<E::Query>,
        documents: &[Document],
    ) -> Result<ResolvedSource, EngineError> {
        let candidates = select(&source.matcher, documents, self.default_namespace)
            .map_err(|e| EngineError::Selector { rule, source: e })?;

        let index = match &source.predicate {
            None => match candidates.as_slice() {
                [only] => *only,
                _ => {
                    return Err(EngineError::AmbiguousSource {
                        rule,
                        selector: source.selector.to_string(),
                        candidates: candidates.len(),
                    })
                }
            },
            Some(predicate) => self
                .first_satisfying(rule, source, predicate, &candidates, documents)?
                .ok_or_else(|| EngineError::NoSourceMatched {
                    rule,
                    selector: source.selector.to_string(),
                    predicate: source.selector.predicate.clone(),
                })?,
        };

        let document = &documents[index];
        let binding = match &source.binding {
            Some(explicit) => explicit.clone(),
            None => binding_name(document.name()),
        };
        log::debug!(
            "replacements[{}]: bound {} to {}",
            rule,
            binding,
            document.res_id()
        );

        Ok(ResolvedSource {
            binding,
            index,
            content: document.map_view().clone(),
        })
    }

    fn first_satisfying(
        &self,
        rule: usize,
        source: &CompiledSource<E::Query>,
        predicate: &E::Query,
        candidates: &[usize],
        documents: &[Document],
    ) -> Result<Option<usize>, EngineError> {
        let no_bindings = Bindings::new();
        for &idx in candidates {
            let document = &documents[idx];
            let verdict = self
                .evaluator
                .run(predicate, document.map_view(), &no_bindings)
                .map_err(|e| EngineError::Evaluation {
                    rule,
                    expression: source.selector.predicate.clone(),
                    document: document.res_id().to_string(),
                    source: e,
                })?;
            if verdict == Some(Value::Boolean(true)) {
                return Ok(Some(idx));
            }
        }
        Ok(None)
    }
}
