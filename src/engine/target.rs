//! Resolution of rule targets to the documents they rewrite.

use super::environment::Environment;
use super::error::EngineError;
use crate::document::{Document, Value};
use crate::query::Evaluator;
use crate::selector::{select, CompiledSelector, Selector};

/// A target with its selector, predicate and expressions compiled.
#[derive(Debug)]
pub struct CompiledTarget<Q> {
    pub selector: Selector,
    pub matcher: CompiledSelector,
    pub predicate: Option<Q>,
    /// Source text and compiled form, in application order.
    pub expressions: Vec<(String, Q)>,
}

pub struct TargetResolver<'a, E: Evaluator> {
    evaluator: &'a E,
    default_namespace: &'a str,
}

impl<'a, E: Evaluator> TargetResolver<'a, E> {
    pub fn new(evaluator: &'a E, default_namespace: &'a str) -> Self {
        Self {
            evaluator,
            default_namespace,
        }
    }

    /// Every document the target applies to, in batch order.
    ///
    /// Any number of matches is valid. A predicate, when present, keeps the
    /// candidates for which it yields `true` with the rule's environment
    /// bound.
    pub fn resolve(
        &self,
        rule: usize,
        target: &CompiledTarget<E::Query>,
        documents: &[Document],
        environment: &Environment,
    ) -> Result<Vec<usize>, EngineError> {
        let candidates = select(&target.matcher, documents, self.default_namespace)
            .map_err(|e| EngineError::Selector { rule, source: e })?;

        let predicate = match &target.predicate {
            Some(predicate) => predicate,
            None => return Ok(candidates),
        };

        let mut selected = Vec::with_capacity(candidates.len());
        for idx in candidates {
            let document = &documents[idx];
            let verdict = self
                .evaluator
                .run(predicate, document.map_view(), environment.bindings())
                .map_err(|e| EngineError::Evaluation {
                    rule,
                    expression: target.selector.predicate.clone(),
                    document: document.res_id().to_string(),
                    source: e,
                })?;
            if verdict == Some(Value::Boolean(true)) {
                selected.push(idx);
            }
        }
        Ok(selected)
    }
}
