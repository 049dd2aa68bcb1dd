//! Query language used by rule predicates and target expressions.
//!
//! The engine only depends on the [`Evaluator`] trait. [`JqEvaluator`] is the
//! bundled implementation, backed by the jaq interpreter with its standard
//! library (`jaq-std`) and JSON builtins (`jaq-json`). `run` pulls only the
//! first output of a query, so later outputs are never evaluated.
//!
//! Bindings are exposed as global variables named `$name`. Because the set of
//! names is only known when a rule is applied, [`JqEvaluator::parse`] checks
//! syntax and function names up front and leaves variables unresolved; the
//! query is compiled against the actual binding names on first use and cached
//! per name set.
//!
//! Builtins that reach outside the query (`env`, `now`, `input`, `halt`,
//! `debug` and friends) are not available.
//!
//! # Examples
//!
//! ```
//! use yamlrelay::document::parser::parse_value;
//! use yamlrelay::query::{Bindings, Evaluator, JqEvaluator};
//!
//! let evaluator = JqEvaluator::new();
//! let query = evaluator.parse(".spec.replicas = $c.spec.replicas").unwrap();
//!
//! let mut bindings = Bindings::new();
//! bindings.insert("$c".to_string(), parse_value("spec: {replicas: 3}").unwrap());
//!
//! let input = parse_value("spec: {replicas: 1}").unwrap();
//! let output = evaluator.run(&query, &input, &bindings).unwrap().unwrap();
//! assert_eq!(output, parse_value("spec: {replicas: 3}").unwrap());
//! ```

mod builtins;
pub mod convert;
pub mod error;
mod escape;

pub use error::QueryError;

use crate::document::value::Value;
use convert::{from_val, to_val};
use indexmap::IndexMap;
use jaq_core::compile::Undefined;
use jaq_core::load::{Arena, File, Loader};
use jaq_core::{Compiler, Ctx, Native, RcIter};
use jaq_json::Val;
use log::trace;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Variable bindings visible to a query, keyed by `$name`.
pub type Bindings = IndexMap<String, Value>;

type Filter = jaq_core::Filter<Native<Val>>;

/// Builtins with side effects or dependence on the environment.
const IMPURE: &[&str] = &[
    "env",
    "now",
    "input",
    "inputs",
    "halt",
    "halt_error",
    "debug",
    "stderr",
];

/// Parses and runs queries.
///
/// Implementations must be pure: the same query, input and bindings always
/// produce the same result.
pub trait Evaluator {
    /// A parsed, reusable query.
    type Query;

    fn parse(&self, source: &str) -> Result<Self::Query, QueryError>;

    /// Runs a query; `Ok(None)` means the query produced no output.
    fn run(
        &self,
        query: &Self::Query,
        input: &Value,
        bindings: &Bindings,
    ) -> Result<Option<Value>, QueryError>;
}

/// A parsed query together with its compiled filters.
pub struct CompiledQuery {
    source: String,
    code: String,
    filters: RefCell<HashMap<Vec<String>, Rc<Filter>>>,
}

impl fmt::Debug for CompiledQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledQuery")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl CompiledQuery {
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Runs the query and returns every output.
    pub fn run_all(&self, input: &Value, bindings: &Bindings) -> Result<Vec<Value>, QueryError> {
        let filter = self.filter(bindings)?;
        let inputs = RcIter::new(core::iter::empty());
        let ctx = Ctx::new(bindings.values().map(to_val), &inputs);
        let outputs = filter
            .run((ctx, to_val(input)))
            .map(|out| out.map(from_val).map_err(QueryError::runtime))
            .collect();
        outputs
    }

    /// Runs the query up to its first output.
    pub fn run_first(&self, input: &Value, bindings: &Bindings) -> Result<Option<Value>, QueryError> {
        let filter = self.filter(bindings)?;
        let inputs = RcIter::new(core::iter::empty());
        let ctx = Ctx::new(bindings.values().map(to_val), &inputs);
        let first = filter.run((ctx, to_val(input))).next();
        first
            .transpose()
            .map(|out| out.map(from_val))
            .map_err(QueryError::runtime)
    }

    /// Filter compiled for the names in `bindings`, in binding order.
    fn filter(&self, bindings: &Bindings) -> Result<Rc<Filter>, QueryError> {
        let names: Vec<String> = bindings.keys().cloned().collect();
        if let Some(filter) = self.filters.borrow().get(&names) {
            return Ok(Rc::clone(filter));
        }

        trace!("compiling '{}' for {:?}", self.source, names);
        let vars: Vec<&str> = names.iter().map(String::as_str).collect();
        let filter = compile(&self.code, &vars, |_| false)?
            .map(Rc::new)
            .ok_or_else(|| QueryError::Undefined {
                kind: "query",
                name: self.source.clone(),
            })?;
        self.filters.borrow_mut().insert(names, Rc::clone(&filter));
        Ok(filter)
    }
}

/// Loads and compiles `code` with the given global variables.
///
/// Returns `Ok(None)` when compiling failed only on errors `ignore` accepts.
fn compile(
    code: &str,
    vars: &[&str],
    ignore: impl Fn(&Undefined) -> bool,
) -> Result<Option<Filter>, QueryError> {
    let arena = Arena::default();
    let keep = |name: &str| !IMPURE.contains(&name) && !builtins::SHADOWED.contains(&name);
    let defs = jaq_std::defs()
        .chain(jaq_json::defs())
        .filter(|def| keep(def.name));
    let modules = Loader::new(defs)
        .load(&arena, File { code, path: () })
        .map_err(|errs| QueryError::from_load(code, errs))?;

    let funs = jaq_std::funs()
        .chain(jaq_json::funs())
        .filter(|(name, _, _)| keep(*name))
        .chain(builtins::funs());
    let compiled = Compiler::default()
        .with_funs(funs)
        .with_global_vars(vars.iter().copied())
        .compile(modules);
    match compiled {
        Ok(filter) => Ok(Some(filter)),
        Err(errs) => QueryError::from_compile(errs, ignore).map_or(Ok(None), Err),
    }
}

/// The bundled jq evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct JqEvaluator;

impl JqEvaluator {
    pub fn new() -> Self {
        JqEvaluator
    }
}

impl Evaluator for JqEvaluator {
    type Query = CompiledQuery;

    /// Parses `source`, rejecting syntax errors and calls to functions that
    /// do not exist. Variables are resolved when the query runs.
    fn parse(&self, source: &str) -> Result<CompiledQuery, QueryError> {
        let code = escape::combine_surrogates(source).into_owned();

        let mut filters = HashMap::new();
        if let Some(filter) = compile(&code, &[], |undefined| {
            matches!(undefined, Undefined::Var)
        })? {
            filters.insert(Vec::new(), Rc::new(filter));
        }

        Ok(CompiledQuery {
            source: source.to_string(),
            code,
            filters: RefCell::new(filters),
        })
    }

    fn run(
        &self,
        query: &CompiledQuery,
        input: &Value,
        bindings: &Bindings,
    ) -> Result<Option<Value>, QueryError> {
        query.run_first(input, bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parser::parse_value;

    #[test]
    fn test_parse_rejects_unknown_function() {
        let err = JqEvaluator::new().parse(".a | frobnicate(1)").unwrap_err();
        assert_eq!(
            err,
            QueryError::UnknownFunction {
                name: "frobnicate".to_string(),
                arity: 1
            }
        );
        assert!(err.is_syntax());
    }

    #[test]
    fn test_parse_rejects_impure_builtins() {
        for source in ["env", "now", "input", "halt_error(1)", "debug"] {
            let err = JqEvaluator::new().parse(source).unwrap_err();
            assert!(
                matches!(err, QueryError::UnknownFunction { .. }),
                "{}: {:?}",
                source,
                err
            );
        }
    }

    #[test]
    fn test_parse_leaves_variables_for_run() {
        let evaluator = JqEvaluator::new();
        let query = evaluator.parse("$c.name").unwrap();

        let err = evaluator.run(&query, &Value::Null, &Bindings::new()).unwrap_err();
        assert_eq!(
            err,
            QueryError::UnknownVariable {
                name: "$c".to_string()
            }
        );

        let mut bindings = Bindings::new();
        bindings.insert("$c".to_string(), parse_value("name: web").unwrap());
        let out = evaluator.run(&query, &Value::Null, &bindings).unwrap();
        assert_eq!(out, Some(Value::from("web")));
    }

    #[test]
    fn test_bindings_are_matched_by_name() {
        let evaluator = JqEvaluator::new();
        let query = evaluator.parse("[$a, $b]").unwrap();

        let mut forward = Bindings::new();
        forward.insert("$a".to_string(), Value::from(1));
        forward.insert("$b".to_string(), Value::from(2));
        let mut backward = Bindings::new();
        backward.insert("$b".to_string(), Value::from(2));
        backward.insert("$a".to_string(), Value::from(1));

        let expected = Some(parse_value("[1, 2]").unwrap());
        assert_eq!(evaluator.run(&query, &Value::Null, &forward).unwrap(), expected);
        assert_eq!(evaluator.run(&query, &Value::Null, &backward).unwrap(), expected);
        assert_eq!(query.filters.borrow().len(), 2);
    }

    #[test]
    fn test_run_returns_first_output() {
        let evaluator = JqEvaluator::new();
        let query = evaluator.parse(".[]").unwrap();
        let input = parse_value("[a, b]").unwrap();
        let out = evaluator.run(&query, &input, &Bindings::new()).unwrap();
        assert_eq!(out, Some(Value::from("a")));
    }

    #[test]
    fn test_run_stops_before_later_errors() {
        let evaluator = JqEvaluator::new();
        let query = evaluator.parse(r#".a, error("late")"#).unwrap();
        let input = parse_value("a: 1").unwrap();

        let out = evaluator.run(&query, &input, &Bindings::new()).unwrap();
        assert_eq!(out, Some(Value::from(1)));
        assert_eq!(
            query.run_all(&input, &Bindings::new()).unwrap_err(),
            QueryError::Raised(Value::from("late"))
        );
    }

    #[test]
    fn test_run_with_no_output() {
        let evaluator = JqEvaluator::new();
        let query = evaluator.parse("empty").unwrap();
        let out = evaluator.run(&query, &Value::Null, &Bindings::new()).unwrap();
        assert_eq!(out, None);
    }

    #[test]
    fn test_compiled_query_keeps_source() {
        let query = JqEvaluator::new().parse(".a == 1").unwrap();
        assert_eq!(query.source(), ".a == 1");
        assert!(format!("{:?}", query).contains(".a == 1"));
    }
}
