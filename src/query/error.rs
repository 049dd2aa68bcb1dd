//! Error types for query parsing and evaluation.

use super::convert::from_val;
use crate::document::value::Value;
use jaq_core::compile::{self, Undefined};
use jaq_core::load::{self, span};
use thiserror::Error;

/// Errors that can occur while parsing or running a query.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// The query text is not valid jq.
    #[error("syntax error at position {position}: expected {expected}, found {found}")]
    Syntax {
        position: usize,
        expected: String,
        found: String,
    },

    /// The query tried to load a module.
    #[error("cannot load module {path}: {message}")]
    Module { path: String, message: String },

    #[error("{name}/{arity} is not defined")]
    UnknownFunction { name: String, arity: usize },

    #[error("{name} is not defined")]
    UnknownVariable { name: String },

    #[error("{kind} {name} is not defined")]
    Undefined { kind: &'static str, name: String },

    /// Raised while running, either by `error` or by a failing builtin.
    #[error("{}", raised_message(.0))]
    Raised(Value),
}

fn raised_message(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => format!("{} (not a string)", other),
    }
}

impl QueryError {
    /// True for errors detected before any evaluation.
    pub fn is_syntax(&self) -> bool {
        !matches!(self, QueryError::Raised(_))
    }

    pub(crate) fn runtime(err: jaq_core::Error<jaq_json::Val>) -> Self {
        QueryError::Raised(from_val(err.into_val()))
    }

    /// First error reported while lexing or parsing `code`.
    pub(crate) fn from_load(code: &str, errors: load::Errors<&str, ()>) -> Self {
        let unknown = || QueryError::Syntax {
            position: 0,
            expected: "query".to_string(),
            found: describe(""),
        };
        let Some((_, error)) = errors.into_iter().next() else {
            return unknown();
        };
        let syntax = |expected: &str, found: &str| QueryError::Syntax {
            position: span(code, found).start,
            expected: expected.to_string(),
            found: describe(found),
        };
        match error {
            load::Error::Lex(errs) => errs
                .first()
                .map_or_else(unknown, |(expect, found)| syntax(expect.as_str(), *found)),
            load::Error::Parse(errs) => errs
                .first()
                .map_or_else(unknown, |(expect, found)| syntax(expect.as_str(), *found)),
            load::Error::Io(errs) => errs.into_iter().next().map_or_else(unknown, |(path, message)| {
                QueryError::Module {
                    path: path.to_string(),
                    message,
                }
            }),
        }
    }

    /// First undefined symbol reported while compiling, skipping the
    /// ones `ignore` accepts.
    pub(crate) fn from_compile(
        errors: compile::Errors<&str, ()>,
        ignore: impl Fn(&Undefined) -> bool,
    ) -> Option<Self> {
        errors
            .into_iter()
            .flat_map(|(_, undefined)| undefined)
            .find(|(_, undefined)| !ignore(undefined))
            .map(|(name, undefined)| match undefined {
                Undefined::Filter(arity) => QueryError::UnknownFunction {
                    name: name.to_string(),
                    arity,
                },
                Undefined::Var => QueryError::UnknownVariable {
                    name: name.to_string(),
                },
                other => QueryError::Undefined {
                    kind: other.as_str(),
                    name: name.to_string(),
                },
            })
    }
}

/// Quotes the start of the unparsed rest of a query.
fn describe(rest: &str) -> String {
    let token: String = rest.lines().next().unwrap_or("").chars().take(16).collect();
    if token.is_empty() {
        "end of input".to_string()
    } else {
        format!("'{}'", token)
    }
}
