//! Error taxonomy for the replacement engine.

use crate::query::QueryError;
use crate::selector::SelectorError;
use thiserror::Error;

/// Errors raised while compiling or applying replacements.
///
/// `rule` is the zero-based position of the replacement in its list.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// A predicate or target expression failed to parse.
    #[error("replacements[{rule}]: unable to parse expression '{expression}': {source}")]
    Parse {
        rule: usize,
        expression: String,
        source: QueryError,
    },

    /// A selector pattern or label/annotation selector is malformed.
    #[error("replacements[{rule}]: {source}")]
    Selector { rule: usize, source: SelectorError },

    /// A source without a predicate did not match exactly one document.
    #[error(
        "replacements[{rule}]: unable to determine source document for selector {selector}: \
         {candidates} documents matched and no predicate was given"
    )]
    AmbiguousSource {
        rule: usize,
        selector: String,
        candidates: usize,
    },

    /// No candidate satisfied a source predicate. The rule is skipped.
    #[error("replacements[{rule}]: no source document for selector {selector} satisfies '{predicate}'")]
    NoSourceMatched {
        rule: usize,
        selector: String,
        predicate: String,
    },

    #[error("replacements[{rule}]: expression '{expression}' failed on {document}: {source}")]
    Evaluation {
        rule: usize,
        expression: String,
        document: String,
        source: QueryError,
    },

    /// The result of a target expression cannot become a document.
    #[error("replacements[{rule}]: expression '{expression}' on {document} {message}")]
    Shape {
        rule: usize,
        expression: String,
        document: String,
        message: String,
    },

    #[error("replacements[{rule}]: {message}")]
    Configuration { rule: usize, message: String },
}

impl EngineError {
    /// Everything except [`EngineError::NoSourceMatched`] aborts the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, EngineError::NoSourceMatched { .. })
    }

    /// Position of the offending replacement.
    pub fn rule(&self) -> usize {
        match self {
            EngineError::Parse { rule, .. }
            | EngineError::Selector { rule, .. }
            | EngineError::AmbiguousSource { rule, .. }
            | EngineError::NoSourceMatched { rule, .. }
            | EngineError::Evaluation { rule, .. }
            | EngineError::Shape { rule, .. }
            | EngineError::Configuration { rule, .. } => *rule,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_no_source_matched_is_non_fatal() {
        let skipped = EngineError::NoSourceMatched {
            rule: 0,
            selector: "{}".to_string(),
            predicate: "false".to_string(),
        };
        assert!(!skipped.is_fatal());

        let ambiguous = EngineError::AmbiguousSource {
            rule: 2,
            selector: "{kind=ConfigMap}".to_string(),
            candidates: 0,
        };
        assert!(ambiguous.is_fatal());
        assert_eq!(ambiguous.rule(), 2);
    }

    #[test]
    fn test_messages_name_the_offender() {
        let err = EngineError::Parse {
            rule: 1,
            expression: ".a |".to_string(),
            source: QueryError::Syntax {
                position: 4,
                expected: "term".to_string(),
                found: "end of input".to_string(),
            },
        };
        assert_eq!(
            err.to_string(),
            "replacements[1]: unable to parse expression '.a |': syntax error at position 4: expected term, found end of input"
        );
    }
}
