//! Variable environments built from resolved sources.

use super::error::EngineError;
use crate::document::Value;
use crate::query::Bindings;

/// Normalizes a binding name: lower-case, `-` and `.` become `_`, and the
/// `$` sigil is added when missing.
///
/// # Example
///
/// ```
/// use yamlrelay::engine::environment::binding_name;
///
/// assert_eq!(binding_name("Foo-Bar.Baz"), "$foo_bar_baz");
/// assert_eq!(binding_name("$custom"), "$custom");
/// ```
pub fn binding_name(name: &str) -> String {
    let mut normalized = name.to_lowercase().replace(['-', '.'], "_");
    if !normalized.starts_with('$') {
        normalized.insert(0, '$');
    }
    normalized
}

/// A source that resolved to a single document.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSource {
    /// Normalized binding name.
    pub binding: String,
    /// Position of the document in the batch.
    pub index: usize,
    /// Snapshot of the document's content at resolution time.
    pub content: Value,
}

/// Binding name to source content, for one rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    bindings: Bindings,
}

impl Environment {
    /// Aggregates resolved sources, rejecting two sources that bind the
    /// same name.
    pub fn build(rule: usize, resolved: Vec<ResolvedSource>) -> Result<Self, EngineError> {
        let mut bindings = Bindings::with_capacity(resolved.len());
        for source in resolved {
            if bindings.contains_key(&source.binding) {
                return Err(EngineError::Configuration {
                    rule,
                    message: format!("more than one source binds {}", source.binding),
                });
            }
            bindings.insert(source.binding, source.content);
        }
        Ok(Self { bindings })
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn get(&self, binding: &str) -> Option<&Value> {
        self.bindings.get(binding)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(binding: &str, index: usize) -> ResolvedSource {
        ResolvedSource {
            binding: binding.to_string(),
            index,
            content: Value::from(index as i64),
        }
    }

    #[test]
    fn test_binding_name_is_total() {
        assert_eq!(binding_name("Foo-Bar.Baz"), "$foo_bar_baz");
        assert_eq!(binding_name("custom"), "$custom");
        assert_eq!(binding_name("$FC"), "$fc");
        assert_eq!(binding_name(""), "$");
    }

    #[test]
    fn test_build_keeps_declaration_order() {
        let env = Environment::build(0, vec![resolved("$b", 1), resolved("$a", 0)]).unwrap();
        let names: Vec<&String> = env.bindings().keys().collect();
        assert_eq!(names, vec!["$b", "$a"]);
        assert_eq!(env.get("$a"), Some(&Value::from(0)));
        assert_eq!(env.len(), 2);
    }

    #[test]
    fn test_build_rejects_collisions() {
        let err = Environment::build(3, vec![resolved("$cm", 0), resolved("$cm", 1)]).unwrap_err();
        assert_eq!(
            err,
            EngineError::Configuration {
                rule: 3,
                message: "more than one source binds $cm".to_string()
            }
        );
    }
}
