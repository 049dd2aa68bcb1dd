//! Kubernetes-style label and annotation selectors.
//!
//! A selector is a comma-separated list of requirements, all of which must
//! hold:
//!
//! - `key` / `!key` - the key exists / does not exist
//! - `key=value`, `key==value` - the key exists with that value
//! - `key!=value` - the key is absent or has another value
//! - `key in (a, b)` - the key exists with one of the values
//! - `key notin (a, b)` - the key is absent or has none of the values
//!
//! # Example
//!
//! ```
//! use yamlrelay::selector::labels::LabelSelector;
//! use yamlrelay::document::StringMap;
//!
//! let selector = LabelSelector::parse("app=web, tier in (front, edge), !legacy").unwrap();
//!
//! let mut labels = StringMap::new();
//! labels.insert("app".to_string(), "web".to_string());
//! labels.insert("tier".to_string(), "edge".to_string());
//! assert!(selector.matches(&labels));
//!
//! labels.insert("legacy".to_string(), "true".to_string());
//! assert!(!selector.matches(&labels));
//! ```

use super::SelectorError;
use crate::document::StringMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Exists,
    DoesNotExist,
    Equals,
    NotEquals,
    In,
    NotIn,
}

/// One requirement of a selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub key: String,
    pub operator: Operator,
    pub values: Vec<String>,
}

impl Requirement {
    pub fn matches(&self, labels: &StringMap) -> bool {
        let value = labels.get(&self.key);
        match self.operator {
            Operator::Exists => value.is_some(),
            Operator::DoesNotExist => value.is_none(),
            Operator::Equals | Operator::In => value.is_some_and(|v| self.values.contains(v)),
            Operator::NotEquals | Operator::NotIn => !value.is_some_and(|v| self.values.contains(v)),
        }
    }
}

/// A parsed selector; the empty selector matches everything.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LabelSelector {
    requirements: Vec<Requirement>,
}

impl LabelSelector {
    pub fn parse(selector: &str) -> Result<Self, SelectorError> {
        let invalid = |message: String| SelectorError::InvalidRequirement {
            selector: selector.to_string(),
            message,
        };

        if selector.trim().is_empty() {
            return Ok(Self::default());
        }

        let mut requirements = Vec::new();
        for term in split_terms(selector).map_err(invalid)? {
            requirements.push(parse_requirement(term).map_err(invalid)?);
        }
        Ok(Self { requirements })
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    pub fn matches(&self, labels: &StringMap) -> bool {
        self.requirements.iter().all(|r| r.matches(labels))
    }
}

/// Splits on commas that are not inside a value list.
fn split_terms(selector: &str) -> Result<Vec<&str>, String> {
    let mut terms = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (idx, ch) in selector.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| "unbalanced ')'".to_string())?;
            }
            ',' if depth == 0 => {
                terms.push(selector[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err("unbalanced '('".to_string());
    }
    terms.push(selector[start..].trim());

    if terms.iter().any(|t| t.is_empty()) {
        return Err("empty requirement".to_string());
    }
    Ok(terms)
}

fn parse_requirement(term: &str) -> Result<Requirement, String> {
    if let Some(key) = term.strip_prefix('!') {
        return requirement(key.trim(), Operator::DoesNotExist, Vec::new());
    }

    if let Some(open) = term.find('(') {
        let close = term
            .rfind(')')
            .filter(|close| *close == term.len() - 1)
            .ok_or_else(|| format!("'{}' must end with ')'", term))?;
        let head: Vec<&str> = term[..open].split_whitespace().collect();
        let operator = match head.as_slice() {
            [_, "in"] => Operator::In,
            [_, "notin"] => Operator::NotIn,
            _ => return Err(format!("expected 'key in (...)' or 'key notin (...)', got '{}'", term)),
        };
        let values = term[open + 1..close]
            .split(',')
            .map(|v| v.trim().to_string())
            .collect::<Vec<_>>();
        if values.iter().any(String::is_empty) {
            return Err(format!("empty value in '{}'", term));
        }
        return requirement(head[0], operator, values);
    }

    let (key, operator, value) = if let Some((k, v)) = term.split_once("!=") {
        (k, Operator::NotEquals, v)
    } else if let Some((k, v)) = term.split_once("==") {
        (k, Operator::Equals, v)
    } else if let Some((k, v)) = term.split_once('=') {
        (k, Operator::Equals, v)
    } else {
        return requirement(term, Operator::Exists, Vec::new());
    };
    requirement(key.trim(), operator, vec![value.trim().to_string()])
}

fn requirement(key: &str, operator: Operator, values: Vec<String>) -> Result<Requirement, String> {
    if !is_valid_key(key) {
        return Err(format!("invalid key '{}'", key));
    }
    if let Some(bad) = values.iter().find(|v| !is_valid_value(v)) {
        return Err(format!("invalid value '{}' for key '{}'", bad, key));
    }
    Ok(Requirement {
        key: key.to_string(),
        operator,
        values,
    })
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/'))
}

fn is_valid_value(value: &str) -> bool {
    value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> StringMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_empty_selector_matches_everything() {
        let selector = LabelSelector::parse("  ").unwrap();
        assert!(selector.is_empty());
        assert!(selector.matches(&StringMap::new()));
    }

    #[test]
    fn test_equality_forms() {
        let l = labels(&[("app", "web")]);
        assert!(LabelSelector::parse("app=web").unwrap().matches(&l));
        assert!(LabelSelector::parse("app == web").unwrap().matches(&l));
        assert!(!LabelSelector::parse("app=db").unwrap().matches(&l));
    }

    #[test]
    fn test_negative_forms_match_absent_keys() {
        let l = labels(&[("app", "web")]);
        assert!(LabelSelector::parse("tier!=front").unwrap().matches(&l));
        assert!(LabelSelector::parse("tier notin (a, b)").unwrap().matches(&l));
        assert!(!LabelSelector::parse("app!=web").unwrap().matches(&l));
        assert!(!LabelSelector::parse("app notin (web)").unwrap().matches(&l));
    }

    #[test]
    fn test_existence() {
        let l = labels(&[("app", "web")]);
        assert!(LabelSelector::parse("app").unwrap().matches(&l));
        assert!(!LabelSelector::parse("!app").unwrap().matches(&l));
        assert!(LabelSelector::parse("!tier").unwrap().matches(&l));
    }

    #[test]
    fn test_in_requires_presence() {
        let selector = LabelSelector::parse("tier in (front,edge)").unwrap();
        assert_eq!(selector.requirements()[0].values, vec!["front", "edge"]);
        assert!(selector.matches(&labels(&[("tier", "edge")])));
        assert!(!selector.matches(&labels(&[])));
    }

    #[test]
    fn test_prefixed_keys() {
        let l = labels(&[("app.kubernetes.io/name", "web")]);
        assert!(LabelSelector::parse("app.kubernetes.io/name=web").unwrap().matches(&l));
    }

    #[test]
    fn test_malformed_selectors() {
        for bad in ["app=web,", "tier in (a", "tier in a)", "tier within (a)", "=web", "a b=c", "x in ()"] {
            assert!(LabelSelector::parse(bad).is_err(), "expected '{}' to be rejected", bad);
        }
    }
}
