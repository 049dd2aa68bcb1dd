//! Builtins that print values the way documents print them.
//!
//! jaq keeps number literals as written, so `1.0 | tostring` would give
//! `"1.0"` and `1e1000 | tojson` would give `1e1000`. These versions go
//! through [`Value`](crate::document::Value) rendering instead, which prints
//! integral floats without a fraction and clamps overflowing numbers.

use super::convert::from_val;
use jaq_core::box_iter::box_once;
use jaq_core::{Native, RunPtr};
use jaq_json::Val;

/// Names shadowed by [`funs`].
pub const SHADOWED: &[&str] = &["tostring", "tojson"];

pub fn funs() -> impl Iterator<Item = jaq_std::Filter<Native<Val>>> {
    let tostring: RunPtr<Val> = |_, cv| box_once(Ok(Val::from(to_string(cv.1))));
    let tojson: RunPtr<Val> = |_, cv| box_once(Ok(Val::from(from_val(cv.1).to_string())));
    [
        ("tostring", jaq_std::v(0), tostring),
        ("tojson", jaq_std::v(0), tojson),
    ]
    .into_iter()
    .map(jaq_std::run)
}

fn to_string(val: Val) -> String {
    match val {
        Val::Str(s) => String::clone(&s),
        other => from_val(other).to_string(),
    }
}
