//! Conversion between document values and jaq values.

use crate::document::value::{Number, Value};
use jaq_json::Val;
use std::rc::Rc;

/// Converts a document value into a jaq value.
///
/// Integral floats become integers so that `1.0 | tostring` prints `1`.
pub fn to_val(value: &Value) -> Val {
    match value {
        Value::Null => Val::Null,
        Value::Boolean(b) => Val::Bool(*b),
        Value::Number(Number::Integer(i)) => match isize::try_from(*i) {
            Ok(i) => Val::Int(i),
            Err(_) => Val::Float(*i as f64),
        },
        Value::Number(n @ Number::Float(f)) => match n.as_i64().map(isize::try_from) {
            Some(Ok(i)) => Val::Int(i),
            _ => Val::Float(*f),
        },
        Value::String(s) => Val::from(s.clone()),
        Value::Array(items) => items.iter().map(to_val).collect(),
        Value::Object(map) => Val::obj(
            map.iter()
                .map(|(k, v)| (Rc::new(k.clone()), to_val(v)))
                .collect(),
        ),
    }
}

/// Converts a jaq value back into a document value.
///
/// Numbers that do not fit a float are clamped to the largest finite one,
/// and NaN becomes `null`, the same way jq prints them.
pub fn from_val(val: Val) -> Value {
    match val {
        Val::Null => Value::Null,
        Val::Bool(b) => Value::Boolean(b),
        Val::Int(i) => Value::from(i as i64),
        Val::Float(f) => float(f),
        Val::Num(n) => match n.parse::<i64>() {
            Ok(i) => Value::from(i),
            Err(_) => n.parse::<f64>().map_or(Value::Null, float),
        },
        Val::Str(s) => Value::String(String::clone(&s)),
        Val::Arr(items) => Value::Array(items.iter().cloned().map(from_val).collect()),
        Val::Obj(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (String::clone(k), from_val(v.clone())))
                .collect(),
        ),
    }
}

fn float(f: f64) -> Value {
    if f.is_nan() {
        Value::Null
    } else {
        Value::Number(Number::from_f64(f.clamp(f64::MIN, f64::MAX)))
    }
}
