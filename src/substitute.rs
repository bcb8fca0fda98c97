//! Text rewriting for the two reference kinds
//!
//! Both functions are pure: they rebuild the template in a single pass
//! over its references and return it unchanged when nothing applies.

use std::borrow::Cow;

use serde_json::Value;
use tracing::trace;

use crate::jsonpath;
use crate::token::{tokenize, VariableKind, VariableRef};

/// Render a JSON value for substitution
///
/// Strings are inserted raw; everything else as compact JSON text.
pub fn value_to_string(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s),
        other => Cow::Owned(other.to_string()),
    }
}

/// Splice replacements into `template` at non-overlapping spans
fn splice(template: &str, replacements: Vec<(&VariableRef, Cow<'_, str>)>) -> String {
    let mut result = String::with_capacity(template.len() + 64);
    let mut last_end = 0;

    for (token, replacement) in replacements {
        result.push_str(&template[last_end..token.span.start]);
        result.push_str(&replacement);
        last_end = token.span.end;
    }

    result.push_str(&template[last_end..]);
    result
}

/// Replace every `@{name}` with `value`
///
/// Occurrences nested in an object path are replaced too.
pub fn resolve_string_variable(name: &str, value: &str, template: &str) -> String {
    let refs = tokenize(template);
    let replacements: Vec<_> = refs
        .iter()
        .filter(|r| r.kind == VariableKind::String && r.name == name)
        .map(|r| (r, Cow::Borrowed(value)))
        .collect();

    if replacements.is_empty() {
        return template.to_string();
    }

    trace!(name, count = replacements.len(), "substituting string variable");
    splice(template, replacements)
}

/// Replace every ready `${name...}` whose path resolves against `value`
///
/// References with an unsupported or unmatched path stay in place, as do
/// all references when `value` is `None`.
pub fn resolve_object_variable(name: &str, value: Option<&Value>, template: &str) -> String {
    let Some(value) = value else {
        return template.to_string();
    };

    let refs = tokenize(template);
    let replacements: Vec<_> = refs
        .iter()
        .filter(|r| r.kind == VariableKind::Object && r.name == name && r.is_ready())
        .filter_map(|r| {
            let found = match r.path.as_deref() {
                Some(path) => jsonpath::resolve(value, path).ok().flatten(),
                None => Some(value),
            };
            found.map(|v| (r, value_to_string(v)))
        })
        .collect();

    if replacements.is_empty() {
        return template.to_string();
    }

    trace!(name, count = replacements.len(), "substituting object variable");
    splice(template, replacements)
}
