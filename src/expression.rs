//! Dependency-tracked expression
//!
//! An [`Expression`] owns one template and rewrites it as variable values
//! arrive, in any order. It only exposes a final value once no reference
//! of either kind remains.
//!
//! Structured values are buffered per variable name so a reference whose
//! path depends on other variables (`${resp.items.@{idx}}`) resolves as
//! soon as those variables have been supplied.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;
use serde_json::Value;
use tracing::debug;

use crate::error::HarnessError;
use crate::substitute::{resolve_object_variable, resolve_string_variable};
use crate::token::{contains_variables, tokenize, validate, TOKENIZER};
use crate::variable::VariableValue;

#[derive(Debug, Clone)]
pub struct Expression {
    /// Current text, rewritten after each accepted value
    template: String,
    /// Names referenced by the original template (never shrinks)
    dependencies: BTreeSet<String>,
    /// Reference count of the original template; bounds the pending loop
    reference_count: usize,
    resolved: bool,
    /// Structured values whose references may not have resolved yet
    pending: FxHashMap<String, Value>,
}

impl Expression {
    /// Build an expression from a template assumed to be well formed
    ///
    /// Malformed tokens are kept as literal text.
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let refs = TOKENIZER.tokenize(&template);
        let dependencies: BTreeSet<String> = refs.iter().map(|r| r.name.clone()).collect();

        Self {
            resolved: refs.is_empty(),
            reference_count: refs.len(),
            dependencies,
            template,
            pending: FxHashMap::default(),
        }
    }

    /// Validate the template, then build the expression
    pub fn parse(template: impl Into<String>) -> Result<Self, HarnessError> {
        let template = template.into();
        validate(&template)?;
        Ok(Self::new(template))
    }

    /// Incorporate one variable's value
    ///
    /// Names the template does not reference are ignored. Returns whether
    /// the expression is now fully resolved.
    pub fn try_resolve(&mut self, name: &str, value: impl Into<VariableValue>) -> bool {
        if !self.dependencies.contains(name) {
            debug!(name, "variable not referenced, ignoring");
            return self.resolved;
        }

        match value.into() {
            VariableValue::Text(text) => {
                self.template = resolve_string_variable(name, &text, &self.template);
            }
            VariableValue::Structured(value) => {
                self.pending.insert(name.to_string(), value);
            }
        }

        self.apply_pending();

        self.resolved = !contains_variables(&self.template);
        if self.resolved {
            self.pending.clear();
            debug!(name, "expression resolved");
        }

        self.resolved
    }

    /// Apply every buffered structured value until the text stops changing
    fn apply_pending(&mut self) {
        for _ in 0..=self.reference_count {
            let mut changed = false;

            for (name, value) in &self.pending {
                let next = resolve_object_variable(name, Some(value), &self.template);
                if next != self.template {
                    self.template = next;
                    changed = true;
                }
            }

            if !changed {
                break;
            }
        }
    }

    /// The final value, only once fully resolved
    pub fn try_evaluate(&self) -> Option<&str> {
        self.resolved.then_some(self.template.as_str())
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Names referenced by the original template
    pub fn dependencies(&self) -> &BTreeSet<String> {
        &self.dependencies
    }

    /// Current text, possibly still containing references (diagnostics only)
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Names still referenced by the current text
    pub fn unresolved_names(&self) -> BTreeSet<String> {
        tokenize(&self.template).into_iter().map(|r| r.name).collect()
    }

    /// Names of buffered structured values, sorted
    pub fn pending_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.pending.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn no_references_resolves_immediately() {
        let expr = Expression::new("just text");
        assert!(expr.is_resolved());
        assert!(expr.dependencies().is_empty());
        assert_eq!(expr.try_evaluate(), Some("just text"));
    }

    #[test]
    fn dependencies_from_both_kinds() {
        let expr = Expression::new("@{a} ${b.c} @{a}");
        let deps: Vec<&str> = expr.dependencies().iter().map(String::as_str).collect();
        assert_eq!(deps, vec!["a", "b"]);
        assert!(!expr.is_resolved());
        assert_eq!(expr.try_evaluate(), None);
    }

    #[test]
    fn string_variable_resolves() {
        let mut expr = Expression::new("Hello @{name}, bye @{name}");
        assert!(expr.try_resolve("name", "Ann"));
        assert_eq!(expr.try_evaluate(), Some("Hello Ann, bye Ann"));
    }

    #[test]
    fn unknown_name_is_noop() {
        let mut expr = Expression::new("@{a} ${b.x}");
        expr.try_resolve("b", json!({"y": 1}));
        let before = expr.template().to_string();

        assert!(!expr.try_resolve("zzz", "value"));
        assert!(!expr.try_resolve("zzz", json!({"x": 1})));

        assert_eq!(expr.template(), before);
        assert_eq!(expr.pending_names(), vec!["b"]);
    }

    #[test]
    fn structured_path_resolves() {
        let mut expr = Expression::new("${user.name} says hi");
        assert!(expr.try_resolve("user", json!({"name": "Ann"})));
        assert_eq!(expr.try_evaluate(), Some("Ann says hi"));
        assert!(expr.pending_names().is_empty());
    }

    #[test]
    fn structured_missing_path_stays_pending() {
        let mut expr = Expression::new("${user.name} says hi");
        assert!(!expr.try_resolve("user", json!({"other": 1})));
        assert_eq!(expr.try_evaluate(), None);
        assert_eq!(expr.pending_names(), vec!["user"]);
        assert_eq!(expr.template(), "${user.name} says hi");

        // A later value for the same name replaces the buffered one
        assert!(expr.try_resolve("user", json!({"name": "Bo"})));
        assert_eq!(expr.try_evaluate(), Some("Bo says hi"));
    }

    #[test]
    fn chained_path_resolves_in_either_order() {
        let resp = json!({"items": [{"id": "a"}, {"id": "b"}]});

        let mut first = Expression::new("id=${resp.items.@{idx}.id}");
        assert!(!first.try_resolve("resp", resp.clone()));
        assert!(first.try_resolve("idx", "1"));

        let mut second = Expression::new("id=${resp.items.@{idx}.id}");
        assert!(!second.try_resolve("idx", "1"));
        assert!(second.try_resolve("resp", resp));

        assert_eq!(first.try_evaluate(), Some("id=b"));
        assert_eq!(second.try_evaluate(), Some("id=b"));
    }

    #[test]
    fn structured_values_substitute_independently() {
        let mut expr = Expression::new("${a.x}/${b.y}/@{c}");
        expr.try_resolve("a", json!({"x": 1}));
        expr.try_resolve("b", json!({"y": 2}));
        assert_eq!(expr.template(), "1/2/@{c}");
        assert!(expr.try_resolve("c", "3"));
        assert_eq!(expr.try_evaluate(), Some("1/2/3"));
    }

    #[test]
    fn two_structured_values_pending_together() {
        let mut expr = Expression::new("${a.x}/${b.y}");
        assert!(!expr.try_resolve("a", json!({"z": 1})));
        assert!(!expr.try_resolve("b", json!({"q": 2})));
        assert_eq!(expr.pending_names(), vec!["a", "b"]);
        assert_eq!(expr.template(), "${a.x}/${b.y}");

        assert!(!expr.try_resolve("a", json!({"x": 1})));
        assert_eq!(expr.template(), "1/${b.y}");
        assert_eq!(expr.pending_names(), vec!["a", "b"]);

        assert!(expr.try_resolve("b", json!({"y": 2})));
        assert_eq!(expr.try_evaluate(), Some("1/2"));
        assert!(expr.pending_names().is_empty());
    }

    #[test]
    fn earlier_structured_value_survives_later_one() {
        // `a` only becomes resolvable after `k`, which arrives after `b`
        let mut expr = Expression::new("${a.@{k}}/${b.y}");
        assert!(!expr.try_resolve("a", json!({"v": "A"})));
        assert!(!expr.try_resolve("b", json!({"missing": true})));
        assert!(!expr.try_resolve("k", "v"));
        assert_eq!(expr.template(), "A/${b.y}");
        assert!(expr.try_resolve("b", json!({"y": "B"})));
        assert_eq!(expr.try_evaluate(), Some("A/B"));
    }

    #[test]
    fn json_string_fills_object_reference() {
        let mut expr = Expression::new("${resp}");
        assert!(expr.try_resolve("resp", json!("hello")));
        assert_eq!(expr.try_evaluate(), Some("hello"));

        // A JSON string is structured, so it leaves `@{resp}` alone
        let mut expr = Expression::new("@{resp}");
        assert!(!expr.try_resolve("resp", json!("hello")));
    }

    #[test]
    fn value_with_token_syntax_is_rescanned() {
        let mut expr = Expression::new("@{a}@{b}");
        expr.try_resolve("a", "@{b}");
        assert!(expr.try_resolve("b", "x"));
        assert_eq!(expr.try_evaluate(), Some("xx"));

        let mut expr = Expression::new("@{a}@{b}");
        expr.try_resolve("b", "x");
        assert!(!expr.try_resolve("a", "@{b}"));
        assert_eq!(expr.try_evaluate(), None);
    }

    #[test]
    fn string_value_does_not_fill_object_reference() {
        let mut expr = Expression::new("${user}");
        assert!(!expr.try_resolve("user", "Ann"));
        assert!(expr.try_resolve("user", json!({"name": "Ann"})));
        assert_eq!(expr.try_evaluate(), Some(r#"{"name":"Ann"}"#));
    }

    #[test]
    fn repeat_after_resolution_is_idempotent() {
        let mut expr = Expression::new("@{x}!");
        assert!(expr.try_resolve("x", "v"));
        assert!(expr.try_resolve("x", "other"));
        assert_eq!(expr.try_evaluate(), Some("v!"));
    }

    #[test]
    fn unresolved_names_shrink() {
        let mut expr = Expression::new("@{a} @{b} ${c.d}");
        expr.try_resolve("a", "1");
        let left: Vec<String> = expr.unresolved_names().into_iter().collect();
        assert_eq!(left, vec!["b", "c"]);
        // Dependencies never shrink
        assert_eq!(expr.dependencies().len(), 3);
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!(Expression::parse("@{ok} ${broken").is_err());
        assert!(Expression::parse("@{ok}").is_ok());
    }
}
