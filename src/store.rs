//! Variable store - broadcasts supplied values to subscribed expressions
//!
//! The store is the caller-side half of resolution: it remembers every
//! value published so far, replays them into expressions that subscribe
//! late, and reports expressions that never resolved.

use rustc_hash::FxHashMap;

use crate::error::HarnessError;
use crate::expression::Expression;
use crate::variable::VariableValue;

/// Handle to an expression owned by a [`VariableStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExpressionId(usize);

#[derive(Debug, Default)]
pub struct VariableStore {
    /// Published values: name → latest value
    values: FxHashMap<String, VariableValue>,
    /// Subscribed expressions, indexed by ExpressionId
    expressions: Vec<Expression>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of an expression and replay every known value into it
    pub fn subscribe(&mut self, mut expression: Expression) -> ExpressionId {
        let names: Vec<String> = expression.dependencies().iter().cloned().collect();
        for name in names {
            if expression.is_resolved() {
                break;
            }
            if let Some(value) = self.values.get(&name) {
                expression.try_resolve(&name, value.clone());
            }
        }

        self.expressions.push(expression);
        ExpressionId(self.expressions.len() - 1)
    }

    /// Record a value and feed it to every unresolved expression
    ///
    /// Returns the expressions that became resolved by this value.
    pub fn publish(
        &mut self,
        name: impl Into<String>,
        value: impl Into<VariableValue>,
    ) -> Vec<ExpressionId> {
        let name = name.into();
        let value = value.into();
        let mut newly_resolved = Vec::new();

        for (idx, expression) in self.expressions.iter_mut().enumerate() {
            if expression.is_resolved() {
                continue;
            }
            if expression.try_resolve(&name, value.clone()) {
                newly_resolved.push(ExpressionId(idx));
            }
        }

        tracing::debug!(
            name = %name,
            resolved = newly_resolved.len(),
            "published variable"
        );
        self.values.insert(name, value);
        newly_resolved
    }

    /// Latest value published under `name`
    pub fn get(&self, name: &str) -> Option<&VariableValue> {
        self.values.get(name)
    }

    pub fn expression(&self, id: ExpressionId) -> Option<&Expression> {
        self.expressions.get(id.0)
    }

    /// Final value of an expression, if resolved
    pub fn evaluate(&self, id: ExpressionId) -> Option<&str> {
        self.expression(id).and_then(Expression::try_evaluate)
    }

    /// Final value of an expression, or an error naming what is missing
    pub fn require(&self, id: ExpressionId) -> Result<String, HarnessError> {
        let expression = self.expression(id).ok_or_else(|| HarnessError::Unresolved {
            missing: format!("unknown expression #{}", id.0),
        })?;

        match expression.try_evaluate() {
            Some(value) => Ok(value.to_string()),
            None => Err(HarnessError::Unresolved {
                missing: expression
                    .unresolved_names()
                    .into_iter()
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }

    /// Unresolved expressions with the names they still reference
    pub fn stalled(&self) -> Vec<(ExpressionId, Vec<String>)> {
        self.expressions
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.is_resolved())
            .map(|(idx, e)| (ExpressionId(idx), e.unresolved_names().into_iter().collect()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.expressions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }
}
