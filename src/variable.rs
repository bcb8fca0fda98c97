//! Variable values supplied to expressions

use serde_json::Value;

use crate::error::HarnessError;

/// A value for one variable
///
/// `Text` fills `@{name}` references; `Structured` fills `${name...}`
/// references through a property path.
#[derive(Debug, Clone, PartialEq)]
pub enum VariableValue {
    Text(String),
    Structured(Value),
}

impl VariableValue {
    pub fn is_text(&self) -> bool {
        matches!(self, VariableValue::Text(_))
    }

    /// Convert back to JSON (text becomes a JSON string)
    pub fn to_value(&self) -> Value {
        match self {
            VariableValue::Text(s) => Value::String(s.clone()),
            VariableValue::Structured(v) => v.clone(),
        }
    }
}

impl From<&str> for VariableValue {
    fn from(s: &str) -> Self {
        VariableValue::Text(s.to_string())
    }
}

impl From<String> for VariableValue {
    fn from(s: String) -> Self {
        VariableValue::Text(s)
    }
}

/// Every JSON value is structured, strings included
impl From<Value> for VariableValue {
    fn from(value: Value) -> Self {
        VariableValue::Structured(value)
    }
}

/// Split a `name=value` assignment
pub fn parse_assignment(arg: &str) -> Result<(String, String), HarnessError> {
    let invalid = || HarnessError::InvalidAssignment {
        arg: arg.to_string(),
    };
    let (name, value) = arg.split_once('=').ok_or_else(invalid)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(invalid());
    }
    Ok((name.to_string(), value.to_string()))
}

/// Parse a `name=<json>` assignment into a structured variable
pub fn parse_json_assignment(arg: &str) -> Result<(String, VariableValue), HarnessError> {
    let (name, raw) = parse_assignment(arg)?;
    let value: Value = serde_json::from_str(&raw)?;
    Ok((name, VariableValue::Structured(value)))
}
