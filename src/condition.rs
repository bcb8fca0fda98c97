//! Environment conditions
//!
//! A condition names an environment variable and a regular expression.
//! It holds when the variable is set, non-empty, and matches.

use std::collections::HashMap;

use regex::Regex;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use tracing::debug;

use crate::error::HarnessError;

/// Descriptor property holding the variable name
pub const PROPERTY_NAME: &str = "name";
/// Descriptor property holding the regular expression
pub const PROPERTY_EXPRESSION: &str = "expression";

/// Source of environment variables
pub trait Environment {
    fn var(&self, name: &str) -> Option<String>;
}

/// The process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnvironment;

impl Environment for SystemEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// In-memory environment
#[derive(Debug, Clone, Default)]
pub struct MapEnvironment {
    vars: FxHashMap<String, String>,
}

impl MapEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }
}

impl Environment for MapEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

/// Serialized form of a condition (`properties: {name, expression}`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConditionDescriptor {
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct EnvCondition {
    name: String,
    expression: String,
    regex: Regex,
}

impl EnvCondition {
    /// Build from a descriptor; fails if a property is missing or the
    /// expression does not compile
    pub fn new(descriptor: &ConditionDescriptor) -> Result<Self, HarnessError> {
        let name = descriptor.properties.get(PROPERTY_NAME).cloned().unwrap_or_default();
        let expression = descriptor
            .properties
            .get(PROPERTY_EXPRESSION)
            .cloned()
            .unwrap_or_default();
        Self::from_parts(name, expression)
    }

    pub fn from_parts(
        name: impl Into<String>,
        expression: impl Into<String>,
    ) -> Result<Self, HarnessError> {
        let name = name.into();
        let expression = expression.into();

        if name.is_empty() {
            return Err(HarnessError::ConditionNameMissing);
        }
        if expression.is_empty() {
            return Err(HarnessError::ConditionExpressionMissing);
        }

        let regex = Regex::new(&expression).map_err(|e| HarnessError::InvalidRegex {
            expression: expression.clone(),
            details: e.to_string(),
        })?;

        Ok(Self {
            name,
            expression,
            regex,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// True if the variable is set, non-empty and matches the expression
    pub fn evaluate(&self, env: &dyn Environment) -> bool {
        let Some(value) = env.var(&self.name).filter(|v| !v.is_empty()) else {
            return false;
        };

        debug!(
            name = %self.name,
            value = %value,
            expression = %self.expression,
            "evaluating environment condition"
        );

        self.regex.is_match(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(name: &str, value: &str) -> MapEnvironment {
        let mut env = MapEnvironment::new();
        env.set(name, value);
        env
    }

    #[test]
    fn matches_value() {
        let condition = EnvCondition::from_parts("RUNTIME", "^node(-\\d+)?$").unwrap();
        assert!(condition.evaluate(&env("RUNTIME", "node-18")));
        assert!(!condition.evaluate(&env("RUNTIME", "python")));
    }

    #[test]
    fn unset_or_empty_is_false() {
        let condition = EnvCondition::from_parts("RUNTIME", ".*").unwrap();
        assert!(!condition.evaluate(&MapEnvironment::new()));
        assert!(!condition.evaluate(&env("RUNTIME", "")));
    }

    #[test]
    fn construction_errors() {
        assert!(matches!(
            EnvCondition::from_parts("", "x"),
            Err(HarnessError::ConditionNameMissing)
        ));
        assert!(matches!(
            EnvCondition::from_parts("A", ""),
            Err(HarnessError::ConditionExpressionMissing)
        ));
        assert!(matches!(
            EnvCondition::from_parts("A", "(unclosed"),
            Err(HarnessError::InvalidRegex { .. })
        ));
    }

    #[test]
    fn from_descriptor_yaml() {
        let yaml = r#"
properties:
  name: WORKER_MODE
  expression: "^(warm|cold)$"
"#;
        let descriptor: ConditionDescriptor = serde_yaml::from_str(yaml).unwrap();
        let condition = EnvCondition::new(&descriptor).unwrap();
        assert_eq!(condition.name(), "WORKER_MODE");
        assert_eq!(condition.expression(), "^(warm|cold)$");
        assert!(condition.evaluate(&env("WORKER_MODE", "warm")));
    }

    #[test]
    fn descriptor_missing_name() {
        let descriptor = ConditionDescriptor::default();
        assert!(matches!(
            EnvCondition::new(&descriptor),
            Err(HarnessError::ConditionNameMissing)
        ));
    }
}
