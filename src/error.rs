//! Error types with fix suggestions

use thiserror::Error;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Variables file error: {0}")]
    VarsFile(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ─────────────────────────────────────────────────────────────
    // Template syntax errors (HV-010 to HV-014)
    // ─────────────────────────────────────────────────────────────

    #[error("HV-010: Unclosed variable token starting at position {position}")]
    UnclosedToken { position: usize },

    #[error("HV-011: Empty variable name at position {position}")]
    EmptyName { position: usize },

    #[error("HV-012: Invalid character '{found}' in variable name at position {position}")]
    InvalidName { position: usize, found: char },

    #[error("HV-013: Empty property path at position {position}")]
    EmptyPath { position: usize },

    #[error("HV-014: Object reference nested in a ${{...}} path at position {position}")]
    NestedObjectRef { position: usize },

    // ─────────────────────────────────────────────────────────────
    // Path errors (HV-020)
    // ─────────────────────────────────────────────────────────────

    #[error("HV-020: Property path '{path}' is not supported (use a.b or a[0].b)")]
    PathUnsupported { path: String },

    // ─────────────────────────────────────────────────────────────
    // Resolution errors (HV-030 to HV-031)
    // ─────────────────────────────────────────────────────────────

    #[error("HV-030: Expression never resolved; missing: {missing}")]
    Unresolved { missing: String },

    #[error("HV-031: Invalid variable assignment '{arg}' (expected name=value)")]
    InvalidAssignment { arg: String },

    // ─────────────────────────────────────────────────────────────
    // Environment condition errors (HV-040 to HV-042)
    // ─────────────────────────────────────────────────────────────

    #[error("HV-040: Environment condition name cannot be empty")]
    ConditionNameMissing,

    #[error("HV-041: Environment condition expression cannot be empty")]
    ConditionExpressionMissing,

    #[error("HV-042: Invalid regular expression '{expression}': {details}")]
    InvalidRegex { expression: String, details: String },
}

impl FixSuggestion for HarnessError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            HarnessError::VarsFile(_) => {
                Some("Check YAML syntax: the file must be a map of name: value")
            }
            HarnessError::Json(_) => {
                Some("Check the JSON value is well formed (try parsing with jq)")
            }
            HarnessError::Io(_) => Some("Check file path and permissions"),
            HarnessError::UnclosedToken { .. } => {
                Some("Close the token with '}': @{name} or ${name.path}")
            }
            HarnessError::EmptyName { .. } => Some("Put a variable name between the braces"),
            HarnessError::InvalidName { .. } => {
                Some("Variable names may only contain letters, digits, '_' and '-'")
            }
            HarnessError::EmptyPath { .. } => {
                Some("Remove the trailing '.' or add a property after it")
            }
            HarnessError::NestedObjectRef { .. } => {
                Some("Only @{name} references may appear inside a ${...} path")
            }
            HarnessError::PathUnsupported { .. } => {
                Some("Use simple paths like field.subfield or array[0].field")
            }
            HarnessError::Unresolved { .. } => {
                Some("Supply every missing variable (--var name=value or --json name=<json>)")
            }
            HarnessError::InvalidAssignment { .. } => Some("Write assignments as name=value"),
            HarnessError::ConditionNameMissing => Some("Set the 'name' property of the condition"),
            HarnessError::ConditionExpressionMissing => {
                Some("Set the 'expression' property of the condition")
            }
            HarnessError::InvalidRegex { .. } => Some("Check the regular expression syntax"),
        }
    }
}
