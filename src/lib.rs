//! harness-vars - dependency-tracked variable expressions
//!
//! Templates reference variables as `@{name}` (string) or
//! `${name.path}` (structured). An [`Expression`] tracks which variables
//! it still needs and yields its final text once all have been supplied.

pub mod condition;
pub mod error;
pub mod expression;
pub mod jsonpath;
pub mod store;
pub mod substitute;
pub mod token;
pub mod variable;

pub use condition::{
    ConditionDescriptor, EnvCondition, Environment, MapEnvironment, SystemEnvironment,
};
pub use error::{FixSuggestion, HarnessError};
pub use expression::Expression;
pub use store::{ExpressionId, VariableStore};
pub use token::{contains_variables, extract_variable_names, validate, VariableKind, VariableRef};
pub use variable::VariableValue;
