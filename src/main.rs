//! harness-vars CLI - resolve and inspect variable templates

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::Value;

use harness_vars::token::tokenize;
use harness_vars::variable::{parse_assignment, parse_json_assignment};
use harness_vars::{
    validate, EnvCondition, Expression, FixSuggestion, HarnessError, SystemEnvironment,
    VariableKind, VariableStore, VariableValue,
};

#[derive(Parser)]
#[command(name = "harness-vars")]
#[command(about = "Resolve templates that reference @{string} and ${object.path} variables")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a template with the given variables
    Resolve {
        /// Template text
        template: String,

        /// String variable (repeatable)
        #[arg(long = "var", value_name = "NAME=VALUE")]
        vars: Vec<String>,

        /// Structured variable given as JSON (repeatable)
        #[arg(long = "json", value_name = "NAME=JSON")]
        json: Vec<String>,

        /// YAML or JSON file mapping variable names to values
        #[arg(long = "vars", value_name = "FILE")]
        vars_file: Option<PathBuf>,
    },

    /// Validate a template and list its dependencies
    Check {
        /// Template text
        template: String,
    },

    /// Match an environment variable against a regular expression
    EnvMatch {
        /// Environment variable name
        name: String,

        /// Regular expression
        expression: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Resolve {
            template,
            vars,
            json,
            vars_file,
        } => resolve_template(template, &vars, &json, vars_file),
        Commands::Check { template } => check_template(&template),
        Commands::EnvMatch { name, expression } => env_match(name, expression),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            if let Some(suggestion) = e.fix_suggestion() {
                eprintln!("  {} {}", "Fix:".yellow(), suggestion);
            }
            std::process::exit(1);
        }
    }
}

fn resolve_template(
    template: String,
    vars: &[String],
    json: &[String],
    vars_file: Option<PathBuf>,
) -> Result<bool, HarnessError> {
    let expression = Expression::parse(template)?;
    let mut store = VariableStore::new();

    if let Some(path) = vars_file {
        let text = fs::read_to_string(path)?;
        let values: BTreeMap<String, Value> = serde_yaml::from_str(&text)?;
        for (name, value) in values {
            store.publish(name, file_value(value));
        }
    }

    for arg in vars {
        let (name, value) = parse_assignment(arg)?;
        store.publish(name, value);
    }

    for arg in json {
        let (name, value) = parse_json_assignment(arg)?;
        store.publish(name, value);
    }

    let id = store.subscribe(expression);
    let value = store.require(id)?;
    println!("{}", value);
    Ok(true)
}

/// Variables-file entries: strings fill `@{name}`, everything else is structured
fn file_value(value: Value) -> VariableValue {
    match value {
        Value::String(s) => VariableValue::Text(s),
        other => VariableValue::Structured(other),
    }
}

fn check_template(template: &str) -> Result<bool, HarnessError> {
    validate(template)?;

    let refs = tokenize(template);
    let expression = Expression::new(template);
    let deps: Vec<&str> = expression.dependencies().iter().map(String::as_str).collect();

    println!(
        "{} Valid template ({} dependencies)",
        "✓".green(),
        deps.len()
    );
    for r in refs.iter() {
        let (form, kind) = match (r.kind, r.path.as_deref()) {
            (VariableKind::String, _) => (format!("@{{{}}}", r.name), "string"),
            (VariableKind::Object, Some(path)) => (format!("${{{}.{}}}", r.name, path), "object"),
            (VariableKind::Object, None) => (format!("${{{}}}", r.name), "object"),
        };
        println!("  {} {}", form.cyan(), kind.dimmed());
    }
    if !deps.is_empty() {
        println!("{} {}", "Dependencies:".bold(), deps.join(", "));
    }

    Ok(true)
}

fn env_match(name: String, expression: String) -> Result<bool, HarnessError> {
    let condition = EnvCondition::from_parts(name, expression)?;
    let matched = condition.evaluate(&SystemEnvironment);
    println!("{}", matched);
    Ok(matched)
}
