//! Variable tokenizer with caching
//!
//! Recognizes the two reference forms:
//! - `@{name}`: string variable, replaced by literal text
//! - `${name}` / `${name.path}`: object variable, replaced by a value
//!   extracted from a structured value
//!
//! An object path may embed string references (`${resp.items.@{idx}}`).
//! Such a reference is not ready until the inner references are gone.
//!
//! Malformed sequences are left as literal text by [`tokenize`];
//! [`validate`] reports them.
//!
//! [`TOKENIZER`] is the only process-wide state in the crate. It memoizes
//! tokenizations and never changes what any call returns.

use std::collections::BTreeSet;
use std::ops::Range;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;

use crate::error::HarnessError;

/// Cached tokenizations kept before the cache is flushed
const CACHE_CAPACITY: usize = 1024;

/// Which substitution strategy a reference uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    /// `@{name}`
    String,
    /// `${name}` or `${name.path}`
    Object,
}

/// A variable reference found in a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableRef {
    pub kind: VariableKind,
    pub name: String,
    /// Property path of an object reference (text after the first '.')
    pub path: Option<String>,
    /// Byte range of the whole token in the scanned text
    pub span: Range<usize>,
}

impl VariableRef {
    /// False while the path still embeds unresolved references
    pub fn is_ready(&self) -> bool {
        self.path
            .as_deref()
            .map_or(true, |p| !p.contains("@{") && !p.contains("${"))
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

/// Character at a byte offset (for error reporting)
fn char_at(template: &str, pos: usize) -> char {
    template[pos..].chars().next().unwrap_or('?')
}

/// Read a name starting at `start`; returns the end offset
fn scan_name(bytes: &[u8], start: usize) -> usize {
    let mut end = start;
    while end < bytes.len() && is_name_byte(bytes[end]) {
        end += 1;
    }
    end
}

/// Parse `@{name}` at `start`
fn parse_string_ref(template: &str, start: usize) -> Result<VariableRef, HarnessError> {
    let bytes = template.as_bytes();
    let name_start = start + 2;
    let name_end = scan_name(bytes, name_start);

    match bytes.get(name_end) {
        None => Err(HarnessError::UnclosedToken { position: start }),
        Some(b'}') if name_end == name_start => Err(HarnessError::EmptyName { position: start }),
        Some(b'}') => Ok(VariableRef {
            kind: VariableKind::String,
            name: template[name_start..name_end].to_string(),
            path: None,
            span: start..name_end + 1,
        }),
        Some(_) => Err(HarnessError::InvalidName {
            position: name_end,
            found: char_at(template, name_end),
        }),
    }
}

/// Parse `${name}` or `${name.path}` at `start`
///
/// Returns the object reference followed by any string references
/// nested in its path.
fn parse_object_ref(template: &str, start: usize) -> Result<Vec<VariableRef>, HarnessError> {
    let bytes = template.as_bytes();
    let name_start = start + 2;
    let name_end = scan_name(bytes, name_start);

    let next = match bytes.get(name_end) {
        None => return Err(HarnessError::UnclosedToken { position: start }),
        Some(b) => *b,
    };
    if name_end == name_start && (next == b'}' || next == b'.') {
        return Err(HarnessError::EmptyName { position: start });
    }
    let name = template[name_start..name_end].to_string();

    match next {
        b'}' => Ok(vec![VariableRef {
            kind: VariableKind::Object,
            name,
            path: None,
            span: start..name_end + 1,
        }]),
        b'.' => {
            let path_start = name_end + 1;
            let mut nested = Vec::new();
            let mut pos = path_start;

            loop {
                let rest = &bytes[pos..];
                if rest.is_empty() {
                    return Err(HarnessError::UnclosedToken { position: start });
                }
                if rest.starts_with(b"@{") {
                    let inner = parse_string_ref(template, pos)?;
                    pos = inner.span.end;
                    nested.push(inner);
                } else if rest.starts_with(b"${") {
                    return Err(HarnessError::NestedObjectRef { position: pos });
                } else if rest[0] == b'}' {
                    break;
                } else {
                    pos += 1;
                }
            }

            if pos == path_start {
                return Err(HarnessError::EmptyPath { position: name_end });
            }

            let mut refs = Vec::with_capacity(nested.len() + 1);
            refs.push(VariableRef {
                kind: VariableKind::Object,
                name,
                path: Some(template[path_start..pos].to_string()),
                span: start..pos + 1,
            });
            refs.extend(nested);
            Ok(refs)
        }
        _ => Err(HarnessError::InvalidName {
            position: name_end,
            found: char_at(template, name_end),
        }),
    }
}

/// Scan a template, returning every well-formed reference and the first
/// syntax error encountered (if any)
fn scan(template: &str) -> (Vec<VariableRef>, Option<HarnessError>) {
    let bytes = template.as_bytes();
    let mut refs = Vec::new();
    let mut first_error = None;
    let mut pos = 0;

    while pos + 1 < bytes.len() {
        let parsed = match &bytes[pos..pos + 2] {
            b"@{" => Some(parse_string_ref(template, pos).map(|r| vec![r])),
            b"${" => Some(parse_object_ref(template, pos)),
            _ => None,
        };

        match parsed {
            Some(Ok(found)) => {
                pos = found[0].span.end;
                refs.extend(found);
            }
            Some(Err(e)) => {
                first_error.get_or_insert(e);
                pos += 1;
            }
            None => pos += 1,
        }
    }

    (refs, first_error)
}

/// Tokenize a template without caching
///
/// Object references precede the string references nested in their path.
pub fn tokenize(template: &str) -> Vec<VariableRef> {
    if !template.contains("@{") && !template.contains("${") {
        return Vec::new();
    }
    scan(template).0
}

/// Tokenizer with a cache keyed by template text
pub struct Tokenizer {
    cache: DashMap<String, Arc<Vec<VariableRef>>>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    pub fn new() -> Self {
        Self {
            cache: DashMap::new(),
        }
    }

    /// Tokenize a template (with caching)
    pub fn tokenize(&self, template: &str) -> Arc<Vec<VariableRef>> {
        if let Some(cached) = self.cache.get(template) {
            return Arc::clone(&cached);
        }

        if self.cache.len() >= CACHE_CAPACITY {
            self.cache.clear();
        }

        let tokens = Arc::new(tokenize(template));
        self.cache.insert(template.to_string(), Arc::clone(&tokens));
        tokens
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}

/// Global tokenizer instance
pub static TOKENIZER: Lazy<Tokenizer> = Lazy::new(Tokenizer::new);

/// Names of every variable referenced by a template, nested ones included
pub fn extract_variable_names(template: &str) -> BTreeSet<String> {
    TOKENIZER
        .tokenize(template)
        .iter()
        .map(|r| r.name.clone())
        .collect()
}

/// True if any well-formed reference of either kind remains
pub fn contains_variables(template: &str) -> bool {
    !tokenize(template).is_empty()
}

/// Check that every token in a template is well formed
pub fn validate(template: &str) -> Result<(), HarnessError> {
    match scan(template).1 {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
