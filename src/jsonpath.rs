//! Minimal property-path parser for structured variables
//!
//! Supports:
//! - a.b.c (dot notation)
//! - a[0].b (array index)
//! - items.0 (numeric segment as index)
//! - $.a.b (optional $ prefix)
//!
//! Does NOT support filters, wildcards or slices.

use serde_json::Value;

use crate::error::HarnessError;

/// A parsed path segment
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Object field access: .field
    Field(String),
    /// Array index access: [0]
    Index(usize),
}

/// Parse a property path into segments
///
/// Examples:
/// - "price.currency" → [Field("price"), Field("currency")]
/// - "items[0].name" → [Field("items"), Index(0), Field("name")]
pub fn parse(path: &str) -> Result<Vec<Segment>, HarnessError> {
    let path = if let Some(rest) = path.strip_prefix("$.") {
        rest
    } else if path == "$" {
        return Ok(vec![]);
    } else {
        path
    };

    if path.is_empty() {
        return Ok(vec![]);
    }

    let unsupported = || HarnessError::PathUnsupported {
        path: path.to_string(),
    };

    let mut segments = Vec::new();

    for part in path.split('.') {
        if part.is_empty() {
            return Err(unsupported());
        }

        if let Some(bracket_pos) = part.find('[') {
            let field = &part[..bracket_pos];
            if !field.is_empty() {
                segments.push(Segment::Field(field.to_string()));
            }

            // One or more trailing [n] groups: matrix[1][0]
            let mut rest = &part[bracket_pos..];
            while !rest.is_empty() {
                let inner = rest.strip_prefix('[').ok_or_else(unsupported)?;
                let close = inner.find(']').ok_or_else(unsupported)?;
                let index: usize = inner[..close].parse().map_err(|_| unsupported())?;
                segments.push(Segment::Index(index));
                rest = &inner[close + 1..];
            }
        } else if part.contains(']') {
            return Err(unsupported());
        } else if let Ok(index) = part.parse::<usize>() {
            segments.push(Segment::Index(index));
        } else {
            segments.push(Segment::Field(part.to_string()));
        }
    }

    Ok(segments)
}

/// Apply segments to a JSON value, borrowing until the end
pub fn apply<'v>(value: &'v Value, segments: &[Segment]) -> Option<&'v Value> {
    let mut current = value;

    for segment in segments {
        current = match segment {
            Segment::Field(name) => current.get(name)?,
            Segment::Index(idx) => current.get(*idx)?,
        };
    }

    Some(current)
}

/// Parse and apply a path in one step
pub fn resolve<'v>(value: &'v Value, path: &str) -> Result<Option<&'v Value>, HarnessError> {
    let segments = parse(path)?;
    Ok(apply(value, &segments))
}
