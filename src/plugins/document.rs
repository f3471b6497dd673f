//! Document adapter: JSON objects holding identifier fields (`storage.json`).
//!
//! Only fields named in the plan are touched. Everything else round-trips
//! through `serde_json::Value` unchanged (key order is not kept).

use crate::core::error::ScrubError;
use crate::core::ident::FieldPlan;
use crate::core::outcome::FieldChange;
use crate::plugins::{Applied, parse_failure, write_failure, write_replacing};
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Read and parse a document. The root must be a JSON object.
pub fn load(path: &Path) -> Result<Map<String, Value>, ScrubError> {
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::InvalidData => parse_failure(path, e),
        _ => write_failure(path, e),
    })?;
    match serde_json::from_str::<Value>(&content).map_err(|e| parse_failure(path, e))? {
        Value::Object(map) => Ok(map),
        other => Err(parse_failure(
            path,
            format!("document root is {}, expected an object", kind_of(&other)),
        )),
    }
}

pub fn regenerate(path: &Path, plan: &FieldPlan) -> Result<Applied, ScrubError> {
    let mut doc = load(path)?;
    let mut changes = Vec::new();

    for (field, kind) in plan.iter() {
        let Some(slot) = doc.get_mut(field) else {
            debug!(field, "field absent, skipped");
            continue;
        };
        let old = match &*slot {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let new = kind.generate();
        *slot = Value::String(new.clone());
        changes.push(FieldChange {
            field: field.to_string(),
            old,
            new,
        });
    }

    if changes.is_empty() {
        return Ok(Applied::Unchanged);
    }

    let body = serde_json::to_string_pretty(&Value::Object(doc))?;
    write_replacing(path, body.as_bytes())?;
    Ok(Applied::Changed {
        affected: changes.len(),
        changes,
    })
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
