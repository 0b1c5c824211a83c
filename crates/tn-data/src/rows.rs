//! Decoding of the backend's child rows

use serde_json::Value;
use tn_core::ChildNode;

use crate::DataError;

/// Turn a backend payload (a JSON array of rows) into child nodes.
///
/// Each row's `value` is the taxon name and `meta.label` its display text;
/// rows missing either fall back to the row rendered as a string. The raw
/// row is kept as the node's `meta`, and ids are positions in the payload.
pub fn decode_rows(payload: Value) -> Result<Vec<ChildNode>, DataError> {
    let Value::Array(rows) = payload else {
        return Err(DataError::Payload(format!(
            "expected an array of rows, got {}",
            kind(&payload)
        )));
    };

    Ok(rows
        .into_iter()
        .enumerate()
        .map(|(i, row)| decode_row(i as u32, row))
        .collect())
}

fn decode_row(id: u32, row: Value) -> ChildNode {
    let fallback = || render(&row);
    let value = row.get("value").and_then(scalar).unwrap_or_else(fallback);
    let label = row
        .get("meta")
        .and_then(|meta| meta.get("label"))
        .and_then(scalar)
        .unwrap_or_else(fallback);

    ChildNode {
        id,
        value,
        label,
        meta: row,
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn render(row: &Value) -> String {
    match row {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
