use serde_json::Value;

use super::Records;
use crate::error::{CoreError, Result};

/// Reads a top-level array of objects (or a single object) as records.
/// Columns are the union of keys in first-seen order.
pub fn parse_records(content: &str) -> Result<Records> {
    let value: Value = serde_json::from_str(content)?;

    let rows = match value {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(record) => Ok(record),
                other => Err(CoreError::Validation(format!(
                    "element {} is {}, expected an object",
                    index,
                    kind(&other)
                ))),
            })
            .collect::<Result<Vec<_>>>()?,
        Value::Object(record) => vec![record],
        other => {
            return Err(CoreError::Validation(format!(
                "top-level value is {}, expected an array of records",
                kind(&other)
            )))
        }
    };

    let mut columns: Vec<String> = Vec::new();
    for row in &rows {
        for key in row.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }

    Ok(Records { columns, rows })
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

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn collects_columns_in_first_seen_order() {
        let records = parse_records(r#"[{"b": 1, "a": 2}, {"a": 3, "c": null}]"#).unwrap();
        assert_eq!(records.columns, vec!["b", "a", "c"]);
        assert_eq!(records.row_count(), 2);
    }

    #[test]
    fn single_object_is_one_record() {
        let records = parse_records(r#"{"x": 1}"#).unwrap();
        assert_eq!(records.columns, vec!["x"]);
        assert_eq!(records.row_count(), 1);
    }

    #[test]
    fn rejects_non_record_content() {
        assert!(parse_records("[1, 2]").is_err());
        assert!(parse_records("\"text\"").is_err());
        assert!(parse_records("{not json").is_err());
    }

    #[test]
    fn empty_array_has_no_columns() {
        let records = parse_records("[]").unwrap();
        assert!(records.columns.is_empty());
        assert_eq!(records.row_count(), 0);
    }
}
