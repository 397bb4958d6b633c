//! Line-oriented CSV reading. Quoted fields may contain commas and escaped
//! quotes but not newlines.

use super::{coerce_value, Records};
use crate::domain::SampleRow;

/// Columns, data-row count and the first `sample_rows` typed records.
pub fn summarize(content: &str, sample_rows: usize) -> (Vec<String>, usize, Vec<SampleRow>) {
    let mut lines = non_blank_lines(content);

    let Some(header) = lines.next() else {
        return (Vec::new(), 0, Vec::new());
    };
    let columns = parse_row(header);

    let mut row_count = 0;
    let mut sample = Vec::with_capacity(sample_rows);
    for line in lines {
        if row_count < sample_rows {
            sample.push(to_record(&columns, &parse_row(line)));
        }
        row_count += 1;
    }

    (columns, row_count, sample)
}

/// Every data row as a typed record, or `None` when there is no header.
pub fn parse_records(content: &str) -> Option<Records> {
    let mut lines = non_blank_lines(content);
    let columns = parse_row(lines.next()?);
    let rows = lines.map(|line| to_record(&columns, &parse_row(line))).collect();
    Some(Records { columns, rows })
}

fn non_blank_lines(content: &str) -> impl Iterator<Item = &str> {
    content.lines().filter(|line| !line.trim().is_empty())
}

fn to_record(columns: &[String], values: &[String]) -> SampleRow {
    columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            let raw = values.get(index).map(String::as_str).unwrap_or_default();
            (column.clone(), coerce_value(raw))
        })
        .collect()
}

/// Splits one line into trimmed fields, honouring double quotes.
pub fn parse_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(finish_field(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(finish_field(&mut current));

    fields
}

fn finish_field(current: &mut String) -> String {
    let field = current.trim().to_string();
    current.clear();
    field
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn splits_quoted_fields() {
        assert_eq!(
            parse_row(r#"1,"Braund, Mr. Owen",  male ,"say ""hi""""#),
            vec!["1", "Braund, Mr. Owen", "male", r#"say "hi""#]
        );
    }

    #[test]
    fn trailing_comma_yields_empty_field() {
        assert_eq!(parse_row("a,b,"), vec!["a", "b", ""]);
    }

    #[test]
    fn summarize_counts_rows_and_types_sample() {
        let content = "name,age,score\r\nann,31,9.5\r\n\r\nbob,,7\r\ncid,40,x\r\n";
        let (columns, rows, sample) = summarize(content, 2);

        assert_eq!(columns, vec!["name", "age", "score"]);
        assert_eq!(rows, 3);
        assert_eq!(sample.len(), 2);
        assert_eq!(serde_json::Value::Object(sample[0].clone()), json!({"name": "ann", "age": 31, "score": 9.5}));
        assert_eq!(serde_json::Value::Object(sample[1].clone()), json!({"name": "bob", "age": "", "score": 7}));
    }

    #[test]
    fn short_rows_are_padded_with_empty_strings() {
        let records = parse_records("a,b,c\n1\n").unwrap();
        assert_eq!(serde_json::Value::Object(records.rows[0].clone()), json!({"a": 1, "b": "", "c": ""}));
    }

    #[test]
    fn header_only_has_no_rows() {
        let (columns, rows, sample) = summarize("a,b\n", 5);
        assert_eq!(columns, vec!["a", "b"]);
        assert_eq!(rows, 0);
        assert!(sample.is_empty());
    }

    #[test]
    fn blank_content_has_no_columns() {
        assert_eq!(summarize("\n  \n", 5), (Vec::new(), 0, Vec::new()));
        assert!(parse_records("").is_none());
    }
}
