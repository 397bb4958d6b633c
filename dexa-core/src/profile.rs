//! Dataset profile: the column list, sample rows and summary statistics
//! that ground every prompt sent to the model.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt::Write as _;

use crate::domain::{Dataset, SampleRow};
use crate::ingest;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Text,
    Empty,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnSummary {
    pub name: String,
    pub kind: ColumnKind,
    /// Non-missing values seen.
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distinct: Option<usize>,
}

impl ColumnSummary {
    fn compute(name: &str, rows: &[SampleRow]) -> Self {
        let mut numbers = Vec::new();
        let mut texts = BTreeSet::new();
        let mut count = 0;

        for row in rows {
            match row.get(name) {
                None | Some(Value::Null) => {}
                Some(Value::String(s)) if s.is_empty() => {}
                Some(Value::Number(n)) => {
                    count += 1;
                    if let Some(f) = n.as_f64() {
                        numbers.push(f);
                    }
                    texts.insert(n.to_string());
                }
                Some(Value::String(s)) => {
                    count += 1;
                    texts.insert(s.clone());
                }
                Some(other) => {
                    count += 1;
                    texts.insert(other.to_string());
                }
            }
        }

        let mut summary = Self {
            name: name.to_string(),
            kind: ColumnKind::Empty,
            count,
            min: None,
            max: None,
            mean: None,
            distinct: None,
        };

        if count == 0 {
            return summary;
        }

        if numbers.len() == count {
            let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
            let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let mean = numbers.iter().sum::<f64>() / numbers.len() as f64;
            summary.kind = ColumnKind::Numeric;
            summary.min = Some(min);
            summary.max = Some(max);
            summary.mean = Some((mean * 10_000.0).round() / 10_000.0);
        } else {
            summary.kind = ColumnKind::Text;
            summary.distinct = Some(texts.len());
        }

        summary
    }

    fn describe(&self) -> String {
        match self.kind {
            ColumnKind::Numeric => format!(
                "{}: numeric (count={}, min={}, max={}, mean={})",
                self.name,
                self.count,
                self.min.unwrap_or_default(),
                self.max.unwrap_or_default(),
                self.mean.unwrap_or_default()
            ),
            ColumnKind::Text => format!(
                "{}: text (count={}, distinct={})",
                self.name,
                self.count,
                self.distinct.unwrap_or_default()
            ),
            ColumnKind::Empty => format!("{}: empty", self.name),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetProfile {
    pub columns: Vec<String>,
    pub row_count: i64,
    pub sample: Vec<SampleRow>,
    pub summary: Vec<ColumnSummary>,
}

impl DatasetProfile {
    /// Profiles a dataset over its full content when that can be parsed,
    /// otherwise over the stored sample.
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let parsed = dataset
            .full_content
            .as_deref()
            .and_then(|content| ingest::parse_content(dataset.file_type, content))
            .filter(|records| !records.rows.is_empty());

        let rows = match &parsed {
            Some(records) => records.rows.as_slice(),
            None => dataset.sample.as_slice(),
        };

        Self::from_rows(
            dataset.columns.clone(),
            dataset.row_count,
            dataset.sample.clone(),
            rows,
        )
    }

    pub fn from_rows(
        columns: Vec<String>,
        row_count: i64,
        sample: Vec<SampleRow>,
        rows: &[SampleRow],
    ) -> Self {
        let summary = columns
            .iter()
            .map(|column| ColumnSummary::compute(column, rows))
            .collect();

        Self {
            columns,
            row_count,
            sample,
            summary,
        }
    }

    /// Text form embedded in prompts.
    pub fn render(&self) -> String {
        let sample = serde_json::to_string_pretty(&self.sample).unwrap_or_else(|_| "[]".to_string());

        let mut out = String::new();
        let _ = writeln!(out, "Columns: [{}]", self.columns.join(", "));
        let _ = writeln!(out, "Rows: {}", self.row_count);
        let _ = writeln!(out, "Sample: {}", sample);
        out.push_str("Summary:");
        if self.summary.is_empty() {
            out.push_str(" (no columns)");
        }
        for column in &self.summary {
            let _ = write!(out, "\n- {}", column.describe());
        }
        out
    }
}
