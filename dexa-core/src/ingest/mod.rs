//! Upload ingestion: validates raw uploads and derives the dataset metadata
//! (columns, row count, sample records) stored alongside the raw bytes.
//!
//! Parsing is best effort. Content that cannot be read as the declared
//! type yields empty metadata instead of an error, so an upload only fails
//! on the allow-list and size checks.

pub mod csv;
pub mod json;

use serde_json::Value;

use crate::domain::{ContentHash, DatasetId, FileType, SampleRow, UploadConfig, UserId};
use crate::error::{CoreError, Result};

/// Metadata derived from one uploaded file.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestedFile {
    pub file_type: FileType,
    pub columns: Vec<String>,
    pub row_count: i64,
    pub sample: Vec<SampleRow>,
    pub full_content: Option<String>,
    pub checksum: ContentHash,
    pub size_bytes: i64,
}

/// Tabular records parsed from CSV or JSON content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Records {
    pub columns: Vec<String>,
    pub rows: Vec<SampleRow>,
}

impl Records {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Checks the extension allow-list and size ceiling.
pub fn validate_upload(file_name: &str, bytes: &[u8], config: &UploadConfig) -> Result<FileType> {
    let file_type = FileType::from_file_name(file_name).ok_or_else(|| {
        CoreError::Validation(format!(
            "Unsupported file '{}': expected one of {}",
            file_name,
            FileType::ALLOWED_EXTENSIONS.join(", ")
        ))
    })?;

    if bytes.is_empty() {
        return Err(CoreError::Validation("Uploaded file is empty".to_string()));
    }

    if bytes.len() > config.max_bytes {
        return Err(CoreError::PayloadTooLarge(format!(
            "File is {} bytes, maximum is {} bytes",
            bytes.len(),
            config.max_bytes
        )));
    }

    Ok(file_type)
}

/// Validates an upload and extracts its metadata.
pub fn ingest(file_name: &str, bytes: &[u8], config: &UploadConfig) -> Result<IngestedFile> {
    let file_type = validate_upload(file_name, bytes, config)?;

    let text = if file_type.is_text() {
        match std::str::from_utf8(bytes) {
            Ok(text) => Some(text.trim_start_matches('\u{feff}').to_string()),
            Err(err) => {
                tracing::warn!(file_name, error = %err, "Upload is not valid UTF-8, storing without metadata");
                None
            }
        }
    } else {
        None
    };

    let (columns, row_count, sample) = match (&file_type, text.as_deref()) {
        (FileType::Csv, Some(content)) => {
            let (columns, row_count, sample) = csv::summarize(content, config.sample_rows);
            (columns, row_count as i64, sample)
        }
        (FileType::Json, Some(content)) => match json::parse_records(content) {
            Ok(records) => {
                let row_count = records.row_count() as i64;
                let sample = records.rows.into_iter().take(config.sample_rows).collect();
                (records.columns, row_count, sample)
            }
            Err(err) => {
                tracing::warn!(file_name, error = %err, "Could not read JSON records, storing without metadata");
                (Vec::new(), 0, Vec::new())
            }
        },
        _ => {
            tracing::debug!(file_name, file_type = %file_type, "No metadata extracted for upload");
            (Vec::new(), 0, Vec::new())
        }
    };

    Ok(IngestedFile {
        file_type,
        columns,
        row_count,
        sample,
        full_content: text,
        checksum: ContentHash::from_bytes(bytes),
        size_bytes: bytes.len() as i64,
    })
}

/// Parses every record of stored content, used when profiling a dataset.
pub fn parse_content(file_type: FileType, content: &str) -> Option<Records> {
    match file_type {
        FileType::Csv => csv::parse_records(content),
        FileType::Json => json::parse_records(content).ok(),
        FileType::Xls | FileType::Xlsx => None,
    }
}

/// Coerces a raw cell into a JSON integer, float, or string.
pub fn coerce_value(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::String(String::new());
    }
    if let Ok(int) = raw.parse::<i64>() {
        return Value::from(int);
    }
    match raw.parse::<f64>() {
        Ok(float) if float.is_finite() => serde_json::Number::from_f64(float)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(raw.to_string())),
        _ => Value::String(raw.to_string()),
    }
}

/// Storage key for an upload: `{user_id}/{dataset_id}-{sanitized_name}`.
pub fn blob_key(user_id: &UserId, dataset_id: &DatasetId, file_name: &str) -> String {
    format!("{}/{}-{}", user_id, dataset_id, sanitize_file_name(file_name))
}

/// Keeps the final path component and replaces anything outside
/// `[A-Za-z0-9._-]` with `_`.
pub fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}
