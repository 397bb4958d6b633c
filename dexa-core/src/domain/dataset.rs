use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use super::ids::{ContentHash, DatasetId, UserId};
use crate::error::CoreError;

/// One sample record: column name to JSON value, in column order.
pub type SampleRow = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Csv,
    Json,
    Xls,
    Xlsx,
}

impl FileType {
    pub const ALLOWED_EXTENSIONS: [&'static str; 4] = ["csv", "json", "xls", "xlsx"];

    /// Resolves the type from a file name's extension.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let (_, ext) = file_name.rsplit_once('.')?;
        ext.parse().ok()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Csv => "csv",
            FileType::Json => "json",
            FileType::Xls => "xls",
            FileType::Xlsx => "xlsx",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            FileType::Csv => "text/csv",
            FileType::Json => "application/json",
            FileType::Xls => "application/vnd.ms-excel",
            FileType::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, FileType::Csv | FileType::Json)
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(FileType::Csv),
            "json" => Ok(FileType::Json),
            "xls" => Ok(FileType::Xls),
            "xlsx" => Ok(FileType::Xlsx),
            other => Err(CoreError::Validation(format!(
                "Unsupported file type '{}': expected one of {}",
                other,
                Self::ALLOWED_EXTENSIONS.join(", ")
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Dataset {
    pub id: DatasetId,
    pub user_id: UserId,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    pub file_type: FileType,
    pub file_name: String,
    /// Key of the raw upload in blob storage.
    pub blob_key: String,
    pub size_bytes: i64,
    pub checksum: ContentHash,
    pub columns: Vec<String>,
    pub row_count: i64,
    pub sample: Vec<SampleRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_content: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Everything needed to create a [`Dataset`] except the generated fields.
#[derive(Debug, Clone)]
pub struct NewDataset {
    pub user_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub file_type: FileType,
    pub file_name: String,
    pub size_bytes: i64,
    pub checksum: ContentHash,
    pub columns: Vec<String>,
    pub row_count: i64,
    pub sample: Vec<SampleRow>,
    pub full_content: Option<String>,
}

impl Dataset {
    /// Assigns a fresh id and derives the blob key from it, so every upload
    /// gets its own object.
    pub fn new(new: NewDataset) -> Self {
        let id = DatasetId::new();
        Self {
            id,
            blob_key: crate::ingest::blob_key(&new.user_id, &id, &new.file_name),
            user_id: new.user_id,
            name: new.name,
            description: new.description,
            file_type: new.file_type,
            file_name: new.file_name,
            size_bytes: new.size_bytes,
            checksum: new.checksum,
            columns: new.columns,
            row_count: new.row_count,
            sample: new.sample,
            full_content: new.full_content,
            created_at: Utc::now(),
        }
    }

    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.user_id == user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_type_from_name_is_case_insensitive() {
        assert_eq!(FileType::from_file_name("sales.CSV"), Some(FileType::Csv));
        assert_eq!(FileType::from_file_name("a.b.json"), Some(FileType::Json));
        assert_eq!(FileType::from_file_name("book.xlsx"), Some(FileType::Xlsx));
        assert_eq!(FileType::from_file_name("legacy.xls"), Some(FileType::Xls));
    }

    #[test]
    fn file_type_rejects_unknown_extensions() {
        assert_eq!(FileType::from_file_name("notes.txt"), None);
        assert_eq!(FileType::from_file_name("no_extension"), None);
        assert!("parquet".parse::<FileType>().is_err());
    }

    #[test]
    fn only_csv_and_json_are_text() {
        assert!(FileType::Csv.is_text());
        assert!(FileType::Json.is_text());
        assert!(!FileType::Xlsx.is_text());
    }
}
