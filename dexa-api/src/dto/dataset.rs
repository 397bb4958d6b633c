use chrono::{DateTime, Utc};
use dexa_core::domain::{Dataset, DatasetId, FileType, SampleRow};
use dexa_core::profile::DatasetProfile;
use serde::{Deserialize, Serialize};

/// Dataset metadata as returned by the API; the raw file body is never
/// included.
#[derive(Debug, Serialize, Deserialize)]
pub struct DatasetResponse {
    pub id: DatasetId,
    pub name: String,
    pub description: Option<String>,
    pub file_type: FileType,
    pub file_name: String,
    pub size_bytes: i64,
    pub checksum: String,
    pub columns: Vec<String>,
    pub rows: i64,
    pub sample: Vec<SampleRow>,
    pub created_at: DateTime<Utc>,
}

impl From<Dataset> for DatasetResponse {
    fn from(dataset: Dataset) -> Self {
        Self {
            id: dataset.id,
            name: dataset.name,
            description: dataset.description,
            file_type: dataset.file_type,
            file_name: dataset.file_name,
            size_bytes: dataset.size_bytes,
            checksum: dataset.checksum.0,
            columns: dataset.columns,
            rows: dataset.row_count,
            sample: dataset.sample,
            created_at: dataset.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    /// Rendered text sent to the model.
    pub data_profile: String,
    pub profile: DatasetProfile,
}

impl From<DatasetProfile> for ProfileResponse {
    fn from(profile: DatasetProfile) -> Self {
        Self {
            data_profile: profile.render(),
            profile,
        }
    }
}
