use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    Extension, Json,
};
use dexa_core::domain::{Dataset, DatasetId, NewDataset, QueryRecord};
use dexa_core::ingest;
use dexa_core::profile::DatasetProfile;
use uuid::Uuid;
use validator::Validate;

use super::owned_dataset;
use crate::{
    dto::*,
    error::{ApiError, ApiResult},
    middleware::AuthUser,
    observability::metrics::DexaMetrics,
    AppState,
};

struct UploadForm {
    file_name: String,
    bytes: Vec<u8>,
    name: Option<String>,
    description: Option<String>,
}

async fn read_upload_form(mut multipart: Multipart, max_bytes: usize) -> ApiResult<UploadForm> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut name = None;
    let mut description = None;

    while let Some(mut field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let mut bytes = Vec::new();

                // Enforce the ceiling while streaming.
                while let Some(chunk) = field.chunk().await? {
                    bytes.extend_from_slice(&chunk);
                    if bytes.len() > max_bytes {
                        return Err(ApiError::PayloadTooLarge(format!(
                            "File exceeds the maximum of {} bytes",
                            max_bytes
                        )));
                    }
                }

                file = Some((file_name, bytes));
            }
            "name" => name = Some(field.text().await?),
            "description" => description = Some(field.text().await?),
            other => tracing::debug!(field = other, "Ignoring unknown multipart field"),
        }
    }

    let (file_name, bytes) =
        file.ok_or_else(|| ApiError::BadRequest("Missing multipart field 'file'".to_string()))?;

    Ok(UploadForm {
        file_name,
        bytes,
        name: name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        description: description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()),
    })
}

pub async fn upload(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<DatasetResponse>)> {
    let upload_config = &state.settings.upload;
    let form = read_upload_form(multipart, upload_config.max_bytes).await?;

    let file = ingest::ingest(&form.file_name, &form.bytes, upload_config)?;
    let name = form.name.unwrap_or_else(|| form.file_name.clone());
    if name.chars().count() > 255 {
        return Err(ApiError::Validation("name must be at most 255 characters".to_string()));
    }

    let dataset = Dataset::new(NewDataset {
        user_id: user.user_id,
        name,
        description: form.description,
        file_type: file.file_type,
        file_name: form.file_name,
        size_bytes: file.size_bytes,
        checksum: file.checksum,
        columns: file.columns,
        row_count: file.row_count,
        sample: file.sample,
        full_content: file.full_content,
    });

    state
        .blobs
        .put(&dataset.blob_key, form.bytes, Some(file.file_type.content_type()))
        .await?;

    let dataset = match state.datasets.insert_dataset(&dataset).await {
        Ok(stored) => stored,
        Err(err) => {
            if let Err(cleanup) = state.blobs.delete(&dataset.blob_key).await {
                tracing::warn!(blob_key = %dataset.blob_key, error = %cleanup, "Failed to remove orphaned upload");
            }
            return Err(err.into());
        }
    };

    DexaMetrics::dataset_uploaded(dataset.file_type.as_str(), dataset.size_bytes);
    tracing::info!(
        dataset_id = %dataset.id,
        file_type = %dataset.file_type,
        columns = dataset.columns.len(),
        rows = dataset.row_count,
        "Dataset uploaded"
    );

    Ok((StatusCode::CREATED, Json(DatasetResponse::from(dataset))))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(pagination): Query<PaginationQuery>,
) -> ApiResult<Json<PaginatedResponse<DatasetResponse>>> {
    pagination.validate()?;
    let limit = pagination.limit();
    let offset = pagination.offset();

    let mut datasets = state
        .datasets
        .list_datasets(&user.user_id, limit + 1, offset)
        .await?;

    let has_more = datasets.len() as i64 > limit;
    datasets.truncate(limit as usize);

    Ok(Json(PaginatedResponse {
        data: datasets.into_iter().map(DatasetResponse::from).collect(),
        limit,
        offset,
        has_more,
    }))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DatasetResponse>> {
    let dataset = owned_dataset(&state, DatasetId(id), &user).await?;
    Ok(Json(DatasetResponse::from(dataset)))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let dataset = owned_dataset(&state, DatasetId(id), &user).await?;

    state.datasets.delete_dataset(&dataset.id).await?;

    if let Err(err) = state.blobs.delete(&dataset.blob_key).await {
        tracing::warn!(blob_key = %dataset.blob_key, error = %err, "Failed to delete dataset file");
    }

    tracing::info!(dataset_id = %dataset.id, "Dataset deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Streams the stored upload back with its original content type.
pub async fn download(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<([(header::HeaderName, String); 2], Vec<u8>)> {
    let dataset = owned_dataset(&state, DatasetId(id), &user).await?;
    let bytes = state.blobs.get(&dataset.blob_key).await?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        ingest::sanitize_file_name(&dataset.file_name)
    );

    Ok((
        [
            (header::CONTENT_TYPE, dataset.file_type.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

pub async fn profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProfileResponse>> {
    let dataset = owned_dataset(&state, DatasetId(id), &user).await?;
    Ok(Json(ProfileResponse::from(DatasetProfile::from_dataset(&dataset))))
}

pub async fn queries(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Query(pagination): Query<PaginationQuery>,
) -> ApiResult<Json<Vec<QueryRecord>>> {
    pagination.validate()?;
    let dataset = owned_dataset(&state, DatasetId(id), &user).await?;

    let records = state
        .queries
        .list_queries(&dataset.id, pagination.limit(), pagination.offset())
        .await?;
    Ok(Json(records))
}
