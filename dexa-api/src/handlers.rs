pub mod analyze;
pub mod chats;
pub mod datasets;

use dexa_core::domain::{Chat, ChatId, Dataset, DatasetId};

use crate::{error::ApiError, middleware::AuthUser, AppState};

/// Fetches a dataset the caller owns. Another user's dataset is reported as
/// missing.
pub(crate) async fn owned_dataset(
    state: &AppState,
    id: DatasetId,
    user: &AuthUser,
) -> Result<Dataset, ApiError> {
    state
        .datasets
        .get_dataset(&id)
        .await?
        .filter(|dataset| dataset.is_owned_by(&user.user_id))
        .ok_or_else(|| ApiError::NotFound(format!("Dataset {} not found", id)))
}

pub(crate) async fn owned_chat(state: &AppState, id: ChatId, user: &AuthUser) -> Result<Chat, ApiError> {
    state
        .chats
        .get_chat(&id)
        .await?
        .filter(|chat| chat.is_owned_by(&user.user_id))
        .ok_or_else(|| ApiError::NotFound(format!("Chat {} not found", id)))
}
