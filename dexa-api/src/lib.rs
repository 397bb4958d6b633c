//! HTTP surface of DEXA: dataset upload and profiling, analysis queries,
//! and per-dataset chat threads, all scoped to the authenticated user.

pub mod dto;
pub mod error;
pub mod extract;
pub mod gateway;
pub mod handlers;
pub mod middleware;
pub mod observability;

pub use error::{ApiError, ApiResult};
pub use extract::ApiJson;
pub use gateway::OpenAiGateway;
pub use middleware::{AuthUser, Claims};

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};
use dexa_core::domain::{ChatConfig, LlmConfig, UploadConfig};
use dexa_core::{BlobStore, ChatStore, CompletionProvider, DatasetStore, QueryLog};
use dexa_storage::{ChatRepository, DatasetRepository, MemoryBlobStore, MemoryStore, QueryRepository};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{analyze, chats, datasets};

/// Multipart framing allowance on top of the upload ceiling.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Request-independent settings the handlers consult.
#[derive(Clone, Default)]
pub struct ApiSettings {
    pub jwt_secret: String,
    pub llm: LlmConfig,
    pub upload: UploadConfig,
    pub chat: ChatConfig,
}

#[derive(Clone)]
pub struct AppState {
    pub datasets: Arc<dyn DatasetStore>,
    pub chats: Arc<dyn ChatStore>,
    pub queries: Arc<dyn QueryLog>,
    pub blobs: Arc<dyn BlobStore>,
    pub llm: Arc<dyn CompletionProvider>,
    pub settings: Arc<ApiSettings>,
}

impl AppState {
    /// Postgres-backed metadata with the given blob store.
    pub fn new(
        pool: PgPool,
        blobs: Arc<dyn BlobStore>,
        llm: Arc<dyn CompletionProvider>,
        settings: ApiSettings,
    ) -> Self {
        Self {
            datasets: Arc::new(DatasetRepository::new(pool.clone())),
            chats: Arc::new(ChatRepository::new(pool.clone())),
            queries: Arc::new(QueryRepository::new(pool)),
            blobs,
            llm,
            settings: Arc::new(settings),
        }
    }

    /// Everything held in process memory.
    pub fn in_memory(llm: Arc<dyn CompletionProvider>, settings: ApiSettings) -> Self {
        Self::with_memory_store(Arc::new(MemoryStore::new()), Arc::new(MemoryBlobStore::new()), llm, settings)
    }

    pub fn with_memory_store(
        store: Arc<MemoryStore>,
        blobs: Arc<dyn BlobStore>,
        llm: Arc<dyn CompletionProvider>,
        settings: ApiSettings,
    ) -> Self {
        Self {
            datasets: store.clone(),
            chats: store.clone(),
            queries: store,
            blobs,
            llm,
            settings: Arc::new(settings),
        }
    }
}

/// Authenticated `/api/v1` routes.
pub fn routes(state: AppState) -> Router {
    let body_limit = state.settings.upload.max_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/datasets", post(datasets::upload).get(datasets::list))
        .route("/datasets/:id", get(datasets::get).delete(datasets::delete))
        .route("/datasets/:id/file", get(datasets::download))
        .route("/datasets/:id/profile", get(datasets::profile))
        .route("/datasets/:id/queries", get(datasets::queries))
        .route("/datasets/:id/chats", post(chats::create).get(chats::list))
        .route("/chats/:id", patch(chats::rename).delete(chats::delete))
        .route("/chats/:id/messages", get(chats::list_messages).post(chats::send_message))
        .route("/analyze", post(analyze::analyze))
        .route("/ai-chat", post(analyze::ai_chat))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// The full application: probes, metrics and the versioned API.
pub fn app(state: AppState) -> Router {
    let probes = Router::new()
        .route("/health", get(observability::health::health))
        .route("/ready", get(observability::health::ready))
        .with_state(state.clone());

    Router::new()
        .merge(probes)
        .route("/metrics", get(observability::metrics::metrics_handler))
        .nest("/api/v1", routes(state))
        .layer(axum::middleware::from_fn(observability::logging::request_logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
