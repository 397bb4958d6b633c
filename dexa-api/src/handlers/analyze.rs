use axum::{extract::State, Extension, Json};
use dexa_core::completion::{ChatTurn, CompletionRequest};
use dexa_core::domain::{DatasetId, QueryRecord};
use dexa_core::profile::DatasetProfile;
use dexa_core::prompt::{analysis_prompt, chat_prompt, PromptStrategy, ANALYSIS_SYSTEM_PROMPT, CHAT_SYSTEM_PROMPT};
use dexa_core::response::{extract_code, fenced_code, split_sections};
use dexa_core::safety::check_code_safety;
use std::time::Instant;

use super::owned_dataset;
use crate::{
    dto::*,
    error::{ApiError, ApiResult},
    extract::ApiJson,
    middleware::AuthUser,
    observability::metrics::DexaMetrics,
    AppState,
};

pub async fn analyze(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<AnalyzeRequest>,
) -> ApiResult<Json<AnalyzeResponse>> {
    let query = payload.query.trim().to_string();
    if query.is_empty() {
        return Err(ApiError::Validation("query must not be blank".to_string()));
    }

    let dataset = owned_dataset(&state, DatasetId(payload.dataset_id), &user).await?;
    let strategy = payload.strategy.unwrap_or_else(|| PromptStrategy::for_query(&query));
    let profile = DatasetProfile::from_dataset(&dataset);

    let request = CompletionRequest::new(vec![
        ChatTurn::system(ANALYSIS_SYSTEM_PROMPT),
        ChatTurn::user(analysis_prompt(&query, &profile, strategy)),
    ])
    .with_temperature(state.settings.llm.temperature)
    .with_max_tokens(state.settings.llm.max_tokens);

    let started = Instant::now();
    let result = state.llm.complete(request).await;
    let elapsed = started.elapsed();
    let execution_time = elapsed.as_secs_f64();

    let completion = match result {
        Ok(completion) => {
            DexaMetrics::llm_request("success", elapsed);
            completion
        }
        Err(err) => {
            DexaMetrics::llm_request("error", elapsed);
            let record = QueryRecord::failed(dataset.id, user.user_id, query, err.to_string(), execution_time);
            if let Err(log_err) = state.queries.record_query(&record).await {
                tracing::warn!(dataset_id = %dataset.id, error = %log_err, "Failed to record failed query");
            }
            return Err(err.into());
        }
    };

    let sections = split_sections(&completion.text);
    let code = if sections.code.is_empty() {
        fenced_code(&completion.text).unwrap_or_default()
    } else {
        extract_code(&sections.code)
    };
    let explanation = if sections.explanation.is_empty() {
        sections.analysis.clone()
    } else {
        sections.explanation.clone()
    };

    let safety_issues = check_code_safety(&code);
    if !safety_issues.is_empty() {
        tracing::warn!(dataset_id = %dataset.id, issues = ?safety_issues, "Generated code failed safety check");
    }

    let record = state
        .queries
        .record_query(
            &QueryRecord::new(
                dataset.id,
                user.user_id,
                query,
                code.clone(),
                explanation.clone(),
                execution_time,
            )
            .with_safety_issues(safety_issues),
        )
        .await?;

    tracing::info!(
        query_id = %record.id,
        dataset_id = %dataset.id,
        strategy = ?strategy,
        success = record.success,
        execution_time,
        "Analysis completed"
    );

    Ok(Json(AnalyzeResponse {
        query_id: record.id,
        code,
        explanation,
        sections,
        execution_time,
        success: record.success,
        safety_issues: record.safety_issues,
        raw: completion.text,
    }))
}

/// Stateless completion over a caller-supplied data profile.
pub async fn ai_chat(
    State(state): State<AppState>,
    Extension(_user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<AiChatRequest>,
) -> ApiResult<Json<AiChatResponse>> {
    let query = payload.query.trim();
    let data_profile = payload.data_profile.trim();
    if query.is_empty() || data_profile.is_empty() {
        return Err(ApiError::BadRequest(
            "Query and data profile are required".to_string(),
        ));
    }

    let request = CompletionRequest::new(vec![
        ChatTurn::system(CHAT_SYSTEM_PROMPT),
        ChatTurn::user(chat_prompt(query, data_profile)),
    ])
    .with_temperature(state.settings.llm.temperature)
    .with_max_tokens(state.settings.llm.max_tokens);

    let started = Instant::now();
    let completion = match state.llm.complete(request).await {
        Ok(completion) => {
            DexaMetrics::llm_request("success", started.elapsed());
            completion
        }
        Err(err) => {
            DexaMetrics::llm_request("error", started.elapsed());
            return Err(err.into());
        }
    };

    Ok(Json(AiChatResponse {
        sections: split_sections(&completion.text),
        content: completion.text,
    }))
}
