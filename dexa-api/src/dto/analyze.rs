use dexa_core::domain::QueryId;
use dexa_core::prompt::PromptStrategy;
use dexa_core::response::AnalysisSections;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct AnalyzeRequest {
    pub dataset_id: Uuid,
    #[validate(length(min = 1, max = 4000))]
    pub query: String,
    /// Picked from the query text when absent.
    pub strategy: Option<PromptStrategy>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub query_id: QueryId,
    pub code: String,
    pub explanation: String,
    pub sections: AnalysisSections,
    /// Completion round-trip in seconds.
    pub execution_time: f64,
    pub success: bool,
    /// Disallowed constructs found in `code`; non-empty means `success` is false.
    pub safety_issues: Vec<String>,
    pub raw: String,
}

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AiChatRequest {
    pub query: String,
    pub data_profile: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AiChatResponse {
    pub content: String,
    pub sections: AnalysisSections,
}
