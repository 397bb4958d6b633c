use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{DatasetId, QueryId, UserId};

/// Append-only audit entry for one analyze request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRecord {
    pub id: QueryId,
    pub dataset_id: DatasetId,
    pub user_id: UserId,
    pub query_text: String,
    pub generated_code: String,
    pub explanation: String,
    /// Seconds spent waiting on the completion API.
    pub execution_time: f64,
    pub success: bool,
    /// Disallowed constructs found in `generated_code`.
    #[serde(default)]
    pub safety_issues: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl QueryRecord {
    pub fn new(
        dataset_id: DatasetId,
        user_id: UserId,
        query_text: String,
        generated_code: String,
        explanation: String,
        execution_time: f64,
    ) -> Self {
        let success = !generated_code.trim().is_empty();
        Self {
            id: QueryId::new(),
            dataset_id,
            user_id,
            query_text,
            generated_code,
            explanation,
            execution_time,
            success,
            safety_issues: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Attaches safety findings; any finding marks the record unsuccessful.
    pub fn with_safety_issues(mut self, issues: Vec<String>) -> Self {
        if !issues.is_empty() {
            self.success = false;
        }
        self.safety_issues = issues;
        self
    }

    /// Record for a query whose completion call failed.
    pub fn failed(
        dataset_id: DatasetId,
        user_id: UserId,
        query_text: String,
        error: String,
        execution_time: f64,
    ) -> Self {
        Self {
            success: false,
            ..Self::new(dataset_id, user_id, query_text, String::new(), error, execution_time)
        }
    }
}
