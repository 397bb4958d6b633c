use serde::{Deserialize, Serialize};
use validator::Validate;

// ===== Completion API Configuration =====

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
#[serde(default)]
pub struct LlmConfig {
    #[validate(url)]
    pub api_base: String,
    pub api_key: String,
    #[validate(length(min = 1, max = 255))]
    pub model: String,
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: f32,
    #[validate(range(min = 1, max = 32768))]
    pub max_tokens: u32,
    #[validate(range(min = 1, max = 600))]
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            max_tokens: 1200,
            timeout_seconds: 60,
        }
    }
}

// ===== Upload Configuration =====

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
#[serde(default)]
pub struct UploadConfig {
    #[validate(range(min = 1))]
    pub max_bytes: usize,
    /// Number of leading records kept as the dataset sample.
    #[validate(range(min = 1, max = 100))]
    pub sample_rows: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            sample_rows: 5,
        }
    }
}

// ===== Chat Configuration =====

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
#[serde(default)]
pub struct ChatConfig {
    /// Prior messages replayed to the model on each turn.
    #[validate(range(max = 200))]
    pub history_window: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self { history_window: 20 }
    }
}
