//! Response bodies

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Validation failures, every rule that failed
#[derive(Debug, Serialize, Deserialize)]
pub struct ValidationErrorResponse {
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitedResponse {
    pub error: String,
    pub retry_after: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RouteNotFoundResponse {
    pub error: String,
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CacheHealthResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ping: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Query string of `GET /cache/stats`
#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    #[serde(default)]
    pub format: StatsFormat,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsFormat {
    #[default]
    Json,
    Text,
}
