// Error types for stargaze.
// Covers cache patching, the star in-flight guard, GraphQL transport and configuration.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StargazeError {
    #[error("No cached result for {0}")]
    CacheMiss(String),

    #[error("Node {node_id} is not present in the cached result")]
    NodeNotFound { node_id: String },

    #[error("A star mutation is already in flight for node {0}")]
    StarInFlight(String),

    #[error("GitHub API error: {0}")]
    Api(#[from] reqwest::Error),

    #[error("Authentication failed: invalid or expired token")]
    Unauthorized,

    #[error("Rate limit exceeded, resets at {reset_at}")]
    RateLimited { reset_at: String },

    #[error("GraphQL error: {0}")]
    GraphQl(String),

    #[error("GraphQL response for {0} carried no data")]
    EmptyResponse(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing GitHub token (set STARGAZE_TOKEN or GITHUB_TOKEN)")]
    MissingToken,

    #[error("Failed to load configuration: {0}")]
    Config(String),

    #[error("Invalid configuration: {field} - {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("{0}")]
    Other(String),
}

impl StargazeError {
    /// Whether the caller should recover by refetching the query.
    pub fn is_cache_miss(&self) -> bool {
        matches!(self, StargazeError::CacheMiss(_))
    }
}

pub type Result<T> = std::result::Result<T, StargazeError>;
