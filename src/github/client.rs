// GitHub GraphQL HTTP client.
// Handles authentication, rate limiting, and request/response processing.

use std::time::Duration;

use reqwest::{
    Client, Response, StatusCode,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::instrument;

use crate::config::AppConfig;
use crate::error::{Result, StargazeError};

/// Executes one GraphQL document against a remote schema.
///
/// `GitHubClient` is the network implementation; tests substitute an
/// in-memory one.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Send `query` with `variables` and decode the `data` member as `T`.
    async fn execute<V, T>(&mut self, operation: &str, query: &str, variables: &V) -> Result<T>
    where
        V: Serialize,
        T: DeserializeOwned;
}

/// Rate limit information from response headers.
#[derive(Debug, Clone, Default)]
pub struct RateLimit {
    pub limit: u64,
    pub remaining: u64,
    pub reset: u64,
}

#[derive(Serialize)]
struct GraphQlRequest<'a, V> {
    query: &'a str,
    variables: &'a V,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQlErrorResponse>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorResponse {
    message: String,
}

/// GitHub GraphQL client with authentication and rate limit tracking.
pub struct GitHubClient {
    client: Client,
    endpoint: String,
    rate_limit: RateLimit,
}

impl GitHubClient {
    /// Create a new GitHub client for `endpoint` with the given token.
    pub fn new(token: &str, endpoint: &str, user_agent: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();

        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| StargazeError::Other(e.to_string()))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent).map_err(|e| StargazeError::Other(e.to_string()))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(StargazeError::Api)?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            rate_limit: RateLimit::default(),
        })
    }

    /// Create a client from loaded configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let token = config.require_token()?;
        Self::new(token, &config.endpoint, &config.user_agent, config.timeout())
    }

    /// Get the current rate limit information.
    pub fn rate_limit(&self) -> &RateLimit {
        &self.rate_limit
    }

    /// Update rate limit from response headers.
    fn update_rate_limit(&mut self, response: &Response) {
        let header = |name: &str| -> Option<u64> {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
        };

        if let Some(limit) = header("x-ratelimit-limit") {
            self.rate_limit.limit = limit;
        }
        if let Some(remaining) = header("x-ratelimit-remaining") {
            self.rate_limit.remaining = remaining;
        }
        if let Some(reset) = header("x-ratelimit-reset") {
            self.rate_limit.reset = reset;
        }
    }

    /// Check response status and convert errors.
    async fn check_response(&self, response: Response) -> Result<Response> {
        match response.status() {
            StatusCode::OK => Ok(response),
            StatusCode::UNAUTHORIZED => Err(StargazeError::Unauthorized),
            StatusCode::FORBIDDEN if self.rate_limit.remaining == 0 => {
                Err(StargazeError::RateLimited {
                    reset_at: reset_label(self.rate_limit.reset),
                })
            }
            status => Err(StargazeError::Other(format!(
                "HTTP {}: {}",
                status,
                response.text().await.unwrap_or_default()
            ))),
        }
    }
}

impl Transport for GitHubClient {
    #[instrument(skip(self, query, variables), fields(endpoint = %self.endpoint))]
    async fn execute<V, T>(&mut self, operation: &str, query: &str, variables: &V) -> Result<T>
    where
        V: Serialize,
        T: DeserializeOwned,
    {
        let body = GraphQlRequest { query, variables };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(StargazeError::Api)?;

        self.update_rate_limit(&response);
        let response = self.check_response(response).await?;

        let payload: GraphQlResponse<T> = response.json().await?;
        tracing::debug!(
            remaining = self.rate_limit.remaining,
            "GraphQL response received"
        );
        into_data(operation, payload)
    }
}

/// Unwrap a GraphQL envelope, turning an `errors` array into an error.
fn into_data<T>(operation: &str, payload: GraphQlResponse<T>) -> Result<T> {
    if let Some(errors) = payload.errors
        && !errors.is_empty()
    {
        let message = errors
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(StargazeError::GraphQl(message));
    }

    payload
        .data
        .ok_or_else(|| StargazeError::EmptyResponse(operation.to_string()))
}

fn reset_label(reset: u64) -> String {
    i64::try_from(reset)
        .ok()
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
