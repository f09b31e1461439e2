//! GitHub GraphQL client.
//!
//! A thin `reqwest` wrapper that sends the starred repositories queries with
//! bearer authentication. Transient failures (network errors, 5xx, secondary
//! rate limits) are retried with exponential backoff, bounded by the
//! configured retry budget. Every query is a read, so retrying is safe.

use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::github::pagination::{PageSize, StarredPage, StarredRepositoriesSource};
use crate::github::queries;
use crate::github::types::{GraphQlRequest, GraphQlResponse, StarredRepositoriesData};

/// Public GitHub GraphQL endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.github.com/graphql";

const USER_AGENT: &str = concat!("ghstars/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MIN_RETRY_DELAY: Duration = Duration::from_secs(1);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Failure of a single GraphQL round trip.
#[derive(Debug, thiserror::Error)]
enum TransportError {
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("HTTP {status}: {}", .body.trim())]
    Status { status: u16, body: String },

    #[error("GraphQL errors: {}", .0.join("; "))]
    GraphQl(Vec<String>),

    #[error("{0}")]
    Decode(String),
}

impl TransportError {
    /// Whether another attempt may succeed.
    fn is_transient(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Status { status, body } => {
                *status == 429
                    || *status >= 500
                    || (*status == 403 && body.to_ascii_lowercase().contains("rate limit"))
            }
            Self::GraphQl(_) | Self::Decode(_) => false,
        }
    }
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Decode(msg) => {
                Self::DeserializationFailed(format!("GraphQL response: {msg}"))
            }
            other => Self::RequestFailed(other.to_string()),
        }
    }
}

/// Unwrap a GraphQL envelope, turning reported errors into failures.
fn into_data<T>(response: GraphQlResponse<T>) -> std::result::Result<T, TransportError> {
    if !response.errors.is_empty() {
        return Err(TransportError::GraphQl(
            response.errors.into_iter().map(|e| e.message).collect(),
        ));
    }
    response
        .data
        .ok_or_else(|| TransportError::Decode("response has no data".to_string()))
}

/// Build the variables of the paginated query; an empty cursor means "from the start".
fn page_variables(after: &str, page_size: PageSize) -> serde_json::Value {
    let after = (!after.is_empty()).then_some(after);
    serde_json::json!({ "after": after, "pageSize": page_size.get() })
}

/// GitHub GraphQL client.
pub struct GitHubClient {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
    max_retries: usize,
}

impl GitHubClient {
    /// Create a client for an endpoint.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the token is empty or the HTTP client cannot be built.
    pub fn new(access_token: &str, endpoint: &str, max_retries: usize) -> Result<Self> {
        if access_token.trim().is_empty() {
            return Err(Error::Config("GitHub access token is not set".to_string()));
        }

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            access_token: access_token.trim().to_string(),
            max_retries,
        })
    }

    /// Create a client from settings.
    ///
    /// # Errors
    ///
    /// See [`GitHubClient::new`].
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            &settings.access_token,
            &settings.api_endpoint,
            settings.max_retries,
        )
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(MIN_RETRY_DELAY)
            .with_max_delay(MAX_RETRY_DELAY)
            .with_max_times(self.max_retries)
            .with_jitter()
    }

    async fn send_once<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: &serde_json::Value,
    ) -> std::result::Result<T, TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.access_token)
            .json(&GraphQlRequest { query, variables })
            .send()
            .await
            .map_err(TransportError::Network)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: GraphQlResponse<T> = response
            .json()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))?;
        into_data(envelope)
    }

    /// Run a query, retrying transient failures.
    async fn graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T> {
        let variables = &variables;
        let data = (|| async move { self.send_once(query, variables).await })
            .retry(self.backoff())
            .sleep(tokio::time::sleep)
            .when(TransportError::is_transient)
            .notify(|err: &TransportError, delay: Duration| {
                warn!(error = %err, delay_ms = delay.as_millis(), "GitHub request failed, retrying");
            })
            .await?;
        Ok(data)
    }

    /// Total number of repositories starred by the token owner.
    ///
    /// # Errors
    ///
    /// Returns `RequestFailed` on transport, auth or GraphQL errors.
    pub async fn total_starred_count(&self) -> Result<u64> {
        let data: StarredRepositoriesData = self
            .graphql(queries::TOTAL_STARRED_REPOSITORIES_COUNT, serde_json::json!({}))
            .await?;
        Ok(data.viewer.starred_repositories.total_count)
    }
}

impl StarredRepositoriesSource for GitHubClient {
    async fn fetch_page(&self, after: &str, page_size: PageSize) -> Result<StarredPage> {
        debug!(after, page_size = page_size.get(), "Requesting starred repositories page");
        let data: StarredRepositoriesData = self
            .graphql(queries::STARRED_REPOSITORIES, page_variables(after, page_size))
            .await?;
        let connection = data.viewer.starred_repositories;

        Ok(StarredPage {
            repositories: connection.edges,
            total_count: connection.total_count,
            has_next_page: connection.page_info.has_next_page,
            end_cursor: connection.page_info.end_cursor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::types::GraphQlError;

    #[test]
    fn test_client_requires_token() {
        let err = GitHubClient::new("  ", DEFAULT_ENDPOINT, 1).err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_page_variables_use_null_for_first_page() {
        let size = PageSize::new(25).unwrap();
        assert_eq!(
            page_variables("", size),
            serde_json::json!({ "after": null, "pageSize": 25 })
        );
        assert_eq!(
            page_variables("Y3Vyc29y", size),
            serde_json::json!({ "after": "Y3Vyc29y", "pageSize": 25 })
        );
    }

    #[test]
    fn test_graphql_errors_are_request_failures() {
        let response: GraphQlResponse<StarredRepositoriesData> = GraphQlResponse {
            data: None,
            errors: vec![GraphQlError {
                message: "Bad credentials".to_string(),
            }],
        };
        let err: Error = into_data(response).unwrap_err().into();
        assert!(matches!(err, Error::RequestFailed(msg) if msg.contains("Bad credentials")));
    }

    #[test]
    fn test_transport_error_messages() {
        let status = TransportError::Status {
            status: 502,
            body: "  Bad Gateway\n".to_string(),
        };
        assert_eq!(status.to_string(), "HTTP 502: Bad Gateway");

        let graphql = TransportError::GraphQl(vec!["first".to_string(), "second".to_string()]);
        let err: Error = graphql.into();
        assert!(matches!(err, Error::RequestFailed(msg) if msg == "GraphQL errors: first; second"));

        let err: Error = TransportError::Decode("missing field `viewer`".to_string()).into();
        assert!(matches!(err, Error::DeserializationFailed(msg) if msg.ends_with("missing field `viewer`")));
    }

    #[test]
    fn test_transient_classification() {
        let status = |status: u16, body: &str| TransportError::Status {
            status,
            body: body.to_string(),
        };
        assert!(status(502, "").is_transient());
        assert!(status(429, "").is_transient());
        assert!(status(403, "You have exceeded a secondary rate limit").is_transient());
        assert!(!status(401, "Bad credentials").is_transient());
        assert!(!TransportError::GraphQl(vec!["x".to_string()]).is_transient());
    }
}
