//! HTTP DataSource
//!
//! `GET {base}/{context}` loads a context, `POST {base}/{context}/{operation}`
//! runs an operation with a JSON body.

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Client, RequestBuilder};
use std::time::Duration;
use tracing::debug;

use carelink_core::DomainContext;

use crate::error::FetchError;
use crate::source::DataSource;

/// DataSource backed by the portal REST API
pub struct HttpDataSource {
    client: Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl HttpDataSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        })
    }

    /// Bearer token sent with every request; `None` after logout
    pub fn set_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn context_url(&self, context: DomainContext) -> String {
        format!("{}/{}", self.base_url, context.as_str())
    }

    pub fn operation_url(&self, context: DomainContext, operation: &str) -> String {
        format!("{}/{}/{}", self.base_url, context.as_str(), operation)
    }

    async fn send(&self, request: RequestBuilder) -> Result<serde_json::Value, FetchError> {
        let token = self.token.read().clone();
        let request = match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                code: status.as_u16(),
            });
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}

#[async_trait]
impl DataSource for HttpDataSource {
    async fn fetch(&self, context: DomainContext) -> Result<serde_json::Value, FetchError> {
        let url = self.context_url(context);
        debug!("GET {}", url);
        self.send(self.client.get(url)).await
    }

    async fn execute(
        &self,
        context: DomainContext,
        operation: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, FetchError> {
        let url = self.operation_url(context, operation);
        debug!("POST {}", url);
        self.send(self.client.post(url).json(&params)).await
    }

    fn set_session_token(&self, token: Option<&str>) {
        self.set_token(token.map(str::to_string));
    }
}

fn map_transport_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else if let Some(status) = err.status() {
        FetchError::Status {
            code: status.as_u16(),
        }
    } else {
        FetchError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let source = HttpDataSource::new("https://portal.example.org/api/", Duration::from_secs(10)).unwrap();

        assert_eq!(source.base_url(), "https://portal.example.org/api");
        assert_eq!(
            source.context_url(DomainContext::RevenueCycle),
            "https://portal.example.org/api/revenue-cycle"
        );
        assert_eq!(
            source.operation_url(DomainContext::ClaimsIntegration, "submit"),
            "https://portal.example.org/api/claims-integration/submit"
        );
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let source = HttpDataSource::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();

        let err = source.fetch(DomainContext::Overview).await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_) | FetchError::Timeout));
    }
}
