pub mod wire;

use crate::{Config, ErrorDescriptor};
use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;
use wire::CheckRequest;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("grammar service unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("grammar service returned HTTP {0}")]
    Status(StatusCode),

    #[error("unexpected response from grammar service: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Anything that can turn a text snapshot into a list of grammar errors.
///
/// Implementations report failures to the caller; deciding whether to
/// soft-fail is left to whoever owns the UI.
#[async_trait]
pub trait GrammarCheck: Send + Sync {
    async fn check(&self, text: &str) -> Result<Vec<ErrorDescriptor>, ClientError>;
}

/// HTTP client for the grammar service.
#[derive(Debug, Clone)]
pub struct GrammarClient {
    http: reqwest::Client,
    endpoint: String,
}

impl GrammarClient {
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl GrammarCheck for GrammarClient {
    async fn check(&self, text: &str) -> Result<Vec<ErrorDescriptor>, ClientError> {
        log::debug!("checking {} chars against {}", text.chars().count(), self.endpoint);

        let response = self
            .http
            .post(&self.endpoint)
            .json(&CheckRequest { text })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status));
        }

        let body = response.bytes().await?;
        let errors = wire::normalize(&body)?;
        log::debug!("grammar service reported {} error(s)", errors.len());
        Ok(errors)
    }
}
