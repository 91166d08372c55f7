use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use tracing::debug;

use crate::{
    config::ConfigError,
    error::{ReplError, ReplResult},
    protocol::{CompletionsResponse, EvaluationRequest, EvaluationResponse},
};

/// Transport to the remote evaluator.
///
/// `path` is relative to the evaluator's base URL and already includes the
/// session's base path, e.g. `"eval"` or `"api/eval"`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(
        &self,
        path: &str,
        request: &EvaluationRequest,
    ) -> ReplResult<EvaluationResponse>;

    async fn completions(&self, path: &str, prefix: &str) -> ReplResult<CompletionsResponse>;
}

#[derive(Debug, Clone)]
pub struct HttpEvaluator {
    client: Client,
    base_url: Url,
}

impl HttpEvaluator {
    pub fn new(api_url: &str, timeout: Option<Duration>) -> ReplResult<Self> {
        // without a trailing slash `join` would replace the last segment
        let normalized = if api_url.ends_with('/') {
            api_url.to_string()
        } else {
            format!("{}/", api_url)
        };
        let base_url = Url::parse(&normalized)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", api_url, e)))?;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ReplError::transport(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> ReplResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ReplError::transport(format!("invalid endpoint '{}': {}", path, e)))
    }

    fn check_status(response: Response) -> ReplResult<Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(ReplError::transport(format!("evaluator returned {}", status)))
        }
    }
}

#[async_trait]
impl Evaluator for HttpEvaluator {
    #[tracing::instrument(skip(self))]
    async fn evaluate(
        &self,
        path: &str,
        request: &EvaluationRequest,
    ) -> ReplResult<EvaluationResponse> {
        let url = self.url(path)?;
        debug!("POST {}", url);
        let response = self.client.post(url).form(request).send().await?;
        let response = Self::check_status(response)?;
        Ok(response.json::<EvaluationResponse>().await?)
    }

    #[tracing::instrument(skip(self))]
    async fn completions(&self, path: &str, prefix: &str) -> ReplResult<CompletionsResponse> {
        let url = self.url(path)?;
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .query(&[("name", prefix)])
            .send()
            .await?;
        let response = Self::check_status(response)?;
        Ok(response.json::<CompletionsResponse>().await?)
    }
}
