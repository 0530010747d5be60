//! HTTP plumbing shared by the provider clients.

use std::time::Duration;

use chatsim_core::{ProviderConfig, ProviderKind};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::providers::provider::ProviderError;
use crate::providers::query_dump::QueryDump;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// A configured completion endpoint with bearer authorization.
#[derive(Clone)]
pub struct CompletionEndpoint {
    http_client: reqwest::Client,
    kind: ProviderKind,
    url: String,
    api_key: Option<String>,
    dump_queries: bool,
}

impl CompletionEndpoint {
    pub fn new(kind: ProviderKind, config: &ProviderConfig) -> Result<Self, ProviderError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http_client,
            kind,
            url: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            dump_queries: false,
        })
    }

    /// Enable or disable debug query logging
    pub fn with_dump_queries(mut self, enabled: bool) -> Self {
        self.dump_queries = enabled;
        self
    }

    fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(api_key) = &self.api_key {
            let auth_value = format!("Bearer {}", api_key);
            if let Ok(header_value) = HeaderValue::from_str(&auth_value) {
                headers.insert(AUTHORIZATION, header_value);
            }
        }

        headers
    }

    /// POST `body` and return the raw response text.
    ///
    /// A non-success status fails with [`ProviderError::UpstreamRequestFailed`].
    pub async fn post<B: Serialize + Sync>(
        &self,
        model: &str,
        body: &B,
    ) -> Result<String, ProviderError> {
        let dump = if self.dump_queries
            && let Ok(val) = serde_json::to_value(body)
        {
            QueryDump::request(self.kind, model, &val).await
        } else {
            None
        };

        let response = self
            .http_client
            .post(&self.url)
            .headers(self.build_headers())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                provider = %self.kind,
                status = status.as_u16(),
                "upstream request failed"
            );
            return Err(ProviderError::UpstreamRequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        let response_text = response.text().await?;

        if let Some(dump) = &dump
            && let Ok(val) = serde_json::from_str::<Value>(&response_text)
        {
            dump.response(&val).await;
        }

        Ok(response_text)
    }
}

/// Decode a response envelope, keeping a body preview in the error.
pub fn decode_envelope<T: for<'de> Deserialize<'de>>(
    kind: ProviderKind,
    response_text: &str,
) -> Result<T, ProviderError> {
    serde_json::from_str(response_text).map_err(|e| {
        let preview = if response_text.len() > 500 {
            &response_text[..response_text.floor_char_boundary(500)]
        } else {
            response_text
        };
        ProviderError::MalformedResponse(format!(
            "Failed to parse {kind} response envelope: {e}\nBody preview: {preview}"
        ))
    })
}

/// OpenAI-compatible chat completion envelope
#[derive(Debug, Deserialize)]
pub struct ChatCompletionsResponse {
    pub choices: Vec<Choice>,
}

/// Choice in the response
#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionsResponse {
    /// Text of the first choice, if any.
    pub fn into_first_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
    }
}

/// Reject a missing or blank completion.
pub fn require_text(kind: ProviderKind, text: Option<String>) -> Result<String, ProviderError> {
    text.filter(|t| !t.trim().is_empty()).ok_or_else(|| {
        ProviderError::MalformedResponse(format!("no completion text in {kind} response"))
    })
}
