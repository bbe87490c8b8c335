use std::time::Duration;

use reqwest::{RequestBuilder, Response};
use tracing::{debug, instrument, warn};

use crate::gemini::error::GeminiError;
use crate::gemini::types::{GenerateContentRequest, GenerateContentResponse, ModelInfo, ModelList};
use crate::objection::prompt::PromptBundle;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-flash-latest";

const API_KEY_HEADER: &str = "x-goog-api-key";
const MODELS_PAGE_SIZE: &str = "1000";

/// Gemini REST client.
///
/// Holds configuration only. Every call builds its own `reqwest::Client`,
/// sends exactly one request per call (or one per page when listing) and
/// never retries.
#[derive(Clone)]
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    timeout_secs: Option<u64>,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout_secs: None,
        }
    }

    /// Bounds each request; `None` waits for as long as the upstream takes.
    pub fn with_timeout(mut self, timeout_secs: Option<u64>) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn generate_content_url(&self, model: &str) -> String {
        generate_content_url(&self.base_url, model)
    }

    #[instrument(level = "debug", skip(self, bundle), fields(parts = bundle.parts().len()))]
    pub async fn generate_content(
        &self,
        model: &str,
        bundle: &PromptBundle,
    ) -> Result<String, GeminiError> {
        let url = self.generate_content_url(model);
        let payload = GenerateContentRequest::from(bundle);
        debug!(%url, "sending generateContent request");

        let client = reqwest::Client::new();
        let response = self.send(client.post(&url).json(&payload)).await?;
        let body: GenerateContentResponse = response.json().await?;

        body.text().ok_or_else(|| GeminiError::EmptyResponse {
            block_reason: body.block_reason(),
        })
    }

    /// Lists every model visible to the key, following pagination.
    #[instrument(level = "debug", skip(self))]
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, GeminiError> {
        let url = format!("{}/models", self.base_url);
        let client = reqwest::Client::new();
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = client.get(&url).query(&[("pageSize", MODELS_PAGE_SIZE)]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let page: ModelList = self.send(request).await?.json().await?;
            debug!(count = page.models.len(), "received models page");
            models.extend(page.models);

            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) if page_token.as_deref() != Some(token.as_str()) => {
                    page_token = Some(token);
                }
                _ => break,
            }
        }

        Ok(models)
    }

    async fn send(&self, mut request: RequestBuilder) -> Result<Response, GeminiError> {
        request = request.header(API_KEY_HEADER, &self.api_key);
        if let Some(timeout_secs) = self.timeout_secs {
            request = request.timeout(Duration::from_secs(timeout_secs));
        }

        let response = request.send().await?;
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        warn!(%status, "Gemini API error");
        Err(GeminiError::Api { status, body })
    }
}

/// Accepts both `gemini-x` and `models/gemini-x`.
pub fn normalize_model(model: &str) -> &str {
    let model = model.trim();
    model.strip_prefix("models/").unwrap_or(model)
}

fn generate_content_url(base_url: &str, model: &str) -> String {
    format!(
        "{}/models/{}:generateContent",
        base_url.trim_end_matches('/'),
        normalize_model(model)
    )
}
