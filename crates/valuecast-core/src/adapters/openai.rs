//! Generative-text enhancement of advisory payloads.

use std::env;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::advisory::{RecommendationEnhancer, Recommendations};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest, ReqwestHttpClient};
use crate::retry::RetryConfig;
use crate::throttling::MinIntervalLimiter;
use crate::SourceError;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/responses";

const PROMPT_PREFIX: &str =
    "Enhance these valuation recommendations with concise rationales. Return JSON only.\n";

#[derive(Clone, PartialEq)]
pub struct EnhancerConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
    pub min_interval: Duration,
    pub retry: RetryConfig,
}

impl Default for EnhancerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_owned(),
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            timeout: Duration::from_secs(30),
            min_interval: Duration::from_millis(200),
            retry: RetryConfig::default(),
        }
    }
}

impl EnhancerConfig {
    /// Reads `OPENAI_API_KEY` and `VALUECAST_OPENAI_MODEL`.
    pub fn from_env() -> Self {
        let var = |name: &str| env::var(name).ok().filter(|value| !value.trim().is_empty());
        let mut config = Self {
            api_key: var("OPENAI_API_KEY"),
            ..Self::default()
        };
        if let Some(model) = var("VALUECAST_OPENAI_MODEL") {
            config.model = model;
        }
        config
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }
}

impl std::fmt::Debug for EnhancerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnhancerConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: String,
}

#[derive(Debug, Deserialize)]
struct ResponsesReply {
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

impl ResponsesReply {
    fn text(self) -> String {
        if let Some(text) = self.output_text {
            return text;
        }
        self.output
            .into_iter()
            .flat_map(|item| item.content)
            .filter(|part| part.kind == "output_text")
            .map(|part| part.text)
            .collect()
    }
}

/// Strips an optional Markdown code fence around a JSON document.
fn unfence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

pub struct OpenAiEnhancer {
    config: EnhancerConfig,
    http_client: Arc<dyn HttpClient>,
    limiter: MinIntervalLimiter,
}

impl OpenAiEnhancer {
    pub fn new(config: EnhancerConfig, http_client: Arc<dyn HttpClient>) -> Self {
        let limiter = MinIntervalLimiter::new(config.min_interval);
        Self {
            config,
            http_client,
            limiter,
        }
    }

    pub fn with_reqwest(config: EnhancerConfig) -> Self {
        Self::new(config, Arc::new(ReqwestHttpClient::new()))
    }

    async fn request(&self, api_key: &str, payload: &Recommendations) -> Result<Recommendations, SourceError> {
        let document = serde_json::to_string(payload)
            .map_err(|error| SourceError::internal(format!("payload not serializable: {error}")))?;
        let body = serde_json::to_string(&ResponsesRequest {
            model: &self.config.model,
            input: format!("{PROMPT_PREFIX}{document}"),
        })
        .map_err(|error| SourceError::internal(format!("request not serializable: {error}")))?;
        let auth = HttpAuth::BearerToken(api_key.to_owned());

        let reply = self
            .config
            .retry
            .run("openai.enhance", |_| {
                let request = HttpRequest::post_json(self.config.endpoint.as_str(), body.as_str())
                    .with_auth(&auth)
                    .with_timeout(self.config.timeout);
                async move {
                    self.limiter.acquire().await;
                    let response = self.http_client.execute(request).await?;
                    if response.is_success() {
                        Ok(response.body)
                    } else {
                        Err(response.status_error(&self.config.endpoint))
                    }
                }
            })
            .await?;

        let reply: ResponsesReply = serde_json::from_str(&reply)
            .map_err(|error| SourceError::internal(format!("unexpected reply shape: {error}")))?;
        let text = reply.text();
        serde_json::from_str(unfence(&text))
            .map_err(|error| SourceError::internal(format!("reply is not a recommendations document: {error}")))
    }
}

impl RecommendationEnhancer for OpenAiEnhancer {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn enhance<'a>(
        &'a self,
        payload: Recommendations,
    ) -> Pin<Box<dyn Future<Output = Recommendations> + Send + 'a>> {
        Box::pin(async move {
            let Some(api_key) = self.config.api_key.as_deref() else {
                info!("no OPENAI_API_KEY configured; skipping enhancement");
                return payload;
            };
            match self.request(api_key, &payload).await {
                Ok(enhanced) => enhanced,
                Err(error) => {
                    warn!(%error, "enhancement failed; keeping baseline recommendations");
                    payload
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisory::{build_recommendations, AdvisoryProfile, HistoryMetrics};
    use crate::http_client::{HttpError, HttpResponse, ScriptedHttpClient};

    fn baseline() -> Recommendations {
        build_recommendations(&AdvisoryProfile::default(), &HistoryMetrics::default())
    }

    fn config(api_key: Option<&str>) -> EnhancerConfig {
        EnhancerConfig {
            api_key: api_key.map(str::to_owned),
            min_interval: Duration::ZERO,
            retry: RetryConfig::no_retry(),
            ..EnhancerConfig::default()
        }
    }

    #[tokio::test]
    async fn missing_credentials_skip_the_network() {
        let http = ScriptedHttpClient::default();
        let enhancer = OpenAiEnhancer::new(config(None), Arc::new(http.clone()));

        assert_eq!(enhancer.enhance(baseline()).await, baseline());
        assert_eq!(http.request_count(), 0);
    }

    #[tokio::test]
    async fn well_formed_reply_replaces_payload() {
        let mut improved = baseline();
        improved.risks.push("Customer concentration".to_owned());
        let text = serde_json::to_string(&improved).expect("serializable");
        let reply = serde_json::json!({
            "output": [{"type": "message", "content": [{"type": "output_text", "text": format!("```json\n{text}\n```")}]}]
        });
        let http = ScriptedHttpClient::new([Ok(HttpResponse::ok_json(reply.to_string()))]);
        let enhancer = OpenAiEnhancer::new(config(Some("sk-test")), Arc::new(http.clone()));

        assert_eq!(enhancer.enhance(baseline()).await, improved);
        let request = &http.requests()[0];
        assert_eq!(request.url, DEFAULT_ENDPOINT);
        assert_eq!(request.headers.get("authorization").map(String::as_str), Some("Bearer sk-test"));
        assert!(request.body.as_deref().is_some_and(|body| body.contains("gpt-4o-mini")));
    }

    #[tokio::test]
    async fn any_failure_returns_the_original() {
        for outcome in [
            Err(HttpError::new("connection refused")),
            Ok(HttpResponse::with_status(401, "{}")),
            Ok(HttpResponse::ok_json(r#"{"output_text": "not json"}"#)),
            Ok(HttpResponse::ok_json(r#"{"output_text": "{\"risks\": []}"}"#)),
        ] {
            let enhancer = OpenAiEnhancer::new(
                config(Some("sk-test")),
                Arc::new(ScriptedHttpClient::new([outcome])),
            );
            assert_eq!(enhancer.enhance(baseline()).await, baseline());
        }
    }

    #[test]
    fn debug_output_redacts_the_key() {
        let rendered = format!("{:?}", config(Some("sk-secret")));
        assert!(!rendered.contains("sk-secret"));
    }
}
