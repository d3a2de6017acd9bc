//! OpenAI-compatible chat completions responder.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use fashionbench_core::error::ResponderError;
use fashionbench_core::model::{Answer, AnswerShape};
use fashionbench_core::traits::{
    parse_response, ModelInfo, RespondRequest, Responder, DEFAULT_SYSTEM_PROMPT,
};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// OpenAI-compatible API responder.
pub struct OpenAiResponder {
    api_key: String,
    base_url: String,
    org_id: Option<String>,
    client: reqwest::Client,
}

impl OpenAiResponder {
    pub fn new(api_key: &str, base_url: Option<String>, org_id: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("failed to build HTTP client");

        Self {
            api_key: api_key.to_string(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            org_id,
            client,
        }
    }
}

#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMessage,
}

#[derive(Deserialize)]
struct OpenAiChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl Responder for OpenAiResponder {
    fn name(&self) -> &str {
        "openai"
    }

    #[instrument(skip(self, request), fields(model = %request.model, task = %request.task, example = request.example.id))]
    async fn respond(&self, request: &RespondRequest) -> anyhow::Result<Answer> {
        // Mapping answers are always JSON objects, so JSON mode is safe to ask for.
        let response_format = matches!(request.shape, AnswerShape::Fields { .. })
            .then_some(ResponseFormat {
                kind: "json_object",
            });

        let body = OpenAiRequest {
            model: request.model.clone(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: vec![
                OpenAiMessage {
                    role: "system".to_string(),
                    content: DEFAULT_SYSTEM_PROMPT.to_string(),
                },
                OpenAiMessage {
                    role: "user".to_string(),
                    content: request.prompt(),
                },
            ],
            response_format,
        };

        let mut req = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json");

        if let Some(org) = &self.org_id {
            req = req.header("OpenAI-Organization", org);
        }

        let response = req.json(&body).send().await.map_err(|e| {
            if e.is_timeout() {
                ResponderError::Timeout(DEFAULT_TIMEOUT_SECS)
            } else {
                ResponderError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5)
                .saturating_mul(1000);
            return Err(ResponderError::RateLimited {
                retry_after_ms: retry_after,
            }
            .into());
        }
        if status == 401 {
            let body = response.text().await.unwrap_or_default();
            return Err(ResponderError::AuthenticationFailed(body).into());
        }
        if status == 404 {
            return Err(ResponderError::ModelNotFound(request.model.clone()).into());
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(ResponderError::ApiError {
                status,
                message: body,
            }
            .into());
        }

        let api_response: OpenAiResponse = response.json().await.map_err(|e| {
            ResponderError::ApiError {
                status: 0,
                message: format!("failed to parse response: {e}"),
            }
        })?;

        let content = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        debug!(chars = content.len(), "received reply");

        Ok(parse_response(&content, &request.shape)?)
    }

    fn available_models(&self) -> Vec<ModelInfo> {
        vec![
            ModelInfo {
                id: "gpt-4.1".into(),
                name: "GPT-4.1".into(),
                provider: "openai".into(),
                max_context: 1_047_576,
            },
            ModelInfo {
                id: "gpt-4.1-mini".into(),
                name: "GPT-4.1 Mini".into(),
                provider: "openai".into(),
                max_context: 1_047_576,
            },
            ModelInfo {
                id: "o3-mini".into(),
                name: "o3-mini".into(),
                provider: "openai".into(),
                max_context: 200_000,
            },
        ]
    }
}
