//! Ollama (local LLM) responder.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use fashionbench_core::error::ResponderError;
use fashionbench_core::model::{Answer, AnswerShape};
use fashionbench_core::traits::{
    parse_response, ModelInfo, RespondRequest, Responder, DEFAULT_SYSTEM_PROMPT,
};

const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_TIMEOUT_SECS: u64 = 300; // Local models are slower

/// Ollama local LLM responder.
pub struct OllamaResponder {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaResponder {
    pub fn new(base_url: &str) -> Self {
        let base = if base_url.is_empty() {
            DEFAULT_BASE_URL
        } else {
            base_url
        };

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("failed to build HTTP client");

        Self {
            base_url: base.to_string(),
            client,
        }
    }

    fn unreachable(&self) -> ResponderError {
        ResponderError::NetworkError(format!(
            "Ollama not reachable at {}. Is it running? Start with: ollama serve",
            self.base_url
        ))
    }
}

#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f64,
    num_predict: u32,
}

#[derive(Deserialize)]
struct OllamaResponse {
    message: OllamaResponseMessage,
}

#[derive(Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct OllamaTagsResponse {
    models: Vec<OllamaModelEntry>,
}

#[derive(Deserialize)]
struct OllamaModelEntry {
    name: String,
}

#[async_trait]
impl Responder for OllamaResponder {
    fn name(&self) -> &str {
        "ollama"
    }

    #[instrument(skip(self, request), fields(model = %request.model, task = %request.task, example = request.example.id))]
    async fn respond(&self, request: &RespondRequest) -> anyhow::Result<Answer> {
        let body = OllamaRequest {
            model: request.model.clone(),
            messages: vec![
                OllamaMessage {
                    role: "system".to_string(),
                    content: DEFAULT_SYSTEM_PROMPT.to_string(),
                },
                OllamaMessage {
                    role: "user".to_string(),
                    content: request.prompt(),
                },
            ],
            stream: false,
            format: matches!(request.shape, AnswerShape::Fields { .. }).then_some("json"),
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ResponderError::Timeout(DEFAULT_TIMEOUT_SECS)
                } else if e.is_connect() {
                    self.unreachable()
                } else {
                    ResponderError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status == 404 {
            return Err(ResponderError::ModelNotFound(format!(
                "Model '{}' not found locally. Pull it with: ollama pull {}",
                request.model, request.model
            ))
            .into());
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(ResponderError::ApiError {
                status,
                message: body,
            }
            .into());
        }

        let api_response: OllamaResponse =
            response.json().await.map_err(|e| ResponderError::ApiError {
                status: 0,
                message: format!("failed to parse response: {e}"),
            })?;

        let content = api_response.message.content;
        debug!(chars = content.len(), "received reply");

        Ok(parse_response(&content, &request.shape)?)
    }

    fn available_models(&self) -> Vec<ModelInfo> {
        // Local models are only known at runtime; see `list_models_async`.
        vec![]
    }
}

impl OllamaResponder {
    /// Dynamically fetch available models from the Ollama instance.
    pub async fn list_models_async(&self) -> anyhow::Result<Vec<ModelInfo>> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(|_| self.unreachable())?;

        let tags: OllamaTagsResponse =
            response.json().await.map_err(|e| ResponderError::ApiError {
                status: 0,
                message: format!("failed to parse tags response: {e}"),
            })?;

        Ok(tags
            .models
            .into_iter()
            .map(|m| ModelInfo {
                id: m.name.clone(),
                name: m.name,
                provider: "ollama".into(),
                max_context: 0,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fashionbench_core::model::{Example, FieldValue, TaskKind};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn writing_request() -> RespondRequest {
        let example = Example::new(
            1,
            "White sneakers with a slip dress",
            Answer::from("Statement sneakers that steal the show."),
            TaskKind::FashionWriting,
        )
        .with_attribute("original", "new shoes");
        RespondRequest::new("llama3.1:70b", TaskKind::FashionWriting, example)
            .with_temperature(0.2)
    }

    #[tokio::test]
    async fn successful_answer() {
        let server = MockServer::start().await;

        let response_body = serde_json::json!({
            "message": {"role": "assistant", "content": "Fresh white sneakers, effortlessly cool."},
            "model": "llama3.1:70b",
            "done": true
        });

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({
                "stream": false,
                "options": {"temperature": 0.2}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(&response_body))
            .mount(&server)
            .await;

        let responder = OllamaResponder::new(&server.uri());
        let answer = responder.respond(&writing_request()).await.unwrap();
        assert_eq!(
            answer,
            Answer::from("Fresh white sneakers, effortlessly cool.")
        );
    }

    #[tokio::test]
    async fn structured_tasks_request_json_format() {
        let server = MockServer::start().await;

        let reply = r#"{"brand": "Zara", "price": "$89.99", "link_mentioned": true}"#;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({"format": "json"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": {"role": "assistant", "content": reply},
                "done": true
            })))
            .mount(&server)
            .await;

        let expected: Answer =
            serde_json::from_str(r#"{"brand": "Zara", "price": "$89.99"}"#).unwrap();
        let example = Example::new(
            2,
            "Obsessed with this Zara blazer, only $89.99! Link in bio",
            expected,
            TaskKind::ProductExtraction,
        );
        let request = RespondRequest::new("llama3.1:70b", TaskKind::ProductExtraction, example);

        let responder = OllamaResponder::new(&server.uri());
        let answer = responder.respond(&request).await.unwrap();
        let Answer::Fields(fields) = answer else {
            panic!("expected a field mapping");
        };
        assert_eq!(fields["brand"], FieldValue::from("Zara"));
        assert_eq!(fields["link_mentioned"], FieldValue::Bool(true));
    }

    #[tokio::test]
    async fn model_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
            .mount(&server)
            .await;

        let responder = OllamaResponder::new(&server.uri());
        let err = responder.respond(&writing_request()).await.unwrap_err();
        assert!(err.to_string().contains("not found"));
        assert!(err.downcast_ref::<ResponderError>().unwrap().is_permanent());
    }

    #[tokio::test]
    async fn dynamic_model_listing() {
        let server = MockServer::start().await;

        let response_body = serde_json::json!({
            "models": [
                {"name": "llama3.1:70b", "size": 40000000000_u64},
                {"name": "mistral:7b", "size": 4000000000_u64}
            ]
        });

        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&response_body))
            .mount(&server)
            .await;

        let responder = OllamaResponder::new(&server.uri());
        let models = responder.list_models_async().await.unwrap();
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].id, "llama3.1:70b");
    }
}
