//! The responder contract and shared prompt/response helpers.
//!
//! A [`Responder`] produces one observed answer per example. Implementations
//! live in `fashionbench-providers`: deterministic stubs, cached replays and
//! live model APIs all look the same to the eval engine.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ResponderError;
use crate::model::{json_to_string, Answer, AnswerShape, Example, TaskKind};

// ---------------------------------------------------------------------------
// Responder trait
// ---------------------------------------------------------------------------

/// A source of observed answers.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Human-readable responder name (e.g. "anthropic").
    fn name(&self) -> &str;

    /// Obtain the observed answer for one example.
    async fn respond(&self, request: &RespondRequest) -> anyhow::Result<Answer>;

    /// List the models this responder can answer for.
    fn available_models(&self) -> Vec<ModelInfo>;
}

/// Everything a responder needs to answer one example.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RespondRequest {
    /// Model identifier (e.g. "claude-sonnet-4-20250514").
    pub model: String,
    pub task: TaskKind,
    pub example: Example,
    /// Shape the answer should be parsed into.
    pub shape: AnswerShape,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl RespondRequest {
    /// Build a request whose shape mirrors the example's expected answer.
    pub fn new(model: impl Into<String>, task: TaskKind, example: Example) -> Self {
        let shape = example
            .expected
            .as_ref()
            .map(Answer::shape)
            .unwrap_or(AnswerShape::Text);
        Self {
            model: model.into(),
            task,
            example,
            shape,
            temperature: 0.0,
            max_tokens: 1024,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// The user prompt sent to live models.
    pub fn prompt(&self) -> String {
        build_prompt(self.task, &self.example, &self.shape)
    }
}

/// Information about an available model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model identifier.
    pub id: String,
    /// Human-readable model name.
    pub name: String,
    /// Responder name.
    pub provider: String,
    /// Maximum context window size in tokens.
    pub max_context: u32,
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

/// Default system prompt for live responders.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a fashion industry analyst. Answer precisely and concisely. When asked for JSON, respond with JSON only.";

fn task_instruction(task: TaskKind) -> &'static str {
    match task {
        TaskKind::TrendDetection => "Identify the fashion trend described by the input.",
        TaskKind::ProductExtraction => {
            "Extract the product information mentioned in the post (brand, price, discount codes, links, platforms)."
        }
        TaskKind::StyleClassification => {
            "Classify the style or aesthetic of the outfit. Answer with the style label only."
        }
        TaskKind::FashionWriting => {
            "Rewrite the caption into engaging fashion content of one or two sentences."
        }
        TaskKind::HashtagUnderstanding => {
            "Explain the hashtag: its meaning, the category of content it marks and its purpose."
        }
        TaskKind::AffiliateDetection => {
            "Decide whether the post contains affiliate marketing or sponsored content and identify its platform, type, codes and disclosures."
        }
    }
}

fn shape_instruction(shape: &AnswerShape) -> String {
    match shape {
        AnswerShape::Text => "Respond with plain text only.".to_string(),
        AnswerShape::List => "Respond with a JSON array of strings only.".to_string(),
        AnswerShape::Fields { keys } if keys.is_empty() => {
            "Respond with a single JSON object only.".to_string()
        }
        AnswerShape::Fields { keys } => format!(
            "Respond with a single JSON object only, using these keys where they apply: {}.",
            keys.join(", ")
        ),
    }
}

/// Build the task-specific user prompt for an example.
pub fn build_prompt(task: TaskKind, example: &Example, shape: &AnswerShape) -> String {
    let mut prompt = format!(
        "Task: {}\n{}\n\nInput: {}\n",
        task.display_name(),
        task_instruction(task),
        example.text
    );
    for (key, value) in &example.attributes {
        if value != &example.text {
            prompt.push_str(&format!("{}: {value}\n", title_case(key)));
        }
    }
    prompt.push('\n');
    prompt.push_str(&shape_instruction(shape));
    prompt
}

fn title_case(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Extract a JSON payload from a model reply.
///
/// Handles:
/// - ```json``` blocks (preferred)
/// - Generic ``` blocks
/// - A bare object or array embedded in prose
pub fn extract_json_block(response: &str) -> Option<String> {
    let mut json_blocks = Vec::new();
    let mut generic_blocks = Vec::new();
    let mut in_block = false;
    let mut is_json_block = false;
    let mut is_generic_block = false;
    let mut current_block = String::new();

    for line in response.lines() {
        let trimmed = line.trim();

        if !in_block && trimmed.starts_with("```") {
            in_block = true;
            let lang = trimmed.trim_start_matches('`').trim().to_lowercase();
            is_json_block = lang == "json";
            is_generic_block = lang.is_empty();
            current_block.clear();
            continue;
        }

        if in_block && trimmed == "```" {
            in_block = false;
            if is_json_block {
                json_blocks.push(current_block.clone());
            } else if is_generic_block {
                generic_blocks.push(current_block.clone());
            }
            current_block.clear();
            continue;
        }

        if in_block {
            if !current_block.is_empty() {
                current_block.push('\n');
            }
            current_block.push_str(line);
        }
    }

    // Truncated (unclosed) block
    if in_block && !current_block.is_empty() {
        if is_json_block {
            json_blocks.push(current_block);
        } else if is_generic_block {
            generic_blocks.push(current_block);
        }
    }

    if let Some(block) = json_blocks.into_iter().next() {
        return Some(block);
    }
    if let Some(block) = generic_blocks.into_iter().next() {
        return Some(block);
    }

    // Bare payload: outermost object or array span.
    let start = response.find(['{', '['])?;
    let close = if response[start..].starts_with('{') { '}' } else { ']' };
    let end = response.rfind(close)?;
    (end > start).then(|| response[start..=end].to_string())
}

/// Parse a model reply into an answer of the requested shape.
///
/// Text answers are taken as-is (minus surrounding quotes and fences). List
/// answers fall back to text, which scoring splits into items. Mapping
/// answers must contain a JSON object.
pub fn parse_response(content: &str, shape: &AnswerShape) -> Result<Answer, ResponderError> {
    match shape {
        AnswerShape::Text => {
            let text = match extract_fenced_text(content) {
                Some(inner) => inner,
                None => content.trim().to_string(),
            };
            Ok(Answer::Text(strip_quotes(&text).to_string()))
        }
        AnswerShape::List => {
            let parsed = extract_json_block(content)
                .and_then(|json| serde_json::from_str::<serde_json::Value>(&json).ok());
            match parsed {
                Some(serde_json::Value::Array(values)) => {
                    Ok(Answer::List(values.iter().map(json_to_string).collect()))
                }
                _ => Ok(Answer::Text(content.trim().to_string())),
            }
        }
        AnswerShape::Fields { .. } => {
            let json = extract_json_block(content).ok_or_else(|| {
                ResponderError::UnparseableResponse("no JSON object in response".into())
            })?;
            let value: serde_json::Value = serde_json::from_str(&json)
                .map_err(|e| ResponderError::UnparseableResponse(e.to_string()))?;
            if !value.is_object() {
                return Err(ResponderError::UnparseableResponse(
                    "expected a JSON object".into(),
                ));
            }
            Answer::from_json(value).ok_or_else(|| {
                ResponderError::UnparseableResponse("expected a JSON object".into())
            })
        }
    }
}

fn extract_fenced_text(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if !trimmed.starts_with("```") {
        return None;
    }
    let body: Vec<&str> = trimmed
        .lines()
        .skip(1)
        .take_while(|line| line.trim() != "```")
        .collect();
    Some(body.join("\n").trim().to_string())
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        &s[1..s.len() - 1]
    } else {
        s
    }
}
