//! Core data model types for fashionbench.
//!
//! These are the fundamental types that the entire fashionbench system uses
//! to represent task categories, examples, answers and datasets.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ScoringError;

/// The evaluation task categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    TrendDetection,
    ProductExtraction,
    StyleClassification,
    FashionWriting,
    HashtagUnderstanding,
    AffiliateDetection,
}

impl TaskKind {
    /// Every task, in suite order.
    pub const ALL: [TaskKind; 6] = [
        TaskKind::TrendDetection,
        TaskKind::ProductExtraction,
        TaskKind::StyleClassification,
        TaskKind::FashionWriting,
        TaskKind::HashtagUnderstanding,
        TaskKind::AffiliateDetection,
    ];

    /// Machine name, also the dataset file stem.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::TrendDetection => "trend_detection",
            TaskKind::ProductExtraction => "product_extraction",
            TaskKind::StyleClassification => "style_classification",
            TaskKind::FashionWriting => "fashion_writing",
            TaskKind::HashtagUnderstanding => "hashtag_understanding",
            TaskKind::AffiliateDetection => "affiliate_detection",
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            TaskKind::TrendDetection => "Trend Detection",
            TaskKind::ProductExtraction => "Product Extraction",
            TaskKind::StyleClassification => "Style Classification",
            TaskKind::FashionWriting => "Fashion Writing",
            TaskKind::HashtagUnderstanding => "Hashtag Understanding",
            TaskKind::AffiliateDetection => "Affiliate Detection",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TaskKind::TrendDetection => "Identify fashion trends from social media and runway data",
            TaskKind::ProductExtraction => {
                "Extract structured product info from unstructured content"
            }
            TaskKind::StyleClassification => "Classify fashion styles and aesthetics",
            TaskKind::FashionWriting => "Generate engaging fashion content and captions",
            TaskKind::HashtagUnderstanding => {
                "Understand fashion-specific hashtags and their context"
            }
            TaskKind::AffiliateDetection => "Detect affiliate marketing and sponsored content",
        }
    }

    /// Default dataset file name for this task.
    pub fn dataset_file(&self) -> String {
        format!("{}.jsonl", self.as_str())
    }

    /// Minimum score at or above which a result passes.
    pub fn pass_threshold(&self) -> f64 {
        match self {
            TaskKind::FashionWriting => 0.6,
            _ => 0.7,
        }
    }

    /// Check that `expected` has the shape this task scores.
    fn accepts(&self, expected: &Answer) -> Result<(), String> {
        let required = match self {
            TaskKind::ProductExtraction => "a field mapping",
            TaskKind::StyleClassification | TaskKind::FashionWriting => "a string",
            _ => return Ok(()),
        };
        let ok = matches!(
            (self, expected),
            (TaskKind::ProductExtraction, Answer::Fields(_))
                | (TaskKind::StyleClassification, Answer::Text(_))
                | (TaskKind::FashionWriting, Answer::Text(_))
        );
        if ok {
            Ok(())
        } else {
            Err(format!(
                "{} expects {required}, found {}",
                self.as_str(),
                expected.shape().name()
            ))
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        TaskKind::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| {
                let valid: Vec<&str> = TaskKind::ALL.iter().map(|t| t.as_str()).collect();
                format!("unknown task: {s} (expected one of: {})", valid.join(", "))
            })
    }
}

/// A ground-truth or observed answer. Its shape depends on the task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Text(String),
    List(Vec<String>),
    Fields(BTreeMap<String, FieldValue>),
}

/// A single value inside a structured answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

/// The shape of an answer, without its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AnswerShape {
    Text,
    List,
    Fields { keys: Vec<String> },
}

impl AnswerShape {
    pub fn name(&self) -> &'static str {
        match self {
            AnswerShape::Text => "string",
            AnswerShape::List => "list",
            AnswerShape::Fields { .. } => "mapping",
        }
    }
}

impl Answer {
    pub fn shape(&self) -> AnswerShape {
        match self {
            Answer::Text(_) => AnswerShape::Text,
            Answer::List(_) => AnswerShape::List,
            Answer::Fields(fields) => AnswerShape::Fields {
                keys: fields.keys().cloned().collect(),
            },
        }
    }

    /// True when there is nothing to compare against.
    pub fn is_empty(&self) -> bool {
        match self {
            Answer::Text(s) => s.trim().is_empty(),
            Answer::List(items) => items.iter().all(|i| i.trim().is_empty()),
            Answer::Fields(fields) => fields.is_empty(),
        }
    }

    /// The free-text part of the answer, if it has one.
    ///
    /// Mappings contribute their text-valued fields, joined by spaces in key
    /// order. Lists have no primary text.
    pub fn primary_text(&self) -> Option<String> {
        match self {
            Answer::Text(s) => Some(s.clone()),
            Answer::List(_) => None,
            Answer::Fields(fields) => {
                let parts: Vec<&str> = fields
                    .values()
                    .filter_map(|v| match v {
                        FieldValue::Text(s) if !s.trim().is_empty() => Some(s.as_str()),
                        _ => None,
                    })
                    .collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.join(" "))
                }
            }
        }
    }

    /// Enumerated sub-signals: list items, plus flattened `key:item` and
    /// `key=value` markers for mappings. Plain text has none.
    pub fn signals(&self) -> Vec<String> {
        match self {
            Answer::Text(_) => Vec::new(),
            Answer::List(items) => items.clone(),
            Answer::Fields(fields) => {
                let mut out = Vec::new();
                for (key, value) in fields {
                    match value {
                        FieldValue::List(items) => {
                            out.extend(items.iter().map(|item| format!("{key}:{item}")))
                        }
                        FieldValue::Bool(_) | FieldValue::Number(_) => {
                            out.push(format!("{key}={}", value.as_text()))
                        }
                        FieldValue::Text(_) => {}
                    }
                }
                out
            }
        }
    }

    /// Best-effort flat text rendering, used when an observed answer has to be
    /// compared against a textual expectation.
    pub fn as_text(&self) -> String {
        match self {
            Answer::Text(s) => s.clone(),
            Answer::List(items) => items.join(", "),
            Answer::Fields(_) => self.primary_text().unwrap_or_default(),
        }
    }

    /// Items of the answer for set comparison. Text is split on commas,
    /// semicolons and newlines.
    pub fn items(&self) -> Vec<String> {
        match self {
            Answer::Text(s) => split_items(s),
            _ => self.signals(),
        }
    }

    /// Compact single-line rendering for tables and logs.
    pub fn render(&self) -> String {
        match self {
            Answer::Text(s) => s.clone(),
            other => serde_json::to_string(other).unwrap_or_default(),
        }
    }
}

impl Answer {
    /// Convert loosely typed JSON into an answer.
    ///
    /// `null` yields `None`; scalars become text; list items and nested
    /// values are flattened to strings; mapping entries that are `null` are
    /// dropped.
    pub fn from_json(value: serde_json::Value) -> Option<Answer> {
        use serde_json::Value;
        match value {
            Value::Null => None,
            Value::String(s) => Some(Answer::Text(s)),
            scalar @ (Value::Bool(_) | Value::Number(_)) => Some(Answer::Text(scalar.to_string())),
            Value::Array(items) => Some(Answer::List(items.iter().map(json_to_string).collect())),
            Value::Object(object) => Some(Answer::Fields(
                object
                    .into_iter()
                    .filter_map(|(key, value)| FieldValue::from_json(value).map(|v| (key, v)))
                    .collect(),
            )),
        }
    }
}

impl From<&str> for Answer {
    fn from(s: &str) -> Self {
        Answer::Text(s.to_string())
    }
}

impl FieldValue {
    /// Flat text form used for exact and domain comparison.
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                format!("{}", *n as i64)
            }
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Text(s) => s.clone(),
            FieldValue::List(items) => items.join(", "),
        }
    }

    /// Item form used for list comparison. Text splits like [`Answer::items`].
    pub fn as_items(&self) -> Vec<String> {
        match self {
            FieldValue::List(items) => items.clone(),
            FieldValue::Text(s) => split_items(s),
            other => vec![other.as_text()],
        }
    }
}

/// Split free text into list items on commas, semicolons and newlines.
fn split_items(s: &str) -> Vec<String> {
    s.split([',', ';', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

impl FieldValue {
    /// Convert one JSON value of a mapping. `null` yields `None`.
    pub fn from_json(value: serde_json::Value) -> Option<FieldValue> {
        use serde_json::Value;
        let field = match value {
            Value::Null => return None,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => match n.as_f64() {
                Some(f) => FieldValue::Number(f),
                None => FieldValue::Text(n.to_string()),
            },
            Value::String(s) => FieldValue::Text(s),
            Value::Array(items) => FieldValue::List(items.iter().map(json_to_string).collect()),
            object @ Value::Object(_) => FieldValue::Text(object.to_string()),
        };
        Some(field)
    }
}

/// Strings as-is, everything else as compact JSON.
pub(crate) fn json_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

/// One input/expected-output pair used for evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Example {
    /// Unique identifier within its dataset.
    pub id: u64,
    /// Input or context shown to the model.
    #[serde(default)]
    pub text: String,
    /// Ground truth. Absent only for malformed records.
    #[serde(default)]
    pub expected: Option<Answer>,
    /// Task label.
    #[serde(default)]
    pub category: String,
    /// Additional prompt inputs (question, hashtag, style...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl Example {
    pub fn new(id: u64, text: impl Into<String>, expected: Answer, task: TaskKind) -> Self {
        Self {
            id,
            text: text.into(),
            expected: Some(expected),
            category: task.as_str().to_string(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: &str, value: &str) -> Self {
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }

    /// The expected answer, if this example can be scored for `task`.
    pub fn expected_for(&self, task: TaskKind) -> Result<&Answer, ScoringError> {
        let malformed = |reason: String| ScoringError::MalformedExample {
            example_id: self.id,
            reason,
        };
        let expected = self
            .expected
            .as_ref()
            .ok_or_else(|| malformed("missing expected answer".into()))?;
        if expected.is_empty() {
            return Err(malformed("expected answer is empty".into()));
        }
        task.accepts(expected).map_err(malformed)?;
        Ok(expected)
    }
}

/// An ordered collection of examples for one task category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub task: TaskKind,
    pub examples: Vec<Example>,
}

impl Dataset {
    /// Build a dataset, rejecting duplicate example ids.
    pub fn new(task: TaskKind, examples: Vec<Example>) -> anyhow::Result<Self> {
        let mut seen = HashSet::new();
        for example in &examples {
            anyhow::ensure!(
                seen.insert(example.id),
                "duplicate example id {} in {task} dataset",
                example.id
            );
        }
        Ok(Self { task, examples })
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }
}
