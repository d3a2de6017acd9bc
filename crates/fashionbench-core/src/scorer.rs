//! Per-task scoring policies.
//!
//! Each task category gets exactly one policy, chosen when its
//! [`TaskScorer`] is constructed. Scoring itself is pure: the same
//! `(example, observed)` pair always yields the same [`ScoredResult`].

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ScoringError;
use crate::fields::{FieldKind, FieldScorer};
use crate::model::{Answer, Example, TaskKind};
use crate::results::ScoredResult;
use crate::similarity::{
    domain_similarity, exact_match, list_overlap_score, tokenize, validate_weights,
    weighted_score,
};
use crate::synonyms::{SynonymGroup, SynonymTable};

/// Minimum characters for a piece of writing to count as substantial.
pub const MIN_WRITING_CHARS: usize = 50;
/// Distinct/total ratio of significant words required for rich vocabulary.
pub const RICHNESS_FLOOR: f64 = 0.6;
/// Fewer significant words than this never counts as rich.
pub const MIN_SIGNIFICANT_WORDS: usize = 4;
/// Sentence terminators required for the structure check.
pub const MIN_SENTENCE_TERMINATORS: usize = 2;

const WRITING_WEIGHTS: [(&str, f64); 4] = [
    ("length", 0.2),
    ("vocabulary", 0.3),
    ("structure", 0.2),
    ("similarity", 0.3),
];

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "this", "that", "you", "your", "are", "was", "but", "not",
    "all", "our", "its", "it's", "from", "into", "when", "than", "then", "just", "yet", "has",
    "have", "had", "can", "will", "who", "what", "out", "any", "too", "very", "she", "her",
    "his", "him", "they", "them", "their", "there", "were", "been", "being", "also", "more",
];

/// Weights for the detection policy's two components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionWeights {
    /// Weight of synonym-aware similarity on the primary text.
    pub text: f64,
    /// Weight of overlap on enumerated sub-signals.
    pub signals: f64,
}

impl Default for DetectionWeights {
    fn default() -> Self {
        Self {
            text: 0.6,
            signals: 0.4,
        }
    }
}

/// Tunable scoring configuration, usually read from `[scoring]` in the
/// config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Per-task weights for the suite average. Empty means a simple mean.
    pub task_weights: BTreeMap<TaskKind, f64>,
    /// Per-field weights for product extraction. Unlisted fields weigh 1.0.
    pub field_weights: BTreeMap<String, f64>,
    /// Explicit field kinds, overriding inference from name and value.
    pub field_kinds: BTreeMap<String, FieldKind>,
    pub detection_weights: DetectionWeights,
    /// Groups merged into the built-in synonym table.
    pub extra_synonyms: Vec<SynonymGroup>,
}

impl ScoringConfig {
    /// Reject weights that could make a score undefined mid-run.
    pub fn validate(&self) -> Result<(), ScoringError> {
        let detection = BTreeMap::from([
            ("text".to_string(), self.detection_weights.text),
            ("signals".to_string(), self.detection_weights.signals),
        ]);
        validate_weights(&detection)?;
        // Either component may be the only one present for an example.
        if self.detection_weights.text <= 0.0 || self.detection_weights.signals <= 0.0 {
            return Err(ScoringError::InvalidWeights {
                reason: "detection weights must both be positive".into(),
            });
        }

        if let Some((task, w)) = self
            .task_weights
            .iter()
            .find(|(_, w)| !w.is_finite() || **w <= 0.0)
        {
            return Err(ScoringError::InvalidWeights {
                reason: format!("task weight for `{task}` must be a positive number, got {w}"),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum TaskPolicy {
    /// Trend, hashtag and affiliate detection.
    Detection(DetectionWeights),
    /// Product extraction.
    Extraction(FieldScorer),
    /// Style classification with exact-label fallback.
    Classification,
    /// Fashion writing rubric.
    Writing,
}

/// Scores examples of one task category.
#[derive(Debug, Clone)]
pub struct TaskScorer {
    task: TaskKind,
    threshold: f64,
    policy: TaskPolicy,
    synonyms: Arc<SynonymTable>,
}

impl TaskScorer {
    /// Select and validate the policy for `task`.
    pub fn new(
        task: TaskKind,
        config: &ScoringConfig,
        synonyms: Arc<SynonymTable>,
    ) -> Result<Self, ScoringError> {
        config.validate()?;
        let policy = match task {
            TaskKind::TrendDetection
            | TaskKind::HashtagUnderstanding
            | TaskKind::AffiliateDetection => TaskPolicy::Detection(config.detection_weights),
            TaskKind::ProductExtraction => TaskPolicy::Extraction(FieldScorer::new(
                config.field_weights.clone(),
                config.field_kinds.clone(),
            )?),
            TaskKind::StyleClassification => TaskPolicy::Classification,
            TaskKind::FashionWriting => TaskPolicy::Writing,
        };
        Ok(Self {
            task,
            threshold: task.pass_threshold(),
            policy,
            synonyms,
        })
    }

    pub fn task(&self) -> TaskKind {
        self.task
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// The expected answer, or why this example cannot be scored.
    pub fn check<'a>(&self, example: &'a Example) -> Result<&'a Answer, ScoringError> {
        let expected = example.expected_for(self.task)?;
        if let TaskPolicy::Detection(_) = self.policy {
            if expected.primary_text().is_none() && expected.signals().is_empty() {
                return Err(ScoringError::MalformedExample {
                    example_id: example.id,
                    reason: "expected answer has neither text nor signals".into(),
                });
            }
        }
        Ok(expected)
    }

    /// Score an observed answer.
    pub fn score(&self, example: &Example, observed: &Answer) -> Result<ScoredResult, ScoringError> {
        let expected = self.check(example)?;

        let (components, score) = match &self.policy {
            TaskPolicy::Detection(weights) => self.score_detection(expected, observed, weights)?,
            TaskPolicy::Extraction(fields) => {
                let Answer::Fields(want) = expected else {
                    return Err(ScoringError::MalformedExample {
                        example_id: example.id,
                        reason: "expected answer is not a field mapping".into(),
                    });
                };
                let got = match observed {
                    Answer::Fields(map) => Some(map),
                    _ => None,
                };
                let scores = fields.score(want, got, &self.synonyms)?;
                (scores.per_field, scores.combined)
            }
            TaskPolicy::Classification => self.score_classification(expected, observed),
            TaskPolicy::Writing => self.score_writing(expected, observed)?,
        };

        let score = score.clamp(0.0, 1.0);
        Ok(ScoredResult {
            example_id: example.id,
            expected: expected.clone(),
            observed: Some(observed.clone()),
            score,
            passed: score >= self.threshold,
            components,
            failure: None,
            attempts: 0,
            latency_ms: 0,
        })
    }

    /// A zero-score result recording that no observed output was obtained.
    pub fn failed(&self, example: &Example, failure: impl Into<String>) -> ScoredResult {
        ScoredResult {
            example_id: example.id,
            expected: example
                .expected
                .clone()
                .unwrap_or_else(|| Answer::Text(String::new())),
            observed: None,
            score: 0.0,
            passed: false,
            components: BTreeMap::new(),
            failure: Some(failure.into()),
            attempts: 0,
            latency_ms: 0,
        }
    }

    fn score_detection(
        &self,
        expected: &Answer,
        observed: &Answer,
        weights: &DetectionWeights,
    ) -> Result<(BTreeMap<String, f64>, f64), ScoringError> {
        let mut components = BTreeMap::new();
        let mut component_weights = BTreeMap::new();

        if let Some(want) = expected.primary_text() {
            let got = observed.primary_text().unwrap_or_else(|| observed.as_text());
            components.insert(
                "text".to_string(),
                domain_similarity(&want, &got, &self.synonyms),
            );
            component_weights.insert("text".to_string(), weights.text);
        }

        let want = expected.signals();
        if !want.is_empty() {
            components.insert(
                "signals".to_string(),
                list_overlap_score(&want, &observed.items()),
            );
            component_weights.insert("signals".to_string(), weights.signals);
        }

        let score = weighted_score(&components, &component_weights)?;
        Ok((components, score))
    }

    fn score_classification(
        &self,
        expected: &Answer,
        observed: &Answer,
    ) -> (BTreeMap<String, f64>, f64) {
        let want = expected.as_text();
        let got = observed.as_text();

        let similarity = domain_similarity(&want, &got, &self.synonyms);
        let mut components = BTreeMap::from([("similarity".to_string(), similarity)]);
        if similarity >= self.threshold {
            return (components, similarity);
        }

        let exact = label_set(&want)
            .iter()
            .map(|label| exact_match(label, &got))
            .fold(exact_match(&want, &got), f64::max);
        components.insert("exact_label".to_string(), exact);
        (components, similarity.max(exact))
    }

    fn score_writing(
        &self,
        expected: &Answer,
        observed: &Answer,
    ) -> Result<(BTreeMap<String, f64>, f64), ScoringError> {
        let want = expected.as_text();
        let got = observed.as_text();
        let binary = |ok: bool| if ok { 1.0 } else { 0.0 };

        let components = BTreeMap::from([
            (
                "length".to_string(),
                binary(got.trim().chars().count() >= MIN_WRITING_CHARS),
            ),
            ("vocabulary".to_string(), binary(has_rich_vocabulary(&got))),
            (
                "structure".to_string(),
                binary(sentence_terminators(&got) >= MIN_SENTENCE_TERMINATORS),
            ),
            (
                "similarity".to_string(),
                domain_similarity(&want, &got, &self.synonyms),
            ),
        ]);
        let weights: BTreeMap<String, f64> = WRITING_WEIGHTS
            .iter()
            .map(|(k, w)| (k.to_string(), *w))
            .collect();
        let score = weighted_score(&components, &weights)?;
        Ok((components, score))
    }
}

/// Split a label like `"Bohemian/Boho"` into its normalized alternatives.
fn label_set(label: &str) -> Vec<String> {
    label
        .split(['/', '|', ','])
        .map(|l| l.trim().to_lowercase())
        .filter(|l| !l.is_empty())
        .collect()
}

fn has_rich_vocabulary(text: &str) -> bool {
    let significant: Vec<String> = tokenize(text)
        .into_iter()
        .filter(|w| w.chars().count() >= 3)
        .filter(|w| w.chars().any(char::is_alphabetic))
        .filter(|w| !STOP_WORDS.contains(&w.as_str()))
        .collect();
    if significant.len() < MIN_SIGNIFICANT_WORDS {
        return false;
    }
    let distinct: std::collections::HashSet<&String> = significant.iter().collect();
    distinct.len() as f64 / significant.len() as f64 >= RICHNESS_FLOOR
}

/// Count sentence terminators that actually end a sentence (so `$89.99`
/// and `...` mid-run do not count).
fn sentence_terminators(text: &str) -> usize {
    let chars: Vec<char> = text.chars().collect();
    chars
        .iter()
        .enumerate()
        .filter(|(i, c)| {
            matches!(c, '.' | '!' | '?')
                && match chars.get(i + 1) {
                    None => true,
                    Some(next) => next.is_whitespace() || matches!(next, '"' | '\'' | ')'),
                }
        })
        .count()
}
