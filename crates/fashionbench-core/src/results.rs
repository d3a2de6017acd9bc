//! Result types produced by scoring and aggregation.
//!
//! All of these are immutable records: a `ScoredResult` is created once per
//! example, summaries are derived once from completed result sequences.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{Answer, TaskKind};
use crate::statistics::{Grade, TaskStatus};

/// The outcome of scoring one example's observed output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    pub example_id: u64,
    pub expected: Answer,
    /// `None` when the responder failed.
    pub observed: Option<Answer>,
    /// Always within `[0, 1]`.
    pub score: f64,
    /// `score >= threshold` for the task.
    pub passed: bool,
    /// Named sub-scores that went into `score`.
    #[serde(default)]
    pub components: BTreeMap<String, f64>,
    /// Responder failure, if the observed output could not be obtained.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    /// Responder attempts made (including retries).
    #[serde(default)]
    pub attempts: u32,
    /// Time spent obtaining the observed output.
    #[serde(default)]
    pub latency_ms: u64,
}

impl ScoredResult {
    /// True if this result records a responder failure rather than a
    /// genuinely scored answer.
    pub fn is_failure(&self) -> bool {
        self.failure.is_some()
    }
}

/// An example excluded from scoring because it is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MalformedRecord {
    pub example_id: u64,
    pub reason: String,
}

/// Aggregated statistics over one task category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSummary {
    pub task: TaskKind,
    pub task_name: String,
    /// Scored examples (malformed ones excluded).
    pub total_examples: usize,
    pub passed_count: usize,
    pub avg_score: f64,
    pub pass_rate: f64,
    pub threshold: f64,
    /// Results whose responder failed (scored 0.0).
    pub failed_responses: usize,
    pub status: TaskStatus,
    /// In dataset order.
    pub results: Vec<ScoredResult>,
    #[serde(default)]
    pub malformed: Vec<MalformedRecord>,
}

/// Aggregated statistics over a whole suite run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteSummary {
    pub tasks: Vec<TaskSummary>,
    pub total_examples: usize,
    pub total_passed: usize,
    pub pass_rate: f64,
    /// Mean of per-task averages (weighted if task weights are configured).
    pub overall_avg: f64,
    pub grade: Grade,
    pub failed_responses: usize,
    pub malformed_examples: usize,
}

impl SuiteSummary {
    pub fn task(&self, task: TaskKind) -> Option<&TaskSummary> {
        self.tasks.iter().find(|t| t.task == task)
    }
}
