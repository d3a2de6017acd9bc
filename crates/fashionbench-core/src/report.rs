//! Suite report types with JSON persistence and regression detection.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Answer, TaskKind};
use crate::results::{ScoredResult, SuiteSummary};
use crate::statistics::Grade;

/// A complete suite run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Model that was evaluated.
    pub model: String,
    /// Responder that produced the observed answers.
    pub responder: String,
    pub summary: SuiteSummary,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl SuiteReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: SuiteReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Every scored result keyed by `(task, example_id)`.
    pub fn results_by_key(&self) -> BTreeMap<(TaskKind, u64), &ScoredResult> {
        self.summary
            .tasks
            .iter()
            .flat_map(|t| t.results.iter().map(move |r| ((t.task, r.example_id), r)))
            .collect()
    }

    /// The observed answer recorded for an example, if any.
    pub fn observed(&self, task: TaskKind, example_id: u64) -> Option<&Answer> {
        self.summary
            .task(task)?
            .results
            .iter()
            .find(|r| r.example_id == example_id)?
            .observed
            .as_ref()
    }

    /// Compare this report against a baseline to detect regressions.
    ///
    /// A score change larger than `threshold` in either direction counts as
    /// a regression or improvement.
    pub fn compare(&self, baseline: &SuiteReport, threshold: f64) -> RegressionReport {
        let baseline_scores = baseline.results_by_key();
        let current_scores = self.results_by_key();

        let mut regressions = Vec::new();
        let mut improvements = Vec::new();
        let mut unchanged = 0usize;
        let mut new_examples = 0usize;

        for (&(task, example_id), current) in &current_scores {
            let Some(base) = baseline_scores.get(&(task, example_id)) else {
                new_examples += 1;
                continue;
            };
            let change = ScoreChange {
                task,
                example_id,
                baseline_score: base.score,
                current_score: current.score,
                delta: current.score - base.score,
            };
            if change.delta < -threshold {
                regressions.push(change);
            } else if change.delta > threshold {
                improvements.push(change);
            } else {
                unchanged += 1;
            }
        }

        let removed_examples = baseline_scores
            .keys()
            .filter(|k| !current_scores.contains_key(k))
            .count();

        RegressionReport {
            baseline_avg: baseline.summary.overall_avg,
            current_avg: self.summary.overall_avg,
            baseline_grade: baseline.summary.grade,
            current_grade: self.summary.grade,
            regressions,
            improvements,
            unchanged,
            new_examples,
            removed_examples,
        }
    }
}

/// Result of comparing two reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionReport {
    pub baseline_avg: f64,
    pub current_avg: f64,
    pub baseline_grade: Grade,
    pub current_grade: Grade,
    /// Examples whose score went down.
    pub regressions: Vec<ScoreChange>,
    /// Examples whose score went up.
    pub improvements: Vec<ScoreChange>,
    /// Examples with no significant change.
    pub unchanged: usize,
    /// Examples in current but not baseline.
    pub new_examples: usize,
    /// Examples in baseline but not current.
    pub removed_examples: usize,
}

/// A significant score change for one example.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreChange {
    pub task: TaskKind,
    pub example_id: u64,
    pub baseline_score: f64,
    pub current_score: f64,
    pub delta: f64,
}

impl RegressionReport {
    /// Format the regression report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Overall:** {:.3} ({}) -> {:.3} ({})\n\n",
            self.baseline_avg, self.baseline_grade, self.current_avg, self.current_grade
        ));
        md.push_str(&format!(
            "**Summary:** {} regressions, {} improvements, {} unchanged\n\n",
            self.regressions.len(),
            self.improvements.len(),
            self.unchanged
        ));

        let sections = [
            ("Regressions", &self.regressions),
            ("Improvements", &self.improvements),
        ];
        for (title, changes) in sections {
            if changes.is_empty() {
                continue;
            }
            md.push_str(&format!("### {title}\n\n"));
            md.push_str("| Task | Example | Baseline | Current | Delta |\n");
            md.push_str("|------|---------|----------|---------|-------|\n");
            for c in changes {
                md.push_str(&format!(
                    "| {} | {} | {:.3} | {:.3} | {:+.3} |\n",
                    c.task, c.example_id, c.baseline_score, c.current_score, c.delta
                ));
            }
            md.push('\n');
        }

        md
    }

    /// Returns true if there are any regressions.
    pub fn has_regressions(&self) -> bool {
        !self.regressions.is_empty()
    }
}
