//! Aggregation of scored results into task and suite summaries.
//!
//! Summaries never fail: an empty result sequence averages to 0.0.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::TaskKind;
use crate::results::{MalformedRecord, ScoredResult, SuiteSummary, TaskSummary};

/// Letter grade for an overall average score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
}

impl Grade {
    pub fn message(&self) -> &'static str {
        match self {
            Grade::A => "Excellent performance on fashion domain tasks!",
            Grade::B => "Good performance with room for improvement.",
            Grade::C => "Moderate performance. Consider fine-tuning.",
            Grade::D => "Needs significant improvement for fashion tasks.",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
        };
        f.write_str(letter)
    }
}

/// Map an average score to a grade. Bands include their lower bound.
pub fn grade(overall_avg: f64) -> Grade {
    if overall_avg >= 0.8 {
        Grade::A
    } else if overall_avg >= 0.7 {
        Grade::B
    } else if overall_avg >= 0.6 {
        Grade::C
    } else {
        Grade::D
    }
}

/// Coarse status label for a task, derived from its pass rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Excellent,
    Good,
    NeedsWork,
}

impl TaskStatus {
    pub fn from_pass_rate(pass_rate: f64) -> Self {
        if pass_rate >= 0.8 {
            TaskStatus::Excellent
        } else if pass_rate >= 0.6 {
            TaskStatus::Good
        } else {
            TaskStatus::NeedsWork
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TaskStatus::Excellent => "Excellent",
            TaskStatus::Good => "Good",
            TaskStatus::NeedsWork => "Needs Work",
        })
    }
}

/// Arithmetic mean, 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// Reduce one task's results (in dataset order) to a summary.
pub fn summarize(
    task: TaskKind,
    results: Vec<ScoredResult>,
    malformed: Vec<MalformedRecord>,
) -> TaskSummary {
    let scores: Vec<f64> = results.iter().map(|r| r.score).collect();
    let passed_count = results.iter().filter(|r| r.passed).count();
    let failed_responses = results.iter().filter(|r| r.is_failure()).count();
    let pass_rate = ratio(passed_count, results.len());

    TaskSummary {
        task,
        task_name: task.display_name().to_string(),
        total_examples: results.len(),
        passed_count,
        avg_score: mean(&scores),
        pass_rate,
        threshold: task.pass_threshold(),
        failed_responses,
        status: TaskStatus::from_pass_rate(pass_rate),
        results,
        malformed,
    }
}

/// Fold task summaries into a suite summary.
///
/// `overall_avg` is the simple mean of per-task averages, or the weighted
/// mean when `task_weights` is non-empty (tasks without a weight count 1.0).
/// Tasks with no scored examples still contribute their 0.0 average.
pub fn summarize_suite(
    tasks: Vec<TaskSummary>,
    task_weights: &BTreeMap<TaskKind, f64>,
) -> SuiteSummary {
    let overall_avg = if task_weights.is_empty() {
        mean(&tasks.iter().map(|t| t.avg_score).collect::<Vec<_>>())
    } else {
        let (sum, total) = tasks.iter().fold((0.0, 0.0), |(sum, total), t| {
            let w = task_weights.get(&t.task).copied().unwrap_or(1.0);
            (sum + t.avg_score * w, total + w)
        });
        if total > 0.0 {
            sum / total
        } else {
            0.0
        }
    };

    let total_examples = tasks.iter().map(|t| t.total_examples).sum();
    let total_passed = tasks.iter().map(|t| t.passed_count).sum();
    let failed_responses = tasks.iter().map(|t| t.failed_responses).sum();
    let malformed_examples = tasks.iter().map(|t| t.malformed.len()).sum();

    SuiteSummary {
        total_examples,
        total_passed,
        pass_rate: ratio(total_passed, total_examples),
        overall_avg,
        grade: grade(overall_avg),
        failed_responses,
        malformed_examples,
        tasks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Answer;

    fn result(id: u64, score: f64, threshold: f64) -> ScoredResult {
        ScoredResult {
            example_id: id,
            expected: Answer::from("x"),
            observed: Some(Answer::from("x")),
            score,
            passed: score >= threshold,
            components: BTreeMap::new(),
            failure: None,
            attempts: 1,
            latency_ms: 0,
        }
    }

    #[test]
    fn grade_boundaries() {
        assert_eq!(grade(0.80), Grade::A);
        assert_eq!(grade(1.0), Grade::A);
        assert_eq!(grade(0.799), Grade::B);
        assert_eq!(grade(0.70), Grade::B);
        assert_eq!(grade(0.6999), Grade::C);
        assert_eq!(grade(0.60), Grade::C);
        assert_eq!(grade(0.0), Grade::D);
        assert_eq!(Grade::B.to_string(), "B");
    }

    #[test]
    fn summarize_five_results() {
        let results: Vec<_> = [1.0, 0.8, 0.6, 0.4, 0.2]
            .into_iter()
            .enumerate()
            .map(|(i, s)| result(i as u64, s, 0.7))
            .collect();
        let summary = summarize(TaskKind::TrendDetection, results, Vec::new());
        assert!((summary.avg_score - 0.6).abs() < 1e-9);
        assert_eq!(summary.passed_count, 2);
        assert_eq!(summary.total_examples, 5);
        assert!((summary.pass_rate - 0.4).abs() < 1e-9);
        assert_eq!(summary.status, TaskStatus::NeedsWork);
        assert_eq!(summary.task_name, "Trend Detection");
    }

    #[test]
    fn empty_task_averages_to_zero() {
        let summary = summarize(TaskKind::FashionWriting, Vec::new(), Vec::new());
        assert_eq!(summary.avg_score, 0.0);
        assert_eq!(summary.pass_rate, 0.0);
        assert_eq!(summary.threshold, 0.6);
    }

    #[test]
    fn failures_are_counted() {
        let mut failed = result(2, 0.0, 0.7);
        failed.failure = Some("timeout".into());
        let summary = summarize(
            TaskKind::TrendDetection,
            vec![result(1, 1.0, 0.7), failed],
            vec![MalformedRecord {
                example_id: 3,
                reason: "missing expected answer".into(),
            }],
        );
        assert_eq!(summary.failed_responses, 1);
        assert_eq!(summary.total_examples, 2);
        assert_eq!(summary.malformed.len(), 1);
    }

    #[test]
    fn status_labels() {
        assert_eq!(TaskStatus::from_pass_rate(0.8), TaskStatus::Excellent);
        assert_eq!(TaskStatus::from_pass_rate(0.6), TaskStatus::Good);
        assert_eq!(TaskStatus::from_pass_rate(0.59), TaskStatus::NeedsWork);
        assert_eq!(TaskStatus::NeedsWork.to_string(), "Needs Work");
    }

    #[test]
    fn suite_mean_simple_and_weighted() {
        let a = summarize(
            TaskKind::TrendDetection,
            vec![result(1, 1.0, 0.7)],
            Vec::new(),
        );
        let b = summarize(
            TaskKind::StyleClassification,
            vec![result(1, 0.5, 0.7)],
            Vec::new(),
        );

        let simple = summarize_suite(vec![a.clone(), b.clone()], &BTreeMap::new());
        assert!((simple.overall_avg - 0.75).abs() < 1e-9);
        assert_eq!(simple.grade, Grade::B);
        assert_eq!(simple.total_examples, 2);
        assert_eq!(simple.total_passed, 1);

        let weights = BTreeMap::from([(TaskKind::TrendDetection, 3.0)]);
        let weighted = summarize_suite(vec![a, b], &weights);
        // (1.0 * 3 + 0.5 * 1) / 4
        assert!((weighted.overall_avg - 0.875).abs() < 1e-9);
        assert_eq!(weighted.grade, Grade::A);
    }

    #[test]
    fn empty_suite_is_grade_d() {
        let summary = summarize_suite(Vec::new(), &BTreeMap::new());
        assert_eq!(summary.overall_avg, 0.0);
        assert_eq!(summary.grade, Grade::D);
    }
}
