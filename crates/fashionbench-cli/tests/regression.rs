//! Regression detection integration tests.
//!
//! Tests the report comparison workflow end-to-end, including
//! JSON serialization, report loading, and regression detection.

use std::collections::BTreeMap;

use fashionbench_core::model::{Answer, FieldValue, TaskKind};
use fashionbench_core::report::SuiteReport;
use fashionbench_core::results::{MalformedRecord, ScoredResult};
use fashionbench_core::statistics::{summarize, summarize_suite, Grade};
use uuid::Uuid;

fn make_result(id: u64, score: f64, threshold: f64) -> ScoredResult {
    ScoredResult {
        example_id: id,
        expected: Answer::from("Quiet luxury and stealth wealth aesthetic"),
        observed: Some(Answer::from("quiet luxury")),
        score,
        passed: score >= threshold,
        components: BTreeMap::from([("text".to_string(), score)]),
        failure: None,
        attempts: 1,
        latency_ms: 12,
    }
}

fn make_report(model: &str, tasks: &[(TaskKind, &[f64])]) -> SuiteReport {
    let summaries = tasks
        .iter()
        .map(|(task, scores)| {
            let results = scores
                .iter()
                .enumerate()
                .map(|(i, s)| make_result(i as u64 + 1, *s, task.pass_threshold()))
                .collect();
            summarize(*task, results, Vec::new())
        })
        .collect();

    SuiteReport {
        id: Uuid::new_v4(),
        created_at: chrono::Utc::now(),
        model: model.into(),
        responder: "anthropic".into(),
        summary: summarize_suite(summaries, &BTreeMap::new()),
        duration_ms: 1500,
    }
}

#[test]
fn no_regressions_identical_reports() {
    let report = make_report("m", &[(TaskKind::TrendDetection, &[0.9, 0.8, 0.4])]);
    let cmp = report.compare(&report, 0.05);
    assert!(!cmp.has_regressions());
    assert!(cmp.improvements.is_empty());
    assert_eq!(cmp.unchanged, 3);
    assert_eq!(cmp.new_examples, 0);
    assert_eq!(cmp.removed_examples, 0);
}

#[test]
fn detects_regression_and_improvement() {
    let baseline = make_report(
        "m",
        &[
            (TaskKind::TrendDetection, &[0.9, 0.3]),
            (TaskKind::StyleClassification, &[1.0]),
        ],
    );
    let current = make_report(
        "m",
        &[
            (TaskKind::TrendDetection, &[0.5, 0.9]),
            (TaskKind::StyleClassification, &[1.0]),
        ],
    );

    let cmp = current.compare(&baseline, 0.05);
    assert_eq!(cmp.regressions.len(), 1);
    assert_eq!(cmp.regressions[0].task, TaskKind::TrendDetection);
    assert_eq!(cmp.regressions[0].example_id, 1);
    assert!((cmp.regressions[0].delta + 0.4).abs() < 1e-9);
    assert_eq!(cmp.improvements.len(), 1);
    assert_eq!(cmp.improvements[0].example_id, 2);
    assert_eq!(cmp.unchanged, 1);
}

#[test]
fn threshold_absorbs_small_changes() {
    let baseline = make_report("m", &[(TaskKind::FashionWriting, &[0.70])]);
    let current = make_report("m", &[(TaskKind::FashionWriting, &[0.67])]);

    assert!(!current.compare(&baseline, 0.05).has_regressions());
    assert!(current.compare(&baseline, 0.01).has_regressions());
}

#[test]
fn same_example_id_in_different_tasks_is_distinct() {
    let baseline = make_report("m", &[(TaskKind::TrendDetection, &[0.9])]);
    let current = make_report("m", &[(TaskKind::HashtagUnderstanding, &[0.1])]);

    let cmp = current.compare(&baseline, 0.05);
    assert!(!cmp.has_regressions());
    assert_eq!(cmp.new_examples, 1);
    assert_eq!(cmp.removed_examples, 1);
}

#[test]
fn comparison_carries_grades() {
    let baseline = make_report("m", &[(TaskKind::StyleClassification, &[0.9, 0.85])]);
    let current = make_report("m", &[(TaskKind::StyleClassification, &[0.5, 0.6])]);

    let cmp = current.compare(&baseline, 0.05);
    assert_eq!(cmp.baseline_grade, Grade::A);
    assert_eq!(cmp.current_grade, Grade::D);
    assert!(cmp.current_avg < cmp.baseline_avg);

    let md = cmp.to_markdown();
    assert!(md.contains("(A) -> "));
    assert!(md.contains("### Regressions"));
    assert!(!md.contains("### Improvements"));
}

#[test]
fn report_json_round_trip() {
    let mut report = make_report(
        "claude-sonnet",
        &[
            (TaskKind::ProductExtraction, &[1.0, 0.66]),
            (TaskKind::AffiliateDetection, &[0.4]),
        ],
    );
    // Structured answers and malformed records survive the round trip.
    let product = &mut report.summary.tasks[0];
    product.results[0].observed = Some(Answer::Fields(BTreeMap::from([
        ("brand".to_string(), FieldValue::from("Zara")),
        ("link_mentioned".to_string(), FieldValue::Bool(true)),
    ])));
    product.results[1].observed = None;
    product.results[1].failure = Some("request timed out after 30s".into());
    product.malformed.push(MalformedRecord {
        example_id: 9,
        reason: "example has no expected answer".into(),
    });

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/report.json");
    report.save_json(&path).unwrap();
    let loaded = SuiteReport::load_json(&path).unwrap();

    assert_eq!(loaded.id, report.id);
    assert_eq!(loaded.model, "claude-sonnet");
    assert_eq!(loaded.summary.tasks.len(), 2);
    assert_eq!(loaded.summary.grade, report.summary.grade);
    assert_eq!(loaded.summary.tasks[0].results, report.summary.tasks[0].results);
    assert_eq!(loaded.summary.tasks[0].malformed.len(), 1);
    assert_eq!(
        loaded.observed(TaskKind::ProductExtraction, 1),
        report.observed(TaskKind::ProductExtraction, 1)
    );
    assert!(loaded.observed(TaskKind::ProductExtraction, 2).is_none());

    // A reloaded report compares clean against its source.
    assert!(!loaded.compare(&report, 0.0).has_regressions());
}

#[test]
fn load_json_rejects_garbage() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();
    let err = SuiteReport::load_json(&path).unwrap_err();
    assert!(format!("{err:#}").contains("failed to parse report JSON"));

    let missing = SuiteReport::load_json(&dir.path().join("absent.json")).unwrap_err();
    assert!(missing.to_string().contains("failed to read report"));
}
