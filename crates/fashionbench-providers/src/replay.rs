//! Replays observed answers recorded in a previous suite report.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

use fashionbench_core::error::ResponderError;
use fashionbench_core::model::{Answer, TaskKind};
use fashionbench_core::report::SuiteReport;
use fashionbench_core::traits::{ModelInfo, RespondRequest, Responder};

/// A responder that answers from a saved report, for re-scoring without
/// calling a model again.
pub struct ReplayResponder {
    model: String,
    answers: HashMap<(TaskKind, u64), Answer>,
}

impl ReplayResponder {
    pub fn from_report(report: &SuiteReport) -> Self {
        let answers = report
            .summary
            .tasks
            .iter()
            .flat_map(|task| {
                task.results.iter().filter_map(move |r| {
                    r.observed
                        .as_ref()
                        .map(|observed| ((task.task, r.example_id), observed.clone()))
                })
            })
            .collect();
        Self {
            model: report.model.clone(),
            answers,
        }
    }

    /// Load a JSON report written by `fashionbench run`.
    pub fn load(path: &Path) -> Result<Self> {
        let report = SuiteReport::load_json(path)?;
        Ok(Self::from_report(&report))
    }

    /// The model the recorded answers came from.
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

#[async_trait]
impl Responder for ReplayResponder {
    fn name(&self) -> &str {
        "replay"
    }

    async fn respond(&self, request: &RespondRequest) -> anyhow::Result<Answer> {
        self.answers
            .get(&(request.task, request.example.id))
            .cloned()
            .ok_or_else(|| {
                ResponderError::MissingResponse {
                    task: request.task.to_string(),
                    example_id: request.example.id,
                }
                .into()
            })
    }

    fn available_models(&self) -> Vec<ModelInfo> {
        vec![ModelInfo {
            id: self.model.clone(),
            name: format!("Replay of {}", self.model),
            provider: "replay".into(),
            max_context: 0,
        }]
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use chrono::Utc;
    use fashionbench_core::model::Example;
    use fashionbench_core::results::ScoredResult;
    use fashionbench_core::statistics::{summarize, summarize_suite};
    use uuid::Uuid;

    fn recorded(id: u64, observed: Option<&str>) -> ScoredResult {
        ScoredResult {
            example_id: id,
            expected: Answer::from("Bohemian/Boho"),
            observed: observed.map(Answer::from),
            score: 1.0,
            passed: true,
            components: BTreeMap::new(),
            failure: None,
            attempts: 1,
            latency_ms: 0,
        }
    }

    fn report() -> SuiteReport {
        let task = summarize(
            TaskKind::StyleClassification,
            vec![recorded(1, Some("Boho")), recorded(2, None)],
            Vec::new(),
        );
        SuiteReport {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            model: "claude-sonnet-4-20250514".into(),
            responder: "anthropic".into(),
            summary: summarize_suite(vec![task], &BTreeMap::new()),
            duration_ms: 10,
        }
    }

    fn request(id: u64) -> RespondRequest {
        let example = Example::new(
            id,
            "Floral maxi dress",
            Answer::from("Bohemian/Boho"),
            TaskKind::StyleClassification,
        );
        RespondRequest::new("replay", TaskKind::StyleClassification, example)
    }

    #[tokio::test]
    async fn replays_recorded_answers() {
        let replay = ReplayResponder::from_report(&report());
        assert_eq!(replay.len(), 1);
        assert_eq!(replay.model(), "claude-sonnet-4-20250514");
        assert_eq!(replay.respond(&request(1)).await.unwrap(), Answer::from("Boho"));
    }

    #[tokio::test]
    async fn missing_entries_are_permanent_errors() {
        let replay = ReplayResponder::from_report(&report());
        let err = replay.respond(&request(2)).await.unwrap_err();
        let typed = err.downcast_ref::<ResponderError>().unwrap();
        assert!(typed.is_permanent());
        assert!(err.to_string().contains("style_classification example 2"));
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        report().save_json(&path).unwrap();
        let replay = ReplayResponder::load(&path).unwrap();
        assert_eq!(replay.len(), 1);
    }
}
