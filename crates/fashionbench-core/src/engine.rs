//! Central eval engine orchestrator.
//!
//! Obtains one observed answer per example from a [`Responder`], scores it
//! with the task's [`TaskScorer`], and folds the results into task and suite
//! summaries. Examples are independent: they run concurrently (bounded by
//! `parallelism`) and are re-ordered by dataset position before summarizing.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::error::{ResponderError, ScoringError};
use crate::model::{Answer, Dataset, TaskKind};
use crate::report::SuiteReport;
use crate::results::{MalformedRecord, ScoredResult, TaskSummary};
use crate::scorer::{ScoringConfig, TaskScorer};
use crate::statistics::{summarize, summarize_suite};
use crate::synonyms::SynonymTable;
use crate::traits::{RespondRequest, Responder};

/// Upper bound on any single wait between responder attempts.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Configuration for the eval engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Model identifier passed to the responder.
    pub model: String,
    /// Maximum concurrent responder calls.
    pub parallelism: usize,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Retries on transient responder errors.
    pub max_retries: u32,
    /// Initial delay between retries; doubles on each retry.
    pub retry_delay: Duration,
    pub scoring: ScoringConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model: "simulated".to_string(),
            parallelism: 4,
            temperature: 0.0,
            max_tokens: 1024,
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            scoring: ScoringConfig::default(),
        }
    }
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_task_start(&self, task: TaskKind, total: usize);
    fn on_example_scored(&self, task: TaskKind, result: &ScoredResult);
    fn on_example_malformed(&self, task: TaskKind, record: &MalformedRecord);
    fn on_task_complete(&self, summary: &TaskSummary, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_task_start(&self, _: TaskKind, _: usize) {}
    fn on_example_scored(&self, _: TaskKind, _: &ScoredResult) {}
    fn on_example_malformed(&self, _: TaskKind, _: &MalformedRecord) {}
    fn on_task_complete(&self, _: &TaskSummary, _: Duration) {}
}

/// The central eval engine.
pub struct EvalEngine {
    responder: Arc<dyn Responder>,
    config: EngineConfig,
    scorers: BTreeMap<TaskKind, Arc<TaskScorer>>,
}

impl EvalEngine {
    /// Build the engine and one scorer per task. Invalid scoring weights are
    /// rejected here, before any example is scored.
    pub fn new(responder: Arc<dyn Responder>, config: EngineConfig) -> Result<Self, ScoringError> {
        let synonyms = Arc::new(SynonymTable::fashion_with(
            config.scoring.extra_synonyms.clone(),
        ));
        let scorers = TaskKind::ALL
            .into_iter()
            .map(|task| {
                let scorer = TaskScorer::new(task, &config.scoring, Arc::clone(&synonyms))?;
                Ok((task, Arc::new(scorer)))
            })
            .collect::<Result<BTreeMap<_, _>, ScoringError>>()?;

        Ok(Self {
            responder,
            config,
            scorers,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scorer(&self, task: TaskKind) -> Option<&TaskScorer> {
        self.scorers.get(&task).map(Arc::as_ref)
    }

    /// Evaluate every example in one dataset.
    pub async fn run_task(
        &self,
        dataset: &Dataset,
        progress: &dyn ProgressReporter,
    ) -> Result<TaskSummary> {
        let start = Instant::now();
        let task = dataset.task;
        let scorer = self
            .scorers
            .get(&task)
            .ok_or_else(|| anyhow::anyhow!("no scorer for task {task}"))?;
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));

        progress.on_task_start(task, dataset.len());

        let mut malformed = Vec::new();
        let mut futures = FuturesUnordered::new();

        for (index, example) in dataset.examples.iter().enumerate() {
            if let Err(e) = scorer.check(example) {
                tracing::warn!(%task, example_id = example.id, "skipping malformed example: {e}");
                let record = MalformedRecord {
                    example_id: example.id,
                    reason: e.to_string(),
                };
                progress.on_example_malformed(task, &record);
                malformed.push(record);
                continue;
            }

            let responder = Arc::clone(&self.responder);
            let scorer = Arc::clone(scorer);
            let semaphore = Arc::clone(&semaphore);
            let request = RespondRequest::new(self.config.model.clone(), task, example.clone())
                .with_temperature(self.config.temperature)
                .with_max_tokens(self.config.max_tokens);
            let max_retries = self.config.max_retries;
            let retry_delay = self.config.retry_delay;

            futures.push(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| anyhow::anyhow!("semaphore closed"))?;

                let started = Instant::now();
                let (outcome, attempts) =
                    respond_with_retry(responder.as_ref(), &request, max_retries, retry_delay)
                        .await;
                let latency_ms = started.elapsed().as_millis() as u64;

                let mut result = match outcome {
                    Ok(answer) => scorer.score(&request.example, &answer)?,
                    Err(e) => {
                        tracing::error!(
                            %task,
                            example_id = request.example.id,
                            attempts,
                            "responder failed: {e:#}"
                        );
                        scorer.failed(&request.example, format!("{e:#}"))
                    }
                };
                result.attempts = attempts;
                result.latency_ms = latency_ms;
                tracing::debug!(
                    %task,
                    example_id = result.example_id,
                    score = result.score,
                    passed = result.passed,
                    "scored example"
                );
                Ok::<_, anyhow::Error>((index, result))
            });
        }

        let mut indexed = Vec::with_capacity(futures.len());
        while let Some(outcome) = futures.next().await {
            let (index, result) = outcome?;
            progress.on_example_scored(task, &result);
            indexed.push((index, result));
        }
        indexed.sort_by_key(|(index, _)| *index);
        let results = indexed.into_iter().map(|(_, result)| result).collect();

        let summary = summarize(task, results, malformed);
        tracing::info!(
            %task,
            total = summary.total_examples,
            passed = summary.passed_count,
            avg_score = summary.avg_score,
            "task complete"
        );
        progress.on_task_complete(&summary, start.elapsed());
        Ok(summary)
    }

    /// Evaluate every dataset and fold the task summaries into a report.
    pub async fn run_suite(
        &self,
        datasets: &[Dataset],
        progress: &dyn ProgressReporter,
    ) -> Result<SuiteReport> {
        let start = Instant::now();
        let mut tasks = Vec::with_capacity(datasets.len());
        for dataset in datasets {
            tasks.push(self.run_task(dataset, progress).await?);
        }

        let summary = summarize_suite(tasks, &self.config.scoring.task_weights);
        tracing::info!(
            overall_avg = summary.overall_avg,
            grade = %summary.grade,
            "suite complete"
        );

        Ok(SuiteReport {
            id: Uuid::new_v4(),
            created_at: chrono::Utc::now(),
            model: self.config.model.clone(),
            responder: self.responder.name().to_string(),
            summary,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

/// Call the responder, retrying transient errors with exponential backoff.
/// Returns the outcome and the number of attempts made.
async fn respond_with_retry(
    responder: &dyn Responder,
    request: &RespondRequest,
    max_retries: u32,
    retry_delay: Duration,
) -> (Result<Answer>, u32) {
    let mut delay = retry_delay;
    let mut last_error = None;
    let mut attempts = 0;

    for retry in 0..=max_retries {
        if retry > 0 {
            tokio::time::sleep(delay).await;
            delay = delay.saturating_mul(2).min(MAX_RETRY_DELAY);
        }
        attempts += 1;
        match responder.respond(request).await {
            Ok(answer) => return (Ok(answer), attempts),
            Err(e) => {
                if let Some(err) = e.downcast_ref::<ResponderError>() {
                    if err.is_permanent() {
                        return (Err(e), attempts);
                    }
                    // Use the responder's retry-after hint if available
                    if let Some(ms) = err.retry_after_ms() {
                        delay = Duration::from_millis(ms).min(MAX_RETRY_DELAY);
                    }
                }
                if retry < max_retries {
                    tracing::warn!(
                        example_id = request.example.id,
                        attempt = attempts,
                        "responder error, retrying: {e:#}"
                    );
                }
                last_error = Some(e);
            }
        }
    }

    let error = last_error.unwrap_or_else(|| anyhow::anyhow!("unknown error"));
    (Err(error), attempts)
}
