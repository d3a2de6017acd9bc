//! The `fashionbench run` command.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use fashionbench_core::engine::{EvalEngine, ProgressReporter};
use fashionbench_core::model::{Dataset, TaskKind};
use fashionbench_core::parser;
use fashionbench_core::report::SuiteReport;
use fashionbench_core::results::{MalformedRecord, ScoredResult, TaskSummary};
use fashionbench_core::traits::Responder;
use fashionbench_providers::config::load_config_from;
use fashionbench_providers::{resolve_responder, ModelSpec, ReplayResponder};
use fashionbench_report::{write_html_report, write_markdown_report};

/// Arguments of `fashionbench run`.
pub struct RunArgs {
    pub model: Option<String>,
    pub task: Option<String>,
    pub datasets: Option<PathBuf>,
    pub replay: Option<PathBuf>,
    pub parallelism: Option<usize>,
    pub output: Option<PathBuf>,
    pub format: String,
    pub config: Option<PathBuf>,
    pub verbose: bool,
}

/// Console progress reporter.
struct ConsoleReporter {
    verbose: bool,
}

impl ProgressReporter for ConsoleReporter {
    fn on_task_start(&self, task: TaskKind, total: usize) {
        eprintln!("Running {} ({total} examples)", task.display_name());
    }

    fn on_example_scored(&self, task: TaskKind, result: &ScoredResult) {
        if !self.verbose {
            return;
        }
        let verdict = match &result.failure {
            Some(_) => "ERROR",
            None if result.passed => "PASS",
            None => "FAIL",
        };
        eprintln!(
            "  {task} #{} [{verdict}] score {:.3} ({}ms, {} attempt(s))",
            result.example_id, result.score, result.latency_ms, result.attempts
        );
        if let Some(failure) = &result.failure {
            eprintln!("    {failure}");
        }
    }

    fn on_example_malformed(&self, task: TaskKind, record: &MalformedRecord) {
        eprintln!("  SKIPPED: {task} #{}: {}", record.example_id, record.reason);
    }

    fn on_task_complete(&self, summary: &TaskSummary, elapsed: Duration) {
        eprintln!(
            "  Done: avg {:.3}, {}/{} passed ({:.1}s)",
            summary.avg_score,
            summary.passed_count,
            summary.total_examples,
            elapsed.as_secs_f64()
        );
    }
}

/// Parse a comma-separated task list. Unknown names are an error.
fn parse_tasks(spec: &str) -> Result<BTreeSet<TaskKind>> {
    spec.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<TaskKind>().map_err(|e| anyhow::anyhow!(e)))
        .collect()
}

fn select_datasets(all: Vec<Dataset>, tasks: Option<&BTreeSet<TaskKind>>) -> Result<Vec<Dataset>> {
    let Some(tasks) = tasks else {
        return Ok(all);
    };
    for task in tasks {
        anyhow::ensure!(
            all.iter().any(|d| d.task == *task),
            "no dataset found for task {task} (expected {})",
            task.dataset_file()
        );
    }
    Ok(all.into_iter().filter(|d| tasks.contains(&d.task)).collect())
}

pub async fn execute(args: RunArgs) -> Result<()> {
    if let Some(parallelism) = args.parallelism {
        anyhow::ensure!(parallelism >= 1, "parallelism must be at least 1");
    }

    // Load config
    let config = load_config_from(args.config.as_deref())?;

    let tasks = args.task.as_deref().map(parse_tasks).transpose()?;

    // Load datasets
    let datasets_dir = args.datasets.unwrap_or_else(|| config.datasets_dir.clone());
    let datasets = parser::load_dataset_directory(&datasets_dir)
        .with_context(|| format!("failed to load datasets from {}", datasets_dir.display()))?;
    let datasets = select_datasets(datasets, tasks.as_ref())?;
    anyhow::ensure!(
        !datasets.is_empty(),
        "no datasets found in {}",
        datasets_dir.display()
    );

    // Pick the responder
    let (responder, model): (Arc<dyn Responder>, String) = match &args.replay {
        Some(path) => {
            let replay = ReplayResponder::load(path)?;
            let model = args.model.clone().unwrap_or_else(|| replay.model().to_string());
            eprintln!(
                "Replaying {} recorded answers from {}",
                replay.len(),
                path.display()
            );
            (Arc::new(replay), model)
        }
        None => {
            let spec = ModelSpec::parse(
                args.model.as_deref().unwrap_or(&config.default_model),
                &config.default_provider,
            );
            (resolve_responder(&config, &spec)?, spec.model)
        }
    };

    let mut engine_config = config.engine_config(&model);
    if let Some(parallelism) = args.parallelism {
        engine_config.parallelism = parallelism;
    }

    let engine = EvalEngine::new(responder, engine_config)?;
    let reporter = ConsoleReporter {
        verbose: args.verbose,
    };

    let example_count: usize = datasets.iter().map(Dataset::len).sum();
    eprintln!(
        "fashionbench v{}: {} tasks, {} examples, model {}",
        env!("CARGO_PKG_VERSION"),
        datasets.len(),
        example_count,
        model
    );
    eprintln!();

    let report = engine.run_suite(&datasets, &reporter).await?;

    print_summary(&report);

    // Save outputs
    let output = args.output.unwrap_or_else(|| config.output_dir.clone());
    std::fs::create_dir_all(&output)
        .with_context(|| format!("failed to create output directory {}", output.display()))?;
    let timestamp = report.created_at.format("%Y-%m-%dT%H%M%S");

    let formats: Vec<&str> = if args.format == "all" {
        vec!["json", "html", "md"]
    } else {
        args.format.split(',').map(str::trim).collect()
    };

    for fmt in &formats {
        match *fmt {
            "json" => {
                let path = output.join(format!("report-{timestamp}.json"));
                report.save_json(&path)?;
                eprintln!("Results saved to: {}", path.display());
            }
            "html" => {
                let path = output.join(format!("report-{timestamp}.html"));
                write_html_report(&report, &path)?;
                eprintln!("HTML report: {}", path.display());
            }
            "md" | "markdown" => {
                let path = output.join(format!("report-{timestamp}.md"));
                write_markdown_report(&report, &path)?;
                eprintln!("Markdown summary: {}", path.display());
            }
            _ => {
                eprintln!("Unknown format: {fmt}");
            }
        }
    }

    Ok(())
}

fn print_summary(report: &SuiteReport) {
    use comfy_table::{Cell, Table};

    let summary = &report.summary;
    let mut table = Table::new();
    table.set_header(vec!["Task", "Examples", "Avg Score", "Pass Rate", "Status"]);

    for task in &summary.tasks {
        table.add_row(vec![
            Cell::new(&task.task_name),
            Cell::new(task.total_examples),
            Cell::new(format!("{:.3}", task.avg_score)),
            Cell::new(format!("{:.1}%", task.pass_rate * 100.0)),
            Cell::new(task.status),
        ]);
    }

    eprintln!("\n{table}");

    let mut panel = Table::new();
    panel.add_row(vec![format!(
        "Overall score: {:.3}\nGrade: {}\nPassed: {}/{} ({:.1}%)\n\n{}",
        summary.overall_avg,
        summary.grade,
        summary.total_passed,
        summary.total_examples,
        summary.pass_rate * 100.0,
        summary.grade.message()
    )]);
    eprintln!("{panel}");

    if summary.failed_responses > 0 {
        eprintln!(
            "{} example(s) scored 0 because the responder failed",
            summary.failed_responses
        );
    }
    if summary.malformed_examples > 0 {
        eprintln!(
            "{} malformed example(s) skipped",
            summary.malformed_examples
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_task_list() {
        let tasks = parse_tasks("trend_detection, fashion_writing").unwrap();
        assert_eq!(tasks.len(), 2);
        assert!(tasks.contains(&TaskKind::FashionWriting));
    }

    #[test]
    fn unknown_task_lists_valid_names() {
        let err = parse_tasks("colour_theory").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("unknown task: colour_theory"));
        assert!(message.contains("style_classification"));
    }
}
