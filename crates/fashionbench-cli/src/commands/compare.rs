//! The `fashionbench compare` command.

use std::path::PathBuf;

use anyhow::Result;

use fashionbench_core::report::SuiteReport;

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    threshold: f64,
    fail_on_regression: bool,
    format: String,
) -> Result<()> {
    anyhow::ensure!(
        threshold.is_finite() && threshold >= 0.0,
        "threshold must be a non-negative number"
    );

    let baseline = SuiteReport::load_json(&baseline_path)?;
    let current = SuiteReport::load_json(&current_path)?;

    let report = current.compare(&baseline, threshold);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", report.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            // text format
            println!(
                "Overall: {:.3} ({}) -> {:.3} ({})",
                report.baseline_avg, report.baseline_grade, report.current_avg, report.current_grade
            );
            println!(
                "Comparison: {} regressions, {} improvements, {} unchanged",
                report.regressions.len(),
                report.improvements.len(),
                report.unchanged
            );

            if !report.regressions.is_empty() {
                println!("\nRegressions:");
                for r in &report.regressions {
                    println!(
                        "  {} #{} {:.3} -> {:.3} ({:+.3})",
                        r.task, r.example_id, r.baseline_score, r.current_score, r.delta
                    );
                }
            }

            if !report.improvements.is_empty() {
                println!("\nImprovements:");
                for i in &report.improvements {
                    println!(
                        "  {} #{} {:.3} -> {:.3} ({:+.3})",
                        i.task, i.example_id, i.baseline_score, i.current_score, i.delta
                    );
                }
            }

            if report.new_examples > 0 {
                println!("\n{} new example(s)", report.new_examples);
            }
            if report.removed_examples > 0 {
                println!("{} removed example(s)", report.removed_examples);
            }
        }
    }

    if fail_on_regression && report.has_regressions() {
        std::process::exit(1);
    }

    Ok(())
}
