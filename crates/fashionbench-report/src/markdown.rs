//! Markdown summary, suitable for PR comments and CI job summaries.

use anyhow::Result;
use std::path::Path;

use fashionbench_core::report::SuiteReport;

/// Render the suite summary as Markdown.
pub fn generate_markdown(report: &SuiteReport) -> String {
    let summary = &report.summary;
    let mut md = String::new();

    md.push_str("## FashionBench Results\n\n");
    md.push_str(&format!(
        "**Model:** `{}` ({}) | {}\n\n",
        report.model,
        report.responder,
        report.created_at.format("%Y-%m-%d %H:%M UTC")
    ));

    md.push_str("| Task | Examples | Avg Score | Pass Rate | Status |\n");
    md.push_str("|------|----------|-----------|-----------|--------|\n");
    for task in &summary.tasks {
        md.push_str(&format!(
            "| {} | {} | {:.3} | {:.1}% | {} |\n",
            task.task_name,
            task.total_examples,
            task.avg_score,
            task.pass_rate * 100.0,
            task.status
        ));
    }
    md.push('\n');

    md.push_str(&format!(
        "**Overall:** {:.3} | **Grade:** {} | **Passed:** {}/{} ({:.1}%)\n\n",
        summary.overall_avg,
        summary.grade,
        summary.total_passed,
        summary.total_examples,
        summary.pass_rate * 100.0
    ));
    md.push_str(&format!("> {}\n", summary.grade.message()));

    if summary.failed_responses > 0 || summary.malformed_examples > 0 {
        md.push_str(&format!(
            "\n{} failed responses, {} malformed examples skipped.\n",
            summary.failed_responses, summary.malformed_examples
        ));
    }

    md
}

/// Write the Markdown summary to a file.
pub fn write_markdown_report(report: &SuiteReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, generate_markdown(report))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::tests::make_test_report;

    #[test]
    fn markdown_summary_table() {
        let md = generate_markdown(&make_test_report());
        assert!(md.contains("| Style Classification | 2 | 0.500 | 50.0% | Needs Work |"));
        assert!(md.contains("**Grade:** D"));
        assert!(md.contains("1 failed responses, 1 malformed examples skipped."));
    }
}
