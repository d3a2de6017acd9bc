//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use anyhow::Result;
use std::path::Path;

use fashionbench_core::report::SuiteReport;
use fashionbench_core::results::TaskSummary;
use fashionbench_core::statistics::TaskStatus;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn status_class(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Excellent => "pass",
        TaskStatus::Good => "warn",
        TaskStatus::NeedsWork => "fail",
    }
}

/// Generate an HTML report from a suite report.
pub fn generate_html(report: &SuiteReport) -> String {
    let summary = &report.summary;
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>FashionBench report: {}</title>\n",
        html_escape(&report.model)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str("<h1>FashionBench report</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Model: <strong>{}</strong> | responder {} | {} tasks | {} examples | {}</p>\n",
        html_escape(&report.model),
        html_escape(&report.responder),
        summary.tasks.len(),
        summary.total_examples,
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Grade panel
    html.push_str("<section class=\"grade\">\n");
    html.push_str(&format!(
        "<div class=\"grade-letter grade-{}\">{}</div>\n",
        summary.grade, summary.grade
    ));
    html.push_str(&format!(
        "<div><p><strong>Overall score:</strong> {:.3}</p><p><strong>Pass rate:</strong> {:.1}% ({}/{})</p><p>{}</p></div>\n",
        summary.overall_avg,
        summary.pass_rate * 100.0,
        summary.total_passed,
        summary.total_examples,
        html_escape(summary.grade.message())
    ));
    html.push_str("</section>\n");

    // Task summary
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Tasks</h2>\n");
    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Task</th><th>Examples</th><th>Avg Score</th><th>Pass Rate</th><th>Failed Responses</th><th>Status</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for task in &summary.tasks {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{:.3}</td><td>{:.1}%</td><td>{}</td><td class=\"{}\">{}</td></tr>\n",
            html_escape(&task.task_name),
            task.total_examples,
            task.avg_score,
            task.pass_rate * 100.0,
            task.failed_responses,
            status_class(task.status),
            task.status,
        ));
    }
    html.push_str("</tbody></table>\n");

    if !summary.tasks.is_empty() {
        html.push_str(&generate_bar_chart(&summary.tasks));
    }

    html.push_str("</section>\n");

    // Per-example results
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Results</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"results\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">Task</th><th onclick=\"sortTable(1)\">Example</th><th onclick=\"sortTable(2)\">Score</th><th onclick=\"sortTable(3)\">Result</th><th>Expected</th><th>Observed</th></tr></thead>\n");
    html.push_str("<tbody>\n");

    for task in &summary.tasks {
        for r in &task.results {
            let class = if r.passed { "pass" } else { "fail" };
            let verdict = match &r.failure {
                Some(_) => "ERROR",
                None if r.passed => "PASS",
                None => "FAIL",
            };
            let observed = match (&r.observed, &r.failure) {
                (Some(answer), _) => html_escape(&answer.render()),
                (None, Some(failure)) => format!("<em>{}</em>", html_escape(failure)),
                (None, None) => "-".to_string(),
            };
            html.push_str(&format!(
                "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{:.3}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                class,
                task.task,
                r.example_id,
                r.score,
                verdict,
                html_escape(&r.expected.render()),
                observed,
            ));
        }
    }

    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Malformed examples
    if summary.malformed_examples > 0 {
        html.push_str("<section class=\"malformed\">\n");
        html.push_str("<h2>Malformed Examples</h2>\n<ul>\n");
        for task in &summary.tasks {
            for m in &task.malformed {
                html.push_str(&format!(
                    "<li>{} #{}: {}</li>\n",
                    task.task,
                    m.example_id,
                    html_escape(&m.reason)
                ));
            }
        }
        html.push_str("</ul>\n</section>\n");
    }

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(report).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    // JavaScript for sorting
    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &SuiteReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

fn generate_bar_chart(tasks: &[TaskSummary]) -> String {
    let bar_height = 30;
    let max_width = 400;
    let padding = 10;
    let label_width = 220;

    let total_height = tasks.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, task) in tasks.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let score = task.avg_score.clamp(0.0, 1.0);
        let width = (score * max_width as f64) as usize;

        let color = match task.status {
            TaskStatus::Excellent => "#22c55e",
            TaskStatus::Good => "#eab308",
            TaskStatus::NeedsWork => "#ef4444",
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(&task.task_name)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{:.3}</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            score
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --warn: #fef9c3; --fail: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --warn: #713f12; --fail: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
.grade { display: flex; gap: 2rem; align-items: center; border: 1px solid var(--border); border-radius: 8px; padding: 1rem 2rem; }
.grade-letter { font-size: 4rem; font-weight: bold; }
.grade-A { color: #22c55e; } .grade-B { color: #84cc16; } .grade-C { color: #eab308; } .grade-D { color: #ef4444; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; vertical-align: top; }
th { background: var(--border); cursor: pointer; }
.pass { background: var(--pass); }
.warn { background: var(--warn); }
.fail { background: var(--fail); }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('results');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    const na = parseFloat(va), nb = parseFloat(vb);
    const cmp = !isNaN(na) && !isNaN(nb) ? na - nb : va.localeCompare(vb);
    return asc ? cmp : -cmp;
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;
