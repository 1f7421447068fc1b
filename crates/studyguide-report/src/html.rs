//! HTML report generator.
//!
//! Produces a self-contained "Most-Missed First" review page with all CSS
//! inlined.

use anyhow::{Context, Result};
use std::path::Path;

use studyguide_core::report::{ReviewEntry, RunSummary};

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Generate an HTML review page from a run summary.
pub fn generate_html(summary: &RunSummary) -> String {
    let title = summary.module.as_deref().unwrap_or("Quiz");
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>Study guide review: {}</title>\n",
        html_escape(title)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str(&format!("<h1>{}</h1>\n", html_escape(title)));
    html.push_str(&format!(
        "<p class=\"meta\">{} questions | {} presentations | {} answers submitted | {}</p>\n",
        summary.total,
        summary.presented,
        summary.total_attempts,
        summary.completed_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Score
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str(&format!(
        "<p class=\"score {}\">First try: <strong>{}%</strong> ({}/{})</p>\n",
        score_class(summary.first_try_percent),
        summary.first_try_percent,
        summary.first_try_correct,
        summary.total
    ));
    html.push_str(&score_bar(summary.first_try_percent));
    html.push_str("</section>\n");

    // Review
    html.push_str("<section class=\"review\">\n");
    html.push_str("<h2>Review (Most-Missed First)</h2>\n");
    if summary.review.is_empty() {
        html.push_str("<p>No questions in this run.</p>\n");
    }
    for entry in &summary.review {
        html.push_str(&review_card(entry));
    }
    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(summary).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML review page to a file.
pub fn write_html_report(summary: &RunSummary, path: &Path) -> Result<()> {
    let html = generate_html(summary);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write HTML report to {}", path.display()))?;
    Ok(())
}

fn review_card(entry: &ReviewEntry) -> String {
    let class = if entry.missed > 0 { "missed" } else { "clean" };
    let mut card = format!("<article class=\"card {class}\">\n");

    card.push_str(&format!(
        "<p class=\"stem\">{}</p>\n",
        html_escape(&entry.stem)
    ));
    let answer = entry
        .correct_options
        .iter()
        .map(|o| format!("{}. {}", o.letter, html_escape(&o.text)))
        .collect::<Vec<_>>()
        .join("<br>");
    card.push_str(&format!(
        "<p class=\"answer\"><span class=\"label\">Correct:</span> {answer}</p>\n"
    ));
    if !entry.rationale.is_empty() {
        card.push_str(&format!(
            "<p class=\"rationale\">{}</p>\n",
            html_escape(&entry.rationale)
        ));
    }
    card.push_str(&format!(
        "<p class=\"counts\">Missed {} | Attempts {}</p>\n",
        entry.missed, entry.attempts
    ));

    card.push_str("</article>\n");
    card
}

fn score_class(percent: u32) -> &'static str {
    if percent >= 80 {
        "pass"
    } else if percent >= 50 {
        "warn"
    } else {
        "fail"
    }
}

fn score_bar(percent: u32) -> String {
    let max_width = 400;
    let width = percent.min(100) as usize * max_width / 100;
    let color = match score_class(percent) {
        "pass" => "#22c55e",
        "warn" => "#eab308",
        _ => "#ef4444",
    };

    let mut svg = format!(
        "<svg width=\"{}\" height=\"30\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        max_width + 60
    );
    svg.push_str(&format!(
        "  <rect x=\"0\" y=\"0\" width=\"{max_width}\" height=\"30\" fill=\"var(--border)\" rx=\"4\"/>\n"
    ));
    svg.push_str(&format!(
        "  <rect x=\"0\" y=\"0\" width=\"{width}\" height=\"30\" fill=\"{color}\" rx=\"4\"/>\n"
    ));
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"15\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{percent}%</text>\n",
        max_width + 8
    ));
    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --fail: #fde2e2; --warn: #fef9c3; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; --warn: #713f12; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); max-width: 60rem; }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
.score { font-size: 1.25rem; padding: 0.5rem 1rem; border-radius: 8px; }
.pass { background: var(--pass); }
.warn { background: var(--warn); }
.fail { background: var(--fail); }
.card { border: 1px solid var(--border); border-radius: 8px; padding: 0.75rem 1rem; margin: 0.75rem 0; }
.card.missed { border-left: 6px solid #ef4444; }
.card.clean { border-left: 6px solid #22c55e; }
.stem { font-weight: 600; }
.label { font-weight: 600; }
.rationale { color: #6b7280; }
.counts { font-size: 0.85rem; color: #6b7280; }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;
