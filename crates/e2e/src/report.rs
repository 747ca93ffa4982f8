//! Human-readable run summary

use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};

use crate::runner::RunReport;
use crate::verifier::{Outcome, Verdict};

fn verdict_cell(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Pass => "✅ pass",
        Verdict::Warn => "⚠️ warn",
        Verdict::Fail => "❌ fail",
    }
}

fn artifact_cell(outcome: &Outcome) -> String {
    outcome
        .artifacts
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

fn detail_cell(outcome: &Outcome) -> String {
    match outcome.verdict {
        Verdict::Pass => outcome.details.first().cloned().unwrap_or_default(),
        _ => outcome.details.join("\n"),
    }
}

/// Per-endpoint table of verdicts, findings and artifacts
pub fn outcome_table(report: &RunReport) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec!["Endpoint", "Style", "Result", "HTTP", "Details", "Artifacts"]);
    for outcome in &report.outcomes {
        table.add_row(vec![
            outcome.endpoint.clone(),
            outcome.style.clone().unwrap_or_else(|| "-".to_string()),
            verdict_cell(outcome.verdict).to_string(),
            outcome
                .http_status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string()),
            detail_cell(outcome),
            artifact_cell(outcome),
        ]);
    }
    table
}

/// Full summary text: header, table, generated images, totals
pub fn render_summary(report: &RunReport) -> String {
    let rule = "=".repeat(60);
    let mut out = String::new();

    out.push_str(&format!("{}\nOneBot Info Image API test summary\n{}\n", rule, rule));
    out.push_str(&format!("API base: {}\n", report.api_base));
    out.push_str(&format!(
        "Started:  {}\n",
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    if let Some(reason) = &report.aborted {
        out.push_str(&format!("\n❌ API service not reachable, run aborted: {}\n", reason));
        out.push_str(
            "  Check that the service is running, the port is correct and no firewall blocks it.\n",
        );
        out.push_str(&rule);
        out.push('\n');
        return out;
    }

    out.push('\n');
    out.push_str(&outcome_table(report).to_string());
    out.push('\n');

    if report.images.is_empty() {
        out.push_str("\n📁 No image files generated\n");
    } else {
        out.push_str("\n📁 Image files:\n");
        for (path, size) in &report.images {
            out.push_str(&format!("  - {} ({} bytes)\n", path.display(), size));
        }
    }

    out.push_str(&format!(
        "\n{} passed, {} warned, {} failed in {} ms\n{}\n",
        report.passed(),
        report.warned(),
        report.failed(),
        report.duration_ms,
        rule
    ));
    out
}
