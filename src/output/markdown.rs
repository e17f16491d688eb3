//! Markdown summary generation
//!
//! This module generates human-readable markdown summaries of harvest
//! results: run information, queue states, records per difficulty and the
//! requests that failed.

use crate::output::traits::{HarvestSummary, OutputResult};
use crate::state::RequestState;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown summary to `output_path`
pub fn generate_markdown_summary(summary: &HarvestSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a harvest summary as markdown
pub fn format_markdown_summary(summary: &HarvestSummary) -> String {
    let mut md = String::new();

    md.push_str("# Kata-Harvest Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Run ID**: {}\n", summary.run_id));
    md.push_str(&format!("- **Started**: {}\n", summary.started_at));
    if let Some(finished) = &summary.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished));
    }
    if let Some(duration) = summary.duration_seconds {
        md.push_str(&format!(
            "- **Duration**: {} seconds ({:.2} minutes)\n",
            duration,
            duration as f64 / 60.0
        ));
    }
    md.push_str(&format!("- **Status**: {}\n", summary.status));
    md.push_str(&format!("- **Config Hash**: {}\n\n", summary.config_hash));

    // Queue
    md.push_str("## Requests\n\n");
    md.push_str(&format!("- **Total Requests**: {}\n", summary.total_requests));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n\n",
        summary.success_rate()
    ));
    md.push_str("| State | Count |\n");
    md.push_str("|-------|-------|\n");
    for state in RequestState::all_states() {
        md.push_str(&format!("| {} | {} |\n", state, summary.requests_in(state)));
    }
    md.push('\n');

    // Records
    md.push_str("## Records\n\n");
    md.push_str(&format!("- **Total Records**: {}\n\n", summary.total_records));
    if !summary.records_by_difficulty.is_empty() {
        md.push_str("| Difficulty | Records |\n");
        md.push_str("|------------|---------|\n");
        for (difficulty, count) in &summary.records_by_difficulty {
            md.push_str(&format!("| {} | {} |\n", difficulty, count));
        }
        md.push('\n');
    }

    if !summary.top_tags.is_empty() {
        md.push_str("## Top 20 Tags\n\n");
        md.push_str("| Tag | Records |\n");
        md.push_str("|-----|---------|\n");
        for (tag, count) in summary.top_tags.iter().take(20) {
            md.push_str(&format!("| {} | {} |\n", tag, count));
        }
        md.push('\n');
    }

    if !summary.failed_requests.is_empty() {
        md.push_str("## Failed Requests\n\n");
        md.push_str("| URL | Kind | Attempts | Error |\n");
        md.push_str("|-----|------|----------|-------|\n");
        for failed in &summary.failed_requests {
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                failed.url,
                failed.label,
                failed.retry_count + 1,
                failed.message.replace('|', "\\|")
            ));
        }
        md.push('\n');
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::traits::FailedRequest;

    fn create_test_summary() -> HarvestSummary {
        let mut summary = HarvestSummary::new();
        summary.run_id = 1;
        summary.started_at = "2024-01-01T00:00:00Z".to_string();
        summary.finished_at = Some("2024-01-01T01:00:00Z".to_string());
        summary.duration_seconds = Some(3600);
        summary.status = "completed".to_string();
        summary.config_hash = "abc123".to_string();
        summary.total_requests = 41;
        summary.requests_by_state.insert(RequestState::Handled, 40);
        summary.requests_by_state.insert(RequestState::Failed, 1);
        summary.total_records = 39;
        summary.records_by_difficulty = vec![("Easy".to_string(), 25), ("Hard".to_string(), 14)];
        summary
    }

    #[test]
    fn test_format_markdown_summary() {
        let markdown = format_markdown_summary(&create_test_summary());

        assert!(markdown.contains("# Kata-Harvest Summary"));
        assert!(markdown.contains("- **Run ID**: 1"));
        assert!(markdown.contains("| handled | 40 |"));
        assert!(markdown.contains("| pending | 0 |"));
        assert!(markdown.contains("| Easy | 25 |"));
        assert!(!markdown.contains("Failed Requests"));
    }

    #[test]
    fn test_markdown_lists_failed_requests() {
        let mut summary = create_test_summary();
        summary.failed_requests.push(FailedRequest {
            url: "https://edabit.com/challenge/x".to_string(),
            label: "CHALLENGE".to_string(),
            message: "No element matches 'h2.content'".to_string(),
            retry_count: 3,
        });

        let markdown = format_markdown_summary(&summary);

        assert!(markdown.contains("## Failed Requests"));
        assert!(markdown.contains(
            "| https://edabit.com/challenge/x | CHALLENGE | 4 | No element matches 'h2.content' |"
        ));
    }

    #[test]
    fn test_generate_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.md");

        generate_markdown_summary(&create_test_summary(), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# Kata-Harvest Summary"));
    }
}
