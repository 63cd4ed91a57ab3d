/*!
 * Reporting functionality for ai-digest
 *
 * Renders the summary of a digest run as tables using the tabled library.
 */

use std::path::Path;
use std::time::Duration;

use tabled::{
    settings::{object::Columns, Alignment, Modify, Padding, Style},
    Table, Tabled,
};

use crate::types::{ArtifactInfo, RunStats};
use crate::utils::{estimate_token_count, format_file_size, RECOMMENDED_MAX_OUTPUT};

/// Number of included files listed before truncating
const LISTED_FILES: usize = 10;

/// Everything the summary needs about a finished run
#[derive(Debug, Clone)]
pub struct DigestReport {
    /// Output file, or base name in split mode
    pub output_file: String,
    /// Time taken by the run
    pub duration: Duration,
    /// Statistics captured after the writer closed
    pub stats: RunStats,
    /// Whether output was split
    pub split: bool,
    /// Whether to list included files
    pub show_output_files: bool,
    /// Custom ignore file name, mentioned in size warnings
    pub ignore_file: String,
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Metric")]
    key: String,

    #[tabled(rename = "Value")]
    value: String,
}

impl SummaryRow {
    fn new(key: &str, value: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            value: value.into(),
        }
    }
}

/// Report generator for digest results
#[derive(Debug, Default)]
pub struct Reporter;

impl Reporter {
    /// Create a new reporter
    pub fn new() -> Self {
        Self
    }

    /// Print the report to stdout
    pub fn print_report(&self, report: &DigestReport) {
        println!("\n{}", self.generate_report(report));
    }

    /// Generate the full report text
    pub fn generate_report(&self, report: &DigestReport) -> String {
        let mut sections = Vec::new();

        if report.show_output_files && !report.stats.included_files.is_empty() {
            sections.push(format!(
                "📋  INCLUDED FILES\n{}",
                self.format_included_files(&report.stats.included_files)
            ));
        }

        if report.split {
            sections.push(format!(
                "📁  OUTPUT FILES\n{}",
                style(Table::new(self.split_rows(&report.stats)))
            ));
        }

        sections.push(format!(
            "📊  PROCESSING SUMMARY\n{}",
            style(Table::new(self.summary_rows(report)))
        ));

        sections.push(self.final_status(report));
        sections.join("\n\n")
    }

    fn summary_rows(&self, report: &DigestReport) -> Vec<SummaryRow> {
        let stats = &report.stats;
        let mut rows = vec![
            SummaryRow::new("📂 Output", report.output_file.clone()),
            SummaryRow::new("⏱️ Process Time", format!("{:.4?}", report.duration)),
            SummaryRow::new("📄 Total Files Scanned", stats.total_files.to_string()),
            SummaryRow::new("✅ Files in Output", stats.included_count.to_string()),
            SummaryRow::new("🚫 Files Ignored", stats.ignored_count.to_string()),
            SummaryRow::new("❌ Files Failed", stats.error_count.to_string()),
            SummaryRow::new("📦 Binary/SVG Files", stats.binary_count.to_string()),
            SummaryRow::new("💾 Total Size", format_file_size(stats.total_size)),
        ];

        if let Some(rate) = stats.inclusion_rate() {
            rows.push(SummaryRow::new("🎯 Inclusion Rate", format!("{:.1}%", rate)));
        }

        if !report.split {
            let tokens = if stats.total_size > RECOMMENDED_MAX_OUTPUT {
                format!(
                    "skipped, output exceeds {}; add patterns to {} to reduce size",
                    format_file_size(RECOMMENDED_MAX_OUTPUT),
                    report.ignore_file
                )
            } else {
                format!(
                    "{} tokens (estimated, may vary ±20% across models)",
                    estimate_token_count(stats.total_size)
                )
            };
            rows.push(SummaryRow::new("🔤 LLM Tokens", tokens));
        }

        rows
    }

    fn split_rows(&self, stats: &RunStats) -> Vec<SummaryRow> {
        let describe = |artifact: &Option<ArtifactInfo>| match artifact {
            Some(info) => format!("{} ({})", file_name(&info.path), format_file_size(info.size)),
            None => "-".to_string(),
        };

        vec![
            SummaryRow::new("📁 Number of Files", stats.artifact_count.to_string()),
            SummaryRow::new(
                "📏 Average File Size",
                format_file_size(stats.average_artifact_size),
            ),
            SummaryRow::new("🔽 Smallest File", describe(&stats.smallest_artifact)),
            SummaryRow::new("🔼 Largest File", describe(&stats.largest_artifact)),
        ]
    }

    fn format_included_files(&self, files: &[String]) -> String {
        let mut lines: Vec<String> = files
            .iter()
            .take(LISTED_FILES)
            .enumerate()
            .map(|(i, file)| format!("   {:2}. {}", i + 1, file))
            .collect();
        if files.len() > LISTED_FILES {
            lines.push(format!(
                "   ... and {} more files",
                files.len() - LISTED_FILES
            ));
        }
        lines.join("\n")
    }

    fn final_status(&self, report: &DigestReport) -> String {
        if report.split {
            "✨ Process Complete\n   ✅ Output files generated successfully".to_string()
        } else if report.stats.total_size > RECOMMENDED_MAX_OUTPUT {
            "✨ Process Complete\n   ⚠️  Warning: Large output file size".to_string()
        } else {
            "✨ Process Complete\n   ✅ Output generated successfully".to_string()
        }
    }
}

fn style(mut table: Table) -> String {
    table
        .with(Style::rounded())
        .with(Padding::new(1, 1, 0, 0))
        .with(Modify::new(Columns::new(..)).with(Alignment::left()));
    table.to_string()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .to_string()
}
