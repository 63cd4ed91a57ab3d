/*!
 * Core types and data structures for ai-digest
 */

use std::path::PathBuf;

use crate::error::DigestError;

/// How a file's content ends up in the output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Readable text rendered in a fenced block
    Text,
    /// Non-text file replaced by a description
    Binary {
        /// Human-readable type label
        label: String,
    },
}

impl Classification {
    /// Whether the file was rendered as a placeholder
    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Binary { .. })
    }
}

/// Result of processing one input file
#[derive(Debug)]
pub struct FileRecord {
    /// Path relative to the input root, with forward slashes
    pub relative_path: String,
    /// Size of the input file in bytes
    pub size: u64,
    /// Text or binary
    pub classification: Classification,
    /// Formatted block ready to be written
    pub block: String,
    /// Failure that prevented the file from being formatted
    pub error: Option<DigestError>,
}

impl FileRecord {
    /// A record carrying only a failure
    pub fn failed(relative_path: String, error: DigestError) -> Self {
        Self {
            relative_path,
            size: 0,
            classification: Classification::Text,
            block: String::new(),
            error: Some(error),
        }
    }

    /// Whether processing failed
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// One produced output artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactInfo {
    /// Location on disk
    pub path: PathBuf,
    /// Size on disk in bytes
    pub size: u64,
}

/// Statistics for one digest run
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Files found by the collector, ignored ones included
    pub total_files: usize,
    /// Files written to the output
    pub included_count: usize,
    /// Files excluded by ignore rules
    pub ignored_count: usize,
    /// Files that failed to process
    pub error_count: usize,
    /// Included files rendered as placeholders
    pub binary_count: usize,
    /// Combined size of included input files
    pub total_size: u64,
    /// Included relative paths in arrival order
    pub included_files: Vec<String>,
    /// Number of artifacts produced (split mode)
    pub artifact_count: usize,
    /// Average artifact size (split mode)
    pub average_artifact_size: u64,
    /// Smallest artifact so far (split mode)
    pub smallest_artifact: Option<ArtifactInfo>,
    /// Largest artifact so far (split mode)
    pub largest_artifact: Option<ArtifactInfo>,
    /// Every artifact with its on-disk size (split mode)
    pub artifacts: Vec<ArtifactInfo>,
}

impl RunStats {
    /// Share of seen files that made it into the output, in percent
    pub fn inclusion_rate(&self) -> Option<f64> {
        if self.total_files == 0 {
            None
        } else {
            Some(self.included_count as f64 / self.total_files as f64 * 100.0)
        }
    }
}
