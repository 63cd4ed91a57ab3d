/*!
 * Thread-safe accumulation of run statistics
 */

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::types::{ArtifactInfo, FileRecord, RunStats};

/// Shared handle to the statistics of one run.
///
/// Clones share the same state. Every method takes the lock once, mutates
/// and releases it, so concurrent callers are serialized.
#[derive(Debug, Clone, Default)]
pub struct StatsAggregator {
    inner: Arc<Mutex<RunStats>>,
}

impl StatsAggregator {
    /// Create an empty aggregator
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RunStats> {
        // A panicking worker must not hide the counts gathered so far
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Count files seen by the collector
    pub fn record_seen(&self, count: usize) {
        self.lock().total_files += count;
    }

    /// Count files excluded by ignore rules
    pub fn record_ignored(&self, count: usize) {
        self.lock().ignored_count += count;
    }

    /// Count a file that failed to process
    pub fn record_error(&self, _record: &FileRecord) {
        self.lock().error_count += 1;
    }

    /// Count a file that was written to the output
    pub fn record_included(&self, record: &FileRecord) {
        let mut stats = self.lock();
        stats.included_count += 1;
        stats.included_files.push(record.relative_path.clone());
        if record.classification.is_binary() {
            stats.binary_count += 1;
        }
        stats.total_size += record.size;
    }

    /// Count a newly opened artifact
    pub fn record_artifact_opened(&self) {
        self.lock().artifact_count += 1;
    }

    /// Refresh the smallest/largest artifact with a running size
    pub fn update_extremes(&self, path: &Path, size: u64) {
        let mut stats = self.lock();
        let info = ArtifactInfo {
            path: path.to_path_buf(),
            size,
        };

        let smaller = stats
            .smallest_artifact
            .as_ref()
            .map_or(true, |current| size < current.size);
        if smaller {
            stats.smallest_artifact = Some(info.clone());
        }

        let larger = stats
            .largest_artifact
            .as_ref()
            .map_or(true, |current| size > current.size);
        if larger {
            stats.largest_artifact = Some(info);
        }
    }

    /// Replace artifact statistics with sizes measured on disk
    pub fn finalize_artifacts(&self, artifacts: Vec<ArtifactInfo>) {
        let mut stats = self.lock();
        let total: u64 = artifacts.iter().map(|a| a.size).sum();

        stats.smallest_artifact = artifacts.iter().min_by_key(|a| a.size).cloned();
        stats.largest_artifact = artifacts.iter().max_by_key(|a| a.size).cloned();
        stats.artifact_count = artifacts.len();
        stats.average_artifact_size = if artifacts.is_empty() {
            0
        } else {
            total / artifacts.len() as u64
        };
        stats.artifacts = artifacts;
    }

    /// Copy of the current statistics
    pub fn snapshot(&self) -> RunStats {
        self.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DigestError;
    use crate::types::Classification;
    use std::path::PathBuf;
    use std::thread;

    fn included(path: &str, size: u64, classification: Classification) -> FileRecord {
        FileRecord {
            relative_path: path.to_string(),
            size,
            classification,
            block: String::new(),
            error: None,
        }
    }

    #[test]
    fn test_counts_and_order() {
        let stats = StatsAggregator::new();
        stats.record_seen(4);
        stats.record_ignored(1);
        stats.record_included(&included("b.rs", 10, Classification::Text));
        stats.record_included(&included(
            "a.png",
            20,
            Classification::Binary {
                label: "Image".to_string(),
            },
        ));
        stats.record_error(&FileRecord::failed(
            "c.txt".to_string(),
            DigestError::Encoding("bad".to_string()),
        ));

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total_files, 4);
        assert_eq!(snapshot.included_count, 2);
        assert_eq!(snapshot.binary_count, 1);
        assert_eq!(snapshot.total_size, 30);
        assert_eq!(snapshot.included_files, vec!["b.rs", "a.png"]);
        assert_eq!(
            snapshot.included_count + snapshot.ignored_count + snapshot.error_count,
            snapshot.total_files
        );
    }

    #[test]
    fn test_concurrent_updates() {
        let stats = StatsAggregator::new();
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let stats = stats.clone();
                thread::spawn(move || {
                    for i in 0..100 {
                        let path = format!("w{}/f{}.txt", worker, i);
                        stats.record_included(&included(&path, 1, Classification::Text));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.included_count, 800);
        assert_eq!(snapshot.included_files.len(), 800);
        assert_eq!(snapshot.total_size, 800);
    }

    #[test]
    fn test_extremes_and_finalize() {
        let stats = StatsAggregator::new();
        stats.update_extremes(Path::new("out_part1.md"), 50);
        stats.update_extremes(Path::new("out_part1.md"), 120);
        stats.update_extremes(Path::new("out_part2.md"), 30);

        let running = stats.snapshot();
        assert_eq!(running.smallest_artifact.unwrap().size, 30);
        assert_eq!(running.largest_artifact.unwrap().size, 120);

        stats.finalize_artifacts(vec![
            ArtifactInfo {
                path: PathBuf::from("out_part1.md"),
                size: 123,
            },
            ArtifactInfo {
                path: PathBuf::from("out_part2.md"),
                size: 33,
            },
        ]);
        let done = stats.snapshot();
        assert_eq!(done.artifact_count, 2);
        assert_eq!(done.average_artifact_size, 78);
        assert_eq!(done.smallest_artifact.unwrap().path, PathBuf::from("out_part2.md"));
        assert_eq!(done.largest_artifact.unwrap().size, 123);
    }
}
