/*!
 * Bounded concurrent processing of collected files
 *
 * Paths are fanned out over a fixed-size rayon pool. Every path produces
 * exactly one [`FileRecord`] on a channel; the channel closes once the
 * coordinating thread has seen every unit finish.
 */

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::thread;

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::debug;

use crate::classifier::{file_type_label, is_text, treat_as_binary_by_extension};
use crate::error::{DigestError, Result};
use crate::formatter::ContentFormatter;
use crate::types::{Classification, FileRecord};

/// Fans per-file work out to a bounded worker pool
#[derive(Debug, Clone)]
pub struct ConcurrentDispatcher {
    /// Input root the relative paths are resolved against
    root: PathBuf,
    /// Renderer shared by all workers
    formatter: ContentFormatter,
    /// Maximum number of files processed at once
    concurrency: usize,
}

impl ConcurrentDispatcher {
    /// Create a dispatcher for files under `root`
    pub fn new(root: impl Into<PathBuf>, formatter: ContentFormatter, concurrency: usize) -> Self {
        Self {
            root: root.into(),
            formatter,
            concurrency,
        }
    }

    /// Start processing `paths`, returning the stream of results.
    ///
    /// Results arrive in completion order. The receiver is exhausted once
    /// every path has produced its record.
    pub fn process(&self, paths: Vec<String>) -> Result<Receiver<FileRecord>> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.concurrency)
            .thread_name(|i| format!("ai-digest-worker-{}", i))
            .build()
            .map_err(|e| DigestError::Config(format!("Failed to build worker pool: {}", e)))?;

        let (sender, receiver) = mpsc::channel();
        let root = self.root.clone();
        let formatter = self.formatter;

        thread::Builder::new()
            .name("ai-digest-dispatch".to_string())
            .spawn(move || {
                pool.install(|| {
                    paths.into_par_iter().for_each_with(sender, |sender, relative| {
                        let record = process_file(&root, &formatter, relative);
                        // The consumer may have stopped after a write failure
                        let _ = sender.send(record);
                    });
                });
            })?;

        Ok(receiver)
    }
}

/// Stat, classify and render one file
pub fn process_file(root: &Path, formatter: &ContentFormatter, relative: String) -> FileRecord {
    let full_path = root.join(&relative);
    debug!("Processing {}", relative);

    let size = match fs::metadata(&full_path) {
        Ok(metadata) => metadata.len(),
        Err(e) => return FileRecord::failed(relative, e.into()),
    };

    let text = match is_text(&full_path) {
        Ok(text) => text,
        Err(e) => return FileRecord::failed(relative, e),
    };

    if text && !treat_as_binary_by_extension(&relative) {
        let rendered = fs::read(&full_path)
            .map_err(DigestError::from)
            .and_then(|raw| formatter.render_text(&relative, &raw));
        match rendered {
            Ok(block) => FileRecord {
                relative_path: relative,
                size,
                classification: Classification::Text,
                block,
                error: None,
            },
            Err(e) => FileRecord::failed(relative, e),
        }
    } else {
        let label = file_type_label(&relative);
        let block = formatter.render_binary_placeholder(&relative, label);
        FileRecord {
            relative_path: relative,
            size,
            classification: Classification::Binary {
                label: label.to_string(),
            },
            block,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::tempdir;

    #[test]
    fn test_every_path_yields_one_record() {
        let dir = tempdir().unwrap();
        let mut paths = Vec::new();
        for i in 0..50 {
            let name = format!("file{}.txt", i);
            fs::write(dir.path().join(&name), format!("content {}", i)).unwrap();
            paths.push(name);
        }
        paths.push("missing.txt".to_string());

        let dispatcher = ConcurrentDispatcher::new(dir.path(), ContentFormatter::new(false), 4);
        let records: Vec<FileRecord> = dispatcher.process(paths).unwrap().into_iter().collect();

        assert_eq!(records.len(), 51);
        let unique: HashSet<_> = records.iter().map(|r| r.relative_path.clone()).collect();
        assert_eq!(unique.len(), 51);
        let failed: Vec<_> = records.iter().filter(|r| r.is_error()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].relative_path, "missing.txt");
    }

    #[test]
    fn test_binary_by_content_and_extension() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("blob.dat"), [0u8, 1, 2, 3, 0]).unwrap();
        fs::write(dir.path().join("fake.png"), "not really an image").unwrap();
        let formatter = ContentFormatter::new(false);

        let blob = process_file(dir.path(), &formatter, "blob.dat".to_string());
        assert_eq!(
            blob.classification,
            Classification::Binary {
                label: "Binary".to_string()
            }
        );
        assert_eq!(blob.size, 5);

        let png = process_file(dir.path(), &formatter, "fake.png".to_string());
        assert_eq!(png.block, "# fake.png\n\nThis is a binary file of type: Image\n\n");
    }

    #[test]
    fn test_invalid_utf8_is_a_per_file_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("latin1.txt"), b"caf\xE9 au lait").unwrap();

        let record = process_file(
            dir.path(),
            &ContentFormatter::new(false),
            "latin1.txt".to_string(),
        );
        assert!(matches!(record.error, Some(DigestError::Encoding(_))));
        assert!(record.block.is_empty());
    }
}
