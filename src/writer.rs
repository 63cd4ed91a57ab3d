/*!
 * Output writers for digest artifacts
 *
 * A run writes either one artifact or a numbered series of size-bounded
 * artifacts. Both strategies sit behind [`OutputWriter`] and are chosen once
 * by [`create_writer`].
 */

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info};

use crate::config::{AggregationRequest, OutputMode};
use crate::error::{IoResultExt, Result};
use crate::stats::StatsAggregator;
use crate::types::ArtifactInfo;

/// Marker written at the start of every split artifact
pub const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Destination for formatted blocks
pub trait OutputWriter: Send + Sync {
    /// Append one block
    fn write(&self, block: &str) -> Result<()>;

    /// Flush and close all artifacts. Calling it again is a no-op.
    fn close(&self) -> Result<()>;

    /// Paths of the artifacts produced so far
    fn artifacts(&self) -> Vec<PathBuf>;
}

/// Build the writer selected by the request's output mode
pub fn create_writer(
    request: &AggregationRequest,
    stats: &StatsAggregator,
) -> Result<Box<dyn OutputWriter>> {
    match &request.mode {
        OutputMode::Single => Ok(Box::new(SingleWriter::create(
            &request.output_file,
            request.buffer_size,
        )?)),
        OutputMode::Split {
            max_artifact_bytes,
            pattern,
        } => Ok(Box::new(SplitWriter::new(
            ArtifactNaming::new(&request.output_file, pattern.clone()),
            *max_artifact_bytes,
            request.buffer_size,
            stats.clone(),
        ))),
    }
}

fn lock<'a, T>(mutex: &'a Mutex<T>) -> Result<MutexGuard<'a, T>> {
    mutex
        .lock()
        .map_err(|_| crate::error!(Writer, "writer lock poisoned by a panicked thread"))
}

/// Writes every block into one buffered file
pub struct SingleWriter {
    path: PathBuf,
    writer: Mutex<Option<BufWriter<File>>>,
}

impl SingleWriter {
    /// Create (truncating) the destination file
    pub fn create(path: &Path, buffer_size: usize) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create output file {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(Some(BufWriter::with_capacity(buffer_size, file))),
        })
    }
}

impl OutputWriter for SingleWriter {
    fn write(&self, block: &str) -> Result<()> {
        let mut guard = lock(&self.writer)?;
        let writer = match guard.as_mut() {
            Some(writer) => writer,
            None => crate::bail!(Writer, "{} is already closed", self.path.display()),
        };
        writer
            .write_all(block.as_bytes())
            .with_context(|| format!("Failed to write to {}", self.path.display()))
    }

    fn close(&self) -> Result<()> {
        let mut guard = lock(&self.writer)?;
        if let Some(mut writer) = guard.take() {
            writer
                .flush()
                .with_context(|| format!("Failed to flush {}", self.path.display()))?;
        }
        Ok(())
    }

    fn artifacts(&self) -> Vec<PathBuf> {
        vec![self.path.clone()]
    }
}

/// Naming scheme for numbered artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactNaming {
    dir: PathBuf,
    stem: String,
    ext: String,
    pattern: Option<String>,
}

impl ArtifactNaming {
    /// Derive names from the base output path and an optional pattern.
    ///
    /// A pattern holds one `{}` or `%d` placeholder for the 1-based index and
    /// is resolved against the output file's directory.
    pub fn new(output_file: &Path, pattern: Option<String>) -> Self {
        let dir = output_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let stem = output_file
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let ext = output_file
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        Self {
            dir,
            stem,
            ext,
            pattern: pattern.filter(|p| !p.is_empty()),
        }
    }

    /// File name for the artifact with the given index
    pub fn file_name(&self, index: usize) -> String {
        match &self.pattern {
            Some(pattern) if pattern.contains("{}") => pattern.replacen("{}", &index.to_string(), 1),
            Some(pattern) => pattern.replacen("%d", &index.to_string(), 1),
            None => format!("{}_part{}{}", self.stem, index, self.ext),
        }
    }

    /// Full path for the artifact with the given index
    pub fn path_for(&self, index: usize) -> PathBuf {
        self.dir.join(self.file_name(index))
    }

    /// Whether `name` is exactly the name of some artifact in the series
    pub fn matches(&self, name: &str) -> bool {
        let (prefix, suffix) = match &self.pattern {
            Some(pattern) => pattern
                .split_once("{}")
                .or_else(|| pattern.split_once("%d"))
                .map(|(p, s)| (p.to_string(), s.to_string()))
                .unwrap_or_else(|| (pattern.clone(), String::new())),
            None => (format!("{}_part", self.stem), self.ext.clone()),
        };

        let index = name
            .strip_prefix(prefix.as_str())
            .and_then(|rest| rest.strip_suffix(suffix.as_str()));
        match index {
            Some(digits) if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
                digits.parse::<usize>().map_or(false, |n| n > 0 && n.to_string() == digits)
            }
            _ => false,
        }
    }
}

/// Position within the artifact series
#[derive(Debug, Clone)]
pub struct ArtifactCursor {
    /// 1-based index of the open artifact, 0 before the first one
    pub index: usize,
    /// Bytes written to the open artifact, marker excluded
    pub bytes: u64,
    /// How artifacts are named
    pub naming: ArtifactNaming,
}

impl ArtifactCursor {
    /// Cursor positioned before the first artifact
    pub fn new(naming: ArtifactNaming) -> Self {
        Self {
            index: 0,
            bytes: 0,
            naming,
        }
    }

    /// Path of the open artifact
    pub fn current_path(&self) -> PathBuf {
        self.naming.path_for(self.index)
    }

    /// Whether appending `len` bytes requires a new artifact
    pub fn needs_rotation(&self, len: u64, ceiling: u64) -> bool {
        self.index == 0 || self.bytes + len > ceiling
    }
}

struct SplitState {
    cursor: ArtifactCursor,
    writer: Option<BufWriter<File>>,
    closed: bool,
}

/// Spreads blocks across numbered artifacts bounded by a byte ceiling
pub struct SplitWriter {
    state: Mutex<SplitState>,
    ceiling: u64,
    buffer_size: usize,
    stats: StatsAggregator,
}

impl SplitWriter {
    /// Create a writer; no artifact is opened until the first block arrives
    pub fn new(
        naming: ArtifactNaming,
        ceiling: u64,
        buffer_size: usize,
        stats: StatsAggregator,
    ) -> Self {
        Self {
            state: Mutex::new(SplitState {
                cursor: ArtifactCursor::new(naming),
                writer: None,
                closed: false,
            }),
            ceiling,
            buffer_size,
            stats,
        }
    }

    fn finish_current(state: &mut SplitState) -> Result<()> {
        if let Some(mut writer) = state.writer.take() {
            let path = state.cursor.current_path();
            writer
                .flush()
                .with_context(|| format!("Failed to flush {}", path.display()))?;
        }
        Ok(())
    }

    fn rotate(&self, state: &mut SplitState) -> Result<()> {
        Self::finish_current(state)?;

        state.cursor.index += 1;
        state.cursor.bytes = 0;
        let path = state.cursor.current_path();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let mut file = File::create(&path)
            .with_context(|| format!("Failed to create file {}", path.display()))?;
        file.write_all(UTF8_BOM)
            .with_context(|| format!("Failed to write UTF-8 BOM to {}", path.display()))?;

        state.writer = Some(BufWriter::with_capacity(self.buffer_size, file));
        self.stats.record_artifact_opened();
        info!("Created new file: {}", path.display());
        Ok(())
    }

    /// Stat every produced artifact
    fn measure(cursor: &ArtifactCursor) -> Result<Vec<ArtifactInfo>> {
        (1..=cursor.index)
            .map(|index| {
                let path = cursor.naming.path_for(index);
                let size = fs::metadata(&path)
                    .with_context(|| format!("Failed to stat file {}", path.display()))?
                    .len();
                Ok(ArtifactInfo { path, size })
            })
            .collect()
    }
}

impl OutputWriter for SplitWriter {
    fn write(&self, block: &str) -> Result<()> {
        let mut state = lock(&self.state)?;
        crate::ensure!(!state.closed, Writer, "split output is already closed");

        let len = block.len() as u64;
        if state.writer.is_none() || state.cursor.needs_rotation(len, self.ceiling) {
            self.rotate(&mut state)?;
        }

        let path = state.cursor.current_path();
        if let Some(writer) = state.writer.as_mut() {
            writer
                .write_all(block.as_bytes())
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }
        state.cursor.bytes += len;
        self.stats.update_extremes(&path, state.cursor.bytes);

        if state.cursor.bytes >= self.ceiling {
            debug!("{} reached the size ceiling, flushing", path.display());
            if let Some(writer) = state.writer.as_mut() {
                writer
                    .flush()
                    .with_context(|| format!("Failed to flush {}", path.display()))?;
            }
        }

        Ok(())
    }

    fn close(&self) -> Result<()> {
        let mut state = lock(&self.state)?;
        if state.closed {
            return Ok(());
        }
        state.closed = true;

        Self::finish_current(&mut state)?;
        let artifacts = Self::measure(&state.cursor)?;
        self.stats.finalize_artifacts(artifacts);
        Ok(())
    }

    fn artifacts(&self) -> Vec<PathBuf> {
        match lock(&self.state) {
            Ok(state) => (1..=state.cursor.index)
                .map(|index| state.cursor.naming.path_for(index))
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_naming_schemes() {
        let derived = ArtifactNaming::new(Path::new("out/codebase.md"), None);
        assert_eq!(derived.path_for(3), PathBuf::from("out/codebase_part3.md"));
        assert!(derived.matches("codebase_part3.md"));
        assert!(derived.matches("codebase_part12.md"));
        assert!(!derived.matches("codebase_partners.md"));
        assert!(!derived.matches("codebase_part.md"));
        assert!(!derived.matches("codebase_part0.md"));
        assert!(!derived.matches("codebase_part03.md"));

        let printf = ArtifactNaming::new(Path::new("out/codebase.md"), Some("chunk_%d.md".into()));
        assert_eq!(printf.path_for(2), PathBuf::from("out/chunk_2.md"));

        let braces = ArtifactNaming::new(Path::new("digest"), Some("digest-{}.txt".into()));
        assert_eq!(braces.path_for(10), PathBuf::from("digest-10.txt"));
        assert!(braces.matches("digest-10.txt"));
        assert!(!braces.matches("digest-final.txt"));
        assert!(!printf.matches("chunk_[1].md"));
    }

    #[test]
    fn test_single_writer_has_no_marker() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("codebase.md");
        let writer = SingleWriter::create(&path, 16).unwrap();
        writer.write("# a.txt\n\n").unwrap();
        writer.write("more\n").unwrap();
        writer.close().unwrap();
        writer.close().unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"# a.txt\n\nmore\n");
        assert!(writer.write("late").is_err());
    }

    #[test]
    fn test_split_writer_rotates_at_ceiling() {
        let dir = tempdir().unwrap();
        let stats = StatsAggregator::new();
        let naming = ArtifactNaming::new(&dir.path().join("codebase.md"), None);
        let writer = SplitWriter::new(naming, 10, 4, stats.clone());

        writer.write("aaaaaa").unwrap(); // 6
        writer.write("bbbb").unwrap(); // 10, fits exactly
        writer.write("cc").unwrap(); // rotates
        writer.write("dddddddddddddddd").unwrap(); // oversized, own artifact
        writer.write("e").unwrap();
        writer.close().unwrap();

        let parts: Vec<Vec<u8>> = writer
            .artifacts()
            .iter()
            .map(|p| fs::read(p).unwrap())
            .collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], b"\xEF\xBB\xBFaaaaaabbbb");
        assert_eq!(parts[1], b"\xEF\xBB\xBFcc");
        assert_eq!(parts[2], b"\xEF\xBB\xBFdddddddddddddddd");
        assert_eq!(parts[3], b"\xEF\xBB\xBFe");

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.artifact_count, 4);
        assert_eq!(snapshot.artifacts[0].size, 13);
        assert_eq!(snapshot.smallest_artifact.unwrap().size, 4);
        assert_eq!(snapshot.largest_artifact.unwrap().size, 19);
        assert_eq!(snapshot.average_artifact_size, (13 + 5 + 19 + 4) / 4);
    }

    #[test]
    fn test_split_writer_without_writes_produces_nothing() {
        let dir = tempdir().unwrap();
        let stats = StatsAggregator::new();
        let naming = ArtifactNaming::new(&dir.path().join("codebase.md"), None);
        let writer = SplitWriter::new(naming, 1024, 64, stats.clone());
        writer.close().unwrap();

        assert!(writer.artifacts().is_empty());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
        assert_eq!(stats.snapshot().artifact_count, 0);
    }

    #[test]
    fn test_cursor_rotation_rule() {
        let mut cursor = ArtifactCursor::new(ArtifactNaming::new(Path::new("x.md"), None));
        assert!(cursor.needs_rotation(1, 100));
        cursor.index = 1;
        cursor.bytes = 60;
        assert!(!cursor.needs_rotation(40, 100));
        assert!(cursor.needs_rotation(41, 100));
    }
}
