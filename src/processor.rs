/*!
 * Orchestration of one digest run
 */

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use indicatif::ProgressBar;
use tracing::{info, warn};

use crate::collector::{FileCollector, OwnOutput};
use crate::config::{AggregationRequest, OutputMode};
use crate::dispatcher::ConcurrentDispatcher;
use crate::error::Result;
use crate::formatter::ContentFormatter;
use crate::matcher::PathMatcher;
use crate::stats::StatsAggregator;
use crate::types::RunStats;
use crate::utils::to_slash;
use crate::writer::{create_writer, ArtifactNaming, OutputWriter};

/// What a finished run hands back to its caller
#[derive(Debug, Clone)]
pub struct DigestOutcome {
    /// Statistics captured after the writer closed
    pub stats: RunStats,
    /// Artifacts written by the run
    pub artifacts: Vec<PathBuf>,
}

/// Drives collection, processing and writing for one request
pub struct Processor {
    request: AggregationRequest,
    matcher: PathMatcher,
    own_output: Option<OwnOutput>,
    stats: StatsAggregator,
    writer: Box<dyn OutputWriter>,
    progress: Arc<ProgressBar>,
}

impl Processor {
    /// Validate the request and set up the matcher and writer.
    ///
    /// Fails before any file work if the configuration is invalid or the
    /// output cannot be created.
    pub fn new(request: AggregationRequest, progress: Arc<ProgressBar>) -> Result<Self> {
        request.validate()?;
        request.prepare_output_dir()?;

        let stats = StatsAggregator::new();
        let writer = create_writer(&request, &stats)?;
        Self::with_writer(request, writer, stats, progress)
    }

    /// Set up a run around an already created writer.
    ///
    /// `stats` must be the aggregator the writer reports artifacts to.
    pub fn with_writer(
        request: AggregationRequest,
        writer: Box<dyn OutputWriter>,
        stats: StatsAggregator,
        progress: Arc<ProgressBar>,
    ) -> Result<Self> {
        let matcher = PathMatcher::new(&request.ignore_patterns, request.use_default_ignores)?;
        let own_output = own_output(&request);

        Ok(Self {
            request,
            matcher,
            own_output,
            stats,
            writer,
            progress,
        })
    }

    /// Run the pipeline. The writer is closed exactly once, even on failure.
    pub fn run(self) -> Result<DigestOutcome> {
        let result = self.process();
        let closed = self.writer.close();
        result?;
        closed?;

        let stats = self.stats.snapshot();
        info!(
            "Digest complete: {} included, {} ignored, {} failed",
            stats.included_count, stats.ignored_count, stats.error_count
        );

        Ok(DigestOutcome {
            stats,
            artifacts: self.writer.artifacts(),
        })
    }

    fn process(&self) -> Result<()> {
        let collection = FileCollector::new(&self.matcher)
            .skip_output(self.own_output.as_ref())
            .collect(&self.request.input_dir)?;
        let expected = collection.paths.len();
        self.stats.record_seen(collection.total());
        self.stats.record_ignored(collection.ignored);
        self.progress.set_length(collection.paths.len() as u64);

        let dispatcher = ConcurrentDispatcher::new(
            &self.request.input_dir,
            ContentFormatter::new(self.request.remove_whitespace),
            self.request.concurrency,
        );

        let mut received = 0;
        for record in dispatcher.process(collection.paths)? {
            received += 1;
            self.progress.inc(1);
            self.progress
                .set_message(format!("Current file: {}", record.relative_path));

            if let Some(err) = &record.error {
                warn!("Error processing {}: {}", record.relative_path, err);
                self.stats.record_error(&record);
                continue;
            }

            self.writer.write(&record.block)?;
            self.stats.record_included(&record);
        }

        check_complete(expected, received)
    }
}

/// A worker that dies mid-run closes the stream early
fn check_complete(expected: usize, received: usize) -> Result<()> {
    crate::ensure!(
        received == expected,
        Dispatch,
        "{} of {} files produced no result",
        expected - received.min(expected),
        expected
    );
    Ok(())
}

/// Aggregate without a visible progress bar
pub fn digest(request: AggregationRequest) -> Result<DigestOutcome> {
    Processor::new(request, Arc::new(ProgressBar::hidden()))?.run()
}

/// Locate the run's own artifacts when they are written inside the input tree
fn own_output(request: &AggregationRequest) -> Option<OwnOutput> {
    let input = fs::canonicalize(&request.input_dir).ok()?;
    let output_dir = match request.output_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let output_dir = fs::canonicalize(output_dir).ok()?;
    let dir = to_slash(output_dir.strip_prefix(&input).ok()?);

    match &request.mode {
        OutputMode::Single => {
            let name = request.output_file.file_name()?.to_string_lossy();
            if dir.is_empty() {
                Some(OwnOutput::File(name.to_string()))
            } else {
                Some(OwnOutput::File(format!("{}/{}", dir, name)))
            }
        }
        OutputMode::Split { pattern, .. } => Some(OwnOutput::Series {
            dir,
            naming: ArtifactNaming::new(&request.output_file, pattern.clone()),
        }),
    }
}
