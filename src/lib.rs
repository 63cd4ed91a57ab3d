/*!
 * AI Digest - aggregate a codebase into markdown for AI assistants
 *
 * This library walks a directory tree, filters it through gitignore-style
 * rules, renders every remaining file as an annotated markdown block and
 * writes the blocks to one artifact or to a series of size-bounded ones.
 */

pub mod classifier;
pub mod collector;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod formatter;
pub mod matcher;
pub mod processor;
pub mod report;
pub mod settings;
pub mod stats;
pub mod types;
pub mod utils;
pub mod writer;


// Re-export main components for easier access
pub use collector::{Collection, FileCollector, OwnOutput};
pub use config::{AggregationRequest, OutputMode};
pub use dispatcher::ConcurrentDispatcher;
pub use error::{DigestError, Result};
pub use formatter::ContentFormatter;
pub use matcher::PathMatcher;
pub use processor::{digest, DigestOutcome, Processor};
pub use report::{DigestReport, Reporter};
pub use settings::{Settings, SettingsManager};
pub use stats::StatsAggregator;
pub use types::{ArtifactInfo, Classification, FileRecord, RunStats};
pub use writer::{create_writer, OutputWriter, SingleWriter, SplitWriter};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
