/*!
 * Configuration handling for ai-digest
 */

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use crate::error::{IoResultExt, Result};
use crate::settings::Settings;
use crate::utils::{DEFAULT_CONCURRENCY, DEFAULT_OUTPUT_FILE, MB};

/// Command-line arguments for ai-digest
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "ai-digest",
    version = env!("CARGO_PKG_VERSION"),
    about = "AI Digest - Code aggregation tool for AI assistants",
    long_about = "Aggregates a codebase into one or more markdown files for easy sharing with AI assistants."
)]
pub struct Cli {
    /// Show debug logging
    #[clap(long, short, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors and hide the progress bar
    #[clap(long, short, global = true)]
    pub quiet: bool,

    #[clap(subcommand)]
    pub command: Command,
}

/// Top-level commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create a digest of your codebase
    Digest(DigestArgs),

    /// Manage AI Digest configuration
    Config {
        /// Config file path (defaults to ./ai-digest.json)
        #[clap(long)]
        config: Option<PathBuf>,

        #[clap(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        #[clap(value_enum)]
        shell: Shell,
    },
}

/// Settings file operations
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Initialize configuration file
    Init,
}

/// Arguments of the `digest` command
#[derive(clap::Args, Debug, Clone)]
pub struct DigestArgs {
    /// Input directory containing the codebase
    #[clap(short, long, default_value = ".")]
    pub input: PathBuf,

    /// Output markdown file path
    #[clap(short, long, default_value = DEFAULT_OUTPUT_FILE)]
    pub output: PathBuf,

    /// Disable default ignore patterns
    #[clap(long)]
    pub no_default_ignores: bool,

    /// Enable whitespace removal for non-sensitive files
    #[clap(long)]
    pub whitespace_removal: bool,

    /// Display a list of files included in the output
    #[clap(long)]
    pub show_output_files: bool,

    /// Custom ignore file name (defaults to the settings value)
    #[clap(long)]
    pub ignore_file: Option<String>,

    /// Split output into multiple files
    #[clap(long)]
    pub split: bool,

    /// Maximum size of each output file in MB (only used with --split)
    #[clap(long, default_value = "10")]
    pub max_size: u64,

    /// Pattern for split output files, e.g. 'part_%d.md' or 'part_{}.md'
    #[clap(long)]
    pub output_pattern: Option<String>,

    /// Size of the write buffer in MB
    #[clap(long, default_value = "1")]
    pub chunk_size: u64,

    /// Number of files processed concurrently
    #[clap(long, default_value_t = DEFAULT_CONCURRENCY)]
    pub threads: usize,

    /// Settings file path (defaults to ./ai-digest.json)
    #[clap(long)]
    pub config: Option<PathBuf>,
}

/// How output is persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// Everything in one artifact
    Single,
    /// Numbered artifacts, each bounded by a byte ceiling
    Split {
        /// Ceiling for a single artifact, excluding its marker
        max_artifact_bytes: u64,
        /// Naming pattern with one index placeholder
        pattern: Option<String>,
    },
}

impl OutputMode {
    /// Whether output is split across several artifacts
    pub fn is_split(&self) -> bool {
        matches!(self, Self::Split { .. })
    }
}

/// Everything one digest run needs; fixed once processing starts
#[derive(Debug, Clone)]
pub struct AggregationRequest {
    /// Root of the tree to aggregate
    pub input_dir: PathBuf,

    /// Output file, or base name of split artifacts
    pub output_file: PathBuf,

    /// Apply the built-in ignore rules
    pub use_default_ignores: bool,

    /// Collapse whitespace in non-sensitive files
    pub remove_whitespace: bool,

    /// List included files in the summary
    pub show_output_files: bool,

    /// Name of the custom ignore file
    pub ignore_file: String,

    /// Custom ignore patterns already loaded by the caller
    pub ignore_patterns: Vec<String>,

    /// Single or split output
    pub mode: OutputMode,

    /// Write buffer capacity in bytes
    pub buffer_size: usize,

    /// Number of files processed at once
    pub concurrency: usize,
}

impl AggregationRequest {
    /// Request with defaults for the given input and output
    pub fn new(input_dir: impl Into<PathBuf>, output_file: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_file: output_file.into(),
            use_default_ignores: true,
            remove_whitespace: false,
            show_output_files: false,
            ignore_file: crate::utils::DEFAULT_IGNORE_FILE.to_string(),
            ignore_patterns: Vec::new(),
            mode: OutputMode::Single,
            buffer_size: MB as usize,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Build a request from `digest` arguments and the loaded settings.
    ///
    /// Patterns from the custom ignore file in the input directory are
    /// loaded here; the settings' default ignores extend the built-in
    /// defaults when those are enabled.
    pub fn from_args(args: DigestArgs, settings: &Settings) -> Result<Self> {
        crate::ensure!(args.max_size > 0, InvalidArgument, "max-size must be greater than 0");
        crate::ensure!(args.chunk_size > 0, InvalidArgument, "chunk-size must be greater than 0");
        let max_artifact_bytes = megabytes(args.max_size, "max-size")?;
        let buffer_size = usize::try_from(megabytes(args.chunk_size, "chunk-size")?)
            .map_err(|_| crate::error!(InvalidArgument, "chunk-size is too large: {} MB", args.chunk_size))?;

        let use_default_ignores = !args.no_default_ignores;
        let ignore_file = args
            .ignore_file
            .unwrap_or_else(|| settings.ignore_file.clone());

        let mut ignore_patterns = load_ignore_patterns(&args.input.join(&ignore_file))?;
        if use_default_ignores {
            ignore_patterns.extend(settings.default_ignores.iter().cloned());
        }

        let mode = if args.split {
            OutputMode::Split {
                max_artifact_bytes,
                pattern: args.output_pattern,
            }
        } else {
            OutputMode::Single
        };

        Ok(Self {
            input_dir: args.input,
            output_file: args.output,
            use_default_ignores,
            remove_whitespace: args.whitespace_removal,
            show_output_files: args.show_output_files,
            ignore_file,
            ignore_patterns,
            mode,
            buffer_size,
            concurrency: args.threads,
        })
    }

    /// Validate the request before any file work starts
    pub fn validate(&self) -> Result<()> {
        if !self.input_dir.exists() {
            crate::bail!(
                PathNotFound,
                "input directory does not exist: {}",
                self.input_dir.display()
            );
        }
        crate::ensure!(
            self.input_dir.is_dir(),
            InvalidArgument,
            "input path is not a directory: {}",
            self.input_dir.display()
        );
        crate::ensure!(self.buffer_size > 0, Config, "buffer size must be greater than 0");
        crate::ensure!(self.concurrency > 0, Config, "threads must be greater than 0");

        if let OutputMode::Split {
            max_artifact_bytes,
            pattern,
        } = &self.mode
        {
            crate::ensure!(*max_artifact_bytes > 0, Config, "max-size must be greater than 0");
            if let Some(pattern) = pattern.as_deref().filter(|p| !p.is_empty()) {
                let placeholders = pattern.matches("{}").count() + pattern.matches("%d").count();
                crate::ensure!(
                    placeholders == 1,
                    InvalidArgument,
                    "output pattern must contain exactly one '{{}}' or '%d' placeholder: {}",
                    pattern
                );
            }
        }

        Ok(())
    }

    /// Create the output directory if it does not exist yet
    pub fn prepare_output_dir(&self) -> Result<()> {
        if let Some(parent) = self.output_file.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create output directory {}", parent.display())
                })?;
            }
        }
        Ok(())
    }
}

/// Convert a megabyte count from the command line to bytes
fn megabytes(value: u64, flag: &str) -> Result<u64> {
    value
        .checked_mul(MB)
        .ok_or_else(|| crate::error!(InvalidArgument, "{} is too large: {} MB", flag, value))
}

/// Read pattern lines from an ignore file; a missing file yields no patterns
pub fn load_ignore_patterns(path: &Path) -> Result<Vec<String>> {
    if !path.is_file() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read ignore file {}", path.display()))?;

    Ok(content
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DigestError;
    use tempfile::tempdir;

    fn parse_digest(args: &[&str]) -> DigestArgs {
        let mut argv = vec!["ai-digest", "digest"];
        argv.extend_from_slice(args);
        match Cli::parse_from(argv).command {
            Command::Digest(args) => args,
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_digest_defaults() {
        let args = parse_digest(&[]);
        assert_eq!(args.input, PathBuf::from("."));
        assert_eq!(args.output, PathBuf::from("codebase.md"));
        assert_eq!(args.max_size, 10);
        assert_eq!(args.chunk_size, 1);
        assert_eq!(args.threads, 10);
        assert!(!args.split);
        assert!(!args.no_default_ignores);
    }

    #[test]
    fn test_request_from_args() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(".aidigestignore"),
            "# generated\n*.snap\n\nfixtures/\n",
        )
        .unwrap();

        let input = dir.path().to_string_lossy().to_string();
        let args = parse_digest(&[
            "-i",
            &input,
            "--split",
            "--max-size",
            "2",
            "--output-pattern",
            "part_%d.md",
        ]);
        let settings = Settings {
            default_ignores: vec!["*.tmp".to_string()],
            ignore_file: ".aidigestignore".to_string(),
        };
        let request = AggregationRequest::from_args(args, &settings).unwrap();

        assert_eq!(request.ignore_patterns, vec!["*.snap", "fixtures/", "*.tmp"]);
        assert_eq!(
            request.mode,
            OutputMode::Split {
                max_artifact_bytes: 2 * MB,
                pattern: Some("part_%d.md".to_string()),
            }
        );
        assert_eq!(request.buffer_size, MB as usize);
        request.validate().unwrap();
    }

    #[test]
    fn test_settings_ignores_follow_default_switch() {
        let dir = tempdir().unwrap();
        let input = dir.path().to_string_lossy().to_string();
        let args = parse_digest(&["-i", &input, "--no-default-ignores"]);
        let request = AggregationRequest::from_args(args, &Settings::default()).unwrap();
        assert!(!request.use_default_ignores);
        assert!(request.ignore_patterns.is_empty());
    }

    #[test]
    fn test_zero_sizes_are_rejected() {
        let args = parse_digest(&["--max-size", "0"]);
        assert!(matches!(
            AggregationRequest::from_args(args, &Settings::default()),
            Err(DigestError::InvalidArgument(_))
        ));

        let dir = tempdir().unwrap();
        let mut request = AggregationRequest::new(dir.path(), dir.path().join("out.md"));
        request.buffer_size = 0;
        assert!(matches!(request.validate(), Err(DigestError::Config(_))));
    }

    #[test]
    fn test_oversized_sizes_are_rejected() {
        let huge = u64::MAX.to_string();
        for flag in ["--max-size", "--chunk-size"] {
            let args = parse_digest(&["--split", flag, &huge]);
            assert!(matches!(
                AggregationRequest::from_args(args, &Settings::default()),
                Err(DigestError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn test_validate_input_and_pattern() {
        let dir = tempdir().unwrap();
        let missing = AggregationRequest::new(dir.path().join("absent"), "out.md");
        assert!(matches!(missing.validate(), Err(DigestError::PathNotFound(_))));

        let mut request = AggregationRequest::new(dir.path(), "out.md");
        request.mode = OutputMode::Split {
            max_artifact_bytes: 100,
            pattern: Some("no-placeholder.md".to_string()),
        };
        assert!(matches!(request.validate(), Err(DigestError::InvalidArgument(_))));
    }

    #[test]
    fn test_prepare_output_dir() {
        let dir = tempdir().unwrap();
        let request = AggregationRequest::new(dir.path(), dir.path().join("a/b/out.md"));
        request.prepare_output_dir().unwrap();
        assert!(dir.path().join("a/b").is_dir());
    }
}
