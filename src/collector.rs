/*!
 * Directory traversal and ignore filtering
 */

use std::path::Path;

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::Result;
use crate::matcher::PathMatcher;
use crate::utils::to_slash;
use crate::writer::ArtifactNaming;

/// Paths that survived filtering, plus how many were ignored
#[derive(Debug, Clone, Default)]
pub struct Collection {
    /// Relative, slash-separated paths of files to process
    pub paths: Vec<String>,
    /// Number of files excluded by the matcher
    pub ignored: usize,
}

impl Collection {
    /// Every file the walk encountered
    pub fn total(&self) -> usize {
        self.paths.len() + self.ignored
    }
}

/// The run's own output when it lives inside the input tree.
///
/// Paths are relative to the input root and slash-separated. Matching is by
/// exact name, never by pattern, so neighbouring input files are unaffected.
#[derive(Debug, Clone)]
pub enum OwnOutput {
    /// The single output file
    File(String),
    /// Numbered artifacts written into `dir`
    Series {
        /// Directory of the artifacts, empty for the input root
        dir: String,
        /// Naming scheme of the series
        naming: ArtifactNaming,
    },
}

impl OwnOutput {
    /// Whether `relative` names one of the run's artifacts
    pub fn contains(&self, relative: &str) -> bool {
        match self {
            OwnOutput::File(path) => relative == path,
            OwnOutput::Series { dir, naming } => {
                let name = if dir.is_empty() {
                    Some(relative)
                } else {
                    relative
                        .strip_prefix(dir.as_str())
                        .and_then(|rest| rest.strip_prefix('/'))
                };
                name.map_or(false, |name| naming.matches(name))
            }
        }
    }
}

/// Walks an input tree and filters it through a [`PathMatcher`]
pub struct FileCollector<'a> {
    matcher: &'a PathMatcher,
    own_output: Option<&'a OwnOutput>,
}

impl<'a> FileCollector<'a> {
    /// Create a collector using the given matcher
    pub fn new(matcher: &'a PathMatcher) -> Self {
        Self {
            matcher,
            own_output: None,
        }
    }

    /// Skip the run's own artifacts. They are neither yielded nor counted.
    pub fn skip_output(mut self, own_output: Option<&'a OwnOutput>) -> Self {
        self.own_output = own_output;
        self
    }

    /// Walk `root` recursively.
    ///
    /// Any traversal error aborts the walk; no partial listing is returned.
    pub fn collect(&self, root: &Path) -> Result<Collection> {
        info!("Collecting files from {}", root.display());
        let mut collection = Collection::default();

        for entry in WalkDir::new(root).follow_links(true) {
            let entry = entry?;
            if entry.file_type().is_dir() {
                continue;
            }

            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            let relative = to_slash(relative);

            if self.own_output.map_or(false, |own| own.contains(&relative)) {
                debug!("Skipping own output {}", relative);
                continue;
            }

            if self.matcher.should_ignore(&relative) {
                debug!("Ignoring {}", relative);
                collection.ignored += 1;
                continue;
            }

            collection.paths.push(relative);
        }

        info!(
            "Found {} files to process ({} ignored)",
            collection.paths.len(),
            collection.ignored
        );
        Ok(collection)
    }
}
