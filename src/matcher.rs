/*!
 * Ignore-rule matching for relative paths
 *
 * Two independent gitignore rule sets are compiled up front: the built-in
 * defaults and the user's custom patterns. A path is ignored when either
 * active set ignores it or any of its parent directories.
 */

use std::path::Path;

use ignore::gitignore::{Gitignore, GitignoreBuilder};

use crate::error::Result;
use crate::utils::DEFAULT_IGNORES;

/// Decides whether a path relative to the input root is excluded
#[derive(Debug, Clone)]
pub struct PathMatcher {
    /// Compiled default rules, present only when defaults are enabled
    default_rules: Option<Gitignore>,
    /// Compiled custom rules, present only when patterns were supplied
    custom_rules: Option<Gitignore>,
}

impl PathMatcher {
    /// Compile a matcher from custom pattern lines and the default switch
    pub fn new<S: AsRef<str>>(custom_patterns: &[S], use_default: bool) -> Result<Self> {
        let default_rules = if use_default {
            Some(compile(DEFAULT_IGNORES.iter())?)
        } else {
            None
        };

        let custom_rules = if custom_patterns.is_empty() {
            None
        } else {
            Some(compile(custom_patterns.iter())?)
        };

        Ok(Self {
            default_rules,
            custom_rules,
        })
    }

    /// A matcher with no active rule sets
    pub fn empty() -> Self {
        Self {
            default_rules: None,
            custom_rules: None,
        }
    }

    /// Whether any rule set is active
    pub fn is_active(&self) -> bool {
        self.default_rules.is_some() || self.custom_rules.is_some()
    }

    /// Check whether a relative path should be ignored
    pub fn should_ignore(&self, relative_path: &str) -> bool {
        let normalized = relative_path.replace('\\', "/");
        let normalized = normalized.trim_start_matches("./").trim_start_matches('/');
        if normalized.is_empty() {
            return false;
        }
        let path = Path::new(normalized);

        [&self.default_rules, &self.custom_rules]
            .into_iter()
            .flatten()
            .any(|rules| rules.matched_path_or_any_parents(path, false).is_ignore())
    }
}

/// Compile pattern lines into one gitignore rule set
fn compile<I, S>(patterns: I) -> Result<Gitignore>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut builder = GitignoreBuilder::new(".");
    for pattern in patterns {
        let line = pattern.as_ref().trim_end();
        if line.is_empty() {
            continue;
        }
        builder.add_line(None, line)?;
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_rules_ignores_nothing() {
        let matcher = PathMatcher::new::<&str>(&[], false).unwrap();
        assert!(!matcher.is_active());
        assert!(!matcher.should_ignore("node_modules/pkg/index.js"));
        assert!(!matcher.should_ignore(".git/config"));
    }

    #[test]
    fn test_default_rules() {
        let matcher = PathMatcher::new::<&str>(&[], true).unwrap();
        assert!(matcher.should_ignore("node_modules/pkg/index.js"));
        assert!(matcher.should_ignore("web/node_modules/react/index.js"));
        assert!(matcher.should_ignore(".git/HEAD"));
        assert!(matcher.should_ignore("Cargo.lock"));
        assert!(matcher.should_ignore("app/.env.local"));
        assert!(matcher.should_ignore("codebase.md"));
        assert!(matcher.should_ignore("pkg/__pycache__/mod.cpython-311.pyc"));
        assert!(!matcher.should_ignore("src/main.rs"));
        assert!(!matcher.should_ignore("README.md"));
    }

    #[test]
    fn test_windows_separators_are_normalized() {
        let matcher = PathMatcher::new::<&str>(&[], true).unwrap();
        assert!(matcher.should_ignore("node_modules\\pkg\\index.js"));
    }

    #[test]
    fn test_custom_rules_with_negation() {
        let patterns = vec!["*.log".to_string(), "!keep.log".to_string(), "/docs/".to_string()];
        let matcher = PathMatcher::new(&patterns, false).unwrap();
        assert!(matcher.should_ignore("server.log"));
        assert!(matcher.should_ignore("nested/server.log"));
        assert!(!matcher.should_ignore("keep.log"));
        assert!(matcher.should_ignore("docs/guide.md"));
        assert!(!matcher.should_ignore("src/docs.rs"));
    }

    #[test]
    fn test_either_rule_set_ignores() {
        let matcher = PathMatcher::new(&["*.snap"], true).unwrap();
        assert!(matcher.should_ignore("tests/output.snap"));
        assert!(matcher.should_ignore("dist/bundle.js"));
        assert!(!matcher.should_ignore("src/lib.rs"));
    }

    #[test]
    fn test_comments_and_blank_lines_are_skipped() {
        let matcher = PathMatcher::new(&["# comment", "", "secret.txt"], false).unwrap();
        assert!(matcher.should_ignore("secret.txt"));
        assert!(!matcher.should_ignore("# comment"));
    }
}
