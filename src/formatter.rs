/*!
 * Markdown block rendering for individual files
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::classifier::is_svg;
use crate::error::{DigestError, Result};
use crate::utils::{raw_extension, WHITESPACE_SENSITIVE};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

// ASCII whitespace only: space, \t, \n, \v, \f, \r
static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t\n\x0B\x0C\r]+").expect("whitespace pattern is valid"));

/// Collapse runs of ASCII whitespace to a single space, then trim any
/// Unicode whitespace from both ends
pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").trim().to_string()
}

/// Whether normalization must be skipped for this path's extension.
///
/// The lookup is case-sensitive: `script.PY` is normalized.
pub fn is_whitespace_sensitive(path: &str) -> bool {
    WHITESPACE_SENSITIVE.contains(raw_extension(path))
}

/// Renders files into annotated markdown blocks
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentFormatter {
    /// Collapse whitespace in non-sensitive files
    remove_whitespace: bool,
}

impl ContentFormatter {
    /// Create a formatter
    pub fn new(remove_whitespace: bool) -> Self {
        Self { remove_whitespace }
    }

    /// Render a text file's raw bytes as a fenced block
    pub fn render_text(&self, relative_path: &str, raw: &[u8]) -> Result<String> {
        let raw = raw.strip_prefix(UTF8_BOM).unwrap_or(raw);
        let content = std::str::from_utf8(raw).map_err(|e| {
            DigestError::Encoding(format!("{} contains invalid UTF-8: {}", relative_path, e))
        })?;

        let content = if self.remove_whitespace && !is_whitespace_sensitive(relative_path) {
            normalize_whitespace(content)
        } else {
            content.to_string()
        };

        let ext = raw_extension(relative_path);
        let mut block = String::with_capacity(content.len() + relative_path.len() + 32);
        block.push_str("# ");
        block.push_str(relative_path);
        block.push_str("\n\n");

        // Markdown may contain ``` fences of its own
        if ext == ".md" || ext == ".markdown" {
            block.push_str("````md\n");
            block.push_str(&content);
            block.push_str("\n````\n\n");
        } else {
            block.push_str("```");
            block.push_str(ext.strip_prefix('.').unwrap_or(ext));
            block.push('\n');
            block.push_str(&content);
            block.push_str("\n```\n\n");
        }

        Ok(block)
    }

    /// Render the description block used in place of a non-text file
    pub fn render_binary_placeholder(&self, relative_path: &str, label: &str) -> String {
        let description = if is_svg(relative_path) {
            format!("This is a file of type: {}", label)
        } else {
            format!("This is a binary file of type: {}", label)
        };
        format!("# {}\n\n{}\n\n", relative_path, description)
    }
}
