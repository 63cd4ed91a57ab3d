/*!
 * Text/binary classification of input files
 */

use std::fs::File;
use std::io::Read;
use std::path::Path;

use content_inspector::{inspect, ContentType};

use crate::error::Result;
use crate::utils::{extension_of, BINARY_FILE_TYPES};

/// Number of leading bytes sampled for sniffing
pub const SNIFF_LEN: usize = 512;

/// Sniffed type reported for content that is not text
pub const BINARY_CONTENT_TYPE: &str = "application/x-binary";

/// Classify a sample of bytes into a content type string.
///
/// The content_inspector verdict decides binary versus text; text is refined
/// into SVG, HTML, XML or plain text by looking at the leading markup.
pub fn sniff_content_type(sample: &[u8]) -> &'static str {
    match inspect(sample) {
        ContentType::BINARY => return BINARY_CONTENT_TYPE,
        ContentType::UTF_16LE | ContentType::UTF_16BE => return "text/plain; charset=utf-16",
        ContentType::UTF_32LE | ContentType::UTF_32BE => return "text/plain; charset=utf-32",
        ContentType::UTF_8 | ContentType::UTF_8_BOM => {}
    }

    let text = String::from_utf8_lossy(sample);
    let head = text
        .trim_start_matches('\u{feff}')
        .trim_start()
        .to_ascii_lowercase();

    if head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg")) {
        "image/svg+xml"
    } else if head.starts_with("<!doctype html") || head.starts_with("<html") {
        "text/html; charset=utf-8"
    } else if head.starts_with("<?xml") {
        "text/xml; charset=utf-8"
    } else {
        "text/plain; charset=utf-8"
    }
}

/// Whether the path has an `.svg` extension
pub fn is_svg(path: &str) -> bool {
    extension_of(path) == ".svg"
}

/// Decide whether a file is text by sniffing its first bytes.
///
/// SVG files are always text even though they sniff as an image type.
pub fn is_text(path: &Path) -> Result<bool> {
    let mut file = File::open(path)?;
    let mut sample = Vec::with_capacity(SNIFF_LEN);
    file.by_ref().take(SNIFF_LEN as u64).read_to_end(&mut sample)?;

    if is_svg(&path.to_string_lossy()) {
        return Ok(true);
    }

    Ok(!sniff_content_type(&sample).contains("binary"))
}

/// Label for a non-text file, taken from its extension
pub fn file_type_label(path: &str) -> &'static str {
    BINARY_FILE_TYPES
        .get(extension_of(path).as_str())
        .copied()
        .unwrap_or("Binary")
}

/// Whether the extension alone marks the file as binary
pub fn treat_as_binary_by_extension(path: &str) -> bool {
    let ext = extension_of(path);
    ext != ".svg" && BINARY_FILE_TYPES.contains_key(ext.as_str())
}
