/*!
 * Utility functions and fixed tables for ai-digest
 */

use std::collections::{HashMap, HashSet};
use std::path::Path;

use once_cell::sync::Lazy;

/// Default output file name, also excluded by the default ignore rules
pub const DEFAULT_OUTPUT_FILE: &str = "codebase.md";

/// Default custom ignore file name
pub const DEFAULT_IGNORE_FILE: &str = ".aidigestignore";

/// Default number of concurrent file workers
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Total included size above which token estimation is skipped
pub const RECOMMENDED_MAX_OUTPUT: u64 = 10 * 1024 * 1024;

/// Bytes per megabyte for flag conversions
pub const MB: u64 = 1024 * 1024;

/// Format a human-readable file size
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}

/// Rough token estimate: four bytes per token
pub fn estimate_token_count(bytes: u64) -> u64 {
    bytes / 4
}

/// Render a path with forward slashes regardless of platform
pub fn to_slash(path: &Path) -> String {
    let joined = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    joined.replace('\\', "/")
}

/// Extension of the final path segment as written, leading dot included.
///
/// Everything from the last dot counts, so `.gitignore` yields itself and
/// `Makefile` yields an empty string.
pub fn raw_extension(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.rfind('.').map_or("", |idx| &name[idx..])
}

/// Lowercased [`raw_extension`], used for type lookups
pub fn extension_of(path: &str) -> String {
    raw_extension(path).to_lowercase()
}

/// Extensions whose whitespace is significant
pub static WHITESPACE_SENSITIVE: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        ".py",     // Python
        ".yaml",   // YAML
        ".yml",    // YAML
        ".jade",   // Jade/Pug
        ".haml",   // Haml
        ".slim",   // Slim
        ".coffee", // CoffeeScript
        ".pug",    // Pug
        ".styl",   // Stylus
        ".gd",     // Godot
    ]
    .into_iter()
    .collect()
});

/// Human-readable labels for non-text file extensions
pub static BINARY_FILE_TYPES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (".jpg", "Image"),
        (".jpeg", "Image"),
        (".png", "Image"),
        (".gif", "Image"),
        (".bmp", "Image"),
        (".webp", "Image"),
        (".ico", "Image"),
        (".svg", "SVG Image"),
        (".wasm", "WebAssembly"),
        (".pdf", "PDF"),
        (".doc", "Word Document"),
        (".docx", "Word Document"),
        (".xls", "Excel Spreadsheet"),
        (".xlsx", "Excel Spreadsheet"),
        (".ppt", "PowerPoint Presentation"),
        (".pptx", "PowerPoint Presentation"),
        (".zip", "Compressed Archive"),
        (".rar", "Compressed Archive"),
        (".7z", "Compressed Archive"),
        (".gz", "Compressed Archive"),
        (".tar", "Archive"),
        (".exe", "Executable"),
        (".dll", "Dynamic-link Library"),
        (".so", "Shared Object"),
        (".dylib", "Dynamic Library"),
    ])
});

/// Default patterns to ignore
pub static DEFAULT_IGNORES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        // Node.js
        "node_modules",
        "package-lock.json",
        "npm-debug.log",
        // Yarn
        "yarn.lock",
        "yarn-error.log",
        // pnpm
        "pnpm-lock.yaml",
        // Bun
        "bun.lockb",
        // Deno
        "deno.lock",
        // PHP
        "vendor",
        "composer.lock",
        // Python
        "__pycache__",
        "*.pyc",
        "*.pyo",
        "*.pyd",
        ".Python",
        "pip-log.txt",
        "pip-delete-this-directory.txt",
        ".venv",
        "venv",
        "ENV",
        "env",
        // Godot
        ".godot",
        "*.import",
        // Ruby
        "Gemfile.lock",
        ".bundle",
        // Java
        "*.class",
        // Gradle
        ".gradle",
        "build",
        // Maven
        "pom.xml.tag",
        "pom.xml.releaseBackup",
        "pom.xml.versionsBackup",
        "pom.xml.next",
        // .NET
        "bin",
        "obj",
        "*.suo",
        "*.user",
        // Go
        "go.sum",
        // Rust
        "Cargo.lock",
        "target",
        // Version Control
        ".git",
        ".svn",
        ".hg",
        // OS Files
        ".DS_Store",
        "Thumbs.db",
        // IDEs & Editors
        ".idea",
        ".vscode",
        // Environment variables
        ".env",
        ".env.local",
        ".env.development.local",
        ".env.test.local",
        ".env.production.local",
        "*.env",
        "*.env.*",
        // Framework caches
        ".svelte-kit",
        ".next",
        ".nuxt",
        ".vuepress",
        ".cache",
        ".turbo",
        "dist",
        "tmp",
        // Output file
        DEFAULT_OUTPUT_FILE,
    ]
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(512), "512 bytes");
        assert_eq!(format_file_size(2048), "2.00 KB");
        assert_eq!(format_file_size(3 * MB / 2), "1.50 MB");
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("src/main.RS"), ".rs");
        assert_eq!(extension_of("docs/README.md"), ".md");
        assert_eq!(extension_of("Makefile"), "");
        assert_eq!(extension_of("config/.env"), ".env");
        assert_eq!(extension_of("a.b/c"), "");
    }

    #[test]
    fn test_raw_extension() {
        assert_eq!(raw_extension("src/Main.RS"), ".RS");
        assert_eq!(raw_extension(".gitignore"), ".gitignore");
        assert_eq!(raw_extension("archive.tar.gz"), ".gz");
        assert_eq!(raw_extension("trailing."), ".");
        assert_eq!(raw_extension("dir.d/Makefile"), "");
    }

    #[test]
    fn test_to_slash() {
        let path: PathBuf = ["src", "nested", "file.rs"].iter().collect();
        assert_eq!(to_slash(&path), "src/nested/file.rs");
    }
}
