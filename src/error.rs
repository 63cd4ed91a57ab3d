//! Global error handling for ai-digest
//!
//! This module provides a centralized error type that can represent errors
//! from every stage of a digest run.

use std::io;
use thiserror::Error;

/// Global error type for ai-digest operations
#[derive(Error, Debug)]
pub enum DigestError {
    /// File system errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid ignore pattern
    #[error("Ignore pattern error: {0}")]
    Ignore(#[from] ignore::Error),

    /// Directory traversal errors
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// JSON processing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Content that is not valid UTF-8
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Writer errors
    #[error("Writer error: {0}")]
    Writer(String),

    /// Worker results lost before reaching the writer
    #[error("Dispatch error: {0}")]
    Dispatch(String),

    /// Path not found
    #[error("Path not found: {0}")]
    PathNotFound(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Specialized Result type for ai-digest operations
pub type Result<T> = std::result::Result<T, DigestError>;

/// Creates a DigestError with a formatted message
#[macro_export]
macro_rules! error {
    ($error_type:ident, $($arg:tt)*) => {
        $crate::error::DigestError::$error_type(format!($($arg)*))
    };
}

/// Returns an error result with a formatted message
#[macro_export]
macro_rules! bail {
    ($error_type:ident, $($arg:tt)*) => {
        return Err($crate::error!($error_type, $($arg)*))
    };
}

/// Ensures a condition is true, otherwise returns an error
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $error_type:ident, $($arg:tt)*) => {
        if !($cond) {
            $crate::bail!($error_type, $($arg)*)
        }
    };
}

/// Extension trait for adding path context to I/O errors
pub trait IoResultExt<T> {
    /// Wrap an I/O error with a description of what was being done
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display;
}

impl<T> IoResultExt<T> for std::result::Result<T, io::Error> {
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display,
    {
        self.map_err(|e| {
            let context = f();
            DigestError::Io(io::Error::new(e.kind(), format!("{}: {}", context, e)))
        })
    }
}

// Allow converting DigestError to io::Error so the binary can return io::Result
impl From<DigestError> for io::Error {
    fn from(err: DigestError) -> Self {
        match err {
            DigestError::Io(e) => e,
            other => io::Error::new(io::ErrorKind::Other, other.to_string()),
        }
    }
}
