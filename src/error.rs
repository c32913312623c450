use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("error reading input: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to open file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("invalid UTF-8 input: {0}")]
    InvalidEncoding(#[from] std::str::Utf8Error),
    #[error("required environment variable {0} is not set")]
    MissingVar(String),
    #[error("failed to set environment variable {key:?}: {reason}")]
    SetVar { key: String, reason: &'static str },
}

/// A line that matches neither assignment form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error on line {line}: invalid line format: {content:?}")]
pub struct ParseError {
    /// 1-based line number.
    pub line: usize,
    /// The offending line after comment stripping.
    pub content: String,
}

impl ParseError {
    pub(crate) fn new(line: usize, content: impl Into<String>) -> Self {
        Self {
            line,
            content: content.into(),
        }
    }
}
