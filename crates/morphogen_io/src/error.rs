//! Error types for morphogen_io.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IoError {
    /// Malformed genome file; `line` is 1-based.
    #[error("Format error at line {line}: {message}")]
    Format { line: usize, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Rkyv error: {0}")]
    Rkyv(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Well-formed input describing an invalid genome or phenotype.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{context}: {source}")]
    Context {
        context: String,
        source: Box<IoError>,
    },
}

pub type Result<T> = std::result::Result<T, IoError>;

impl IoError {
    #[must_use]
    pub fn format<S: Into<String>>(line: usize, message: S) -> Self {
        Self::Format {
            line,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        Self::Serialization(msg.into())
    }

    #[must_use]
    pub fn rkyv<S: Into<String>>(msg: S) -> Self {
        Self::Rkyv(msg.into())
    }

    #[must_use]
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// Wraps the error with what was being attempted.
    #[must_use]
    pub fn with_context<S: Into<String>>(self, context: S) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Whether this is (or wraps) a genome file format error.
    #[must_use]
    pub fn is_format(&self) -> bool {
        match self {
            Self::Format { .. } => true,
            Self::Context { source, .. } => source.is_format(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_display() {
        let err = IoError::format(7, "expected ARGS");
        assert_eq!(err.to_string(), "Format error at line 7: expected ARGS");
        assert!(err.is_format());
    }

    #[test]
    fn test_context_keeps_kind() {
        let err = IoError::format(1, "bad").with_context("loading genome.cel");
        assert!(err.to_string().starts_with("loading genome.cel"));
        assert!(err.is_format());
        assert!(!IoError::validation("x").with_context("y").is_format());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: IoError = io_err.into();
        assert!(matches!(err, IoError::FileSystem(_)));
    }
}
