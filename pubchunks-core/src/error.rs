//! Error types for document loading and query evaluation.

use crate::types::{DocumentFailure, FailureKind};
use thiserror::Error;

/// Errors that can occur while turning a source into a parsed document.
#[derive(Error, Debug)]
pub enum ChunkError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed XML: {message}")]
    Malformed { message: String },

    #[error("document has no root element")]
    Empty,

    #[error(transparent)]
    Query(#[from] QueryError),
}

impl ChunkError {
    pub fn malformed(message: impl Into<String>) -> Self {
        ChunkError::Malformed {
            message: message.into(),
        }
    }

    /// Convert into the serializable failure recorded on a document result
    pub fn to_failure(&self) -> DocumentFailure {
        let kind = match self {
            ChunkError::Io { .. } => FailureKind::Unreadable,
            ChunkError::Empty => FailureKind::Empty,
            ChunkError::Malformed { .. } | ChunkError::Query(_) => FailureKind::Malformed,
        };
        DocumentFailure {
            kind,
            message: self.to_string(),
        }
    }
}

/// Errors raised by the structural query engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("empty query")]
    Empty,

    #[error("invalid query `{query}`: {reason}")]
    Compile { query: String, reason: String },

    #[error("query `{query}` failed: {reason}")]
    Evaluate { query: String, reason: String },

    #[error("context node belongs to another document")]
    ForeignContext,
}

pub type Result<T> = std::result::Result<T, ChunkError>;
