//! Error types raised while parsing path expressions, loading selector
//! envelopes and compiling selector documents.
//!
//! Every failure is returned as a value. Nothing is mutated before an error is
//! produced, so callers can retry with different input without any cleanup.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the path builder and the JSON envelope loader.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The expression was exactly `/`, which names neither a field nor an index.
    #[error("a standalone '/' is not a valid path")]
    InvalidStandaloneSlash,

    /// The expression was empty and therefore contains no segments.
    #[error("an empty string is not a valid path")]
    EmptyExpression,

    /// A byte outside `[-_0-9a-zA-Z/.]` was found.
    #[error("path string contains invalid character at offset {offset}")]
    InvalidCharacter {
        /// Byte offset of the first disallowed character.
        offset: usize,
    },

    /// The expression holds more segments than the builder accepts.
    #[error("path has {count} segments, more than the maximum of {max}")]
    TooManySegments {
        /// Number of non-empty segments found.
        count: usize,
        /// The accepted maximum.
        max: usize,
    },

    /// An empty segment appeared somewhere other than the first or last slot.
    #[error("invalid empty segment at position {position}")]
    EmptySegment {
        /// Index of the segment within the `/`-split expression.
        position: usize,
    },

    /// The segment was `.` or `..`.
    #[error("unsupported path segment '{value}' at position {position}")]
    ReservedSegment {
        /// The offending segment text.
        value: String,
        /// Index of the segment within the `/`-split expression.
        position: usize,
    },

    /// A digit-only segment carried a redundant leading zero.
    #[error("invalid segment '{value}' at position {position}")]
    InvalidIndexLiteral {
        /// The offending segment text.
        value: String,
        /// Index of the segment within the `/`-split expression.
        position: usize,
    },

    /// A digit-only segment does not fit in the supported index width.
    #[error("invalid index '{value}' at position {position}: value out of range")]
    IndexOutOfRange {
        /// The offending segment text.
        value: String,
        /// Index of the segment within the `/`-split expression.
        position: usize,
    },

    /// The JSON text could not be decoded into a generic node.
    #[error("failed to decode selector document: {0}")]
    Decode(#[from] serde_json::Error),

    /// The decoded document is not a single-entry `{"selector": ...}` map.
    #[error("invalid selector envelope: {reason}")]
    Envelope {
        /// Human-readable description of the deviation.
        reason: String,
    },

    /// The selector document was rejected by the selector compiler.
    #[error("failed to compile selector: {0}")]
    Compile(#[from] CompileError),
}

impl ParseError {
    pub(crate) fn envelope(reason: impl Into<String>) -> Self {
        ParseError::Envelope {
            reason: reason.into(),
        }
    }
}

/// Reasons a generic node is rejected as a selector document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// Every selector is a keyed union and must be a single-entry map.
    #[error("selector is a keyed union and thus must be a single-entry map")]
    NotKeyedUnion,

    /// The union key does not name a known selector kind.
    #[error("selector kind '{0}' is not supported")]
    UnknownKind(String),

    /// A selector body had the wrong node kind.
    #[error("{selector} selector body must be a {expected}")]
    BodyKind {
        /// Name of the selector being compiled.
        selector: &'static str,
        /// Expected node kind of the body.
        expected: &'static str,
    },

    /// A required body field is absent.
    #[error("{selector} selector must have a '{field}' field")]
    MissingField {
        /// Name of the selector being compiled.
        selector: &'static str,
        /// Wire name of the missing field.
        field: &'static str,
    },

    /// A body field holds a value of the wrong kind or out of range.
    #[error("{selector} selector field '{field}' {problem}")]
    InvalidField {
        /// Name of the selector being compiled.
        selector: &'static str,
        /// Wire name of the offending field.
        field: &'static str,
        /// What is wrong with the value.
        problem: &'static str,
    },

    /// A recursion edge appeared outside any recursive explore.
    #[error("ExploreRecursiveEdge must be beneath ExploreRecursive")]
    EdgeOutsideRecursion,

    /// A recursive explore never reaches its edge.
    #[error("ExploreRecursive must contain an ExploreRecursiveEdge in its sequence")]
    RecursionWithoutEdge,

    /// A union selector listed no alternatives.
    #[error("ExploreUnion selector must list at least one member")]
    EmptyUnion,
}

/// Errors raised while loading [`BuildOptions`](crate::BuildOptions).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        /// The file that was being read.
        path: PathBuf,
        /// The underlying I/O failure.
        source: std::io::Error,
    },

    /// The configuration text is not valid options JSON.
    #[error("invalid config: {0}")]
    Json(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_position() {
        let err = ParseError::ReservedSegment {
            value: "..".into(),
            position: 3,
        };
        assert_eq!(
            err.to_string(),
            "unsupported path segment '..' at position 3"
        );

        let err = ParseError::InvalidCharacter { offset: 7 };
        assert_eq!(
            err.to_string(),
            "path string contains invalid character at offset 7"
        );
    }

    #[test]
    fn test_compile_cause_is_appended() {
        let err = ParseError::from(CompileError::UnknownKind("~".into()));
        assert_eq!(
            err.to_string(),
            "failed to compile selector: selector kind '~' is not supported"
        );
        assert!(std::error::Error::source(&err).is_some());
    }
}
