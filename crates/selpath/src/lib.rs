//! Compile textual path expressions into tree selectors.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::multiple_crate_versions)]

/// Error types for parsing, envelope loading, compilation and configuration.
pub mod error;

/// Generic tree data model and its JSON codec.
///
/// Selector documents and the data they select from share this one model, so
/// a document can be built, encoded, decoded and compiled without any
/// intermediate representation.
pub mod node;

/// Path expression validation and segment classification.
pub mod path;

/// Compiled selectors and the selector-document compiler.
///
/// The compiler accepts the full selector format, which is strictly more
/// expressive than the path grammar: recursion, ranges and wildcards are only
/// reachable through documents loaded by [`envelope`].
pub mod selector;

/// Selection trees, build options, and the path builder.
pub mod spec;

/// Loading specifications from a `{"selector": ...}` JSON envelope.
pub mod envelope;

pub use envelope::from_json;
pub use error::{CompileError, ConfigError, ParseError};
pub use node::Node;
pub use path::{Segment, SegmentMode};
pub use selector::{RecursionLimit, Selector};
pub use spec::{
    build, selector_from_path, selector_spec_from_path, BuildOptions, SelectionNode,
    SelectionSpec,
};
