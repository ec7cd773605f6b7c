//! Construction of selection specifications from path expressions.
//!
//! The builder validates an expression, then folds its segments from last to
//! first around a terminal node, so the outermost node of the result addresses
//! the first segment of the path. The same fold emits the matching [`Node`]
//! document level by level, which is then compiled into a [`Selector`], and
//! all three are handed back together as a [`SelectionSpec`].

use std::fs;
use std::path::Path;

use facet::Facet;
use log::debug;

use crate::error::{ConfigError, ParseError};
use crate::node::Node;
use crate::path::{self, Segment, SegmentMode};
use crate::selector::{keys, Selector};

/// The selection tree produced by the path builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionNode {
    /// Select exactly this node, no further descent.
    Matcher,
    /// Descend through map key `key`, continuing with `next`.
    ExploreField {
        /// The map key.
        key: String,
        /// Selection applied beneath the key.
        next: Box<SelectionNode>,
    },
    /// Descend through list position `index`, continuing with `next`.
    ExploreIndex {
        /// The list position.
        index: i64,
        /// Selection applied beneath the position.
        next: Box<SelectionNode>,
    },
    /// Apply both alternatives at this position.
    ExploreUnion {
        /// First alternative.
        left: Box<SelectionNode>,
        /// Second alternative.
        right: Box<SelectionNode>,
    },
}

impl SelectionNode {
    /// Wraps `next` in the explore matching `segment`.
    #[must_use]
    pub fn explore(segment: Segment, next: SelectionNode) -> Self {
        let next = Box::new(next);
        match segment {
            Segment::Field(key) => SelectionNode::ExploreField { key, next },
            Segment::Index(index) => SelectionNode::ExploreIndex { index, next },
        }
    }

    /// Joins two alternatives.
    #[must_use]
    pub fn union(left: SelectionNode, right: SelectionNode) -> Self {
        SelectionNode::ExploreUnion {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Number of field and index levels along the deepest branch.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut pending = vec![(self, 0)];
        while let Some((node, levels)) = pending.pop() {
            match node {
                SelectionNode::Matcher => deepest = deepest.max(levels),
                SelectionNode::ExploreField { next, .. }
                | SelectionNode::ExploreIndex { next, .. } => pending.push((&**next, levels + 1)),
                SelectionNode::ExploreUnion { left, right } => {
                    pending.push((&**left, levels));
                    pending.push((&**right, levels));
                }
            }
        }
        deepest
    }

    /// Materializes the tree as a selector document.
    #[must_use]
    pub fn to_node(&self) -> Node {
        match self {
            SelectionNode::Matcher => matcher_node(),
            SelectionNode::ExploreField { key, next } => {
                field_node(key.clone(), next.to_node())
            }
            SelectionNode::ExploreIndex { index, next } => index_node(*index, next.to_node()),
            SelectionNode::ExploreUnion { left, right } => {
                union_node(left.to_node(), right.to_node())
            }
        }
    }
}

fn matcher_node() -> Node {
    Node::single(keys::MATCHER, Node::empty_map())
}

fn field_node(key: String, next: Node) -> Node {
    Node::single(
        keys::EXPLORE_FIELDS,
        Node::single(keys::FIELDS, Node::single(key, next)),
    )
}

fn index_node(index: i64, next: Node) -> Node {
    Node::single(
        keys::EXPLORE_INDEX,
        Node::map([(keys::INDEX, Node::Int(index)), (keys::NEXT, next)]),
    )
}

fn union_node(left: Node, right: Node) -> Node {
    Node::single(keys::EXPLORE_UNION, Node::list([left, right]))
}

/// Options controlling how a path expression is turned into a selection.
///
/// Loadable from JSON such as `{"mode": "field-only", "match_intermediate": true}`;
/// absent fields keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Facet)]
pub struct BuildOptions {
    /// How digit-only segments are classified.
    #[facet(default)]
    pub mode: SegmentMode,

    /// Whether every node along the path is a match, not only the target.
    #[facet(default)]
    pub match_intermediate: bool,
}

impl BuildOptions {
    /// Options for index-aware mode without intermediate matches.
    #[must_use]
    pub fn index_aware() -> Self {
        Self::default()
    }

    /// Options for field-only mode without intermediate matches.
    #[must_use]
    pub fn field_only() -> Self {
        Self {
            mode: SegmentMode::FieldOnly,
            ..Self::default()
        }
    }

    /// Returns these options with intermediate matching set to `enabled`.
    #[must_use]
    pub fn with_match_intermediate(self, enabled: bool) -> Self {
        Self {
            match_intermediate: enabled,
            ..self
        }
    }

    /// Parses options from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if the text is not a valid options object.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        facet_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))
    }

    /// Reads options from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Json`] if its contents are not a valid options object.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}

/// A compiled, read-only selection specification.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionSpec {
    tree: Option<SelectionNode>,
    node: Node,
    selector: Selector,
}

impl SelectionSpec {
    /// Compiles a selector document into a specification.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Compile`] if the document is not a valid selector.
    pub fn from_node(node: Node) -> Result<Self, ParseError> {
        let selector = Selector::compile(&node)?;
        Ok(Self {
            tree: None,
            node,
            selector,
        })
    }

    /// The selector document this specification was compiled from.
    #[must_use]
    pub fn node(&self) -> &Node {
        &self.node
    }

    /// The compiled selector, ready for a traversal engine.
    #[must_use]
    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    /// The selection tree, present when the spec came from a path expression.
    #[must_use]
    pub fn selection(&self) -> Option<&SelectionNode> {
        self.tree.as_ref()
    }

    /// The selector document encoded as canonical JSON.
    #[must_use]
    pub fn to_json(&self) -> String {
        self.node.to_json()
    }

    /// Consumes the specification, returning the compiled selector.
    #[must_use]
    pub fn into_selector(self) -> Selector {
        self.selector
    }
}

/// Builds a selection specification from a path expression.
///
/// Starting from `terminal` (a [`SelectionNode::Matcher`] when `None`), each
/// segment is wrapped around the tree from the last to the first. With
/// `match_intermediate` set, every wrap is joined with a matcher so that each
/// node along the path is reported, not only the target.
///
/// # Errors
///
/// Returns the first [`ParseError`] found by [`path::validate`] or, scanning
/// segments from the end towards the start, by [`path::classify`].
pub fn build(
    expr: &str,
    options: &BuildOptions,
    terminal: Option<SelectionNode>,
) -> Result<SelectionSpec, ParseError> {
    path::validate(expr)?;

    let segments = path::split(expr);
    let last = segments.len().saturating_sub(1);

    // the document is folded alongside the tree, one level per segment
    let mut tree = terminal.unwrap_or(SelectionNode::Matcher);
    let mut node = tree.to_node();
    for (position, raw) in segments.iter().enumerate().rev() {
        let Some(segment) = path::classify(raw, position, last, options.mode)? else {
            continue;
        };
        node = match &segment {
            Segment::Field(key) => field_node(key.clone(), node),
            Segment::Index(index) => index_node(*index, node),
        };
        tree = SelectionNode::explore(segment, tree);
        if options.match_intermediate {
            node = union_node(matcher_node(), node);
            tree = SelectionNode::union(SelectionNode::Matcher, tree);
        }
    }

    debug!(
        "built selection for '{expr}' ({:?}, match_intermediate={}): depth {}",
        options.mode,
        options.match_intermediate,
        tree.depth()
    );

    let selector = Selector::compile(&node)?;
    Ok(SelectionSpec {
        tree: Some(tree),
        node,
        selector,
    })
}

/// Compiles a path expression into a selector that matches only its target.
///
/// Digit-only segments are list indices when `index_aware` is set and map keys
/// otherwise.
///
/// # Errors
///
/// See [`build`].
pub fn selector_from_path(path: &str, index_aware: bool) -> Result<Selector, ParseError> {
    let options = if index_aware {
        BuildOptions::index_aware()
    } else {
        BuildOptions::field_only()
    };
    build(path, &options, None).map(SelectionSpec::into_selector)
}

/// Builds a field-only specification, optionally matching every node along
/// the path and attaching `terminal` at the target.
///
/// # Errors
///
/// See [`build`].
pub fn selector_spec_from_path(
    path: &str,
    match_path: bool,
    terminal: Option<SelectionNode>,
) -> Result<SelectionSpec, ParseError> {
    build(
        path,
        &BuildOptions::field_only().with_match_intermediate(match_path),
        terminal,
    )
}
