//! Compiled selectors and the selector-document compiler.
//!
//! A selector document is a [`Node`] in the short-key wire format: every
//! selector is a single-entry map whose key names the selector kind and whose
//! value is its body.
//!
//! | Key | Kind | Body |
//! |-----|------|------|
//! | `.` | [`Selector::Matcher`] | `{}` |
//! | `a` | [`Selector::ExploreAll`] | `{">": selector}` |
//! | `f` | [`Selector::ExploreFields`] | `{"f>": {key: selector, ...}}` |
//! | `i` | [`Selector::ExploreIndex`] | `{"i": int, ">": selector}` |
//! | `r` | [`Selector::ExploreRange`] | `{"^": int, "$": int, ">": selector}` |
//! | `R` | [`Selector::ExploreRecursive`] | `{"l": limit, ":>": selector}` |
//! | `@` | [`Selector::ExploreRecursiveEdge`] | `{}` |
//! | `\|` | [`Selector::ExploreUnion`] | `[selector, ...]` |
//!
//! [`Selector::compile`] turns such a document into a [`Selector`], which
//! exposes the query surface a traversal engine drives: [`Selector::interests`],
//! [`Selector::explore`] and [`Selector::decide`]. Walking data is left to the
//! engine.

use std::collections::BTreeMap;

use log::trace;

use crate::error::CompileError;
use crate::node::Node;
use crate::path::Segment;

/// Wire keys of the selector document format.
pub mod keys {
    /// Matcher kind.
    pub const MATCHER: &str = ".";
    /// `ExploreAll` kind.
    pub const EXPLORE_ALL: &str = "a";
    /// `ExploreFields` kind.
    pub const EXPLORE_FIELDS: &str = "f";
    /// `ExploreIndex` kind.
    pub const EXPLORE_INDEX: &str = "i";
    /// `ExploreRange` kind.
    pub const EXPLORE_RANGE: &str = "r";
    /// `ExploreRecursive` kind.
    pub const EXPLORE_RECURSIVE: &str = "R";
    /// `ExploreRecursiveEdge` kind.
    pub const EXPLORE_RECURSIVE_EDGE: &str = "@";
    /// `ExploreUnion` kind.
    pub const EXPLORE_UNION: &str = "|";

    /// The continuation selector of single-child explores.
    pub const NEXT: &str = ">";
    /// The field map of `ExploreFields`.
    pub const FIELDS: &str = "f>";
    /// The position of `ExploreIndex`.
    pub const INDEX: &str = "i";
    /// The inclusive start of `ExploreRange`.
    pub const START: &str = "^";
    /// The exclusive end of `ExploreRange`.
    pub const END: &str = "$";
    /// The recursion limit of `ExploreRecursive`.
    pub const LIMIT: &str = "l";
    /// The repeated sequence of `ExploreRecursive`.
    pub const SEQUENCE: &str = ":>";
    /// Unbounded recursion limit.
    pub const LIMIT_NONE: &str = "none";
    /// Depth-bounded recursion limit.
    pub const LIMIT_DEPTH: &str = "depth";
}

/// Widest range [`Selector::interests`] lists position by position.
const MAX_LISTED_RANGE: i64 = 1024;

/// How deep an [`Selector::ExploreRecursive`] may repeat its sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionLimit {
    /// Repeat without bound.
    None,
    /// Repeat at most this many times.
    Depth(i64),
}

/// An executable selector.
///
/// The set of variants is closed so that traversal engines can match on it
/// exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Select the current node and stop.
    Matcher,
    /// Continue with `next` under every child.
    ExploreAll {
        /// Selector applied to each child.
        next: Box<Selector>,
    },
    /// Continue under the named map keys.
    ExploreFields {
        /// Selector applied under each key.
        fields: BTreeMap<String, Selector>,
    },
    /// Continue under one list position.
    ExploreIndex {
        /// The list position.
        index: i64,
        /// Selector applied to the item.
        next: Box<Selector>,
    },
    /// Continue under a half-open range of list positions.
    ExploreRange {
        /// Inclusive start position.
        start: i64,
        /// Exclusive end position.
        end: i64,
        /// Selector applied to each item in range.
        next: Box<Selector>,
    },
    /// Repeat `sequence` at every recursion edge, up to `limit` times.
    ExploreRecursive {
        /// Remaining recursion budget.
        limit: RecursionLimit,
        /// The selector substituted at each edge.
        sequence: Box<Selector>,
        /// The selector in effect at the current position.
        current: Box<Selector>,
    },
    /// Marks where an enclosing recursive explore repeats.
    ExploreRecursiveEdge,
    /// Apply every member at the current position.
    ExploreUnion(Vec<Selector>),
}

impl Selector {
    /// Compiles a selector document.
    ///
    /// # Errors
    ///
    /// Returns a [`CompileError`] describing the first part of the document
    /// that does not follow the selector format.
    pub fn compile(node: &Node) -> Result<Self, CompileError> {
        trace!("compiling selector document {node}");
        compile_node(node, false)
    }

    /// Returns the selector kind name.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Selector::Matcher => "Matcher",
            Selector::ExploreAll { .. } => "ExploreAll",
            Selector::ExploreFields { .. } => "ExploreFields",
            Selector::ExploreIndex { .. } => "ExploreIndex",
            Selector::ExploreRange { .. } => "ExploreRange",
            Selector::ExploreRecursive { .. } => "ExploreRecursive",
            Selector::ExploreRecursiveEdge => "ExploreRecursiveEdge",
            Selector::ExploreUnion(_) => "ExploreUnion",
        }
    }

    /// Serializes the selector back into its document form.
    ///
    /// Recursive explores serialize their original sequence and remaining
    /// limit.
    #[must_use]
    pub fn to_node(&self) -> Node {
        match self {
            Selector::Matcher => Node::single(keys::MATCHER, Node::empty_map()),
            Selector::ExploreAll { next } => Node::single(
                keys::EXPLORE_ALL,
                Node::single(keys::NEXT, next.to_node()),
            ),
            Selector::ExploreFields { fields } => Node::single(
                keys::EXPLORE_FIELDS,
                Node::single(
                    keys::FIELDS,
                    Node::map(fields.iter().map(|(k, v)| (k.clone(), v.to_node()))),
                ),
            ),
            Selector::ExploreIndex { index, next } => Node::single(
                keys::EXPLORE_INDEX,
                Node::map([
                    (keys::INDEX, Node::Int(*index)),
                    (keys::NEXT, next.to_node()),
                ]),
            ),
            Selector::ExploreRange { start, end, next } => Node::single(
                keys::EXPLORE_RANGE,
                Node::map([
                    (keys::START, Node::Int(*start)),
                    (keys::END, Node::Int(*end)),
                    (keys::NEXT, next.to_node()),
                ]),
            ),
            Selector::ExploreRecursive {
                limit, sequence, ..
            } => {
                let limit = match limit {
                    RecursionLimit::None => Node::single(keys::LIMIT_NONE, Node::empty_map()),
                    RecursionLimit::Depth(d) => Node::single(keys::LIMIT_DEPTH, Node::Int(*d)),
                };
                Node::single(
                    keys::EXPLORE_RECURSIVE,
                    Node::map([(keys::LIMIT, limit), (keys::SEQUENCE, sequence.to_node())]),
                )
            }
            Selector::ExploreRecursiveEdge => {
                Node::single(keys::EXPLORE_RECURSIVE_EDGE, Node::empty_map())
            }
            Selector::ExploreUnion(members) => Node::single(
                keys::EXPLORE_UNION,
                Node::list(members.iter().map(Selector::to_node)),
            ),
        }
    }

    /// Returns the child segments this selector may explore, or `None` if any
    /// child may be explored.
    ///
    /// Ranges wider than 1024 positions are reported as `None` rather than
    /// listed.
    #[must_use]
    pub fn interests(&self) -> Option<Vec<Segment>> {
        match self {
            Selector::Matcher | Selector::ExploreRecursiveEdge => Some(Vec::new()),
            Selector::ExploreAll { .. } => None,
            Selector::ExploreFields { fields } => {
                Some(fields.keys().cloned().map(Segment::Field).collect())
            }
            Selector::ExploreIndex { index, .. } => Some(vec![Segment::Index(*index)]),
            Selector::ExploreRange { start, end, .. } => {
                let width = end.saturating_sub(*start);
                (width <= MAX_LISTED_RANGE).then(|| (*start..*end).map(Segment::Index).collect())
            }
            Selector::ExploreRecursive { current, .. } => current.interests(),
            Selector::ExploreUnion(members) => {
                let mut all = Vec::new();
                for member in members {
                    all.extend(member.interests()?);
                }
                Some(all)
            }
        }
    }

    /// Returns the selector to apply to the child of `node` reached through
    /// `segment`, or `None` if that child is not explored.
    #[must_use]
    pub fn explore(&self, node: &Node, segment: &Segment) -> Option<Selector> {
        match self {
            Selector::Matcher | Selector::ExploreRecursiveEdge => None,
            Selector::ExploreAll { next } => Some(next.as_ref().clone()),
            Selector::ExploreFields { fields } => fields.get(&segment.to_string()).cloned(),
            Selector::ExploreIndex { index, next } => {
                (node.as_list().is_some() && segment_index(segment) == Some(*index))
                    .then(|| next.as_ref().clone())
            }
            Selector::ExploreRange { start, end, next } => {
                let in_range = segment_index(segment).is_some_and(|i| *start <= i && i < *end);
                (node.as_list().is_some() && in_range).then(|| next.as_ref().clone())
            }
            Selector::ExploreRecursive {
                limit,
                sequence,
                current,
            } => explore_recursive(*limit, sequence, current, node, segment),
            Selector::ExploreUnion(members) => {
                let mut explored: Vec<Selector> = members
                    .iter()
                    .filter_map(|member| member.explore(node, segment))
                    .collect();
                match explored.len() {
                    0 => None,
                    1 => explored.pop(),
                    _ => Some(Selector::ExploreUnion(explored)),
                }
            }
        }
    }

    /// Returns `true` if the current position is itself a match.
    #[must_use]
    pub fn decide(&self) -> bool {
        match self {
            Selector::Matcher => true,
            Selector::ExploreRecursive { current, .. } => current.decide(),
            Selector::ExploreUnion(members) => members.iter().any(Selector::decide),
            _ => false,
        }
    }

    fn has_edge(&self) -> bool {
        match self {
            Selector::ExploreRecursiveEdge => true,
            Selector::ExploreUnion(members) => members.iter().any(Selector::has_edge),
            _ => false,
        }
    }

    /// Substitutes recursion edges at this position; `None` drops them.
    fn replace_edge(self, replacement: Option<&Selector>) -> Option<Selector> {
        match self {
            Selector::ExploreRecursiveEdge => replacement.cloned(),
            Selector::ExploreUnion(members) => {
                let mut kept: Vec<Selector> = members
                    .into_iter()
                    .filter_map(|member| member.replace_edge(replacement))
                    .collect();
                match kept.len() {
                    0 => None,
                    1 => kept.pop(),
                    _ => Some(Selector::ExploreUnion(kept)),
                }
            }
            other => Some(other),
        }
    }

    fn contains_edge(&self) -> bool {
        match self {
            Selector::ExploreRecursiveEdge => true,
            Selector::Matcher | Selector::ExploreRecursive { .. } => false,
            Selector::ExploreAll { next }
            | Selector::ExploreIndex { next, .. }
            | Selector::ExploreRange { next, .. } => next.contains_edge(),
            Selector::ExploreFields { fields } => fields.values().any(Selector::contains_edge),
            Selector::ExploreUnion(members) => members.iter().any(Selector::contains_edge),
        }
    }
}

fn segment_index(segment: &Segment) -> Option<i64> {
    match segment {
        Segment::Index(i) => Some(*i),
        Segment::Field(key) => key.parse().ok(),
    }
}

fn explore_recursive(
    limit: RecursionLimit,
    sequence: &Selector,
    current: &Selector,
    node: &Node,
    segment: &Segment,
) -> Option<Selector> {
    let next = current.explore(node, segment)?;

    if !next.has_edge() {
        return Some(Selector::ExploreRecursive {
            limit,
            sequence: Box::new(sequence.clone()),
            current: Box::new(next),
        });
    }

    let limit = match limit {
        RecursionLimit::Depth(d) if d < 2 => return next.replace_edge(None),
        RecursionLimit::Depth(d) => RecursionLimit::Depth(d - 1),
        RecursionLimit::None => RecursionLimit::None,
    };

    let current = next.replace_edge(Some(sequence))?;
    Some(Selector::ExploreRecursive {
        limit,
        sequence: Box::new(sequence.clone()),
        current: Box::new(current),
    })
}

fn compile_node(node: &Node, in_recursion: bool) -> Result<Selector, CompileError> {
    let entries = node.as_map().ok_or(CompileError::NotKeyedUnion)?;
    if entries.len() != 1 {
        return Err(CompileError::NotKeyedUnion);
    }
    let Some((kind, body)) = entries.iter().next() else {
        return Err(CompileError::NotKeyedUnion);
    };

    match kind.as_str() {
        keys::MATCHER => {
            body_map(body, "Matcher")?;
            Ok(Selector::Matcher)
        }
        keys::EXPLORE_ALL => {
            let body = body_map(body, "ExploreAll")?;
            let next = required(body, "ExploreAll", keys::NEXT)?;
            Ok(Selector::ExploreAll {
                next: Box::new(compile_node(next, in_recursion)?),
            })
        }
        keys::EXPLORE_FIELDS => {
            let body = body_map(body, "ExploreFields")?;
            let fields = required(body, "ExploreFields", keys::FIELDS)?
                .as_map()
                .ok_or(CompileError::InvalidField {
                    selector: "ExploreFields",
                    field: keys::FIELDS,
                    problem: "must be a map",
                })?;
            let fields = fields
                .iter()
                .map(|(key, sel)| Ok((key.clone(), compile_node(sel, in_recursion)?)))
                .collect::<Result<_, CompileError>>()?;
            Ok(Selector::ExploreFields { fields })
        }
        keys::EXPLORE_INDEX => {
            let body = body_map(body, "ExploreIndex")?;
            let index = non_negative(body, "ExploreIndex", keys::INDEX)?;
            let next = required(body, "ExploreIndex", keys::NEXT)?;
            Ok(Selector::ExploreIndex {
                index,
                next: Box::new(compile_node(next, in_recursion)?),
            })
        }
        keys::EXPLORE_RANGE => {
            let body = body_map(body, "ExploreRange")?;
            let start = non_negative(body, "ExploreRange", keys::START)?;
            let end = non_negative(body, "ExploreRange", keys::END)?;
            if end <= start {
                return Err(CompileError::InvalidField {
                    selector: "ExploreRange",
                    field: keys::END,
                    problem: "must be greater than start",
                });
            }
            let next = required(body, "ExploreRange", keys::NEXT)?;
            Ok(Selector::ExploreRange {
                start,
                end,
                next: Box::new(compile_node(next, in_recursion)?),
            })
        }
        keys::EXPLORE_RECURSIVE => compile_recursive(body_map(body, "ExploreRecursive")?),
        keys::EXPLORE_RECURSIVE_EDGE => {
            body_map(body, "ExploreRecursiveEdge")?;
            if !in_recursion {
                return Err(CompileError::EdgeOutsideRecursion);
            }
            Ok(Selector::ExploreRecursiveEdge)
        }
        keys::EXPLORE_UNION => {
            let members = body.as_list().ok_or(CompileError::BodyKind {
                selector: "ExploreUnion",
                expected: "list",
            })?;
            if members.is_empty() {
                return Err(CompileError::EmptyUnion);
            }
            let members = members
                .iter()
                .map(|member| compile_node(member, in_recursion))
                .collect::<Result<_, _>>()?;
            Ok(Selector::ExploreUnion(members))
        }
        other => Err(CompileError::UnknownKind(other.to_owned())),
    }
}

fn compile_recursive(body: &BTreeMap<String, Node>) -> Result<Selector, CompileError> {
    let limit = recursion_limit(required(body, "ExploreRecursive", keys::LIMIT)?)?;
    let sequence = compile_node(required(body, "ExploreRecursive", keys::SEQUENCE)?, true)?;
    if !sequence.contains_edge() {
        return Err(CompileError::RecursionWithoutEdge);
    }
    Ok(Selector::ExploreRecursive {
        limit,
        current: Box::new(sequence.clone()),
        sequence: Box::new(sequence),
    })
}

fn body_map<'a>(
    body: &'a Node,
    selector: &'static str,
) -> Result<&'a BTreeMap<String, Node>, CompileError> {
    body.as_map().ok_or(CompileError::BodyKind {
        selector,
        expected: "map",
    })
}

fn required<'a>(
    body: &'a BTreeMap<String, Node>,
    selector: &'static str,
    field: &'static str,
) -> Result<&'a Node, CompileError> {
    body.get(field)
        .ok_or(CompileError::MissingField { selector, field })
}

fn non_negative(
    body: &BTreeMap<String, Node>,
    selector: &'static str,
    field: &'static str,
) -> Result<i64, CompileError> {
    let value = required(body, selector, field)?
        .as_int()
        .ok_or(CompileError::InvalidField {
            selector,
            field,
            problem: "must be an integer",
        })?;
    if value < 0 {
        return Err(CompileError::InvalidField {
            selector,
            field,
            problem: "must not be negative",
        });
    }
    Ok(value)
}

fn recursion_limit(node: &Node) -> Result<RecursionLimit, CompileError> {
    let invalid = CompileError::InvalidField {
        selector: "ExploreRecursive",
        field: keys::LIMIT,
        problem: "must be a single-entry map of 'none' or 'depth'",
    };
    let entries = node.as_map().filter(|m| m.len() == 1).ok_or(invalid.clone())?;

    if entries.contains_key(keys::LIMIT_NONE) {
        return Ok(RecursionLimit::None);
    }

    match entries.get(keys::LIMIT_DEPTH).and_then(Node::as_int) {
        Some(depth) if depth >= 0 => Ok(RecursionLimit::Depth(depth)),
        Some(_) => Err(CompileError::InvalidField {
            selector: "ExploreRecursive",
            field: keys::LIMIT_DEPTH,
            problem: "must not be negative",
        }),
        None => Err(invalid),
    }
}
