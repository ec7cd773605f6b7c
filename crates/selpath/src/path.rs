//! Lexical validation and segment classification for path expressions.
//!
//! A path expression is a `/`-separated list of segments drawn from the
//! charset `[-_0-9a-zA-Z/.]`. [`validate`] rejects malformed input before any
//! interpretation happens; [`classify`] then turns each raw segment into a
//! [`Segment`] while the builder walks the expression back to front.

use std::fmt;

use facet::Facet;

use crate::error::ParseError;

/// The separator between path segments.
pub const SEPARATOR: char = '/';

/// The largest index accepted in index-aware mode (31-bit signed range).
pub const MAX_INDEX: i64 = (1 << 30) - 1;

/// The most non-empty segments an expression may hold.
pub const MAX_SEGMENTS: usize = 128;

/// How digit-only segments are interpreted.
///
/// The two modes disagree on purely numeric segments such as `42`, so a
/// deployment has to pick the one its consumers expect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Facet)]
#[repr(u8)]
pub enum SegmentMode {
    /// Digit-only segments become array indices.
    #[default]
    #[facet(rename = "index-aware")]
    IndexAware,
    /// Every segment is a field key; index or field resolution is left to the
    /// data the selector is evaluated against.
    #[facet(rename = "field-only")]
    FieldOnly,
}

/// A classified path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// A map key.
    Field(String),
    /// A list position.
    Index(i64),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Field(key) => f.write_str(key),
            Segment::Index(idx) => write!(f, "{idx}"),
        }
    }
}

fn is_path_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'/' | b'.')
}

/// Checks an expression against the allowed charset and top-level rules.
///
/// # Errors
///
/// - [`ParseError::InvalidStandaloneSlash`] if the expression is exactly `/`.
/// - [`ParseError::InvalidCharacter`] with the byte offset of the first
///   character outside the allowed set.
/// - [`ParseError::EmptyExpression`] if the expression is empty.
/// - [`ParseError::TooManySegments`] if more than [`MAX_SEGMENTS`] segments
///   are non-empty.
pub fn validate(expr: &str) -> Result<(), ParseError> {
    if expr == "/" {
        return Err(ParseError::InvalidStandaloneSlash);
    }

    if let Some(offset) = expr.bytes().position(|b| !is_path_byte(b)) {
        return Err(ParseError::InvalidCharacter { offset });
    }

    if expr.is_empty() {
        return Err(ParseError::EmptyExpression);
    }

    let count = expr.split(SEPARATOR).filter(|raw| !raw.is_empty()).count();
    if count > MAX_SEGMENTS {
        return Err(ParseError::TooManySegments {
            count,
            max: MAX_SEGMENTS,
        });
    }

    Ok(())
}

/// Splits an expression strictly on `/`, keeping empty segments.
#[must_use]
pub fn split(expr: &str) -> Vec<&str> {
    expr.split(SEPARATOR).collect()
}

/// Classifies the raw segment found at `position` of a split expression whose
/// final position is `last`.
///
/// Returns `Ok(None)` for the single leading or trailing empty segment that a
/// `/`-prefixed or `/`-suffixed expression produces.
///
/// # Errors
///
/// - [`ParseError::EmptySegment`] for an empty interior segment.
/// - [`ParseError::ReservedSegment`] for `.` and `..`.
/// - [`ParseError::InvalidIndexLiteral`] for a digit segment with a leading
///   zero (index-aware mode only).
/// - [`ParseError::IndexOutOfRange`] for a digit segment above [`MAX_INDEX`].
pub fn classify(
    raw: &str,
    position: usize,
    last: usize,
    mode: SegmentMode,
) -> Result<Option<Segment>, ParseError> {
    if raw.is_empty() {
        // allow one leading and one trailing '/' at most
        if position == 0 || position == last {
            return Ok(None);
        }
        return Err(ParseError::EmptySegment { position });
    }

    if raw == "." || raw == ".." {
        return Err(ParseError::ReservedSegment {
            value: raw.to_owned(),
            position,
        });
    }

    if mode == SegmentMode::IndexAware && raw.bytes().all(|b| b.is_ascii_digit()) {
        if raw.len() > 1 && raw.starts_with('0') {
            return Err(ParseError::InvalidIndexLiteral {
                value: raw.to_owned(),
                position,
            });
        }

        let index = raw
            .parse::<i64>()
            .ok()
            .filter(|idx| *idx <= MAX_INDEX)
            .ok_or_else(|| ParseError::IndexOutOfRange {
                value: raw.to_owned(),
                position,
            })?;

        return Ok(Some(Segment::Index(index)));
    }

    Ok(Some(Segment::Field(raw.to_owned())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standalone_slash() {
        assert!(matches!(validate("/"), Err(ParseError::InvalidStandaloneSlash)));
    }

    #[test]
    fn test_invalid_character_offset() {
        assert!(matches!(
            validate(";"),
            Err(ParseError::InvalidCharacter { offset: 0 })
        ));
        assert!(matches!(
            validate("a/b c"),
            Err(ParseError::InvalidCharacter { offset: 3 })
        ));
        // offsets are in bytes, not chars
        assert!(matches!(
            validate("ab/é"),
            Err(ParseError::InvalidCharacter { offset: 3 })
        ));
    }

    #[test]
    fn test_empty_expression() {
        assert!(matches!(validate(""), Err(ParseError::EmptyExpression)));
    }

    #[test]
    fn test_segment_count_is_bounded() {
        let at_limit = vec!["a"; MAX_SEGMENTS].join("/");
        assert!(validate(&format!("/{at_limit}/")).is_ok());

        let over = vec!["a"; MAX_SEGMENTS + 1].join("/");
        assert!(matches!(
            validate(&over),
            Err(ParseError::TooManySegments { count, max: MAX_SEGMENTS }) if count == MAX_SEGMENTS + 1
        ));
    }

    #[test]
    fn test_allowed_charset() {
        assert!(validate("/Links-1/_Hash.v2/0/").is_ok());
    }

    #[test]
    fn test_split_keeps_empty_segments() {
        assert_eq!(split("/a//b/"), vec!["", "a", "", "b", ""]);
        assert_eq!(split("a"), vec!["a"]);
    }

    #[test]
    fn test_edge_empty_segments_are_skipped() {
        assert_eq!(classify("", 0, 3, SegmentMode::IndexAware).unwrap(), None);
        assert_eq!(classify("", 3, 3, SegmentMode::IndexAware).unwrap(), None);
        assert!(matches!(
            classify("", 1, 3, SegmentMode::IndexAware),
            Err(ParseError::EmptySegment { position: 1 })
        ));
    }

    #[test]
    fn test_reserved_segments() {
        for raw in [".", ".."] {
            assert!(matches!(
                classify(raw, 2, 4, SegmentMode::FieldOnly),
                Err(ParseError::ReservedSegment { position: 2, .. })
            ));
        }
        assert_eq!(
            classify("...", 0, 0, SegmentMode::FieldOnly).unwrap(),
            Some(Segment::Field("...".into()))
        );
    }

    #[test]
    fn test_index_aware_digits() {
        assert_eq!(
            classify("0", 0, 0, SegmentMode::IndexAware).unwrap(),
            Some(Segment::Index(0))
        );
        assert_eq!(
            classify("42", 0, 0, SegmentMode::IndexAware).unwrap(),
            Some(Segment::Index(42))
        );
        for raw in ["00", "01", "001"] {
            assert!(matches!(
                classify(raw, 0, 0, SegmentMode::IndexAware),
                Err(ParseError::InvalidIndexLiteral { .. })
            ));
        }
    }

    #[test]
    fn test_index_range_is_31_bit() {
        assert_eq!(
            classify("1073741823", 0, 0, SegmentMode::IndexAware).unwrap(),
            Some(Segment::Index(MAX_INDEX))
        );
        for raw in ["1073741824", "2147483648", "99999999999999999999999"] {
            assert!(matches!(
                classify(raw, 5, 5, SegmentMode::IndexAware),
                Err(ParseError::IndexOutOfRange { position: 5, .. })
            ));
        }
    }

    #[test]
    fn test_field_only_digits() {
        assert_eq!(
            classify("007", 0, 0, SegmentMode::FieldOnly).unwrap(),
            Some(Segment::Field("007".into()))
        );
        assert_eq!(
            classify("42", 0, 0, SegmentMode::FieldOnly).unwrap(),
            Some(Segment::Field("42".into()))
        );
    }

    #[test]
    fn test_mixed_segments_are_fields() {
        assert_eq!(
            classify("4a", 0, 0, SegmentMode::IndexAware).unwrap(),
            Some(Segment::Field("4a".into()))
        );
    }
}
