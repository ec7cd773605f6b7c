//! Loading selection specifications from a JSON envelope.
//!
//! The envelope is a single-entry map, `{"selector": <selector document>}`,
//! which keeps the wire format self-describing while leaving room for sibling
//! keys later on. Any selector document, including the shapes the path
//! grammar cannot express, can be loaded this way.

use log::debug;

use crate::error::ParseError;
use crate::node::Node;
use crate::spec::SelectionSpec;

/// The only key an envelope may hold.
pub const ENVELOPE_KEY: &str = "selector";

/// Decodes an envelope and compiles the selector document inside it.
///
/// # Errors
///
/// - [`ParseError::Decode`] if `json` is not well-formed JSON.
/// - [`ParseError::Envelope`] if the document is not a map holding exactly
///   one `"selector"` entry.
/// - [`ParseError::Compile`] if the selector document is rejected.
pub fn from_json(json: &str) -> Result<SelectionSpec, ParseError> {
    let document = Node::from_json(json)?;
    let kind = document.kind();

    let Node::Map(mut entries) = document else {
        return Err(ParseError::envelope(format!(
            "expected a map, found {kind}"
        )));
    };

    if entries.len() != 1 {
        return Err(ParseError::envelope(format!(
            "expected exactly one entry, found {}",
            entries.len()
        )));
    }

    let Some(selector) = entries.remove(ENVELOPE_KEY) else {
        let key = entries.keys().next().cloned().unwrap_or_default();
        return Err(ParseError::envelope(format!(
            "expected the key '{ENVELOPE_KEY}', found '{key}'"
        )));
    };

    debug!("loading selector envelope ({} bytes)", json.len());
    SelectionSpec::from_node(selector)
}

/// Wraps a specification's selector document in an envelope and encodes it.
#[must_use]
pub fn to_json(spec: &SelectionSpec) -> String {
    Node::single(ENVELOPE_KEY, spec.node().clone()).to_json()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompileError;
    use crate::selector::Selector;
    use crate::spec::{build, BuildOptions};

    #[test]
    fn test_load_valid_envelope() {
        let spec = from_json(r#"{"selector":{"a":{">":{".":{}}}}}"#).unwrap();
        assert_eq!(
            spec.selector(),
            &Selector::ExploreAll {
                next: Box::new(Selector::Matcher)
            }
        );
        assert!(spec.selection().is_none());
    }

    #[test]
    fn test_node_reserializes_canonically() {
        let inner = r#"{"i":{"i":2,">":{"|":[{".":{}},{"f":{"f>":{"b":{".":{}},"a":{".":{}}}}}]}}}"#;
        let spec = from_json(&format!(r#"{{"selector":{inner}}}"#)).unwrap();
        let expected = Node::from_json(inner).unwrap();
        assert_eq!(spec.node(), &expected);
        assert_eq!(
            spec.to_json(),
            r#"{"i":{">":{"|":[{".":{}},{"f":{"f>":{"a":{".":{}},"b":{".":{}}}}}]},"i":2}}"#
        );
    }

    #[test]
    fn test_invalid_selector_is_a_compile_error() {
        let err = from_json(r#"{"selector":{"a":1}}"#).unwrap_err();
        assert!(matches!(
            err,
            ParseError::Compile(CompileError::BodyKind { .. })
        ));
    }

    #[test]
    fn test_malformed_json_is_a_decode_error() {
        assert!(matches!(
            from_json(r#"{"selector":"#),
            Err(ParseError::Decode(_))
        ));
    }

    #[test]
    fn test_repeated_keys_are_a_decode_error() {
        for json in [
            r#"{"selector":{"a":1},"selector":{".":{}}}"#,
            r#"{"selector":{"f":{"f>":{"x":{".":{}},"x":{"a":{">":{".":{}}}}}}}}"#,
        ] {
            assert!(
                matches!(from_json(json), Err(ParseError::Decode(_))),
                "expected decode error for {json}"
            );
        }
    }

    #[test]
    fn test_deep_specs_reload() {
        let expr = vec!["a"; 50].join("/");
        for opts in [
            BuildOptions::index_aware(),
            BuildOptions::index_aware().with_match_intermediate(true),
        ] {
            let built = build(&expr, &opts, None).unwrap();
            let loaded = from_json(&to_json(&built)).unwrap();
            assert_eq!(loaded.node(), built.node());
        }
    }

    #[test]
    fn test_envelope_shape_is_enforced() {
        for json in [
            r#"[{".":{}}]"#,
            r"{}",
            r#"{"selector":{".":{}},"extra":1}"#,
            r#"{"sel":{".":{}}}"#,
        ] {
            assert!(
                matches!(from_json(json), Err(ParseError::Envelope { .. })),
                "expected envelope error for {json}"
            );
        }
    }

    #[test]
    fn test_wrong_key_is_reported() {
        let err = from_json(r#"{"sel":{".":{}}}"#).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid selector envelope: expected the key 'selector', found 'sel'"
        );
    }

    #[test]
    fn test_path_specs_round_trip_through_envelope() {
        let built = build("a/3/b", &BuildOptions::index_aware(), None).unwrap();
        let loaded = from_json(&to_json(&built)).unwrap();
        assert_eq!(loaded.node(), built.node());
        assert_eq!(loaded.selector(), built.selector());
    }
}
