#![allow(missing_docs)]

use selpath::{build, from_json, BuildOptions, Node, ParseError, Segment, Selector};

/// Visits every node the selector matches, depth first.
fn matches<'a>(node: &'a Node, selector: &Selector, found: &mut Vec<&'a Node>) {
    if selector.decide() {
        found.push(node);
    }
    let children: Vec<(Segment, &Node)> = match node {
        Node::Map(entries) => entries
            .iter()
            .map(|(k, v)| (Segment::Field(k.clone()), v))
            .collect(),
        Node::List(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (Segment::Index(i64::try_from(i).unwrap()), v))
            .collect(),
        _ => Vec::new(),
    };
    for (segment, child) in children {
        if let Some(next) = selector.explore(node, &segment) {
            matches(child, &next, found);
        }
    }
}

fn fixture() -> Node {
    Node::from_json(
        r#"{"Links": [
            {"Name": "", "Hash": {"Links": [
                {"Name": "a", "Hash": "UnwantedNode"},
                {"Name": "b", "Hash": "UnwantedNode"}
            ]}},
            {"Name": "", "Hash": {"Links": [
                {"Name": "a", "Hash": "UnwantedNode"},
                {"Name": "b", "Hash": "WantedNode"}
            ]}}
        ]}"#,
    )
    .unwrap()
}

#[test]
fn test_path_selects_single_target() {
    let data = fixture();
    let spec = build("Links/1/Hash/Links/1/Hash", &BuildOptions::index_aware(), None).unwrap();

    let mut found = Vec::new();
    matches(&data, spec.selector(), &mut found);
    assert_eq!(found, vec![&Node::String("WantedNode".into())]);
}

#[test]
fn test_field_only_path_resolves_against_lists() {
    let data = fixture();
    let spec = build("Links/1/Hash/Links/1/Hash", &BuildOptions::field_only(), None).unwrap();

    assert_eq!(spec.selector().kind(), "ExploreFields");

    // digit keys resolve against list positions when the data is walked
    let mut found = Vec::new();
    matches(&data, spec.selector(), &mut found);
    assert_eq!(found, vec![&Node::String("WantedNode".into())]);
}

#[test]
fn test_match_path_reports_every_level() {
    let data = fixture();
    let opts = BuildOptions::index_aware().with_match_intermediate(true);
    let spec = build("/Links/1/Hash/", &opts, None).unwrap();

    let mut found = Vec::new();
    matches(&data, spec.selector(), &mut found);
    assert_eq!(found.len(), 4);
    assert_eq!(found[0], &data);
    assert_eq!(found[3].kind(), "map");
}

#[test]
fn test_envelope_expresses_recursion() {
    let data = fixture();
    let spec = from_json(
        r#"{"selector": {"R": {"l": {"none": {}}, ":>": {"|": [
            {".": {}},
            {"a": {">": {"@": {}}}}
        ]}}}}"#,
    )
    .unwrap();

    let mut found = Vec::new();
    matches(&data, spec.selector(), &mut found);
    let wanted = found
        .iter()
        .filter(|n| **n == &Node::String("WantedNode".into()))
        .count();
    assert_eq!(wanted, 1);
    assert!(found.len() > 10);
}

#[test]
fn test_errors_are_values() {
    for (expr, check) in [
        ("/", "a standalone '/' is not a valid path"),
        (";", "path string contains invalid character at offset 0"),
        ("a/./b", "unsupported path segment '.' at position 1"),
        ("a/0042", "invalid segment '0042' at position 1"),
    ] {
        let err: ParseError = build(expr, &BuildOptions::index_aware(), None).unwrap_err();
        assert_eq!(err.to_string(), check);
    }
}
