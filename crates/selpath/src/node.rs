//! Generic tree data model.
//!
//! A [`Node`] is the serialized form of both selector documents and the data
//! they are evaluated against: maps, lists and scalars. Maps keep their keys
//! in sorted order so that encoding a node is canonical.
//!
//! Decoding is stricter than plain JSON: a map may not repeat a key, and
//! lists and maps may nest at most [`MAX_DEPTH`] levels deep.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, DeserializeSeed, MapAccess, SeqAccess, Visitor};
use serde_json::{Map, Number, Value};

/// The deepest nesting of lists and maps [`Node::from_json`] accepts.
///
/// Comfortably above the deepest document the path builder emits for
/// [`MAX_SEGMENTS`](crate::path::MAX_SEGMENTS) segments, envelope included.
pub const MAX_DEPTH: usize = 768;

/// A single value in a tree-shaped document.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// The null scalar.
    Null,
    /// A boolean scalar.
    Bool(bool),
    /// A signed integer scalar.
    Int(i64),
    /// A floating point scalar.
    Float(f64),
    /// A UTF-8 string scalar.
    String(String),
    /// An ordered sequence of nodes.
    List(Vec<Node>),
    /// A string-keyed map of nodes.
    Map(BTreeMap<String, Node>),
}

impl Node {
    /// Builds a map-kind node from key/value pairs.
    ///
    /// Later duplicates of a key replace earlier ones.
    #[must_use]
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Node)>,
    {
        Node::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Builds a map-kind node holding exactly one entry.
    #[must_use]
    pub fn single(key: impl Into<String>, value: Node) -> Self {
        Node::map([(key.into(), value)])
    }

    /// Builds a list-kind node.
    #[must_use]
    pub fn list<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Node>,
    {
        Node::List(items.into_iter().collect())
    }

    /// Builds an empty map, the body of selectors that carry no parameters.
    #[must_use]
    pub fn empty_map() -> Self {
        Node::Map(BTreeMap::new())
    }

    /// Returns the name of this node's kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Null => "null",
            Node::Bool(_) => "bool",
            Node::Int(_) => "int",
            Node::Float(_) => "float",
            Node::String(_) => "string",
            Node::List(_) => "list",
            Node::Map(_) => "map",
        }
    }

    /// Returns the entries if this is a map.
    #[must_use]
    pub fn as_map(&self) -> Option<&BTreeMap<String, Node>> {
        match self {
            Node::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the items if this is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Node]> {
        match self {
            Node::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the value if this is an integer.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Node::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Number of children: entries of a map, items of a list, zero otherwise.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Node::List(items) => items.len(),
            Node::Map(m) => m.len(),
            _ => 0,
        }
    }

    /// Returns `true` if the node has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks up a map entry by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_map().and_then(|m| m.get(key))
    }

    /// Looks up a list item by position.
    #[must_use]
    pub fn item(&self, idx: usize) -> Option<&Node> {
        self.as_list().and_then(|items| items.get(idx))
    }

    /// Decodes JSON text into a node.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`serde_json::Error`] if the text is not a
    /// well-formed JSON document, repeats a key within one map, or nests
    /// deeper than [`MAX_DEPTH`].
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let mut de = serde_json::Deserializer::from_str(text);
        // nesting is bounded by NodeSeed instead
        de.disable_recursion_limit();
        let node = NodeSeed { depth: 0 }.deserialize(&mut de)?;
        de.end()?;
        Ok(node)
    }

    /// Encodes the node as compact JSON with map keys in canonical order.
    #[must_use]
    pub fn to_json(&self) -> String {
        Value::from(self).to_string()
    }
}

/// Decodes one node whose enclosing containers number `depth`.
#[derive(Clone, Copy)]
struct NodeSeed {
    depth: usize,
}

impl NodeSeed {
    fn descend<E: de::Error>(self) -> Result<Self, E> {
        if self.depth >= MAX_DEPTH {
            return Err(E::custom(format_args!(
                "document nests deeper than {MAX_DEPTH} levels"
            )));
        }
        Ok(Self {
            depth: self.depth + 1,
        })
    }
}

impl<'de> DeserializeSeed<'de> for NodeSeed {
    type Value = Node;

    fn deserialize<D>(self, deserializer: D) -> Result<Node, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for NodeSeed {
    type Value = Node;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a JSON value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Node, E> {
        Ok(Node::Null)
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<Node, E> {
        Ok(Node::Bool(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Node, E> {
        Ok(Node::Int(value))
    }

    #[allow(clippy::cast_precision_loss)]
    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Node, E> {
        // beyond i64::MAX only a float can hold it
        Ok(i64::try_from(value).map_or(Node::Float(value as f64), Node::Int))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Node, E> {
        Ok(Node::Float(value))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Node, E> {
        Ok(Node::String(value.to_owned()))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<Node, E> {
        Ok(Node::String(value))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Node, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let child = self.descend()?;
        let mut items = Vec::new();
        while let Some(item) = seq.next_element_seed(child)? {
            items.push(item);
        }
        Ok(Node::List(items))
    }

    fn visit_map<A>(self, mut map: A) -> Result<Node, A::Error>
    where
        A: MapAccess<'de>,
    {
        let child = self.descend()?;
        let mut entries = BTreeMap::new();
        while let Some(key) = map.next_key::<String>()? {
            match entries.entry(key) {
                Entry::Occupied(entry) => {
                    return Err(de::Error::custom(format_args!(
                        "duplicate map key '{}'",
                        entry.key()
                    )));
                }
                Entry::Vacant(entry) => {
                    entry.insert(map.next_value_seed(child)?);
                }
            }
        }
        Ok(Node::Map(entries))
    }
}

impl From<&Node> for Value {
    fn from(node: &Node) -> Self {
        match node {
            Node::Null => Value::Null,
            Node::Bool(b) => Value::Bool(*b),
            Node::Int(i) => Value::Number((*i).into()),
            Node::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            Node::String(s) => Value::String(s.clone()),
            Node::List(items) => Value::Array(items.iter().map(Value::from).collect()),
            Node::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from(v)))
                    .collect::<Map<String, Value>>(),
            ),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}
