use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Error;
use crate::query;

/// Attribute name reserved for the children list of a node.
pub const ITEMS: &str = "items";

/// JSON key used to carry an [`Value::Object`] through serde.
const OBJECT_KEY: &str = "$object";

// ============================================================================
// Value
// ============================================================================

/// A single attribute value.
///
/// Scalars and lists are the only values that can be written to a route
/// file. [`Value::Object`] stands in for a live reference (a closure, a
/// controller instance, ...) that only exists at runtime; it is carried
/// around but never rendered.
///
/// # JSON shape
///
/// ```json
/// {
///   "title": "Users",
///   "sort": 3,
///   "hidden": false,
///   "middleware": ["web", "auth"],
///   "meta": { "icon": "users" },
///   "handler": { "$object": "Closure" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Numerically indexed list.
    List(Vec<Value>),
    /// Associative list, in insertion order.
    Map(Vec<(String, Value)>),
    /// Opaque runtime reference, tagged with its type name.
    Object(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Scalars and lists (recursively) can be written as literals.
    pub fn is_renderable(&self) -> bool {
        match self {
            Value::Object(_) => false,
            Value::List(items) => items.iter().all(Value::is_renderable),
            Value::Map(entries) => entries.iter().all(|(_, v)| v.is_renderable()),
            _ => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric view of `Int` and `Float` values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Element count of countable values (lists and maps).
    pub fn count(&self) -> Option<usize> {
        match self {
            Value::List(items) => Some(items.len()),
            Value::Map(entries) => Some(entries.len()),
            _ => None,
        }
    }

    /// Look up one path segment: a key of a map or an index of a list.
    pub fn child(&self, segment: &str) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries.iter().find(|(k, _)| k == segment).map(|(_, v)| v),
            Value::List(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    }

    /// Equality that treats `1` and `1.0` as the same number.
    pub fn loosely_equals(&self, other: &Value) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Value::Object(type_name) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(OBJECT_KEY, type_name)?;
                map.end()
            }
        }
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a scalar, a list or a map")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, b: bool) -> Result<Value, E> {
        Ok(Value::Bool(b))
    }

    fn visit_i64<E: de::Error>(self, i: i64) -> Result<Value, E> {
        Ok(Value::Int(i))
    }

    fn visit_u64<E: de::Error>(self, u: u64) -> Result<Value, E> {
        Ok(i64::try_from(u)
            .map(Value::Int)
            .unwrap_or(Value::Float(u as f64)))
    }

    fn visit_f64<E: de::Error>(self, f: f64) -> Result<Value, E> {
        Ok(Value::Float(f))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<Value, E> {
        Ok(Value::String(s.to_string()))
    }

    fn visit_string<E: de::Error>(self, s: String) -> Result<Value, E> {
        Ok(Value::String(s))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
        let mut entries: Vec<(String, Value)> = Vec::new();
        while let Some(entry) = map.next_entry::<String, Value>()? {
            entries.push(entry);
        }
        if let [(key, Value::String(type_name))] = entries.as_slice()
            && key == OBJECT_KEY
        {
            return Ok(Value::Object(type_name.clone()));
        }
        Ok(Value::Map(entries))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

// ============================================================================
// Attributes
// ============================================================================

/// Ordered attribute bag of a node.
///
/// Order is preserved from construction (or from the parsed text) so that
/// setter calls are re-emitted in the order they were authored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    entries: Vec<(String, Value)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Insert or replace an attribute. Replacing keeps the original position.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let pos = self.entries.iter().position(|(key, _)| key == name)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attributes = Attributes::new();
        for (key, value) in iter {
            attributes.set(key, value);
        }
        attributes
    }
}

impl Serialize for Attributes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct AttributesVisitor;

impl<'de> Visitor<'de> for AttributesVisitor {
    type Value = Attributes;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of attribute names to values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Attributes, A::Error> {
        let mut attributes = Attributes::new();
        while let Some((key, value)) = map.next_entry::<String, Value>()? {
            attributes.set(key, value);
        }
        Ok(attributes)
    }
}

impl<'de> Deserialize<'de> for Attributes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(AttributesVisitor)
    }
}

// ============================================================================
// EntityNode
// ============================================================================

/// One route or navigation entry, together with its subtree.
///
/// # Builder API
///
/// ```
/// use routekit::v1::EntityNode;
///
/// let users = EntityNode::new("admin.users")
///     .with_title("Users")
///     .with_url("/admin/users");
/// let admin = EntityNode::new("admin")
///     .with_title("Admin")
///     .with_child(users);
///
/// assert_eq!(admin.children.len(), 1);
/// assert_eq!(admin.children[0].url(), Some("/admin/users"));
/// ```
///
/// # JSON shape
///
/// ```json
/// {
///   "id": "admin",
///   "attributes": { "title": "Admin", "url": "/admin" },
///   "children": [ { "id": "admin.users", "attributes": { "title": "Users" } } ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityNode {
    pub id: String,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<EntityNode>,
}

macro_rules! string_attributes {
    ($($(#[$doc:meta])* $getter:ident, $builder:ident => $key:literal;)*) => {
        $(
            $(#[$doc])*
            pub fn $getter(&self) -> Option<&str> {
                self.attributes.get($key).and_then(Value::as_str)
            }

            pub fn $builder(self, value: impl Into<String>) -> Self {
                self.with($key, value.into())
            }
        )*
    };
}

macro_rules! list_attributes {
    ($($(#[$doc:meta])* $getter:ident, $builder:ident => $key:literal;)*) => {
        $(
            $(#[$doc])*
            pub fn $getter(&self) -> Vec<&str> {
                self.string_list($key)
            }

            pub fn $builder<S: Into<String>>(self, values: impl IntoIterator<Item = S>) -> Self {
                let values: Vec<Value> = values.into_iter().map(|v| Value::String(v.into())).collect();
                self.with($key, Value::List(values))
            }
        )*
    };
}

impl EntityNode {
    /// Create a node with no attributes and no children
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: Attributes::new(),
            children: Vec::new(),
        }
    }

    /// Set an attribute (builder form)
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.set(name, value);
        self
    }

    /// Append a child node
    pub fn with_child(mut self, child: EntityNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.attributes.set(name, value);
        self
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn child_ids(&self) -> Vec<&str> {
        self.children.iter().map(|c| c.id.as_str()).collect()
    }

    string_attributes! {
        /// Display title, usually the second maker argument
        title, with_title => "title";
        url, with_url => "url";
        /// HTTP verb; absent means GET
        url_method, with_url_method => "urlMethod";
        url_controller, with_url_controller => "urlController";
        icon, with_icon => "icon";
    }

    list_attributes! {
        middleware, with_middleware => "middleware";
        roles, with_roles => "roles";
        permissions, with_permissions => "permissions";
    }

    fn string_list(&self, key: &str) -> Vec<&str> {
        self.attributes
            .get(key)
            .and_then(Value::as_list)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

// ============================================================================
// Forest
// ============================================================================

/// The ordered set of root nodes persisted in one route file.
///
/// Serializes as a plain JSON array of [`EntityNode`]s.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Forest {
    pub roots: Vec<EntityNode>,
}

impl Forest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_roots(roots: Vec<EntityNode>) -> Self {
        Self { roots }
    }

    /// Parse a forest from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Total number of nodes, all depths included
    pub fn len(&self) -> usize {
        query::walk(&self.roots).len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Check that every id is unique across the whole forest.
    pub fn validate(&self) -> crate::error::Result<()> {
        match query::duplicate_ids(&self.roots).into_iter().next() {
            Some(id) => Err(Error::DuplicateId(id)),
            None => Ok(()),
        }
    }

    pub fn find(&self, id: &str) -> Option<&EntityNode> {
        query::find(&self.roots, id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut EntityNode> {
        find_node_mut(&mut self.roots, id)
    }

    pub fn parent_of(&self, id: &str) -> Option<&EntityNode> {
        query::parent_of(&self.roots, id)
    }

    pub fn depth_of(&self, id: &str) -> Option<usize> {
        query::depth_of(&self.roots, id)
    }

    /// Pre-order traversal with depth (roots are depth 0).
    pub fn walk(&self) -> Vec<(usize, &EntityNode)> {
        query::walk(&self.roots)
    }

    /// Every node in pre-order, depth dropped.
    pub fn flatten(&self) -> Vec<&EntityNode> {
        self.walk().into_iter().map(|(_, node)| node).collect()
    }

    pub fn all_permissions(&self) -> Vec<String> {
        query::all_permissions(&self.roots)
    }

    pub fn all_roles(&self) -> Vec<String> {
        query::all_roles(&self.roots)
    }

    /// Attach `node` under `parent`, or as a new root when `parent` is `None`.
    pub fn insert(&mut self, parent: Option<&str>, node: EntityNode) -> crate::error::Result<()> {
        for (_, existing) in query::walk(std::slice::from_ref(&node)) {
            if self.find(&existing.id).is_some() {
                return Err(Error::DuplicateId(existing.id.clone()));
            }
        }
        match parent {
            None => self.roots.push(node),
            Some(parent_id) => self
                .find_mut(parent_id)
                .ok_or_else(|| Error::UnknownEntity(parent_id.to_string()))?
                .children
                .push(node),
        }
        Ok(())
    }

    /// Detach a node and its subtree.
    pub fn remove(&mut self, id: &str) -> Option<EntityNode> {
        remove_node(&mut self.roots, id)
    }
}

fn find_node_mut<'a>(nodes: &'a mut [EntityNode], id: &str) -> Option<&'a mut EntityNode> {
    for node in nodes.iter_mut() {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find_node_mut(&mut node.children, id) {
            return Some(found);
        }
    }
    None
}

fn remove_node(nodes: &mut Vec<EntityNode>, id: &str) -> Option<EntityNode> {
    if let Some(pos) = nodes.iter().position(|n| n.id == id) {
        return Some(nodes.remove(pos));
    }
    nodes
        .iter_mut()
        .find_map(|n| remove_node(&mut n.children, id))
}
