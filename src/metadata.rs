// Copyright 2025 Cowboy AI, LLC.

//! Metadata attached to exports, imports and parts
//!
//! Metadata is an ordered, immutable map from string keys to
//! [`MetadataValue`]s. Cloning a [`Metadata`] shares the underlying map,
//! and an empty map never allocates.
//!
//! Two keys form the contract between export producers and import
//! constraints and must keep their exact names:
//!
//! - [`EXPORT_TYPE_IDENTITY_METADATA_KEY`]
//! - [`CREATION_POLICY_METADATA_KEY`]

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::policy::CreationPolicy;

/// Metadata key holding the type identity of an exported value
pub const EXPORT_TYPE_IDENTITY_METADATA_KEY: &str = "ExportTypeIdentity";

/// Metadata key holding the creation policy declared by an exporting part
pub const CREATION_POLICY_METADATA_KEY: &str = "System.ComponentModel.Composition.CreationPolicy";

/// A typed metadata value
///
/// Values are opaque to the matching core except for their kind, which is
/// checked against a [`MetadataType`] when an import requires a key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// Absent value
    Null,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Floating point number
    Float(f64),
    /// String
    String(String),
    /// Creation policy
    CreationPolicy(CreationPolicy),
    /// Ordered list of values
    List(Vec<MetadataValue>),
    /// Nested map
    Map(IndexMap<String, MetadataValue>),
}

impl MetadataValue {
    /// Whether this is the null value
    pub fn is_null(&self) -> bool {
        matches!(self, MetadataValue::Null)
    }

    /// The string payload, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Read the value as a creation policy
    ///
    /// Accepts the policy variant and its textual form.
    pub fn as_creation_policy(&self) -> Option<CreationPolicy> {
        match self {
            MetadataValue::CreationPolicy(policy) => Some(*policy),
            MetadataValue::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Name of the runtime kind of this value
    pub fn kind_name(&self) -> &'static str {
        match self {
            MetadataValue::Null => "Null",
            MetadataValue::Bool(_) => "Bool",
            MetadataValue::Int(_) => "Int",
            MetadataValue::Float(_) => "Float",
            MetadataValue::String(_) => "String",
            MetadataValue::CreationPolicy(_) => "CreationPolicy",
            MetadataValue::List(_) => "List",
            MetadataValue::Map(_) => "Map",
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Null => write!(f, "null"),
            MetadataValue::Bool(b) => write!(f, "{b}"),
            MetadataValue::Int(i) => write!(f, "{i}"),
            MetadataValue::Float(x) => write!(f, "{x}"),
            MetadataValue::String(s) => write!(f, "{s:?}"),
            MetadataValue::CreationPolicy(p) => write!(f, "{p}"),
            MetadataValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            MetadataValue::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k:?}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Bool(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Int(value)
    }
}

impl From<i32> for MetadataValue {
    fn from(value: i32) -> Self {
        MetadataValue::Int(i64::from(value))
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        MetadataValue::Float(value)
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::String(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::String(value)
    }
}

impl From<CreationPolicy> for MetadataValue {
    fn from(value: CreationPolicy) -> Self {
        MetadataValue::CreationPolicy(value)
    }
}

impl From<Vec<MetadataValue>> for MetadataValue {
    fn from(value: Vec<MetadataValue>) -> Self {
        MetadataValue::List(value)
    }
}

impl<T: Into<MetadataValue>> From<Option<T>> for MetadataValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(MetadataValue::Null, Into::into)
    }
}

/// The type an import requires for a metadata value
///
/// Compatibility is by kind: a value is an instance of a type when their
/// kinds are equal. [`MetadataType::Any`] accepts every value. Null is
/// accepted only by nullable types: `Any`, `String`, `List`, `Map` and
/// `Nullable(_)`. There is no numeric widening, so an `Int` value does not
/// satisfy `Float`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetadataType {
    /// Any value, including null
    Any,
    /// Boolean
    Bool,
    /// Signed integer
    Int,
    /// Floating point number
    Float,
    /// String (nullable)
    String,
    /// Creation policy
    CreationPolicy,
    /// List (nullable)
    List,
    /// Map (nullable)
    Map,
    /// The inner type or null
    Nullable(Box<MetadataType>),
}

impl MetadataType {
    /// Wrap a type so that it also accepts null
    pub fn nullable(inner: MetadataType) -> Self {
        MetadataType::Nullable(Box::new(inner))
    }

    /// Whether null is a legal value of this type
    pub fn is_nullable(&self) -> bool {
        matches!(
            self,
            MetadataType::Any
                | MetadataType::String
                | MetadataType::List
                | MetadataType::Map
                | MetadataType::Nullable(_)
        )
    }

    /// Whether `value` is an instance of this type
    pub fn is_instance(&self, value: &MetadataValue) -> bool {
        if value.is_null() {
            return self.is_nullable();
        }
        match (self, value) {
            (MetadataType::Any, _) => true,
            (MetadataType::Nullable(inner), v) => inner.is_instance(v),
            (MetadataType::Bool, MetadataValue::Bool(_))
            | (MetadataType::Int, MetadataValue::Int(_))
            | (MetadataType::Float, MetadataValue::Float(_))
            | (MetadataType::String, MetadataValue::String(_))
            | (MetadataType::CreationPolicy, MetadataValue::CreationPolicy(_))
            | (MetadataType::List, MetadataValue::List(_))
            | (MetadataType::Map, MetadataValue::Map(_)) => true,
            _ => false,
        }
    }

    /// Whether every value of `other` is also a value of `self`
    pub fn is_assignable_from(&self, other: &MetadataType) -> bool {
        match (self, other) {
            (MetadataType::Any, _) => true,
            (MetadataType::Nullable(a), MetadataType::Nullable(b)) => a.is_assignable_from(b),
            (MetadataType::Nullable(a), b) => a.is_assignable_from(b),
            (a, MetadataType::Nullable(b)) if a.is_nullable() => a.is_assignable_from(b),
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for MetadataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataType::Nullable(inner) => write!(f, "{inner}?"),
            other => write!(f, "{other:?}"),
        }
    }
}

static EMPTY_METADATA: Metadata = Metadata::EMPTY;

/// Immutable ordered metadata map
///
/// Clones share storage. The empty map is represented without an
/// allocation, so every default `Metadata` is the same shared empty value.
#[derive(Clone, Default, PartialEq)]
pub struct Metadata {
    entries: Option<Arc<IndexMap<String, MetadataValue>>>,
}

impl Metadata {
    /// The shared empty metadata
    pub const EMPTY: Metadata = Metadata { entries: None };

    /// Empty metadata
    pub fn empty() -> Self {
        Self::EMPTY
    }

    /// A `'static` reference to the shared empty metadata
    pub fn empty_ref() -> &'static Metadata {
        &EMPTY_METADATA
    }

    /// Take ownership of a map; empty maps collapse to [`Metadata::EMPTY`]
    pub fn from_map(map: IndexMap<String, MetadataValue>) -> Self {
        if map.is_empty() {
            Self::EMPTY
        } else {
            Self {
                entries: Some(Arc::new(map)),
            }
        }
    }

    /// Return a copy with `key` set to `value`
    pub fn with(&self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        let mut map = self.to_map();
        map.insert(key.into(), value.into());
        Self::from_map(map)
    }

    /// Copy the entries into an owned map
    pub fn to_map(&self) -> IndexMap<String, MetadataValue> {
        self.entries
            .as_deref()
            .cloned()
            .unwrap_or_default()
    }

    /// Look up a value
    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.entries.as_deref().and_then(|m| m.get(key))
    }

    /// Whether `key` is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetadataValue)> {
        self.entries
            .as_deref()
            .into_iter()
            .flat_map(|m| m.iter().map(|(k, v)| (k.as_str(), v)))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.as_deref().map_or(0, IndexMap::len)
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether two handles share the same storage
    pub fn ptr_eq(&self, other: &Metadata) -> bool {
        match (&self.entries, &other.entries) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// The export type identity, if declared as a string
    pub fn type_identity(&self) -> Option<&str> {
        self.get(EXPORT_TYPE_IDENTITY_METADATA_KEY)
            .and_then(MetadataValue::as_str)
    }
}

impl fmt::Debug for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> FromIterator<(K, V)> for Metadata
where
    K: Into<String>,
    V: Into<MetadataValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_map(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<IndexMap<String, MetadataValue>> for Metadata {
    fn from(map: IndexMap<String, MetadataValue>) -> Self {
        Self::from_map(map)
    }
}

impl Serialize for Metadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl<'de> Deserialize<'de> for Metadata {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        IndexMap::<String, MetadataValue>::deserialize(deserializer).map(Self::from_map)
    }
}
