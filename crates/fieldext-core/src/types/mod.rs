//! # Core Type Definitions
//!
//! This module contains the shared types for computed-field extensions:
//! - Record and compute function representation (`Record`, `ComputeFn`)
//! - Computed fields and their per-model map (`ComputedField`, `ComputedFieldsMap`)
//! - Query descriptors (`FieldMask`, `Selection`, `Omission`)
//! - Error types (`FieldExtError`)
//!
//! ## Determinism Guarantees
//!
//! Computed fields and their `needs` keep declaration order (`IndexMap`,
//! `Vec`): a redeclared field keeps the slot of its first declaration.
//! Resolution results depend on that order when `needs` declarations are
//! cyclic. Records and field masks are `BTreeMap`s.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use thiserror::Error;

// =============================================================================
// RECORDS & COMPUTE FUNCTIONS
// =============================================================================

/// A single row as seen by compute functions: field name to value.
///
/// Holds base fields fetched from the engine plus any computed fields
/// evaluated before the current one.
pub type Record = BTreeMap<String, Value>;

/// A compute function attached to a computed field.
///
/// Compute functions must be pure. They are shared between snapshots, so
/// they are reference-counted and `Send + Sync`.
pub type ComputeFn = Arc<dyn Fn(&Record) -> Value + Send + Sync>;

/// Wrap a closure as a [`ComputeFn`].
pub fn compute_fn<F>(f: F) -> ComputeFn
where
    F: Fn(&Record) -> Value + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Apply `f` to every value of a map, keeping the keys and their order.
pub fn map_values<K, V, U, F>(map: &IndexMap<K, V>, mut f: F) -> IndexMap<K, U>
where
    K: Hash + Eq + Clone,
    F: FnMut(&K, &V) -> U,
{
    map.iter().map(|(k, v)| (k.clone(), f(k, v))).collect()
}

// =============================================================================
// COMPUTED FIELD
// =============================================================================

/// A derived field contributed by an extension.
#[derive(Clone)]
pub struct ComputedField {
    /// Field name, unique within its model's map.
    pub name: String,
    /// Fields this one depends on.
    ///
    /// Before resolution this is a copy of `declared_needs`. After
    /// resolution it holds the transitive closure down to base fields.
    pub needs: Vec<String>,
    /// Needs exactly as the winning extension declared them.
    pub declared_needs: Vec<String>,
    /// The (possibly composed) compute function.
    pub compute: ComputeFn,
    /// Name of the extension that contributed the winning declaration.
    pub origin: Option<String>,
}

impl ComputedField {
    /// Create an unresolved computed field.
    pub fn new(name: impl Into<String>, needs: Vec<String>, compute: ComputeFn) -> Self {
        Self {
            name: name.into(),
            needs: needs.clone(),
            declared_needs: needs,
            compute,
            origin: None,
        }
    }

    /// Attach the contributing extension's name.
    #[must_use]
    pub fn with_origin(mut self, origin: Option<String>) -> Self {
        self.origin = origin;
        self
    }

    /// Evaluate the compute function against a record.
    pub fn evaluate(&self, record: &Record) -> Value {
        (self.compute)(record)
    }
}

impl fmt::Debug for ComputedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputedField")
            .field("name", &self.name)
            .field("needs", &self.needs)
            .field("declared_needs", &self.declared_needs)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// COMPUTED FIELDS MAP
// =============================================================================

/// All computed fields that apply to one model.
///
/// Published maps are shared as `Arc<ComputedFieldsMap>` and never mutated;
/// a new registration builds a new map. Fields iterate in the order they
/// were first declared.
#[derive(Debug, Clone, Default)]
pub struct ComputedFieldsMap {
    fields: IndexMap<String, ComputedField>,
}

impl ComputedFieldsMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field under its own name, replacing any previous entry in place.
    pub fn insert(&mut self, field: ComputedField) {
        self.fields.insert(field.name.clone(), field);
    }

    /// Look up a field by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ComputedField> {
        self.fields.get(name)
    }

    /// Check whether `name` is a computed field of this map.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Iterate fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &ComputedField> {
        self.fields.values()
    }

    /// Iterate field names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn as_fields(&self) -> &IndexMap<String, ComputedField> {
        &self.fields
    }

    pub(crate) fn from_fields(fields: IndexMap<String, ComputedField>) -> Self {
        Self { fields }
    }
}

impl FromIterator<ComputedField> for ComputedFieldsMap {
    fn from_iter<I: IntoIterator<Item = ComputedField>>(iter: I) -> Self {
        let mut map = Self::new();
        for field in iter {
            map.insert(field);
        }
        map
    }
}

// =============================================================================
// SELECTION / OMISSION
// =============================================================================

/// Truthiness of a selection or omission flag.
///
/// `false`, `null`, `0` and `""` are falsy. Everything else, including
/// nested relation selections, is truthy.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// A per-query field mask: field name to flag.
///
/// Used both as a selection (truthy = include) and as an omission
/// (truthy = exclude).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMask(BTreeMap<String, Value>);

/// Fields a caller wants returned.
pub type Selection = FieldMask;

/// Fields a caller wants excluded.
pub type Omission = FieldMask;

impl FieldMask {
    /// Create an empty mask.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mask with every given name set to `true`.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            names
                .into_iter()
                .map(|name| (name.into(), Value::Bool(true)))
                .collect(),
        )
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, flag: impl Into<Value>) -> Self {
        self.0.insert(name.into(), flag.into());
        self
    }

    /// Set a flag, returning the previous one.
    pub fn insert(&mut self, name: impl Into<String>, flag: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), flag.into())
    }

    /// Remove a flag, returning it.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    #[must_use]
    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Check whether `name` is present with a truthy flag.
    #[must_use]
    pub fn is_set(&self, name: &str) -> bool {
        self.0.get(name).is_some_and(is_truthy)
    }

    /// Names whose flag is truthy, in order.
    pub fn truthy_names(&self) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .filter(|(_, flag)| is_truthy(flag))
            .map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Value)> for FieldMask {
    fn from_iter<I: IntoIterator<Item = (S, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors raised at the fallible edges of fieldext.
///
/// Merging, resolution and query planning never fail; these variants cover
/// loading declarations and records from the outside world.
#[derive(Debug, Error)]
pub enum FieldExtError {
    /// The extension manifest is structurally invalid.
    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    /// A compute template could not be parsed.
    #[error("Invalid template for field `{field}`: {reason}")]
    InvalidTemplate { field: String, reason: String },

    /// A record is not a JSON object.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// The requested model is not declared in the schema.
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================
