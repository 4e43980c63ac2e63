//! # Extension Module
//!
//! The contribution shape an extension hands to the registry builder.
//!
//! - An extension carries `result` declarations keyed by model key
//! - The reserved key `$allModels` applies to every model
//! - A field declaration's `needs` is a name -> flag map; only `true`
//!   entries count, in the order they were declared

use crate::types::ComputeFn;
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::fmt;

/// Reserved model key whose declarations apply to every model.
pub const ALL_MODELS_KEY: &str = "$allModels";

/// Convert a schema model name into the client-facing model key.
///
/// Only the first character is lower-cased: `UserProfile` -> `userProfile`.
#[must_use]
pub fn model_key(model_name: &str) -> String {
    let mut chars = model_name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

// =============================================================================
// FIELD DECLARATION
// =============================================================================

/// One computed field as declared by an extension, before merging.
#[derive(Clone)]
pub struct FieldDeclaration {
    /// Dependency name -> flag. Only `true` entries become needs.
    pub needs: IndexMap<String, bool>,
    /// The compute function as written by the extension author.
    pub compute: ComputeFn,
}

impl FieldDeclaration {
    /// Declare a field that needs every name in `needs`.
    pub fn new<I, S>(needs: I, compute: ComputeFn) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            needs: needs.into_iter().map(|n| (n.into(), true)).collect(),
            compute,
        }
    }

    /// Names whose flag is `true`, in order.
    #[must_use]
    pub fn needed_names(&self) -> Vec<String> {
        self.needs
            .iter()
            .filter(|(_, wanted)| **wanted)
            .map(|(name, _)| name.clone())
            .collect()
    }
}

impl fmt::Debug for FieldDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDeclaration")
            .field("needs", &self.needs)
            .finish_non_exhaustive()
    }
}

/// All field declarations an extension makes for one model key, in declaration order.
pub type ModelContribution = IndexMap<String, FieldDeclaration>;

// =============================================================================
// EXTENSION
// =============================================================================

/// A registered bundle of model-scoped computed-field declarations.
#[derive(Debug, Clone, Default)]
pub struct Extension {
    /// Optional extension name, for diagnostics.
    pub name: Option<String>,
    /// Model key (or `$allModels`) -> declarations.
    pub result: BTreeMap<String, ModelContribution>,
}

impl Extension {
    /// Create an empty extension.
    #[must_use]
    pub fn new(name: Option<String>) -> Self {
        Self {
            name,
            result: BTreeMap::new(),
        }
    }

    /// Builder: declare `field` on `model_key` (use [`ALL_MODELS_KEY`] for all models).
    #[must_use]
    pub fn with_field(
        mut self,
        model_key: impl Into<String>,
        field: impl Into<String>,
        declaration: FieldDeclaration,
    ) -> Self {
        self.result
            .entry(model_key.into())
            .or_default()
            .insert(field.into(), declaration);
        self
    }

    /// The `$allModels` contribution, if any.
    #[must_use]
    pub fn all_models(&self) -> Option<&ModelContribution> {
        self.result.get(ALL_MODELS_KEY)
    }

    /// The contribution for one schema model, looked up by its model key.
    #[must_use]
    pub fn for_model(&self, model_name: &str) -> Option<&ModelContribution> {
        self.result.get(&model_key(model_name))
    }

    /// Whether this extension declares anything that applies to `model_name`.
    #[must_use]
    pub fn touches(&self, model_name: &str) -> bool {
        self.all_models().is_some() || self.for_model(model_name).is_some()
    }
}

// =============================================================================
// TESTS
// =============================================================================
