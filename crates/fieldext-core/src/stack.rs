//! # Stack Module
//!
//! A persistent stack of registered extensions over a fixed set of schema
//! models.
//!
//! - `extend` never mutates: it returns a new stack and leaves the old one
//!   valid for queries still holding it
//! - each model owns one resolved `Arc<ComputedFieldsMap>` snapshot
//! - models an extension does not touch keep sharing their old snapshot

use crate::apply::apply_result_extensions;
use crate::extension::{Extension, model_key};
use crate::omission::reduce_omission;
use crate::registry::computed_fields;
use crate::selection::expand_selection;
use crate::types::{ComputedFieldsMap, Omission, Record, Selection};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Layered extension state for one client.
#[derive(Debug, Clone, Default)]
pub struct ExtensionStack {
    /// Schema model names, in declaration order.
    models: Vec<String>,
    /// Registered extensions, oldest first.
    extensions: Vec<Arc<Extension>>,
    /// Schema model name -> resolved computed fields.
    computed: BTreeMap<String, Arc<ComputedFieldsMap>>,
}

impl ExtensionStack {
    /// Create a stack with no extensions for the given schema models.
    pub fn new<I, S>(models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            models: models.into_iter().map(Into::into).collect(),
            extensions: Vec::new(),
            computed: BTreeMap::new(),
        }
    }

    /// Register an extension, returning the new stack.
    #[must_use]
    pub fn extend(&self, extension: Extension) -> Self {
        let mut computed = BTreeMap::new();
        for model in &self.models {
            let previous = self.computed.get(model);
            if let Some(snapshot) = computed_fields(previous, &extension, model) {
                computed.insert(model.clone(), snapshot);
            }
        }

        let mut extensions = self.extensions.clone();
        extensions.push(Arc::new(extension));

        Self {
            models: self.models.clone(),
            extensions,
            computed,
        }
    }

    /// Schema model names.
    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(String::as_str)
    }

    /// Number of registered extensions.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.extensions.len()
    }

    /// Names of registered extensions in registration order; unnamed ones are skipped.
    pub fn extension_names(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().filter_map(|ext| ext.name.as_deref())
    }

    /// Find the schema model for a schema name or a model key.
    #[must_use]
    pub fn find_model(&self, model: &str) -> Option<&str> {
        self.models
            .iter()
            .find(|name| name.as_str() == model || model_key(name) == model)
            .map(String::as_str)
    }

    /// Resolved computed fields of a model, if any extension declared some.
    #[must_use]
    pub fn computed_fields(&self, model: &str) -> Option<&Arc<ComputedFieldsMap>> {
        self.find_model(model)
            .and_then(|name| self.computed.get(name))
    }

    /// Selection to send to the engine for a query on `model`.
    #[must_use]
    pub fn engine_selection(&self, model: &str, selection: &Selection) -> Selection {
        expand_selection(selection, self.computed_fields(model).map(Arc::as_ref))
    }

    /// Omission to send to the engine for a query on `model`.
    #[must_use]
    pub fn engine_omission(&self, model: &str, omission: &Omission) -> Omission {
        reduce_omission(omission, self.computed_fields(model).map(Arc::as_ref))
    }

    /// Evaluate computed fields on an engine record and trim it for the caller.
    #[must_use]
    pub fn apply(
        &self,
        model: &str,
        record: Record,
        selection: Option<&Selection>,
        omission: Option<&Omission>,
    ) -> Record {
        apply_result_extensions(
            record,
            self.computed_fields(model).map(Arc::as_ref),
            selection,
            omission,
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================
