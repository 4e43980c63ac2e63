//! # Extension Manifests
//!
//! TOML files declaring a schema's models and the extensions layered on
//! top of it:
//!
//! ```toml
//! models = ["User", "Post"]
//!
//! [[extension]]
//! name = "names"
//!
//! [extension.result.user.fullName]
//! needs = { firstName = true, lastName = true }
//! template = "{firstName} {lastName}"
//! ```
//!
//! Extensions are registered in file order. Fields and their `needs` keep
//! the order they are written in.

use crate::template::Template;
use fieldext_core::{
    ALL_MODELS_KEY, Extension, ExtensionStack, FieldDeclaration, FieldExtError, model_key,
};
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Maximum manifest size accepted from disk (4 MB).
const MAX_MANIFEST_SIZE: u64 = 4 * 1024 * 1024;

// =============================================================================
// MANIFEST TYPES
// =============================================================================

/// Top-level manifest.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Schema model names, e.g. `User`.
    pub models: Vec<String>,
    /// Extensions in registration order.
    #[serde(default, rename = "extension")]
    pub extensions: Vec<ExtensionSpec>,
}

/// One `[[extension]]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtensionSpec {
    pub name: Option<String>,
    /// Model key (or `$allModels`) -> field name -> declaration.
    #[serde(default)]
    pub result: BTreeMap<String, IndexMap<String, FieldSpec>>,
}

/// One computed field declaration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    #[serde(default)]
    pub needs: IndexMap<String, bool>,
    pub template: String,
}

// =============================================================================
// LOADING
// =============================================================================

impl Manifest {
    /// Read and parse a manifest file.
    pub fn load(path: &Path) -> Result<Self, FieldExtError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            FieldExtError::IoError(format!("Cannot read manifest '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_MANIFEST_SIZE {
            return Err(FieldExtError::InvalidManifest(format!(
                "Manifest size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_MANIFEST_SIZE
            )));
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            FieldExtError::IoError(format!("Cannot read manifest '{}': {}", path.display(), e))
        })?;
        tracing::debug!(path = %path.display(), bytes = contents.len(), "loaded manifest");
        Self::parse(&contents)
    }

    /// Parse and validate manifest text.
    pub fn parse(contents: &str) -> Result<Self, FieldExtError> {
        let manifest: Self = toml::from_str(contents)
            .map_err(|e| FieldExtError::InvalidManifest(e.to_string()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> Result<(), FieldExtError> {
        let mut seen = BTreeSet::new();
        for model in &self.models {
            if model.is_empty() {
                return Err(FieldExtError::InvalidManifest(
                    "model names must not be empty".to_string(),
                ));
            }
            if !seen.insert(model_key(model)) {
                return Err(FieldExtError::InvalidManifest(format!(
                    "model `{model}` is declared twice"
                )));
            }
        }

        for (index, extension) in self.extensions.iter().enumerate() {
            for key in extension.result.keys() {
                if key != ALL_MODELS_KEY && !seen.contains(key) {
                    return Err(FieldExtError::InvalidManifest(format!(
                        "extension #{} ({}) declares fields on unknown model key `{}`",
                        index + 1,
                        extension.name.as_deref().unwrap_or("unnamed"),
                        key
                    )));
                }
            }
        }
        Ok(())
    }

    /// Build core extensions, compiling every template.
    pub fn extensions(&self) -> Result<Vec<Extension>, FieldExtError> {
        self.extensions.iter().map(ExtensionSpec::build).collect()
    }

    /// Register every extension, in order, on a fresh stack.
    pub fn build_stack(&self) -> Result<ExtensionStack, FieldExtError> {
        let mut stack = ExtensionStack::new(self.models.iter().cloned());
        for extension in self.extensions()? {
            tracing::debug!(
                extension = extension.name.as_deref().unwrap_or("unnamed"),
                "registering extension"
            );
            stack = stack.extend(extension);
        }
        Ok(stack)
    }
}

impl ExtensionSpec {
    fn build(&self) -> Result<Extension, FieldExtError> {
        let mut extension = Extension::new(self.name.clone());
        for (model, fields) in &self.result {
            for (field, spec) in fields {
                let template = Template::parse(field, &spec.template)?;
                warn_on_undeclared_placeholders(model, field, spec, &template);

                extension = extension.with_field(
                    model.clone(),
                    field.clone(),
                    FieldDeclaration {
                        needs: spec.needs.clone(),
                        compute: template.into_compute(),
                    },
                );
            }
        }
        Ok(extension)
    }
}

/// A placeholder the field does not need will not be fetched for it.
fn warn_on_undeclared_placeholders(model: &str, field: &str, spec: &FieldSpec, template: &Template) {
    for placeholder in template.placeholders() {
        let declared = placeholder == field || spec.needs.get(placeholder).copied().unwrap_or(false);
        if !declared {
            tracing::warn!(
                model,
                field,
                placeholder,
                "template references a field missing from `needs`"
            );
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
