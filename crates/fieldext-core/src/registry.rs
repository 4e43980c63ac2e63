//! # Registry Module
//!
//! Folds one extension's declarations into the computed fields of a model.
//!
//! Naming conflicts between layered extensions resolve as follows:
//! - an extension registered later always wins
//! - within one extension, a model-specific declaration beats `$allModels`
//! - the winning declaration's `needs` replace the old ones outright
//! - the winning `compute` is composed over the previous one, which it sees
//!   under the field's own name
//!
//! Previous snapshots are never touched; every merge yields a new map.

use crate::extension::{Extension, ModelContribution};
use crate::resolver::resolve;
use crate::types::{ComputeFn, ComputedField, ComputedFieldsMap, map_values};
use indexmap::IndexMap;
use std::sync::Arc;

/// Merge one extension's contributions for a model over the previous map.
///
/// Returns `previous` itself (the same `Arc`) when the extension contributes
/// nothing. The merged map is *not* resolved; see [`computed_fields`].
pub fn merge_extension(
    previous: Option<&Arc<ComputedFieldsMap>>,
    extension_name: Option<&str>,
    all_models: Option<&ModelContribution>,
    model_specific: Option<&ModelContribution>,
) -> Option<Arc<ComputedFieldsMap>> {
    if all_models.is_none() && model_specific.is_none() {
        return previous.cloned();
    }

    // Redeclared names keep their slot; new names are appended.
    let mut merged = previous
        .map(|map| map.as_fields().clone())
        .unwrap_or_default();

    for contribution in [all_models, model_specific].into_iter().flatten() {
        merged.extend(fields_from_contribution(
            extension_name,
            previous.map(Arc::as_ref),
            contribution,
        ));
    }

    Some(Arc::new(ComputedFieldsMap::from_fields(merged)))
}

/// Register `extension` for `model_name`: merge, then resolve all needs.
///
/// This is the per-model entry point used when an extension is added. If the
/// extension has nothing for this model the previous snapshot is returned
/// unchanged and no resolution pass runs.
pub fn computed_fields(
    previous: Option<&Arc<ComputedFieldsMap>>,
    extension: &Extension,
    model_name: &str,
) -> Option<Arc<ComputedFieldsMap>> {
    if !extension.touches(model_name) {
        return previous.cloned();
    }

    let merged = merge_extension(
        previous,
        extension.name.as_deref(),
        extension.all_models(),
        extension.for_model(model_name),
    )?;
    Some(Arc::new(resolve(&merged)))
}

fn fields_from_contribution(
    extension_name: Option<&str>,
    previous: Option<&ComputedFieldsMap>,
    contribution: &ModelContribution,
) -> IndexMap<String, ComputedField> {
    map_values(contribution, |field_name, declaration| {
        ComputedField::new(
            field_name.clone(),
            declaration.needed_names(),
            compose_compute(previous, field_name, declaration.compute.clone()),
        )
        .with_origin(extension_name.map(str::to_string))
    })
}

/// Chain `next` after the previous compute of the same field, if any.
///
/// The composed function evaluates the previous compute on the incoming
/// record, stores the result under `field_name`, and hands that record to
/// `next`.
fn compose_compute(
    previous: Option<&ComputedFieldsMap>,
    field_name: &str,
    next: ComputeFn,
) -> ComputeFn {
    let Some(previous_compute) = previous
        .and_then(|map| map.get(field_name))
        .map(|field| field.compute.clone())
    else {
        return next;
    };

    let field_name = field_name.to_string();
    Arc::new(move |record| {
        let mut augmented = record.clone();
        augmented.insert(field_name.clone(), previous_compute(record));
        next(&augmented)
    })
}

// =============================================================================
// TESTS
// =============================================================================
