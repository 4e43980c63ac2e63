//! # Selection Module
//!
//! Engine-side selection: whatever the caller selects, plus every base
//! field a selected computed field needs.

use crate::types::{ComputedFieldsMap, Selection};
use serde_json::Value;

/// Expand a caller selection with the resolved needs of selected computed fields.
///
/// Dependencies already selected with a truthy flag keep their flag, so
/// nested relation selections survive. Without computed fields the
/// selection is returned as is.
pub fn expand_selection(selection: &Selection, computed: Option<&ComputedFieldsMap>) -> Selection {
    let Some(computed) = computed else {
        return selection.clone();
    };

    let mut engine_selection = selection.clone();
    for field in computed.iter() {
        if !selection.is_set(&field.name) {
            continue;
        }
        for dependency in &field.needs {
            if !engine_selection.is_set(dependency) {
                engine_selection.insert(dependency.clone(), Value::Bool(true));
            }
        }
    }
    engine_selection
}

// =============================================================================
// TESTS
// =============================================================================
