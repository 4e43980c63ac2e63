//! # Omission Module
//!
//! Engine-side omission. A base field the caller omits is still fetched
//! when a computed field the caller keeps depends on it; the client drops
//! it again after computing (see [`crate::apply`]).

use crate::types::{ComputedFieldsMap, Omission};

/// Reduce a caller omission so needs of non-omitted computed fields are fetched.
///
/// Omitted computed fields force nothing. Without computed fields the
/// omission is returned as is.
pub fn reduce_omission(omission: &Omission, computed: Option<&ComputedFieldsMap>) -> Omission {
    let Some(computed) = computed else {
        return omission.clone();
    };

    let mut engine_omission = omission.clone();
    for field in computed.iter() {
        if omission.is_set(&field.name) {
            continue;
        }
        for dependency in &field.needs {
            engine_omission.remove(dependency);
        }
    }
    engine_omission
}

// =============================================================================
// TESTS
// =============================================================================
