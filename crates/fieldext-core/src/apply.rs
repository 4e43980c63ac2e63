//! # Apply Module
//!
//! Client-side half of computed fields: evaluate them on a record the
//! engine returned, then strip whatever was fetched only to feed them.
//!
//! The engine-side selection and omission (see [`crate::selection`] and
//! [`crate::omission`]) may fetch more than the caller asked for. This
//! module restores the caller-facing shape.

use crate::types::{ComputedFieldsMap, Omission, Record, Selection};
use std::collections::BTreeSet;

/// Evaluate visible computed fields on `record` and trim it to the caller's request.
///
/// A computed field is visible when it is selected (if a selection is
/// given), or otherwise when it is not omitted. Computed fields that a
/// visible field declares as needs are evaluated first, even if they are
/// not visible themselves.
pub fn apply_result_extensions(
    record: Record,
    computed: Option<&ComputedFieldsMap>,
    selection: Option<&Selection>,
    omission: Option<&Omission>,
) -> Record {
    let Some(computed) = computed else {
        return record;
    };

    let visible: BTreeSet<&str> = computed
        .names()
        .filter(|name| is_visible(name, selection, omission))
        .collect();

    let mut evaluator = Evaluator {
        computed,
        record,
        done: BTreeSet::new(),
    };
    for name in &visible {
        evaluator.evaluate(name, &mut BTreeSet::new());
    }

    let mut output = evaluator.record;
    output.retain(|name, _| {
        if computed.contains(name) {
            return visible.contains(name.as_str());
        }
        match (selection, omission) {
            (Some(selection), _) => selection.is_set(name),
            (None, Some(omission)) => !omission.is_set(name),
            (None, None) => true,
        }
    });
    output
}

fn is_visible(name: &str, selection: Option<&Selection>, omission: Option<&Omission>) -> bool {
    match selection {
        Some(selection) => selection.is_set(name),
        None => omission.is_none_or(|omission| !omission.is_set(name)),
    }
}

/// Evaluates computed fields into a working record in dependency order.
struct Evaluator<'a> {
    computed: &'a ComputedFieldsMap,
    record: Record,
    done: BTreeSet<String>,
}

impl Evaluator<'_> {
    fn evaluate(&mut self, name: &str, path: &mut BTreeSet<String>) {
        if self.done.contains(name) || !path.insert(name.to_string()) {
            return;
        }
        let computed = self.computed;
        let Some(field) = computed.get(name) else {
            return;
        };

        for dependency in &field.declared_needs {
            if dependency != name && computed.contains(dependency) {
                self.evaluate(dependency, path);
            }
        }

        let value = field.evaluate(&self.record);
        self.record.insert(name.to_string(), value);
        self.done.insert(name.to_string());
    }
}

// =============================================================================
// TESTS
// =============================================================================
