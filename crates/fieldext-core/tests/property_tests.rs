//! # Property-Based Tests
//!
//! Invariants of merging, resolution and query planning over random
//! declaration graphs.

use fieldext_core::{
    ComputedField, ComputedFieldsMap, Extension, FieldDeclaration, Omission, Selection,
    compute_fn, computed_fields, expand_selection, reduce_omission, resolve,
};
use proptest::collection::{btree_set, vec};
use proptest::prelude::*;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;

// =============================================================================
// STRATEGIES
// =============================================================================

/// Names drawn from a small pool so that needs often hit computed fields.
fn name() -> impl Strategy<Value = String> {
    prop_oneof![
        (0u8..6).prop_map(|i| format!("c{i}")),
        (0u8..6).prop_map(|i| format!("b{i}")),
    ]
}

/// A map whose computed fields are `c*`; needs mix `c*` and base `b*` names.
fn declaration_graph() -> impl Strategy<Value = ComputedFieldsMap> {
    vec((0u8..6, vec(name(), 0..4)), 0..8).prop_map(|fields| {
        fields
            .into_iter()
            .map(|(i, needs)| ComputedField::new(format!("c{i}"), needs, compute_fn(|_| Value::Null)))
            .collect()
    })
}

/// The same graph with `needs` only pointing at lower-numbered fields.
fn acyclic_graph() -> impl Strategy<Value = ComputedFieldsMap> {
    declaration_graph().prop_map(|map| {
        map.iter()
            .map(|field| {
                let own: u8 = field.name[1..].parse().unwrap_or(0);
                let needs = field
                    .needs
                    .iter()
                    .filter(|n| !n.starts_with('c') || n[1..].parse::<u8>().is_ok_and(|i| i < own))
                    .cloned()
                    .collect();
                ComputedField::new(field.name.clone(), needs, field.compute.clone())
            })
            .collect()
    })
}

fn mask() -> impl Strategy<Value = BTreeSet<String>> {
    btree_set(name(), 0..8)
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Resolution always terminates and keeps every field.
    #[test]
    fn resolution_terminates_on_any_graph(map in declaration_graph()) {
        let resolved = resolve(&map);
        prop_assert_eq!(resolved.len(), map.len());
        for field in map.iter() {
            let after = resolved.get(&field.name).expect("kept");
            prop_assert_eq!(&after.declared_needs, &field.declared_needs);
            // Only names reachable from the declarations can appear.
            for dependency in &after.needs {
                prop_assert!(
                    map.contains(dependency) || map.iter().any(|f| f.needs.contains(dependency))
                );
            }
        }
    }

    /// Same input produces the same closures.
    #[test]
    fn resolution_is_deterministic(map in declaration_graph()) {
        let first = resolve(&map);
        let second = resolve(&map);
        for field in first.iter() {
            prop_assert_eq!(&field.needs, &second.get(&field.name).expect("kept").needs);
        }
    }

    /// On acyclic graphs no closure mentions a computed field.
    #[test]
    fn acyclic_closures_are_base_only(map in acyclic_graph()) {
        let resolved = resolve(&map);
        for field in resolved.iter() {
            for dependency in &field.needs {
                prop_assert!(!resolved.contains(dependency));
            }
        }
    }

    /// Resolving an already resolved acyclic map changes nothing.
    #[test]
    fn resolution_is_idempotent_on_acyclic_graphs(map in acyclic_graph()) {
        let once = resolve(&map);
        let twice = resolve(&once);
        for field in once.iter() {
            prop_assert_eq!(&field.needs, &twice.get(&field.name).expect("kept").needs);
        }
    }

    /// Expanding twice equals expanding once.
    #[test]
    fn selection_expansion_is_idempotent(map in declaration_graph(), selected in mask()) {
        let resolved = resolve(&map);
        let selection = Selection::from_names(selected);
        let once = expand_selection(&selection, Some(&resolved));
        let twice = expand_selection(&once, Some(&resolved));
        prop_assert_eq!(once, twice);
    }

    /// Expansion only adds; every originally selected key stays.
    #[test]
    fn selection_expansion_only_adds(map in declaration_graph(), selected in mask()) {
        let resolved = resolve(&map);
        let selection = Selection::from_names(selected);
        let engine = expand_selection(&selection, Some(&resolved));
        for (name, flag) in selection.iter() {
            prop_assert_eq!(engine.get(name), Some(flag));
        }
    }

    /// Reduction only removes, and un-omits every need of a kept computed field.
    #[test]
    fn omission_reduction_only_removes(map in declaration_graph(), omitted in mask()) {
        let resolved = resolve(&map);
        let omission = Omission::from_names(omitted);
        let engine = reduce_omission(&omission, Some(&resolved));

        for (name, _) in engine.iter() {
            prop_assert!(omission.contains_key(name));
        }
        for field in resolved.iter().filter(|f| !omission.is_set(&f.name)) {
            for dependency in &field.needs {
                prop_assert!(!engine.contains_key(dependency));
            }
        }
    }

    /// An extension with nothing for the model keeps the exact snapshot.
    #[test]
    fn unrelated_extension_is_identity(needs in vec(name(), 0..4)) {
        let ext = Extension::new(None).with_field(
            "user",
            "c0",
            FieldDeclaration::new(needs, compute_fn(|_| Value::Null)),
        );
        let before = computed_fields(None, &ext, "User").expect("declared");
        let unrelated = Extension::new(None).with_field(
            "post",
            "c1",
            FieldDeclaration::new(["b0"], compute_fn(|_| Value::Null)),
        );
        let after = computed_fields(Some(&before), &unrelated, "User").expect("kept");
        prop_assert!(Arc::ptr_eq(&before, &after));
    }

    /// Registration keeps `needs` in first-declared order.
    #[test]
    fn needs_keep_declaration_order(needs in vec(name(), 0..6)) {
        let mut expected: Vec<String> = Vec::new();
        for need in &needs {
            if !expected.contains(need) {
                expected.push(need.clone());
            }
        }

        let ext = Extension::new(None).with_field(
            "user",
            "c0",
            FieldDeclaration::new(needs, compute_fn(|_| Value::Null)),
        );
        let map = computed_fields(None, &ext, "User").expect("declared");
        let field = map.get("c0").expect("c0");
        prop_assert_eq!(&field.declared_needs, &expected);
        // Only `c0` is computed, and it resolves to itself.
        prop_assert_eq!(&field.needs, &expected);
    }
}
