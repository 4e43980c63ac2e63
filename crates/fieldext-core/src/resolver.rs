//! # Resolver Module
//!
//! Rewrites every computed field's `needs` to its transitive closure of
//! base fields.
//!
//! - A name with no computed field behind it is a base field
//! - A memo shared across the whole pass caches each name's closure
//! - A visited set, fresh per root field, cuts cycles: a name seen again
//!   while resolving the same root resolves to itself
//!
//! Resolution never fails. Because cycle cut-offs are memoized like any
//! other result, closures of cyclic declarations depend on the order roots
//! are visited, which is the map's declaration order.

use crate::types::{ComputedField, ComputedFieldsMap, map_values};
use indexmap::IndexMap;
use std::collections::{BTreeMap, BTreeSet};

/// Resolve all `needs` of `computed` down to base fields.
///
/// Returns a new map; field names, compute functions, declared needs and
/// origins are carried over unchanged.
pub fn resolve(computed: &ComputedFieldsMap) -> ComputedFieldsMap {
    let fields = computed.as_fields();
    let mut closures = ClosureResolver::new(fields);

    ComputedFieldsMap::from_fields(map_values(fields, |name, field| {
        let mut visited = BTreeSet::new();
        ComputedField {
            needs: closures.closure(name, &mut visited),
            ..field.clone()
        }
    }))
}

/// Memoized depth-first expansion over one map.
struct ClosureResolver<'a> {
    fields: &'a IndexMap<String, ComputedField>,
    memo: BTreeMap<String, Vec<String>>,
}

impl<'a> ClosureResolver<'a> {
    fn new(fields: &'a IndexMap<String, ComputedField>) -> Self {
        Self {
            fields,
            memo: BTreeMap::new(),
        }
    }

    fn closure(&mut self, name: &str, visited: &mut BTreeSet<String>) -> Vec<String> {
        if let Some(cached) = self.memo.get(name) {
            return cached.clone();
        }

        let fields = self.fields;
        let resolved = if !visited.insert(name.to_string()) {
            // Re-entered on this root's path.
            vec![name.to_string()]
        } else {
            match fields.get(name) {
                None => vec![name.to_string()],
                Some(field) => {
                    let mut expanded = Vec::new();
                    for dependency in &field.needs {
                        expanded.extend(self.closure(dependency, visited));
                    }
                    expanded
                }
            }
        };

        self.memo.insert(name.to_string(), resolved.clone());
        resolved
    }
}

// =============================================================================
// TESTS
// =============================================================================
