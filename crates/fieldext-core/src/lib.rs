//! # fieldext-core
//!
//! Layered computed-field extensions for a data-access client - THE LOGIC.
//!
//! Extensions are registered one after another, and each may contribute
//! computed fields to one or more models. This crate:
//! - merges every extension's declarations per model (`registry`)
//! - resolves each field's `needs` to the base fields it transitively
//!   depends on (`resolver`)
//! - plans the engine-side selection and omission of a query so the
//!   engine fetches exactly what the computed fields need
//!   (`selection`, `omission`)
//! - evaluates computed fields on returned records and restores the
//!   caller-facing shape (`apply`)
//!
//! ## Architectural Constraints
//!
//! - Pure and synchronous: no I/O, no logging, no global state
//! - Never fails: unknown needs are base fields, cycles are cut
//! - Published maps are immutable `Arc` snapshots

// =============================================================================
// MODULES
// =============================================================================

pub mod apply;
pub mod extension;
pub mod omission;
pub mod registry;
pub mod resolver;
pub mod selection;
pub mod stack;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    ComputeFn, ComputedField, ComputedFieldsMap, FieldExtError, FieldMask, Omission, Record,
    Selection, compute_fn, is_truthy, map_values,
};

// =============================================================================
// RE-EXPORTS: Extensions & Resolution
// =============================================================================

pub use apply::apply_result_extensions;
pub use extension::{ALL_MODELS_KEY, Extension, FieldDeclaration, ModelContribution, model_key};
pub use omission::reduce_omission;
pub use registry::{computed_fields, merge_extension};
pub use resolver::resolve;
pub use selection::expand_selection;
pub use stack::ExtensionStack;
