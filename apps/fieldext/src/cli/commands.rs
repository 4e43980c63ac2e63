//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//! Each command has a pure report builder (returning JSON) used by both the
//! printer and the tests.

use crate::manifest::Manifest;
use fieldext_core::{ExtensionStack, FieldExtError, FieldMask, Omission, Record, Selection};
use serde_json::{Value, json};
use std::path::Path;

/// Maximum size of a records file (100 MB).
const MAX_RECORDS_FILE_SIZE: u64 = 100 * 1024 * 1024;

// =============================================================================
// SHARED HELPERS
// =============================================================================

/// Load a manifest and register all of its extensions.
pub fn load_stack(manifest: &Path) -> Result<ExtensionStack, FieldExtError> {
    let stack = Manifest::load(manifest)?.build_stack()?;
    tracing::info!(
        manifest = %manifest.display(),
        extensions = stack.depth(),
        "extension stack ready"
    );
    Ok(stack)
}

/// Resolve a model argument to its schema name.
pub fn require_model<'a>(stack: &'a ExtensionStack, model: &str) -> Result<&'a str, FieldExtError> {
    stack
        .find_model(model)
        .ok_or_else(|| FieldExtError::UnknownModel(model.to_string()))
}

/// Parse a selection or omission argument.
///
/// Accepts a JSON object (`{"posts": {"select": {"id": true}}}`) or a
/// comma-separated list of names, each set to `true`.
pub fn parse_mask(text: &str) -> Result<FieldMask, FieldExtError> {
    let trimmed = text.trim();
    if trimmed.starts_with('{') {
        return serde_json::from_str(trimmed)
            .map_err(|e| FieldExtError::SerializationError(format!("Invalid field mask: {}", e)));
    }
    Ok(FieldMask::from_names(
        trimmed
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty()),
    ))
}

fn parse_optional_mask(text: Option<&str>) -> Result<Option<FieldMask>, FieldExtError> {
    text.map(parse_mask).transpose()
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, FieldExtError> {
    serde_json::to_value(value).map_err(|e| FieldExtError::SerializationError(e.to_string()))
}

fn render_json<T: serde::Serialize>(value: &T) -> Result<String, FieldExtError> {
    serde_json::to_string_pretty(value).map_err(|e| FieldExtError::SerializationError(e.to_string()))
}

fn print_json(value: &Value) -> Result<(), FieldExtError> {
    println!("{}", render_json(value)?);
    Ok(())
}

// =============================================================================
// REPORTS
// =============================================================================

/// Models with their computed field names.
pub fn models_report(stack: &ExtensionStack) -> Value {
    let models: serde_json::Map<String, Value> = stack
        .models()
        .map(|model| {
            let fields: Vec<&str> = stack
                .computed_fields(model)
                .map(|map| map.names().collect())
                .unwrap_or_default();
            (model.to_string(), json!(fields))
        })
        .collect();

    json!({
        "extensions": stack.extension_names().collect::<Vec<_>>(),
        "models": models,
    })
}

/// Declared and resolved needs for every computed field of one or all models.
pub fn resolve_report(stack: &ExtensionStack, model: Option<&str>) -> Result<Value, FieldExtError> {
    let models: Vec<&str> = match model {
        Some(model) => vec![require_model(stack, model)?],
        None => stack.models().collect(),
    };

    let mut report = serde_json::Map::new();
    for model in models {
        let mut fields = serde_json::Map::new();
        if let Some(map) = stack.computed_fields(model) {
            for field in map.iter() {
                fields.insert(
                    field.name.clone(),
                    json!({
                        "declared_needs": field.declared_needs,
                        "needs": field.needs,
                        "origin": field.origin,
                    }),
                );
            }
        }
        report.insert(model.to_string(), Value::Object(fields));
    }
    Ok(Value::Object(report))
}

/// Engine-side selection and omission for a query.
pub fn plan_report(
    stack: &ExtensionStack,
    model: &str,
    selection: Option<&Selection>,
    omission: Option<&Omission>,
) -> Result<Value, FieldExtError> {
    let model = require_model(stack, model)?;

    let engine_selection = selection
        .map(|selection| to_json(&stack.engine_selection(model, selection)))
        .transpose()?;
    let engine_omission = omission
        .map(|omission| to_json(&stack.engine_omission(model, omission)))
        .transpose()?;

    Ok(json!({
        "model": model,
        "selection": engine_selection,
        "omission": engine_omission,
    }))
}

/// Apply computed fields to one record or an array of records.
pub fn apply_report(
    stack: &ExtensionStack,
    model: &str,
    records: Value,
    selection: Option<&Selection>,
    omission: Option<&Omission>,
) -> Result<Value, FieldExtError> {
    let model = require_model(stack, model)?;

    let apply_one = |value: Value| -> Result<Value, FieldExtError> {
        let record: Record = match value {
            Value::Object(object) => object.into_iter().collect(),
            other => {
                return Err(FieldExtError::InvalidRecord(format!(
                    "expected a JSON object, got {}",
                    kind_of(&other)
                )));
            }
        };
        to_json(&stack.apply(model, record, selection, omission))
    };

    match records {
        Value::Array(items) => items
            .into_iter()
            .map(apply_one)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        single => apply_one(single),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// =============================================================================
// MODELS COMMAND
// =============================================================================

/// List models and their computed fields.
pub fn cmd_models(manifest: &Path, json_mode: bool) -> Result<(), FieldExtError> {
    let stack = load_stack(manifest)?;
    let report = models_report(&stack);

    if json_mode {
        return print_json(&report);
    }

    println!("fieldext Models");
    println!("===============");
    println!("Manifest:   {:?}", manifest);
    println!("Extensions: {}", stack.depth());
    println!();
    for model in stack.models() {
        let fields: Vec<&str> = stack
            .computed_fields(model)
            .map(|map| map.names().collect())
            .unwrap_or_default();
        if fields.is_empty() {
            println!("  {:<20} (no computed fields)", model);
        } else {
            println!("  {:<20} {}", model, fields.join(", "));
        }
    }
    Ok(())
}

// =============================================================================
// RESOLVE COMMAND
// =============================================================================

/// Show resolved needs.
pub fn cmd_resolve(manifest: &Path, json_mode: bool, model: Option<&str>) -> Result<(), FieldExtError> {
    let stack = load_stack(manifest)?;
    let report = resolve_report(&stack, model)?;

    if json_mode {
        return print_json(&report);
    }

    if let Value::Object(models) = &report {
        for (model, fields) in models {
            println!("{}", model);
            let Value::Object(fields) = fields else {
                continue;
            };
            if fields.is_empty() {
                println!("  (no computed fields)");
            }
            for (name, field) in fields {
                println!(
                    "  {:<20} needs {}  (declared {})",
                    name,
                    join_names(&field["needs"]),
                    join_names(&field["declared_needs"])
                );
            }
        }
    }
    Ok(())
}

fn join_names(names: &Value) -> String {
    let names: Vec<&str> = names
        .as_array()
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(", ")
    }
}

// =============================================================================
// PLAN COMMAND
// =============================================================================

/// Print the engine-side selection and omission for a query.
pub fn cmd_plan(
    manifest: &Path,
    json_mode: bool,
    model: &str,
    select: Option<&str>,
    omit: Option<&str>,
) -> Result<(), FieldExtError> {
    let stack = load_stack(manifest)?;
    let selection = parse_optional_mask(select)?;
    let omission = parse_optional_mask(omit)?;

    tracing::debug!(model, ?selection, ?omission, "planning query");
    let report = plan_report(&stack, model, selection.as_ref(), omission.as_ref())?;

    if json_mode {
        return print_json(&report);
    }

    println!("Query plan for {}", report["model"].as_str().unwrap_or(model));
    println!();
    for key in ["selection", "omission"] {
        match report[key].as_object() {
            Some(mask) => {
                let names: Vec<&str> = mask.keys().map(String::as_str).collect();
                println!("Engine {:<10} {}", format!("{key}:"), names.join(", "));
            }
            None => println!("Engine {:<10} (none)", format!("{key}:")),
        }
    }
    Ok(())
}

// =============================================================================
// APPLY COMMAND
// =============================================================================

/// Evaluate computed fields on records from a JSON file and print the result.
pub fn cmd_apply(
    manifest: &Path,
    json_mode: bool,
    model: &str,
    records: &Path,
    select: Option<&str>,
    omit: Option<&str>,
) -> Result<(), FieldExtError> {
    let stack = load_stack(manifest)?;
    let selection = parse_optional_mask(select)?;
    let omission = parse_optional_mask(omit)?;

    let metadata = std::fs::metadata(records).map_err(|e| {
        FieldExtError::IoError(format!("Cannot read records '{}': {}", records.display(), e))
    })?;
    if metadata.len() > MAX_RECORDS_FILE_SIZE {
        return Err(FieldExtError::InvalidRecord(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_RECORDS_FILE_SIZE
        )));
    }

    let contents = std::fs::read(records)
        .map_err(|e| FieldExtError::IoError(format!("Read file: {}", e)))?;
    let value: Value = serde_json::from_slice(&contents)
        .map_err(|e| FieldExtError::SerializationError(format!("Invalid records JSON: {}", e)))?;

    tracing::info!(model, records = %records.display(), "applying computed fields");
    let report = apply_report(&stack, model, value, selection.as_ref(), omission.as_ref())?;

    if json_mode {
        return print_json(&report);
    }
    print!("{}", render_records_text(&report));
    Ok(())
}

/// Plain-text listing of applied records: one block per record, one line per field.
pub fn render_records_text(report: &Value) -> String {
    let records: Vec<&Value> = match report {
        Value::Array(items) => items.iter().collect(),
        single => vec![single],
    };

    let mut out = String::new();
    for (index, record) in records.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        out.push_str(&format!("Record {}\n", index + 1));
        if let Value::Object(fields) = record {
            for (name, value) in fields {
                let shown = match value {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                };
                out.push_str(&format!("  {:<20} {}\n", name, shown));
            }
        }
    }
    out
}

// =============================================================================
// TESTS
// =============================================================================
