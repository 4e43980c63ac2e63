//! Integration tests for manifest loading and CLI reports.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use fieldext::cli::{
    apply_report, load_stack, models_report, parse_mask, plan_report, render_records_text,
    require_model, resolve_report,
};
use fieldext_core::{ExtensionStack, FieldExtError};
use serde_json::json;
use std::io::Write;
use tempfile::NamedTempFile;

const USERS: &str = r#"
models = ["User", "Post"]

[[extension]]
name = "names"

[extension.result.user.fullName]
needs = { firstName = true, lastName = true }
template = "{firstName} {lastName}"

[extension.result.user.sanitizedPassword]
needs = { password = true }
template = "***"

[[extension]]
name = "titles"

[extension.result.user.nameAndTitle]
needs = { fullName = true, title = true }
template = "{fullName}, {title}"

[[extension]]
name = "loud"

[extension.result.user.fullName]
needs = { firstName = true, lastName = true, nickname = false }
template = "{fullName}!"
"#;

fn write_manifest(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn stack() -> ExtensionStack {
    let file = write_manifest(USERS);
    load_stack(file.path()).unwrap()
}

// =============================================================================
// LOADING
// =============================================================================

#[test]
fn test_load_stack_from_file() {
    let stack = stack();
    assert_eq!(stack.depth(), 3);
    assert_eq!(
        stack.extension_names().collect::<Vec<_>>(),
        vec!["names", "titles", "loud"]
    );
}

#[test]
fn test_load_missing_manifest_is_io_error() {
    let err = load_stack(std::path::Path::new("/nonexistent/fieldext.toml"));
    assert!(matches!(err, Err(FieldExtError::IoError(_))));
}

#[test]
fn test_load_invalid_toml_is_manifest_error() {
    let file = write_manifest("models = [");
    assert!(matches!(
        load_stack(file.path()),
        Err(FieldExtError::InvalidManifest(_))
    ));
}

#[test]
fn test_require_model_accepts_key_and_rejects_unknown() {
    let stack = stack();
    assert_eq!(require_model(&stack, "user").unwrap(), "User");
    assert!(matches!(
        require_model(&stack, "Comment"),
        Err(FieldExtError::UnknownModel(_))
    ));
}

// =============================================================================
// MASKS
// =============================================================================

#[test]
fn test_parse_mask_comma_list() {
    let mask = parse_mask(" id, fullName ,,").unwrap();
    assert!(mask.is_set("id"));
    assert!(mask.is_set("fullName"));
    assert_eq!(mask.len(), 2);
}

#[test]
fn test_parse_mask_json_object() {
    let mask = parse_mask(r#"{"posts": {"select": {"id": true}}, "id": false}"#).unwrap();
    assert!(mask.is_set("posts"));
    assert!(!mask.is_set("id"));
}

#[test]
fn test_parse_mask_bad_json() {
    assert!(matches!(
        parse_mask("{nope"),
        Err(FieldExtError::SerializationError(_))
    ));
}

// =============================================================================
// REPORTS
// =============================================================================

#[test]
fn test_models_report_lists_fields() {
    let report = models_report(&stack());
    assert_eq!(
        report["models"]["User"],
        json!(["fullName", "sanitizedPassword", "nameAndTitle"])
    );
    assert_eq!(report["models"]["Post"], json!([]));
}

#[test]
fn test_resolve_report_flattens_needs() {
    let report = resolve_report(&stack(), Some("User")).unwrap();
    let field = &report["User"]["nameAndTitle"];

    assert_eq!(field["declared_needs"], json!(["fullName", "title"]));
    assert_eq!(field["needs"], json!(["firstName", "lastName", "title"]));
    assert_eq!(field["origin"], json!("titles"));
    assert_eq!(report["User"]["fullName"]["origin"], json!("loud"));
    assert!(report.get("Post").is_none());
}

#[test]
fn test_plan_report_expands_selection() {
    let selection = parse_mask("id,nameAndTitle").unwrap();
    let report = plan_report(&stack(), "User", Some(&selection), None).unwrap();

    assert_eq!(report["model"], json!("User"));
    let engine = report["selection"].as_object().unwrap();
    for name in ["id", "nameAndTitle", "firstName", "lastName", "title"] {
        assert_eq!(engine.get(name), Some(&json!(true)), "{name}");
    }
    assert!(report["omission"].is_null());
}

#[test]
fn test_plan_report_reduces_omission() {
    let kept = parse_mask("password").unwrap();
    let report = plan_report(&stack(), "User", None, Some(&kept)).unwrap();
    assert_eq!(report["omission"], json!({}));

    let both = parse_mask("password,sanitizedPassword").unwrap();
    let report = plan_report(&stack(), "User", None, Some(&both)).unwrap();
    assert_eq!(
        report["omission"],
        json!({ "password": true, "sanitizedPassword": true })
    );
}

#[test]
fn test_apply_report_composes_layers_and_trims() {
    let selection = parse_mask("id,fullName,nameAndTitle").unwrap();
    let records = json!([
        { "id": 1, "firstName": "Ada", "lastName": "Lovelace", "title": "Countess" },
        { "id": 2, "firstName": "Alan", "lastName": "Turing", "title": null }
    ]);

    let report = apply_report(&stack(), "User", records, Some(&selection), None).unwrap();
    assert_eq!(
        report,
        json!([
            { "fullName": "Ada Lovelace!", "id": 1, "nameAndTitle": "Ada Lovelace!, Countess" },
            { "fullName": "Alan Turing!", "id": 2, "nameAndTitle": "Alan Turing!, " }
        ])
    );
}

#[test]
fn test_apply_report_hides_forced_omissions() {
    let omission = parse_mask("password").unwrap();
    let record = json!({ "id": 9, "password": "hunter2", "firstName": "A", "lastName": "B", "title": "C" });

    let report = apply_report(&stack(), "User", record, None, Some(&omission)).unwrap();
    assert_eq!(report["sanitizedPassword"], json!("***"));
    assert!(report.get("password").is_none());
    assert_eq!(report["id"], json!(9));
}

#[test]
fn test_apply_report_rejects_non_objects() {
    let err = apply_report(&stack(), "User", json!([1, 2]), None, None);
    assert!(matches!(err, Err(FieldExtError::InvalidRecord(_))));
}

#[test]
fn test_apply_text_rendering_lists_each_record() {
    let selection = parse_mask("id,fullName").unwrap();
    let records = json!([
        { "id": 1, "firstName": "Ada", "lastName": "Lovelace" },
        { "id": 2, "firstName": "Alan", "lastName": "Turing" }
    ]);
    let report = apply_report(&stack(), "User", records, Some(&selection), None).unwrap();
    let text = render_records_text(&report);

    assert!(text.starts_with("Record 1\n"));
    assert!(text.contains("Record 2\n"));
    assert!(text.contains("Ada Lovelace!"));
    assert!(text.contains("Alan Turing!"));
    assert!(!text.contains("firstName"));
    assert!(!text.contains('"'));
}
