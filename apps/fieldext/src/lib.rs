//! # fieldext
//!
//! Command-line front end for `fieldext-core`.
//!
//! - `manifest`: TOML extension manifests
//! - `template`: `{field}` templates used as compute functions
//! - `cli`: clap commands and their JSON reports

pub mod cli;
pub mod manifest;
pub mod template;

pub use manifest::{ExtensionSpec, FieldSpec, Manifest};
pub use template::Template;
