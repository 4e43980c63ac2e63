//! # Compute Templates
//!
//! Manifest-declared compute functions.
//!
//! A template is literal text with `{field}` placeholders. Rendering
//! replaces each placeholder with the record's value for that field:
//! strings verbatim, `null` or missing as the empty string, anything else
//! as compact JSON. `{{` and `}}` produce literal braces.

use fieldext_core::{ComputeFn, FieldExtError, Record, compute_fn};
use serde_json::Value;

/// One parsed piece of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(String),
}

/// A parsed compute template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    /// Parse `source`. `field` only labels errors.
    pub fn parse(field: &str, source: &str) -> Result<Self, FieldExtError> {
        let invalid = |reason: &str| FieldExtError::InvalidTemplate {
            field: field.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some('{') => return Err(invalid("nested `{` in placeholder")),
                            Some(ch) => name.push(ch),
                            None => return Err(invalid("unclosed `{`")),
                        }
                    }
                    let name = name.trim();
                    if name.is_empty() {
                        return Err(invalid("empty placeholder"));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field(name.to_string()));
                }
                '}' => return Err(invalid("unmatched `}`")),
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { segments })
    }

    /// Field names referenced by placeholders, in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Field(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Render against a record.
    #[must_use]
    pub fn render(&self, record: &Record) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(name) => match record.get(name) {
                    None | Some(Value::Null) => {}
                    Some(Value::String(s)) => out.push_str(s),
                    Some(other) => out.push_str(&other.to_string()),
                },
            }
        }
        out
    }

    /// Turn the template into a compute function producing a JSON string.
    #[must_use]
    pub fn into_compute(self) -> ComputeFn {
        compute_fn(move |record| Value::String(self.render(record)))
    }
}

// =============================================================================
// TESTS
// =============================================================================
