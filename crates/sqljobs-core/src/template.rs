//! Placeholder templates over job-spec JSON documents.
//!
//! A template is an ordinary spec document whose leaf strings may contain
//! `<NAME>` markers (`<GITPATH>`, `<DBSQL warehouse_id>`, ...). Names may
//! contain spaces, and one leaf may hold several markers
//! (`<username>@<domain>.com`). Rendering is purely textual substitution:
//! it guarantees that no marker survives, and nothing more. Whether the
//! rendered document is a *valid* spec is a separate `validate` pass.
//!
//! Templates are handled as `serde_json::Value` rather than `JobSpec` because
//! an unrendered template is not necessarily a well-typed spec yet.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

use serde_json::Value;

use crate::domain::{TemplateError, UnresolvedPlaceholder};

/// Values to fill into a template, keyed by placeholder name (the text inside
/// the angle brackets).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitutions {
    map: BTreeMap<String, String>,
}

impl Substitutions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.map.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.map.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.map.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl From<BTreeMap<String, String>> for Substitutions {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self { map }
    }
}

impl FromIterator<(String, String)> for Substitutions {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            map: iter.into_iter().collect(),
        }
    }
}

/// All placeholder names appearing anywhere in the document's leaf strings.
pub fn placeholders(doc: &Value) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    collect(doc, &mut names);
    names
}

fn collect(value: &Value, names: &mut BTreeSet<String>) {
    match value {
        Value::String(s) => {
            for (_, name) in scan(s) {
                names.insert(name.to_string());
            }
        }
        Value::Array(items) => {
            for item in items {
                collect(item, names);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                collect(item, names);
            }
        }
        _ => {}
    }
}

/// Fill every placeholder in `doc` from `subs`.
///
/// Returns the rendered document, or the full list of markers that had no
/// substitution (each with its location), so a caller can report all gaps at
/// once instead of one per run.
pub fn render(doc: &Value, subs: &Substitutions) -> Result<Value, TemplateError> {
    let mut unresolved = Vec::new();
    let rendered = render_value(doc, subs, "", &mut unresolved);
    if unresolved.is_empty() {
        Ok(rendered)
    } else {
        Err(TemplateError::Unresolved(unresolved))
    }
}

fn render_value(
    value: &Value,
    subs: &Substitutions,
    location: &str,
    unresolved: &mut Vec<UnresolvedPlaceholder>,
) -> Value {
    match value {
        Value::String(s) => Value::String(render_str(s, subs, location, unresolved)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    render_value(item, subs, &format!("{location}/{i}"), unresolved)
                })
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, item)| {
                    (
                        k.clone(),
                        render_value(item, subs, &format!("{location}/{k}"), unresolved),
                    )
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

fn render_str(
    s: &str,
    subs: &Substitutions,
    location: &str,
    unresolved: &mut Vec<UnresolvedPlaceholder>,
) -> String {
    let found = scan(s);
    if found.is_empty() {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut last = 0;
    for (range, name) in found {
        out.push_str(&s[last..range.start]);
        match subs.get(name) {
            Some(value) => out.push_str(value),
            None => {
                unresolved.push(UnresolvedPlaceholder {
                    name: name.to_string(),
                    location: if location.is_empty() {
                        "/".to_string()
                    } else {
                        location.to_string()
                    },
                });
                out.push_str(&s[range.clone()]);
            }
        }
        last = range.end;
    }
    out.push_str(&s[last..]);
    out
}

/// Find `<NAME>` markers in one leaf string, left to right.
///
/// A `<` with no closing `>` is literal text; so is an empty `<>`. When
/// another `<` opens before the first closes, scanning restarts at the inner
/// one, so only the innermost bracket pair forms a marker.
fn scan(s: &str) -> Vec<(Range<usize>, &str)> {
    let bytes = s.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'<' {
            match s[i + 1..].find(['<', '>']) {
                Some(rel) => {
                    let j = i + 1 + rel;
                    if bytes[j] == b'>' {
                        let name = &s[i + 1..j];
                        if !name.is_empty() {
                            out.push((i..j + 1, name));
                        }
                        i = j + 1;
                    } else {
                        i = j;
                    }
                }
                None => break,
            }
        } else {
            i += 1;
        }
    }
    out
}
