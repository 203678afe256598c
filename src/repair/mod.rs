//! Repair of the `additional_matches` column
//!
//! Upstream matching stores the candidate list as a Python-style literal
//! that is frequently broken: missing separators between records, bare
//! `nan` tokens, single-quoted strings. This module repairs the text into
//! well-formed JSON and parses it; anything still unparseable degrades to
//! an empty list with a logged warning instead of failing the batch.
//!
//! ## Repair steps
//! 1. missing markers (empty cell, `nan`, `None`, `[]`) → empty list
//! 2. `nan`/`None` tokens → `null` (word-boundary, names keep their letters)
//! 3. missing `, ` inserted at every `}`…`{` adjacency
//! 4. single quotes → double quotes, bare record run wrapped in `[` `]`
//! 5. JSON parse; records are field-extracted tolerantly

use crate::types::CandidateMatch;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::warn;

lazy_static! {
    static ref MISSING_SEPARATOR_RE: Regex = Regex::new(r"\}\s*\{").unwrap();
    static ref NAN_TOKEN_RE: Regex = Regex::new(r"\bnan\b").unwrap();
    static ref NONE_TOKEN_RE: Regex = Regex::new(r"\bNone\b").unwrap();
}

/// Whether a cell value denotes "no candidate data" outright.
pub fn is_missing_marker(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("nan")
        || trimmed.eq_ignore_ascii_case("none")
        || trimmed == "[]"
}

/// Repair a textual candidate-list literal and parse it.
///
/// Never fails: a cell that cannot be repaired into a parseable list is
/// logged and treated as "no additional matches". Well-formed JSON (such as
/// this tool's own re-exports) passes through unchanged, so the operation
/// is idempotent over its own output.
pub fn repair_candidates(raw: &str) -> Vec<CandidateMatch> {
    if is_missing_marker(raw) {
        return Vec::new();
    }

    let repaired = repair_text(raw);

    match serde_json::from_str::<Vec<Value>>(&repaired) {
        Ok(values) => values.iter().filter_map(candidate_from_value).collect(),
        Err(err) => {
            warn!(error = %err, text = raw, "could not parse candidate list, treating as empty");
            Vec::new()
        }
    }
}

/// Textual repair: broken Python-style literal → JSON candidate.
fn repair_text(raw: &str) -> String {
    let mut text = raw.trim().to_string();

    text = NAN_TOKEN_RE.replace_all(&text, "null").into_owned();
    text = NONE_TOKEN_RE.replace_all(&text, "null").into_owned();
    text = MISSING_SEPARATOR_RE.replace_all(&text, "}, {").into_owned();
    text = text.replace('\'', "\"");

    // A bare run of records has no surrounding list literal.
    if text.starts_with('{') {
        text = format!("[{}]", text);
    }

    text
}

/// Extract one candidate record from a parsed mapping.
///
/// Tolerant on purpose: ids arrive as `5` or `5.0`, any field may be null,
/// and non-mapping entries are skipped.
fn candidate_from_value(value: &Value) -> Option<CandidateMatch> {
    let obj = value.as_object()?;
    Some(CandidateMatch {
        id: obj.get("id").and_then(value_as_i64),
        tree_name: obj
            .get("tree_name")
            .and_then(Value::as_str)
            .map(|s| s.to_string()),
        location_x: obj.get("location_x").and_then(Value::as_f64),
        location_y: obj.get("location_y").and_then(Value::as_f64),
    })
}

fn value_as_i64(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| value.as_f64().map(|f| f as i64))
}
