//! Interpretation of rendered template output.

use crate::error::{Result, TfInventoryError};
use crate::template::try_parse_literal;
use crate::types::HostVars;
use serde_json::Value;

/// Non-empty, trimmed lines of a rendered template.
pub fn non_empty_lines(rendered: &str) -> impl Iterator<Item = &str> {
    rendered.lines().map(str::trim).filter(|line| !line.is_empty())
}

/// Interpret the filter template output.
///
/// # Errors
///
/// Returns `InvalidFilterResult` unless the trimmed output is exactly
/// `True` or `False`.
pub fn parse_filter_result(resource: &str, rendered: &str) -> Result<bool> {
    match rendered.trim() {
        "True" => Ok(true),
        "False" => Ok(false),
        other => Err(crate::err!(InvalidFilterResult {
            resource: resource.to_string(),
            output: other.to_string(),
        })),
    }
}

/// Group names from the groups template output.
pub fn parse_groups(rendered: &str) -> Vec<String> {
    let mut groups: Vec<String> = Vec::new();
    for line in non_empty_lines(rendered) {
        if !groups.iter().any(|g| g == line) {
            groups.push(line.to_string());
        }
    }
    groups
}

/// Parse one `key=value` line, splitting on the first `=`.
///
/// The value is stored structured if it is a list or mapping literal,
/// otherwise as the trimmed string.
///
/// # Errors
///
/// Returns `InvalidHostVarLine` if there is no `=` or the key is empty.
pub fn parse_host_var_line(resource: &str, line: &str) -> Result<(String, Value)> {
    let invalid = || {
        crate::err!(InvalidHostVarLine {
            resource: resource.to_string(),
            line: line.to_string(),
        })
    };

    let (key, raw) = line.split_once('=').ok_or_else(invalid)?;
    let key = key.trim();
    if key.is_empty() {
        return Err(invalid());
    }

    let raw = raw.trim();
    let value = try_parse_literal(raw).unwrap_or_else(|| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

/// Host variables from the host-vars template output.
///
/// Invalid lines are skipped and returned alongside the variables. A key
/// repeated on several lines keeps its last value.
pub fn parse_host_vars(resource: &str, rendered: &str) -> (HostVars, Vec<TfInventoryError>) {
    let mut vars = HostVars::new();
    let mut errors = Vec::new();

    for line in non_empty_lines(rendered) {
        match parse_host_var_line(resource, line) {
            Ok((key, value)) => {
                tracing::trace!(resource = %resource, key = %key, "host_var set");
                vars.insert(key, value);
            }
            Err(e) => errors.push(e),
        }
    }

    (vars, errors)
}
