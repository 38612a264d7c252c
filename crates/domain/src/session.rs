//! Session artifacts and their structural validation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::proxy_log::ProxyLog;
use crate::settings::ProxySettings;

/// Snapshot of captured traffic plus settings, as exported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionArtifact {
    /// Captured exchanges.
    pub logs: Vec<ProxyLog>,
    /// Backend settings at export time.
    pub settings: ProxySettings,
    /// Export time (ISO-8601).
    pub timestamp: String,
}

/// Outcome of validating untrusted input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation<T> {
    /// The input type-checks; carries the typed value.
    Valid(T),
    /// The input was rejected; carries the first failing path and rule.
    Invalid(String),
}

impl<T> Validation<T> {
    /// Returns true for `Valid`.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// Converts into a `Result`.
    ///
    /// # Errors
    ///
    /// Returns the rejection reason for `Invalid`.
    pub fn into_result(self) -> Result<T, String> {
        match self {
            Self::Valid(value) => Ok(value),
            Self::Invalid(reason) => Err(reason),
        }
    }
}

type Check = Result<(), String>;

/// Optional upstream proxy settings, each of which may also be null.
const UPSTREAM_FIELDS: [(&str, fn(&Value) -> bool, &str); 4] = [
    ("upstream_proxy_host", Value::is_string, "a string"),
    ("upstream_proxy_port", Value::is_number, "a number"),
    ("upstream_proxy_username", Value::is_string, "a string"),
    ("upstream_proxy_password", Value::is_string, "a string"),
];

fn object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, String> {
    value
        .as_object()
        .ok_or_else(|| format!("{path} must be an object"))
}

fn require_string(obj: &Map<String, Value>, key: &str, path: &str) -> Check {
    match obj.get(key) {
        Some(Value::String(_)) => Ok(()),
        _ => Err(format!("{path}.{key} must be a string")),
    }
}

fn require_number(obj: &Map<String, Value>, key: &str, path: &str) -> Check {
    match obj.get(key) {
        Some(Value::Number(_)) => Ok(()),
        _ => Err(format!("{path}.{key} must be a number")),
    }
}

fn require_bool(obj: &Map<String, Value>, key: &str, path: &str) -> Check {
    match obj.get(key) {
        Some(Value::Bool(_)) => Ok(()),
        _ => Err(format!("{path}.{key} must be a boolean")),
    }
}

fn optional_string(obj: &Map<String, Value>, key: &str, path: &str) -> Check {
    match obj.get(key) {
        None | Some(Value::Null | Value::String(_)) => Ok(()),
        _ => Err(format!("{path}.{key} must be a string when present")),
    }
}

fn nullable(
    obj: &Map<String, Value>,
    key: &str,
    path: &str,
    predicate: fn(&Value) -> bool,
    kind: &str,
) -> Check {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(()),
        Some(value) if predicate(value) => Ok(()),
        Some(_) => Err(format!("{path}.{key} must be {kind} or null")),
    }
}

fn string_map(obj: &Map<String, Value>, key: &str, path: &str) -> Check {
    let headers = obj
        .get(key)
        .and_then(Value::as_object)
        .ok_or_else(|| format!("{path}.{key} must be an object"))?;
    match headers.iter().find(|(_, v)| !v.is_string()) {
        Some((name, _)) => Err(format!("{path}.{key}.{name} must be a string")),
        None => Ok(()),
    }
}

fn check_request(value: &Value, path: &str) -> Check {
    let request = object(value, path)?;
    require_string(request, "method", path)?;
    require_string(request, "url", path)?;
    string_map(request, "headers", path)?;
    nullable(request, "content", path, Value::is_string, "a string")
}

fn check_response(value: &Value, path: &str) -> Check {
    let response = object(value, path)?;
    require_number(response, "status_code", path)?;
    string_map(response, "headers", path)?;
    nullable(response, "content", path, Value::is_string, "a string")
}

fn check_log(value: &Value, path: &str) -> Check {
    let log = object(value, path)?;
    require_number(log, "id", path)?;
    require_string(log, "timestamp", path)?;
    optional_string(log, "method", path)?;
    optional_string(log, "url", path)?;
    optional_string(log, "error", path)?;

    match log.get("status") {
        None | Some(Value::Null | Value::Number(_)) => {}
        Some(Value::String(s)) if s == "pending" || s == "error" => {}
        Some(_) => {
            return Err(format!(
                "{path}.status must be a number, \"pending\" or \"error\""
            ));
        }
    }

    nullable(log, "content_length", path, Value::is_number, "a number")?;

    let present = |key: &str| log.get(key).filter(|v| !v.is_null());
    if let Some(request) = present("request") {
        check_request(request, &format!("{path}.request"))?;
    }
    if let Some(response) = present("response") {
        check_response(response, &format!("{path}.response"))?;
    }

    let top_level = present("method").is_some() && present("url").is_some();
    if !top_level && present("request").is_none() {
        return Err(format!(
            "{path} must carry method and url, at top level or in request"
        ));
    }
    Ok(())
}

fn check_settings(value: &Value) -> Check {
    let path = "settings";
    let settings = object(value, path)?;
    require_number(settings, "proxy_port", path)?;
    require_number(settings, "ui_port", path)?;
    require_string(settings, "debug_level", path)?;
    require_bool(settings, "enable_filtering", path)?;
    require_bool(settings, "upstream_proxy_enabled", path)?;
    require_bool(settings, "upstream_proxy_auth", path)?;

    let rules = settings
        .get("filter_rules")
        .and_then(Value::as_array)
        .ok_or_else(|| format!("{path}.filter_rules must be an array"))?;
    if rules.iter().any(|r| !r.is_string()) {
        return Err(format!("{path}.filter_rules must contain only strings"));
    }

    for (key, predicate, kind) in UPSTREAM_FIELDS {
        nullable(settings, key, path, predicate, kind)?;
    }
    Ok(())
}

fn check_artifact(value: &Value) -> Check {
    let root = object(value, "session")?;
    let logs = root
        .get("logs")
        .and_then(Value::as_array)
        .ok_or("session.logs must be an array")?;
    for (index, log) in logs.iter().enumerate() {
        check_log(log, &format!("logs[{index}]"))?;
    }
    check_settings(root.get("settings").unwrap_or(&Value::Null))?;
    require_string(root, "timestamp", "session")
}

/// Checks that a parsed JSON value is a well-formed session artifact.
///
/// Every log entry and settings field is type-checked; a single malformed
/// entry rejects the whole artifact. Numbers and strings are never coerced
/// into each other.
#[must_use]
pub fn validate_session(value: &Value) -> Validation<SessionArtifact> {
    if let Err(reason) = check_artifact(value) {
        return Validation::Invalid(reason);
    }
    // Ranges the structural pass cannot see (negative ids, ports over 65535).
    match SessionArtifact::deserialize(value) {
        Ok(artifact) => Validation::Valid(artifact),
        Err(e) => Validation::Invalid(e.to_string()),
    }
}
