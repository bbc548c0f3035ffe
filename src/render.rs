//! Value rendering for log lines.
//!
//! Converts argument and result values into the text form used in log
//! records. Structured values render as compact JSON so the lines stay
//! machine-parseable; scalar strings render raw so path and query values
//! read naturally.

use serde::Serialize;
use serde_json::Value;

use crate::types::BuildError;

/// Placeholder token for response-sink arguments, which must never be dumped.
pub(crate) const RESPONSE_TOKEN: &str = "response";

/// Placeholder token for session arguments.
pub(crate) const SESSION_TOKEN: &str = "session";

/// Render a JSON value to its log-line text form.
///
/// Objects, arrays, numbers, booleans and `null` use their compact JSON
/// encoding. A top-level string renders without surrounding quotes.
pub(crate) fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render a handler's returned value for the response record.
pub(crate) fn render_result<T: Serialize>(value: &T) -> Result<String, BuildError> {
    Ok(render_value(&serde_json::to_value(value)?))
}
