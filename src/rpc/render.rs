//! Response rendering.

use super::shape::Record;

/// Serialize a response record as JSON text, indented when `pretty`.
pub fn render_response(response: &Record, pretty: bool) -> String {
    let rendered = if pretty {
        serde_json::to_string_pretty(response)
    } else {
        serde_json::to_string(response)
    };
    rendered.unwrap_or_else(|_| "<unserializable response>".into())
}
