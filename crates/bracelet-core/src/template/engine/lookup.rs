//! Context lookup and output escaping for template rendering

use serde_json::Value;

/// Resolve a path of segments below `data`
///
/// Object segments are keys, array segments are indices. An empty path is
/// the context itself.
pub(crate) fn resolve_path<'a>(data: &'a Value, path: &[String]) -> Option<&'a Value> {
    let mut current = data;

    for part in path {
        current = match current {
            Value::Object(map) => map.get(part)?,
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}

/// Escape text for `{{...}}` output
pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '`' => out.push_str("&#x60;"),
            '=' => out.push_str("&#x3D;"),
            _ => out.push(c),
        }
    }
    out
}
