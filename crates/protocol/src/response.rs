//! Helpers for inspecting decoded response bodies.

use serde_json::Value;

/// Returns the `result_count` of a response, when present and numeric.
///
/// A count of zero is the remote's way of saying "no data"; it is a
/// successful outcome, not an error.
pub fn result_count(body: &Value) -> Option<u64> {
	match body.get("result_count")? {
		Value::Number(n) => n.as_u64(),
		Value::String(s) => s.parse().ok(),
		_ => None,
	}
}

/// Extracts `user_id` from a `name_value_list`.
///
/// The list comes either keyed by name (`{"user_id": {"name": .., "value": ..}}`)
/// or as an array of `{"name", "value"}` entries, depending on server version.
pub fn user_id_from_name_value_list(list: &Value) -> Option<String> {
	let entry = match list {
		Value::Object(map) => map.get("user_id").cloned(),
		Value::Array(items) => items
			.iter()
			.find(|item| item.get("name").and_then(Value::as_str) == Some("user_id"))
			.cloned(),
		_ => None,
	}?;
	match entry.get("value")? {
		Value::String(s) if !s.is_empty() => Some(s.clone()),
		Value::Number(n) => Some(n.to_string()),
		_ => None,
	}
}
