//! Payloads for the introspection calls the session layer relies on.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Arguments for calls that only take the session token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionParams {
	pub session: String,
}

impl SessionParams {
	pub fn new(session: impl Into<String>) -> Self {
		Self {
			session: session.into(),
		}
	}
}

/// Arguments of `get_module_fields`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModuleFieldsParams {
	pub session: String,
	pub module_name: String,
}

/// Response of `get_available_modules`.
///
/// Older servers list bare names; newer ones return objects with a `module_key`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AvailableModules {
	#[serde(default)]
	pub modules: Vec<Value>,
}

impl AvailableModules {
	/// Module names in server order, skipping entries with no usable name.
	pub fn names(&self) -> Vec<String> {
		self.modules
			.iter()
			.filter_map(|entry| match entry {
				Value::String(name) => Some(name.clone()),
				Value::Object(map) => map.get("module_key").and_then(Value::as_str).map(str::to_string),
				_ => None,
			})
			.filter(|name| !name.is_empty())
			.collect()
	}
}

/// Field description from `get_module_fields`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FieldInfo {
	pub name: String,
	#[serde(rename = "type", default)]
	pub field_type: String,
	#[serde(default)]
	pub label: String,
	/// Reported as `0`/`1` or a boolean depending on server version.
	#[serde(default)]
	pub required: Value,
	#[serde(default)]
	pub options: Value,
}

impl FieldInfo {
	pub fn is_required(&self) -> bool {
		match &self.required {
			Value::Bool(b) => *b,
			Value::Number(n) => n.as_i64().is_some_and(|n| n != 0),
			Value::String(s) => s == "1" || s.eq_ignore_ascii_case("true"),
			_ => false,
		}
	}
}

/// Response of `get_module_fields`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ModuleFields {
	#[serde(default)]
	pub module_name: String,
	#[serde(default)]
	pub table_name: Option<String>,
	/// Keyed by field name, or a plain array on some servers.
	#[serde(default)]
	pub module_fields: Value,
}

impl ModuleFields {
	/// Field descriptions keyed by field name.
	pub fn fields(&self) -> BTreeMap<String, FieldInfo> {
		let entries: Vec<Value> = match &self.module_fields {
			Value::Object(map) => map.values().cloned().collect(),
			Value::Array(items) => items.clone(),
			_ => Vec::new(),
		};
		entries
			.into_iter()
			.filter_map(|entry| serde_json::from_value::<FieldInfo>(entry).ok())
			.map(|field| (field.name.clone(), field))
			.collect()
	}
}

/// Response of `get_server_info`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerInfo {
	#[serde(default)]
	pub flavor: String,
	#[serde(default)]
	pub version: String,
	#[serde(default)]
	pub gmt_time: String,
}
