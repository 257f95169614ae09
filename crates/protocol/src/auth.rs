//! Login handshake payloads.

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::response::user_id_from_name_value_list;

/// Protocol version sent in [`UserAuth`].
pub const AUTH_VERSION: u8 = 2;

/// Hex-encoded MD5 digest of a clear-text password, as the `login` call expects.
pub fn password_digest(password: &str) -> String {
	format!("{:x}", Md5::digest(password.as_bytes()))
}

/// Credentials block of the `login` call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserAuth {
	pub user_name: String,
	/// Hex MD5 of the password, never the clear text.
	pub password: String,
	pub version: u8,
}

/// Arguments of the `login` call, in positional order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginParams {
	pub user_auth: UserAuth,
	pub application: String,
}

impl LoginParams {
	/// Builds login arguments, hashing `password`.
	pub fn new(user_name: &str, password: &str, application: &str) -> Self {
		Self {
			user_auth: UserAuth {
				user_name: user_name.to_string(),
				password: password_digest(password),
				version: AUTH_VERSION,
			},
			application: application.to_string(),
		}
	}
}

/// Single entry of a `name_value_list`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NameValue {
	pub name: String,
	#[serde(default)]
	pub value: Value,
}

/// Response of the `login` call.
///
/// A rejected login still answers 200, with `name`/`description` set and no `id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LoginResult {
	#[serde(default)]
	pub id: Option<String>,
	#[serde(default)]
	pub module_name: Option<String>,
	#[serde(default)]
	pub name_value_list: Option<Value>,
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub description: Option<String>,
}

impl LoginResult {
	/// Session token, if the login was accepted.
	pub fn session_id(&self) -> Option<&str> {
		self.id.as_deref().filter(|id| !id.is_empty())
	}

	/// Id of the authenticated user, if the server reported one.
	pub fn user_id(&self) -> Option<String> {
		self.name_value_list
			.as_ref()
			.and_then(user_id_from_name_value_list)
	}

	/// Server-supplied reason for a rejected login.
	pub fn failure_reason(&self) -> Option<&str> {
		self.description.as_deref().or(self.name.as_deref())
	}
}
