//! Client configuration.
//!
//! Configuration is a JSON file, either flat or wrapped in a `config` key:
//!
//! ```json
//! { "config": { "base_url": "http://127.0.0.1/sugarcrm", "username": "admin", "password": "letmein" } }
//! ```

use std::fmt;
use std::fs;
use std::path::Path;

use crm_runtime::{ConnectionOptions, Error, Result, TlsVerification, is_blank_credential};
use serde::{Deserialize, Serialize};

/// Connection settings for one session.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub base_url: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub username: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub password: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub debug: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub register_modules: Option<bool>,
	/// `false` accepts self-signed certificates.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub verify_tls: Option<bool>,
}

impl fmt::Debug for ClientConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ClientConfig")
			.field("base_url", &self.base_url)
			.field("username", &self.username)
			.field("password", &self.password.as_ref().map(|_| "<redacted>"))
			.field("debug", &self.debug)
			.field("register_modules", &self.register_modules)
			.field("verify_tls", &self.verify_tls)
			.finish()
	}
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ConfigFile {
	Wrapped { config: ClientConfig },
	Flat(ClientConfig),
}

/// Validated credentials borrowed from a [`ClientConfig`].
#[derive(Debug, Clone, Copy)]
pub struct Credentials<'a> {
	pub base_url: &'a str,
	pub username: &'a str,
	pub password: &'a str,
}

impl ClientConfig {
	pub fn new(base_url: impl Into<String>, username: impl Into<String>, password: impl Into<String>) -> Self {
		Self {
			base_url: Some(base_url.into()),
			username: Some(username.into()),
			password: Some(password.into()),
			..Default::default()
		}
	}

	/// Reads a JSON config file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let content = fs::read_to_string(path)?;
		Self::from_json(&content)
			.map_err(|e| Error::Config(format!("{}: {e}", path.display())))
	}

	/// Parses a flat or `config`-wrapped JSON document.
	pub fn from_json(content: &str) -> Result<Self> {
		let file: ConfigFile = serde_json::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
		Ok(match file {
			ConfigFile::Wrapped { config } => config,
			ConfigFile::Flat(config) => config,
		})
	}

	pub fn with_debug(mut self, debug: bool) -> Self {
		self.debug = Some(debug);
		self
	}

	pub fn with_register_modules(mut self, register: bool) -> Self {
		self.register_modules = Some(register);
		self
	}

	pub fn with_verify_tls(mut self, verify: bool) -> Self {
		self.verify_tls = Some(verify);
		self
	}

	/// Returns the credentials, failing on the first absent or empty one.
	pub fn credentials(&self) -> Result<Credentials<'_>> {
		fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str> {
			value
				.as_deref()
				.filter(|v| !is_blank_credential(v))
				.ok_or(Error::MissingCredentials { field })
		}

		Ok(Credentials {
			base_url: required(&self.base_url, "base_url")?.trim(),
			username: required(&self.username, "username")?.trim(),
			password: required(&self.password, "password")?,
		})
	}

	/// Connection options with this config's overrides applied.
	pub fn connection_options(&self) -> ConnectionOptions {
		let mut options = ConnectionOptions::default();
		if let Some(debug) = self.debug {
			options = options.with_debug(debug);
		}
		if let Some(register) = self.register_modules {
			options = options.with_register_modules(register);
		}
		if self.verify_tls == Some(false) {
			options = options.with_tls(TlsVerification::AcceptInvalidCerts);
		}
		options
	}
}
