//! Request codec for the REST dialect.
//!
//! A call is a plain GET against the service endpoint with the method name
//! and JSON-encoded arguments carried in the query string:
//!
//! ```text
//! <base>/service/v2/rest.php?method=<name>&input_type=JSON&response_type=JSON&rest_data=<json>
//! ```
//!
//! The parameter names are fixed by the remote service.

use std::fmt;

use thiserror::Error;
use url::Url;

/// Path of the REST service relative to the instance root.
pub const SERVICE_PATH: &str = "/service/v2/rest.php";

const SERVICE_SUFFIX: &str = "rest.php";

/// Failure to build a [`Request`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
	/// Method name was empty or whitespace.
	#[error("method name must not be empty")]
	EmptyMethod,
}

/// Appends [`SERVICE_PATH`] to `url` unless its path already ends in `rest.php`.
pub fn resolve_service_url(mut url: Url) -> Url {
	if url.path().ends_with(SERVICE_SUFFIX) {
		return url;
	}
	let path = format!("{}{}", url.path().trim_end_matches('/'), SERVICE_PATH);
	url.set_path(&path);
	url
}

/// A single outbound call. Built per call and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
	base_url: Url,
	method: String,
	json: String,
	debug: bool,
}

impl Request {
	/// Builds a request for `method` with an already-serialized JSON payload.
	pub fn new(
		base_url: Url,
		method: impl Into<String>,
		json: impl Into<String>,
		debug: bool,
	) -> Result<Self, EncodeError> {
		let method = method.into();
		if method.trim().is_empty() {
			return Err(EncodeError::EmptyMethod);
		}
		Ok(Self {
			base_url,
			method,
			json: json.into(),
			debug,
		})
	}

	pub fn method(&self) -> &str {
		&self.method
	}

	pub fn json(&self) -> &str {
		&self.json
	}

	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	pub fn is_debug(&self) -> bool {
		self.debug
	}

	/// Fully-qualified call URL.
	pub fn url(&self) -> Url {
		let mut url = self.base_url.clone();
		url.query_pairs_mut()
			.append_pair("method", &self.method)
			.append_pair("input_type", "JSON")
			.append_pair("response_type", "JSON")
			.append_pair("rest_data", &self.json);
		url
	}
}

impl fmt::Display for Request {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.url())
	}
}
