//! Authenticated connection to one CRM instance.
//!
//! A [`Connection`] owns one transport and the login state on top of it.
//!
//! # Call flow
//!
//! 1. [`Connection::send`] encodes the call with [`Request`]
//! 2. The transport issues a GET and returns the raw status/body
//! 3. [`classify`] maps the status to a decoded body or a named error
//! 4. A `result_count` of zero comes back as `Ok(None)`

use std::fmt;
use std::sync::Arc;

use crm_protocol::{
	LoginParams, LoginResult, Request, SessionParams, methods, resolve_service_url, result_count,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::options::ConnectionOptions;
use crate::transport::{Connector, Endpoint, RawResponse, StatusCode, Transport};


/// Physical transport plus authentication state.
///
/// `session_token` is set iff the last login succeeded; `transport` is set iff
/// a transport has been opened and not torn down.
pub struct Connection {
	endpoint: Endpoint,
	username: String,
	password: String,
	session_token: Option<String>,
	user_id: Option<String>,
	transport: Option<Box<dyn Transport>>,
	connector: Arc<dyn Connector>,
	last_request: Option<Request>,
	last_response: Option<RawResponse>,
	options: ConnectionOptions,
}

impl fmt::Debug for Connection {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Connection")
			.field("url", &self.endpoint.url.as_str())
			.field("username", &self.username)
			.field("logged_in", &self.is_logged_in())
			.field("connected", &self.is_connected())
			.field("options", &self.options)
			.finish_non_exhaustive()
	}
}

impl Connection {
	/// Builds an unconnected connection, resolving the service URL.
	///
	/// Fails before any I/O if a credential is empty or the URL is unusable.
	pub fn new(
		base_url: &str,
		username: &str,
		password: &str,
		options: ConnectionOptions,
		connector: Arc<dyn Connector>,
	) -> Result<Self> {
		for (field, value) in [("base_url", base_url), ("username", username), ("password", password)] {
			if is_blank_credential(value) {
				return Err(Error::MissingCredentials { field });
			}
		}

		let parsed = Url::parse(base_url.trim()).map_err(|_| Error::InvalidUrl {
			url: base_url.to_string(),
		})?;
		let endpoint = Endpoint::from_url(&resolve_service_url(parsed))?;

		Ok(Self {
			endpoint,
			username: username.to_string(),
			password: password.to_string(),
			session_token: None,
			user_id: None,
			transport: None,
			connector,
			last_request: None,
			last_response: None,
			options,
		})
	}

	/// Builds a connection, opens its transport and logs in.
	pub async fn open(
		base_url: &str,
		username: &str,
		password: &str,
		options: ConnectionOptions,
		connector: Arc<dyn Connector>,
	) -> Result<Self> {
		let mut connection = Self::new(base_url, username, password, options, connector)?;
		connection.connect()?;
		connection.login().await?;
		Ok(connection)
	}

	/// Opens a transport to the endpoint, replacing any previous one.
	pub fn connect(&mut self) -> Result<()> {
		if let Some(old) = self.transport.take() {
			old.close();
		}
		let transport = self.connector.open(&self.endpoint, &self.options)?;
		debug!(
			target = "crm.connection",
			host = %self.endpoint.host,
			port = self.endpoint.port,
			"connected"
		);
		self.transport = Some(transport);
		Ok(())
	}

	/// Authenticates and stores the session token.
	pub async fn login(&mut self) -> Result<()> {
		self.session_token = None;
		self.user_id = None;

		let params = LoginParams::new(&self.username, &self.password, &self.options.application);
		// Anything but an object carrying a non-empty `id` is a rejected login.
		let result = self
			.send(methods::LOGIN, &params)
			.await?
			.filter(Value::is_object)
			.and_then(|body| serde_json::from_value::<LoginResult>(body).ok())
			.unwrap_or_default();

		let Some(token) = result.session_id() else {
			let reason = result.failure_reason().unwrap_or("Invalid Login").to_string();
			warn!(target = "crm.connection", user = %self.username, %reason, "login rejected");
			return Err(Error::LoginError(reason));
		};

		self.session_token = Some(token.to_string());
		self.user_id = result.user_id();
		info!(
			target = "crm.connection",
			user = %self.username,
			url = %self.endpoint.url,
			"logged in"
		);
		Ok(())
	}

	/// Ends the remote session. The transport stays open.
	pub async fn logout(&mut self) -> Result<()> {
		let Some(token) = self.session_token.clone() else {
			return Ok(());
		};
		let outcome = self.send(methods::LOGOUT, &SessionParams::new(token)).await;
		self.session_token = None;
		self.user_id = None;
		outcome.map(|_| ())
	}

	/// Tears down the transport.
	pub fn close(&mut self) {
		if let Some(transport) = self.transport.take() {
			transport.close();
			debug!(target = "crm.connection", host = %self.endpoint.host, "disconnected");
		}
	}

	pub fn is_connected(&self) -> bool {
		self.transport.as_ref().is_some_and(|t| t.is_started())
	}

	pub fn is_logged_in(&self) -> bool {
		self.session_token.is_some()
	}

	pub fn session_token(&self) -> Option<&str> {
		self.session_token.as_deref()
	}

	/// User id reported at login.
	pub fn user_id(&self) -> Option<&str> {
		self.user_id.as_deref()
	}

	/// Resolved service URL.
	pub fn url(&self) -> &Url {
		&self.endpoint.url
	}

	pub fn username(&self) -> &str {
		&self.username
	}

	pub fn options(&self) -> &ConnectionOptions {
		&self.options
	}

	pub fn last_request(&self) -> Option<&Request> {
		self.last_request.as_ref()
	}

	pub fn last_response(&self) -> Option<&RawResponse> {
		self.last_response.as_ref()
	}

	/// Sends `method` with `payload` and decodes the JSON reply.
	///
	/// Returns `Ok(None)` when the server reports `result_count == 0`.
	pub async fn send<P: Serialize + ?Sized>(&mut self, method: &str, payload: &P) -> Result<Option<Value>> {
		let json = serde_json::to_string(payload)?;
		let request = Request::new(self.endpoint.url.clone(), method, json, self.options.debug)?;

		if self.options.dumps(method) && method != methods::LOGIN {
			debug!(target = "crm.connection", method, request = %request, "sending request");
		} else {
			trace!(target = "crm.connection", method, "sending request");
		}

		let transport = self.transport.as_ref().ok_or(Error::NotConnected)?;
		let response = transport.get(request.url()).await?;

		let outcome = classify(&request, &response, &self.options);
		self.last_request = Some(request);
		self.last_response = Some(response);
		outcome
	}

	/// Typed variant of [`send`](Self::send).
	pub async fn call<P, R>(&mut self, method: &str, payload: &P) -> Result<Option<R>>
	where
		P: Serialize + ?Sized,
		R: DeserializeOwned,
	{
		match self.send(method, payload).await? {
			Some(value) => Ok(Some(serde_json::from_value(value)?)),
			None => Ok(None),
		}
	}
}

/// Whether `value` counts as an absent credential: empty or whitespace only.
pub fn is_blank_credential(value: &str) -> bool {
	value.trim().is_empty()
}

/// Classifies a raw response. First match wins:
///
/// 1. `200` → decoded body (`None` for `result_count == 0`)
/// 2. `404` → [`Error::InvalidUrl`]
/// 3. `500` → [`Error::InvalidRequest`]
/// 4. anything else → [`Error::UnhandledResponse`]
pub fn classify(request: &Request, response: &RawResponse, options: &ConnectionOptions) -> Result<Option<Value>> {
	match response.status {
		StatusCode::OK => decode(request, response, options),
		StatusCode::NOT_FOUND => Err(Error::InvalidUrl {
			url: request.base_url().to_string(),
		}),
		StatusCode::INTERNAL_SERVER_ERROR => Err(Error::InvalidRequest {
			request: request.to_string(),
		}),
		status => {
			if options.debug {
				warn!(
					target = "crm.connection",
					method = request.method(),
					%status,
					body = response.body.as_deref().unwrap_or_default(),
					"raw response"
				);
			}
			Err(Error::UnhandledResponse {
				method: request.method().to_string(),
				status: status.as_u16(),
			})
		}
	}
}

fn decode(request: &Request, response: &RawResponse, options: &ConnectionOptions) -> Result<Option<Value>> {
	let body = response.body.as_deref().ok_or_else(|| Error::EmptyResponse {
		method: request.method().to_string(),
	})?;
	let json: Value = serde_json::from_str(body)?;

	if result_count(&json) == Some(0) {
		debug!(target = "crm.connection", method = request.method(), "no results");
		return Ok(None);
	}

	if options.dumps(request.method()) {
		debug!(target = "crm.connection", method = request.method(), response = %json, "json response");
	}
	Ok(Some(json))
}
