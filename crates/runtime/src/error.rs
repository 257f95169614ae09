//! Error types for the CRM runtime.

use crm_protocol::EncodeError;
use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by connections, sessions, and the session registry.
///
/// Every kind is distinct so callers can tell recoverable conditions (an
/// expired login) from fatal ones (a wrong base URL).
#[derive(Debug, Error)]
pub enum Error {
	/// A required credential (`base_url`, `username` or `password`) was absent or empty.
	#[error("Missing credentials: {field} is required")]
	MissingCredentials { field: &'static str },

	/// The login call was answered without a session id.
	#[error("Login failed: {0}")]
	LoginError(String),

	/// The remote answered 404, or the base URL could not be used.
	#[error("Invalid CRM URL: {url}")]
	InvalidUrl { url: String },

	/// The remote answered 500 for a request.
	#[error("Invalid request: {request}")]
	InvalidRequest { request: String },

	/// A 200 response carried no body.
	#[error("Empty response to '{method}'")]
	EmptyResponse { method: String },

	/// Any status other than 200, 404 or 500.
	#[error("Unhandled response to '{method}': HTTP {status}")]
	UnhandledResponse { method: String, status: u16 },

	/// `current()` was asked for with no session active.
	#[error("No active session")]
	NoActiveSession,

	/// `current()` was asked for while several sessions are active.
	#[error("{count} sessions are active; use a specific session instead of the current one")]
	MultipleSessions { count: usize },

	/// The session was disconnected and can no longer be used.
	#[error("Session {namespace} is not active")]
	SessionNotActive { namespace: String },

	/// A call was attempted without a started transport.
	#[error("Not connected")]
	NotConnected,

	/// A namespace is already backing a different session.
	#[error("Namespace {namespace} is already in use")]
	NamespaceInUse { namespace: String },

	/// A namespace was released and cannot be activated again.
	#[error("Namespace {namespace} has been released")]
	NamespaceReleased { namespace: String },

	/// Transport failure below the HTTP status level (DNS, TLS, reset).
	#[error("Transport error: {0}")]
	Transport(String),

	/// Configuration could not be loaded or was malformed.
	#[error("Configuration error: {0}")]
	Config(String),

	/// A request could not be encoded.
	#[error("Encode error: {0}")]
	Encode(#[from] EncodeError),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	/// I/O error.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}

impl Error {
	/// Returns true for credential and login failures.
	pub fn is_auth_error(&self) -> bool {
		matches!(self, Error::MissingCredentials { .. } | Error::LoginError(_))
	}

	/// Returns true for classified protocol failures.
	pub fn is_protocol_error(&self) -> bool {
		matches!(
			self,
			Error::InvalidUrl { .. }
				| Error::InvalidRequest { .. }
				| Error::EmptyResponse { .. }
				| Error::UnhandledResponse { .. }
		)
	}

	/// Returns true for errors that come from local session state alone.
	pub fn is_session_state_error(&self) -> bool {
		matches!(
			self,
			Error::NoActiveSession
				| Error::MultipleSessions { .. }
				| Error::SessionNotActive { .. }
				| Error::NamespaceInUse { .. }
				| Error::NamespaceReleased { .. }
		)
	}
}

impl From<reqwest::Error> for Error {
	fn from(err: reqwest::Error) -> Self {
		Error::Transport(err.to_string())
	}
}
