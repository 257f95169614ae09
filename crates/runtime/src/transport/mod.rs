//! Transport layer for REST calls.
//!
//! A [`Connector`] opens a [`Transport`] to one [`Endpoint`]; the transport
//! issues GET requests and hands back the raw status and body. Classifying
//! responses is the connection's job, not the transport's.
//!
//! - [`HttpConnector`]: `reqwest`-backed HTTP/HTTPS transport.
//! - [`StubConnector`]: scripted in-memory transport for tests.

use std::future::Future;
use std::pin::Pin;

pub use reqwest::StatusCode;
use url::Url;

use crate::error::{Error, Result};
use crate::options::ConnectionOptions;

mod http;
pub mod stub;


pub use http::{HttpConnector, HttpTransport};
pub use stub::{StubCall, StubConnector};

/// Boxed future returned by [`Transport::get`].
pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<RawResponse>> + Send + 'a>>;

/// Where a connection points: the resolved service URL plus its socket address parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
	pub url: Url,
	pub host: String,
	pub port: u16,
	pub secure: bool,
}

impl Endpoint {
	/// Derives `(host, port)` from `url`. Only `http` and `https` are accepted.
	pub fn from_url(url: &Url) -> Result<Self> {
		let secure = match url.scheme() {
			"https" => true,
			"http" => false,
			_ => {
				return Err(Error::InvalidUrl {
					url: url.to_string(),
				});
			}
		};
		let host = url
			.host_str()
			.filter(|h| !h.is_empty())
			.ok_or_else(|| Error::InvalidUrl {
				url: url.to_string(),
			})?
			.to_string();
		let port = url.port_or_known_default().unwrap_or(if secure { 443 } else { 80 });

		Ok(Self {
			url: url.clone(),
			host,
			port,
			secure,
		})
	}
}

/// Unclassified transport response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
	pub status: StatusCode,
	/// `None` when the server sent no body (or only whitespace).
	pub body: Option<String>,
}

impl RawResponse {
	pub fn new(status: StatusCode, body: Option<String>) -> Self {
		let body = body.filter(|b| !b.trim().is_empty());
		Self { status, body }
	}

	/// 200 with a JSON body.
	pub fn json(body: &serde_json::Value) -> Self {
		Self::new(StatusCode::OK, Some(body.to_string()))
	}

	/// Bare status, no body.
	pub fn status(status: StatusCode) -> Self {
		Self::new(status, None)
	}
}

/// A live channel to one endpoint.
pub trait Transport: Send + Sync {
	/// Issues a GET for `url`.
	fn get(&self, url: Url) -> TransportFuture<'_>;

	/// Returns true once started and until closed.
	fn is_started(&self) -> bool;

	/// Tears the transport down. Later `get` calls fail with [`Error::NotConnected`].
	fn close(&self);
}

/// Opens transports. Shared by every connection a registry creates.
pub trait Connector: Send + Sync {
	fn open(&self, endpoint: &Endpoint, options: &ConnectionOptions) -> Result<Box<dyn Transport>>;
}
