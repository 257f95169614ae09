use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};
use url::Url;

use super::{Connector, Endpoint, RawResponse, Transport, TransportFuture};
use crate::error::{Error, Result};
use crate::options::{ConnectionOptions, TlsVerification};

/// Opens [`HttpTransport`]s with `reqwest`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpConnector;

impl Connector for HttpConnector {
	fn open(&self, endpoint: &Endpoint, options: &ConnectionOptions) -> Result<Box<dyn Transport>> {
		Ok(Box::new(HttpTransport::start(endpoint, options)?))
	}
}

/// HTTP/HTTPS transport bound to one endpoint.
pub struct HttpTransport {
	client: reqwest::Client,
	endpoint: Endpoint,
	started: AtomicBool,
}

impl HttpTransport {
	/// Builds the client and marks the transport started.
	pub fn start(endpoint: &Endpoint, options: &ConnectionOptions) -> Result<Self> {
		let mut builder = reqwest::Client::builder();

		if endpoint.secure && options.tls == TlsVerification::AcceptInvalidCerts {
			warn!(
				target = "crm.transport",
				host = %endpoint.host,
				"TLS certificate verification disabled"
			);
			builder = builder.danger_accept_invalid_certs(true);
		}
		if let Some(timeout) = options.timeout {
			builder = builder.timeout(timeout);
		}

		let client = builder
			.build()
			.map_err(|e| Error::Transport(format!("Failed to create HTTP client: {e}")))?;

		debug!(
			target = "crm.transport",
			host = %endpoint.host,
			port = endpoint.port,
			secure = endpoint.secure,
			"transport started"
		);

		Ok(Self {
			client,
			endpoint: endpoint.clone(),
			started: AtomicBool::new(true),
		})
	}

	pub fn endpoint(&self) -> &Endpoint {
		&self.endpoint
	}
}

impl Transport for HttpTransport {
	fn get(&self, url: Url) -> TransportFuture<'_> {
		Box::pin(async move {
			if !self.is_started() {
				return Err(Error::NotConnected);
			}
			let response = self.client.get(url).send().await?;
			let status = response.status();
			let body = response.text().await?;
			Ok(RawResponse::new(status, Some(body)))
		})
	}

	fn is_started(&self) -> bool {
		self.started.load(Ordering::SeqCst)
	}

	fn close(&self) {
		if self.started.swap(false, Ordering::SeqCst) {
			debug!(target = "crm.transport", host = %self.endpoint.host, "transport closed");
		}
	}
}
