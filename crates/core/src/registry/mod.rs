//! Session registry: the namespace multiplexer.
//!
//! Tracks every live [`Session`], gives each its own [`NamespaceId`], and
//! exposes [`current`](SessionRegistry::current) for the common single-session
//! case. The registry is an explicit service, not a global: build one per
//! application (or per test) and create sessions through it.
//!
//! All mutations go through one `parking_lot` mutex that is never held across
//! an `.await`, so sessions can be created and dropped from several tasks.

use std::path::Path;
use std::sync::Arc;

use crm_runtime::{Connection, ConnectionOptions, Connector, HttpConnector, Result, TlsVerification};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::modules::{ModuleExtension, ModuleSet};
use crate::namespace::{NamespaceId, NamespaceState};
use crate::session::Session;

mod state;

#[cfg(test)]
mod tests;

pub(crate) use state::RegistryState;

pub(crate) struct Shared {
	pub(crate) state: Mutex<RegistryState<Session>>,
	connector: Arc<dyn Connector>,
}

/// Process-level session bookkeeping. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SessionRegistry {
	shared: Arc<Shared>,
}

impl Default for SessionRegistry {
	fn default() -> Self {
		Self::new()
	}
}

impl SessionRegistry {
	/// Registry whose sessions talk HTTP(S) through `reqwest`.
	pub fn new() -> Self {
		Self::with_connector(Arc::new(HttpConnector))
	}

	/// Registry whose sessions open transports through `connector`.
	pub fn with_connector(connector: Arc<dyn Connector>) -> Self {
		Self {
			shared: Arc::new(Shared {
				state: Mutex::new(RegistryState::default()),
				connector,
			}),
		}
	}

	/// Logs in with `config` and returns the new, active session.
	///
	/// Fails with `MissingCredentials` before any I/O if url, username or
	/// password is absent.
	pub async fn connect(&self, config: ClientConfig) -> Result<Session> {
		let options = config.connection_options();
		self.open_session(config, options).await
	}

	/// Logs in with explicit credentials and options.
	pub async fn connect_with_credentials(
		&self,
		base_url: &str,
		username: &str,
		password: &str,
		options: ConnectionOptions,
	) -> Result<Session> {
		let config = ClientConfig::new(base_url, username, password)
			.with_debug(options.debug)
			.with_register_modules(options.register_modules)
			.with_verify_tls(options.tls == TlsVerification::Strict);
		self.open_session(config, options).await
	}

	/// Loads a JSON config file and logs in with it.
	pub async fn connect_from_file(&self, path: impl AsRef<Path>) -> Result<Session> {
		self.connect(ClientConfig::load(path)?).await
	}

	async fn open_session(&self, config: ClientConfig, options: ConnectionOptions) -> Result<Session> {
		let credentials = config.credentials()?;
		let (base_url, username, password) = (
			credentials.base_url.to_string(),
			credentials.username.to_string(),
			credentials.password.to_string(),
		);

		let namespace = self.shared.state.lock().allocate();
		debug!(target = "crm.registry", %namespace, url = %base_url, "namespace allocated");

		let register_modules = options.register_modules;
		let connection = match Connection::open(
			&base_url,
			&username,
			&password,
			options,
			Arc::clone(&self.shared.connector),
		)
		.await
		{
			Ok(connection) => connection,
			Err(e) => {
				self.shared.state.lock().release(namespace);
				debug!(target = "crm.registry", %namespace, error = %e, "login failed; namespace released");
				return Err(e);
			}
		};

		let session = Session::new(namespace, config, connection, Arc::downgrade(&self.shared));

		if register_modules {
			if let Err(e) = session.register_modules().await {
				session.abandon().await;
				return Err(e);
			}
		}

		let activated = self.shared.state.lock().activate(namespace, session.clone());
		if let Err(e) = activated {
			session.abandon().await;
			return Err(e);
		}
		info!(target = "crm.registry", %namespace, url = %base_url, "session active");
		Ok(session)
	}

	/// The sole active session.
	///
	/// Fails with `NoActiveSession` when none is active and with
	/// `MultipleSessions` when more than one is; never picks one.
	pub fn current(&self) -> Result<Session> {
		self.shared.state.lock().current()
	}

	/// Currently active sessions, ordered by namespace.
	pub fn sessions(&self) -> Vec<Session> {
		self.shared.state.lock().sessions()
	}

	pub fn session(&self, namespace: NamespaceId) -> Option<Session> {
		self.shared.state.lock().session(namespace)
	}

	/// Namespaces backing a live session.
	pub fn namespaces(&self) -> Vec<NamespaceId> {
		self.shared.state.lock().active_namespaces()
	}

	/// Every namespace ever handed out, live or retired.
	pub fn used_namespaces(&self) -> Vec<NamespaceId> {
		self.shared.state.lock().used_namespaces()
	}

	pub fn namespace_state(&self, namespace: NamespaceId) -> NamespaceState {
		self.shared.state.lock().state(namespace)
	}

	/// Module definitions registered for `namespace`.
	pub fn modules(&self, namespace: NamespaceId) -> Option<ModuleSet> {
		self.shared.state.lock().modules(namespace).cloned()
	}

	/// Registers `extension` for all current and future namespaces.
	pub fn add_extension(&self, extension: Arc<dyn ModuleExtension>) {
		debug!(
			target = "crm.registry",
			extension = extension.name(),
			module = extension.module(),
			"extension added"
		);
		self.shared.state.lock().add_extension(extension);
	}

	/// Disconnects the current session.
	pub async fn disconnect(&self) -> Result<()> {
		self.current()?.disconnect().await
	}

	/// Disconnects every active session, returning the first failure.
	pub async fn disconnect_all(&self) -> Result<()> {
		let mut first_error = None;
		for session in self.sessions() {
			if let Err(e) = session.disconnect().await {
				warn!(target = "crm.registry", namespace = %session.namespace(), error = %e, "disconnect failed");
				first_error.get_or_insert(e);
			}
		}
		first_error.map_or(Ok(()), Err)
	}
}
