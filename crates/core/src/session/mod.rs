//! Logical authenticated connection bound to one namespace.
//!
//! A [`Session`] is a cheap, cloneable handle. Clones refer to the same
//! session; equality is identity. Calls on one session are serialized through
//! its connection lock.

mod api;


use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use crm_protocol::FieldInfo;
use crm_runtime::{Connection, Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::modules::{Module, ModuleSet};
use crate::namespace::NamespaceId;
use crate::registry::Shared;

/// Handle to a live (or disconnected) session.
#[derive(Clone)]
pub struct Session {
	inner: Arc<SessionInner>,
}

struct SessionInner {
	namespace: NamespaceId,
	config: ClientConfig,
	connection: Mutex<Connection>,
	active: AtomicBool,
	registry: Weak<Shared>,
}

impl PartialEq for Session {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.inner, &other.inner)
	}
}

impl Eq for Session {}

impl fmt::Debug for Session {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Session")
			.field("namespace", &self.inner.namespace)
			.field("config", &self.inner.config)
			.field("active", &self.is_active())
			.finish_non_exhaustive()
	}
}

impl Session {
	pub(crate) fn new(namespace: NamespaceId, config: ClientConfig, connection: Connection, registry: Weak<Shared>) -> Self {
		Self {
			inner: Arc::new(SessionInner {
				namespace,
				config,
				connection: Mutex::new(connection),
				active: AtomicBool::new(true),
				registry,
			}),
		}
	}

	pub fn namespace(&self) -> NamespaceId {
		self.inner.namespace
	}

	pub fn config(&self) -> &ClientConfig {
		&self.inner.config
	}

	/// False once [`disconnect`](Self::disconnect) has run.
	pub fn is_active(&self) -> bool {
		self.inner.active.load(Ordering::SeqCst)
	}

	pub async fn is_connected(&self) -> bool {
		self.inner.connection.lock().await.is_connected()
	}

	pub async fn is_logged_in(&self) -> bool {
		self.inner.connection.lock().await.is_logged_in()
	}

	pub async fn session_token(&self) -> Option<String> {
		self.inner.connection.lock().await.session_token().map(str::to_string)
	}

	/// User id reported at login.
	pub async fn user_id(&self) -> Option<String> {
		self.inner.connection.lock().await.user_id().map(str::to_string)
	}

	/// Resolved service URL.
	pub async fn url(&self) -> String {
		self.inner.connection.lock().await.url().to_string()
	}

	fn ensure_active(&self) -> Result<()> {
		if self.is_active() {
			Ok(())
		} else {
			Err(Error::SessionNotActive {
				namespace: self.inner.namespace.to_string(),
			})
		}
	}

	/// Sends `method` with `payload` over this session's connection.
	pub async fn send<P: Serialize + ?Sized>(&self, method: &str, payload: &P) -> Result<Option<Value>> {
		self.ensure_active()?;
		self.inner.connection.lock().await.send(method, payload).await
	}

	/// Typed variant of [`send`](Self::send).
	pub async fn call<P, R>(&self, method: &str, payload: &P) -> Result<Option<R>>
	where
		P: Serialize + ?Sized,
		R: DeserializeOwned,
	{
		self.ensure_active()?;
		self.inner.connection.lock().await.call(method, payload).await
	}

	/// Current session token, or `LoginError` when logged out.
	pub(crate) async fn token(&self) -> Result<String> {
		self.session_token()
			.await
			.ok_or_else(|| Error::LoginError("Not logged in".to_string()))
	}

	/// Logs in again, reopening the transport if it was torn down.
	///
	/// Keeps the namespace: reconnecting never allocates.
	pub async fn reconnect(&self) -> Result<()> {
		self.ensure_active()?;
		let register_modules = {
			let mut connection = self.inner.connection.lock().await;
			if !connection.is_connected() {
				connection.connect()?;
			}
			connection.login().await?;
			connection.options().register_modules
		};
		info!(target = "crm.session", namespace = %self.inner.namespace, "reconnected");

		if register_modules {
			self.register_modules().await?;
		}
		if let Some(shared) = self.inner.registry.upgrade() {
			shared.state.lock().activate(self.inner.namespace, self.clone())?;
		}
		Ok(())
	}

	/// Logs out, closes the transport and releases the namespace.
	///
	/// A second call fails with `SessionNotActive`. A logout failure is
	/// returned only after teardown has completed.
	pub async fn disconnect(&self) -> Result<()> {
		if !self.inner.active.swap(false, Ordering::SeqCst) {
			return Err(Error::SessionNotActive {
				namespace: self.inner.namespace.to_string(),
			});
		}

		let logout = {
			let mut connection = self.inner.connection.lock().await;
			let logout = connection.logout().await;
			connection.close();
			logout
		};
		self.release();

		match &logout {
			Ok(()) => info!(target = "crm.session", namespace = %self.inner.namespace, "disconnected"),
			Err(e) => warn!(target = "crm.session", namespace = %self.inner.namespace, error = %e, "logout failed"),
		}
		logout
	}

	/// Tears down a session that never became active.
	pub(crate) async fn abandon(&self) {
		self.inner.active.store(false, Ordering::SeqCst);
		{
			let mut connection = self.inner.connection.lock().await;
			if let Err(e) = connection.logout().await {
				debug!(target = "crm.session", namespace = %self.inner.namespace, error = %e, "logout after failed setup");
			}
			connection.close();
		}
		self.release();
	}

	fn release(&self) {
		if let Some(shared) = self.inner.registry.upgrade() {
			shared.state.lock().release(self.inner.namespace);
		}
	}

	/// Re-runs module registration for this namespace.
	pub async fn reload(&self) -> Result<()> {
		self.ensure_active()?;
		self.register_modules().await
	}

	/// Fetches the server's module list and installs it for this namespace.
	pub(crate) async fn register_modules(&self) -> Result<()> {
		let names = self.available_modules().await?;
		let count = names.len();
		if let Some(shared) = self.inner.registry.upgrade() {
			shared.state.lock().set_modules(self.inner.namespace, names);
		}
		debug!(target = "crm.session", namespace = %self.inner.namespace, count, "modules registered");
		Ok(())
	}

	/// Module definitions registered for this namespace.
	pub fn modules(&self) -> Option<ModuleSet> {
		let shared = self.inner.registry.upgrade()?;
		let state = shared.state.lock();
		state.modules(self.inner.namespace).cloned()
	}

	/// One module definition, resolved in this namespace.
	pub fn module(&self, name: &str) -> Option<Module> {
		let shared = self.inner.registry.upgrade()?;
		let state = shared.state.lock();
		state.modules(self.inner.namespace)?.get(name).cloned()
	}

	fn cache_fields(&self, module: &str, fields: &BTreeMap<String, FieldInfo>) {
		let Some(shared) = self.inner.registry.upgrade() else {
			return;
		};
		let mut state = shared.state.lock();
		if let Some(definition) = state
			.modules_mut(self.inner.namespace)
			.and_then(|set| set.get_mut(module))
		{
			definition.set_fields(fields.clone());
		}
	}
}
