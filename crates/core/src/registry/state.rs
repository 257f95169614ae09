//! Namespace state machine.
//!
//! Pure bookkeeping, no I/O. [`SessionRegistry`](super::SessionRegistry) wraps
//! it in a mutex and drives it from session connect/disconnect.
//!
//! Invariants:
//! - `namespaces` only grows: every id ever allocated stays in it
//! - active ids are a subset of allocated ids
//! - ids are strictly increasing, so a released id is never handed out again

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crm_runtime::{Error, Result};

use crate::modules::{ModuleExtension, ModuleSet};
use crate::namespace::{NamespaceId, NamespaceState};

pub(crate) struct RegistryState<S> {
	next: u64,
	namespaces: BTreeMap<NamespaceId, NamespaceState>,
	sessions: BTreeMap<NamespaceId, S>,
	modules: HashMap<NamespaceId, ModuleSet>,
	extensions: Vec<Arc<dyn ModuleExtension>>,
}

impl<S> Default for RegistryState<S> {
	fn default() -> Self {
		Self {
			next: 0,
			namespaces: BTreeMap::new(),
			sessions: BTreeMap::new(),
			modules: HashMap::new(),
			extensions: Vec::new(),
		}
	}
}

impl<S: Clone + PartialEq> RegistryState<S> {
	/// Hands out a fresh id and records it as used.
	pub fn allocate(&mut self) -> NamespaceId {
		let mut id = NamespaceId::new(self.next);
		while self.namespaces.contains_key(&id) {
			id = NamespaceId::new(id.get() + 1);
		}
		self.next = id.get() + 1;
		self.namespaces.insert(id, NamespaceState::Allocated);
		id
	}

	/// Marks `id` active for `session`.
	///
	/// Idempotent for the session already holding `id`; returns `false` in that
	/// case. Never allocates.
	pub fn activate(&mut self, id: NamespaceId, session: S) -> Result<bool> {
		match self.state(id) {
			NamespaceState::Allocated => {
				self.namespaces.insert(id, NamespaceState::Active);
				self.sessions.insert(id, session);
				Ok(true)
			}
			NamespaceState::Active if self.sessions.get(&id) == Some(&session) => Ok(false),
			NamespaceState::Active => Err(Error::NamespaceInUse {
				namespace: id.to_string(),
			}),
			NamespaceState::Released | NamespaceState::Free => Err(Error::NamespaceReleased {
				namespace: id.to_string(),
			}),
		}
	}

	/// Retires `id`. Returns `false` if it was not allocated or active.
	pub fn release(&mut self, id: NamespaceId) -> bool {
		match self.state(id) {
			NamespaceState::Allocated | NamespaceState::Active => {
				self.namespaces.insert(id, NamespaceState::Released);
				self.sessions.remove(&id);
				self.modules.remove(&id);
				true
			}
			NamespaceState::Released | NamespaceState::Free => false,
		}
	}

	/// The sole active session.
	pub fn current(&self) -> Result<S> {
		let mut sessions = self.sessions.values();
		match (sessions.next(), sessions.len()) {
			(None, _) => Err(Error::NoActiveSession),
			(Some(session), 0) => Ok(session.clone()),
			(Some(_), rest) => Err(Error::MultipleSessions { count: rest + 1 }),
		}
	}
}

impl<S: Clone> RegistryState<S> {
	pub fn state(&self, id: NamespaceId) -> NamespaceState {
		self.namespaces.get(&id).copied().unwrap_or(NamespaceState::Free)
	}

	pub fn session(&self, id: NamespaceId) -> Option<S> {
		self.sessions.get(&id).cloned()
	}

	pub fn sessions(&self) -> Vec<S> {
		self.sessions.values().cloned().collect()
	}

	pub fn active_namespaces(&self) -> Vec<NamespaceId> {
		self.sessions.keys().copied().collect()
	}

	pub fn used_namespaces(&self) -> Vec<NamespaceId> {
		self.namespaces.keys().copied().collect()
	}

	pub fn modules(&self, id: NamespaceId) -> Option<&ModuleSet> {
		self.modules.get(&id)
	}

	pub fn modules_mut(&mut self, id: NamespaceId) -> Option<&mut ModuleSet> {
		self.modules.get_mut(&id)
	}

	/// Installs module definitions for a live namespace.
	///
	/// Ignored for released ids so a late registration cannot resurrect one.
	pub fn set_modules<I, N>(&mut self, id: NamespaceId, names: I) -> bool
	where
		I: IntoIterator<Item = N>,
		N: Into<String>,
	{
		match self.state(id) {
			NamespaceState::Allocated | NamespaceState::Active => {
				self.modules.insert(id, ModuleSet::new(names, &self.extensions));
				true
			}
			NamespaceState::Released | NamespaceState::Free => false,
		}
	}

	/// Records `extension` and applies it to every registered namespace.
	pub fn add_extension(&mut self, extension: Arc<dyn ModuleExtension>) {
		if self.extensions.iter().any(|e| e.name() == extension.name()) {
			return;
		}
		for set in self.modules.values_mut() {
			set.extend(extension.as_ref());
		}
		self.extensions.push(extension);
	}
}
