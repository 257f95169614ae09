//! Namespace identifiers.

use std::fmt;

/// Isolation slot for one session's module definitions.
///
/// Ids are handed out in strictly increasing order and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespaceId(u64);

impl NamespaceId {
	pub(crate) fn new(id: u64) -> Self {
		Self(id)
	}

	pub fn get(self) -> u64 {
		self.0
	}
}

impl fmt::Display for NamespaceId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Namespace{}", self.0)
	}
}

/// Lifecycle of a namespace slot: `Free → Allocated → Active → Released`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamespaceState {
	/// Never handed out.
	Free,
	/// Handed to a session that is still logging in.
	Allocated,
	/// Backing a live session.
	Active,
	/// Retired; never handed out again.
	Released,
}
