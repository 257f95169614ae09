//! Per-connection options.

use std::time::Duration;

use crm_protocol::methods;

/// Methods whose responses are too large to dump in debug mode.
pub const DEFAULT_QUIET_METHODS: &[&str] = &[methods::GET_MODULE_FIELDS, methods::GET_AVAILABLE_MODULES];

/// Application name reported to the server at login.
pub const DEFAULT_APPLICATION: &str = "crm-rs";

/// Certificate verification for `https` endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TlsVerification {
	/// Verify the server certificate chain and host name.
	#[default]
	Strict,
	/// Accept any certificate. Only for self-signed CRM deployments.
	AcceptInvalidCerts,
}

/// Options for a single [`Connection`](crate::Connection).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionOptions {
	/// Log requests and decoded responses.
	pub debug: bool,
	/// Register the server's modules for the owning session after login.
	pub register_modules: bool,
	pub tls: TlsVerification,
	/// Methods excluded from debug dumps.
	pub quiet_methods: Vec<String>,
	/// Whole-request timeout handed to the transport.
	pub timeout: Option<Duration>,
	pub application: String,
}

impl Default for ConnectionOptions {
	fn default() -> Self {
		Self {
			debug: false,
			register_modules: true,
			tls: TlsVerification::default(),
			quiet_methods: DEFAULT_QUIET_METHODS.iter().map(|m| m.to_string()).collect(),
			timeout: None,
			application: DEFAULT_APPLICATION.to_string(),
		}
	}
}

impl ConnectionOptions {
	pub fn with_debug(mut self, debug: bool) -> Self {
		self.debug = debug;
		self
	}

	pub fn with_register_modules(mut self, register: bool) -> Self {
		self.register_modules = register;
		self
	}

	pub fn with_tls(mut self, tls: TlsVerification) -> Self {
		self.tls = tls;
		self
	}

	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);
		self
	}

	/// Adds `method` to the debug allow-list of suppressed dumps.
	pub fn with_quiet_method(mut self, method: impl Into<String>) -> Self {
		let method = method.into();
		if !self.quiet_methods.contains(&method) {
			self.quiet_methods.push(method);
		}
		self
	}

	/// Returns true when `method`'s traffic should be dumped.
	pub fn dumps(&self, method: &str) -> bool {
		self.debug && !self.quiet_methods.iter().any(|m| m == method)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults_register_modules_and_verify_tls() {
		let options = ConnectionOptions::default();
		assert!(!options.debug);
		assert!(options.register_modules);
		assert_eq!(options.tls, TlsVerification::Strict);
	}

	#[test]
	fn test_quiet_methods_are_never_dumped() {
		let options = ConnectionOptions::default().with_debug(true);
		assert!(options.dumps("get_entry_list"));
		assert!(!options.dumps("get_module_fields"));
		assert!(!options.dumps("get_available_modules"));

		let options = options.with_quiet_method("get_entry_list");
		assert!(!options.dumps("get_entry_list"));
		assert!(!ConnectionOptions::default().dumps("get_entry_list"));
	}
}
