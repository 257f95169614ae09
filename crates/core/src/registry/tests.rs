use std::collections::BTreeSet;

use crm_protocol::methods;
use crm_runtime::{Error, RawResponse, StatusCode, StubConnector};
use serde_json::json;

use super::*;
use crate::modules::Module;

const BASE_URL: &str = "http://crm.local/sugarcrm";

fn registry() -> (SessionRegistry, StubConnector) {
	let stub = StubConnector::crm("admin", "letmein");
	(SessionRegistry::with_connector(Arc::new(stub.clone())), stub)
}

fn config() -> ClientConfig {
	ClientConfig::new(BASE_URL, "admin", "letmein")
}

struct Vip;

impl ModuleExtension for Vip {
	fn name(&self) -> &str {
		"vip"
	}

	fn module(&self) -> &str {
		"Contacts"
	}

	fn apply(&self, module: &mut Module) {
		module.set_attribute("vip", json!(true));
	}
}

#[test]
fn test_allocate_hands_out_distinct_increasing_ids() {
	let mut state = RegistryState::<&'static str>::default();
	let a = state.allocate();
	let b = state.allocate();

	assert!(a < b);
	assert_eq!(state.used_namespaces(), vec![a, b]);
	assert_eq!(state.state(a), NamespaceState::Allocated);
	assert!(state.active_namespaces().is_empty());
}

#[test]
fn test_released_ids_are_never_reused() {
	let mut state = RegistryState::<&'static str>::default();
	let first = state.allocate();
	state.activate(first, "a").unwrap();
	let previously_active: BTreeSet<_> = state.active_namespaces().into_iter().collect();

	assert!(state.release(first));
	assert!(!state.release(first));
	let second = state.allocate();

	assert!(!previously_active.contains(&second));
	assert_eq!(state.state(first), NamespaceState::Released);
	assert_eq!(state.used_namespaces().len(), 2);
}

#[test]
fn test_activate_is_idempotent_for_same_session() {
	let mut state = RegistryState::<&'static str>::default();
	let id = state.allocate();

	assert!(state.activate(id, "a").unwrap());
	assert!(!state.activate(id, "a").unwrap());
	assert_eq!(state.used_namespaces().len(), 1);
	assert_eq!(state.sessions(), vec!["a"]);
}

#[test]
fn test_activate_rejects_other_session_and_retired_ids() {
	let mut state = RegistryState::<&'static str>::default();
	let id = state.allocate();
	state.activate(id, "a").unwrap();

	let err = state.activate(id, "b").unwrap_err();
	assert!(matches!(err, Error::NamespaceInUse { .. }), "got {err:?}");

	state.release(id);
	let err = state.activate(id, "a").unwrap_err();
	assert!(matches!(err, Error::NamespaceReleased { .. }), "got {err:?}");
}

#[test]
fn test_current_requires_exactly_one_session() {
	let mut state = RegistryState::<u32>::default();
	assert!(matches!(state.current(), Err(Error::NoActiveSession)));

	let a = state.allocate();
	state.activate(a, 1).unwrap();
	assert_eq!(state.current().unwrap(), 1);

	let b = state.allocate();
	state.activate(b, 2).unwrap();
	match state.current() {
		Err(Error::MultipleSessions { count }) => assert_eq!(count, 2),
		other => panic!("Expected MultipleSessions, got {other:?}"),
	}
}

#[test]
fn test_release_drops_module_definitions() {
	let mut state = RegistryState::<u32>::default();
	let id = state.allocate();
	assert!(state.set_modules(id, ["Accounts"]));
	state.activate(id, 1).unwrap();
	state.release(id);

	assert!(state.modules(id).is_none());
	assert!(!state.set_modules(id, ["Accounts"]));
}

#[tokio::test]
async fn test_connect_registers_active_session() {
	let (registry, stub) = registry();
	let session = registry.connect(config()).await.unwrap();

	assert!(session.is_active());
	assert!(session.is_logged_in().await);
	assert_eq!(registry.sessions(), vec![session.clone()]);
	assert_eq!(registry.current().unwrap(), session);
	assert_eq!(registry.namespace_state(session.namespace()), NamespaceState::Active);
	assert_eq!(stub.calls_to(methods::GET_AVAILABLE_MODULES), 1);

	let modules = registry.modules(session.namespace()).unwrap();
	assert_eq!(modules.names().collect::<Vec<_>>(), ["Accounts", "Contacts", "Users"]);
}

#[tokio::test]
async fn test_missing_credentials_fail_before_io() {
	let (registry, stub) = registry();
	let cases = [
		(ClientConfig { base_url: None, ..config() }, "base_url"),
		(ClientConfig { username: None, ..config() }, "username"),
		(ClientConfig { password: Some(String::new()), ..config() }, "password"),
		(ClientConfig { password: Some("   ".into()), ..config() }, "password"),
		(ClientConfig { username: Some("\t".into()), ..config() }, "username"),
	];

	for (config, expected) in cases {
		match registry.connect(config).await {
			Err(Error::MissingCredentials { field }) => assert_eq!(field, expected),
			other => panic!("Expected MissingCredentials, got {other:?}"),
		}
	}
	assert_eq!(stub.opened(), 0);
	assert!(registry.used_namespaces().is_empty());
}

#[tokio::test]
async fn test_connect_disconnect_scenario() {
	let (registry, _stub) = registry();
	registry.connect(config()).await.unwrap();
	assert_eq!(registry.sessions().len(), 1);

	registry.disconnect().await.unwrap();
	assert_eq!(registry.sessions().len(), 0);
	assert!(matches!(registry.current(), Err(Error::NoActiveSession)));
}

#[tokio::test]
async fn test_sessions_get_distinct_namespaces() {
	let (registry, _stub) = registry();
	let a = registry.connect(config()).await.unwrap();
	let b = registry.connect(config()).await.unwrap();

	assert_ne!(a.namespace(), b.namespace());
	assert_eq!(registry.namespaces(), vec![a.namespace(), b.namespace()]);
	match registry.current() {
		Err(Error::MultipleSessions { count }) => assert_eq!(count, 2),
		other => panic!("Expected MultipleSessions, got {other:?}"),
	}
}

#[tokio::test]
async fn test_new_session_after_disconnect_gets_fresh_namespace() {
	let (registry, _stub) = registry();
	let first = registry.connect(config()).await.unwrap();
	let previously_active = registry.namespaces();
	first.disconnect().await.unwrap();

	let second = registry.connect(config()).await.unwrap();
	assert!(!previously_active.contains(&second.namespace()));
	assert_eq!(registry.namespace_state(first.namespace()), NamespaceState::Released);
}

#[tokio::test]
async fn test_failed_login_releases_namespace() {
	let (registry, stub) = registry();
	let err = registry
		.connect(ClientConfig::new(BASE_URL, "admin", "wrong"))
		.await
		.unwrap_err();

	assert!(err.is_auth_error(), "got {err:?}");
	let used = registry.used_namespaces();
	assert_eq!(used.len(), 1);
	assert_eq!(registry.namespace_state(used[0]), NamespaceState::Released);
	assert!(registry.sessions().is_empty());
	assert_eq!(stub.opened(), 1);
}

#[tokio::test]
async fn test_failed_registration_tears_session_down() {
	let (registry, stub) = registry();
	stub.route(methods::GET_AVAILABLE_MODULES, RawResponse::status(StatusCode::INTERNAL_SERVER_ERROR));

	let err = registry.connect(config()).await.unwrap_err();
	assert!(matches!(err, Error::InvalidRequest { .. }), "got {err:?}");
	assert!(registry.sessions().is_empty());
	assert_eq!(stub.calls_to(methods::LOGOUT), 1);
}

#[tokio::test]
async fn test_registration_can_be_skipped() {
	let (registry, stub) = registry();
	let session = registry
		.connect(config().with_register_modules(false))
		.await
		.unwrap();

	assert_eq!(stub.calls_to(methods::GET_AVAILABLE_MODULES), 0);
	assert!(session.modules().is_none());
}

#[tokio::test]
async fn test_connect_with_credentials_keeps_options() {
	let (registry, _stub) = registry();
	let session = registry
		.connect_with_credentials(BASE_URL, "admin", "letmein", ConnectionOptions::default().with_debug(true))
		.await
		.unwrap();

	assert_eq!(session.config().debug, Some(true));
	assert_eq!(session.config().username.as_deref(), Some("admin"));
	assert_eq!(session.config().verify_tls, Some(true));
}

#[tokio::test]
async fn test_connect_with_credentials_keeps_tls_opt_out() {
	let (registry, _stub) = registry();
	let options = ConnectionOptions::default().with_tls(TlsVerification::AcceptInvalidCerts);
	let session = registry
		.connect_with_credentials(BASE_URL, "admin", "letmein", options)
		.await
		.unwrap();

	assert_eq!(session.config().verify_tls, Some(false));
	assert_eq!(session.config().connection_options().tls, TlsVerification::AcceptInvalidCerts);
}

#[tokio::test]
async fn test_extensions_apply_per_namespace() {
	let (registry, _stub) = registry();
	let a = registry.connect(config()).await.unwrap();
	registry.add_extension(Arc::new(Vip));
	let b = registry.connect(config()).await.unwrap();

	for session in [&a, &b] {
		let contacts = session.module("Contacts").unwrap();
		assert!(contacts.is_extended());
		assert_eq!(contacts.attribute("vip"), Some(&json!(true)));
		assert!(!session.module("Accounts").unwrap().is_extended());
	}
}

#[tokio::test]
async fn test_extension_registered_twice_applies_once() {
	let (registry, _stub) = registry();
	let session = registry.connect(config()).await.unwrap();
	registry.add_extension(Arc::new(Vip));
	registry.add_extension(Arc::new(Vip));

	assert_eq!(session.module("Contacts").unwrap().extensions(), ["vip".to_string()]);
}

#[tokio::test]
async fn test_disconnect_all_empties_registry() {
	let (registry, stub) = registry();
	registry.connect(config()).await.unwrap();
	registry.connect(config()).await.unwrap();

	registry.disconnect_all().await.unwrap();
	assert!(registry.sessions().is_empty());
	assert_eq!(registry.used_namespaces().len(), 2);
	assert_eq!(stub.calls_to(methods::LOGOUT), 2);
}
