//! Scripted in-memory transport.
//!
//! Routes calls by method name to canned [`RawResponse`]s and records every
//! call it sees. Used by unit and integration tests to drive connections and
//! sessions without a server.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crm_protocol::{methods, password_digest};
use parking_lot::Mutex;
use serde_json::{Value, json};
use url::Url;

use super::{Connector, Endpoint, RawResponse, StatusCode, Transport, TransportFuture};
use crate::error::{Error, Result};
use crate::options::ConnectionOptions;

type Route = Arc<dyn Fn(&StubCall) -> RawResponse + Send + Sync>;

/// One call observed by a [`StubConnector`].
#[derive(Debug, Clone, PartialEq)]
pub struct StubCall {
	pub host: String,
	pub method: String,
	pub rest_data: Value,
}

impl StubCall {
	fn parse(url: &Url) -> Self {
		let mut method = String::new();
		let mut rest_data = Value::Null;
		for (key, value) in url.query_pairs() {
			match key.as_ref() {
				"method" => method = value.into_owned(),
				"rest_data" => rest_data = serde_json::from_str(&value).unwrap_or(Value::Null),
				_ => {}
			}
		}
		Self {
			host: url.host_str().unwrap_or_default().to_string(),
			method,
			rest_data,
		}
	}

	/// The `session` argument, if the call carried one.
	pub fn session(&self) -> Option<&str> {
		self.rest_data.get("session").and_then(Value::as_str)
	}
}

#[derive(Default)]
struct StubState {
	routes: Mutex<HashMap<String, Route>>,
	calls: Mutex<Vec<StubCall>>,
	opened: AtomicUsize,
}

/// Connector whose transports answer from a route table.
///
/// Unrouted methods answer `400 Bad Request`.
#[derive(Clone, Default)]
pub struct StubConnector {
	state: Arc<StubState>,
}

impl StubConnector {
	pub fn new() -> Self {
		Self::default()
	}

	/// A well-behaved server accepting `username`/`password`.
	///
	/// Each successful login hands out a fresh session id (`session-1`, `session-2`, ...).
	pub fn crm(username: &str, password: &str) -> Self {
		let stub = Self::new();
		let username = username.to_string();
		let digest = password_digest(password);
		let logins = Arc::new(AtomicUsize::new(0));

		stub.route_with(methods::LOGIN, move |call| {
			let auth = &call.rest_data["user_auth"];
			if auth["user_name"] == username.as_str() && auth["password"] == digest.as_str() {
				let n = logins.fetch_add(1, Ordering::SeqCst) + 1;
				RawResponse::json(&json!({
					"id": format!("session-{n}"),
					"module_name": "Users",
					"name_value_list": {"user_id": {"name": "user_id", "value": "1"}}
				}))
			} else {
				RawResponse::json(&json!({
					"name": "Invalid Login",
					"number": 10,
					"description": "Login attempt failed please check the username and password"
				}))
			}
		});
		stub.route(methods::LOGOUT, RawResponse::json(&Value::Null));
		stub.route(
			methods::GET_AVAILABLE_MODULES,
			RawResponse::json(&json!({"modules": ["Accounts", "Contacts", "Users"]})),
		);
		stub.route_with(methods::GET_MODULE_FIELDS, |call| {
			let module = call.rest_data["module_name"].as_str().unwrap_or_default();
			RawResponse::json(&json!({
				"module_name": module,
				"table_name": module.to_lowercase(),
				"module_fields": {
					"id": {"name": "id", "type": "id", "label": "ID", "required": 1},
					"name": {"name": "name", "type": "name", "label": "Name", "required": 0}
				}
			}))
		});
		stub.route(
			methods::GET_SERVER_INFO,
			RawResponse::json(&json!({"flavor": "CE", "version": "6.5.24", "gmt_time": "2024-01-01 00:00:00"})),
		);
		stub.route(methods::GET_USER_ID, RawResponse::json(&json!("1")));
		stub
	}

	/// Answers every `method` call with `response`.
	pub fn route(&self, method: &str, response: RawResponse) {
		self.route_with(method, move |_| response.clone());
	}

	/// Answers `method` calls with the result of `f`.
	pub fn route_with<F>(&self, method: &str, f: F)
	where
		F: Fn(&StubCall) -> RawResponse + Send + Sync + 'static,
	{
		self.state.routes.lock().insert(method.to_string(), Arc::new(f));
	}

	/// All calls seen so far, in order.
	pub fn calls(&self) -> Vec<StubCall> {
		self.state.calls.lock().clone()
	}

	/// Number of calls seen for `method`.
	pub fn calls_to(&self, method: &str) -> usize {
		self.state.calls.lock().iter().filter(|c| c.method == method).count()
	}

	/// Number of transports opened.
	pub fn opened(&self) -> usize {
		self.state.opened.load(Ordering::SeqCst)
	}

	fn answer(&self, url: &Url) -> RawResponse {
		let call = StubCall::parse(url);
		let route = self.state.routes.lock().get(&call.method).cloned();
		self.state.calls.lock().push(call.clone());
		match route {
			Some(route) => route(&call),
			None => RawResponse::new(
				StatusCode::BAD_REQUEST,
				Some(format!("no stub route for '{}'", call.method)),
			),
		}
	}
}

impl Connector for StubConnector {
	fn open(&self, _endpoint: &Endpoint, _options: &ConnectionOptions) -> Result<Box<dyn Transport>> {
		self.state.opened.fetch_add(1, Ordering::SeqCst);
		Ok(Box::new(StubTransport {
			connector: self.clone(),
			started: AtomicBool::new(true),
		}))
	}
}

struct StubTransport {
	connector: StubConnector,
	started: AtomicBool,
}

impl Transport for StubTransport {
	fn get(&self, url: Url) -> TransportFuture<'_> {
		Box::pin(async move {
			if !self.is_started() {
				return Err(Error::NotConnected);
			}
			Ok(self.connector.answer(&url))
		})
	}

	fn is_started(&self) -> bool {
		self.started.load(Ordering::SeqCst)
	}

	fn close(&self) {
		self.started.store(false, Ordering::SeqCst);
	}
}
