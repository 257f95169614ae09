//! In-process CRM REST server for integration tests.
//!
//! Serves `GET /crm/service/v2/rest.php` and dispatches on the `method`
//! query parameter. Besides the regular calls it knows a few methods that
//! force specific responses:
//!
//! - `boom` answers 500
//! - `teapot` answers 418
//! - `nothing` answers 200 with an empty body
//! - `empty_search` answers `{"result_count": 0}`

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use crm::protocol::password_digest;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "letmein";

#[derive(Default)]
struct ServerState {
	logins: AtomicUsize,
	requests: AtomicUsize,
}

pub struct TestServer {
	addr: SocketAddr,
	state: Arc<ServerState>,
	shutdown: Option<oneshot::Sender<()>>,
	handle: JoinHandle<()>,
}

impl TestServer {
	pub async fn start() -> Self {
		let state = Arc::new(ServerState::default());
		let app = Router::new()
			.route("/crm/service/v2/rest.php", get(rest))
			.with_state(Arc::clone(&state));

		let listener = TcpListener::bind("127.0.0.1:0")
			.await
			.expect("Failed to bind test server");
		let addr = listener.local_addr().expect("Failed to read test server address");
		let (tx, rx) = oneshot::channel::<()>();

		let handle = tokio::spawn(async move {
			axum::serve(listener, app)
				.with_graceful_shutdown(async {
					rx.await.ok();
				})
				.await
				.expect("Test server error");
		});

		Self {
			addr,
			state,
			shutdown: Some(tx),
			handle,
		}
	}

	/// Base URL of the CRM install (without the service path).
	pub fn url(&self) -> String {
		format!("http://{}/crm", self.addr)
	}

	/// Base URL under a path the server does not serve.
	pub fn missing_url(&self) -> String {
		format!("http://{}/missing", self.addr)
	}

	pub fn logins(&self) -> usize {
		self.state.logins.load(Ordering::SeqCst)
	}

	pub fn requests(&self) -> usize {
		self.state.requests.load(Ordering::SeqCst)
	}

	pub async fn shutdown(mut self) {
		if let Some(tx) = self.shutdown.take() {
			let _ = tx.send(());
		}
		let _ = self.handle.await;
	}
}

async fn rest(State(state): State<Arc<ServerState>>, Query(params): Query<HashMap<String, String>>) -> Response {
	state.requests.fetch_add(1, Ordering::SeqCst);
	let method = params.get("method").map(String::as_str).unwrap_or_default();
	let rest_data: Value = params
		.get("rest_data")
		.and_then(|raw| serde_json::from_str(raw).ok())
		.unwrap_or(Value::Null);

	match method {
		"login" => {
			let auth = &rest_data["user_auth"];
			if auth["user_name"] == USERNAME && auth["password"] == password_digest(PASSWORD).as_str() {
				let n = state.logins.fetch_add(1, Ordering::SeqCst) + 1;
				json_response(json!({
					"id": format!("http-session-{n}"),
					"module_name": "Users",
					"name_value_list": [{"name": "user_id", "value": "1"}]
				}))
			} else {
				json_response(json!({
					"name": "Invalid Login",
					"number": 10,
					"description": "Login attempt failed please check the username and password"
				}))
			}
		}
		"logout" => json_response(Value::Null),
		"get_server_info" => json_response(json!({"flavor": "CE", "version": "6.5.24", "gmt_time": "2024-01-01 00:00:00"})),
		"get_user_id" => json_response(json!("1")),
		"get_available_modules" => json_response(json!({
			"modules": [{"module_key": "Accounts"}, {"module_key": "Contacts"}, {"module_key": "Leads"}]
		})),
		"get_module_fields" => {
			let module = rest_data["module_name"].as_str().unwrap_or_default();
			json_response(json!({
				"module_name": module,
				"table_name": module.to_lowercase(),
				"module_fields": {
					"id": {"name": "id", "type": "id", "label": "ID", "required": 1},
					"email1": {"name": "email1", "type": "varchar", "label": "Email", "required": 0}
				}
			}))
		}
		"empty_search" => json_response(json!({"result_count": 0, "entry_list": []})),
		"boom" => (StatusCode::INTERNAL_SERVER_ERROR, "Fatal error").into_response(),
		"teapot" => (StatusCode::IM_A_TEAPOT, "short and stout").into_response(),
		"nothing" => StatusCode::OK.into_response(),
		_ => (StatusCode::BAD_REQUEST, format!("unknown method '{method}'")).into_response(),
	}
}

fn json_response(body: Value) -> Response {
	(StatusCode::OK, [("content-type", "application/json")], body.to_string()).into_response()
}
