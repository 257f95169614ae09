//! Wire types for the CRM REST protocol.
//!
//! Everything in this crate is pure: it builds call URLs and describes the
//! JSON payloads exchanged with the remote `rest.php` endpoint, but performs
//! no I/O. The runtime crate owns the transport.

pub mod api;
pub mod auth;
pub mod request;
pub mod response;

pub use api::{
	AvailableModules, FieldInfo, ModuleFields, ModuleFieldsParams, ServerInfo, SessionParams,
};
pub use auth::{LoginParams, LoginResult, NameValue, UserAuth, password_digest};
pub use request::{EncodeError, Request, SERVICE_PATH, resolve_service_url};
pub use response::{result_count, user_id_from_name_value_list};

/// Remote method names used by the session layer.
pub mod methods {
	pub const LOGIN: &str = "login";
	pub const LOGOUT: &str = "logout";
	pub const GET_AVAILABLE_MODULES: &str = "get_available_modules";
	pub const GET_MODULE_FIELDS: &str = "get_module_fields";
	pub const GET_SERVER_INFO: &str = "get_server_info";
	pub const GET_USER_ID: &str = "get_user_id";
}
