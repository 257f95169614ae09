//! crm: namespace-isolated multi-session client for CRM REST endpoints
//!
//! Connect to one or more SugarCRM-style servers at once. Each [`Session`]
//! lives in its own namespace, so module definitions registered for one
//! server never leak into another.
//!
//! # Example
//!
//! ```ignore
//! use crm::{ClientConfig, SessionRegistry};
//!
//! #[tokio::main]
//! async fn main() -> crm::Result<()> {
//!     let registry = SessionRegistry::new();
//!     let session = registry
//!         .connect(ClientConfig::new("https://crm.example.com", "admin", "letmein"))
//!         .await?;
//!
//!     println!("server version {}", session.server_version().await?);
//!     for name in session.available_modules().await? {
//!         println!("module {name}");
//!     }
//!
//!     registry.disconnect().await
//! }
//! ```
//!
//! # Crates
//!
//! - `crm-protocol`: wire types and request encoding
//! - `crm-runtime`: transport, connection and error types
//! - `crm` (this crate): sessions, namespaces and module definitions

pub mod config;
pub mod modules;
pub mod namespace;
pub mod registry;
pub mod session;

pub use config::{ClientConfig, Credentials};
pub use crm_protocol as protocol;
pub use crm_runtime::{
	Connection, ConnectionOptions, Connector, Endpoint, Error, HttpConnector, RawResponse, Result, StatusCode,
	StubCall, StubConnector, TlsVerification, Transport,
};
pub use modules::{Module, ModuleExtension, ModuleSet};
pub use namespace::{NamespaceId, NamespaceState};
pub use registry::SessionRegistry;
pub use session::Session;
