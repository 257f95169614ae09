//! CRM Runtime - connection, transport, and login handshake
//!
//! This crate provides the low-level runtime for talking to a CRM REST
//! endpoint:
//!
//! - **Transport**: opening HTTP/HTTPS channels to one endpoint ([`Connector`], [`Transport`])
//! - **Connection**: login, call encoding, and response classification
//! - **Errors**: the named error kinds shared by every layer above
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │   crm-rs    │  Sessions, registry, modules
//! └──────┬──────┘
//!        │ owns one Connection per Session
//! ┌──────▼──────┐
//! │ crm-runtime │  This crate
//! │  ┌────────┐ │
//! │  │ Conn   │ │  Login, send, classify
//! │  └────────┘ │
//! │  ┌────────┐ │
//! │  │ Trans  │ │  reqwest / stub
//! │  └────────┘ │
//! └─────────────┘
//! ```

pub mod connection;
pub mod error;
pub mod options;
pub mod transport;

pub use connection::{Connection, classify, is_blank_credential};
pub use error::{Error, Result};
pub use options::{ConnectionOptions, DEFAULT_QUIET_METHODS, TlsVerification};
pub use transport::{
	Connector, Endpoint, HttpConnector, HttpTransport, RawResponse, StatusCode, StubCall,
	StubConnector, Transport, TransportFuture,
};
