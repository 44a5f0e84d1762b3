//! Gateway plane: the API-emulation server a run exposes.
//!
//! The launcher binds an HTTP server to the resolved port, serving the
//! project's schema document with the backend client injected. Query
//! execution itself is the emulation engine's concern; this crate owns the
//! process boundary: bind, readiness, address reporting, graceful stop.

pub mod error;
pub mod schema;
pub mod server;

pub use error::ServerStartError;
pub use schema::SchemaDocument;
pub use server::{GatewayHandle, GatewayLauncher, HttpGatewayLauncher};
