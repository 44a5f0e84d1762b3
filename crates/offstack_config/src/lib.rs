//! Layered configuration for the offline stack.
//!
//! Three layers feed one resolved settings tree, highest precedence first:
//!
//! 1. Command-line flags (or host-provided invocation options)
//! 2. The `custom.offstack` block of the project descriptor
//! 3. Built-in defaults
//!
//! The merge is total: every field of [`ResolvedConfig`] holds a concrete
//! decision afterwards. Ports left unset resolve to `None`, meaning
//! "allocate dynamically at launch".

pub mod defaults;
pub mod options;
pub mod paths;
pub mod resolved;

pub use options::{ClientOptions, DynamoSection, RawOptions};
pub use resolved::{resolve, ClientConfig, ResolvedConfig, ServerConfig};
