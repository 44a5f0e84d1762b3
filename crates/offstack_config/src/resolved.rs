//! The fully merged settings tree and the three-way layered merge that
//! produces it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::options::RawOptions;

/// Default-complete settings consumed by the startup components. Built once
/// per run; read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedConfig {
    /// Root of the host project this run serves.
    pub service_path: PathBuf,
    /// Gateway port. `None` means bind an OS-assigned port.
    pub port: Option<u16>,
    /// Schema document the gateway serves.
    pub schema_path: PathBuf,
    pub client: ClientConfig,
    pub server: ServerConfig,
}

/// Data-store connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// When set, the data store is externally managed and no emulator is
    /// launched.
    pub endpoint: Option<String>,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Embedded emulator launch parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Emulator port. `None` means reserve an OS-assigned port first.
    pub port: Option<u16>,
    pub db_path: PathBuf,
    pub in_memory: bool,
    pub shared_db: bool,
    pub delay_transient_statuses: bool,
    pub optimize_db_before_startup: bool,
}

impl ResolvedConfig {
    /// Path of the host project descriptor for this run.
    pub fn descriptor_path(&self) -> PathBuf {
        self.service_path.join(defaults::SERVICE_DESCRIPTOR)
    }

    /// True when this run attaches to an external data store instead of
    /// launching the embedded emulator.
    pub fn uses_external_endpoint(&self) -> bool {
        self.client.endpoint.is_some()
    }
}

/// Merge the three configuration layers, highest precedence first:
/// CLI flags, then the project's declarative block, then defaults.
///
/// Total by construction. A field absent from both partial layers takes the
/// documented default; ports fall back to `None` ("dynamic").
pub fn resolve(service_path: &Path, declared: RawOptions, cli: RawOptions) -> ResolvedConfig {
    let merged = cli.or(declared);

    let client = ClientConfig {
        endpoint: merged.dynamodb.client.endpoint,
        region: merged
            .dynamodb
            .client
            .region
            .unwrap_or_else(|| defaults::DEFAULT_REGION.to_string()),
        access_key_id: merged
            .dynamodb
            .client
            .access_key_id
            .unwrap_or_else(|| defaults::MOCK_ACCESS_KEY_ID.to_string()),
        secret_access_key: merged
            .dynamodb
            .client
            .secret_access_key
            .unwrap_or_else(|| defaults::MOCK_SECRET_ACCESS_KEY.to_string()),
    };

    let server = ServerConfig {
        port: merged.dynamo_db_port,
        db_path: merged
            .db_path
            .unwrap_or_else(|| service_path.join(defaults::DEFAULT_DB_DIR)),
        in_memory: merged.in_memory.unwrap_or(false),
        shared_db: merged.shared_db.unwrap_or(false),
        delay_transient_statuses: merged.delay_transient_statuses.unwrap_or(false),
        optimize_db_before_startup: merged.optimize_db_before_startup.unwrap_or(false),
    };

    ResolvedConfig {
        service_path: service_path.to_path_buf(),
        port: merged.port,
        schema_path: merged
            .schema_path
            .unwrap_or_else(|| service_path.join(defaults::DEFAULT_SCHEMA_FILE)),
        client,
        server,
    }
}
