use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while standing the gateway server up.
#[derive(Debug, Error)]
pub enum ServerStartError {
    #[error("schema not found at {path}")]
    SchemaMissing { path: PathBuf },
    #[error("failed to read schema at {path}: {source}")]
    SchemaRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid schema at {path}: {reason}")]
    SchemaParse { path: PathBuf, reason: String },
    #[error("failed to bind gateway port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },
}
