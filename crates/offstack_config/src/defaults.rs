//! Canonical default values for configuration resolution.

/// Region reported to data-store clients when none is configured.
pub const DEFAULT_REGION: &str = "localhost";
/// Placeholder credential pair for local emulation. Never valid remotely.
pub const MOCK_ACCESS_KEY_ID: &str = "MOCK_ACCESS_KEY_ID";
pub const MOCK_SECRET_ACCESS_KEY: &str = "MOCK_SECRET_ACCESS_KEY";
/// Directory under the service path where the embedded emulator keeps data.
pub const DEFAULT_DB_DIR: &str = ".dynamodb";
/// Schema document the gateway serves when no `schemaPath` is configured.
pub const DEFAULT_SCHEMA_FILE: &str = "schema.graphql";
/// Host project descriptor consumed for the declarative layer.
pub const SERVICE_DESCRIPTOR: &str = "serverless.yml";
/// Key of this tool's block under the descriptor's `custom` section.
pub const CUSTOM_BLOCK_KEY: &str = "offstack";
/// Loopback host both emulated processes bind to.
pub const LOOPBACK_HOST: &str = "127.0.0.1";
