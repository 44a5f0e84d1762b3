//! Partial option sets as they arrive from the CLI and the project
//! descriptor. Field names serialize in camelCase so the on-disk block
//! matches the historical flag spelling (`dynamoDbPort`, `inMemory`, ...).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One configuration layer. Every field optional; `None` means "defer to
/// the next layer down".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawOptions {
    /// Gateway port. Unset everywhere means dynamic assignment.
    pub port: Option<u16>,
    /// Embedded emulator port. Unset everywhere means dynamic assignment.
    pub dynamo_db_port: Option<u16>,
    pub in_memory: Option<bool>,
    pub db_path: Option<PathBuf>,
    pub shared_db: Option<bool>,
    pub delay_transient_statuses: Option<bool>,
    pub optimize_db_before_startup: Option<bool>,
    pub schema_path: Option<PathBuf>,
    pub dynamodb: DynamoSection,
}

/// Nested data-store section of a layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DynamoSection {
    pub client: ClientOptions,
}

/// Client-connection overrides. Setting `endpoint` switches the run to an
/// externally managed data store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientOptions {
    pub endpoint: Option<String>,
    pub region: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

impl RawOptions {
    /// Field-wise overlay: values in `self` win, holes fall through to
    /// `lower`. Nested sections merge per field, not wholesale.
    pub fn or(self, lower: RawOptions) -> RawOptions {
        RawOptions {
            port: self.port.or(lower.port),
            dynamo_db_port: self.dynamo_db_port.or(lower.dynamo_db_port),
            in_memory: self.in_memory.or(lower.in_memory),
            db_path: self.db_path.or(lower.db_path),
            shared_db: self.shared_db.or(lower.shared_db),
            delay_transient_statuses: self
                .delay_transient_statuses
                .or(lower.delay_transient_statuses),
            optimize_db_before_startup: self
                .optimize_db_before_startup
                .or(lower.optimize_db_before_startup),
            schema_path: self.schema_path.or(lower.schema_path),
            dynamodb: DynamoSection {
                client: ClientOptions {
                    endpoint: self.dynamodb.client.endpoint.or(lower.dynamodb.client.endpoint),
                    region: self.dynamodb.client.region.or(lower.dynamodb.client.region),
                    access_key_id: self
                        .dynamodb
                        .client
                        .access_key_id
                        .or(lower.dynamodb.client.access_key_id),
                    secret_access_key: self
                        .dynamodb
                        .client
                        .secret_access_key
                        .or(lower.dynamodb.client.secret_access_key),
                },
            },
        }
    }

    /// True when no field is set at this layer.
    pub fn is_empty(&self) -> bool {
        *self == RawOptions::default()
    }
}
