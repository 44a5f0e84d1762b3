//! Thin handle addressing the chosen data store.

use url::Url;

use offstack_config::{defaults, ClientConfig};

use crate::error::BackendStartError;

/// Client bound to one data-store endpoint. Carries connection settings
/// only; table operations belong to the emulation server that receives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamoClient {
    endpoint: Url,
    region: String,
    access_key_id: String,
    secret_access_key: String,
}

impl DynamoClient {
    /// Build a client against an explicit endpoint.
    ///
    /// Scheme-less endpoints (`localhost:8000`, `mock-dynamodb-endpoint`)
    /// are normalized to `http://` before parsing.
    pub fn connect(endpoint: &str, config: &ClientConfig) -> Result<Self, BackendStartError> {
        let parsed = Url::parse(endpoint)
            .or_else(|_| Url::parse(&format!("http://{}", endpoint)))
            .map_err(|source| BackendStartError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                source,
            })?;
        Ok(Self {
            endpoint: parsed,
            region: config.region.clone(),
            access_key_id: config.access_key_id.clone(),
            secret_access_key: config.secret_access_key.clone(),
        })
    }

    /// Build a client against a locally launched emulator port.
    pub fn local(port: u16, config: &ClientConfig) -> Result<Self, BackendStartError> {
        Self::connect(
            &format!("http://{}:{}", defaults::LOOPBACK_HOST, port),
            config,
        )
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }
}
