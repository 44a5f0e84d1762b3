//! Gateway HTTP server setup.
//!
//! # Responsibilities
//! - Load and validate the schema document
//! - Bind the resolved (or dynamically assigned) port
//! - Inject the backend client into the handlers
//! - Serve with graceful shutdown behind [`GatewayHandle`]

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use offstack_config::{defaults, ResolvedConfig};
use offstack_dynamodb::DynamoClient;

use crate::error::ServerStartError;
use crate::schema::{self, SchemaDocument};

/// Seam between the lifecycle layer and the concrete server start.
#[async_trait]
pub trait GatewayLauncher: Send + Sync {
    async fn launch(
        &self,
        config: &ResolvedConfig,
        client: DynamoClient,
    ) -> Result<GatewayHandle, ServerStartError>;
}

/// A running gateway server.
#[derive(Debug)]
pub struct GatewayHandle {
    url: String,
    shutdown_tx: oneshot::Sender<()>,
    join_handle: JoinHandle<()>,
}

impl GatewayHandle {
    pub fn new(url: String, shutdown_tx: oneshot::Sender<()>, join_handle: JoinHandle<()>) -> Self {
        Self {
            url,
            shutdown_tx,
            join_handle,
        }
    }

    /// Reachable base address, e.g. `http://127.0.0.1:62617`.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Signal the serve task and wait for it to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(err) = self.join_handle.await {
            warn!("gateway task ended abnormally: {}", err);
        }
    }
}

#[derive(Clone)]
struct AppState {
    schema: Arc<SchemaDocument>,
    client: DynamoClient,
}

/// Production launcher: axum server on a loopback TCP listener.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpGatewayLauncher;

#[async_trait]
impl GatewayLauncher for HttpGatewayLauncher {
    async fn launch(
        &self,
        config: &ResolvedConfig,
        client: DynamoClient,
    ) -> Result<GatewayHandle, ServerStartError> {
        let schema = schema::load(&config.schema_path)?;
        debug!(
            "schema loaded from {} ({} type definitions)",
            config.schema_path.display(),
            schema.type_count()
        );

        let requested_port = config.port.unwrap_or(0);
        let listener = TcpListener::bind((defaults::LOOPBACK_HOST, requested_port))
            .await
            .map_err(|source| ServerStartError::Bind {
                port: requested_port,
                source,
            })?;
        let addr = listener
            .local_addr()
            .map_err(|source| ServerStartError::Bind {
                port: requested_port,
                source,
            })?;
        let url = format!("http://{}", addr);

        let state = AppState {
            schema: Arc::new(schema),
            client,
        };
        let app = Router::new()
            .route("/graphql", post(graphql_handler))
            .route("/schema", get(schema_handler))
            .route("/health", get(health_handler))
            .with_state(state);

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        });
        let join_handle = tokio::spawn(async move {
            if let Err(err) = serve.await {
                error!("gateway server error: {}", err);
            }
        });

        info!("gateway listening on {}", addr);
        Ok(GatewayHandle::new(url, shutdown_tx, join_handle))
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlRequest {
    query: String,
    #[serde(default)]
    #[allow(dead_code)]
    variables: serde_json::Value,
}

/// Accepts the standard query envelope and answers with a stub payload
/// naming the backing data store. Resolver execution belongs to a real
/// emulation engine, not the orchestrator.
async fn graphql_handler(
    State(state): State<AppState>,
    Json(request): Json<GraphQlRequest>,
) -> Json<serde_json::Value> {
    debug!("gateway received query ({} bytes)", request.query.len());
    Json(json!({
        "data": null,
        "extensions": {
            "dataSource": state.client.endpoint().as_str(),
            "schemaTypes": state.schema.type_count(),
        }
    }))
}

async fn schema_handler(State(state): State<AppState>) -> String {
    state.schema.source().to_string()
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
