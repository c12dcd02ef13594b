//! Local development server standing in for the parameter store.
//!
//! The server keeps one JSON object in memory:
//! - `GET /` returns it
//! - `POST /` shallow-merges a JSON object body into it and returns the result;
//!   any `application/*` content type is parsed as JSON
//!
//! A resolver configured with the `local` environment reads from this server
//! instead of the parameter store.

use crate::error::{ConfigError, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Map, Value as JsonValue};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::sync::{RwLock, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

type Document = Arc<RwLock<Map<String, JsonValue>>>;

/// A running development server.
///
/// # Examples
///
/// ```rust,no_run
/// use paramstore_config::devserver::DevServer;
///
/// # async fn example() -> paramstore_config::error::Result<()> {
/// let server = DevServer::bind(("127.0.0.1", 10641)).await?;
/// println!("serving on {}", server.url());
/// server.shutdown().await?;
/// # Ok(())
/// # }
/// ```
pub struct DevServer {
    addr: SocketAddr,
    document: Document,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl DevServer {
    /// Bind to `addr` and start serving with an empty document.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn bind(addr: impl ToSocketAddrs) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ConfigError::Other(format!("Failed to bind dev server: {}", e)))?;
        let addr = listener
            .local_addr()
            .map_err(|e| ConfigError::Other(format!("Failed to read local address: {}", e)))?;

        let document: Document = Arc::new(RwLock::new(Map::new()));
        let app = router(Arc::clone(&document));
        let (shutdown, signal) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = signal.await;
                })
                .await;
            if let Err(e) = served {
                error!(error = %e, "dev server stopped unexpectedly");
            }
        });

        info!(%addr, "dev server listening");
        Ok(Self {
            addr,
            document,
            shutdown,
            handle,
        })
    }

    /// The bound address.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL of the server.
    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Snapshot of the current document.
    pub async fn document(&self) -> JsonValue {
        JsonValue::Object(self.document.read().await.clone())
    }

    /// Stop accepting connections and wait for the server to finish.
    ///
    /// # Errors
    ///
    /// Returns an error if the server task panicked.
    pub async fn shutdown(self) -> Result<()> {
        let _ = self.shutdown.send(());
        self.handle
            .await
            .map_err(|e| ConfigError::Other(format!("Dev server task failed: {}", e)))?;
        info!(addr = %self.addr, "dev server stopped");
        Ok(())
    }
}

/// Build the server's router around a shared document.
fn router(document: Document) -> Router {
    Router::new()
        .route("/", get(read_document).post(merge_document))
        .with_state(document)
}

async fn read_document(State(document): State<Document>) -> Json<JsonValue> {
    let document = document.read().await;
    debug!(keys = document.len(), "received request");
    Json(JsonValue::Object(document.clone()))
}

async fn merge_document(
    State(document): State<Document>,
    headers: HeaderMap,
    body: Bytes,
) -> std::result::Result<Json<JsonValue>, (StatusCode, String)> {
    let is_application = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim_start().to_ascii_lowercase().starts_with("application/"));
    if !is_application {
        return Err((
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "content type must be application/*".to_string(),
        ));
    }

    let update = match serde_json::from_slice::<JsonValue>(&body) {
        Ok(JsonValue::Object(update)) => update,
        Ok(_) => {
            return Err((
                StatusCode::BAD_REQUEST,
                "body must be a JSON object".to_string(),
            ));
        }
        Err(e) => return Err((StatusCode::BAD_REQUEST, format!("invalid JSON body: {}", e))),
    };

    let mut document = document.write().await;
    debug!(keys = ?update.keys().collect::<Vec<_>>(), "merging document");
    document.extend(update);
    Ok(Json(JsonValue::Object(document.clone())))
}
