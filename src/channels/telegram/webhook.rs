//! Webhook Endpoint
//!
//! A single POST route that decodes a Telegram `Update` and hands it to an
//! [`UpdateProcessor`]. Responds 200 once processing finishes, 500 if the body
//! does not decode or processing fails.

use async_trait::async_trait;
use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::post,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use teloxide::types::Update;
use tokio::net::TcpListener;

/// Consumes decoded updates.
#[async_trait]
pub trait UpdateProcessor: Send + Sync {
    async fn process(&self, update: Update) -> anyhow::Result<()>;
}

#[derive(Clone)]
struct WebhookState {
    processor: Arc<dyn UpdateProcessor>,
}

pub fn router(path: &str, processor: Arc<dyn UpdateProcessor>) -> Router {
    Router::new()
        .route(path, post(handle_update))
        .with_state(WebhookState { processor })
}

async fn handle_update(State(state): State<WebhookState>, body: Bytes) -> StatusCode {
    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            tracing::error!(error = %e, "Webhook: failed to decode update");
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
    };

    let update_id = update.id.0;
    match state.processor.process(update).await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::error!(update_id, error = %e, "Webhook: failed to process update");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Bind `addr` and serve `app` until `shutdown` resolves.
pub async fn serve<F>(addr: SocketAddr, app: Router, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind webhook listener on {}: {}", addr, e))?;
    serve_on(listener, app, shutdown).await
}

pub(crate) async fn serve_on<F>(listener: TcpListener, app: Router, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(local) = listener.local_addr() {
        tracing::info!("Webhook: listening on {}", local);
    }
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    tracing::info!("Webhook: server stopped");
    Ok(())
}
