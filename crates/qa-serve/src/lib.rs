pub mod middleware;
pub mod openapi;
pub mod overdue_sweep;
pub mod routes;
pub mod sse;

use axum::Router;
use qa_core::notifications::{LogNotifier, Notifier};
use qa_core::{QaError, ReviewDesk};
use qa_db::schema;
use qa_db::store::DbStore;
use qa_events::bus::EventBus;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub db_path: String,
    pub event_bus: EventBus,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(db_path: impl Into<String>, event_bus: EventBus) -> Self {
        Self {
            db_path: db_path.into(),
            event_bus,
            notifier: Arc::new(LogNotifier),
        }
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }
}

pub fn build_desk(state: &AppState) -> Result<ReviewDesk<DbStore>, QaError> {
    let conn = schema::open_and_migrate(&state.db_path).map_err(|err| QaError::Internal {
        message: err.to_string(),
    })?;
    let store = DbStore::new(conn);
    Ok(ReviewDesk::new(store, state.event_bus.clone()).with_notifier(state.notifier.clone()))
}

pub fn app(state: AppState) -> Router {
    routes::router(state).layer(TraceLayer::new_for_http())
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
