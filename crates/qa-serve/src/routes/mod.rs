pub mod dashboard;
pub mod error;
pub mod events;
pub mod reviews;

use crate::middleware::correlation::correlation_middleware;
use crate::{AppState, openapi};
use axum::middleware;
use axum::Router;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(reviews::router(state.clone()))
        .merge(dashboard::router(state.clone()))
        .merge(events::router(state))
        .merge(openapi::router())
        .route_layer(middleware::from_fn(correlation_middleware));

    Router::new().nest("/api", api)
}
