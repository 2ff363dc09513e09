use crate::middleware::correlation::CorrelationId;
use crate::routes::error::error_response;
use crate::{AppState, build_desk};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use qa_events::types::EventRecord;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, serde::Deserialize, ToSchema, IntoParams)]
pub struct EventsQuery {
    /// Only events with a greater sequence number.
    after: Option<i64>,
    limit: Option<u32>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/events", get(list_events))
        .route("/events/subscribe", get(subscribe))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/events",
    params(EventsQuery),
    responses((status = 200, body = Vec<EventRecord>))
)]
pub(crate) async fn list_events(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Query(query): Query<EventsQuery>,
) -> Response {
    let desk = match build_desk(&state) {
        Ok(desk) => desk,
        Err(err) => return error_response(&err, Some(correlation.0)),
    };
    match desk.events().list(query.after, query.limit) {
        Ok(events) => Json(events).into_response(),
        Err(err) => error_response(&err, Some(correlation.0)),
    }
}

#[utoipa::path(
    get,
    path = "/api/events/subscribe",
    params(EventsQuery),
    responses((status = 200, description = "Server-sent event stream of EventRecord"))
)]
pub(crate) async fn subscribe(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Query(query): Query<EventsQuery>,
) -> Response {
    crate::sse::subscribe(state, query.after, Some(correlation.0)).await
}
