use crate::middleware::correlation::CorrelationId;
use crate::routes::error::error_response;
use crate::{AppState, build_desk};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use qa_core::types::Viewer;
use qa_core::views::Dashboard;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/dashboard", get(dashboard))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/dashboard",
    params(Viewer),
    responses((status = 200, body = Dashboard))
)]
pub(crate) async fn dashboard(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Query(viewer): Query<Viewer>,
) -> Response {
    let desk = match build_desk(&state) {
        Ok(desk) => desk,
        Err(err) => return error_response(&err, Some(correlation.0)),
    };
    match desk.reviews().dashboard(&viewer) {
        Ok(dashboard) => Json(dashboard).into_response(),
        Err(err) => error_response(&err, Some(correlation.0)),
    }
}
