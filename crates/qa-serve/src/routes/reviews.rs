use crate::middleware::correlation::CorrelationId;
use crate::routes::error::{error_response, validation_response};
use crate::{AppState, build_desk};
use axum::extract::{Path, Query, State};
use axum::http::header::IF_MATCH;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use qa_core::status::{WorkflowStage, WorkflowStatus};
use qa_core::types::io::{
    AcceptReviewInput, AssignReviewInput, CreateReviewInput, FinalizeReviewInput,
    OpenReviewInput, RejectReviewInput, ReviewFilter, StartReviewInput, SubmitReviewInput,
    VerifyReviewInput,
};
use qa_core::types::review::{HistoryEntry, Review, ReviewView};
use qa_core::types::ReviewId;
use qa_core::{QaError, RequestContext, ReviewDesk};
use qa_db::store::DbStore;
use qa_events::types::EventSource;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
pub struct ReviewListQuery {
    /// Comma-separated statuses, e.g. `in_progress,overdue`.
    status: Option<String>,
    stage: Option<WorkflowStage>,
    reviewer_id: Option<String>,
    member_firm: Option<String>,
}

impl ReviewListQuery {
    fn into_filter(self) -> Result<ReviewFilter, String> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.split(',')
                    .map(|part| part.trim().parse::<WorkflowStatus>())
                    .collect::<Result<Vec<_>, _>>()?,
            ),
        };
        Ok(ReviewFilter {
            status,
            stage: self.stage,
            reviewer_id: self.reviewer_id,
            member_firm: self.member_firm,
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/reviews", post(create_review).get(list_reviews))
        .route("/reviews/{id}", get(get_review))
        .route("/reviews/{id}/history", get(history))
        .route("/reviews/{id}/open", post(open))
        .route("/reviews/{id}/assign", post(assign))
        .route("/reviews/{id}/accept", post(accept))
        .route("/reviews/{id}/reject", post(reject))
        .route("/reviews/{id}/start", post(start))
        .route("/reviews/{id}/submit", post(submit))
        .route("/reviews/{id}/verify", post(verify))
        .route("/reviews/{id}/finalize", post(finalize))
        .route("/reviews/{id}/reject-final", post(reject_final))
        .with_state(state)
}

/// Reads an `If-Match` header carrying the expected review version, quoted or bare.
fn expected_version(headers: &HeaderMap) -> Result<Option<u64>, String> {
    let Some(value) = headers.get(IF_MATCH) else {
        return Ok(None);
    };
    let raw = value
        .to_str()
        .map_err(|_| "must be ASCII".to_string())?
        .trim()
        .trim_start_matches("W/")
        .trim_matches('"');
    raw.parse::<u64>()
        .map(Some)
        .map_err(|_| format!("expected a review version, got {raw:?}"))
}

fn transition<F>(
    state: &AppState,
    correlation: CorrelationId,
    headers: &HeaderMap,
    id: String,
    apply: F,
) -> Response
where
    F: FnOnce(&ReviewDesk<DbStore>, &RequestContext, &ReviewId) -> Result<Review, QaError>,
{
    let correlation_id = Some(correlation.0);
    let review_id = match ReviewId::new(id) {
        Ok(value) => value,
        Err(err) => return validation_response("id", err.to_string(), correlation_id),
    };
    let version = match expected_version(headers) {
        Ok(version) => version,
        Err(message) => return validation_response("if-match", message, correlation_id),
    };
    let desk = match build_desk(state) {
        Ok(desk) => desk,
        Err(err) => return error_response(&err, correlation_id),
    };
    let ctx = RequestContext::new(EventSource::Api, correlation_id).with_expected_version(version);
    match apply(&desk, &ctx, &review_id) {
        Ok(review) => Json(ReviewView::from(review)).into_response(),
        Err(err) => error_response(&err, ctx.correlation_id),
    }
}

#[utoipa::path(
    post,
    path = "/api/reviews",
    request_body = CreateReviewInput,
    responses((status = 201, body = ReviewView))
)]
pub(crate) async fn create_review(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Json(input): Json<CreateReviewInput>,
) -> Response {
    let desk = match build_desk(&state) {
        Ok(desk) => desk,
        Err(err) => return error_response(&err, Some(correlation.0)),
    };
    let ctx = RequestContext::new(EventSource::Api, Some(correlation.0));
    match desk.reviews().create(&ctx, &input) {
        Ok(review) => (StatusCode::CREATED, Json(ReviewView::from(review))).into_response(),
        Err(err) => error_response(&err, ctx.correlation_id),
    }
}

#[utoipa::path(
    get,
    path = "/api/reviews",
    params(ReviewListQuery),
    responses((status = 200, body = Vec<ReviewView>))
)]
pub(crate) async fn list_reviews(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Query(query): Query<ReviewListQuery>,
) -> Response {
    let filter = match query.into_filter() {
        Ok(filter) => filter,
        Err(message) => return validation_response("status", message, Some(correlation.0)),
    };
    let desk = match build_desk(&state) {
        Ok(desk) => desk,
        Err(err) => return error_response(&err, Some(correlation.0)),
    };
    match desk.reviews().list(&filter) {
        Ok(reviews) => {
            let views: Vec<ReviewView> = reviews.into_iter().map(ReviewView::from).collect();
            Json(views).into_response()
        }
        Err(err) => error_response(&err, Some(correlation.0)),
    }
}

#[utoipa::path(
    get,
    path = "/api/reviews/{id}",
    params(("id" = String, Path, description = "Review ID")),
    responses((status = 200, body = ReviewView))
)]
pub(crate) async fn get_review(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Path(id): Path<String>,
) -> Response {
    let review_id = match ReviewId::new(id) {
        Ok(value) => value,
        Err(err) => return validation_response("id", err.to_string(), Some(correlation.0)),
    };
    let desk = match build_desk(&state) {
        Ok(desk) => desk,
        Err(err) => return error_response(&err, Some(correlation.0)),
    };
    match desk.reviews().require(&review_id) {
        Ok(review) => Json(ReviewView::from(review)).into_response(),
        Err(err) => error_response(&err, Some(correlation.0)),
    }
}

#[utoipa::path(
    get,
    path = "/api/reviews/{id}/history",
    params(("id" = String, Path, description = "Review ID")),
    responses((status = 200, body = Vec<HistoryEntry>))
)]
pub(crate) async fn history(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Path(id): Path<String>,
) -> Response {
    let review_id = match ReviewId::new(id) {
        Ok(value) => value,
        Err(err) => return validation_response("id", err.to_string(), Some(correlation.0)),
    };
    let desk = match build_desk(&state) {
        Ok(desk) => desk,
        Err(err) => return error_response(&err, Some(correlation.0)),
    };
    match desk.reviews().history(&review_id) {
        Ok(entries) => Json(entries).into_response(),
        Err(err) => error_response(&err, Some(correlation.0)),
    }
}

#[utoipa::path(
    post,
    path = "/api/reviews/{id}/open",
    request_body = OpenReviewInput,
    params(("id" = String, Path, description = "Review ID")),
    responses((status = 200, body = ReviewView))
)]
pub(crate) async fn open(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(input): Json<OpenReviewInput>,
) -> Response {
    transition(&state, correlation, &headers, id, |desk, ctx, id| {
        desk.reviews().open(ctx, id, &input)
    })
}

#[utoipa::path(
    post,
    path = "/api/reviews/{id}/assign",
    request_body = AssignReviewInput,
    params(("id" = String, Path, description = "Review ID")),
    responses((status = 200, body = ReviewView))
)]
pub(crate) async fn assign(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(input): Json<AssignReviewInput>,
) -> Response {
    transition(&state, correlation, &headers, id, |desk, ctx, id| {
        desk.reviews().assign(ctx, id, &input)
    })
}

#[utoipa::path(
    post,
    path = "/api/reviews/{id}/accept",
    request_body = AcceptReviewInput,
    params(("id" = String, Path, description = "Review ID")),
    responses((status = 200, body = ReviewView))
)]
pub(crate) async fn accept(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(input): Json<AcceptReviewInput>,
) -> Response {
    transition(&state, correlation, &headers, id, |desk, ctx, id| {
        desk.reviews().accept(ctx, id, &input)
    })
}

#[utoipa::path(
    post,
    path = "/api/reviews/{id}/reject",
    request_body = RejectReviewInput,
    params(("id" = String, Path, description = "Review ID")),
    responses((status = 200, body = ReviewView))
)]
pub(crate) async fn reject(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(input): Json<RejectReviewInput>,
) -> Response {
    transition(&state, correlation, &headers, id, |desk, ctx, id| {
        desk.reviews().reject(ctx, id, &input)
    })
}

#[utoipa::path(
    post,
    path = "/api/reviews/{id}/start",
    request_body = StartReviewInput,
    params(("id" = String, Path, description = "Review ID")),
    responses((status = 200, body = ReviewView))
)]
pub(crate) async fn start(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(input): Json<StartReviewInput>,
) -> Response {
    transition(&state, correlation, &headers, id, |desk, ctx, id| {
        desk.reviews().start(ctx, id, &input)
    })
}

#[utoipa::path(
    post,
    path = "/api/reviews/{id}/submit",
    request_body = SubmitReviewInput,
    params(("id" = String, Path, description = "Review ID")),
    responses((status = 200, body = ReviewView))
)]
pub(crate) async fn submit(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(input): Json<SubmitReviewInput>,
) -> Response {
    transition(&state, correlation, &headers, id, |desk, ctx, id| {
        desk.reviews().submit(ctx, id, &input)
    })
}

#[utoipa::path(
    post,
    path = "/api/reviews/{id}/verify",
    request_body = VerifyReviewInput,
    params(("id" = String, Path, description = "Review ID")),
    responses((status = 200, body = ReviewView))
)]
pub(crate) async fn verify(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(input): Json<VerifyReviewInput>,
) -> Response {
    transition(&state, correlation, &headers, id, |desk, ctx, id| {
        desk.reviews().verify(ctx, id, &input)
    })
}

#[utoipa::path(
    post,
    path = "/api/reviews/{id}/finalize",
    request_body = FinalizeReviewInput,
    params(("id" = String, Path, description = "Review ID")),
    responses((status = 200, body = ReviewView))
)]
pub(crate) async fn finalize(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(input): Json<FinalizeReviewInput>,
) -> Response {
    transition(&state, correlation, &headers, id, |desk, ctx, id| {
        desk.reviews().finalize(ctx, id, &input)
    })
}

#[utoipa::path(
    post,
    path = "/api/reviews/{id}/reject-final",
    request_body = RejectReviewInput,
    params(("id" = String, Path, description = "Review ID")),
    responses((status = 200, body = ReviewView))
)]
pub(crate) async fn reject_final(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(input): Json<RejectReviewInput>,
) -> Response {
    transition(&state, correlation, &headers, id, |desk, ctx, id| {
        desk.reviews().reject_at_final(ctx, id, &input)
    })
}
