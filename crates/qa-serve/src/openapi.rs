use utoipa::OpenApi;

use crate::routes::error::ErrorEnvelope;
use crate::routes::events::EventsQuery;
use crate::routes::reviews::ReviewListQuery;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use qa_core::notifications::{Notification, NotificationKind};
use qa_core::status::{WorkflowStage, WorkflowStatus};
use qa_core::types::enums::{
    AcceptanceParty, AgreementLevel, DocumentCategory, Grade, ReviewMode, ReviewType, Role,
};
use qa_core::types::io::{
    AcceptReviewInput, AssignReviewInput, CreateReviewInput, DocumentInput, FinalizeReviewInput,
    OpenReviewInput, RatingInput, RejectReviewInput, ReviewFilter, StartReviewInput,
    SubmitReviewInput, VerifyReviewInput, Viewer,
};
use qa_core::types::review::{
    AcceptanceTracking, Assessment, CeoFinalReview, HistoryEntry, PartyDecision, Rejection,
    Review, ReviewDocument, ReviewView, ReviewerRating, TechnicalDirectorVerification,
};
use qa_core::views::{Dashboard, StageCount, StatusCount, Summary};
use qa_events::types::{EventRecord, EventSource};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::reviews::create_review,
        crate::routes::reviews::list_reviews,
        crate::routes::reviews::get_review,
        crate::routes::reviews::history,
        crate::routes::reviews::open,
        crate::routes::reviews::assign,
        crate::routes::reviews::accept,
        crate::routes::reviews::reject,
        crate::routes::reviews::start,
        crate::routes::reviews::submit,
        crate::routes::reviews::verify,
        crate::routes::reviews::finalize,
        crate::routes::reviews::reject_final,
        crate::routes::dashboard::dashboard,
        crate::routes::events::list_events,
        crate::routes::events::subscribe
    ),
    components(schemas(
        Review,
        ReviewView,
        AcceptanceTracking,
        PartyDecision,
        Assessment,
        ReviewerRating,
        TechnicalDirectorVerification,
        CeoFinalReview,
        Rejection,
        ReviewDocument,
        HistoryEntry,
        CreateReviewInput,
        OpenReviewInput,
        AssignReviewInput,
        AcceptReviewInput,
        RejectReviewInput,
        StartReviewInput,
        RatingInput,
        DocumentInput,
        SubmitReviewInput,
        VerifyReviewInput,
        FinalizeReviewInput,
        ReviewFilter,
        ReviewListQuery,
        Viewer,
        Dashboard,
        Summary,
        StageCount,
        StatusCount,
        Notification,
        NotificationKind,
        WorkflowStatus,
        WorkflowStage,
        Role,
        AcceptanceParty,
        ReviewType,
        ReviewMode,
        Grade,
        AgreementLevel,
        DocumentCategory,
        EventRecord,
        EventsQuery,
        EventSource,
        ErrorEnvelope
    ))
)]
struct ApiDoc;

pub fn generate_spec() -> String {
    ApiDoc::openapi()
        .to_pretty_json()
        .unwrap_or_else(|_| "{}".to_string())
}

pub fn router() -> Router {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
