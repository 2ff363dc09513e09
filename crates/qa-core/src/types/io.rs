use crate::status::{WorkflowStage, WorkflowStatus};
use crate::types::enums::{AgreementLevel, DocumentCategory, Grade, ReviewMode, ReviewType, Role};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CreateReviewInput {
    pub member_firm: String,
    pub review_type: ReviewType,
    pub review_mode: ReviewMode,
    pub country: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    /// `draft` (default) or `pending_assignment`.
    pub initial_status: Option<WorkflowStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OpenReviewInput {
    pub opened_by: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AssignReviewInput {
    pub reviewer_id: String,
    /// Display name; defaults to `reviewer_id`.
    pub reviewer_name: Option<String>,
    pub assigned_by: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AcceptReviewInput {
    pub accepted_by: String,
    pub accepted_by_role: Role,
    pub acceptance_notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RejectReviewInput {
    pub rejected_by: String,
    pub rejected_by_role: Role,
    pub rejection_reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StartReviewInput {
    pub started_by: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RatingInput {
    pub grade: Option<Grade>,
    pub comments: Option<String>,
    pub strengths: Option<String>,
    pub areas_for_improvement: Option<String>,
    pub recommendations: Option<String>,
    pub submitted_by: String,
    pub time_spent_hours: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DocumentInput {
    pub category: DocumentCategory,
    pub name: String,
    pub location: String,
    pub uploaded_by: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SubmitReviewInput {
    pub rating: RatingInput,
    #[serde(default)]
    pub reviewed_documents: Vec<DocumentInput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VerifyReviewInput {
    pub grade: Option<Grade>,
    pub verification_notes: Option<String>,
    /// Derived from the grade change when omitted.
    pub agreement_level: Option<AgreementLevel>,
    pub verified_by: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FinalizeReviewInput {
    pub final_grade: Option<Grade>,
    pub admin_notes: Option<String>,
    pub finalized_by: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReviewFilter {
    pub status: Option<Vec<WorkflowStatus>>,
    pub stage: Option<WorkflowStage>,
    pub reviewer_id: Option<String>,
    pub member_firm: Option<String>,
}

/// Who is looking at the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, IntoParams)]
pub struct Viewer {
    pub role: Role,
    /// Reviewer id for reviewers, firm name for member firms.
    pub actor: Option<String>,
}
