use crate::status::{WorkflowStage, WorkflowStatus};
use crate::types::enums::{
    AcceptanceParty, AgreementLevel, DocumentCategory, Grade, ReviewMode, ReviewType, Role,
};
use crate::types::ids::ReviewId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Review {
    pub id: ReviewId,
    pub member_firm: String,
    pub review_type: ReviewType,
    pub review_mode: ReviewMode,
    pub country: String,
    pub reviewer: Option<String>,
    /// Weak reference to the reviewer's identity; not validated here.
    pub reviewer_id: Option<String>,
    pub status: WorkflowStatus,
    pub acceptance: AcceptanceTracking,
    pub assessment: Assessment,
    pub rejection: Option<Rejection>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub documents: Vec<ReviewDocument>,
    pub history: Vec<HistoryEntry>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl Review {
    pub fn stage(&self) -> WorkflowStage {
        self.status.stage()
    }

    pub fn budgeted_hours(&self) -> u32 {
        self.review_type.hours()
    }

    pub fn reviewer_rating(&self) -> Option<&ReviewerRating> {
        self.assessment.rating()
    }

    pub fn verification(&self) -> Option<&TechnicalDirectorVerification> {
        self.assessment.verification()
    }

    pub fn final_review(&self) -> Option<&CeoFinalReview> {
        self.assessment.final_review()
    }

    pub fn is_past_due(&self, today: NaiveDate) -> bool {
        self.due_date.is_some_and(|due| due < today)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AcceptanceTracking {
    pub reviewer: PartyDecision,
    pub firm: PartyDecision,
}

impl AcceptanceTracking {
    pub fn pending() -> Self {
        Self {
            reviewer: PartyDecision::Pending,
            firm: PartyDecision::Pending,
        }
    }

    pub fn party(&self, party: AcceptanceParty) -> &PartyDecision {
        match party {
            AcceptanceParty::Reviewer => &self.reviewer,
            AcceptanceParty::Firm => &self.firm,
        }
    }

    pub fn with_decision(&self, party: AcceptanceParty, decision: PartyDecision) -> Self {
        let mut next = self.clone();
        match party {
            AcceptanceParty::Reviewer => next.reviewer = decision,
            AcceptanceParty::Firm => next.firm = decision,
        }
        next
    }
}

impl Default for AcceptanceTracking {
    fn default() -> Self {
        Self::pending()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum PartyDecision {
    Pending,
    Accepted {
        by: String,
        role: Role,
        notes: Option<String>,
        at: DateTime<Utc>,
    },
    Rejected {
        by: String,
        role: Role,
        reason: String,
        at: DateTime<Utc>,
    },
}

impl PartyDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Rejection {
    pub rejected_by: String,
    pub role: Role,
    pub reason: String,
    /// Status the review was in when it was rejected.
    pub from: WorkflowStatus,
    pub at: DateTime<Utc>,
}

/// Grading sub-records accumulated as the review moves through the pipeline.
///
/// Each variant carries everything the earlier ones do, so a verification can
/// never exist without the rating it was checked against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Assessment {
    Pending,
    Rated {
        rating: ReviewerRating,
    },
    Verified {
        rating: ReviewerRating,
        verification: TechnicalDirectorVerification,
    },
    Finalized {
        rating: ReviewerRating,
        verification: TechnicalDirectorVerification,
        final_review: CeoFinalReview,
    },
}

impl Assessment {
    pub fn rating(&self) -> Option<&ReviewerRating> {
        match self {
            Self::Pending => None,
            Self::Rated { rating }
            | Self::Verified { rating, .. }
            | Self::Finalized { rating, .. } => Some(rating),
        }
    }

    pub fn verification(&self) -> Option<&TechnicalDirectorVerification> {
        match self {
            Self::Pending | Self::Rated { .. } => None,
            Self::Verified { verification, .. } | Self::Finalized { verification, .. } => {
                Some(verification)
            }
        }
    }

    pub fn final_review(&self) -> Option<&CeoFinalReview> {
        match self {
            Self::Finalized { final_review, .. } => Some(final_review),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReviewerRating {
    pub grade: Grade,
    pub comments: Option<String>,
    pub strengths: Option<String>,
    pub areas_for_improvement: Option<String>,
    pub recommendations: Option<String>,
    pub submitted_by: String,
    pub submitted_at: DateTime<Utc>,
    pub time_spent_hours: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TechnicalDirectorVerification {
    pub grade: Grade,
    pub original_reviewer_grade: Grade,
    pub modified: bool,
    pub verification_notes: Option<String>,
    pub agreement_level: AgreementLevel,
    pub verified_by: String,
    pub verified_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CeoFinalReview {
    pub final_grade: Grade,
    pub finalized_by: String,
    pub finalized_at: DateTime<Utc>,
    pub admin_notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReviewDocument {
    /// Position within the review's document list, starting at 1.
    pub seq: u32,
    pub category: DocumentCategory,
    pub name: String,
    /// Key of the file in the external blob store.
    pub location: String,
    pub uploaded_by: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HistoryEntry {
    pub seq: u32,
    pub actor: String,
    pub role: Option<Role>,
    pub from: WorkflowStatus,
    pub to: WorkflowStatus,
    pub notes: Option<String>,
    pub at: DateTime<Utc>,
}

/// A review as returned to callers, with its derived stage alongside.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ReviewView {
    #[serde(flatten)]
    pub review: Review,
    pub stage: WorkflowStage,
    pub budgeted_hours: u32,
}

impl From<Review> for ReviewView {
    fn from(review: Review) -> Self {
        let stage = review.stage();
        let budgeted_hours = review.budgeted_hours();
        Self {
            review,
            stage,
            budgeted_hours,
        }
    }
}
