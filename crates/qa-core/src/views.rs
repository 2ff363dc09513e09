//! Read-side projections over reviews. Nothing here is persisted; stage is
//! always derived from status.

use crate::status::{WorkflowStage, WorkflowStatus};
use crate::types::{AcceptanceParty, Review, ReviewFilter, ReviewView, Role, Viewer};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

impl ReviewFilter {
    pub fn matches(&self, review: &Review) -> bool {
        if let Some(statuses) = &self.status {
            if !statuses.is_empty() && !statuses.contains(&review.status) {
                return false;
            }
        }
        if let Some(stage) = self.stage {
            if review.stage() != stage {
                return false;
            }
        }
        if let Some(reviewer_id) = &self.reviewer_id {
            if review.reviewer_id.as_deref() != Some(reviewer_id.as_str()) {
                return false;
            }
        }
        if let Some(member_firm) = &self.member_firm {
            if !review.member_firm.eq_ignore_ascii_case(member_firm) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StageCount {
    pub stage: WorkflowStage,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatusCount {
    pub status: WorkflowStatus,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Summary {
    pub total: usize,
    /// Every stage, in pipeline order, including empty ones.
    pub by_stage: Vec<StageCount>,
    /// Only statuses with at least one review.
    pub by_status: Vec<StatusCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Dashboard {
    pub summary: Summary,
    pub awaiting_action: Vec<ReviewView>,
}

pub fn summarize(reviews: &[Review]) -> Summary {
    let by_stage = WorkflowStage::ALL
        .into_iter()
        .map(|stage| StageCount {
            stage,
            count: reviews.iter().filter(|r| r.stage() == stage).count(),
        })
        .collect();
    let by_status = WorkflowStatus::ALL
        .into_iter()
        .map(|status| StatusCount {
            status,
            count: reviews.iter().filter(|r| r.status == status).count(),
        })
        .filter(|entry| entry.count > 0)
        .collect();
    Summary {
        total: reviews.len(),
        by_stage,
        by_status,
    }
}

/// Whether the next step of `review` belongs to `viewer`.
///
/// Reviewers and member firms only see their own reviews when the viewer
/// names an actor.
pub fn awaiting_action(review: &Review, viewer: &Viewer) -> bool {
    use WorkflowStatus::{
        Accepted, Draft, FirmAccepted, InProgress, Overdue, PendingAcceptance, PendingAssignment,
        ReviewerAccepted, SubmittedForVerification, VerifiedPendingFinal,
    };

    let owns = |value: Option<&str>| match viewer.actor.as_deref() {
        Some(actor) => value.is_some_and(|v| v.eq_ignore_ascii_case(actor)),
        None => true,
    };

    match viewer.role {
        Role::Admin => matches!(review.status, Draft | PendingAssignment),
        Role::TechnicalDirector => review.status == SubmittedForVerification,
        Role::Ceo => review.status == VerifiedPendingFinal,
        Role::Reviewer => {
            owns(review.reviewer_id.as_deref())
                && match review.status {
                    PendingAcceptance | FirmAccepted => !review
                        .acceptance
                        .party(AcceptanceParty::Reviewer)
                        .is_accepted(),
                    Accepted | InProgress | Overdue => true,
                    _ => false,
                }
        }
        Role::MemberFirm => {
            owns(Some(review.member_firm.as_str()))
                && matches!(review.status, PendingAcceptance | ReviewerAccepted)
                && !review.acceptance.party(AcceptanceParty::Firm).is_accepted()
        }
    }
}

/// In-progress reviews whose due date lies before `today`.
pub fn overdue_candidates(reviews: &[Review], today: NaiveDate) -> Vec<&Review> {
    reviews
        .iter()
        .filter(|review| review.status == WorkflowStatus::InProgress && review.is_past_due(today))
        .collect()
}
