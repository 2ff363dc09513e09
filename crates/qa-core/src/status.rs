//! Workflow statuses and the display stage each one belongs to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Draft,
    PendingAssignment,
    PendingAcceptance,
    ReviewerAccepted,
    FirmAccepted,
    Accepted,
    Rejected,
    InProgress,
    Overdue,
    SubmittedForVerification,
    VerifiedPendingFinal,
    Completed,
    Cancelled,
}

/// Stages are ordered and only used for grouping and display.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    Assignment,
    Acceptance,
    Review,
    Verification,
    Finalization,
}

impl WorkflowStatus {
    pub const ALL: [WorkflowStatus; 13] = [
        Self::Draft,
        Self::PendingAssignment,
        Self::PendingAcceptance,
        Self::ReviewerAccepted,
        Self::FirmAccepted,
        Self::Accepted,
        Self::Rejected,
        Self::InProgress,
        Self::Overdue,
        Self::SubmittedForVerification,
        Self::VerifiedPendingFinal,
        Self::Completed,
        Self::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::PendingAssignment => "pending_assignment",
            Self::PendingAcceptance => "pending_acceptance",
            Self::ReviewerAccepted => "reviewer_accepted",
            Self::FirmAccepted => "firm_accepted",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::InProgress => "in_progress",
            Self::Overdue => "overdue",
            Self::SubmittedForVerification => "submitted_for_verification",
            Self::VerifiedPendingFinal => "verified_pending_final",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn stage(self) -> WorkflowStage {
        stage_of(self)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Rejected | Self::Cancelled)
    }
}

pub fn stage_of(status: WorkflowStatus) -> WorkflowStage {
    use WorkflowStatus::{
        Accepted, Cancelled, Completed, Draft, FirmAccepted, InProgress, Overdue,
        PendingAcceptance, PendingAssignment, Rejected, ReviewerAccepted,
        SubmittedForVerification, VerifiedPendingFinal,
    };

    match status {
        Draft | PendingAssignment => WorkflowStage::Assignment,
        PendingAcceptance | ReviewerAccepted | FirmAccepted | Accepted | Rejected => {
            WorkflowStage::Acceptance
        }
        InProgress | Overdue => WorkflowStage::Review,
        SubmittedForVerification => WorkflowStage::Verification,
        VerifiedPendingFinal | Completed | Cancelled => WorkflowStage::Finalization,
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown workflow status: {s}"))
    }
}

impl WorkflowStage {
    pub const ALL: [WorkflowStage; 5] = [
        Self::Assignment,
        Self::Acceptance,
        Self::Review,
        Self::Verification,
        Self::Finalization,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Assignment => "assignment",
            Self::Acceptance => "acceptance",
            Self::Review => "review",
            Self::Verification => "verification",
            Self::Finalization => "finalization",
        }
    }
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
