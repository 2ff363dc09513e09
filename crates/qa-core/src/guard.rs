use crate::error::ReviewError;
use crate::status::WorkflowStatus;
use crate::types::AcceptanceTracking;

pub fn can_transition_to(current: WorkflowStatus, target: WorkflowStatus) -> bool {
    use WorkflowStatus::{
        Accepted, Completed, Draft, FirmAccepted, InProgress, Overdue, PendingAcceptance,
        PendingAssignment, Rejected, ReviewerAccepted, SubmittedForVerification,
        VerifiedPendingFinal,
    };

    matches!(
        (current, target),
        (Draft, PendingAssignment)
            | (PendingAssignment, PendingAcceptance)
            | (PendingAcceptance, ReviewerAccepted | FirmAccepted | Rejected)
            | (ReviewerAccepted | FirmAccepted, Accepted | Rejected)
            | (Accepted, InProgress)
            | (InProgress, SubmittedForVerification | Overdue)
            | (Overdue, SubmittedForVerification)
            | (SubmittedForVerification, VerifiedPendingFinal)
            | (VerifiedPendingFinal, Completed | Rejected)
    )
}

pub fn ensure_transition(from: WorkflowStatus, to: WorkflowStatus) -> Result<(), ReviewError> {
    if can_transition_to(from, to) {
        Ok(())
    } else {
        Err(ReviewError::InvalidTransition { from, to })
    }
}

pub fn is_acceptance_complete(tracking: &AcceptanceTracking) -> bool {
    tracking.reviewer.is_accepted() && tracking.firm.is_accepted()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::WorkflowStatus::*;
    use crate::types::{PartyDecision, Role};
    use chrono::Utc;
    use std::collections::HashSet;

    const EDGES: &[(WorkflowStatus, WorkflowStatus)] = &[
        (Draft, PendingAssignment),
        (PendingAssignment, PendingAcceptance),
        (PendingAcceptance, ReviewerAccepted),
        (PendingAcceptance, FirmAccepted),
        (PendingAcceptance, Rejected),
        (ReviewerAccepted, Accepted),
        (ReviewerAccepted, Rejected),
        (FirmAccepted, Accepted),
        (FirmAccepted, Rejected),
        (Accepted, InProgress),
        (InProgress, SubmittedForVerification),
        (InProgress, Overdue),
        (Overdue, SubmittedForVerification),
        (SubmittedForVerification, VerifiedPendingFinal),
        (VerifiedPendingFinal, Completed),
        (VerifiedPendingFinal, Rejected),
    ];

    #[test]
    fn guard_agrees_with_adjacency_table_for_every_pair() {
        let allowed: HashSet<_> = EDGES.iter().copied().collect();
        for from in WorkflowStatus::ALL {
            for to in WorkflowStatus::ALL {
                assert_eq!(
                    can_transition_to(from, to),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn terminal_statuses_have_no_outgoing_edges() {
        for from in WorkflowStatus::ALL {
            let has_edge = WorkflowStatus::ALL
                .into_iter()
                .any(|to| can_transition_to(from, to));
            assert_eq!(has_edge, !from.is_terminal(), "{from}");
        }
    }

    #[test]
    fn ensure_transition_reports_both_ends() {
        assert!(ensure_transition(Accepted, InProgress).is_ok());
        assert_eq!(
            ensure_transition(PendingAcceptance, SubmittedForVerification),
            Err(ReviewError::InvalidTransition {
                from: PendingAcceptance,
                to: SubmittedForVerification,
            })
        );
    }

    #[test]
    fn acceptance_requires_both_parties() {
        let accepted = PartyDecision::Accepted {
            by: "R1".to_string(),
            role: Role::Reviewer,
            notes: None,
            at: Utc::now(),
        };
        let mut tracking = AcceptanceTracking::pending();
        assert!(!is_acceptance_complete(&tracking));
        tracking.reviewer = accepted.clone();
        assert!(!is_acceptance_complete(&tracking));
        tracking.firm = PartyDecision::Rejected {
            by: "FirmX".to_string(),
            role: Role::MemberFirm,
            reason: "conflict of interest".to_string(),
            at: Utc::now(),
        };
        assert!(!is_acceptance_complete(&tracking));
        tracking.firm = accepted;
        assert!(is_acceptance_complete(&tracking));
    }
}
