//! Pure review transitions.
//!
//! Every operation takes the current review and returns a new one together
//! with the single history entry it appended. Nothing is mutated in place and
//! the clock is supplied by the caller, so identical inputs give identical
//! outputs. Persisting the result and notifying anyone is the caller's job.

use crate::error::ReviewError;
use crate::guard::{ensure_transition, is_acceptance_complete};
use crate::status::WorkflowStatus;
use crate::types::{
    AcceptReviewInput, AcceptanceParty, AcceptanceTracking, AgreementLevel, AssignReviewInput,
    Assessment, CeoFinalReview, CreateReviewInput, FinalizeReviewInput, Grade, HistoryEntry,
    OpenReviewInput, PartyDecision, RejectReviewInput, Rejection, Review, ReviewDocument,
    ReviewId, ReviewerRating, Role, StartReviewInput, SubmitReviewInput,
    TechnicalDirectorVerification, VerifyReviewInput,
};
use chrono::{DateTime, Utc};

pub const SYSTEM_ACTOR: &str = "system";

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub review: Review,
    pub entry: HistoryEntry,
}

struct Step<'a> {
    path: &'a [WorkflowStatus],
    actor: &'a str,
    role: Option<Role>,
    notes: Option<String>,
    at: DateTime<Utc>,
}

/// Walks `path` from the review's current status, checking every edge, and
/// records one history entry spanning the whole walk.
fn advance<F>(review: &Review, step: Step<'_>, apply: F) -> Result<Transition, ReviewError>
where
    F: FnOnce(&mut Review) -> Result<(), ReviewError>,
{
    let from = review.status;
    let mut current = from;
    for next in step.path {
        ensure_transition(current, *next)?;
        current = *next;
    }
    if current == from {
        return Err(ReviewError::InvalidTransition { from, to: current });
    }

    let mut next = review.clone();
    apply(&mut next)?;
    let entry = HistoryEntry {
        seq: next_seq(review),
        actor: step.actor.to_string(),
        role: step.role,
        from,
        to: current,
        notes: step.notes,
        at: step.at,
    };
    next.status = current;
    next.last_updated = step.at;
    next.history.push(entry.clone());
    Ok(Transition {
        review: next,
        entry,
    })
}

fn next_seq(review: &Review) -> u32 {
    review.history.last().map_or(1, |entry| entry.seq + 1)
}

fn require_text<'a>(field: &str, value: &'a str) -> Result<&'a str, ReviewError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ReviewError::validation(field, "must not be blank"));
    }
    Ok(trimmed)
}

fn require_grade(field: &str, grade: Option<Grade>) -> Result<Grade, ReviewError> {
    grade.ok_or_else(|| ReviewError::validation(field, "is required"))
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|text| text.trim())
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Builds a new review. Only `draft` and `pending_assignment` are valid
/// starting points, and no history entry is written.
pub fn create(
    id: ReviewId,
    input: &CreateReviewInput,
    at: DateTime<Utc>,
) -> Result<Review, ReviewError> {
    let member_firm = require_text("member_firm", &input.member_firm)?;
    let country = require_text("country", &input.country)?;
    if input.end_date < input.start_date {
        return Err(ReviewError::validation(
            "end_date",
            "must not be before start_date",
        ));
    }
    if input.due_date.is_some_and(|due| due < input.start_date) {
        return Err(ReviewError::validation(
            "due_date",
            "must not be before start_date",
        ));
    }
    let status = input.initial_status.unwrap_or(WorkflowStatus::Draft);
    if !matches!(
        status,
        WorkflowStatus::Draft | WorkflowStatus::PendingAssignment
    ) {
        return Err(ReviewError::validation(
            "initial_status",
            "must be draft or pending_assignment",
        ));
    }
    Ok(Review {
        id,
        member_firm: member_firm.to_string(),
        review_type: input.review_type,
        review_mode: input.review_mode,
        country: country.to_string(),
        reviewer: None,
        reviewer_id: None,
        status,
        acceptance: AcceptanceTracking::pending(),
        assessment: Assessment::Pending,
        rejection: None,
        start_date: input.start_date,
        end_date: input.end_date,
        due_date: input.due_date,
        documents: Vec::new(),
        history: Vec::new(),
        version: 0,
        created_at: at,
        last_updated: at,
    })
}

/// draft -> pending_assignment
pub fn open(
    review: &Review,
    input: &OpenReviewInput,
    at: DateTime<Utc>,
) -> Result<Transition, ReviewError> {
    let step = Step {
        path: &[WorkflowStatus::PendingAssignment],
        actor: &input.opened_by,
        role: Some(Role::Admin),
        notes: None,
        at,
    };
    let actor = step.actor;
    advance(review, step, |_| require_text("opened_by", actor).map(|_| ()))
}

/// Assigns a reviewer and resets acceptance. Draft reviews are opened on the way.
pub fn assign(
    review: &Review,
    input: &AssignReviewInput,
    at: DateTime<Utc>,
) -> Result<Transition, ReviewError> {
    let path: &[WorkflowStatus] = match review.status {
        WorkflowStatus::Draft => &[
            WorkflowStatus::PendingAssignment,
            WorkflowStatus::PendingAcceptance,
        ],
        _ => &[WorkflowStatus::PendingAcceptance],
    };
    let step = Step {
        path,
        actor: &input.assigned_by,
        role: Some(Role::Admin),
        notes: Some(format!("assigned to {}", input.reviewer_id.trim())),
        at,
    };
    advance(review, step, |next| {
        let reviewer_id = require_text("reviewer_id", &input.reviewer_id)?.to_string();
        require_text("assigned_by", &input.assigned_by)?;
        let reviewer =
            non_blank(input.reviewer_name.as_ref()).unwrap_or_else(|| reviewer_id.clone());
        next.reviewer = Some(reviewer);
        next.reviewer_id = Some(reviewer_id);
        next.acceptance = AcceptanceTracking::pending();
        next.rejection = None;
        Ok(())
    })
}

/// Records one party's acceptance. The review becomes `accepted` once both
/// the reviewer and the member firm have accepted, in either order.
pub fn accept(
    review: &Review,
    input: &AcceptReviewInput,
    at: DateTime<Utc>,
) -> Result<Transition, ReviewError> {
    let Some(party) = AcceptanceParty::from_role(input.accepted_by_role) else {
        return Err(ReviewError::validation(
            "accepted_by_role",
            "only the reviewer or the member firm can accept a review",
        ));
    };
    let tracking = review.acceptance.with_decision(
        party,
        PartyDecision::Accepted {
            by: input.accepted_by.trim().to_string(),
            role: input.accepted_by_role,
            notes: non_blank(input.acceptance_notes.as_ref()),
            at,
        },
    );

    let target = if is_acceptance_complete(&tracking) {
        WorkflowStatus::Accepted
    } else {
        match party {
            AcceptanceParty::Firm => WorkflowStatus::FirmAccepted,
            AcceptanceParty::Reviewer => WorkflowStatus::ReviewerAccepted,
        }
    };
    let step = Step {
        path: &[target],
        actor: &input.accepted_by,
        role: Some(input.accepted_by_role),
        notes: non_blank(input.acceptance_notes.as_ref()),
        at,
    };
    advance(review, step, |next| {
        require_text("accepted_by", &input.accepted_by)?;
        next.acceptance = tracking;
        Ok(())
    })
}

/// Rejection is unilateral: one party rejecting wins over the other's acceptance.
pub fn reject(
    review: &Review,
    input: &RejectReviewInput,
    at: DateTime<Utc>,
) -> Result<Transition, ReviewError> {
    let step = Step {
        path: &[WorkflowStatus::Rejected],
        actor: &input.rejected_by,
        role: Some(input.rejected_by_role),
        notes: non_blank(Some(&input.rejection_reason)),
        at,
    };
    let from = review.status;
    advance(review, step, |next| {
        let reason = require_text("rejection_reason", &input.rejection_reason)?.to_string();
        let rejected_by = require_text("rejected_by", &input.rejected_by)?.to_string();
        if from.stage() == crate::status::WorkflowStage::Acceptance {
            if let Some(party) = AcceptanceParty::from_role(input.rejected_by_role) {
                next.acceptance = next.acceptance.with_decision(
                    party,
                    PartyDecision::Rejected {
                        by: rejected_by.clone(),
                        role: input.rejected_by_role,
                        reason: reason.clone(),
                        at,
                    },
                );
            }
        }
        next.rejection = Some(Rejection {
            rejected_by,
            role: input.rejected_by_role,
            reason,
            from,
            at,
        });
        Ok(())
    })
}

/// accepted -> in_progress
pub fn start(
    review: &Review,
    input: &StartReviewInput,
    at: DateTime<Utc>,
) -> Result<Transition, ReviewError> {
    let step = Step {
        path: &[WorkflowStatus::InProgress],
        actor: &input.started_by,
        role: None,
        notes: None,
        at,
    };
    let actor = step.actor;
    advance(review, step, |_| require_text("started_by", actor).map(|_| ()))
}

/// in_progress -> overdue, performed by the scheduler.
pub fn mark_overdue(review: &Review, at: DateTime<Utc>) -> Result<Transition, ReviewError> {
    let notes = review
        .due_date
        .map(|due| format!("due date {due} has passed"));
    let step = Step {
        path: &[WorkflowStatus::Overdue],
        actor: SYSTEM_ACTOR,
        role: None,
        notes,
        at,
    };
    advance(review, step, |_| Ok(()))
}

/// Attaches the reviewer's rating and reviewed documents. An accepted review
/// that was never explicitly started is started on the way.
pub fn submit(
    review: &Review,
    input: &SubmitReviewInput,
    at: DateTime<Utc>,
) -> Result<Transition, ReviewError> {
    let path: &[WorkflowStatus] = match review.status {
        WorkflowStatus::Accepted => &[
            WorkflowStatus::InProgress,
            WorkflowStatus::SubmittedForVerification,
        ],
        _ => &[WorkflowStatus::SubmittedForVerification],
    };
    let step = Step {
        path,
        actor: &input.rating.submitted_by,
        role: Some(Role::Reviewer),
        notes: non_blank(input.rating.comments.as_ref()),
        at,
    };
    advance(review, step, |next| {
        let grade = require_grade("rating.grade", input.rating.grade)?;
        let submitted_by = require_text("rating.submitted_by", &input.rating.submitted_by)?;
        if let Some(hours) = input.rating.time_spent_hours {
            if !hours.is_finite() || hours < 0.0 {
                return Err(ReviewError::validation(
                    "rating.time_spent_hours",
                    "must be a non-negative number",
                ));
            }
        }
        let rating = ReviewerRating {
            grade,
            comments: non_blank(input.rating.comments.as_ref()),
            strengths: non_blank(input.rating.strengths.as_ref()),
            areas_for_improvement: non_blank(input.rating.areas_for_improvement.as_ref()),
            recommendations: non_blank(input.rating.recommendations.as_ref()),
            submitted_by: submitted_by.to_string(),
            submitted_at: at,
            time_spent_hours: input.rating.time_spent_hours,
        };
        let mut seq = next.documents.last().map_or(0, |doc| doc.seq);
        for (index, document) in input.reviewed_documents.iter().enumerate() {
            let name = require_text(&format!("reviewed_documents[{index}].name"), &document.name)?;
            let location = require_text(
                &format!("reviewed_documents[{index}].location"),
                &document.location,
            )?;
            seq += 1;
            next.documents.push(ReviewDocument {
                seq,
                category: document.category,
                name: name.to_string(),
                location: location.to_string(),
                uploaded_by: non_blank(Some(&document.uploaded_by))
                    .unwrap_or_else(|| submitted_by.to_string()),
                uploaded_at: at,
            });
        }
        next.assessment = Assessment::Rated { rating };
        Ok(())
    })
}

/// Records the technical director's verification. `modified` is set when the
/// verified grade differs from the reviewer's grade, which is kept for audit.
pub fn verify(
    review: &Review,
    input: &VerifyReviewInput,
    at: DateTime<Utc>,
) -> Result<Transition, ReviewError> {
    let step = Step {
        path: &[WorkflowStatus::VerifiedPendingFinal],
        actor: &input.verified_by,
        role: Some(Role::TechnicalDirector),
        notes: non_blank(input.verification_notes.as_ref()),
        at,
    };
    advance(review, step, |next| {
        let grade = require_grade("grade", input.grade)?;
        let verified_by = require_text("verified_by", &input.verified_by)?;
        let Assessment::Rated { rating } = &next.assessment else {
            return Err(ReviewError::validation(
                "reviewer_rating",
                "review has no reviewer rating to verify",
            ));
        };
        let original = rating.grade;
        let modified = grade != original;
        let agreement_level = input.agreement_level.unwrap_or(match grade.distance(original) {
            0 => AgreementLevel::Full,
            1 => AgreementLevel::Partial,
            _ => AgreementLevel::Disagree,
        });
        let verification = TechnicalDirectorVerification {
            grade,
            original_reviewer_grade: original,
            modified,
            verification_notes: non_blank(input.verification_notes.as_ref()),
            agreement_level,
            verified_by: verified_by.to_string(),
            verified_at: at,
        };
        next.assessment = Assessment::Verified {
            rating: rating.clone(),
            verification,
        };
        Ok(())
    })
}

/// verified_pending_final -> completed, attaching the CEO's final review.
pub fn finalize(
    review: &Review,
    input: &FinalizeReviewInput,
    at: DateTime<Utc>,
) -> Result<Transition, ReviewError> {
    let step = Step {
        path: &[WorkflowStatus::Completed],
        actor: &input.finalized_by,
        role: Some(Role::Ceo),
        notes: non_blank(input.admin_notes.as_ref()),
        at,
    };
    advance(review, step, |next| {
        let final_grade = require_grade("final_grade", input.final_grade)?;
        let finalized_by = require_text("finalized_by", &input.finalized_by)?;
        let Assessment::Verified {
            rating,
            verification,
        } = &next.assessment
        else {
            return Err(ReviewError::validation(
                "verification",
                "review has no verification to finalize",
            ));
        };
        next.assessment = Assessment::Finalized {
            rating: rating.clone(),
            verification: verification.clone(),
            final_review: CeoFinalReview {
                final_grade,
                finalized_by: finalized_by.to_string(),
                finalized_at: at,
                admin_notes: non_blank(input.admin_notes.as_ref()),
            },
        };
        Ok(())
    })
}

/// verified_pending_final -> rejected. Only valid at the final stage.
pub fn reject_at_final(
    review: &Review,
    input: &RejectReviewInput,
    at: DateTime<Utc>,
) -> Result<Transition, ReviewError> {
    if review.status != WorkflowStatus::VerifiedPendingFinal {
        return Err(ReviewError::InvalidTransition {
            from: review.status,
            to: WorkflowStatus::Rejected,
        });
    }
    reject(review, input, at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        DocumentCategory, DocumentInput, RatingInput, ReviewId, ReviewMode, ReviewType,
    };
    use chrono::{NaiveDate, TimeZone};

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, minute, 0).unwrap()
    }

    fn draft() -> Review {
        Review {
            id: ReviewId::generate(),
            member_firm: "FirmX".to_string(),
            review_type: ReviewType::Normal,
            review_mode: ReviewMode::Remote,
            country: "Kenya".to_string(),
            reviewer: None,
            reviewer_id: None,
            status: WorkflowStatus::Draft,
            acceptance: AcceptanceTracking::pending(),
            assessment: Assessment::Pending,
            rejection: None,
            start_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
            due_date: Some(NaiveDate::from_ymd_opt(2026, 3, 20).unwrap()),
            documents: Vec::new(),
            history: Vec::new(),
            version: 0,
            created_at: at(0),
            last_updated: at(0),
        }
    }

    fn assign_input() -> AssignReviewInput {
        AssignReviewInput {
            reviewer_id: "R1".to_string(),
            reviewer_name: Some("Rita One".to_string()),
            assigned_by: "admin".to_string(),
        }
    }

    fn accept_as(actor: &str, role: Role) -> AcceptReviewInput {
        AcceptReviewInput {
            accepted_by: actor.to_string(),
            accepted_by_role: role,
            acceptance_notes: None,
        }
    }

    fn reject_as(actor: &str, role: Role, reason: &str) -> RejectReviewInput {
        RejectReviewInput {
            rejected_by: actor.to_string(),
            rejected_by_role: role,
            rejection_reason: reason.to_string(),
        }
    }

    fn submit_input(grade: Option<Grade>) -> SubmitReviewInput {
        SubmitReviewInput {
            rating: RatingInput {
                grade,
                comments: Some("solid file work".to_string()),
                strengths: Some("documentation".to_string()),
                areas_for_improvement: None,
                recommendations: None,
                submitted_by: "R1".to_string(),
                time_spent_hours: Some(12.5),
            },
            reviewed_documents: vec![DocumentInput {
                category: DocumentCategory::Reviewed,
                name: "engagement-file.pdf".to_string(),
                location: "blob://reviews/engagement-file.pdf".to_string(),
                uploaded_by: String::new(),
            }],
        }
    }

    fn verify_input(grade: Option<Grade>) -> VerifyReviewInput {
        VerifyReviewInput {
            grade,
            verification_notes: Some("checked sampling".to_string()),
            agreement_level: None,
            verified_by: "TD".to_string(),
        }
    }

    fn accepted() -> Review {
        let review = assign(&draft(), &assign_input(), at(1)).unwrap().review;
        let review = accept(&review, &accept_as("R1", Role::Reviewer), at(2))
            .unwrap()
            .review;
        accept(&review, &accept_as("FirmX", Role::MemberFirm), at(3))
            .unwrap()
            .review
    }

    fn verified(reviewer_grade: Grade, verified_grade: Grade) -> Review {
        let review = submit(&accepted(), &submit_input(Some(reviewer_grade)), at(4))
            .unwrap()
            .review;
        verify(&review, &verify_input(Some(verified_grade)), at(5))
            .unwrap()
            .review
    }

    #[test]
    fn end_to_end_from_draft_to_completed() {
        let review = draft();

        let t = assign(&review, &assign_input(), at(1)).unwrap();
        assert_eq!(t.review.status, WorkflowStatus::PendingAcceptance);
        assert_eq!(t.entry.from, WorkflowStatus::Draft);
        assert_eq!(t.review.reviewer_id.as_deref(), Some("R1"));

        let t = accept(&t.review, &accept_as("R1", Role::Reviewer), at(2)).unwrap();
        assert_eq!(t.review.status, WorkflowStatus::ReviewerAccepted);

        let t = accept(&t.review, &accept_as("FirmX", Role::MemberFirm), at(3)).unwrap();
        assert_eq!(t.review.status, WorkflowStatus::Accepted);

        let t = submit(&t.review, &submit_input(Some(Grade::Two)), at(4)).unwrap();
        assert_eq!(t.review.status, WorkflowStatus::SubmittedForVerification);
        assert_eq!(t.entry.from, WorkflowStatus::Accepted);

        let t = verify(&t.review, &verify_input(Some(Grade::One)), at(5)).unwrap();
        assert_eq!(t.review.status, WorkflowStatus::VerifiedPendingFinal);
        assert!(t.review.verification().unwrap().modified);

        let t = finalize(
            &t.review,
            &FinalizeReviewInput {
                final_grade: Some(Grade::One),
                admin_notes: Some("agreed with TD".to_string()),
                finalized_by: "CEO".to_string(),
            },
            at(6),
        )
        .unwrap();
        assert_eq!(t.review.status, WorkflowStatus::Completed);
        assert_eq!(t.review.final_review().unwrap().final_grade, Grade::One);
        assert_eq!(t.review.history.len(), 6);
        let seqs: Vec<u32> = t.review.history.iter().map(|entry| entry.seq).collect();
        assert_eq!(seqs, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(t.review.last_updated, at(6));
    }

    #[test]
    fn transitions_do_not_touch_the_input_review() {
        let review = draft();
        let before = review.clone();
        let t = assign(&review, &assign_input(), at(1)).unwrap();
        assert_eq!(review, before);
        assert_eq!(t.review.history.last(), Some(&t.entry));
    }

    #[test]
    fn transitions_are_deterministic() {
        let review = draft();
        let first = assign(&review, &assign_input(), at(1)).unwrap();
        let second = assign(&review, &assign_input(), at(1)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn acceptance_order_does_not_matter() {
        let pending = assign(&draft(), &assign_input(), at(1)).unwrap().review;

        let firm_first = accept(&pending, &accept_as("FirmX", Role::MemberFirm), at(2)).unwrap();
        assert_eq!(firm_first.review.status, WorkflowStatus::FirmAccepted);
        let firm_first = accept(&firm_first.review, &accept_as("R1", Role::Reviewer), at(3))
            .unwrap()
            .review;

        let reviewer_first = accept(&pending, &accept_as("R1", Role::Reviewer), at(2)).unwrap();
        let reviewer_first = accept(
            &reviewer_first.review,
            &accept_as("FirmX", Role::MemberFirm),
            at(3),
        )
        .unwrap()
        .review;

        assert_eq!(firm_first.status, WorkflowStatus::Accepted);
        assert_eq!(reviewer_first.status, WorkflowStatus::Accepted);
        assert!(is_acceptance_complete(&firm_first.acceptance));
    }

    #[test]
    fn same_party_cannot_accept_twice() {
        let pending = assign(&draft(), &assign_input(), at(1)).unwrap().review;
        let once = accept(&pending, &accept_as("R1", Role::Reviewer), at(2))
            .unwrap()
            .review;
        let err = accept(&once, &accept_as("R1", Role::Reviewer), at(3)).unwrap_err();
        assert_eq!(
            err,
            ReviewError::InvalidTransition {
                from: WorkflowStatus::ReviewerAccepted,
                to: WorkflowStatus::ReviewerAccepted,
            }
        );
    }

    #[test]
    fn accept_by_non_party_is_a_validation_error() {
        let pending = assign(&draft(), &assign_input(), at(1)).unwrap().review;
        let err = accept(&pending, &accept_as("boss", Role::Admin), at(2)).unwrap_err();
        assert!(
            matches!(err, ReviewError::Validation { ref field, .. } if field == "accepted_by_role")
        );
    }

    #[test]
    fn non_party_accept_is_a_validation_error_after_one_party_accepted() {
        let pending = assign(&draft(), &assign_input(), at(1)).unwrap().review;
        let reviewer_ok = accept(&pending, &accept_as("R1", Role::Reviewer), at(2))
            .unwrap()
            .review;
        let firm_ok = accept(&pending, &accept_as("FirmX", Role::MemberFirm), at(2))
            .unwrap()
            .review;
        for review in [&reviewer_ok, &firm_ok] {
            let err = accept(review, &accept_as("boss", Role::Admin), at(3)).unwrap_err();
            let is_role_error = matches!(
                err,
                ReviewError::Validation { ref field, .. } if field == "accepted_by_role"
            );
            assert!(is_role_error, "{:?}: {err:?}", review.status);
        }
    }

    #[test]
    fn accept_outside_acceptance_is_invalid() {
        let err = accept(&draft(), &accept_as("R1", Role::Reviewer), at(1)).unwrap_err();
        assert!(matches!(err, ReviewError::InvalidTransition { from: WorkflowStatus::Draft, .. }));
    }

    #[test]
    fn rejection_wins_over_partial_acceptance() {
        let pending = assign(&draft(), &assign_input(), at(1)).unwrap().review;
        let reviewer_ok = accept(&pending, &accept_as("R1", Role::Reviewer), at(2))
            .unwrap()
            .review;
        let t = reject(
            &reviewer_ok,
            &reject_as("FirmX", Role::MemberFirm, "scheduling conflict"),
            at(3),
        )
        .unwrap();
        assert_eq!(t.review.status, WorkflowStatus::Rejected);
        assert!(t.review.acceptance.reviewer.is_accepted());
        assert!(matches!(
            t.review.acceptance.firm,
            PartyDecision::Rejected { ref reason, .. } if reason == "scheduling conflict"
        ));
        let rejection = t.review.rejection.unwrap();
        assert_eq!(rejection.from, WorkflowStatus::ReviewerAccepted);
        assert_eq!(rejection.role, Role::MemberFirm);
    }

    #[test]
    fn rejecting_twice_fails_both_times() {
        let pending = assign(&draft(), &assign_input(), at(1)).unwrap().review;
        let rejected = reject(&pending, &reject_as("R1", Role::Reviewer, "busy"), at(2))
            .unwrap()
            .review;
        for _ in 0..2 {
            let err = reject(&rejected, &reject_as("R1", Role::Reviewer, "busy"), at(3))
                .unwrap_err();
            assert_eq!(
                err,
                ReviewError::InvalidTransition {
                    from: WorkflowStatus::Rejected,
                    to: WorkflowStatus::Rejected,
                }
            );
        }
    }

    #[test]
    fn blank_rejection_reason_is_rejected() {
        let pending = assign(&draft(), &assign_input(), at(1)).unwrap().review;
        let err = reject(&pending, &reject_as("R1", Role::Reviewer, "   "), at(2)).unwrap_err();
        assert_eq!(
            err,
            ReviewError::validation("rejection_reason", "must not be blank")
        );
    }

    #[test]
    fn submit_before_acceptance_fails_and_leaves_review_unchanged() {
        let pending = assign(&draft(), &assign_input(), at(1)).unwrap().review;
        let before = pending.clone();
        let err = submit(&pending, &submit_input(Some(Grade::Two)), at(2)).unwrap_err();
        assert_eq!(
            err,
            ReviewError::InvalidTransition {
                from: WorkflowStatus::PendingAcceptance,
                to: WorkflowStatus::SubmittedForVerification,
            }
        );
        assert_eq!(pending, before);
    }

    #[test]
    fn submit_requires_a_grade() {
        let started = start(
            &accepted(),
            &StartReviewInput {
                started_by: "R1".to_string(),
            },
            at(4),
        )
        .unwrap()
        .review;
        assert_eq!(started.status, WorkflowStatus::InProgress);
        let err = submit(&started, &submit_input(None), at(5)).unwrap_err();
        assert!(
            matches!(err, ReviewError::Validation { ref field, .. } if field == "rating.grade")
        );
    }

    #[test]
    fn submit_attaches_rating_and_numbers_documents() {
        let t = submit(&accepted(), &submit_input(Some(Grade::Three)), at(4)).unwrap();
        let rating = t.review.reviewer_rating().unwrap();
        assert_eq!(rating.grade, Grade::Three);
        assert_eq!(rating.submitted_at, at(4));
        assert_eq!(t.review.documents.len(), 1);
        assert_eq!(t.review.documents[0].seq, 1);
        assert_eq!(t.review.documents[0].uploaded_by, "R1");
        assert!(t.review.verification().is_none());
    }

    #[test]
    fn overdue_reviews_can_still_be_submitted() {
        let started = start(
            &accepted(),
            &StartReviewInput {
                started_by: "R1".to_string(),
            },
            at(4),
        )
        .unwrap()
        .review;
        let overdue = mark_overdue(&started, at(5)).unwrap();
        assert_eq!(overdue.review.status, WorkflowStatus::Overdue);
        assert_eq!(overdue.entry.actor, SYSTEM_ACTOR);
        let t = submit(&overdue.review, &submit_input(Some(Grade::Four)), at(6)).unwrap();
        assert_eq!(t.review.status, WorkflowStatus::SubmittedForVerification);
    }

    #[test]
    fn verify_keeps_original_grade_for_audit() {
        let review = verified(Grade::Two, Grade::Four);
        let verification = review.verification().unwrap();
        assert!(verification.modified);
        assert_eq!(verification.original_reviewer_grade, Grade::Two);
        assert_eq!(verification.grade, Grade::Four);
        assert_eq!(verification.agreement_level, AgreementLevel::Disagree);
        assert_eq!(review.reviewer_rating().unwrap().grade, Grade::Two);
    }

    #[test]
    fn verify_with_same_grade_is_unmodified() {
        let review = verified(Grade::Three, Grade::Three);
        let verification = review.verification().unwrap();
        assert!(!verification.modified);
        assert_eq!(verification.agreement_level, AgreementLevel::Full);
    }

    #[test]
    fn verify_requires_grade() {
        let submitted = submit(&accepted(), &submit_input(Some(Grade::Two)), at(4))
            .unwrap()
            .review;
        let err = verify(&submitted, &verify_input(None), at(5)).unwrap_err();
        assert!(matches!(err, ReviewError::Validation { ref field, .. } if field == "grade"));
    }

    #[test]
    fn finalize_requires_verified_status() {
        let submitted = submit(&accepted(), &submit_input(Some(Grade::Two)), at(4))
            .unwrap()
            .review;
        let err = finalize(
            &submitted,
            &FinalizeReviewInput {
                final_grade: Some(Grade::Two),
                admin_notes: None,
                finalized_by: "CEO".to_string(),
            },
            at(5),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ReviewError::InvalidTransition {
                from: WorkflowStatus::SubmittedForVerification,
                to: WorkflowStatus::Completed,
            }
        );
    }

    #[test]
    fn reject_at_final_is_terminal_and_keeps_assessment() {
        let review = verified(Grade::Two, Grade::Three);
        let input = reject_as("CEO", Role::Ceo, "insufficient evidence");
        let t = reject_at_final(&review, &input, at(6)).unwrap();
        assert_eq!(t.review.status, WorkflowStatus::Rejected);
        assert!(t.review.verification().is_some());
        assert!(t.review.final_review().is_none());
        assert_eq!(
            t.review.rejection.as_ref().map(|r| r.from),
            Some(WorkflowStatus::VerifiedPendingFinal)
        );
        let err = finalize(
            &t.review,
            &FinalizeReviewInput {
                final_grade: Some(Grade::One),
                admin_notes: None,
                finalized_by: "CEO".to_string(),
            },
            at(7),
        )
        .unwrap_err();
        assert!(matches!(err, ReviewError::InvalidTransition { .. }));
    }

    #[test]
    fn reject_at_final_refuses_acceptance_stage() {
        let pending = assign(&draft(), &assign_input(), at(1)).unwrap().review;
        let err = reject_at_final(&pending, &reject_as("CEO", Role::Ceo, "no"), at(2)).unwrap_err();
        assert_eq!(
            err,
            ReviewError::InvalidTransition {
                from: WorkflowStatus::PendingAcceptance,
                to: WorkflowStatus::Rejected,
            }
        );
    }

    #[test]
    fn open_then_assign_records_two_entries() {
        let opened = open(
            &draft(),
            &OpenReviewInput {
                opened_by: "admin".to_string(),
            },
            at(1),
        )
        .unwrap();
        assert_eq!(opened.review.status, WorkflowStatus::PendingAssignment);
        let assigned = assign(&opened.review, &assign_input(), at(2)).unwrap();
        assert_eq!(assigned.review.history.len(), 2);
        assert_eq!(assigned.entry.from, WorkflowStatus::PendingAssignment);
        assert_eq!(assigned.entry.seq, 2);
    }

    fn create_input() -> CreateReviewInput {
        CreateReviewInput {
            member_firm: "FirmX".to_string(),
            review_type: ReviewType::Quick,
            review_mode: ReviewMode::Onsite,
            country: "Ghana".to_string(),
            start_date: NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 4, 10).unwrap(),
            due_date: None,
            initial_status: None,
        }
    }

    #[test]
    fn create_starts_in_draft_without_history() {
        let review = create(ReviewId::generate(), &create_input(), at(0)).unwrap();
        assert_eq!(review.status, WorkflowStatus::Draft);
        assert!(review.history.is_empty());
        assert_eq!(review.budgeted_hours(), 16);
        assert_eq!(review.version, 0);
    }

    #[test]
    fn create_rejects_other_initial_statuses_and_bad_dates() {
        let mut input = create_input();
        input.initial_status = Some(WorkflowStatus::PendingAssignment);
        assert_eq!(
            create(ReviewId::generate(), &input, at(0)).unwrap().status,
            WorkflowStatus::PendingAssignment
        );

        input.initial_status = Some(WorkflowStatus::InProgress);
        let err = create(ReviewId::generate(), &input, at(0)).unwrap_err();
        assert!(
            matches!(err, ReviewError::Validation { ref field, .. } if field == "initial_status")
        );

        let mut input = create_input();
        input.end_date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let err = create(ReviewId::generate(), &input, at(0)).unwrap_err();
        assert!(matches!(err, ReviewError::Validation { ref field, .. } if field == "end_date"));
    }

    #[test]
    fn assign_requires_reviewer_id() {
        let mut input = assign_input();
        input.reviewer_id = " ".to_string();
        let err = assign(&draft(), &input, at(1)).unwrap_err();
        assert!(matches!(err, ReviewError::Validation { ref field, .. } if field == "reviewer_id"));
    }
}
