//! Notifications are plain data derived from committed events. Delivering
//! them is best effort: a failed delivery is logged and never undoes the
//! transition that produced it.

use crate::status::WorkflowStatus;
use crate::types::{EventBody, Review, ReviewId, Role};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ReviewAssigned,
    AcceptanceRecorded,
    ReviewAccepted,
    ReviewRejected,
    ReviewOverdue,
    ReadyForVerification,
    ReadyForFinalReview,
    ReviewCompleted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    pub kind: NotificationKind,
    pub review_id: ReviewId,
    /// Actor id where known, otherwise the role name.
    pub recipient: String,
    pub recipient_role: Role,
    pub payload: serde_json::Value,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification delivery failed: {message}")]
    Delivery { message: String },
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Writes each notification as a structured log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        tracing::info!(
            kind = ?notification.kind,
            review_id = %notification.review_id,
            recipient = %notification.recipient,
            recipient_role = %notification.recipient_role,
            payload = %notification.payload,
            "notification"
        );
        Ok(())
    }
}

/// Delivers every notification, logging failures. Returns how many were delivered.
pub fn dispatch(notifier: &dyn Notifier, notifications: &[Notification]) -> usize {
    let mut delivered = 0;
    for notification in notifications {
        match notifier.notify(notification) {
            Ok(()) => delivered += 1,
            Err(err) => tracing::warn!(
                review_id = %notification.review_id,
                kind = ?notification.kind,
                error = %err,
                "failed to deliver notification"
            ),
        }
    }
    delivered
}

pub fn notifications_for(body: &EventBody) -> Vec<Notification> {
    let review = body.review();
    let to = |kind: NotificationKind, role: Role| build(kind, review, role);
    match body {
        EventBody::ReviewCreated { .. }
        | EventBody::ReviewOpened { .. }
        | EventBody::ReviewStarted { .. } => Vec::new(),
        EventBody::ReviewAssigned { .. } => vec![
            to(NotificationKind::ReviewAssigned, Role::Reviewer),
            to(NotificationKind::ReviewAssigned, Role::MemberFirm),
        ],
        EventBody::ReviewAccepted { entry, .. } => {
            if review.status == WorkflowStatus::Accepted {
                vec![
                    to(NotificationKind::ReviewAccepted, Role::Admin),
                    to(NotificationKind::ReviewAccepted, Role::Reviewer),
                    to(NotificationKind::ReviewAccepted, Role::MemberFirm),
                ]
            } else {
                let waiting_on = match entry.role {
                    Some(Role::MemberFirm) => Role::Reviewer,
                    _ => Role::MemberFirm,
                };
                vec![to(NotificationKind::AcceptanceRecorded, waiting_on)]
            }
        }
        EventBody::ReviewRejected { entry, .. } => {
            let mut out = vec![to(NotificationKind::ReviewRejected, Role::Admin)];
            if entry.from == WorkflowStatus::VerifiedPendingFinal {
                out.push(to(NotificationKind::ReviewRejected, Role::Reviewer));
                out.push(to(NotificationKind::ReviewRejected, Role::TechnicalDirector));
            }
            out
        }
        EventBody::ReviewOverdue { .. } => vec![
            to(NotificationKind::ReviewOverdue, Role::Reviewer),
            to(NotificationKind::ReviewOverdue, Role::Admin),
        ],
        EventBody::ReviewSubmitted { .. } => vec![to(
            NotificationKind::ReadyForVerification,
            Role::TechnicalDirector,
        )],
        EventBody::ReviewVerified { .. } => {
            vec![to(NotificationKind::ReadyForFinalReview, Role::Ceo)]
        }
        EventBody::ReviewFinalized { .. } => vec![
            to(NotificationKind::ReviewCompleted, Role::Reviewer),
            to(NotificationKind::ReviewCompleted, Role::MemberFirm),
        ],
    }
}

fn build(kind: NotificationKind, review: &Review, role: Role) -> Notification {
    let recipient = match role {
        Role::Reviewer => review.reviewer_id.clone(),
        Role::MemberFirm => Some(review.member_firm.clone()),
        Role::Admin | Role::Ceo | Role::TechnicalDirector => None,
    }
    .unwrap_or_else(|| role.as_str().to_string());
    Notification {
        kind,
        review_id: review.id.clone(),
        recipient,
        recipient_role: role,
        payload: json!({
            "status": review.status,
            "stage": review.stage(),
            "member_firm": review.member_firm,
            "reviewer": review.reviewer,
        }),
    }
}
