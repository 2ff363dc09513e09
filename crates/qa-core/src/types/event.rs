use crate::types::review::{HistoryEntry, Review};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", content = "payload")]
pub enum EventBody {
    ReviewCreated {
        review: Review,
    },
    ReviewOpened {
        review: Review,
        entry: HistoryEntry,
    },
    ReviewAssigned {
        review: Review,
        entry: HistoryEntry,
    },
    ReviewAccepted {
        review: Review,
        entry: HistoryEntry,
    },
    ReviewRejected {
        review: Review,
        entry: HistoryEntry,
    },
    ReviewStarted {
        review: Review,
        entry: HistoryEntry,
    },
    ReviewOverdue {
        review: Review,
        entry: HistoryEntry,
    },
    ReviewSubmitted {
        review: Review,
        entry: HistoryEntry,
    },
    ReviewVerified {
        review: Review,
        entry: HistoryEntry,
    },
    ReviewFinalized {
        review: Review,
        entry: HistoryEntry,
    },
}

impl EventBody {
    pub fn review(&self) -> &Review {
        match self {
            Self::ReviewCreated { review }
            | Self::ReviewOpened { review, .. }
            | Self::ReviewAssigned { review, .. }
            | Self::ReviewAccepted { review, .. }
            | Self::ReviewRejected { review, .. }
            | Self::ReviewStarted { review, .. }
            | Self::ReviewOverdue { review, .. }
            | Self::ReviewSubmitted { review, .. }
            | Self::ReviewVerified { review, .. }
            | Self::ReviewFinalized { review, .. } => review,
        }
    }
}
