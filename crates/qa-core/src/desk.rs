use crate::error::{QaError, ReviewError};
use crate::events::EventRepository;
use crate::notifications::{LogNotifier, Notifier, dispatch, notifications_for};
use crate::reviews::ReviewRepository;
use crate::status::WorkflowStatus;
use crate::store::Store;
use crate::types::event::EventBody;
use crate::types::io::{
    AcceptReviewInput, AssignReviewInput, CreateReviewInput, FinalizeReviewInput,
    OpenReviewInput, RejectReviewInput, ReviewFilter, StartReviewInput, SubmitReviewInput,
    VerifyReviewInput, Viewer,
};
use crate::types::review::{HistoryEntry, Review};
use crate::types::ReviewId;
use crate::views::{Dashboard, awaiting_action, overdue_candidates, summarize};
use crate::workflow::{self, Transition};
use chrono::{DateTime, NaiveDate, Utc};
use qa_events::bus::EventBus;
use qa_events::types::{EventRecord, EventSource};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub source: EventSource,
    pub correlation_id: Option<String>,
    /// When set, the transition only applies if the stored review is still at this version.
    pub expected_version: Option<u64>,
}

impl RequestContext {
    pub fn new(source: EventSource, correlation_id: Option<String>) -> Self {
        Self {
            source,
            correlation_id,
            expected_version: None,
        }
    }

    #[must_use]
    pub fn with_expected_version(mut self, version: Option<u64>) -> Self {
        self.expected_version = version;
        self
    }
}

/// Runs workflow transitions against a [`Store`], recording an event for each
/// committed change and fanning it out to subscribers and the notifier.
pub struct ReviewDesk<S: Store> {
    store: S,
    event_bus: EventBus,
    notifier: Arc<dyn Notifier>,
}

impl<S: Store> ReviewDesk<S> {
    pub fn new(store: S, event_bus: EventBus) -> Self {
        Self {
            store,
            event_bus,
            notifier: Arc::new(LogNotifier),
        }
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn reviews(&self) -> ReviewsApi<'_, S> {
        ReviewsApi { core: self }
    }

    pub fn events(&self) -> EventsApi<'_, S> {
        EventsApi { core: self }
    }

    fn with_events<T, F>(&self, ctx: &RequestContext, f: F) -> Result<T, QaError>
    where
        F: FnOnce(&S) -> Result<(T, Vec<EventBody>), QaError>,
    {
        let (value, committed) = self.store.with_tx(|store| {
            let (value, bodies) = f(store)?;
            let mut committed = Vec::new();
            for body in bodies {
                let record = build_event_record(ctx, &body)?;
                let record = store.events().append(record)?;
                committed.push((body, record));
            }
            Ok((value, committed))
        })?;
        for (body, record) in committed {
            let _ = self.event_bus.publish(record);
            dispatch(self.notifier.as_ref(), &notifications_for(&body));
        }
        Ok(value)
    }
}

pub struct ReviewsApi<'a, S: Store> {
    core: &'a ReviewDesk<S>,
}

impl<'a, S: Store> ReviewsApi<'a, S> {
    pub fn get(&self, id: &ReviewId) -> Result<Option<Review>, QaError> {
        self.core
            .store
            .reviews()
            .get(id)
            .map_err(QaError::from)
    }

    pub fn require(&self, id: &ReviewId) -> Result<Review, QaError> {
        self.get(id)?
            .ok_or_else(|| QaError::from(ReviewError::ReviewNotFound))
    }

    pub fn list(&self, filter: &ReviewFilter) -> Result<Vec<Review>, QaError> {
        self.core
            .store
            .reviews()
            .list(filter)
            .map_err(QaError::from)
    }

    pub fn history(&self, id: &ReviewId) -> Result<Vec<HistoryEntry>, QaError> {
        self.require(id)?;
        self.core
            .store
            .reviews()
            .history(id)
            .map_err(QaError::from)
    }

    pub fn create(
        &self,
        ctx: &RequestContext,
        input: &CreateReviewInput,
    ) -> Result<Review, QaError> {
        let review = self.core.with_events(ctx, |store| {
            let review = workflow::create(ReviewId::generate(), input, Utc::now())?;
            let review = store.reviews().create(&review)?;
            Ok((
                review.clone(),
                vec![EventBody::ReviewCreated { review }],
            ))
        })?;
        tracing::info!(review_id = %review.id, status = %review.status, "review created");
        Ok(review)
    }

    pub fn open(
        &self,
        ctx: &RequestContext,
        id: &ReviewId,
        input: &OpenReviewInput,
    ) -> Result<Review, QaError> {
        self.transition(
            ctx,
            id,
            |review, at| workflow::open(review, input, at),
            |review, entry| EventBody::ReviewOpened { review, entry },
        )
    }

    pub fn assign(
        &self,
        ctx: &RequestContext,
        id: &ReviewId,
        input: &AssignReviewInput,
    ) -> Result<Review, QaError> {
        self.transition(
            ctx,
            id,
            |review, at| workflow::assign(review, input, at),
            |review, entry| EventBody::ReviewAssigned { review, entry },
        )
    }

    pub fn accept(
        &self,
        ctx: &RequestContext,
        id: &ReviewId,
        input: &AcceptReviewInput,
    ) -> Result<Review, QaError> {
        self.transition(
            ctx,
            id,
            |review, at| workflow::accept(review, input, at),
            |review, entry| EventBody::ReviewAccepted { review, entry },
        )
    }

    pub fn reject(
        &self,
        ctx: &RequestContext,
        id: &ReviewId,
        input: &RejectReviewInput,
    ) -> Result<Review, QaError> {
        self.transition(
            ctx,
            id,
            |review, at| workflow::reject(review, input, at),
            |review, entry| EventBody::ReviewRejected { review, entry },
        )
    }

    pub fn start(
        &self,
        ctx: &RequestContext,
        id: &ReviewId,
        input: &StartReviewInput,
    ) -> Result<Review, QaError> {
        self.transition(
            ctx,
            id,
            |review, at| workflow::start(review, input, at),
            |review, entry| EventBody::ReviewStarted { review, entry },
        )
    }

    pub fn mark_overdue(&self, ctx: &RequestContext, id: &ReviewId) -> Result<Review, QaError> {
        self.transition(
            ctx,
            id,
            workflow::mark_overdue,
            |review, entry| EventBody::ReviewOverdue { review, entry },
        )
    }

    pub fn submit(
        &self,
        ctx: &RequestContext,
        id: &ReviewId,
        input: &SubmitReviewInput,
    ) -> Result<Review, QaError> {
        self.transition(
            ctx,
            id,
            |review, at| workflow::submit(review, input, at),
            |review, entry| EventBody::ReviewSubmitted { review, entry },
        )
    }

    pub fn verify(
        &self,
        ctx: &RequestContext,
        id: &ReviewId,
        input: &VerifyReviewInput,
    ) -> Result<Review, QaError> {
        self.transition(
            ctx,
            id,
            |review, at| workflow::verify(review, input, at),
            |review, entry| EventBody::ReviewVerified { review, entry },
        )
    }

    pub fn finalize(
        &self,
        ctx: &RequestContext,
        id: &ReviewId,
        input: &FinalizeReviewInput,
    ) -> Result<Review, QaError> {
        self.transition(
            ctx,
            id,
            |review, at| workflow::finalize(review, input, at),
            |review, entry| EventBody::ReviewFinalized { review, entry },
        )
    }

    pub fn reject_at_final(
        &self,
        ctx: &RequestContext,
        id: &ReviewId,
        input: &RejectReviewInput,
    ) -> Result<Review, QaError> {
        self.transition(
            ctx,
            id,
            |review, at| workflow::reject_at_final(review, input, at),
            |review, entry| EventBody::ReviewRejected { review, entry },
        )
    }

    /// Marks every in-progress review due before `today` as overdue. Each
    /// review is moved in its own transaction; one failure does not stop the
    /// rest of the sweep.
    pub fn sweep_overdue(
        &self,
        ctx: &RequestContext,
        today: NaiveDate,
    ) -> Result<Vec<Review>, QaError> {
        let filter = ReviewFilter {
            status: Some(vec![WorkflowStatus::InProgress]),
            ..ReviewFilter::default()
        };
        let reviews = self.list(&filter)?;
        let mut moved = Vec::new();
        for candidate in overdue_candidates(&reviews, today) {
            let ctx = ctx.clone().with_expected_version(Some(candidate.version));
            match self.mark_overdue(&ctx, &candidate.id) {
                Ok(review) => moved.push(review),
                Err(err) => tracing::warn!(
                    review_id = %candidate.id,
                    error = %err,
                    "failed to mark review overdue"
                ),
            }
        }
        Ok(moved)
    }

    pub fn dashboard(&self, viewer: &Viewer) -> Result<Dashboard, QaError> {
        let reviews = self.list(&ReviewFilter::default())?;
        let summary = summarize(&reviews);
        let awaiting_action = reviews
            .into_iter()
            .filter(|review| awaiting_action(review, viewer))
            .map(Into::into)
            .collect();
        Ok(Dashboard {
            summary,
            awaiting_action,
        })
    }

    fn transition<F, E>(
        &self,
        ctx: &RequestContext,
        id: &ReviewId,
        apply: F,
        event: E,
    ) -> Result<Review, QaError>
    where
        F: FnOnce(&Review, DateTime<Utc>) -> Result<Transition, ReviewError>,
        E: FnOnce(Review, HistoryEntry) -> EventBody,
    {
        let (review, entry) = self.core.with_events(ctx, |store| {
            let current = store
                .reviews()
                .get(id)?
                .ok_or(ReviewError::ReviewNotFound)?;
            if let Some(expected) = ctx.expected_version {
                if expected != current.version {
                    return Err(ReviewError::Conflict {
                        expected,
                        actual: current.version,
                    }
                    .into());
                }
            }
            let Transition { review, entry } = apply(&current, Utc::now())?;
            let saved = store.reviews().save(&review, &entry, current.version)?;
            Ok((
                (saved.clone(), entry.clone()),
                vec![event(saved, entry)],
            ))
        })?;
        tracing::info!(
            review_id = %review.id,
            from = %entry.from,
            to = %entry.to,
            actor = %entry.actor,
            version = review.version,
            "review transitioned"
        );
        Ok(review)
    }
}

pub struct EventsApi<'a, S: Store> {
    core: &'a ReviewDesk<S>,
}

impl<'a, S: Store> EventsApi<'a, S> {
    pub fn list(
        &self,
        after: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<EventRecord>, QaError> {
        self.core.store.events().list(after, limit)
    }
}

fn build_event_record(ctx: &RequestContext, body: &EventBody) -> Result<EventRecord, QaError> {
    let value = serde_json::to_value(body).map_err(|err| QaError::Internal {
        message: err.to_string(),
    })?;
    Ok(EventRecord {
        id: String::new(),
        seq: 0,
        at: Utc::now(),
        correlation_id: ctx.correlation_id.clone(),
        source: ctx.source,
        body: value,
    })
}
