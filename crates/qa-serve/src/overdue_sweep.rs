use crate::{AppState, build_desk};
use chrono::{NaiveDate, Utc};
use qa_core::types::Review;
use qa_core::{QaError, RequestContext};
use qa_events::types::EventSource;
use std::time::Duration;

pub fn sweep_once(state: &AppState, today: NaiveDate) -> Result<Vec<Review>, QaError> {
    let desk = build_desk(state)?;
    let ctx = RequestContext::new(EventSource::Scheduler, None);
    desk.reviews().sweep_overdue(&ctx, today)
}

/// Runs the sweep on a fixed interval until the task is dropped.
pub async fn run(state: AppState, every: Duration) {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        match sweep_once(&state, Utc::now().date_naive()) {
            Ok(moved) if moved.is_empty() => {}
            Ok(moved) => tracing::info!(count = moved.len(), "marked reviews overdue"),
            Err(err) => tracing::warn!(error = %err, "overdue sweep failed"),
        }
    }
}
