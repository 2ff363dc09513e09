use crate::routes::error::error_response;
use crate::{AppState, build_desk};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures::stream::{self, Stream, StreamExt};
use qa_events::types::EventRecord;
use std::convert::Infallible;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

fn to_sse(event: &EventRecord) -> Event {
    let json = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
    let sse = Event::default().id(event.seq.to_string()).data(json);
    match event.kind() {
        Some(kind) => sse.event(kind),
        None => sse,
    }
}

/// Yields `history` in order, then live events newer than the last one replayed.
fn replay_then_live(
    history: Vec<EventRecord>,
    after: Option<i64>,
    receiver: broadcast::Receiver<EventRecord>,
) -> impl Stream<Item = EventRecord> + Send + 'static {
    let last_seq = history.last().map(|event| event.seq).or(after).unwrap_or(0);
    let live = BroadcastStream::new(receiver).filter_map(move |item| async move {
        match item {
            Ok(event) if event.seq > last_seq => Some(event),
            Ok(_) => None,
            Err(err) => {
                tracing::warn!(error = %err, "event subscriber lagged");
                None
            }
        }
    });
    stream::iter(history).chain(live)
}

/// Replays stored events after `after`, then follows the live bus.
pub async fn subscribe(
    state: AppState,
    after: Option<i64>,
    correlation_id: Option<String>,
) -> Response {
    // Subscribe before reading history so nothing committed in between is lost.
    let receiver = state.event_bus.subscribe();
    let desk = match build_desk(&state) {
        Ok(desk) => desk,
        Err(err) => return error_response(&err, correlation_id),
    };
    let history = match desk.events().list(after, None) {
        Ok(events) => events,
        Err(err) => return error_response(&err, correlation_id),
    };

    let events = replay_then_live(history, after, receiver)
        .map(|event| Ok::<Event, Infallible>(to_sse(&event)));
    Sse::new(events)
        .keep_alive(KeepAlive::default())
        .into_response()
}
