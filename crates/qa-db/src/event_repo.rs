use crate::util::{decode_enum, decode_json, encode_enum, encode_json, from_rfc3339, to_rfc3339};
use qa_core::error::{QaError, ReviewError};
use qa_core::events::EventRepository;
use qa_events::types::EventRecord;
use rusqlite::{Connection, Row, params};
use ulid::Ulid;

pub struct EventRepo<'a> {
    pub conn: &'a Connection,
}

impl<'a> EventRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl<'a> EventRepository for EventRepo<'a> {
    fn append(&self, mut event: EventRecord) -> Result<EventRecord, QaError> {
        event.seq = next_seq(self.conn)?;
        event.id = format!("evt_{}", Ulid::new());
        self.conn
            .execute(
                "INSERT INTO events (id, seq, at, correlation_id, source, body_json) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    event.id,
                    event.seq,
                    to_rfc3339(&event.at),
                    event.correlation_id,
                    encode_enum(&event.source).map_err(ReviewError::from)?,
                    encode_json(&event.body).map_err(ReviewError::from)?,
                ],
            )
            .map_err(storage)?;
        Ok(event)
    }

    fn list(&self, after: Option<i64>, limit: Option<u32>) -> Result<Vec<EventRecord>, QaError> {
        // SQLite treats a negative LIMIT as unbounded.
        let limit = limit.map_or(-1, i64::from);
        let mut stmt = self
            .conn
            .prepare("SELECT id, seq, at, correlation_id, source, body_json FROM events WHERE seq > ?1 ORDER BY seq ASC LIMIT ?2")
            .map_err(storage)?;
        let mut rows = stmt
            .query(params![after.unwrap_or(0), limit])
            .map_err(storage)?;
        let mut events = Vec::new();
        while let Some(row) = rows.next().map_err(storage)? {
            events.push(map_event_row(row).map_err(QaError::from)?);
        }
        Ok(events)
    }
}

fn storage(err: rusqlite::Error) -> QaError {
    QaError::from(ReviewError::storage(err))
}

fn map_event_row(row: &Row<'_>) -> Result<EventRecord, ReviewError> {
    let get_text = |index: usize| -> Result<String, ReviewError> {
        row.get(index).map_err(ReviewError::storage)
    };
    let at = get_text(2)?;
    let source = get_text(4)?;
    let body = get_text(5)?;
    Ok(EventRecord {
        id: get_text(0)?,
        seq: row.get(1).map_err(ReviewError::storage)?,
        at: from_rfc3339(&at)?,
        correlation_id: row.get(3).map_err(ReviewError::storage)?,
        source: decode_enum(&source)?,
        body: decode_json(&body)?,
    })
}

fn next_seq(conn: &Connection) -> Result<i64, QaError> {
    let seq: i64 = conn
        .query_row("SELECT COALESCE(MAX(seq), 0) FROM events", [], |row| {
            row.get(0)
        })
        .map_err(storage)?;
    Ok(seq + 1)
}
