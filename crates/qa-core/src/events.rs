use crate::error::QaError;
use qa_events::types::EventRecord;

pub trait EventRepository {
    /// Assigns `id`, `seq` and `at` to the record and stores it.
    fn append(&self, event: EventRecord) -> Result<EventRecord, QaError>;
    fn list(&self, after: Option<i64>, limit: Option<u32>) -> Result<Vec<EventRecord>, QaError>;
}
