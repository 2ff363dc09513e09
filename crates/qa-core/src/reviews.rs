use crate::error::ReviewError;
use crate::types::{HistoryEntry, Review, ReviewFilter, ReviewId};

pub trait ReviewRepository {
    /// Inserts a new review at version 1.
    fn create(&self, review: &Review) -> Result<Review, ReviewError>;
    fn get(&self, id: &ReviewId) -> Result<Option<Review>, ReviewError>;
    fn list(&self, filter: &ReviewFilter) -> Result<Vec<Review>, ReviewError>;
    /// Persists `review` and appends `entry` to its history if the stored
    /// version still equals `expected_version`. Returns the review with its
    /// version bumped.
    fn save(
        &self,
        review: &Review,
        entry: &HistoryEntry,
        expected_version: u64,
    ) -> Result<Review, ReviewError>;
    fn history(&self, id: &ReviewId) -> Result<Vec<HistoryEntry>, ReviewError>;
}
