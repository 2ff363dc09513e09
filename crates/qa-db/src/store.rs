use qa_core::error::{QaError, ReviewError};
use qa_core::store::Store;
use rusqlite::Connection;

use crate::event_repo::EventRepo;
use crate::review_repo::ReviewRepo;

pub struct DbStore {
    conn: Connection,
}

impl DbStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }
}

impl Store for DbStore {
    type Reviews<'a>
        = ReviewRepo<'a>
    where
        Self: 'a;
    type Events<'a>
        = EventRepo<'a>
    where
        Self: 'a;

    fn reviews(&self) -> Self::Reviews<'_> {
        ReviewRepo::new(&self.conn)
    }

    fn events(&self) -> Self::Events<'_> {
        EventRepo::new(&self.conn)
    }

    fn with_tx<F, T>(&self, f: F) -> Result<T, QaError>
    where
        F: FnOnce(&Self) -> Result<T, QaError>,
    {
        self.conn
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(tx_error)?;
        match f(self) {
            Ok(value) => {
                self.conn.execute_batch("COMMIT").map_err(tx_error)?;
                Ok(value)
            }
            Err(err) => {
                self.conn.execute_batch("ROLLBACK").map_err(tx_error)?;
                Err(err)
            }
        }
    }
}

fn tx_error(err: rusqlite::Error) -> QaError {
    QaError::from(ReviewError::storage(err))
}
