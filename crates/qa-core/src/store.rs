use crate::QaError;
use crate::events::EventRepository;
use crate::reviews::ReviewRepository;

pub trait Store {
    type Reviews<'a>: ReviewRepository
    where
        Self: 'a;
    type Events<'a>: EventRepository
    where
        Self: 'a;

    fn reviews(&self) -> Self::Reviews<'_>;
    fn events(&self) -> Self::Events<'_>;

    fn with_tx<F, T>(&self, f: F) -> Result<T, QaError>
    where
        F: FnOnce(&Self) -> Result<T, QaError>;
}
