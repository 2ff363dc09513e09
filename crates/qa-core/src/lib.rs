pub mod desk;
pub mod error;
pub mod events;
pub mod guard;
pub mod notifications;
pub mod reviews;
pub mod status;
pub mod store;
pub mod views;
pub mod workflow;

pub mod types;

pub use crate::desk::{RequestContext, ReviewDesk};
pub use crate::error::{QaError, ReviewError};
pub use crate::status::{WorkflowStage, WorkflowStatus};
pub use crate::store::Store;
