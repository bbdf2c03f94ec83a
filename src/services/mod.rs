pub mod categories;
pub mod events;
pub mod merge;

use thiserror::Error;

use crate::store::StoreError;

pub use categories::CategoryService;
pub use events::EventService;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid request: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error(transparent)]
    Store(#[from] StoreError),
}
