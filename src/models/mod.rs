pub mod category;
pub mod event;

pub use category::{Category, CreateCategoryRequest};
pub use event::{CreateEventRequest, Event, EventPatch, EventStatus};
