mod content_item;
mod store;

pub use content_item::{ContentItem, Counters, ItemId};
pub use store::{ItemStore, StoreEvent};
