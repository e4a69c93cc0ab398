mod controller;
mod position;

pub use controller::{CursorController, CursorEvent};
pub use position::{CursorPosition, InsertFrontPolicy};
