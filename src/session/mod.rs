//! The assembled engine: one store, one cursor, one ledger, one queue and
//! one timer behind a single owner.

mod builder;
mod driver;
mod session;
mod shared;
mod snapshot;

pub use builder::{create_session, SessionBuilder};
pub use driver::{DriverStats, SessionDriver};
pub use session::{Session, TickReport};
pub use shared::SharedSession;
pub use snapshot::{SessionSnapshot, TaskSummary};
