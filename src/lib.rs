//! Deterministic, replayable content-feed sessions.
//!
//! A [`Session`] owns an ordered [`ItemStore`], a [`CursorController`]
//! positioned in it, an [`EngagementLedger`] of per-actor toggles, an
//! [`EnrichmentQueue`] of cancellable asynchronous tasks and an
//! [`AutoAdvanceTimer`]. Time comes from an injected [`Clock`], so a
//! [`ManualClock`] replays any sequence of operations exactly.

mod clock;
mod config;
mod cursor;
mod engagement;
mod enrichment;
mod error;
mod item;
mod notify;
mod session;
mod source;
mod timer;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use config::SessionConfig;
pub use cursor::{CursorController, CursorEvent, CursorPosition, InsertFrontPolicy};
pub use engagement::{ActorId, EngagementEntry, EngagementKey, EngagementLedger, LedgerEvent};
pub use enrichment::{
    CandidateSource, EnrichmentQueue, EnrichmentTask, FixedCandidates, NoCandidates, QueueEvent,
    QueueStats, TaskFailure, TaskId, TaskKind, TaskOrigin, TaskState,
};
pub use error::{Result, SessionError};
pub use item::{ContentItem, Counters, ItemId, ItemStore, StoreEvent};
pub use notify::{Notifier, Subscription};
pub use session::{
    create_session, DriverStats, Session, SessionBuilder, SessionDriver, SessionSnapshot,
    SharedSession, TaskSummary, TickReport,
};
pub use source::{ContentSource, JsonSource};
pub use timer::{AutoAdvanceTimer, TimerEvent, TimerState};
