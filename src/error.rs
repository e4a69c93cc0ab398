use thiserror::Error;

use crate::enrichment::TaskId;
use crate::item::ItemId;

/// Result alias used by every fallible operation in the crate.
pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("item {0} already exists or was previously used")]
    DuplicateId(ItemId),

    #[error("item {0} not found")]
    ItemNotFound(ItemId),

    #[error("index {index} out of range for store of {len} items")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("task {0} not found")]
    TaskNotFound(TaskId),

    #[error("counter {counter} is not registered for item {item}")]
    UnknownCounter { item: ItemId, counter: String },

    #[error("auto-advance timer is already running")]
    AlreadyRunning,

    #[error("auto-advance interval must be greater than zero")]
    InvalidInterval,

    #[error("no candidates available to resolve the task")]
    EmptyCandidates,

    #[error("task {0} timed out")]
    Timeout(TaskId),

    #[error("task {0} was cancelled")]
    Cancelled(TaskId),

    #[error("task {0} is still pending")]
    TaskPending(TaskId),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("session lock poisoned during {0}")]
    LockPoisoned(&'static str),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("snapshot decode failed: {0}")]
    DecodeFailed(String),
}

impl SessionError {
    /// True for every "acted on something absent" variant.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            SessionError::ItemNotFound(_)
                | SessionError::IndexOutOfRange { .. }
                | SessionError::TaskNotFound(_)
        )
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::Config(err.to_string())
    }
}

impl From<bitcode::Error> for SessionError {
    fn from(err: bitcode::Error) -> Self {
        SessionError::DecodeFailed(err.to_string())
    }
}
