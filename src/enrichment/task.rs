use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};
use crate::item::ItemId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(u64);

impl TaskId {
    pub fn new(id: u64) -> Self {
        TaskId(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// What an enrichment task stands for. The queue treats every kind alike.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskKind {
    Generate,
    Translate,
    Moderate,
    Validate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    Pending,
    Succeeded,
    Failed,
    Cancelled,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskState::Pending)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskFailure {
    EmptyCandidates,
    Timeout,
    Backend(String),
}

/// How a task gets resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskOrigin {
    /// Resolved by the queue from its candidate source once its latency
    /// has elapsed.
    Simulated,
    /// Resolved by an external `complete` call; fails with `Timeout` if
    /// the deadline passes first.
    External,
}

/// One in-flight (or settled) asynchronous operation.
///
/// State only ever moves from `Pending` to one terminal state.
#[derive(Debug)]
pub struct EnrichmentTask<I, R> {
    pub(crate) id: TaskId,
    pub(crate) kind: TaskKind,
    pub(crate) origin: TaskOrigin,
    pub(crate) subject: Option<ItemId>,
    pub(crate) input: I,
    pub(crate) state: TaskState,
    pub(crate) created_at: u64,
    pub(crate) resolves_at: u64,
    pub(crate) settled_at: Option<u64>,
    pub(crate) result: Option<R>,
    pub(crate) failure: Option<TaskFailure>,
    pub(crate) candidates: Vec<R>,
}

impl<I, R> EnrichmentTask<I, R> {
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn origin(&self) -> TaskOrigin {
        self.origin
    }

    /// The item this task enriches, if any.
    pub fn subject(&self) -> Option<&ItemId> {
        self.subject.as_ref()
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    /// Simulated resolution time, or the deadline of an external task.
    pub fn resolves_at(&self) -> u64 {
        self.resolves_at
    }

    pub fn settled_at(&self) -> Option<u64> {
        self.settled_at
    }

    /// Present only when the task succeeded.
    pub fn result(&self) -> Option<&R> {
        self.result.as_ref()
    }

    pub fn failure(&self) -> Option<&TaskFailure> {
        self.failure.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.state == TaskState::Pending
    }

    /// The result, or the error describing why there is none.
    pub fn outcome(&self) -> Result<&R> {
        match (self.state, self.result.as_ref(), self.failure.as_ref()) {
            (TaskState::Succeeded, Some(result), _) => Ok(result),
            (TaskState::Pending, _, _) => Err(SessionError::TaskPending(self.id)),
            (TaskState::Cancelled, _, _) => Err(SessionError::Cancelled(self.id)),
            (_, _, Some(TaskFailure::EmptyCandidates)) => Err(SessionError::EmptyCandidates),
            (_, _, Some(TaskFailure::Timeout)) => Err(SessionError::Timeout(self.id)),
            (_, _, Some(TaskFailure::Backend(message))) => {
                Err(SessionError::Backend(message.clone()))
            }
            _ => Err(SessionError::Backend(format!("{} settled without result", self.id))),
        }
    }
}
