use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::Session;
use crate::cursor::CursorPosition;
use crate::engagement::{EngagementEntry, EngagementKey};
use crate::enrichment::{TaskFailure, TaskId, TaskKind, TaskState};
use crate::error::Result;
use crate::item::{ContentItem, Counters, ItemId};
use crate::timer::TimerState;

/// Task state without its input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary<P> {
    pub id: TaskId,
    pub kind: TaskKind,
    pub subject: Option<ItemId>,
    pub state: TaskState,
    pub created_at: u64,
    pub resolves_at: u64,
    pub settled_at: Option<u64>,
    pub result: Option<P>,
    pub failure: Option<TaskFailure>,
}

/// Point-in-time view of a session, ordered deterministically so two runs
/// fed the same operations and clock produce equal snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot<P> {
    pub now_ms: u64,
    pub items: Vec<ContentItem<P>>,
    pub cursor: CursorPosition,
    pub counters: Vec<(ItemId, Counters)>,
    pub toggles: Vec<(EngagementKey, EngagementEntry)>,
    pub tasks: Vec<TaskSummary<P>>,
    pub timer: TimerState,
    pub timer_remaining_ms: Option<u64>,
}

impl<P: Clone> SessionSnapshot<P> {
    pub(super) fn capture<I>(session: &Session<P, I>) -> Self {
        let items = session.store.snapshot();
        let counters = items
            .iter()
            .filter_map(|item| {
                let values = session.ledger.values(item.id().as_str()).ok()?;
                Some((item.id().clone(), values))
            })
            .collect();
        let tasks = session
            .queue
            .tasks()
            .map(|task| TaskSummary {
                id: task.id(),
                kind: task.kind(),
                subject: task.subject().cloned(),
                state: task.state(),
                created_at: task.created_at(),
                resolves_at: task.resolves_at(),
                settled_at: task.settled_at(),
                result: task.result().cloned(),
                failure: task.failure().cloned(),
            })
            .collect();

        SessionSnapshot {
            now_ms: session.clock.now_ms(),
            items,
            cursor: session.cursor.position(),
            counters,
            toggles: session.ledger.entries(),
            tasks,
            timer: session.timer.state(),
            timer_remaining_ms: session.timer.remaining_ms(),
        }
    }
}

impl<P: Serialize> SessionSnapshot<P> {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bitcode::serialize(self)?)
    }
}

impl<P: DeserializeOwned> SessionSnapshot<P> {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bitcode::deserialize(bytes)?)
    }
}
