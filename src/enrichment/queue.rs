use std::collections::{BTreeMap, HashMap};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    CandidateSource, EnrichmentTask, NoCandidates, TaskFailure, TaskId, TaskKind, TaskOrigin,
    TaskState,
};
use crate::clock::SharedClock;
use crate::error::{Result, SessionError};
use crate::item::ItemId;
use crate::notify::{Notifier, Subscription};

type ResolveCallback<I, R> = Box<dyn FnOnce(&EnrichmentTask<I, R>) + Send>;

/// Change emitted by an [`EnrichmentQueue`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueEvent {
    Submitted { task: TaskId, kind: TaskKind },
    Settled { task: TaskId, state: TaskState },
    Removed { task: TaskId },
}

/// Count of tasks per state.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub pending: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl QueueStats {
    pub fn settled(&self) -> usize {
        self.succeeded + self.failed + self.cancelled
    }
}

/// Cancellable, time-bounded asynchronous tasks with exactly-once settlement.
///
/// Time comes from the injected clock; nothing resolves until
/// [`run_due`](Self::run_due) is called, so a virtual clock gives fully
/// deterministic runs. Due tasks settle in `(resolves_at, id)` order and
/// candidate selection uses a seeded RNG.
pub struct EnrichmentQueue<I, R> {
    clock: SharedClock,
    source: Box<dyn CandidateSource<I, R>>,
    rng: StdRng,
    tasks: BTreeMap<TaskId, EnrichmentTask<I, R>>,
    callbacks: HashMap<TaskId, Vec<ResolveCallback<I, R>>>,
    next_id: u64,
    retention_ms: Option<u64>,
    notifier: Notifier<QueueEvent>,
}

impl<I, R> EnrichmentQueue<I, R>
where
    I: Send + 'static,
    R: Send + 'static,
{
    /// A queue whose tasks all fail with `EmptyCandidates` until a source is
    /// supplied with [`with_source`](Self::with_source).
    pub fn new(clock: SharedClock) -> Self {
        EnrichmentQueue {
            clock,
            source: Box::new(NoCandidates),
            rng: StdRng::seed_from_u64(0),
            tasks: BTreeMap::new(),
            callbacks: HashMap::new(),
            next_id: 1,
            retention_ms: None,
            notifier: Notifier::new(),
        }
    }

    pub fn with_source(self, source: impl CandidateSource<I, R> + 'static) -> Self {
        self.with_boxed_source(Box::new(source))
    }

    pub fn with_boxed_source(mut self, source: Box<dyn CandidateSource<I, R>>) -> Self {
        self.source = source;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Settled tasks older than this are dropped by [`sweep`](Self::sweep).
    pub fn with_retention(mut self, retention_ms: Option<u64>) -> Self {
        self.retention_ms = retention_ms;
        self
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(QueueEvent) + Send + Sync + 'static,
    {
        self.notifier.subscribe(listener)
    }

    /// Submit a simulated task resolving after `latency_ms`.
    pub fn submit(&mut self, kind: TaskKind, input: I, latency_ms: u64) -> TaskId {
        self.submit_for(kind, None, input, latency_ms)
    }

    /// Submit a simulated task bound to an item.
    pub fn submit_for(
        &mut self,
        kind: TaskKind,
        subject: Option<ItemId>,
        input: I,
        latency_ms: u64,
    ) -> TaskId {
        let candidates = self.source.candidates(kind, &input);
        let empty = candidates.is_empty();
        let id = self.push_task(
            kind,
            TaskOrigin::Simulated,
            subject,
            input,
            latency_ms,
            candidates,
        );
        if empty {
            self.settle(
                id,
                TaskState::Failed,
                None,
                Some(TaskFailure::EmptyCandidates),
            );
        }
        id
    }

    /// Submit a task to be resolved by [`complete`](Self::complete). If the
    /// clock passes `timeout_ms` first it fails with `Timeout`.
    pub fn submit_external(
        &mut self,
        kind: TaskKind,
        subject: Option<ItemId>,
        input: I,
        timeout_ms: u64,
    ) -> TaskId {
        self.push_task(kind, TaskOrigin::External, subject, input, timeout_ms, Vec::new())
    }

    fn push_task(
        &mut self,
        kind: TaskKind,
        origin: TaskOrigin,
        subject: Option<ItemId>,
        input: I,
        latency_ms: u64,
        candidates: Vec<R>,
    ) -> TaskId {
        let id = TaskId::new(self.next_id);
        self.next_id += 1;
        let now = self.clock.now_ms();
        let task = EnrichmentTask {
            id,
            kind,
            origin,
            subject,
            input,
            state: TaskState::Pending,
            created_at: now,
            resolves_at: now.saturating_add(latency_ms),
            settled_at: None,
            result: None,
            failure: None,
            candidates,
        };
        debug!(task = %id, ?kind, ?origin, resolves_at = task.resolves_at, "task submitted");
        self.tasks.insert(id, task);
        self.notifier.notify(&QueueEvent::Submitted { task: id, kind });
        id
    }

    /// Deliver the result of an external task. Returns false when the task
    /// had already settled (for instance it was cancelled or timed out).
    pub fn complete(
        &mut self,
        id: TaskId,
        outcome: std::result::Result<R, String>,
    ) -> Result<bool> {
        let task = self.task(id)?;
        if !task.is_pending() {
            return Ok(false);
        }
        Ok(match outcome {
            Ok(result) => self.settle(id, TaskState::Succeeded, Some(result), None),
            Err(message) => self.settle(
                id,
                TaskState::Failed,
                None,
                Some(TaskFailure::Backend(message)),
            ),
        })
    }

    /// Cancel a pending task. Returns false when it had already settled.
    pub fn cancel(&mut self, id: TaskId) -> Result<bool> {
        self.task(id)?;
        Ok(self.settle(id, TaskState::Cancelled, None, None))
    }

    /// Cancel every pending task bound to `item`.
    pub fn cancel_for_subject(&mut self, item: &str) -> Vec<TaskId> {
        let ids: Vec<TaskId> = self
            .tasks
            .values()
            .filter(|task| {
                task.is_pending() && task.subject.as_ref().map(ItemId::as_str) == Some(item)
            })
            .map(|task| task.id)
            .collect();
        ids.into_iter()
            .filter(|id| self.settle(*id, TaskState::Cancelled, None, None))
            .collect()
    }

    /// Run `callback` exactly once with the task's terminal state. If the
    /// task has already settled the callback runs immediately.
    pub fn on_resolve<F>(&mut self, id: TaskId, callback: F) -> Result<()>
    where
        F: FnOnce(&EnrichmentTask<I, R>) + Send + 'static,
    {
        let task = self.task(id)?;
        if task.state.is_terminal() {
            callback(task);
        } else {
            self.callbacks.entry(id).or_default().push(Box::new(callback));
        }
        Ok(())
    }

    /// Settle every pending task whose time has come. Returns the ids
    /// settled, in settlement order.
    pub fn run_due(&mut self) -> Vec<TaskId> {
        let now = self.clock.now_ms();
        let mut due: Vec<(u64, TaskId)> = self
            .tasks
            .values()
            .filter(|task| task.is_pending() && task.resolves_at <= now)
            .map(|task| (task.resolves_at, task.id))
            .collect();
        due.sort();

        let mut settled = Vec::with_capacity(due.len());
        for (_, id) in due {
            let resolved = match self.tasks.get_mut(&id) {
                Some(task) => match task.origin {
                    TaskOrigin::Simulated if !task.candidates.is_empty() => {
                        let pick = self.rng.gen_range(0..task.candidates.len());
                        Ok(task.candidates.swap_remove(pick))
                    }
                    TaskOrigin::Simulated => Err(TaskFailure::EmptyCandidates),
                    TaskOrigin::External => Err(TaskFailure::Timeout),
                },
                None => continue,
            };
            let changed = match resolved {
                Ok(result) => self.settle(id, TaskState::Succeeded, Some(result), None),
                Err(failure) => self.settle(id, TaskState::Failed, None, Some(failure)),
            };
            if changed {
                settled.push(id);
            }
        }
        settled
    }

    /// Remove a settled task once the caller has used it.
    pub fn consume(&mut self, id: TaskId) -> Result<EnrichmentTask<I, R>> {
        if self.task(id)?.is_pending() {
            return Err(SessionError::TaskPending(id));
        }
        let task = self.tasks.remove(&id).ok_or(SessionError::TaskNotFound(id))?;
        self.notifier.notify(&QueueEvent::Removed { task: id });
        Ok(task)
    }

    /// Drop settled tasks past the retention window. Returns how many went.
    pub fn sweep(&mut self) -> usize {
        let Some(retention) = self.retention_ms else {
            return 0;
        };
        let now = self.clock.now_ms();
        let expired: Vec<TaskId> = self
            .tasks
            .values()
            .filter(|task| {
                task.settled_at
                    .map(|at| at.saturating_add(retention) <= now)
                    .unwrap_or(false)
            })
            .map(|task| task.id)
            .collect();
        for id in &expired {
            self.tasks.remove(id);
            self.notifier.notify(&QueueEvent::Removed { task: *id });
        }
        if !expired.is_empty() {
            debug!(count = expired.len(), "swept settled tasks");
        }
        expired.len()
    }

    /// The single place a task leaves `Pending`. Returns false if it had
    /// already settled; callbacks fire only on the transition.
    fn settle(
        &mut self,
        id: TaskId,
        state: TaskState,
        result: Option<R>,
        failure: Option<TaskFailure>,
    ) -> bool {
        let now = self.clock.now_ms();
        let Some(task) = self.tasks.get_mut(&id) else {
            return false;
        };
        if task.state.is_terminal() {
            return false;
        }
        task.state = state;
        task.result = result;
        task.failure = failure;
        task.settled_at = Some(now);
        task.candidates.clear();
        debug!(task = %id, ?state, "task settled");

        let task = &*task;
        for callback in self.callbacks.remove(&id).unwrap_or_default() {
            callback(task);
        }
        self.notifier.notify(&QueueEvent::Settled { task: id, state });
        true
    }
}

// Reads need no bounds on the payload types.
impl<I, R> EnrichmentQueue<I, R> {
    /// Non-blocking read of a task.
    pub fn poll(&self, id: TaskId) -> Result<&EnrichmentTask<I, R>> {
        self.task(id)
    }

    /// Earliest time a pending task becomes due.
    pub fn next_due_at(&self) -> Option<u64> {
        self.tasks
            .values()
            .filter(|task| task.is_pending())
            .map(|task| task.resolves_at)
            .min()
    }

    pub fn stats(&self) -> QueueStats {
        self.tasks
            .values()
            .fold(QueueStats::default(), |mut stats, task| {
                match task.state {
                    TaskState::Pending => stats.pending += 1,
                    TaskState::Succeeded => stats.succeeded += 1,
                    TaskState::Failed => stats.failed += 1,
                    TaskState::Cancelled => stats.cancelled += 1,
                }
                stats
            })
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn tasks(&self) -> impl Iterator<Item = &EnrichmentTask<I, R>> {
        self.tasks.values()
    }

    fn task(&self, id: TaskId) -> Result<&EnrichmentTask<I, R>> {
        self.tasks.get(&id).ok_or(SessionError::TaskNotFound(id))
    }
}
