use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{SessionBuilder, SessionSnapshot};
use crate::clock::SharedClock;
use crate::config::SessionConfig;
use crate::cursor::{CursorController, CursorPosition};
use crate::engagement::{ActorId, EngagementLedger};
use crate::enrichment::{EnrichmentQueue, EnrichmentTask, TaskId, TaskKind, TaskState};
use crate::error::Result;
use crate::item::{ContentItem, Counters, ItemId, ItemStore};
use crate::timer::{AutoAdvanceTimer, TimerState};

/// What one [`Session::tick`] did.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    /// Tasks settled by this tick, in settlement order.
    pub settled: Vec<TaskId>,
    /// Items inserted from succeeded generate tasks.
    pub inserted: Vec<ItemId>,
    /// Auto-advance steps applied.
    pub advanced: usize,
    /// Settled tasks dropped by retention.
    pub swept: usize,
}

impl TickReport {
    pub fn is_idle(&self) -> bool {
        self.settled.is_empty() && self.inserted.is_empty() && self.advanced == 0 && self.swept == 0
    }
}

/// A content feed session.
///
/// Every mutation that affects more than one component goes through here so
/// that the cursor, ledger and queue are repositioned in the same call that
/// mutates the store. `P` is the item payload; generate tasks produce new
/// payloads from inputs of type `I`.
pub struct Session<P, I = String> {
    pub(super) config: SessionConfig,
    pub(super) clock: SharedClock,
    pub(super) actor: ActorId,
    pub(super) store: ItemStore<P>,
    pub(super) cursor: CursorController,
    pub(super) ledger: EngagementLedger,
    pub(super) queue: EnrichmentQueue<I, P>,
    pub(super) timer: AutoAdvanceTimer,
    pub(super) generated: u64,
    pub(super) awaiting_insert: BTreeSet<TaskId>,
}

impl<P, I> Session<P, I>
where
    P: Clone + Send + 'static,
    I: Send + 'static,
{
    pub fn builder() -> SessionBuilder<P, I> {
        SessionBuilder::new()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// The actor used by [`toggle`](Self::toggle) and
    /// [`is_toggled`](Self::is_toggled).
    pub fn actor(&self) -> &ActorId {
        &self.actor
    }

    pub fn store(&self) -> &ItemStore<P> {
        &self.store
    }

    pub fn cursor(&self) -> &CursorController {
        &self.cursor
    }

    pub fn ledger(&self) -> &EngagementLedger {
        &self.ledger
    }

    pub fn queue(&self) -> &EnrichmentQueue<I, P> {
        &self.queue
    }

    pub fn timer(&self) -> &AutoAdvanceTimer {
        &self.timer
    }

    // Items

    pub fn current(&self) -> Option<&ContentItem<P>> {
        self.cursor.current(&self.store)
    }

    pub fn position(&self) -> CursorPosition {
        self.cursor.position()
    }

    pub fn get(&self, id: &str) -> Result<&ContentItem<P>> {
        self.store.get_by_id(id)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn insert_front(&mut self, item: ContentItem<P>) -> Result<usize> {
        let candidate = item.id().clone();
        let index = self.store.insert_front(item)?;
        self.after_insert(&candidate, index);
        Ok(index)
    }

    pub fn insert_back(&mut self, item: ContentItem<P>) -> Result<usize> {
        let candidate = item.id().clone();
        let index = self.store.insert_back(item)?;
        self.after_insert(&candidate, index);
        Ok(index)
    }

    fn after_insert(&mut self, id: &ItemId, index: usize) {
        if let Ok(item) = self.store.get(index) {
            self.ledger.register_item(item, &self.config.counter_names);
        }
        self.cursor.on_inserted(&self.store, index);
        debug!(item = %id, index, "session item inserted");
    }

    /// Remove an item. The cursor is repositioned, the item's engagement is
    /// forgotten and its pending enrichment tasks are cancelled before this
    /// returns.
    pub fn remove_by_id(&mut self, id: &str) -> Result<ContentItem<P>> {
        let (index, item) = self.store.remove_by_id(id)?;
        self.cursor.on_removed(&self.store, index);
        self.ledger.forget(id);
        let cancelled = self.queue.cancel_for_subject(id);
        self.awaiting_insert.retain(|task| !cancelled.contains(task));
        debug!(item = %id, index, cancelled = cancelled.len(), "session item removed");
        Ok(item)
    }

    // Navigation

    pub fn next(&mut self) -> CursorPosition {
        let position = self.cursor.next(&self.store);
        self.navigated();
        position
    }

    pub fn prev(&mut self) -> CursorPosition {
        let position = self.cursor.prev(&self.store);
        self.navigated();
        position
    }

    pub fn jump_to(&mut self, id: &str) -> Result<usize> {
        let index = self.cursor.jump_to(&self.store, id)?;
        self.navigated();
        Ok(index)
    }

    pub fn jump_to_index(&mut self, index: usize) -> Result<usize> {
        let index = self.cursor.jump_to_index(&self.store, index)?;
        self.navigated();
        Ok(index)
    }

    fn navigated(&mut self) {
        if self.config.restart_auto_advance_on_navigate {
            self.timer.restart_phase();
        }
    }

    // Engagement

    /// Toggle a counter as the session's own actor.
    pub fn toggle(&mut self, item: &str, counter: &str) -> Result<bool> {
        self.ledger.toggle(item, counter, &self.actor)
    }

    pub fn toggle_as(&mut self, item: &str, counter: &str, actor: &ActorId) -> Result<bool> {
        self.ledger.toggle(item, counter, actor)
    }

    pub fn current_value(&self, item: &str, counter: &str) -> Result<u64> {
        self.ledger.current_value(item, counter)
    }

    pub fn is_toggled(&self, item: &str, counter: &str) -> Result<bool> {
        self.ledger.is_toggled(item, counter, &self.actor)
    }

    pub fn counter_values(&self, item: &str) -> Result<Counters> {
        self.ledger.values(item)
    }

    // Enrichment

    /// Submit a generate task. When it succeeds the result is inserted at
    /// the front as a new item with a fresh `generated-N` id.
    pub fn generate(&mut self, input: I, latency_ms: u64) -> TaskId {
        let task = self.queue.submit(TaskKind::Generate, input, latency_ms);
        if self.queue.poll(task).map(|t| t.is_pending()).unwrap_or(false) {
            self.awaiting_insert.insert(task);
        }
        task
    }

    /// Submit a task bound to an existing item. Removing the item cancels it.
    pub fn enrich(
        &mut self,
        kind: TaskKind,
        item: &str,
        input: I,
        latency_ms: u64,
    ) -> Result<TaskId> {
        let subject = self.existing(item)?;
        Ok(self.queue.submit_for(kind, Some(subject), input, latency_ms))
    }

    /// Submit a task that a real backend resolves through
    /// [`complete`](Self::complete), failing with `Timeout` after
    /// `timeout_ms`.
    pub fn submit_external(
        &mut self,
        kind: TaskKind,
        subject: Option<&str>,
        input: I,
        timeout_ms: u64,
    ) -> Result<TaskId> {
        let subject = subject.map(|item| self.existing(item)).transpose()?;
        Ok(self.queue.submit_external(kind, subject, input, timeout_ms))
    }

    pub fn complete(
        &mut self,
        task: TaskId,
        outcome: std::result::Result<P, String>,
    ) -> Result<bool> {
        self.queue.complete(task, outcome)
    }

    pub fn cancel(&mut self, task: TaskId) -> Result<bool> {
        let cancelled = self.queue.cancel(task)?;
        self.awaiting_insert.remove(&task);
        Ok(cancelled)
    }

    pub fn poll(&self, task: TaskId) -> Result<&EnrichmentTask<I, P>> {
        self.queue.poll(task)
    }

    pub fn on_resolve<F>(&mut self, task: TaskId, callback: F) -> Result<()>
    where
        F: FnOnce(&EnrichmentTask<I, P>) + Send + 'static,
    {
        self.queue.on_resolve(task, callback)
    }

    pub fn consume(&mut self, task: TaskId) -> Result<EnrichmentTask<I, P>> {
        self.queue.consume(task)
    }

    fn existing(&self, item: &str) -> Result<ItemId> {
        self.store
            .get_by_id(item)
            .map(|found| found.id().clone())
    }

    // Auto-advance

    pub fn start_auto_advance(&mut self, interval_ms: u64) -> Result<()> {
        self.timer.start(interval_ms)
    }

    pub fn stop_auto_advance(&mut self) {
        self.timer.stop();
    }

    pub fn pause_auto_advance(&mut self) -> bool {
        self.timer.pause()
    }

    pub fn resume_auto_advance(&mut self) -> bool {
        self.timer.resume()
    }

    pub fn auto_advance_state(&self) -> TimerState {
        self.timer.state()
    }

    // Driving

    /// Bring the session up to the clock's current time: settle due tasks,
    /// insert generated items, apply due auto-advances and sweep settled
    /// tasks past retention.
    pub fn tick(&mut self) -> TickReport {
        let settled = self.queue.run_due();
        let inserted = self.insert_generated();
        let advanced = self.timer.advance(&mut self.cursor, &self.store);
        let swept = self.queue.sweep();

        let report = TickReport {
            settled,
            inserted,
            advanced,
            swept,
        };
        if !report.is_idle() {
            debug!(
                settled = report.settled.len(),
                inserted = report.inserted.len(),
                advanced,
                swept,
                "session tick"
            );
        }
        report
    }

    fn insert_generated(&mut self) -> Vec<ItemId> {
        let settled: Vec<TaskId> = self
            .awaiting_insert
            .iter()
            .copied()
            .filter(|task| {
                self.queue
                    .poll(*task)
                    .map(|t| t.state().is_terminal())
                    .unwrap_or(true)
            })
            .collect();

        let mut inserted = Vec::new();
        for task in settled {
            self.awaiting_insert.remove(&task);
            let payload = match self.queue.poll(task) {
                Ok(t) if t.state() == TaskState::Succeeded => t.result().cloned(),
                _ => None,
            };
            let Some(payload) = payload else {
                continue;
            };
            let id = self.fresh_generated_id();
            match self.insert_front(ContentItem::new(id.clone(), payload)) {
                Ok(_) => inserted.push(id),
                Err(err) => warn!(%task, error = %err, "generated item not inserted"),
            }
        }
        inserted
    }

    fn fresh_generated_id(&mut self) -> ItemId {
        loop {
            self.generated += 1;
            let id = ItemId::new(format!("generated-{}", self.generated));
            if !self.store.is_used(id.as_str()) {
                return id;
            }
        }
    }

    /// Deterministic view of the whole session.
    pub fn snapshot(&self) -> SessionSnapshot<P> {
        SessionSnapshot::capture(self)
    }
}
