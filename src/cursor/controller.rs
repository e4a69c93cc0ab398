use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{CursorPosition, InsertFrontPolicy};
use crate::error::{Result, SessionError};
use crate::item::{ContentItem, ItemId, ItemStore};
use crate::notify::{Notifier, Subscription};

/// Change emitted by a [`CursorController`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CursorEvent {
    Moved {
        from: CursorPosition,
        to: CursorPosition,
        item: Option<ItemId>,
    },
}

/// Position pointer into an [`ItemStore`].
///
/// The controller never owns or mutates the store; every operation borrows
/// it for the duration of the call. Store mutations must be reported through
/// the crate-internal `on_inserted`/`on_removed` hooks in the same call that
/// mutates the store, which is what `Session` does.
#[derive(Debug)]
pub struct CursorController {
    position: CursorPosition,
    wrap_around: bool,
    insert_front: InsertFrontPolicy,
    notifier: Notifier<CursorEvent>,
}

impl Default for CursorController {
    fn default() -> Self {
        Self::new(true)
    }
}

impl CursorController {
    pub fn new(wrap_around: bool) -> Self {
        CursorController {
            position: CursorPosition::Empty,
            wrap_around,
            insert_front: InsertFrontPolicy::default(),
            notifier: Notifier::new(),
        }
    }

    /// A controller positioned at the first item of `store` (or `Empty`).
    pub fn bind<P>(store: &ItemStore<P>, wrap_around: bool) -> Self {
        let mut cursor = Self::new(wrap_around);
        if !store.is_empty() {
            cursor.position = CursorPosition::At(0);
        }
        cursor
    }

    pub fn with_insert_front_policy(mut self, policy: InsertFrontPolicy) -> Self {
        self.insert_front = policy;
        self
    }

    pub fn position(&self) -> CursorPosition {
        self.position
    }

    pub fn index(&self) -> Option<usize> {
        self.position.index()
    }

    pub fn wraps(&self) -> bool {
        self.wrap_around
    }

    pub fn insert_front_policy(&self) -> InsertFrontPolicy {
        self.insert_front
    }

    pub fn current<'a, P>(&self, store: &'a ItemStore<P>) -> Option<&'a ContentItem<P>> {
        self.index().and_then(|index| store.get(index).ok())
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(CursorEvent) + Send + Sync + 'static,
    {
        self.notifier.subscribe(listener)
    }

    pub fn next<P>(&mut self, store: &ItemStore<P>) -> CursorPosition {
        let len = store.len();
        let target = match self.position {
            _ if len == 0 => CursorPosition::Empty,
            CursorPosition::Empty => CursorPosition::At(0),
            CursorPosition::At(index) if index + 1 < len => CursorPosition::At(index + 1),
            CursorPosition::At(_) if self.wrap_around => CursorPosition::At(0),
            CursorPosition::At(_) => CursorPosition::At(len - 1),
        };
        self.move_to(store, target, false);
        self.position
    }

    /// Same end position as calling [`next`](Self::next) `steps` times, with
    /// at most one notification.
    pub fn advance_by<P>(&mut self, store: &ItemStore<P>, steps: usize) -> CursorPosition {
        let len = store.len();
        if len == 0 {
            self.move_to(store, CursorPosition::Empty, false);
            return self.position;
        }
        if steps == 0 {
            return self.position;
        }
        let (start, remaining) = match self.position {
            CursorPosition::Empty => (0, steps - 1),
            CursorPosition::At(index) => (index.min(len - 1), steps),
        };
        let target = if self.wrap_around {
            (start + remaining % len) % len
        } else {
            start.saturating_add(remaining).min(len - 1)
        };
        self.move_to(store, CursorPosition::At(target), false);
        self.position
    }

    pub fn prev<P>(&mut self, store: &ItemStore<P>) -> CursorPosition {
        let len = store.len();
        let target = match self.position {
            _ if len == 0 => CursorPosition::Empty,
            CursorPosition::Empty => CursorPosition::At(0),
            CursorPosition::At(index) if index > 0 => CursorPosition::At(index.min(len) - 1),
            CursorPosition::At(_) if self.wrap_around => CursorPosition::At(len - 1),
            CursorPosition::At(_) => CursorPosition::At(0),
        };
        self.move_to(store, target, false);
        self.position
    }

    /// Move to the item with `id`. On `ItemNotFound` the cursor is unchanged.
    pub fn jump_to<P>(&mut self, store: &ItemStore<P>, id: &str) -> Result<usize> {
        let index = store
            .index_of(id)
            .ok_or_else(|| SessionError::ItemNotFound(ItemId::from(id)))?;
        self.move_to(store, CursorPosition::At(index), false);
        Ok(index)
    }

    /// Move to a display position. On `IndexOutOfRange` the cursor is unchanged.
    pub fn jump_to_index<P>(&mut self, store: &ItemStore<P>, index: usize) -> Result<usize> {
        if index >= store.len() {
            return Err(SessionError::IndexOutOfRange {
                index,
                len: store.len(),
            });
        }
        self.move_to(store, CursorPosition::At(index), false);
        Ok(index)
    }

    /// Reposition after an item was inserted at `index`. `store` is the
    /// post-insert store.
    pub(crate) fn on_inserted<P>(&mut self, store: &ItemStore<P>, index: usize) {
        let target = match self.position {
            CursorPosition::Empty => CursorPosition::At(0),
            CursorPosition::At(_)
                if index == 0 && self.insert_front == InsertFrontPolicy::JumpToInserted =>
            {
                CursorPosition::At(0)
            }
            CursorPosition::At(current) if index <= current => CursorPosition::At(current + 1),
            at => at,
        };
        let jumped = index == 0 && self.insert_front == InsertFrontPolicy::JumpToInserted;
        self.move_to(store, target, jumped);
    }

    /// Reposition after the item at `removed` was removed. `store` is the
    /// post-removal store.
    pub(crate) fn on_removed<P>(&mut self, store: &ItemStore<P>, removed: usize) {
        let len = store.len();
        let mut current_removed = false;
        let target = match self.position {
            _ if len == 0 => CursorPosition::Empty,
            CursorPosition::Empty => CursorPosition::At(0),
            CursorPosition::At(current) if removed < current => CursorPosition::At(current - 1),
            CursorPosition::At(current) if removed == current => {
                current_removed = true;
                if current < len {
                    CursorPosition::At(current)
                } else if self.wrap_around {
                    CursorPosition::At(0)
                } else {
                    CursorPosition::At(len - 1)
                }
            }
            CursorPosition::At(current) => CursorPosition::At(current.min(len - 1)),
        };
        self.move_to(store, target, current_removed);
    }

    fn move_to<P>(&mut self, store: &ItemStore<P>, target: CursorPosition, force: bool) {
        let from = self.position;
        self.position = target;
        if from == target && !force {
            return;
        }
        let item = self.current(store).map(|item| item.id().clone());
        trace!(?from, to = ?target, "cursor moved");
        self.notifier.notify(&CursorEvent::Moved {
            from,
            to: target,
            item,
        });
    }
}
