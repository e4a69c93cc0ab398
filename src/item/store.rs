use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ContentItem, ItemId};
use crate::error::{Result, SessionError};
use crate::notify::{Notifier, Subscription};

/// Change emitted by an [`ItemStore`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreEvent {
    Inserted { id: ItemId, index: usize },
    Removed { id: ItemId, index: usize },
}

/// Ordered collection of content items with unique ids.
///
/// Insertion order is display order. Removal keeps the relative order of the
/// remaining items. An id that has been removed is retired and can never be
/// inserted again.
pub struct ItemStore<P> {
    items: IndexMap<ItemId, ContentItem<P>>,
    retired: HashSet<ItemId>,
    notifier: Notifier<StoreEvent>,
}

impl<P> Default for ItemStore<P> {
    fn default() -> Self {
        ItemStore {
            items: IndexMap::new(),
            retired: HashSet::new(),
            notifier: Notifier::default(),
        }
    }
}

impl<P> ItemStore<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from items in display order, rejecting duplicates.
    pub fn from_items(items: impl IntoIterator<Item = ContentItem<P>>) -> Result<Self> {
        let mut store = Self::new();
        for item in items {
            store.check_fresh(item.id())?;
            store.items.insert(item.id().clone(), item);
        }
        Ok(store)
    }

    fn check_fresh(&self, id: &ItemId) -> Result<()> {
        if self.items.contains_key(id.as_str()) || self.retired.contains(id.as_str()) {
            return Err(SessionError::DuplicateId(id.clone()));
        }
        Ok(())
    }

    pub fn get(&self, index: usize) -> Result<&ContentItem<P>> {
        self.items
            .get_index(index)
            .map(|(_, item)| item)
            .ok_or(SessionError::IndexOutOfRange {
                index,
                len: self.items.len(),
            })
    }

    pub fn get_by_id(&self, id: &str) -> Result<&ContentItem<P>> {
        self.items
            .get(id)
            .ok_or_else(|| SessionError::ItemNotFound(ItemId::from(id)))
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.items.get_index_of(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    /// True if the id is live or has been retired.
    pub fn is_used(&self, id: &str) -> bool {
        self.contains(id) || self.retired.contains(id)
    }

    pub fn size(&self) -> usize {
        self.items.len()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContentItem<P>> {
        self.items.values()
    }

    pub fn ids(&self) -> Vec<ItemId> {
        self.items.keys().cloned().collect()
    }
}

impl<P> ItemStore<P>
where
    P: Clone,
{
    /// Copy of the items in display order.
    pub fn snapshot(&self) -> Vec<ContentItem<P>> {
        self.items.values().cloned().collect()
    }
}

impl<P> ItemStore<P> {
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(StoreEvent) + Send + Sync + 'static,
    {
        self.notifier.subscribe(listener)
    }

    /// Insert at position 0. Returns the index of the new item.
    pub fn insert_front(&mut self, item: ContentItem<P>) -> Result<usize> {
        self.check_fresh(item.id())?;
        let id = item.id().clone();
        self.items.shift_insert(0, id.clone(), item);
        debug!(item = %id, "inserted at front");
        self.notify(StoreEvent::Inserted { id, index: 0 });
        Ok(0)
    }

    /// Append at the end. Returns the index of the new item.
    pub fn insert_back(&mut self, item: ContentItem<P>) -> Result<usize> {
        self.check_fresh(item.id())?;
        let id = item.id().clone();
        let (index, _) = self.items.insert_full(id.clone(), item);
        debug!(item = %id, index, "inserted at back");
        self.notify(StoreEvent::Inserted { id, index });
        Ok(index)
    }

    /// Remove an item and retire its id. Returns the index it occupied.
    pub fn remove_by_id(&mut self, id: &str) -> Result<(usize, ContentItem<P>)> {
        let (index, key, item) = self
            .items
            .shift_remove_full(id)
            .ok_or_else(|| SessionError::ItemNotFound(ItemId::from(id)))?;
        self.retired.insert(key.clone());
        debug!(item = %key, index, "removed");
        self.notify(StoreEvent::Removed { id: key, index });
        Ok((index, item))
    }

    fn notify(&self, event: StoreEvent) {
        self.notifier.notify(&event);
    }
}
