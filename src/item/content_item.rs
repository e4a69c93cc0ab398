use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a content item.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        ItemId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ItemId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        ItemId(id.to_string())
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        ItemId(id)
    }
}

impl From<&ItemId> for ItemId {
    fn from(id: &ItemId) -> Self {
        id.clone()
    }
}

/// Base counter values keyed by counter name.
pub type Counters = BTreeMap<String, u64>;

/// One unit of rotating content: a story, a short, a quote, a queue entry.
///
/// The payload is opaque to the engine. Base counters are fixed at creation;
/// interaction deltas live in the engagement ledger, never on the item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem<P> {
    id: ItemId,
    payload: P,
    #[serde(default)]
    base_counters: Counters,
}

impl<P> ContentItem<P> {
    pub fn new(id: impl Into<ItemId>, payload: P) -> Self {
        ContentItem {
            id: id.into(),
            payload,
            base_counters: Counters::new(),
        }
    }

    /// Builder-style base counter. Only usable before the item is stored.
    pub fn with_counter(mut self, name: impl Into<String>, base: u64) -> Self {
        self.base_counters.insert(name.into(), base);
        self
    }

    pub fn with_counters(mut self, counters: Counters) -> Self {
        self.base_counters.extend(counters);
        self
    }

    pub fn id(&self) -> &ItemId {
        &self.id
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn base_counters(&self) -> &Counters {
        &self.base_counters
    }

    pub fn base_counter(&self, name: &str) -> Option<u64> {
        self.base_counters.get(name).copied()
    }

    pub fn into_payload(self) -> P {
        self.payload
    }
}
