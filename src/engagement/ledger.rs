use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ActorId, EngagementEntry, EngagementKey};
use crate::error::{Result, SessionError};
use crate::item::{ContentItem, Counters, ItemId};
use crate::notify::{Notifier, Subscription};

/// Change emitted by an [`EngagementLedger`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    Toggled {
        key: EngagementKey,
        toggled: bool,
        value: u64,
    },
    Forgotten {
        item: ItemId,
    },
}

#[derive(Debug, Default)]
struct ItemLedger {
    base: Counters,
    entries: HashMap<(String, ActorId), EngagementEntry>,
}

impl ItemLedger {
    fn value(&self, counter: &str) -> Option<u64> {
        let base = i128::from(*self.base.get(counter)?);
        let delta: i128 = self
            .entries
            .iter()
            .filter(|((name, _), _)| name == counter)
            .map(|(_, entry)| i128::from(entry.contribution()))
            .sum();
        let value = (base + delta).clamp(0, i128::from(u64::MAX));
        Some(u64::try_from(value).unwrap_or(u64::MAX))
    }
}

/// Per-item, per-actor toggle counters layered over immutable base values.
///
/// Toggling twice returns to the original count. Counts never go negative.
#[derive(Debug, Default)]
pub struct EngagementLedger {
    items: HashMap<ItemId, ItemLedger>,
    notifier: Notifier<LedgerEvent>,
}

impl EngagementLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register base counters for an item. A second registration of the
    /// same item is ignored and returns false.
    pub fn register(&mut self, item: impl Into<ItemId>, base: Counters) -> bool {
        let item = item.into();
        if self.items.contains_key(&item) {
            return false;
        }
        self.items.insert(
            item,
            ItemLedger {
                base,
                entries: HashMap::new(),
            },
        );
        true
    }

    /// Register an item's own base counters plus `counter_names` (base 0
    /// where the item does not supply one).
    pub fn register_item<P>(&mut self, item: &ContentItem<P>, counter_names: &[String]) -> bool {
        let mut base = item.base_counters().clone();
        for name in counter_names {
            base.entry(name.clone()).or_insert(0);
        }
        self.register(item.id().clone(), base)
    }

    /// Drop an item's base counters and every toggle on it.
    pub fn forget(&mut self, item: &str) -> bool {
        let removed = self.items.remove(item).is_some();
        if removed {
            self.notifier.notify(&LedgerEvent::Forgotten {
                item: ItemId::from(item),
            });
        }
        removed
    }

    pub fn contains(&self, item: &str) -> bool {
        self.items.contains_key(item)
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(LedgerEvent) + Send + Sync + 'static,
    {
        self.notifier.subscribe(listener)
    }

    /// Flip `actor`'s toggle and return the new toggle state.
    pub fn toggle(&mut self, item: &str, counter: &str, actor: &ActorId) -> Result<bool> {
        self.toggle_with_delta(item, counter, actor, 1)
    }

    /// Like [`toggle`](Self::toggle) with an explicit delta. The delta is
    /// fixed when the entry is first created; later calls only flip it.
    pub fn toggle_with_delta(
        &mut self,
        item: &str,
        counter: &str,
        actor: &ActorId,
        delta: i64,
    ) -> Result<bool> {
        let ledger = self.item_ledger_mut(item, counter)?;
        let entry = ledger
            .entries
            .entry((counter.to_string(), actor.clone()))
            .or_insert_with(|| EngagementEntry::new(delta));
        entry.toggled = !entry.toggled;
        let toggled = entry.toggled;
        let value = ledger.value(counter).unwrap_or(0);

        debug!(%item, counter, %actor, toggled, value, "engagement toggled");
        self.notifier.notify(&LedgerEvent::Toggled {
            key: EngagementKey::new(item, counter, actor.clone()),
            toggled,
            value,
        });
        Ok(toggled)
    }

    /// Base value plus every toggled-on delta across all actors.
    pub fn current_value(&self, item: &str, counter: &str) -> Result<u64> {
        let ledger = self.item_ledger(item, counter)?;
        Ok(ledger.value(counter).unwrap_or(0))
    }

    pub fn is_toggled(&self, item: &str, counter: &str, actor: &ActorId) -> Result<bool> {
        let ledger = self.item_ledger(item, counter)?;
        Ok(ledger
            .entries
            .get(&(counter.to_string(), actor.clone()))
            .map(|entry| entry.toggled)
            .unwrap_or(false))
    }

    /// Current value of every registered counter on an item.
    pub fn values(&self, item: &str) -> Result<Counters> {
        let ledger = self
            .items
            .get(item)
            .ok_or_else(|| SessionError::ItemNotFound(ItemId::from(item)))?;
        Ok(ledger
            .base
            .keys()
            .map(|name| (name.clone(), ledger.value(name).unwrap_or(0)))
            .collect())
    }

    /// Every entry, in key order.
    pub fn entries(&self) -> Vec<(EngagementKey, EngagementEntry)> {
        let mut entries: Vec<_> = self
            .items
            .iter()
            .flat_map(|(item, ledger)| {
                ledger.entries.iter().map(move |((counter, actor), entry)| {
                    (
                        EngagementKey::new(item.clone(), counter.clone(), actor.clone()),
                        *entry,
                    )
                })
            })
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    fn item_ledger(&self, item: &str, counter: &str) -> Result<&ItemLedger> {
        let ledger = self
            .items
            .get(item)
            .ok_or_else(|| SessionError::ItemNotFound(ItemId::from(item)))?;
        if !ledger.base.contains_key(counter) {
            return Err(unknown_counter(item, counter));
        }
        Ok(ledger)
    }

    fn item_ledger_mut(&mut self, item: &str, counter: &str) -> Result<&mut ItemLedger> {
        let ledger = self
            .items
            .get_mut(item)
            .ok_or_else(|| SessionError::ItemNotFound(ItemId::from(item)))?;
        if !ledger.base.contains_key(counter) {
            return Err(unknown_counter(item, counter));
        }
        Ok(ledger)
    }
}

fn unknown_counter(item: &str, counter: &str) -> SessionError {
    SessionError::UnknownCounter {
        item: ItemId::from(item),
        counter: counter.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_with(item: &str, likes: u64) -> EngagementLedger {
        let mut ledger = EngagementLedger::new();
        let mut base = Counters::new();
        base.insert("likes".to_string(), likes);
        ledger.register(item, base);
        ledger
    }

    #[test]
    fn like_then_unlike() {
        let mut ledger = ledger_with("x", 10);
        let u1 = ActorId::from("u1");

        assert!(ledger.toggle("x", "likes", &u1).unwrap());
        assert_eq!(ledger.current_value("x", "likes").unwrap(), 11);
        assert!(ledger.is_toggled("x", "likes", &u1).unwrap());

        assert!(!ledger.toggle("x", "likes", &u1).unwrap());
        assert_eq!(ledger.current_value("x", "likes").unwrap(), 10);
        assert!(!ledger.is_toggled("x", "likes", &u1).unwrap());
    }

    #[test]
    fn actors_accumulate_independently() {
        let mut ledger = ledger_with("x", 3);
        ledger.toggle("x", "likes", &ActorId::from("u1")).unwrap();
        ledger.toggle("x", "likes", &ActorId::from("u2")).unwrap();
        assert_eq!(ledger.current_value("x", "likes").unwrap(), 5);

        ledger.toggle("x", "likes", &ActorId::from("u1")).unwrap();
        assert_eq!(ledger.current_value("x", "likes").unwrap(), 4);
    }

    #[test]
    fn unknown_counter_and_item() {
        let mut ledger = ledger_with("x", 0);
        let actor = ActorId::local();

        assert_eq!(
            ledger.toggle("x", "shares", &actor),
            Err(SessionError::UnknownCounter {
                item: ItemId::from("x"),
                counter: "shares".to_string(),
            })
        );
        assert!(ledger.toggle("y", "likes", &actor).unwrap_err().is_not_found());
        assert!(ledger.entries().is_empty());
    }

    #[test]
    fn negative_delta_never_goes_below_zero() {
        let mut ledger = ledger_with("x", 0);
        ledger
            .toggle_with_delta("x", "likes", &ActorId::local(), -1)
            .unwrap();
        assert_eq!(ledger.current_value("x", "likes").unwrap(), 0);
    }

    #[test]
    fn huge_base_counts_saturate_instead_of_wrapping() {
        let mut ledger = ledger_with("viral", u64::MAX - 5);
        assert_eq!(ledger.current_value("viral", "likes").unwrap(), u64::MAX - 5);

        ledger.toggle("viral", "likes", &ActorId::from("u1")).unwrap();
        assert_eq!(ledger.current_value("viral", "likes").unwrap(), u64::MAX - 4);

        for n in 0..10 {
            ledger
                .toggle_with_delta("viral", "likes", &ActorId::new(format!("fan-{n}")), i64::MAX)
                .unwrap();
        }
        assert_eq!(ledger.current_value("viral", "likes").unwrap(), u64::MAX);
    }

    #[test]
    fn register_item_fills_configured_counters() {
        let mut ledger = EngagementLedger::new();
        let item = ContentItem::new("story", ()).with_counter("likes", 156);
        ledger.register_item(&item, &["likes".to_string(), "bookmarks".to_string()]);

        let values = ledger.values("story").unwrap();
        assert_eq!(values.get("likes"), Some(&156));
        assert_eq!(values.get("bookmarks"), Some(&0));
        assert!(!ledger.register_item(&item, &[]));
    }

    #[test]
    fn forget_drops_toggles() {
        let mut ledger = ledger_with("x", 1);
        ledger.toggle("x", "likes", &ActorId::local()).unwrap();
        assert!(ledger.forget("x"));
        assert!(!ledger.contains("x"));
        assert!(ledger.entries().is_empty());
        assert!(!ledger.forget("x"));
    }
}
