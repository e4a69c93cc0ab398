use std::fmt;

use serde::{Deserialize, Serialize};

use crate::item::ItemId;

/// Identity of whoever toggles a counter. A single-user client has exactly
/// one, [`ActorId::local`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        ActorId(id.into())
    }

    pub fn local() -> Self {
        ActorId("local-session".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActorId {
    fn from(id: &str) -> Self {
        ActorId(id.to_string())
    }
}

impl From<String> for ActorId {
    fn from(id: String) -> Self {
        ActorId(id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EngagementKey {
    pub item: ItemId,
    pub counter: String,
    pub actor: ActorId,
}

impl EngagementKey {
    pub fn new(
        item: impl Into<ItemId>,
        counter: impl Into<String>,
        actor: impl Into<ActorId>,
    ) -> Self {
        EngagementKey {
            item: item.into(),
            counter: counter.into(),
            actor: actor.into(),
        }
    }
}

/// One actor's toggle on one counter of one item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementEntry {
    pub toggled: bool,
    pub delta: i64,
}

impl EngagementEntry {
    pub fn new(delta: i64) -> Self {
        EngagementEntry {
            toggled: false,
            delta,
        }
    }

    /// Contribution to the displayed count.
    pub fn contribution(&self) -> i64 {
        if self.toggled {
            self.delta
        } else {
            0
        }
    }
}
