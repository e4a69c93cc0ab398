mod entry;
mod ledger;

pub use entry::{ActorId, EngagementEntry, EngagementKey};
pub use ledger::{EngagementLedger, LedgerEvent};
