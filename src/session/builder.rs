use std::collections::BTreeSet;

use tracing::debug;

use super::Session;
use crate::clock::{SharedClock, SystemClock};
use crate::config::SessionConfig;
use crate::cursor::CursorController;
use crate::engagement::{ActorId, EngagementLedger};
use crate::enrichment::{CandidateSource, EnrichmentQueue};
use crate::error::Result;
use crate::item::{ContentItem, ItemStore};
use crate::source::ContentSource;
use crate::timer::AutoAdvanceTimer;

/// Assembles a [`Session`].
///
/// ## Example
///
/// ```ignore
/// use feed_session::{ContentItem, FixedCandidates, ManualClock, SessionBuilder, SessionConfig};
///
/// let clock = ManualClock::new();
/// let mut session = SessionBuilder::<&str, &str>::new()
///     .config(SessionConfig::default().with_auto_advance(8_000))
///     .clock(clock.shared())
///     .items(vec![ContentItem::new("story-1", "Community Garden Initiative")])
///     .candidates(FixedCandidates::new(vec!["Neighbours Rebuild the Old Library"]))
///     .build()?;
///
/// clock.advance_by(8_000);
/// session.tick();
/// ```
pub struct SessionBuilder<P, I = String> {
    config: SessionConfig,
    clock: Option<SharedClock>,
    actor: ActorId,
    items: Vec<ContentItem<P>>,
    candidates: Option<Box<dyn CandidateSource<I, P>>>,
}

impl<P, I> Default for SessionBuilder<P, I> {
    fn default() -> Self {
        SessionBuilder {
            config: SessionConfig::default(),
            clock: None,
            actor: ActorId::local(),
            items: Vec::new(),
            candidates: None,
        }
    }
}

impl<P, I> SessionBuilder<P, I>
where
    P: Clone + Send + 'static,
    I: Send + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Defaults to a [`SystemClock`].
    pub fn clock(mut self, clock: SharedClock) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn actor(mut self, actor: impl Into<ActorId>) -> Self {
        self.actor = actor.into();
        self
    }

    /// Append initial items, in display order.
    pub fn items(mut self, items: impl IntoIterator<Item = ContentItem<P>>) -> Self {
        self.items.extend(items);
        self
    }

    /// Append everything `source` loads.
    pub fn source(mut self, source: &mut impl ContentSource<P>) -> Result<Self> {
        self.items.extend(source.load()?);
        Ok(self)
    }

    pub fn candidates(mut self, source: impl CandidateSource<I, P> + 'static) -> Self {
        self.candidates = Some(Box::new(source));
        self
    }

    pub fn build(self) -> Result<Session<P, I>> {
        let config = self.config;
        config.validate()?;
        let clock = self.clock.unwrap_or_else(SystemClock::shared);

        let store = ItemStore::from_items(self.items)?;
        let mut ledger = EngagementLedger::new();
        for item in store.iter() {
            ledger.register_item(item, &config.counter_names);
        }
        let cursor = CursorController::bind(&store, config.wrap_around)
            .with_insert_front_policy(config.insert_front_policy);

        let mut queue = EnrichmentQueue::new(clock.clone())
            .with_seed(config.seed)
            .with_retention(config.task_retention_ms);
        if let Some(candidates) = self.candidates {
            queue = queue.with_boxed_source(candidates);
        }

        let mut timer = AutoAdvanceTimer::new(clock.clone());
        if let Some(interval) = config.auto_advance_interval_ms {
            timer.start(interval)?;
        }

        debug!(items = store.len(), wrap_around = config.wrap_around, "session built");
        Ok(Session {
            config,
            clock,
            actor: self.actor,
            store,
            cursor,
            ledger,
            queue,
            timer,
            generated: 0,
            awaiting_insert: BTreeSet::new(),
        })
    }
}

/// A session over `items` with the default configuration and the system
/// clock.
pub fn create_session<P>(items: impl IntoIterator<Item = ContentItem<P>>) -> Result<Session<P>>
where
    P: Clone + Send + 'static,
{
    SessionBuilder::new().items(items).build()
}
