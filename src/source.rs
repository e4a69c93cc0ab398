//! Initial content for a session.
//!
//! A session is seeded once from a [`ContentSource`]. The engine never
//! fetches content on its own after that; new items arrive through
//! `insert_front`/`insert_back` or through generate tasks.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::item::ContentItem;

pub trait ContentSource<P> {
    /// Items in display order.
    fn load(&mut self) -> Result<Vec<ContentItem<P>>>;
}

impl<P: Clone> ContentSource<P> for Vec<ContentItem<P>> {
    fn load(&mut self) -> Result<Vec<ContentItem<P>>> {
        Ok(self.clone())
    }
}

impl<P, F> ContentSource<P> for F
where
    F: FnMut() -> Result<Vec<ContentItem<P>>>,
{
    fn load(&mut self) -> Result<Vec<ContentItem<P>>> {
        self()
    }
}

/// Items decoded from a JSON array of `{ "id", "payload", "baseCounters" }`.
#[derive(Debug, Clone)]
pub struct JsonSource<P> {
    json: String,
    _payload: PhantomData<fn() -> P>,
}

impl<P> JsonSource<P> {
    pub fn new(json: impl Into<String>) -> Self {
        JsonSource {
            json: json.into(),
            _payload: PhantomData,
        }
    }
}

impl<P: DeserializeOwned> ContentSource<P> for JsonSource<P> {
    fn load(&mut self) -> Result<Vec<ContentItem<P>>> {
        Ok(serde_json::from_str(&self.json)?)
    }
}
