//! Feeds shared by the integration suites.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use feed_session::{
    CandidateSource, ContentItem, ManualClock, Session, SessionBuilder, SessionConfig,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub title: String,
    pub origin: String,
    pub moral: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Short {
    pub title: String,
    pub creator: String,
    pub duration: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub text: String,
    pub translation: String,
    pub language: String,
}

fn story(id: &str, title: &str, origin: &str, moral: &str, likes: u64) -> ContentItem<Story> {
    ContentItem::new(
        id,
        Story {
            title: title.to_string(),
            origin: origin.to_string(),
            moral: moral.to_string(),
        },
    )
    .with_counter("likes", likes)
}

pub fn stories() -> Vec<ContentItem<Story>> {
    vec![
        story(
            "story-1",
            "The Wise Tortoise",
            "Buganda, Uganda",
            "Preparation and patience are the keys to overcoming challenges.",
            234,
        ),
        story(
            "story-2",
            "Ubuntu Philosophy",
            "African Philosophy",
            "We are stronger together than apart.",
            456,
        ),
        story(
            "story-3",
            "The Generous Farmer",
            "Central Uganda",
            "Generosity creates a circle of support that benefits everyone.",
            189,
        ),
    ]
}

pub fn generated_story(title: &str) -> Story {
    Story {
        title: title.to_string(),
        origin: "Community".to_string(),
        moral: "Stories grow when they are shared.".to_string(),
    }
}

fn short(id: &str, title: &str, creator: &str, duration: &str, likes: u64) -> ContentItem<Short> {
    ContentItem::new(
        id,
        Short {
            title: title.to_string(),
            creator: creator.to_string(),
            duration: duration.to_string(),
        },
    )
    .with_counter("likes", likes)
}

pub fn shorts() -> Vec<ContentItem<Short>> {
    vec![
        short("short-1", "Traditional Ugandan Dance Tutorial", "Sarah Nakamya", "0:45", 1240),
        short("short-2", "Coding in Luganda - Variables", "David Musoke", "1:20", 892),
        short("short-3", "Ubuntu Philosophy Explained", "Elder Mukasa", "2:15", 2340),
        short("short-4", "Street Food Adventures - Rolex", "Grace Achieng", "1:05", 1567),
        short("short-5", "Community Garden Project", "James Kigozi", "1:30", 634),
    ]
}

fn quote(id: &str, text: &str, translation: &str, language: &str) -> ContentItem<Quote> {
    ContentItem::new(
        id,
        Quote {
            text: text.to_string(),
            translation: translation.to_string(),
            language: language.to_string(),
        },
    )
}

pub fn quotes() -> Vec<ContentItem<Quote>> {
    vec![
        quote(
            "quote-1",
            "Omuntu w'omuntu ku bantu",
            "A person is a person through other people",
            "Luganda",
        ),
        quote("quote-2", "Umuntu ngumuntu ngabantu", "I am because we are", "Zulu"),
        quote("quote-3", "Mtu ni watu", "A person is people", "Kiswahili"),
        quote(
            "quote-4",
            "If you want to go fast, go alone. If you want to go far, go together.",
            "Community over individual success",
            "African Proverb",
        ),
        quote("quote-5", "Okukola awamu kw'amaanyi", "Working together is strength", "Luganda"),
    ]
}

/// A session over `items` driven by `clock`.
pub fn session<P>(
    clock: &ManualClock,
    config: SessionConfig,
    items: Vec<ContentItem<P>>,
) -> Session<P, String>
where
    P: Clone + Send + 'static,
{
    SessionBuilder::new()
        .config(config)
        .clock(clock.shared())
        .items(items)
        .build()
        .unwrap()
}

/// Like [`session`] with a candidate source for enrichment tasks.
pub fn session_with_candidates<P>(
    clock: &ManualClock,
    config: SessionConfig,
    items: Vec<ContentItem<P>>,
    candidates: impl CandidateSource<String, P> + 'static,
) -> Session<P, String>
where
    P: Clone + Send + 'static,
{
    SessionBuilder::new()
        .config(config)
        .clock(clock.shared())
        .items(items)
        .candidates(candidates)
        .build()
        .unwrap()
}

pub fn ids<P>(session: &Session<P, String>) -> Vec<String>
where
    P: Clone + Send + 'static,
{
    session
        .store()
        .ids()
        .into_iter()
        .map(|id| id.as_str().to_string())
        .collect()
}

pub fn current_id<P>(session: &Session<P, String>) -> Option<String>
where
    P: Clone + Send + 'static,
{
    session.current().map(|item| item.id().as_str().to_string())
}

/// Collects every event a listener receives.
pub fn recorder<E: Send + 'static>() -> (Arc<Mutex<Vec<E>>>, impl Fn(E) + Send + Sync + 'static) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    (seen, move |event: E| sink.lock().unwrap().push(event))
}

/// Route crate logs to the test harness; filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
