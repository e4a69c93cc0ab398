use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use event_emitter_rs::EventEmitter;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

const CHANGED: &str = "changed";

fn lock_emitter(emitter: &Mutex<EventEmitter>) -> MutexGuard<'_, EventEmitter> {
    match emitter.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!("change emitter lock poisoned; recovering");
            poisoned.into_inner()
        }
    }
}

/// Change notification channel for one component.
///
/// Listeners are registered on an [`EventEmitter`] and receive a decoded copy
/// of every event. `notify` joins all listener threads before returning, so a
/// listener has always observed a change by the time the mutating call that
/// produced it returns. Listeners must not call back into the component that
/// notified them.
pub struct Notifier<E> {
    emitter: Arc<Mutex<EventEmitter>>,
    _event: PhantomData<fn(E)>,
}

impl<E> Default for Notifier<E> {
    fn default() -> Self {
        Self {
            emitter: Arc::new(Mutex::new(EventEmitter::new())),
            _event: PhantomData,
        }
    }
}

impl<E> fmt::Debug for Notifier<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier").finish_non_exhaustive()
    }
}

impl<E> Notifier<E>
where
    E: Serialize + DeserializeOwned + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Dropping the returned handle keeps the listener
    /// registered; call [`Subscription::unsubscribe`] to remove it.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(E) + Send + Sync + 'static,
    {
        let id = lock_emitter(&self.emitter).on(CHANGED, listener);
        Subscription {
            id,
            emitter: Arc::downgrade(&self.emitter),
        }
    }

    pub fn notify(&self, event: &E) {
        let handles = lock_emitter(&self.emitter).emit(CHANGED, event);
        for handle in handles {
            if handle.join().is_err() {
                warn!("change listener panicked");
            }
        }
    }
}

/// Handle returned by `subscribe`; removes its listener on `unsubscribe`.
#[derive(Debug)]
pub struct Subscription {
    id: String,
    emitter: Weak<Mutex<EventEmitter>>,
}

impl Subscription {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns false when the listener was already gone (or its component
    /// was dropped).
    pub fn unsubscribe(self) -> bool {
        match self.emitter.upgrade() {
            Some(emitter) => lock_emitter(&emitter).remove_listener(&self.id).is_some(),
            None => false,
        }
    }
}
