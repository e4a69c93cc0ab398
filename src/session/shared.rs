use std::sync::{Arc, Mutex, MutexGuard};

use super::{Session, SessionSnapshot, TickReport};
use crate::error::{Result, SessionError};

/// A session behind a single mutex, for callers on more than one thread.
///
/// Cloning yields another handle to the same session. Listeners subscribed
/// to the session's components run while the lock is held and must not
/// call back into the same `SharedSession`.
pub struct SharedSession<P, I = String> {
    inner: Arc<Mutex<Session<P, I>>>,
}

impl<P, I> Clone for SharedSession<P, I> {
    fn clone(&self) -> Self {
        SharedSession {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P, I> SharedSession<P, I>
where
    P: Clone + Send + 'static,
    I: Send + 'static,
{
    pub fn new(session: Session<P, I>) -> Self {
        SharedSession {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, Session<P, I>>> {
        self.inner
            .lock()
            .map_err(|_| SessionError::LockPoisoned("session"))
    }

    /// Run `f` with exclusive access to the session.
    pub fn with<T>(&self, f: impl FnOnce(&mut Session<P, I>) -> T) -> Result<T> {
        let mut session = self.lock()?;
        Ok(f(&mut session))
    }

    pub fn tick(&self) -> Result<TickReport> {
        self.with(Session::tick)
    }

    pub fn snapshot(&self) -> Result<SessionSnapshot<P>> {
        self.with(|session| session.snapshot())
    }

    /// The session back, if this is the last handle.
    pub fn try_unwrap(self) -> std::result::Result<Session<P, I>, Self> {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => mutex
                .into_inner()
                .map_err(|poisoned| SharedSession::new(poisoned.into_inner())),
            Err(inner) => Err(SharedSession { inner }),
        }
    }
}
