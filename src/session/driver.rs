//! Background thread that keeps a shared session up to date with its clock.

use std::sync::mpsc::{channel, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{info, warn};

use super::SharedSession;

/// Statistics from a [`SessionDriver`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DriverStats {
    pub ticks: usize,
    pub tasks_settled: usize,
    pub items_inserted: usize,
    pub advances: usize,
    pub tasks_swept: usize,
    pub lock_failures: usize,
}

/// Ticks a [`SharedSession`] every `poll_interval` until stopped.
///
/// ## Example
///
/// ```ignore
/// use feed_session::{create_session, SessionDriver, SharedSession};
/// use std::time::Duration;
///
/// let shared = SharedSession::new(create_session(items)?);
/// let driver = SessionDriver::spawn(shared.clone(), Duration::from_millis(50));
///
/// // ... the UI thread toggles, navigates and submits through `shared` ...
///
/// let stats = driver.stop();
/// println!("settled {} tasks", stats.tasks_settled);
/// ```
pub struct SessionDriver {
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<DriverStats>>,
}

impl SessionDriver {
    pub fn spawn<P, I>(session: SharedSession<P, I>, poll_interval: Duration) -> Self
    where
        P: Clone + Send + 'static,
        I: Send + 'static,
    {
        let (stop_tx, stop_rx) = channel();

        let handle = thread::spawn(move || {
            let mut stats = DriverStats::default();
            info!(?poll_interval, "session driver started");

            loop {
                match session.tick() {
                    Ok(report) => {
                        stats.ticks += 1;
                        stats.tasks_settled += report.settled.len();
                        stats.items_inserted += report.inserted.len();
                        stats.advances += report.advanced;
                        stats.tasks_swept += report.swept;
                    }
                    Err(err) => {
                        warn!(error = %err, "session driver could not tick");
                        stats.lock_failures += 1;
                    }
                }

                match stop_rx.recv_timeout(poll_interval) {
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => {}
                }
            }

            info!(ticks = stats.ticks, "session driver stopped");
            stats
        });

        Self {
            stop_tx,
            handle: Some(handle),
        }
    }

    /// Signal the driver to stop and wait for it to finish.
    pub fn stop(mut self) -> DriverStats {
        let _ = self.stop_tx.send(());
        match self.handle.take() {
            Some(handle) => handle.join().unwrap_or_default(),
            None => DriverStats::default(),
        }
    }
}

impl Drop for SessionDriver {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(());
    }
}
