//! Cooperative auto-advance.
//!
//! The timer owns no thread. Whoever drives the session asks it how many
//! intervals have elapsed (`due_advances`) and moves the cursor by that
//! many steps, so a paused or stopped timer simply never reports anything
//! due and there is nothing to leak.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::SharedClock;
use crate::cursor::CursorController;
use crate::error::{Result, SessionError};
use crate::item::ItemStore;
use crate::notify::{Notifier, Subscription};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerState {
    #[default]
    Stopped,
    Running,
    Paused,
}

/// Change emitted by an [`AutoAdvanceTimer`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerEvent {
    StateChanged { from: TimerState, to: TimerState },
    Fired { count: usize },
    /// The countdown began again with `remaining_ms` left.
    Restarted { remaining_ms: u64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Stopped,
    Running { interval: u64, next_due: u64 },
    Paused { interval: u64, remaining: u64 },
}

impl Phase {
    fn state(&self) -> TimerState {
        match self {
            Phase::Stopped => TimerState::Stopped,
            Phase::Running { .. } => TimerState::Running,
            Phase::Paused { .. } => TimerState::Paused,
        }
    }
}

pub struct AutoAdvanceTimer {
    clock: SharedClock,
    phase: Phase,
    notifier: Notifier<TimerEvent>,
}

impl AutoAdvanceTimer {
    pub fn new(clock: SharedClock) -> Self {
        AutoAdvanceTimer {
            clock,
            phase: Phase::Stopped,
            notifier: Notifier::new(),
        }
    }

    pub fn state(&self) -> TimerState {
        self.phase.state()
    }

    pub fn interval_ms(&self) -> Option<u64> {
        match self.phase {
            Phase::Stopped => None,
            Phase::Running { interval, .. } | Phase::Paused { interval, .. } => Some(interval),
        }
    }

    /// Time left until the next advance; frozen while paused.
    pub fn remaining_ms(&self) -> Option<u64> {
        match self.phase {
            Phase::Stopped => None,
            Phase::Running { next_due, .. } => Some(next_due.saturating_sub(self.clock.now_ms())),
            Phase::Paused { remaining, .. } => Some(remaining),
        }
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(TimerEvent) + Send + Sync + 'static,
    {
        self.notifier.subscribe(listener)
    }

    /// Start advancing every `interval_ms`. Fails with `AlreadyRunning`
    /// unless the timer is stopped.
    pub fn start(&mut self, interval_ms: u64) -> Result<()> {
        if interval_ms == 0 {
            return Err(SessionError::InvalidInterval);
        }
        if self.phase != Phase::Stopped {
            return Err(SessionError::AlreadyRunning);
        }
        let next_due = self.clock.now_ms().saturating_add(interval_ms);
        self.transition(Phase::Running {
            interval: interval_ms,
            next_due,
        });
        Ok(())
    }

    /// Idempotent.
    pub fn stop(&mut self) {
        if self.phase != Phase::Stopped {
            self.transition(Phase::Stopped);
        }
    }

    /// Freeze the remaining time. Returns false unless running.
    pub fn pause(&mut self) -> bool {
        let Phase::Running { interval, next_due } = self.phase else {
            return false;
        };
        let remaining = next_due.saturating_sub(self.clock.now_ms());
        self.transition(Phase::Paused {
            interval,
            remaining,
        });
        true
    }

    /// Continue from the frozen remaining time. Returns false unless paused.
    pub fn resume(&mut self) -> bool {
        let Phase::Paused {
            interval,
            remaining,
        } = self.phase
        else {
            return false;
        };
        let next_due = self.clock.now_ms().saturating_add(remaining);
        self.transition(Phase::Running { interval, next_due });
        true
    }

    /// Begin a fresh full interval from now (used after manual navigation).
    /// A paused timer gets a fresh full remaining time instead.
    pub fn restart_phase(&mut self) {
        let interval = match self.phase {
            Phase::Running { interval, .. } => {
                self.phase = Phase::Running {
                    interval,
                    next_due: self.clock.now_ms().saturating_add(interval),
                };
                interval
            }
            Phase::Paused { interval, .. } => {
                self.phase = Phase::Paused {
                    interval,
                    remaining: interval,
                };
                interval
            }
            Phase::Stopped => return,
        };
        self.notifier.notify(&TimerEvent::Restarted {
            remaining_ms: interval,
        });
    }

    /// Number of whole intervals elapsed since the last call. Catches up
    /// when the clock has jumped several intervals.
    pub fn due_advances(&mut self) -> usize {
        let Phase::Running {
            interval,
            mut next_due,
        } = self.phase
        else {
            return 0;
        };
        let now = self.clock.now_ms();
        if next_due > now {
            return 0;
        }
        let elapsed = (now - next_due) / interval + 1;
        next_due = next_due.saturating_add(elapsed.saturating_mul(interval));
        self.phase = Phase::Running { interval, next_due };

        let count = usize::try_from(elapsed).unwrap_or(usize::MAX);
        self.notifier.notify(&TimerEvent::Fired { count });
        count
    }

    /// Apply due advances to a cursor in a single move. Returns how many
    /// steps that move stands for.
    pub fn advance<P>(&mut self, cursor: &mut CursorController, store: &ItemStore<P>) -> usize {
        let count = self.due_advances();
        if count > 0 {
            cursor.advance_by(store, count);
        }
        count
    }

    fn transition(&mut self, to: Phase) {
        let from = self.phase.state();
        self.phase = to;
        debug!(?from, to = ?to.state(), "auto-advance state changed");
        self.notifier.notify(&TimerEvent::StateChanged {
            from,
            to: to.state(),
        });
    }
}
