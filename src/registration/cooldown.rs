//! Cancellable repeating tasks driving the resend cooldown.
//!
//! The orchestrator never sleeps itself. It asks a [`TickScheduler`] for a
//! repeating task and receives ticks as ordinary events, tagged with the
//! [`TimerId`] of the task that produced them. Cancelling a [`RepeatingTask`]
//! runs its canceller at most once; dropping the handle cancels it too.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

pub type TimerId = u64;

type Canceller = Box<dyn FnOnce() + Send>;

/// Handle to a scheduled repeating task.
pub struct RepeatingTask {
    id: TimerId,
    canceller: Option<Canceller>,
}

impl RepeatingTask {
    pub fn new(id: TimerId, canceller: impl FnOnce() + Send + 'static) -> Self {
        Self {
            id,
            canceller: Some(Box::new(canceller)),
        }
    }

    pub fn id(&self) -> TimerId {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.canceller.is_some()
    }

    /// Stop the task. Returns `true` only for the call that actually cancelled it.
    pub fn cancel(&mut self) -> bool {
        match self.canceller.take() {
            Some(canceller) => {
                canceller();
                true
            }
            None => false,
        }
    }
}

impl Drop for RepeatingTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for RepeatingTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepeatingTask")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

pub trait TickScheduler: Send {
    /// Start delivering ticks for `id` every `period`, first one after one period.
    fn schedule_repeating(&self, id: TimerId, period: Duration) -> RepeatingTask;
}

/// Scheduler backed by a tokio task that pushes ticks into an mpsc channel.
pub struct TokioScheduler<T> {
    sender: mpsc::UnboundedSender<T>,
    make_tick: fn(TimerId) -> T,
}

impl<T> TokioScheduler<T> {
    pub fn new(sender: mpsc::UnboundedSender<T>, make_tick: fn(TimerId) -> T) -> Self {
        Self { sender, make_tick }
    }
}

impl<T: Send + 'static> TickScheduler for TokioScheduler<T> {
    fn schedule_repeating(&self, id: TimerId, period: Duration) -> RepeatingTask {
        let sender = self.sender.clone();
        let make_tick = self.make_tick;

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if sender.send(make_tick(id)).is_err() {
                    // Receiver is gone, nobody is listening anymore.
                    break;
                }
            }
        });

        RepeatingTask::new(id, move || handle.abort())
    }
}

#[derive(Debug, Default)]
struct ManualState {
    scheduled: Vec<TimerId>,
    cancelled: Vec<TimerId>,
}

/// Scheduler that never fires on its own. Callers deliver ticks by hand,
/// which makes virtual-time driving deterministic. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    state: Arc<Mutex<ManualState>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scheduled(&self) -> Vec<TimerId> {
        self.state.lock().map(|s| s.scheduled.clone()).unwrap_or_default()
    }

    pub fn cancelled(&self) -> Vec<TimerId> {
        self.state.lock().map(|s| s.cancelled.clone()).unwrap_or_default()
    }

    /// Timers scheduled and not yet cancelled.
    pub fn active(&self) -> Vec<TimerId> {
        self.state
            .lock()
            .map(|s| {
                s.scheduled
                    .iter()
                    .filter(|id| !s.cancelled.contains(id))
                    .copied()
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl TickScheduler for ManualScheduler {
    fn schedule_repeating(&self, id: TimerId, _period: Duration) -> RepeatingTask {
        if let Ok(mut state) = self.state.lock() {
            state.scheduled.push(id);
        }
        let state = Arc::clone(&self.state);
        RepeatingTask::new(id, move || {
            if let Ok(mut state) = state.lock() {
                state.cancelled.push(id);
            }
        })
    }
}
