//! The scheduling capability every engine depends on.
//!
//! Engines never touch timers directly. They ask a [`Scheduler`] to run a
//! callback again after a period, keep the returned [`ScheduleHandle`], and
//! cancel it when they stop. Two implementations are provided:
//!
//! - [`TokioScheduler`]: one tokio task per callback, ticking with
//!   `tokio::time::interval_at`. Cancelling aborts the task.
//! - [`ManualScheduler`]: a virtual clock that only moves when
//!   [`ManualScheduler::advance`] is called, firing due callbacks in time
//!   order. It makes engine tests deterministic.

use crate::common::ScheduleHandle;
use slotmap::SlotMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::trace;

/// A callback run by a scheduler. It must not call back into the scheduler's
/// owner to start new work synchronously.
pub type ScheduledTask = Box<dyn FnMut() + Send + 'static>;

/// Abstracts "run this again after `period`" and "run this once after `delay`".
pub trait Scheduler: Send + Sync {
    /// Monotonic time elapsed since the scheduler was created.
    fn now(&self) -> Duration;

    /// Runs `task` every `period`, first after one full period.
    fn schedule_repeating(&self, period: Duration, task: ScheduledTask) -> ScheduleHandle;

    /// Runs `task` once after `delay`.
    fn schedule_once(&self, delay: Duration, task: ScheduledTask) -> ScheduleHandle;

    /// Cancels a pending callback. Returns `true` if the handle was still live.
    fn cancel(&self, handle: ScheduleHandle) -> bool;
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Production scheduler backed by the tokio runtime it was created in.
pub struct TokioScheduler {
    runtime: Handle,
    origin: Instant,
    tasks: Arc<Mutex<SlotMap<ScheduleHandle, AbortHandle>>>,
}

impl TokioScheduler {
    /// Creates a scheduler bound to the current tokio runtime.
    ///
    /// # Panics
    /// Panics when called outside of a tokio runtime, like `tokio::spawn`.
    pub fn new() -> Self {
        Self::with_handle(Handle::current())
    }

    pub fn with_handle(runtime: Handle) -> Self {
        Self {
            runtime,
            origin: Instant::now(),
            tasks: Arc::new(Mutex::new(SlotMap::with_key())),
        }
    }

    /// Number of callbacks that are still scheduled.
    pub fn pending(&self) -> usize {
        lock(&self.tasks).len()
    }
}

impl Default for TokioScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for TokioScheduler {
    fn now(&self) -> Duration {
        Instant::now().duration_since(self.origin)
    }

    fn schedule_repeating(&self, period: Duration, mut task: ScheduledTask) -> ScheduleHandle {
        let period = period.max(Duration::from_millis(1));
        let mut tasks = lock(&self.tasks);
        tasks.insert_with_key(|handle| {
            let join = self.runtime.spawn(async move {
                let mut ticker = interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    trace!("Repeating callback {:?} fired.", handle);
                    task();
                }
            });
            join.abort_handle()
        })
    }

    fn schedule_once(&self, delay: Duration, mut task: ScheduledTask) -> ScheduleHandle {
        let registry = self.tasks.clone();
        let mut tasks = lock(&self.tasks);
        tasks.insert_with_key(|handle| {
            let join = self.runtime.spawn(async move {
                tokio::time::sleep(delay).await;
                lock(&registry).remove(handle);
                trace!("One-shot callback {:?} fired.", handle);
                task();
            });
            join.abort_handle()
        })
    }

    fn cancel(&self, handle: ScheduleHandle) -> bool {
        match lock(&self.tasks).remove(handle) {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, task) in lock(&self.tasks).drain() {
            task.abort();
        }
    }
}

struct ManualEntry {
    due: Duration,
    period: Option<Duration>,
    order: u64,
    /// Taken out while the callback runs so the registry lock is not held.
    task: Option<ScheduledTask>,
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    next_order: u64,
    entries: SlotMap<ScheduleHandle, ManualEntry>,
}

/// A deterministic scheduler driven by explicit calls to [`advance`].
///
/// Cloning yields another handle to the same virtual clock.
///
/// [`advance`]: ManualScheduler::advance
#[derive(Clone, Default)]
pub struct ManualScheduler {
    state: Arc<Mutex<ManualState>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of callbacks that are still scheduled.
    pub fn pending(&self) -> usize {
        lock(&self.state).entries.len()
    }

    /// Moves the virtual clock forward by `by`, running every callback that
    /// falls due on the way in time order. Callbacks due at the same instant
    /// run in the order they were scheduled.
    pub fn advance(&self, by: Duration) {
        let target = lock(&self.state).now + by;
        loop {
            let next = {
                let mut state = lock(&self.state);
                let due = state
                    .entries
                    .iter()
                    .filter(|(_, entry)| entry.due <= target && entry.task.is_some())
                    .min_by_key(|(_, entry)| (entry.due, entry.order))
                    .map(|(handle, entry)| (handle, entry.due));
                match due {
                    Some((handle, due)) => {
                        state.now = due;
                        state
                            .entries
                            .get_mut(handle)
                            .and_then(|entry| entry.task.take())
                            .map(|task| (handle, task))
                    }
                    None => None,
                }
            };
            let Some((handle, mut task)) = next else {
                break;
            };

            task();

            let mut state = lock(&self.state);
            match state.entries.get(handle).map(|entry| entry.period) {
                Some(Some(period)) => {
                    let order = state.next_order;
                    state.next_order += 1;
                    if let Some(entry) = state.entries.get_mut(handle) {
                        entry.due += period;
                        entry.order = order;
                        entry.task = Some(task);
                    }
                }
                Some(None) => {
                    state.entries.remove(handle);
                }
                // Cancelled from inside its own callback.
                None => {}
            }
        }
        lock(&self.state).now = target;
    }

    fn insert(&self, delay: Duration, period: Option<Duration>, task: ScheduledTask) -> ScheduleHandle {
        let mut state = lock(&self.state);
        let order = state.next_order;
        state.next_order += 1;
        let due = state.now + delay;
        state.entries.insert(ManualEntry {
            due,
            period,
            order,
            task: Some(task),
        })
    }
}

impl Scheduler for ManualScheduler {
    fn now(&self) -> Duration {
        lock(&self.state).now
    }

    fn schedule_repeating(&self, period: Duration, task: ScheduledTask) -> ScheduleHandle {
        self.insert(period, Some(period.max(Duration::from_nanos(1))), task)
    }

    fn schedule_once(&self, delay: Duration, task: ScheduledTask) -> ScheduleHandle {
        self.insert(delay, None, task)
    }

    fn cancel(&self, handle: ScheduleHandle) -> bool {
        lock(&self.state).entries.remove(handle).is_some()
    }
}
