//! Host task scheduling used for the save-coalescing reset.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::sleep;

pub type DeferredTask = Box<dyn FnOnce() + Send + 'static>;

pub trait HostScheduler: Send + Sync {
    /// Runs `task` once, `ticks` simulation ticks from now.
    fn run_after(&self, ticks: u64, task: DeferredTask);
}

/// Scheduler driven explicitly by the host's tick loop.
#[derive(Default)]
pub struct ManualScheduler {
    inner: Mutex<ManualQueue>,
}

#[derive(Default)]
struct ManualQueue {
    tick: u64,
    tasks: Vec<(u64, DeferredTask)>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_tick(&self) -> u64 {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).tick
    }

    pub fn pending(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .tasks
            .len()
    }

    /// Advances one tick and runs every task that became due. Returns how
    /// many ran.
    pub fn advance(&self) -> usize {
        let due = {
            let mut queue = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            queue.tick += 1;
            let now = queue.tick;
            let (due, waiting): (Vec<_>, Vec<_>) =
                queue.tasks.drain(..).partition(|(at, _)| *at <= now);
            queue.tasks = waiting;
            due
        };

        // Run outside the lock so a task may schedule again.
        let ran = due.len();
        for (_, task) in due {
            task();
        }
        ran
    }
}

impl HostScheduler for ManualScheduler {
    fn run_after(&self, ticks: u64, task: DeferredTask) {
        let mut queue = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let at = queue.tick.saturating_add(ticks.max(1));
        queue.tasks.push((at, task));
    }
}

/// Scheduler that maps ticks onto wall-clock delays on a tokio runtime.
#[derive(Clone)]
pub struct TokioScheduler {
    handle: Handle,
    tick: Duration,
}

impl TokioScheduler {
    pub fn new(handle: Handle, tick: Duration) -> Self {
        Self { handle, tick }
    }

    /// Uses the runtime the caller is currently running on.
    pub fn current(tick: Duration) -> Self {
        Self::new(Handle::current(), tick)
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }
}

impl HostScheduler for TokioScheduler {
    fn run_after(&self, ticks: u64, task: DeferredTask) {
        let delay = self.tick.saturating_mul(u32::try_from(ticks.max(1)).unwrap_or(u32::MAX));
        self.handle.spawn(async move {
            sleep(delay).await;
            task();
        });
    }
}
