//! Sync Scheduler: fixed-interval background refresh with an edit guard.

use crate::utils::time::format_countdown;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(300);

/// "An edit surface is open" flag shared between the edit session and the scheduler.
#[derive(Debug, Clone, Default)]
pub struct EditGuard(Arc<AtomicBool>);

impl EditGuard {
    pub fn open(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn close(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_open(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What the countdown shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    Inactive,
    Remaining(Duration),
    Refreshing,
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Countdown::Inactive => write!(f, "Stopped"),
            Countdown::Remaining(d) => write!(f, "Refresh: {}", format_countdown(*d)),
            Countdown::Refreshing => write!(f, "Refreshing..."),
        }
    }
}

#[derive(Debug)]
struct TickState {
    next_fire: Instant,
    refreshing: bool,
}

fn lock(state: &Mutex<TickState>) -> MutexGuard<'_, TickState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

/// A running refresh loop. Consumed by `stop`.
#[derive(Debug)]
pub struct SchedulerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
    state: Arc<Mutex<TickState>>,
}

impl SchedulerHandle {
    fn countdown(&self) -> Countdown {
        let st = lock(&self.state);
        if st.refreshing {
            return Countdown::Refreshing;
        }
        let left = st.next_fire.saturating_duration_since(Instant::now());
        if left.as_secs() == 0 {
            Countdown::Refreshing
        } else {
            Countdown::Remaining(Duration::from_secs(left.as_secs()))
        }
    }

    fn time_remaining(&self) -> Duration {
        lock(&self.state)
            .next_fire
            .saturating_duration_since(Instant::now())
    }

    pub fn stop(self) {
        self.cancel.cancel();
        self.task.abort();
    }
}

/// Owns at most one refresh loop per connected source.
#[derive(Debug, Default)]
pub struct SyncScheduler {
    guard: EditGuard,
    handle: Option<SchedulerHandle>,
}

impl SyncScheduler {
    pub fn new(guard: EditGuard) -> Self {
        Self {
            guard,
            handle: None,
        }
    }

    pub fn guard(&self) -> &EditGuard {
        &self.guard
    }

    /// Start firing `fetch` every `interval`. A running loop is stopped first.
    /// Must be called from within a tokio runtime.
    pub fn start<F, Fut>(&mut self, interval: Duration, fetch: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.stop();

        let interval = interval.max(Duration::from_secs(1));
        let state = Arc::new(Mutex::new(TickState {
            next_fire: Instant::now() + interval,
            refreshing: false,
        }));
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_loop(
            interval,
            fetch,
            self.guard.clone(),
            Arc::clone(&state),
            cancel.clone(),
        ));

        log::debug!("auto refresh started, every {}s", interval.as_secs());
        self.handle = Some(SchedulerHandle {
            cancel,
            task,
            state,
        });
    }

    pub fn stop(&mut self) {
        if let Some(h) = self.handle.take() {
            h.stop();
            log::debug!("auto refresh stopped");
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    /// `None` when inactive.
    pub fn time_remaining(&self) -> Option<Duration> {
        self.handle.as_ref().map(SchedulerHandle::time_remaining)
    }

    pub fn countdown(&self) -> Countdown {
        self.handle
            .as_ref()
            .map_or(Countdown::Inactive, SchedulerHandle::countdown)
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_loop<F, Fut>(
    interval: Duration,
    fetch: F,
    guard: EditGuard,
    state: Arc<Mutex<TickState>>,
    cancel: CancellationToken,
) where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    loop {
        let deadline = lock(&state).next_fire;
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = sleep_until(deadline) => {}
        }

        if guard.is_open() {
            log::debug!("edit in progress, skipping scheduled refresh");
        } else {
            lock(&state).refreshing = true;
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = fetch() => {}
            }
        }

        let mut st = lock(&state);
        st.refreshing = false;
        st.next_fire = Instant::now() + interval;
    }
}
