// ── Poll engine ──
//
// Owns one background loop at a time. Every start/stop bumps a generation
// counter; a loop only publishes while its generation is current, so a
// fetch that was in flight when the loop was replaced or stopped is
// discarded instead of overwriting the newer state.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use mappulse_api::{HttpTransport, TrackerClient};

use crate::config::PollerConfig;
use crate::error::CoreError;
use crate::source::PollSource;
use crate::state::PollState;

/// Poller over the device-list endpoint.
pub type DevicePoller<T = HttpTransport> = Poller<TrackerClient<T>>;

/// Periodically fetches from a [`PollSource`] and publishes the outcome.
///
/// Cheap to observe: [`subscribe`](Self::subscribe) hands out `watch`
/// receivers that always hold the most recent [`PollState`]. At most one
/// loop runs per poller; `start()` while running replaces the loop.
pub struct Poller<S: PollSource> {
    shared: Arc<Shared<S>>,
    running: Mutex<Option<LoopHandle>>,
}

struct LoopHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

struct Shared<S: PollSource> {
    source: S,
    interval: Duration,
    state: watch::Sender<PollState<S::Output>>,
    latest: watch::Sender<Option<S::Output>>,
    generation: Mutex<u64>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<S: PollSource> Shared<S> {
    /// Invalidate every running loop and set `next` in the same step.
    fn advance(&self, next: PollState<S::Output>) -> u64 {
        let mut generation = lock(&self.generation);
        *generation += 1;
        self.state.send_replace(next);
        *generation
    }

    /// Publish on behalf of the loop tagged `generation`. Returns `false`
    /// once that loop has been superseded.
    fn publish(&self, generation: u64, next: PollState<S::Output>) -> bool {
        let current = lock(&self.generation);
        if *current != generation {
            return false;
        }
        if let PollState::Success(payload) = &next {
            self.latest.send_replace(Some(payload.clone()));
        }
        self.state.send_replace(next);
        true
    }
}

impl<S: PollSource> Poller<S> {
    pub fn new(source: S, config: PollerConfig) -> Self {
        let (state, _) = watch::channel(PollState::Idle);
        let (latest, _) = watch::channel(None);
        Self {
            shared: Arc::new(Shared {
                source,
                interval: config.interval(),
                state,
                latest,
                generation: Mutex::new(0),
            }),
            running: Mutex::new(None),
        }
    }

    /// Begin polling. State becomes `Loading` before this returns and the
    /// first fetch runs immediately, not after one interval.
    ///
    /// Any loop already running is cancelled first, so repeated calls
    /// never stack loops.
    pub fn start(&self) -> Result<(), CoreError> {
        let runtime = Handle::try_current().map_err(|_| CoreError::NoRuntime)?;

        let mut running = lock(&self.running);
        if let Some(previous) = running.take() {
            previous.cancel.cancel();
            debug!("replacing running poll loop");
        }

        let generation = self.shared.advance(PollState::Loading);
        let cancel = CancellationToken::new();
        let task = runtime.spawn(poll_loop(
            Arc::clone(&self.shared),
            generation,
            cancel.clone(),
        ));
        *running = Some(LoopHandle { cancel, task });

        info!(interval = ?self.shared.interval, generation, "polling started");
        Ok(())
    }

    /// Cancel the loop, if any, and reset state to `Idle`.
    ///
    /// Returns without waiting for an in-flight fetch; its result is
    /// dropped when it completes. Safe to call when not running.
    pub fn stop(&self) {
        let mut running = lock(&self.running);
        if let Some(handle) = running.take() {
            handle.cancel.cancel();
            info!("polling stopped");
        }
        self.shared.advance(PollState::Idle);
    }

    /// Like [`stop`](Self::stop), then wait for the loop task to exit.
    pub async fn shutdown(&self) {
        let handle = {
            let mut running = lock(&self.running);
            running.take()
        };
        self.shared.advance(PollState::Idle);

        if let Some(handle) = handle {
            handle.cancel.cancel();
            if let Err(e) = handle.task.await {
                warn!(error = %e, "poll loop task ended abnormally");
            }
            info!("polling shut down");
        }
    }

    /// A single fetch outside the loop.
    ///
    /// Does not touch [`PollState`]; a success only refreshes
    /// [`latest`](Self::latest). Safe to call while the loop is running.
    pub async fn fetch_once(&self) -> Result<S::Output, CoreError> {
        let payload = self.shared.source.fetch().await?;
        self.shared.latest.send_replace(Some(payload.clone()));
        debug!("one-shot fetch completed");
        Ok(payload)
    }

    // ── Observers ────────────────────────────────────────────────────

    /// Snapshot of the current state.
    pub fn state(&self) -> PollState<S::Output> {
        self.shared.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PollState<S::Output>> {
        self.shared.state.subscribe()
    }

    /// Payload of the most recent successful fetch, from the loop or
    /// [`fetch_once`](Self::fetch_once). Survives `stop()`.
    pub fn latest(&self) -> Option<S::Output> {
        self.shared.latest.borrow().clone()
    }

    pub fn subscribe_latest(&self) -> watch::Receiver<Option<S::Output>> {
        self.shared.latest.subscribe()
    }

    pub fn is_running(&self) -> bool {
        lock(&self.running)
            .as_ref()
            .is_some_and(|handle| !handle.task.is_finished())
    }

    pub fn interval(&self) -> Duration {
        self.shared.interval
    }

    pub fn source(&self) -> &S {
        &self.shared.source
    }
}

impl<S: PollSource> Drop for Poller<S> {
    fn drop(&mut self) {
        let running = self
            .running
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = running.take() {
            handle.cancel.cancel();
        }
    }
}

// ── Loop ─────────────────────────────────────────────────────────────

async fn poll_loop<S: PollSource>(
    shared: Arc<Shared<S>>,
    generation: u64,
    cancel: CancellationToken,
) {
    let mut iteration: u64 = 0;

    loop {
        if cancel.is_cancelled() {
            break;
        }
        iteration += 1;

        let next = match shared.source.fetch().await {
            Ok(payload) => {
                debug!(iteration, "poll succeeded");
                PollState::Success(payload)
            }
            Err(e) => {
                warn!(iteration, error = %e, "poll failed, retrying after interval");
                PollState::Failure(Arc::new(e))
            }
        };

        if cancel.is_cancelled() || !shared.publish(generation, next) {
            debug!(iteration, "discarding result of superseded poll");
            break;
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(shared.interval) => {}
        }
    }

    debug!(generation, iterations = iteration, "poll loop exited");
}
