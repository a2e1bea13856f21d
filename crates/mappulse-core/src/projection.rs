// ── Throttled projection ──
//
// Turns the poller's state stream into a rate-limited stream of payloads
// for a consumer such as a map or table renderer. Only `Success` values
// pass; `Loading` and `Failure` never reach the consumer and never clear
// what it last saw. The throttle is trailing-edge: the first success opens
// a window, later successes replace the pending value, and the value
// pending when the window closes is delivered.

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::ProjectionConfig;
use crate::state::PollState;

pub struct StateProjection<T> {
    rx: watch::Receiver<PollState<T>>,
    window: Duration,
}

enum Change<T> {
    Success(T),
    Other,
    Closed,
    Cancelled,
}

impl<T: Clone + Send + Sync + 'static> StateProjection<T> {
    pub fn new(rx: watch::Receiver<PollState<T>>, config: &ProjectionConfig) -> Self {
        Self {
            rx,
            window: config.window(),
        }
    }

    /// Run on a background task until `cancel` fires, the state sender
    /// goes away, or `tx`'s receiver is dropped.
    pub fn spawn(self, tx: mpsc::UnboundedSender<T>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(tx, cancel))
    }

    /// Forward throttled payloads into `tx`.
    ///
    /// A success already present when this starts counts as the first
    /// arrival. When the sender side closes, a pending payload is still
    /// flushed at the end of its window. Cancellation drops it.
    pub async fn run(mut self, tx: mpsc::UnboundedSender<T>, cancel: CancellationToken) {
        let mut carried = self.rx.borrow_and_update().success().cloned();

        loop {
            let first = if let Some(payload) = carried.take() {
                payload
            } else {
                match self.next_change(&cancel).await {
                    Change::Success(payload) => payload,
                    Change::Other => continue,
                    Change::Closed | Change::Cancelled => break,
                }
            };

            let deadline = Instant::now() + self.window;
            let mut pending = first;
            let mut closed = false;

            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => {
                        debug!("projection cancelled with a pending payload");
                        return;
                    }
                    () = sleep_until(deadline) => break,
                    change = self.next_change(&cancel) => match change {
                        Change::Success(payload) => pending = payload,
                        Change::Other => {}
                        Change::Closed => {
                            closed = true;
                        }
                        Change::Cancelled => return,
                    },
                }
                if closed {
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => {
                            debug!("projection cancelled before the final flush");
                            return;
                        }
                        () = sleep_until(deadline) => {}
                    }
                    break;
                }
            }

            if tx.send(pending).is_err() {
                debug!("projection consumer dropped");
                return;
            }
            if closed {
                break;
            }
        }

        debug!("projection finished");
    }

    async fn next_change(&mut self, cancel: &CancellationToken) -> Change<T> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Change::Cancelled,
            changed = self.rx.changed() => {
                if changed.is_err() {
                    return Change::Closed;
                }
                let next = self.rx.borrow_and_update().success().cloned();
                next.map_or(Change::Other, Change::Success)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use mappulse_api::Error as ApiError;
    use tokio::time::sleep;

    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn setup(
        initial: PollState<u32>,
    ) -> (
        watch::Sender<PollState<u32>>,
        mpsc::UnboundedReceiver<u32>,
        CancellationToken,
        JoinHandle<()>,
    ) {
        let (state_tx, state_rx) = watch::channel(initial);
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let config = ProjectionConfig::new(ms(1000)).unwrap();
        let task = StateProjection::new(state_rx, &config).spawn(tx, cancel.clone());
        (state_tx, rx, cancel, task)
    }

    #[tokio::test(start_paused = true)]
    async fn burst_within_window_delivers_only_the_last() {
        let (state, mut out, _cancel, _task) = setup(PollState::Idle);

        state.send_replace(PollState::Success(1));
        sleep(ms(200)).await;
        state.send_replace(PollState::Success(2));
        sleep(ms(700)).await;
        state.send_replace(PollState::Success(3));

        sleep(ms(50)).await;
        assert!(out.try_recv().is_err(), "nothing before the window closes");

        sleep(ms(200)).await;
        assert_eq!(out.try_recv().unwrap(), 3);
        assert!(out.try_recv().is_err(), "exactly one delivery");
    }

    #[tokio::test(start_paused = true)]
    async fn loading_and_failure_are_filtered_out() {
        let (state, mut out, _cancel, _task) = setup(PollState::Idle);

        state.send_replace(PollState::Loading);
        sleep(ms(10)).await;
        state.send_replace(PollState::Failure(Arc::new(ApiError::HttpStatus {
            status: 500,
        })));
        sleep(ms(2000)).await;
        assert!(out.try_recv().is_err());

        state.send_replace(PollState::Success(9));
        sleep(ms(100)).await;
        state.send_replace(PollState::Failure(Arc::new(ApiError::HttpStatus {
            status: 503,
        })));
        sleep(ms(1000)).await;
        assert_eq!(out.try_recv().unwrap(), 9);
        assert!(out.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn separate_windows_deliver_separately() {
        let (state, mut out, _cancel, _task) = setup(PollState::Idle);

        state.send_replace(PollState::Success(1));
        sleep(ms(1500)).await;
        state.send_replace(PollState::Success(2));
        sleep(ms(1500)).await;

        assert_eq!(out.try_recv().unwrap(), 1);
        assert_eq!(out.try_recv().unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn success_present_at_start_is_delivered() {
        let (_state, mut out, _cancel, _task) = setup(PollState::Success(5));

        sleep(ms(1100)).await;
        assert_eq!(out.try_recv().unwrap(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn pending_payload_flushes_when_sender_drops() {
        let (state, mut out, _cancel, task) = setup(PollState::Idle);

        state.send_replace(PollState::Success(4));
        sleep(ms(100)).await;
        drop(state);

        task.await.unwrap();
        assert_eq!(out.try_recv().unwrap(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_after_sender_drops_skips_the_flush() {
        let (state, mut out, cancel, task) = setup(PollState::Idle);

        state.send_replace(PollState::Success(4));
        sleep(ms(100)).await;
        drop(state);
        sleep(ms(100)).await;
        cancel.cancel();

        task.await.unwrap();
        assert!(out.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_without_delivery() {
        let (state, mut out, cancel, task) = setup(PollState::Idle);

        state.send_replace(PollState::Success(1));
        sleep(ms(100)).await;
        cancel.cancel();

        task.await.unwrap();
        assert!(out.try_recv().is_err());
    }
}
