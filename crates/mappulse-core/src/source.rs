// ── Poll sources ──
//
// What the poller fetches from. `TrackerClient` is the production source;
// tests plug in scripted ones.

use std::future::Future;
use std::sync::Arc;

use mappulse_api::{Device, Error as ApiError, TrackerClient, Transport};

/// A resource the [`Poller`](crate::Poller) can fetch repeatedly.
///
/// One call is one attempt; retry policy belongs to the poller.
pub trait PollSource: Send + Sync + 'static {
    /// Payload carried by `PollState::Success`. Cloned to every observer,
    /// so it should be cheap to clone.
    type Output: Clone + Send + Sync + 'static;

    fn fetch(&self) -> impl Future<Output = Result<Self::Output, ApiError>> + Send;
}

impl<T: Transport> PollSource for TrackerClient<T> {
    type Output = Arc<Vec<Device>>;

    async fn fetch(&self) -> Result<Self::Output, ApiError> {
        self.fetch_latest_devices().await.map(Arc::new)
    }
}
