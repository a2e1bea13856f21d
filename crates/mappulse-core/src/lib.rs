//! Polling engine and reactive state for mappulse.
//!
//! [`Poller`] runs one background fetch loop against a [`PollSource`]
//! (normally a [`TrackerClient`](mappulse_api::TrackerClient)) and
//! publishes a [`PollState`] through `tokio::sync::watch`.
//! [`StateProjection`] turns that stream into a throttled stream of
//! successful payloads, and [`DeviceQuery`] orders and filters a snapshot
//! for display.

pub mod config;
pub mod error;
pub mod filter;
pub mod poller;
pub mod projection;
pub mod source;
pub mod state;

pub use config::{PollerConfig, ProjectionConfig};
pub use error::CoreError;
pub use filter::{DeviceQuery, SortOrder};
pub use poller::{DevicePoller, Poller};
pub use projection::StateProjection;
pub use source::PollSource;
pub use state::PollState;
