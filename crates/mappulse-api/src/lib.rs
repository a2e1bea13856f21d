//! Async client for the OneStep GPS "latest devices" resource.
//!
//! Layers, leaves first:
//!
//! - [`Transport`]: one HTTP exchange, raw bytes plus status
//!   ([`HttpTransport`] is the reqwest-backed default).
//! - [`Endpoint`] / [`build_request`]: endpoint descriptor to concrete
//!   [`ApiRequest`].
//! - [`decode_devices`]: body to [`Device`] list, tolerant of the API's
//!   mixed date formats and string-typed voltages.
//! - [`TrackerClient`]: the composed `fetch_latest_devices` call.

pub mod client;
pub mod decode;
pub mod endpoint;
pub mod error;
pub mod models;
pub mod transport;

pub use client::TrackerClient;
pub use decode::{decode_devices, parse_timestamp};
pub use endpoint::{ApiRequest, DEFAULT_BASE_URL, Endpoint, LatestDevices, build_request};
pub use error::Error;
pub use models::{
    BatteryInfo, Device, DeviceListResponse, DevicePoint, DriveState, DriveStatus, StatusMeasure,
};
pub use transport::{HttpTransport, RawResponse, TlsMode, Transport, TransportConfig};
