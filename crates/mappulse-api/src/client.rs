// Latest-devices API client
//
// Composes endpoint → request builder → transport → status check →
// decoder into one `fetch_latest_devices` call. One round trip per call,
// no retries.

use secrecy::SecretString;
use tracing::debug;

use crate::decode::decode_devices;
use crate::endpoint::{DEFAULT_BASE_URL, LatestDevices, build_request};
use crate::error::Error;
use crate::models::Device;
use crate::transport::{HttpTransport, Transport, TransportConfig};

/// Client for the fleet-tracking API, generic over its [`Transport`].
pub struct TrackerClient<T = HttpTransport> {
    transport: T,
    base_url: String,
    api_key: SecretString,
}

impl TrackerClient<HttpTransport> {
    /// Build a client with the default reqwest transport.
    pub fn new(
        base_url: impl Into<String>,
        api_key: SecretString,
        config: &TransportConfig,
    ) -> Result<Self, Error> {
        Ok(Self::with_transport(
            HttpTransport::new(config)?,
            base_url,
            api_key,
        ))
    }

    /// Client for the public OneStep GPS endpoint.
    pub fn public(api_key: SecretString, config: &TransportConfig) -> Result<Self, Error> {
        Self::new(DEFAULT_BASE_URL, api_key, config)
    }
}

impl<T: Transport> TrackerClient<T> {
    /// Build a client over an injected transport.
    pub fn with_transport(transport: T, base_url: impl Into<String>, api_key: SecretString) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            api_key,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch every device with its latest telemetry point.
    ///
    /// Non-2xx statuses fail with [`Error::HttpStatus`] before any
    /// decoding is attempted.
    pub async fn fetch_latest_devices(&self) -> Result<Vec<Device>, Error> {
        let request = build_request(&LatestDevices::new(&self.base_url, &self.api_key))?;
        let response = self.transport.perform(request).await?;

        if !response.is_success() {
            debug!(status = response.status, "latest devices request rejected");
            return Err(Error::HttpStatus {
                status: response.status,
            });
        }

        let devices = decode_devices(&response.body)?;
        debug!(count = devices.len(), "decoded latest devices");
        Ok(devices)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use bytes::Bytes;

    use super::*;
    use crate::endpoint::ApiRequest;
    use crate::transport::RawResponse;

    /// Canned-response transport that records what it was asked to send.
    struct Canned {
        status: u16,
        body: &'static str,
        calls: AtomicUsize,
        last_query: Mutex<Option<String>>,
    }

    impl Canned {
        fn new(status: u16, body: &'static str) -> Self {
            Self {
                status,
                body,
                calls: AtomicUsize::new(0),
                last_query: Mutex::new(None),
            }
        }
    }

    impl Transport for Canned {
        async fn perform(&self, request: ApiRequest) -> Result<RawResponse, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_query.lock().unwrap() = request.url.query().map(String::from);
            Ok(RawResponse {
                status: self.status,
                body: Bytes::from_static(self.body.as_bytes()),
            })
        }
    }

    fn client(status: u16, body: &'static str) -> TrackerClient<Canned> {
        TrackerClient::with_transport(
            Canned::new(status, body),
            "https://fleet.example.com/device",
            SecretString::from("key".to_string()),
        )
    }

    #[tokio::test]
    async fn not_found_skips_decoding() {
        // The body is not JSON; a decode attempt would surface as Error::Decode.
        let client = client(404, "<html>not found</html>");
        let err = client.fetch_latest_devices().await.unwrap_err();
        assert!(matches!(err, Error::HttpStatus { status: 404 }));
        assert_eq!(client.transport().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn decode_failure_is_surfaced() {
        let client = client(200, r#"{"unexpected": true}"#);
        let err = client.fetch_latest_devices().await.unwrap_err();
        match err {
            Error::Decode { message, .. } => assert!(message.contains("result_list")),
            other => panic!("expected Decode error, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn one_round_trip_per_call() {
        let client = client(200, r#"{"result_list": []}"#);
        assert!(client.fetch_latest_devices().await.unwrap().is_empty());
        assert!(client.fetch_latest_devices().await.unwrap().is_empty());
        assert_eq!(client.transport().calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            client.transport().last_query.lock().unwrap().as_deref(),
            Some("latest_point=true&api-key=key")
        );
    }

    #[tokio::test]
    async fn malformed_base_url_never_reaches_transport() {
        let client = TrackerClient::with_transport(
            Canned::new(200, "{}"),
            "::not a url::",
            SecretString::from("key".to_string()),
        );
        let err = client.fetch_latest_devices().await.unwrap_err();
        assert!(matches!(err, Error::InvalidUrl { .. }));
        assert_eq!(client.transport().calls.load(Ordering::SeqCst), 0);
    }
}
