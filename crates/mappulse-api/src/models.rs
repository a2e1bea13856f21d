// Device list response types
//
// Wire model for the `result_list` payload. Field names follow the API's
// snake_case keys via `rename`; unknown keys are ignored. Dates and
// voltages go through the lenient helpers in `decode`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decode;

// ── Response Envelope ────────────────────────────────────────────────

/// Top-level response of the latest-devices resource.
///
/// ```json
/// { "result_list": [ { "device_id": "...", ... } ] }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceListResponse {
    pub result_list: Vec<Device>,
}

// ── Device ───────────────────────────────────────────────────────────

/// One tracked device. Rebuilt from scratch on every poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    #[serde(rename = "device_id")]
    pub id: String,
    #[serde(rename = "display_name")]
    pub name: String,
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    /// Free-text tag such as `"active"`; not interpreted.
    #[serde(default)]
    pub active_state: Option<String>,
    #[serde(rename = "updated_at", deserialize_with = "decode::timestamp")]
    pub last_update: DateTime<Utc>,
    #[serde(default, rename = "latest_device_point")]
    pub latest_point: Option<DevicePoint>,
}

impl Device {
    /// `(latitude, longitude)` of the latest point, if the device has one.
    pub fn coordinate(&self) -> Option<(f64, f64)> {
        self.latest_point
            .as_ref()
            .map(|p| (p.latitude, p.longitude))
    }

    /// Drive status tag of the latest point, if reported.
    pub fn drive_status(&self) -> Option<&str> {
        self.latest_point
            .as_ref()
            .and_then(|p| p.device_state.as_ref())
            .map(|s| s.drive_status.as_str())
    }
}

// ── Telemetry point ──────────────────────────────────────────────────

/// Timestamped location / status / battery snapshot.
///
/// `altitude`, `angle`, `device_state` and `params` are best-effort: a
/// malformed value reads as absent instead of failing the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevicePoint {
    #[serde(rename = "dt_tracker", deserialize_with = "decode::timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lng")]
    pub longitude: f64,
    #[serde(default, deserialize_with = "decode::lenient")]
    pub altitude: Option<f64>,
    #[serde(default, rename = "angle", deserialize_with = "decode::lenient")]
    pub heading: Option<f64>,
    pub speed: f64,
    #[serde(default, deserialize_with = "decode::lenient")]
    pub device_state: Option<DriveState>,
    #[serde(default, rename = "params", deserialize_with = "decode::lenient")]
    pub battery: Option<BatteryInfo>,
}

/// Drive status plus time and distance since it last changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriveState {
    pub drive_status: String,
    pub drive_status_duration: StatusMeasure,
    pub drive_status_distance: StatusMeasure,
}

impl DriveState {
    pub fn status(&self) -> DriveStatus {
        DriveStatus::classify(&self.drive_status)
    }
}

/// Opaque `(value, unit, display)` triple. No unit conversion is done.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusMeasure {
    pub value: f64,
    pub unit: String,
    pub display: String,
}

/// Coarse classification of the free-form drive status tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriveStatus {
    Driving,
    Idle,
    /// Anything that is neither driving nor idle.
    Off,
}

impl DriveStatus {
    pub fn classify(tag: &str) -> Self {
        if tag.eq_ignore_ascii_case("driving") {
            Self::Driving
        } else if tag.eq_ignore_ascii_case("idle") {
            Self::Idle
        } else {
            Self::Off
        }
    }
}

// ── Battery ──────────────────────────────────────────────────────────

/// Battery voltages. Each field accepts a number or a numeric string;
/// anything else reads as absent for that field only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatteryInfo {
    #[serde(
        default,
        rename = "obd_battery_voltage",
        deserialize_with = "decode::flexible_f64"
    )]
    pub obd_voltage: Option<f64>,
    #[serde(
        default,
        rename = "obd_batt_volt_raven",
        deserialize_with = "decode::flexible_f64"
    )]
    pub raven_voltage: Option<f64>,
}
