//! Device rendering shared by `fetch` and `watch`.

use tabled::Tabled;

use mappulse_api::Device;
use mappulse_core::{DeviceQuery, SortOrder};

use crate::cli::{OutputFormat, SortKey, ViewArgs};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
pub struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Speed")]
    speed: String,
    #[tabled(rename = "Position")]
    position: String,
    #[tabled(rename = "Altitude")]
    altitude: String,
    #[tabled(rename = "Battery")]
    battery: String,
    #[tabled(rename = "Updated (UTC)")]
    updated: String,
}

impl From<&Device> for DeviceRow {
    fn from(d: &Device) -> Self {
        let point = d.latest_point.as_ref();
        Self {
            id: d.id.clone(),
            name: d.name.clone(),
            status: d.drive_status().unwrap_or("-").to_owned(),
            speed: point.map_or_else(|| "-".into(), |p| format!("{:.1}", p.speed)),
            position: d
                .coordinate()
                .map_or_else(|| "-".into(), |(lat, lng)| format!("{lat:.5}, {lng:.5}")),
            altitude: point
                .and_then(|p| p.altitude)
                .map_or_else(|| "-".into(), |alt| format!("{alt:.0}")),
            battery: point
                .and_then(|p| p.battery.as_ref())
                .and_then(|b| b.obd_voltage.or(b.raven_voltage))
                .map_or_else(|| "-".into(), |v| format!("{v:.1} V")),
            updated: d.last_update.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

// ── View ────────────────────────────────────────────────────────────

pub fn view_query(args: &ViewArgs) -> DeviceQuery {
    DeviceQuery {
        sort: match args.sort {
            SortKey::None => SortOrder::None,
            SortKey::Altitude => SortOrder::Altitude,
            SortKey::Speed => SortOrder::Speed,
            SortKey::Status => SortOrder::DriveStatus,
        },
        hidden: args.hide.iter().cloned().collect(),
        show_hidden: args.show_hidden,
        search: args.search.clone().unwrap_or_default(),
    }
}

pub fn render_devices(format: OutputFormat, devices: &[&Device]) -> Result<String, CliError> {
    output::render_list(
        format,
        devices,
        |d| DeviceRow::from(*d),
        |d| d.id.clone(),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use mappulse_api::{BatteryInfo, DevicePoint};

    use super::*;

    fn truck() -> Device {
        Device {
            id: "a1".into(),
            name: "Truck 1".into(),
            make: None,
            model: None,
            active_state: None,
            last_update: Utc.with_ymd_and_hms(2025, 4, 21, 10, 15, 30).unwrap(),
            latest_point: Some(DevicePoint {
                timestamp: Utc.with_ymd_and_hms(2025, 4, 21, 10, 15, 30).unwrap(),
                latitude: 40.712_776,
                longitude: -74.005_974,
                altitude: None,
                heading: Some(90.0),
                speed: 55.5,
                device_state: None,
                battery: Some(BatteryInfo {
                    obd_voltage: None,
                    raven_voltage: Some(13.1),
                }),
            }),
        }
    }

    #[test]
    fn row_formats_telemetry() {
        let row = DeviceRow::from(&truck());
        assert_eq!(row.status, "-");
        assert_eq!(row.speed, "55.5");
        assert_eq!(row.position, "40.71278, -74.00597");
        assert_eq!(row.altitude, "-");
        assert_eq!(row.battery, "13.1 V");
        assert_eq!(row.updated, "2025-04-21 10:15:30");
    }

    #[test]
    fn view_args_map_to_query() {
        let args = ViewArgs {
            sort: SortKey::Status,
            hide: vec!["a1".into(), "b2".into()],
            show_hidden: false,
            search: Some("truck".into()),
        };
        let query = view_query(&args);
        assert_eq!(query.sort, SortOrder::DriveStatus);
        assert!(query.hidden.contains("b2"));
        assert_eq!(query.search, "truck");
    }
}
