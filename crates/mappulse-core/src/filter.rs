// ── Device view query ──
//
// Presentation-side ordering and filtering of a polled device list,
// applied to each snapshot without re-querying the API.

use std::cmp::Ordering;
use std::collections::HashSet;

use mappulse_api::Device;

/// Display ordering for a device list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Payload order.
    #[default]
    None,
    /// Highest first; a missing altitude counts as 0.
    Altitude,
    /// Fastest first; a device with no point counts as 0.
    Speed,
    /// Alphabetical by drive status tag, ignoring case.
    DriveStatus,
}

impl SortOrder {
    fn compare(self, a: &Device, b: &Device) -> Ordering {
        match self {
            Self::None => Ordering::Equal,
            Self::Altitude => altitude(b).total_cmp(&altitude(a)),
            Self::Speed => speed(b).total_cmp(&speed(a)),
            Self::DriveStatus => status_key(a).cmp(&status_key(b)),
        }
    }
}

fn altitude(device: &Device) -> f64 {
    device
        .latest_point
        .as_ref()
        .and_then(|p| p.altitude)
        .unwrap_or(0.0)
}

fn speed(device: &Device) -> f64 {
    device.latest_point.as_ref().map_or(0.0, |p| p.speed)
}

fn status_key(device: &Device) -> String {
    device.drive_status().unwrap_or_default().to_lowercase()
}

/// Sort, hide and search settings for a device list view.
///
/// Applied in that order: sort, then drop hidden devices, then keep name
/// matches. Sorting is stable, so ties keep payload order.
#[derive(Debug, Clone, Default)]
pub struct DeviceQuery {
    pub sort: SortOrder,
    pub hidden: HashSet<String>,
    pub show_hidden: bool,
    pub search: String,
}

impl DeviceQuery {
    pub fn is_visible(&self, device: &Device) -> bool {
        self.show_hidden || !self.hidden.contains(&device.id)
    }

    /// Case-insensitive substring match on the display name. An empty
    /// (or all-whitespace) query matches everything.
    pub fn matches_search(&self, device: &Device) -> bool {
        let needle = self.search.trim();
        needle.is_empty()
            || device
                .name
                .to_lowercase()
                .contains(&needle.to_lowercase())
    }

    pub fn apply<'a>(&self, devices: &'a [Device]) -> Vec<&'a Device> {
        let mut view: Vec<&Device> = devices.iter().collect();
        if self.sort != SortOrder::None {
            view.sort_by(|a, b| self.sort.compare(a, b));
        }
        view.retain(|d| self.is_visible(d) && self.matches_search(d));
        view
    }
}
