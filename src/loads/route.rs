//! Route derivation for load cards
//!
//! The first stop is the pickup and the last stop is the drop. A load
//! without stops shows placeholder values instead of failing.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;

use super::types::{Load, Stop};

/// Placeholder for a stop without a city
pub const UNKNOWN_CITY: &str = "Unknown";
/// Placeholder for a stop without a date
pub const UNKNOWN_DATE: &str = "TBD";
/// Placeholder for an empty commodity
pub const DEFAULT_COMMODITY: &str = "General Freight";

/// Display values for one end of a route
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StopView {
    pub city: String,
    pub state: String,
    pub date: String,
}

impl StopView {
    fn from_stop(stop: Option<&Stop>) -> Self {
        let city = stop
            .and_then(|s| s.city.as_deref())
            .filter(|c| !c.is_empty())
            .unwrap_or(UNKNOWN_CITY)
            .to_string();
        let state = stop
            .and_then(|s| s.state.clone())
            .unwrap_or_default();
        let date = format_date(stop.and_then(|s| s.date.as_deref()));

        Self { city, state, date }
    }
}

/// Pickup and drop of a load
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteSummary {
    pub pickup: StopView,
    pub drop: StopView,
}

impl RouteSummary {
    pub fn for_load(load: &Load) -> Self {
        let stops = load.route_stops();

        Self {
            pickup: StopView::from_stop(stops.first()),
            drop: StopView::from_stop(stops.last()),
        }
    }
}

/// Commodity label, falling back to the generic freight label
pub fn commodity_label(load: &Load) -> &str {
    if load.commodity.is_empty() {
        DEFAULT_COMMODITY
    } else {
        &load.commodity
    }
}

/// Format a stop date as a short month and day ("Mar 4")
///
/// Accepts plain dates, RFC 3339 timestamps and naive timestamps. Empty
/// input renders as "TBD"; text that is not a date is shown as written.
pub fn format_date(raw: Option<&str>) -> String {
    let raw = match raw.map(str::trim) {
        Some(s) if !s.is_empty() => s,
        _ => return UNKNOWN_DATE.to_string(),
    };

    parse_date(raw)
        .map(|d| d.format("%b %-d").to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
}
