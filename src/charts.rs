//! Chart-ready series built from an analytics snapshot.
//!
//! Pure reshaping: the server has already bucketed clicks by date, device and
//! browser, so this module only splits each list into parallel label/data
//! vectors and assigns colors.

use serde::Serialize;
use thiserror::Error;

use crate::models::{AnalyticsSnapshot, Breakdown};

/// Line color of the clicks-over-time series.
pub const CLICKS_FILL: &str = "rgba(75, 192, 192, 0.6)";
pub const CLICKS_BORDER: &str = "rgba(75, 192, 192, 1)";

pub const DEVICE_PALETTE: [&str; 5] = [
    "rgba(255, 99, 132, 0.6)",
    "rgba(54, 162, 235, 0.6)",
    "rgba(255, 206, 86, 0.6)",
    "rgba(75, 192, 192, 0.6)",
    "rgba(153, 102, 255, 0.6)",
];

pub const BROWSER_PALETTE: [&str; 5] = [
    "rgba(54, 162, 235, 0.6)",
    "rgba(255, 99, 132, 0.6)",
    "rgba(255, 206, 86, 0.6)",
    "rgba(75, 192, 192, 0.6)",
    "rgba(153, 102, 255, 0.6)",
];

#[derive(Error, Debug)]
pub enum ChartError {
    /// The payload is missing fields or has the wrong types
    #[error("malformed analytics payload: {0}")]
    Shape(#[from] serde_json::Error),
}

/// One dataset: labels and values in the server's order.
///
/// `colors[i]` belongs to `labels[i]`. Colors come from the palette by
/// position and wrap around when there are more categories than colors, so
/// the same category list always gets the same colors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartSeries {
    pub label: &'static str,
    pub labels: Vec<String>,
    pub data: Vec<u64>,
    pub colors: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSet {
    pub clicks_over_time: ChartSeries,
    pub devices: ChartSeries,
    pub browsers: ChartSeries,
    /// False while the link has never been clicked; charts are hidden then
    pub has_clicks: bool,
}

impl ChartSet {
    pub fn from_snapshot(snapshot: &AnalyticsSnapshot) -> Self {
        Self {
            clicks_over_time: clicks_series(snapshot),
            devices: categorical("Devices", &snapshot.device_breakdown, &DEVICE_PALETTE),
            browsers: categorical("Browsers", &snapshot.browser_breakdown, &BROWSER_PALETTE),
            has_clicks: snapshot.url.clicks > 0,
        }
    }

    /// Build from a raw JSON payload, surfacing missing fields as
    /// [`ChartError::Shape`].
    pub fn from_json(value: serde_json::Value) -> Result<Self, ChartError> {
        let snapshot: AnalyticsSnapshot = serde_json::from_value(value)?;
        Ok(Self::from_snapshot(&snapshot))
    }
}

fn clicks_series(snapshot: &AnalyticsSnapshot) -> ChartSeries {
    let (labels, data) = snapshot
        .clicks_over_time
        .iter()
        .map(|point| (point.date.clone(), point.clicks))
        .unzip();

    ChartSeries {
        label: "Clicks",
        labels,
        data,
        colors: vec![CLICKS_BORDER],
    }
}

fn categorical(label: &'static str, rows: &[Breakdown], palette: &[&'static str]) -> ChartSeries {
    let (labels, data) = rows
        .iter()
        .map(|row| (row.category.clone(), row.count))
        .unzip();

    ChartSeries {
        label,
        labels,
        data,
        colors: palette_colors(palette, rows.len()),
    }
}

/// First `n` colors of `palette`, cycling. Empty palette gives no colors.
pub fn palette_colors(palette: &[&'static str], n: usize) -> Vec<&'static str> {
    palette.iter().copied().cycle().take(n).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClicksOnDate, ShortUrl};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn snapshot(devices: Vec<(&str, u64)>, clicks: u64) -> AnalyticsSnapshot {
        AnalyticsSnapshot {
            url: ShortUrl {
                id: "1".into(),
                original_url: "https://a.com".into(),
                short_code: "abc".into(),
                clicks,
                created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                expires_at: None,
            },
            clicks_over_time: vec![
                ClicksOnDate {
                    date: "2024-01-02".into(),
                    clicks: 2,
                },
                ClicksOnDate {
                    date: "2024-01-01".into(),
                    clicks: 1,
                },
            ],
            device_breakdown: devices
                .into_iter()
                .map(|(category, count)| Breakdown {
                    category: category.into(),
                    count,
                })
                .collect(),
            browser_breakdown: vec![Breakdown {
                category: "Firefox".into(),
                count: 3,
            }],
        }
    }

    #[test]
    fn device_series_keeps_given_order() {
        let charts = ChartSet::from_snapshot(&snapshot(vec![("mobile", 3), ("desktop", 5)], 8));
        assert_eq!(charts.devices.labels, ["mobile", "desktop"]);
        assert_eq!(charts.devices.data, [3, 5]);
        assert_eq!(charts.devices.colors, &DEVICE_PALETTE[..2]);
    }

    #[test]
    fn time_series_is_not_resorted() {
        let charts = ChartSet::from_snapshot(&snapshot(vec![], 3));
        assert_eq!(charts.clicks_over_time.labels, ["2024-01-02", "2024-01-01"]);
        assert_eq!(charts.clicks_over_time.data, [2, 1]);
    }

    #[test]
    fn browser_palette_starts_blue() {
        let charts = ChartSet::from_snapshot(&snapshot(vec![], 3));
        assert_eq!(charts.browsers.colors, [BROWSER_PALETTE[0]]);
    }

    #[test]
    fn colors_cycle_past_palette_end() {
        let colors = palette_colors(&DEVICE_PALETTE, 7);
        assert_eq!(colors.len(), 7);
        assert_eq!(colors[5], DEVICE_PALETTE[0]);
        assert_eq!(colors[6], DEVICE_PALETTE[1]);
    }

    #[test]
    fn colors_are_positional_not_by_name() {
        let a = ChartSet::from_snapshot(&snapshot(vec![("mobile", 1), ("desktop", 1)], 2));
        let b = ChartSet::from_snapshot(&snapshot(vec![("desktop", 1), ("mobile", 1)], 2));
        assert_eq!(a.devices.colors, b.devices.colors);

        let again = ChartSet::from_snapshot(&snapshot(vec![("mobile", 1), ("desktop", 1)], 2));
        assert_eq!(a, again);
    }

    #[test]
    fn no_clicks_hides_charts() {
        assert!(!ChartSet::from_snapshot(&snapshot(vec![], 0)).has_clicks);
    }

    #[test]
    fn from_json_reads_device_and_browser_keys() {
        let charts = ChartSet::from_json(json!({
            "url": {
                "_id": "1",
                "originalUrl": "https://a.com",
                "shortCode": "abc",
                "clicks": 8,
                "createdAt": "2024-01-01T00:00:00Z"
            },
            "clicksOverTime": [{ "date": "2024-01-01", "clicks": 8 }],
            "deviceBreakdown": [
                { "device": "mobile", "count": 3 },
                { "device": "desktop", "count": 5 }
            ],
            "browserBreakdown": [{ "browser": "Chrome", "count": 8 }]
        }))
        .unwrap();

        assert_eq!(charts.devices.labels, ["mobile", "desktop"]);
        assert_eq!(charts.devices.data, [3, 5]);
        assert_eq!(charts.browsers.labels, ["Chrome"]);
    }

    #[test]
    fn missing_fields_are_a_shape_error() {
        let err = ChartSet::from_json(json!({
            "url": {
                "_id": "1",
                "originalUrl": "https://a.com",
                "shortCode": "abc",
                "createdAt": "2024-01-01T00:00:00Z"
            },
            "clicksOverTime": [{ "date": "2024-01-01" }],
            "deviceBreakdown": [],
            "browserBreakdown": []
        }))
        .unwrap_err();

        assert!(matches!(err, ChartError::Shape(_)));
    }
}
