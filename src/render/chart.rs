//! Declarative line-chart descriptions.
//!
//! The output mirrors the Chart.js configuration object so the page can hand
//! it straight to the charting library; nothing is drawn here.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use crate::error::Result;
use crate::history::HistoryPoint;

pub const TRENDS_TITLE: &str = "ZKVM Compliance Trends (Last 90 Days)";

const DEFAULT_COLOR: (u8, u8, u8) = (75, 192, 192);
const PALETTE: [(&str, (u8, u8, u8)); 3] = [
    ("sp1", (255, 99, 132)),
    ("openvm", (54, 162, 235)),
    ("jolt", (255, 206, 86)),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub data: ChartData,
    pub options: ChartOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub label: String,
    pub data: Vec<ChartPoint>,
    pub border_color: String,
    pub background_color: String,
    pub tension: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: DateTime<Utc>,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartOptions {
    pub responsive: bool,
    pub maintain_aspect_ratio: bool,
    pub plugins: Plugins,
    pub scales: Scales,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plugins {
    pub title: Title,
    pub legend: Legend,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Title {
    pub display: bool,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub display: bool,
    pub position: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scales {
    pub x: TimeAxis,
    pub y: LinearAxis,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeAxis {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub time: TimeScale,
    pub title: Title,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeScale {
    pub unit: &'static str,
    pub display_formats: DisplayFormats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayFormats {
    pub day: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinearAxis {
    pub begin_at_zero: bool,
    pub min: f64,
    pub max: f64,
    pub title: Title,
}

impl ChartOptions {
    fn with_title(title: &str) -> Self {
        Self {
            responsive: true,
            maintain_aspect_ratio: false,
            plugins: Plugins {
                title: Title {
                    display: true,
                    text: title.to_string(),
                },
                legend: Legend {
                    display: true,
                    position: "top",
                },
            },
            scales: Scales {
                x: TimeAxis {
                    kind: "time",
                    time: TimeScale {
                        unit: "day",
                        display_formats: DisplayFormats { day: "MMM dd" },
                    },
                    title: Title {
                        display: true,
                        text: "Date".to_string(),
                    },
                },
                y: LinearAxis {
                    begin_at_zero: true,
                    min: 0.0,
                    max: 100.0,
                    title: Title {
                        display: true,
                        text: "Pass Rate (%)".to_string(),
                    },
                },
            },
        }
    }
}

impl ChartSpec {
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}

/// Builds one line series per identifier, skipping empty histories.
pub fn render(series: &IndexMap<String, Vec<HistoryPoint>>, title: &str) -> ChartSpec {
    let datasets = series
        .iter()
        .filter(|(_, history)| !history.is_empty())
        .map(|(id, history)| dataset(id, history))
        .collect();

    ChartSpec {
        kind: "line",
        data: ChartData { datasets },
        options: ChartOptions::with_title(title),
    }
}

fn dataset(identifier: &str, history: &[HistoryPoint]) -> Dataset {
    let (r, g, b) = color_for(identifier);

    Dataset {
        label: identifier.to_uppercase(),
        data: history
            .iter()
            .map(|point| ChartPoint {
                x: point.date,
                y: point.pass_rate,
            })
            .collect(),
        border_color: format!("rgb({r}, {g}, {b})"),
        background_color: format!("rgba({r}, {g}, {b}, 0.1)"),
        tension: 0.1,
    }
}

fn color_for(identifier: &str) -> (u8, u8, u8) {
    let key = identifier.to_lowercase();
    PALETTE
        .iter()
        .find(|(id, _)| *id == key)
        .map_or(DEFAULT_COLOR, |(_, rgb)| *rgb)
}
