mod loader;
mod wire;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use crate::error::Result;

pub use loader::{FallbackPolicy, StatusLoader, StatusSource};

/// One full set of current results across all tracked zkVMs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub last_updated: Option<DateTime<Utc>>,
    pub systems: IndexMap<String, SystemResult>,
}

/// Current compliance result for a single zkVM.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemResult {
    pub identifier: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub commit: Option<String>,
    pub passed: u64,
    pub failed: u64,
    pub total: u64,
    pub pass_rate: f64,
    pub isa: Option<String>,
    pub has_report: Option<bool>,
}

impl StatusSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses a status document and coerces every record into its typed form.
    pub fn from_json(body: &str) -> Result<Self> {
        let document: wire::StatusDocument = serde_json::from_str(body)?;
        Ok(document.into_snapshot())
    }

    /// Fixed demonstration data, only used when explicitly requested.
    pub fn demo(now: DateTime<Utc>) -> Self {
        let systems = [
            ("sp1", "fc98075a", 46, 1, 47, 97.87),
            ("openvm", "a6f77215f", 47, 0, 47, 100.0),
            ("jolt", "c4b9b060", 44, 3, 47, 93.62),
        ]
        .into_iter()
        .map(|(id, commit, passed, failed, total, pass_rate)| {
            let result = SystemResult {
                identifier: id.to_string(),
                timestamp: Some(now),
                commit: Some(commit.to_string()),
                passed,
                failed,
                total,
                pass_rate,
                isa: None,
                has_report: None,
            };
            (id.to_string(), result)
        })
        .collect();

        Self {
            last_updated: Some(now),
            systems,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }
}

impl SystemResult {
    /// Parses a single injected record, as handed to a detail page.
    pub fn from_json(identifier: &str, body: &str) -> Result<Self> {
        let record: wire::SystemRecord = serde_json::from_str(body)?;
        Ok(record.into_result(identifier))
    }

    /// Whether `passed + failed == total` holds for this record.
    pub fn is_consistent(&self) -> bool {
        self.passed.checked_add(self.failed) == Some(self.total)
    }
}

/// Percentage of passed tests in `[0, 100]`, 0 when nothing ran.
///
/// Inconsistent counts (`passed > total`) saturate at 100.
pub fn pass_rate(passed: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }

    #[allow(clippy::cast_precision_loss)]
    let rate = (passed as f64 / total as f64) * 100.0;
    rate.clamp(0.0, 100.0)
}
