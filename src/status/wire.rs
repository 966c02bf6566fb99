use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use indexmap::IndexMap;
use log::{debug, warn};
use serde::Deserialize;

use super::{pass_rate, StatusSnapshot, SystemResult};
use crate::error::DashError;

#[derive(Debug, Deserialize)]
pub struct StatusDocument {
    #[serde(default)]
    zkvms: Option<IndexMap<String, Option<SystemRecord>>>,
    #[serde(default)]
    last_updated: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SystemRecord {
    zkvm: Option<String>,
    timestamp: Option<String>,
    commit: Option<String>,
    passed: Option<u64>,
    failed: Option<u64>,
    total: Option<u64>,
    pass_rate: Option<f64>,
    isa: Option<String>,
    has_report: Option<bool>,
}

impl StatusDocument {
    pub fn into_snapshot(self) -> StatusSnapshot {
        let last_updated = self.last_updated.as_deref().and_then(parse_timestamp);

        let systems = self
            .zkvms
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(key, record)| {
                let Some(record) = record else {
                    warn!("Skipping null status record for '{key}'");
                    return None;
                };
                let result = record.into_result(&key);
                Some((key, result))
            })
            .collect();

        StatusSnapshot {
            last_updated,
            systems,
        }
    }
}

impl SystemRecord {
    pub fn into_result(self, identifier: &str) -> SystemResult {
        if let Some(declared) = self.zkvm.as_deref() {
            if declared != identifier {
                debug!("Record for '{identifier}' declares zkvm '{declared}'");
            }
        }

        let passed = count_or_default(identifier, "passed", self.passed);
        let failed = count_or_default(identifier, "failed", self.failed);
        let total = count_or_default(identifier, "total", self.total);

        let timestamp = match self.timestamp.as_deref() {
            Some(raw) => parse_timestamp(raw).or_else(|| {
                warn!("Unparseable timestamp '{raw}' for system '{identifier}'");
                None
            }),
            None => {
                report_missing(identifier, "timestamp");
                None
            }
        };

        let commit = self
            .commit
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("unknown"));
        if commit.is_none() {
            report_missing(identifier, "commit");
        }

        let pass_rate = match self.pass_rate {
            Some(rate) if rate.is_finite() => rate.clamp(0.0, 100.0),
            _ => pass_rate(passed, total),
        };

        let result = SystemResult {
            identifier: identifier.to_string(),
            timestamp,
            commit,
            passed,
            failed,
            total,
            pass_rate,
            isa: self.isa.filter(|isa| !isa.trim().is_empty()),
            has_report: self.has_report,
        };

        if !result.is_consistent() {
            debug!(
                "Inconsistent counts for '{identifier}': {passed} passed + {failed} failed != {total} total"
            );
        }

        result
    }
}

fn count_or_default(identifier: &str, field: &'static str, value: Option<u64>) -> u64 {
    value.unwrap_or_else(|| {
        report_missing(identifier, field);
        0
    })
}

fn report_missing(identifier: &str, field: &'static str) {
    let error = DashError::MissingField {
        system: identifier.to_string(),
        field,
    };
    warn!("{error}, using default");
}

/// Accepts RFC 3339, naive ISO-8601 (treated as UTC) and bare dates.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
