//! Placeholder history for charts.
//!
//! No archive is read here: points are synthesized from the current result
//! so that the trend chart has something to draw. Sequences are yielded
//! oldest first, matching an ascending time axis.

use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::Rng;
use serde::Serialize;

use crate::status::{pass_rate, StatusSnapshot, SystemResult};

pub const DEFAULT_WINDOW_DAYS: u32 = 90;
pub const DEFAULT_STRIDE_DAYS: u32 = 7;
/// Longest window a chart is drawn over; larger windows are truncated.
pub const MAX_WINDOW_DAYS: u32 = 3650;

/// Upper bound of the per-point jitter applied to passed counts.
const MAX_JITTER: u64 = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPoint {
    pub date: DateTime<Utc>,
    pub passed: u64,
    pub failed: u64,
    pub total: u64,
    pub pass_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryMode {
    /// Repeats the current values at every date (dashboard view).
    Replay,
    /// Moves up to two passed tests into failed per point (detail view).
    Jitter,
}

impl HistoryPoint {
    fn replay(current: &SystemResult, date: DateTime<Utc>) -> Self {
        let pass_rate = if current.total == 0 {
            0.0
        } else {
            current.pass_rate
        };

        Self {
            date,
            passed: current.passed,
            failed: current.failed,
            total: current.total,
            pass_rate,
        }
    }

    fn jittered(current: &SystemResult, date: DateTime<Utc>, jitter: u64) -> Self {
        let passed = current.passed - jitter.min(current.passed);
        let failed = current.failed.saturating_add(current.passed - passed);

        Self {
            date,
            passed,
            failed,
            total: current.total,
            pass_rate: pass_rate(passed, current.total),
        }
    }
}

pub struct Synthesizer<R = StdRng> {
    now: DateTime<Utc>,
    mode: HistoryMode,
    rng: R,
}

impl<R: Rng> Synthesizer<R> {
    pub fn at(now: DateTime<Utc>, mode: HistoryMode, rng: R) -> Self {
        Self { now, mode, rng }
    }

    /// Yields one point every `stride_days` across `window_days`.
    ///
    /// A zero stride is treated as one day and windows are capped at
    /// [`MAX_WINDOW_DAYS`]. Dates that fall outside the representable range
    /// are dropped.
    pub fn synthesize<'a>(
        &'a mut self,
        current: &'a SystemResult,
        window_days: u32,
        stride_days: u32,
    ) -> impl Iterator<Item = HistoryPoint> + 'a {
        let now = self.now;
        let mode = self.mode;
        let rng = &mut self.rng;
        let stride = stride_days.max(1) as usize;

        (0..window_days.min(MAX_WINDOW_DAYS))
            .step_by(stride)
            .rev()
            .filter_map(move |offset| now.checked_sub_signed(Duration::days(i64::from(offset))))
            .map(move |date| match mode {
                HistoryMode::Replay => HistoryPoint::replay(current, date),
                HistoryMode::Jitter => {
                    let jitter = rng.gen_range(0..=MAX_JITTER);
                    HistoryPoint::jittered(current, date, jitter)
                }
            })
    }

    /// History for every system in the snapshot, keyed by identifier.
    pub fn synthesize_all(
        &mut self,
        snapshot: &StatusSnapshot,
        window_days: u32,
        stride_days: u32,
    ) -> IndexMap<String, Vec<HistoryPoint>> {
        snapshot
            .systems
            .iter()
            .map(|(id, result)| {
                let points = self.synthesize(result, window_days, stride_days).collect();
                (id.clone(), points)
            })
            .collect()
    }
}
