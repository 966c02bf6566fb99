use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::Result;
use crate::history::{HistoryMode, Synthesizer, DEFAULT_STRIDE_DAYS, DEFAULT_WINDOW_DAYS};
use crate::render::chart::{self, TRENDS_TITLE};
use crate::render::page::{self, IndexPage};
use crate::render::summary::summarize;
use crate::render::table::{TableRenderer, DEFAULT_COMMIT_URL_BASE};
use crate::render::file_stem;
use crate::status::{FallbackPolicy, StatusLoader, StatusSnapshot, SystemResult};

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub output_dir: PathBuf,
    pub fallback: FallbackPolicy,
    pub window_days: u32,
    pub stride_days: u32,
    pub commit_url_base: String,
    pub pretty: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("site"),
            fallback: FallbackPolicy::default(),
            window_days: DEFAULT_WINDOW_DAYS,
            stride_days: DEFAULT_STRIDE_DAYS,
            commit_url_base: DEFAULT_COMMIT_URL_BASE.to_string(),
            pretty: false,
        }
    }
}

/// Rendered artifacts of one cycle, keyed by path relative to the output directory.
#[derive(Debug, Default)]
pub struct Site {
    pub files: IndexMap<PathBuf, String>,
}

#[derive(Debug)]
pub struct CycleReport {
    pub systems: usize,
    pub fell_back: bool,
    pub files_written: usize,
}

/// Owns the loader and the most recent snapshot.
pub struct Dashboard {
    loader: StatusLoader,
    config: DashboardConfig,
    snapshot: StatusSnapshot,
}

impl Dashboard {
    pub fn new(loader: StatusLoader, config: DashboardConfig) -> Self {
        Self {
            loader,
            config,
            snapshot: StatusSnapshot::empty(),
        }
    }

    pub fn snapshot(&self) -> &StatusSnapshot {
        &self.snapshot
    }

    /// One full load → render → write cycle.
    pub async fn refresh(&mut self) -> Result<CycleReport> {
        let now = Utc::now();
        let (snapshot, error) = self
            .loader
            .load_or_fallback(self.config.fallback, now)
            .await;
        self.snapshot = snapshot;
        if self.snapshot.is_empty() {
            warn!("No systems to render, emitting placeholder table");
        }

        let mut rng = StdRng::from_entropy();
        let site = build_site(&self.snapshot, &self.config, now, &mut rng)?;
        let files_written = write_site(&site, &self.config.output_dir).await?;

        info!(
            "Rendered {} systems into {}",
            self.snapshot.systems.len(),
            self.config.output_dir.display()
        );

        Ok(CycleReport {
            systems: self.snapshot.systems.len(),
            fell_back: error.is_some(),
            files_written,
        })
    }
}

pub fn build_site<R: Rng>(
    snapshot: &StatusSnapshot,
    config: &DashboardConfig,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<Site> {
    let mut site = Site::default();

    let rows = TableRenderer::new(config.commit_url_base.as_str()).render(snapshot);
    let cards = summarize(snapshot, now);

    let mut replay = Synthesizer::at(now, HistoryMode::Replay, &mut *rng);
    let series = replay.synthesize_all(snapshot, config.window_days, config.stride_days);
    let trends = chart::render(&series, TRENDS_TITLE);

    let index = IndexPage {
        last_updated: snapshot.last_updated,
        cards: &cards,
        rows: &rows,
        chart: &trends,
    }
    .render()?;
    site.files.insert(PathBuf::from("index.html"), index);
    site.files
        .insert(PathBuf::from("chart.json"), trends.to_json(config.pretty)?);

    for result in snapshot.systems.values() {
        let (path, html) = build_detail(result, config, now, &mut *rng)?;
        if site.files.contains_key(&path) {
            warn!(
                "Detail page {} for '{}' collides with another system, skipping",
                path.display(),
                result.identifier
            );
            continue;
        }
        site.files.insert(path, html);
    }

    Ok(site)
}

/// Detail page for one system, with a jittered placeholder trend.
pub fn build_detail<R: Rng>(
    result: &SystemResult,
    config: &DashboardConfig,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<(PathBuf, String)> {
    let mut jitter = Synthesizer::at(now, HistoryMode::Jitter, rng);
    let points = jitter
        .synthesize(result, config.window_days, config.stride_days)
        .collect();

    let mut series = IndexMap::new();
    series.insert(result.identifier.clone(), points);
    let title = format!("{} Compliance Trend", result.identifier.to_uppercase());
    let spec = chart::render(&series, &title);

    let html = page::render_detail(result, &config.commit_url_base, &spec)?;
    let path = Path::new("zkvm").join(format!("{}.html", file_stem(&result.identifier)));

    Ok((path, html))
}

pub async fn write_site(site: &Site, output_dir: &Path) -> Result<usize> {
    for (relative, contents) in &site.files {
        let path = output_dir.join(relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, contents).await?;
        info!("Wrote {}", path.display());
    }

    Ok(site.files.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::StatusSource;
    use std::io::Write;

    const ALPHA_DOCUMENT: &str = r#"{"zkvms": {"alpha": {"zkvm": "alpha",
        "timestamp": "2025-03-01T12:00:00Z", "commit": "0123456789abcdef",
        "passed": 46, "failed": 1, "total": 47, "pass_rate": 97.87}},
        "last_updated": "2025-03-01T12:00:00Z"}"#;

    #[test]
    fn test_build_site_contains_all_pages() {
        let mut rng = StdRng::seed_from_u64(3);
        let site = build_site(
            &StatusSnapshot::demo(Utc::now()),
            &DashboardConfig::default(),
            Utc::now(),
            &mut rng,
        )
        .unwrap();

        let paths: Vec<_> = site.files.keys().map(|p| p.display().to_string()).collect();
        assert_eq!(
            paths,
            vec![
                "index.html",
                "chart.json",
                "zkvm/sp1.html",
                "zkvm/openvm.html",
                "zkvm/jolt.html"
            ]
        );
    }

    #[tokio::test]
    async fn test_round_trip_alpha_row() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(ALPHA_DOCUMENT.as_bytes()).unwrap();
        let loader = StatusLoader::new(StatusSource::File(file.path().to_path_buf())).unwrap();
        let snapshot = loader.load().await.unwrap();

        let mut rng = StdRng::seed_from_u64(3);
        let site = build_site(&snapshot, &DashboardConfig::default(), Utc::now(), &mut rng).unwrap();

        let index = &site.files[&PathBuf::from("index.html")];
        assert!(index.contains(r#"<span class="badge fail">46/47</span>"#));
        assert!(index.contains("ALPHA"));
        assert!(index.contains("01234567"));
        assert!(index.contains("2025-03-01"));
    }

    #[test]
    fn test_empty_snapshot_site() {
        let mut rng = StdRng::seed_from_u64(3);
        let site = build_site(
            &StatusSnapshot::empty(),
            &DashboardConfig::default(),
            Utc::now(),
            &mut rng,
        )
        .unwrap();

        assert_eq!(site.files.len(), 2);
        let chart: serde_json::Value =
            serde_json::from_str(&site.files[&PathBuf::from("chart.json")]).unwrap();
        assert_eq!(chart["data"]["datasets"].as_array().unwrap().len(), 0);
        assert!(site.files[&PathBuf::from("index.html")].contains("No results yet"));
    }

    #[test]
    fn test_trend_chart_has_thirteen_points_per_system() {
        let mut rng = StdRng::seed_from_u64(3);
        let site = build_site(
            &StatusSnapshot::demo(Utc::now()),
            &DashboardConfig::default(),
            Utc::now(),
            &mut rng,
        )
        .unwrap();

        let chart: serde_json::Value =
            serde_json::from_str(&site.files[&PathBuf::from("chart.json")]).unwrap();
        let datasets = chart["data"]["datasets"].as_array().unwrap();
        assert_eq!(datasets.len(), 3);
        assert!(datasets
            .iter()
            .all(|d| d["data"].as_array().unwrap().len() == 13));
    }

    #[test]
    fn test_colliding_detail_pages_are_skipped() {
        let snapshot = StatusSnapshot::from_json(r#"{"zkvms": {"a/b": {}, "a_b": {}}}"#).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let site = build_site(&snapshot, &DashboardConfig::default(), Utc::now(), &mut rng).unwrap();

        assert_eq!(site.files.len(), 3);
    }

    #[tokio::test]
    async fn test_refresh_writes_site_and_replaces_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let status_path = dir.path().join("status.json");
        std::fs::write(
            &status_path,
            r#"{"zkvms": {"alpha": {"passed": 46, "failed": 1, "total": 47}}}"#,
        )
        .unwrap();

        let config = DashboardConfig {
            output_dir: dir.path().join("site"),
            ..DashboardConfig::default()
        };
        let loader = StatusLoader::new(StatusSource::File(status_path.clone())).unwrap();
        let mut dashboard = Dashboard::new(loader, config);

        let report = dashboard.refresh().await.unwrap();
        assert_eq!(report.systems, 1);
        assert!(!report.fell_back);
        assert_eq!(report.files_written, 3);
        assert!(dir.path().join("site/index.html").exists());
        assert!(dir.path().join("site/zkvm/alpha.html").exists());

        std::fs::write(&status_path, "not json").unwrap();
        let report = dashboard.refresh().await.unwrap();
        assert!(report.fell_back);
        assert!(dashboard.snapshot().is_empty());
    }
}
