use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use reqwest::Client;
use url::Url;

use super::StatusSnapshot;
use crate::error::{DashError, Result};

/// Location of the current status document relative to the site root.
pub const STATUS_PATH: &str = "data/current/status.json";

/// Upper bound on one fetch, connect through body.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusSource {
    Http(Url),
    File(PathBuf),
}

impl StatusSource {
    /// Resolves the status document against a site root URL.
    pub fn from_base_url(base_url: &str) -> Result<Self> {
        let mut base = Url::parse(base_url)
            .map_err(|e| DashError::Config(format!("Invalid base URL: {e}")))?;

        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let url = base
            .join(STATUS_PATH)
            .map_err(|e| DashError::Config(format!("Invalid status URL: {e}")))?;

        Ok(Self::Http(url))
    }

    pub fn default_file() -> Self {
        Self::File(PathBuf::from(STATUS_PATH))
    }
}

impl std::fmt::Display for StatusSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http(url) => write!(f, "{url}"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// What a failed load is replaced with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FallbackPolicy {
    #[default]
    Empty,
    Demo,
}

impl FallbackPolicy {
    pub fn snapshot(self, now: DateTime<Utc>) -> StatusSnapshot {
        match self {
            Self::Empty => StatusSnapshot::empty(),
            Self::Demo => StatusSnapshot::demo(now),
        }
    }
}

pub struct StatusLoader {
    client: Client,
    source: StatusSource,
}

impl StatusLoader {
    pub fn new(source: StatusSource) -> Result<Self> {
        Self::with_timeout(source, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(source: StatusSource, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("zkdash/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| DashError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, source })
    }

    /// Single attempt, no caching and no retry.
    pub async fn load(&self) -> Result<StatusSnapshot> {
        info!("Loading status from {}", self.source);

        let body = match &self.source {
            StatusSource::Http(url) => self.fetch(url).await?,
            StatusSource::File(path) => tokio::fs::read_to_string(path).await?,
        };

        let snapshot = StatusSnapshot::from_json(&body)?;
        info!("Loaded status for {} systems", snapshot.systems.len());

        Ok(snapshot)
    }

    /// Loads the snapshot, substituting the policy's fallback on any failure.
    pub async fn load_or_fallback(
        &self,
        policy: FallbackPolicy,
        now: DateTime<Utc>,
    ) -> (StatusSnapshot, Option<DashError>) {
        match self.load().await {
            Ok(snapshot) => (snapshot, None),
            Err(e) => {
                error!("Failed to load status from {}: {e}", self.source);
                if policy == FallbackPolicy::Demo {
                    warn!("Substituting demonstration data");
                }
                (policy.snapshot(now), Some(e))
            }
        }
    }

    async fn fetch(&self, url: &Url) -> Result<String> {
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DashError::Fetch {
                url: url.to_string(),
                status,
            });
        }

        Ok(response.text().await?)
    }
}
