use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use log::{error, info};
use tokio::sync::Mutex;

use crate::dashboard::{build_detail, Dashboard, DashboardConfig};
use crate::history::{DEFAULT_STRIDE_DAYS, DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS};
use crate::render::page::last_updated_text;
use crate::render::table::DEFAULT_COMMIT_URL_BASE;
use crate::scheduler;
use crate::status::{FallbackPolicy, StatusLoader, StatusSource, SystemResult};

#[derive(Parser)]
#[command(name = "zkdash")]
#[command(author, version, about = "zkVM compliance dashboard renderer", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output directory for the rendered site
    #[arg(short, long, global = true, default_value = "site")]
    output: PathBuf,

    /// Pretty print the chart JSON
    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,
}

#[derive(Args)]
struct RenderArgs {
    /// Site root serving data/current/status.json
    #[arg(short, long, env = "ZKDASH_BASE_URL", conflicts_with = "status_file")]
    base_url: Option<String>,

    /// Local status document (defaults to data/current/status.json)
    #[arg(short, long, env = "ZKDASH_STATUS_FILE")]
    status_file: Option<PathBuf>,

    /// Render demonstration data instead of an empty table when loading fails
    #[arg(long, default_value_t = false)]
    demo_fallback: bool,

    /// Days of placeholder history shown in charts
    #[arg(long, default_value_t = DEFAULT_WINDOW_DAYS, value_parser = clap::value_parser!(u32).range(..=i64::from(MAX_WINDOW_DAYS)))]
    window_days: u32,

    /// Days between placeholder history points
    #[arg(long, default_value_t = DEFAULT_STRIDE_DAYS, value_parser = clap::value_parser!(u32).range(1..))]
    stride_days: u32,

    /// Base URL for commit links, followed by /<zkvm>/commit/<hash>
    #[arg(long, default_value = DEFAULT_COMMIT_URL_BASE)]
    commit_url_base: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the status document once and render the dashboard
    Render {
        #[command(flatten)]
        args: RenderArgs,
    },
    /// Re-render the dashboard on a fixed interval until interrupted
    Watch {
        #[command(flatten)]
        args: RenderArgs,

        /// Seconds between refresh cycles
        #[arg(short, long, env = "ZKDASH_INTERVAL_SECS", default_value_t = scheduler::DEFAULT_INTERVAL.as_secs(), value_parser = clap::value_parser!(u64).range(1..))]
        interval_secs: u64,
    },
    /// Render the detail page of a single zkVM from an injected record
    Detail {
        /// zkVM identifier
        #[arg(short, long)]
        name: String,

        /// JSON file holding the zkVM's status record
        #[arg(short, long)]
        record: PathBuf,

        /// Base URL for commit links
        #[arg(long, default_value = DEFAULT_COMMIT_URL_BASE)]
        commit_url_base: String,
    },
}

impl RenderArgs {
    fn source(&self) -> Result<StatusSource> {
        match (&self.base_url, &self.status_file) {
            (Some(base_url), _) => Ok(StatusSource::from_base_url(base_url)?),
            (None, Some(path)) => Ok(StatusSource::File(path.clone())),
            (None, None) => Ok(StatusSource::default_file()),
        }
    }

    fn config(&self, cli: &Cli) -> DashboardConfig {
        DashboardConfig {
            output_dir: cli.output.clone(),
            fallback: if self.demo_fallback {
                FallbackPolicy::Demo
            } else {
                FallbackPolicy::Empty
            },
            window_days: self.window_days,
            stride_days: self.stride_days,
            commit_url_base: self.commit_url_base.clone(),
            pretty: cli.pretty,
        }
    }

    fn dashboard(&self, cli: &Cli) -> Result<Dashboard> {
        let loader = StatusLoader::new(self.source()?)?;
        Ok(Dashboard::new(loader, self.config(cli)))
    }
}

impl Cli {
    pub async fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Render { args } => {
                let mut dashboard = args.dashboard(self)?;
                let report = dashboard.refresh().await?;
                info!("{}", last_updated_text(dashboard.snapshot().last_updated));
                info!(
                    "Rendered {} systems ({} files){}",
                    report.systems,
                    report.files_written,
                    if report.fell_back { " from fallback data" } else { "" }
                );
                Ok(())
            }
            Commands::Watch {
                args,
                interval_secs,
            } => {
                let dashboard = Arc::new(Mutex::new(args.dashboard(self)?));

                let handle = scheduler::start(
                    move || {
                        let dashboard = Arc::clone(&dashboard);
                        async move {
                            if let Err(e) = dashboard.lock().await.refresh().await {
                                error!("Refresh cycle failed: {e}");
                            }
                        }
                    },
                    Duration::from_secs(*interval_secs),
                );

                tokio::signal::ctrl_c()
                    .await
                    .context("Failed to listen for shutdown signal")?;
                info!("Shutting down");
                handle.stop().await;
                Ok(())
            }
            Commands::Detail {
                name,
                record,
                commit_url_base,
            } => {
                let body = tokio::fs::read_to_string(record)
                    .await
                    .with_context(|| format!("Failed to read {}", record.display()))?;
                let result = SystemResult::from_json(name, &body)?;

                let config = DashboardConfig {
                    output_dir: self.output.clone(),
                    commit_url_base: commit_url_base.clone(),
                    pretty: self.pretty,
                    ..DashboardConfig::default()
                };
                let (path, html) =
                    build_detail(&result, &config, Utc::now(), &mut rand::thread_rng())?;

                let path = self.output.join(path);
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(&path, html).await?;
                info!("Detail page written to: {}", path.display());

                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_render_defaults() {
        let cli = Cli::try_parse_from(["zkdash", "render"]).unwrap();
        let Commands::Render { args } = &cli.command else {
            panic!("expected render");
        };

        let config = args.config(&cli);
        assert_eq!(config.output_dir, PathBuf::from("site"));
        assert_eq!(config.fallback, FallbackPolicy::Empty);
        assert_eq!(config.window_days, 90);
        assert_eq!(config.stride_days, 7);
        assert_eq!(config.commit_url_base, "https://github.com/codygunton");
    }

    #[test]
    fn test_watch_flags() {
        let cli = Cli::try_parse_from([
            "zkdash",
            "watch",
            "--interval-secs",
            "60",
            "--demo-fallback",
            "--status-file",
            "status.json",
            "--output",
            "public",
        ])
        .unwrap();
        let Commands::Watch {
            args,
            interval_secs,
        } = &cli.command
        else {
            panic!("expected watch");
        };

        assert_eq!(*interval_secs, 60);
        assert_eq!(args.config(&cli).fallback, FallbackPolicy::Demo);
        assert_eq!(args.config(&cli).output_dir, PathBuf::from("public"));
        assert_eq!(
            args.source().unwrap(),
            StatusSource::File(PathBuf::from("status.json"))
        );
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert!(Cli::try_parse_from(["zkdash", "watch", "--interval-secs", "0"]).is_err());
    }

    #[test]
    fn test_window_days_is_bounded() {
        assert!(Cli::try_parse_from(["zkdash", "render", "--window-days", "4000000000"]).is_err());
        assert!(Cli::try_parse_from(["zkdash", "render", "--window-days", "3651"]).is_err());

        let cli = Cli::try_parse_from(["zkdash", "render", "--window-days", "3650"]).unwrap();
        let Commands::Render { args } = &cli.command else {
            panic!("expected render");
        };
        assert_eq!(args.window_days, 3650);
    }

    #[test]
    fn test_base_url_and_status_file_conflict() {
        let parsed = Cli::try_parse_from([
            "zkdash",
            "render",
            "--base-url",
            "https://example.com",
            "--status-file",
            "s.json",
        ]);
        assert!(parsed.is_err());
    }

    #[tokio::test]
    async fn test_detail_command_writes_page() {
        let dir = tempfile::tempdir().unwrap();
        let record = dir.path().join("sp1.json");
        std::fs::write(
            &record,
            r#"{"zkvm": "sp1", "commit": "fc98075a99", "passed": 47, "failed": 0, "total": 47, "pass_rate": 100.0}"#,
        )
        .unwrap();
        let output = dir.path().join("out");

        let args: Vec<OsString> = vec![
            "zkdash".into(),
            "detail".into(),
            "--name".into(),
            "sp1".into(),
            "--record".into(),
            record.clone().into_os_string(),
            "--output".into(),
            output.clone().into_os_string(),
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        cli.execute().await.unwrap();

        let html = std::fs::read_to_string(output.join("zkvm/sp1.html")).unwrap();
        assert!(html.contains("badge pass"));
        assert!(html.contains("47/47"));
    }
}
