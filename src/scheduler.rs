use std::future::Future;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5 * 60);

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// How long `stop` waits for an in-flight cycle before abandoning it.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Handle to a running refresh loop.
///
/// Dropping the handle aborts the loop; `stop` gives the in-flight cycle
/// [`SHUTDOWN_GRACE`] to finish.
pub struct RefreshHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<u64>,
}

impl RefreshHandle {
    /// Stops the loop and returns the number of completed cycles.
    pub async fn stop(mut self) -> u64 {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }

        match (&mut self.task).await {
            Ok(cycles) => {
                info!("Refresh loop stopped after {cycles} cycles");
                cycles
            }
            Err(e) => {
                warn!("Refresh loop ended abnormally: {e}");
                0
            }
        }
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Runs `cycle` immediately and then once per `interval`.
///
/// Cycles run one at a time; ticks missed while a cycle is still running
/// are skipped rather than queued.
pub fn start<F, Fut>(cycle: F, interval: Duration) -> RefreshHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let interval = interval.max(MIN_INTERVAL);

    info!("Refreshing every {}s", interval.as_secs_f64());
    let task = tokio::spawn(run_refresh_loop(cycle, interval, SHUTDOWN_GRACE, shutdown_rx));

    RefreshHandle {
        shutdown: Some(shutdown_tx),
        task,
    }
}

async fn run_refresh_loop<F, Fut>(
    mut cycle: F,
    interval: Duration,
    grace: Duration,
    mut shutdown_rx: oneshot::Receiver<()>,
) -> u64
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut ticks = tokio::time::interval(interval);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut completed = 0_u64;

    loop {
        tokio::select! {
            _ = ticks.tick() => {
                debug!("Refresh tick {}", completed + 1);
                let run = cycle();
                tokio::pin!(run);

                tokio::select! {
                    () = &mut run => {}
                    _ = &mut shutdown_rx => {
                        return match tokio::time::timeout(grace, run).await {
                            Ok(()) => completed.saturating_add(1),
                            Err(_) => {
                                warn!(
                                    "Refresh cycle still running after {}s, abandoning it",
                                    grace.as_secs_f64()
                                );
                                completed
                            }
                        };
                    }
                }
                completed = completed.saturating_add(1);
            }
            _ = &mut shutdown_rx => break,
        }
    }

    completed
}
