use crate::scanner::{ScanMode, ScanRunner};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Scan immédiat au démarrage puis toutes les `every`, jusqu'à annulation.
/// Chaque scan part dans sa propre tâche : pas de saut ni de rattrapage,
/// un scan lent peut chevaucher le suivant.
pub fn spawn_auto_scan(runner: Arc<ScanRunner>, every: Duration, token: CancellationToken) -> JoinHandle<()> {
    info!(interval_secs = every.as_secs_f64(), "auto-scan enabled");
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = interval.tick() => {
                    let runner = runner.clone();
                    tokio::spawn(async move {
                        match runner.run(ScanMode::Scheduled).await {
                            Ok(_) => info!("auto-scan completed"),
                            Err(e) => error!(error = %e, "auto-scan failed"),
                        }
                    });
                }
            }
        }
        info!("auto-scan stopped");
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_scan_is_immediate_and_repeats() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("runs.log");
        let cmd = format!("sh -c 'echo run >> {}'", marker.display());
        let runner = Arc::new(ScanRunner::from_command_line(&cmd, None).unwrap());
        let token = CancellationToken::new();

        let handle = spawn_auto_scan(runner, Duration::from_millis(150), token.clone());
        tokio::time::sleep(Duration::from_millis(500)).await;
        token.cancel();
        handle.await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        let runs = std::fs::read_to_string(&marker).unwrap_or_default().lines().count();
        assert!(runs >= 2, "expected repeated scans, got {runs}");
    }

    #[tokio::test]
    async fn test_cancelled_scheduler_stops_ticking() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("runs.log");
        let cmd = format!("sh -c 'echo run >> {}'", marker.display());
        let runner = Arc::new(ScanRunner::from_command_line(&cmd, None).unwrap());
        let token = CancellationToken::new();
        token.cancel();

        spawn_auto_scan(runner, Duration::from_millis(10), token).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!marker.exists());
    }
}
