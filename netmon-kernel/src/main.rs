/**
 * NETMON KERNEL - Point d'entrée du relais
 *
 * RÔLE : Orchestration de tous les modules : config, snapshot, scanner, watcher,
 * planificateur, HTTP. Bootstrap complet avec logging et arrêt propre.
 *
 * ARCHITECTURE : scanner externe → network_data.json → watcher → push WebSocket,
 * et lecture REST directe du fichier.
 */

use anyhow::{Context, Result};
use netmon_kernel::config::{load_config, RelayConfig};
use netmon_kernel::scanner::ScanRunner;
use netmon_kernel::snapshot::SnapshotStore;
use netmon_kernel::state::AppState;
use netmon_kernel::{http, scheduler, watcher};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Charger les variables d'environnement depuis .env (si présent)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("netmon_kernel=info,tower_http=info")),
        )
        .init();

    let cfg = load_config().await;

    let scanner = ScanRunner::from_command_line(&cfg.scan.command, cfg.scan.working_dir.clone())
        .context("invalid scanner command")?;
    let store = SnapshotStore::new(&cfg.snapshot.path);
    let app_state = AppState::new(store, scanner, cfg.scan.push_delay());
    let lifecycle = app_state.lifecycle.clone();

    // watcher du snapshot : en cas d'échec le relais sert quand même le REST
    if let Err(e) = watcher::spawn_snapshot_watcher(
        app_state.store.path(),
        app_state.broadcaster.clone(),
        lifecycle.token(),
    ) {
        error!(error = %e, "snapshot watcher disabled");
    }

    let app = http::build_router(app_state.clone(), &cfg.dashboard.static_dir);

    let addr = cfg.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    print_banner(&cfg);

    if cfg.scan.auto_scan {
        scheduler::spawn_auto_scan(app_state.scanner.clone(), cfg.scan.interval(), lifecycle.token());
    } else {
        info!("auto-scan disabled, use POST /api/scan to scan manually");
    }

    let registry = app_state.registry.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("shutting down gracefully...");
            lifecycle.shutdown(&registry);
        })
        .await
        .context("server error")?;

    info!("server closed");
    Ok(())
}

fn print_banner(cfg: &RelayConfig) {
    let port = cfg.server.port;
    info!("gaming day network monitor started");
    info!("dashboard:  http://localhost:{port}");
    info!("websocket:  ws://localhost:{port}");
    info!("api:        http://localhost:{port}/api/");
    info!("  GET  /api/network     - all network data");
    info!("  GET  /api/device/:ip  - one device");
    info!("  GET  /api/stats       - summary statistics");
    info!("  POST /api/scan        - trigger manual scan");
    info!("  GET  /api/health      - relay health");
    info!(
        snapshot = %cfg.snapshot.path.display(),
        scanner = %cfg.scan.command,
        static_dir = %cfg.dashboard.static_dir.display(),
        "relay configuration"
    );
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
