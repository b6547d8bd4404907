/**
 * FILE WATCHER - Surveillance de network_data.json
 *
 * RÔLE : Déclenche un push du snapshot complet à chaque écriture du fichier.
 *
 * FONCTIONNEMENT :
 * - notify surveille le dossier parent (non récursif) : le fichier peut ne pas exister au démarrage
 * - Seuls Create / Modify (données ou renommage) sur le nom du snapshot comptent
 * - Pas d'événement pour l'état initial, pas de debounce : les doublons sont tolérés
 *   puisque le push relit et renvoie toujours l'état complet
 */

use crate::broadcast::Broadcaster;
use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("snapshot path has no file name: {0}")]
    InvalidPath(String),
    #[error("failed to watch {path}: {source}")]
    Notify {
        path: String,
        #[source]
        source: notify::Error,
    },
}

/// Démarre le watcher ; la tâche s'arrête (et libère le watcher) quand `token` est annulé.
pub fn spawn_snapshot_watcher(
    snapshot_path: &Path,
    broadcaster: Broadcaster,
    token: CancellationToken,
) -> Result<JoinHandle<()>, WatchError> {
    let file_name = snapshot_path
        .file_name()
        .map(|n| n.to_os_string())
        .ok_or_else(|| WatchError::InvalidPath(snapshot_path.display().to_string()))?;
    let dir = watch_dir(snapshot_path);

    let (change_tx, mut change_rx) = mpsc::unbounded_channel::<()>();
    let target = file_name.clone();
    let mut watcher = RecommendedWatcher::new(
        move |res: Result<Event, notify::Error>| match res {
            Ok(event) => {
                if is_snapshot_change(&event, &target) {
                    debug!(kind = ?event.kind, "snapshot file event");
                    let _ = change_tx.send(());
                }
            }
            Err(e) => error!("watch error: {:?}", e),
        },
        Config::default(),
    )
    .map_err(|source| WatchError::Notify { path: dir.display().to_string(), source })?;

    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .map_err(|source| WatchError::Notify { path: dir.display().to_string(), source })?;
    info!(path = %dir.join(&file_name).display(), "watching snapshot file");

    Ok(tokio::spawn(async move {
        // le watcher vit tant que la tâche vit
        let _watcher = watcher;
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                change = change_rx.recv() => {
                    if change.is_none() { break; }
                    info!("network data updated, broadcasting to clients");
                    broadcaster.publish_current().await;
                }
            }
        }
        info!("snapshot watcher stopped");
    }))
}

fn watch_dir(snapshot_path: &Path) -> PathBuf {
    match snapshot_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn is_snapshot_change(event: &Event, file_name: &OsString) -> bool {
    let relevant = match event.kind {
        EventKind::Create(_) => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        _ => false,
    };
    relevant && event.paths.iter().any(|p| p.file_name() == Some(file_name.as_os_str()))
}
