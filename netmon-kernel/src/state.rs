use crate::broadcast::Broadcaster;
use crate::health::HealthTracker;
use crate::hub::ConnectionRegistry;
use crate::scanner::ScanRunner;
use crate::snapshot::SnapshotStore;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Cycle de vie du processus : possède les tâches de fond (planificateur,
/// watcher, pushs différés) et les arrête toutes à l'extinction.
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    token: CancellationToken,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Push différé après un scan manuel, abandonné si l'extinction arrive avant.
    pub fn schedule_push(&self, broadcaster: Broadcaster, delay: Duration) {
        let token = self.token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    broadcaster.publish_current().await;
                }
            }
        });
    }

    pub fn shutdown(&self, registry: &ConnectionRegistry) {
        self.token.cancel();
        registry.close_all();
    }
}

// fabrique l'état unique pour Axum
#[derive(Clone)]
pub struct AppState {
    pub store: SnapshotStore,
    pub registry: Arc<ConnectionRegistry>,
    pub broadcaster: Broadcaster,
    pub scanner: Arc<ScanRunner>,
    pub health: HealthTracker,
    pub lifecycle: Lifecycle,
    pub push_delay: Duration,
}

impl AppState {
    pub fn new(store: SnapshotStore, scanner: ScanRunner, push_delay: Duration) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let broadcaster = Broadcaster::new(store.clone(), registry.clone());
        Self {
            store,
            registry,
            broadcaster,
            scanner: Arc::new(scanner),
            health: HealthTracker::new(),
            lifecycle: Lifecycle::new(),
            push_delay,
        }
    }
}
