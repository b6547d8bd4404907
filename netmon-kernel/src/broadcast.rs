use crate::hub::{encode, ConnectionRegistry, Frame};
use crate::models::PushEvent;
use crate::snapshot::SnapshotStore;
use std::sync::Arc;

/// Relit le snapshot courant et le pousse aux abonnés.
/// Idempotent : toujours l'état complet, jamais un diff, donc les doublons sont sans effet.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    store: SnapshotStore,
    registry: Arc<ConnectionRegistry>,
}

impl Broadcaster {
    pub fn new(store: SnapshotStore, registry: Arc<ConnectionRegistry>) -> Self {
        Self { store, registry }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Trame `network_update` du snapshot courant, `None` si absent ou illisible.
    pub async fn current_frame(&self) -> Option<Frame> {
        match self.store.load().await {
            Ok(Some(snapshot)) => encode(&PushEvent::network_update(snapshot)),
            Ok(None) => None,
            Err(e) => {
                tracing::error!(error = %e, "error reading network data");
                None
            }
        }
    }

    pub async fn publish_current(&self) -> usize {
        match self.store.load().await {
            Ok(Some(snapshot)) => {
                let delivered = self.registry.publish(&PushEvent::network_update(snapshot));
                tracing::info!(delivered, "network data broadcast");
                delivered
            }
            Ok(None) => 0,
            Err(e) => {
                tracing::error!(error = %e, "error reading network data");
                0
            }
        }
    }
}
