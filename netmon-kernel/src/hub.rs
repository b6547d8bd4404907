//! Registre des connexions push
//!
//! Chaque abonné possède une petite file sortante bornée. `publish` sérialise
//! une fois et fait un `try_send` vers chaque file :
//! - file pleine : l'abonné rate cet événement, il reste inscrit
//! - file fermée : la connexion est morte, elle est retirée du registre
//!
//! Pas de retry, pas de rejeu.

use crate::models::PushEvent;
use axum::extract::ws::Utf8Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

/// Trames en attente par connexion avant de commencer à en perdre.
pub const OUTBOUND_CAPACITY: usize = 8;

pub type Frame = Utf8Bytes;

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<Uuid, mpsc::Sender<Frame>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inscrit un abonné. `initial` est placé en tête de sa file avant toute diffusion.
    pub fn register(&self, initial: Option<Frame>) -> (Uuid, mpsc::Receiver<Frame>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(OUTBOUND_CAPACITY);
        if let Some(frame) = initial {
            // file neuve et vide : ne peut pas échouer
            let _ = tx.try_send(frame);
        }
        self.connections.lock().insert(id, tx);
        tracing::info!(connection_id = %id, "client connected");
        (id, rx)
    }

    pub fn unregister(&self, id: &Uuid) {
        if self.connections.lock().remove(id).is_some() {
            tracing::info!(connection_id = %id, "client disconnected");
        }
    }

    pub fn len(&self) -> usize {
        self.connections.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Diffuse à tous les abonnés, retourne le nombre de trames effectivement mises en file.
    pub fn publish(&self, event: &PushEvent) -> usize {
        let Some(frame) = encode(event) else { return 0 };
        let mut delivered = 0;
        self.connections.lock().retain(|id, tx| match tx.try_send(frame.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                tracing::debug!(connection_id = %id, "outbound queue full, event skipped");
                true
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(connection_id = %id, "connection closed, pruned");
                false
            }
        });
        delivered
    }

    /// Ferme toutes les connexions (arrêt du processus).
    pub fn close_all(&self) {
        let drained: Vec<Uuid> = self.connections.lock().drain().map(|(id, _)| id).collect();
        if !drained.is_empty() {
            tracing::info!(count = drained.len(), "closed push connections");
        }
    }
}

pub fn encode(event: &PushEvent) -> Option<Frame> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Frame::from(json)),
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize push event");
            None
        }
    }
}
