/**
 * SNAPSHOT STORE - Lecture du fichier JSON produit par le scanner
 *
 * RÔLE : Relit network_data.json à chaque accès, aucun cache mémoire.
 * Fichier absent = état normal avant le premier scan (Ok(None), pas une erreur).
 * Contenu gardé tel quel, seul un objet JSON au premier niveau est exigé.
 */

use crate::models::Snapshot;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid snapshot JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: Arc<PathBuf>,
}

impl SnapshotStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: Arc::new(path.as_ref().to_path_buf()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Un fichier en cours de réécriture peut donner une erreur Parse transitoire.
    pub async fn load(&self) -> Result<Option<Snapshot>, SnapshotError> {
        let bytes = match fs::read(self.path.as_path()).await {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no snapshot yet");
                return Ok(None);
            }
            Err(source) => {
                return Err(SnapshotError::Io { path: self.path.display().to_string(), source });
            }
        };
        let snapshot = serde_json::from_slice::<Snapshot>(&bytes)?;
        Ok(Some(snapshot))
    }
}
