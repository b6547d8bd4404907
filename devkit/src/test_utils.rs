/*!
Test Harness pour le relais NetMon

Facilite l'écriture de tests avec:
- Dossier temporaire isolé contenant le snapshot et le faux scanner
- Écriture / suppression / corruption du snapshot
- Attente bornée d'une trame push
*/

use crate::scanner_stub::ScannerStub;
use anyhow::Result;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;

pub const SNAPSHOT_FILE: &str = "network_data.json";

/// Harness de test : un dossier temporaire par test
pub struct TestHarness {
    dir: TempDir,
}

impl TestHarness {
    pub fn new() -> Result<Self> {
        // Init logging pour tests (RUST_LOG), déjà initialisé = ok
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init()
            .ok();

        Ok(Self { dir: tempfile::tempdir()? })
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.dir.path().join(SNAPSHOT_FILE)
    }

    pub fn write_snapshot(&self, doc: &Value) -> Result<()> {
        std::fs::write(self.snapshot_path(), serde_json::to_vec_pretty(doc)?)?;
        Ok(())
    }

    /// Écrit un contenu brut (ex: JSON tronqué pour simuler une écriture en cours)
    pub fn write_raw_snapshot(&self, content: &str) -> Result<()> {
        std::fs::write(self.snapshot_path(), content)?;
        Ok(())
    }

    pub fn remove_snapshot(&self) -> Result<()> {
        if self.snapshot_path().exists() {
            std::fs::remove_file(self.snapshot_path())?;
        }
        Ok(())
    }

    /// Installe un faux scanner dans le dossier, retourne sa ligne de commande
    pub fn install_scanner(&self, stub: &ScannerStub) -> Result<String> {
        stub.install(self.dir.path())
    }
}

/// Attend la prochaine trame d'un abonné et la décode en JSON
/// (`as_text` : ex. `Utf8Bytes::as_str` ou `String::as_str`)
pub async fn next_json_frame<T, F>(rx: &mut mpsc::Receiver<T>, timeout_ms: u64, as_text: F) -> Result<Value>
where
    F: Fn(&T) -> &str,
{
    match tokio::time::timeout(Duration::from_millis(timeout_ms), rx.recv()).await {
        Ok(Some(frame)) => Ok(serde_json::from_str(as_text(&frame))?),
        Ok(None) => anyhow::bail!("push channel closed"),
        Err(_) => anyhow::bail!("no push frame within {timeout_ms}ms"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SnapshotBuilder;

    #[test]
    fn test_snapshot_lifecycle() {
        let harness = TestHarness::new().unwrap();
        assert!(!harness.snapshot_path().exists());

        harness.write_snapshot(&SnapshotBuilder::new().host("10.0.0.5", "tv1").build()).unwrap();
        let back: Value = serde_json::from_str(&std::fs::read_to_string(harness.snapshot_path()).unwrap()).unwrap();
        assert_eq!(back["devices"]["10.0.0.5"]["hostname"], "tv1");

        harness.remove_snapshot().unwrap();
        assert!(!harness.snapshot_path().exists());
    }

    #[tokio::test]
    async fn test_next_json_frame_timeout() {
        let (_tx, mut rx) = mpsc::channel::<String>(1);
        assert!(next_json_frame(&mut rx, 20, String::as_str).await.is_err());
    }

    #[tokio::test]
    async fn test_next_json_frame_decodes() {
        let (tx, mut rx) = mpsc::channel::<String>(1);
        tx.send(r#"{"type":"network_update"}"#.to_string()).await.unwrap();
        let frame = next_json_frame(&mut rx, 200, String::as_str).await.unwrap();
        assert_eq!(frame["type"], "network_update");
    }
}
