/*!
Faux scanner pour tester le relais sans outil réseau réel

Génère un script POSIX `sh` qui imite le contrat du scanner:
écrit éventuellement un snapshot, imprime stdout/stderr, sort avec le code choisi.
Le script est lancé via `sh <script>` : pas de bit exécutable ni d'exec direct
d'un fichier fraîchement écrit.
*/

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct ScannerStub {
    exit_code: i32,
    stdout: String,
    stderr: String,
    snapshot: Option<(PathBuf, Value)>,
    sleep_ms: u64,
}

impl ScannerStub {
    /// Scanner qui réussit (code 0)
    pub fn succeeding() -> Self {
        Self::default()
    }

    /// Scanner qui échoue avec le code donné
    pub fn failing(exit_code: i32) -> Self {
        Self { exit_code, ..Self::default() }
    }

    pub fn stdout<S: Into<String>>(mut self, text: S) -> Self {
        self.stdout = text.into();
        self
    }

    pub fn stderr<S: Into<String>>(mut self, text: S) -> Self {
        self.stderr = text.into();
        self
    }

    /// Le script écrira `doc` dans `path` avant de sortir
    pub fn writes_snapshot<P: AsRef<Path>>(mut self, path: P, doc: Value) -> Self {
        self.snapshot = Some((path.as_ref().to_path_buf(), doc));
        self
    }

    pub fn sleep_ms(mut self, ms: u64) -> Self {
        self.sleep_ms = ms;
        self
    }

    /// Contenu du script sh
    pub fn script(&self) -> String {
        let mut lines = vec!["#!/bin/sh".to_string()];
        if self.sleep_ms > 0 {
            lines.push(format!("sleep {:.3}", self.sleep_ms as f64 / 1000.0));
        }
        if let Some((path, doc)) = &self.snapshot {
            let target = path.to_string_lossy();
            lines.push(format!(
                "printf '%s' {} > {}",
                shell_words::quote(&doc.to_string()),
                shell_words::quote(&target)
            ));
        }
        if !self.stdout.is_empty() {
            lines.push(format!("printf '%s' {}", shell_words::quote(&self.stdout)));
        }
        if !self.stderr.is_empty() {
            lines.push(format!("printf '%s' {} >&2", shell_words::quote(&self.stderr)));
        }
        lines.push(format!("exit {}", self.exit_code));
        lines.join("\n") + "\n"
    }

    /// Écrit le script dans `dir` et retourne la ligne de commande à configurer
    pub fn install<P: AsRef<Path>>(&self, dir: P) -> Result<String> {
        let script_path = dir.as_ref().join("fake_scanner.sh");
        std::fs::write(&script_path, self.script())
            .with_context(|| format!("failed to write {}", script_path.display()))?;
        tracing::debug!(path = %script_path.display(), exit_code = self.exit_code, "installed scanner stub");
        let script = script_path.to_string_lossy().into_owned();
        Ok(shell_words::join(["sh", script.as_str()]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_shape() {
        let script = ScannerStub::failing(1).stderr("nmap: permission denied").script();
        assert!(script.starts_with("#!/bin/sh\n"));
        assert!(script.contains(">&2"));
        assert!(script.trim_end().ends_with("exit 1"));
    }

    #[cfg(unix)]
    #[test]
    fn test_installed_stub_runs() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("network_data.json");
        let cmd = ScannerStub::succeeding()
            .stdout("done")
            .writes_snapshot(&target, serde_json::json!({"devices": {}}))
            .install(dir.path())
            .unwrap();

        let words = shell_words::split(&cmd).unwrap();
        let out = std::process::Command::new(&words[0]).args(&words[1..]).output().unwrap();
        assert!(out.status.success());
        assert_eq!(String::from_utf8_lossy(&out.stdout), "done");
        let written: Value = serde_json::from_str(&std::fs::read_to_string(&target).unwrap()).unwrap();
        assert_eq!(written, serde_json::json!({"devices": {}}));
    }
}
