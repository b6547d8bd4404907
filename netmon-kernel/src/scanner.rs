/**
 * SCAN RUNNER - Exécution du scanner réseau externe
 *
 * RÔLE : Lance le scanner en sous-processus, capture stdout/stderr, attend la fin.
 * Le scanner écrit lui-même le snapshot ; ici on ne juge que le code de sortie.
 *
 * FONCTIONNEMENT :
 * - Ligne de commande découpée une fois (shell-words), jamais d'argument dérivé d'une requête
 * - Un processus par déclenchement, manuel et planifié peuvent se chevaucher
 * - Aucun retry, aucune annulation : un scan lancé va jusqu'au bout
 */

use serde::Serialize;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::process::Command;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    Manual,
    Scheduled,
}

impl ScanMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanMode::Manual => "manual",
            ScanMode::Scheduled => "scheduled",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("scanner command is empty")]
    EmptyCommand,
    #[error("invalid scanner command: {0}")]
    InvalidCommand(String),
    #[error("failed to start scanner `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{detail}")]
    Failed { detail: String, exit_code: Option<i32> },
}

impl ScanError {
    /// Texte renvoyé au client dans `error`.
    pub fn detail(&self) -> String {
        match self {
            ScanError::Failed { detail, .. } => detail.clone(),
            other => other.to_string(),
        }
    }
}

/// Résultat d'un scan terminé avec le code 0.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub mode: ScanMode,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub execution_time_ms: u64,
}

#[derive(Debug)]
pub struct ScanRunner {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    in_flight: Arc<AtomicUsize>,
}

struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

impl ScanRunner {
    pub fn from_command_line(command: &str, working_dir: Option<PathBuf>) -> Result<Self, ScanError> {
        let mut words = shell_words::split(command)
            .map_err(|e| ScanError::InvalidCommand(e.to_string()))?
            .into_iter();
        let program = words.next().ok_or(ScanError::EmptyCommand)?;
        Ok(Self {
            program,
            args: words.collect(),
            working_dir,
            in_flight: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    pub async fn run(&self, mode: ScanMode) -> Result<ScanReport, ScanError> {
        let start_time = Instant::now();
        info!(mode = mode.as_str(), program = %self.program, "running scan");

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        self.in_flight.fetch_add(1, Ordering::Relaxed);
        let _guard = InFlightGuard(self.in_flight.clone());

        let output = cmd.output().await.map_err(|source| {
            error!(mode = mode.as_str(), error = %source, "scanner could not be started");
            ScanError::Spawn { program: self.program.clone(), source }
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let execution_time_ms = start_time.elapsed().as_millis() as u64;

        if output.status.success() {
            info!(mode = mode.as_str(), execution_time_ms, "scan completed");
            debug!(mode = mode.as_str(), stdout = %stdout, "scanner output");
            Ok(ScanReport {
                mode,
                stdout,
                stderr,
                exit_code: output.status.code(),
                execution_time_ms,
            })
        } else {
            let detail = if stderr.trim().is_empty() { "Scan failed".to_string() } else { stderr };
            error!(mode = mode.as_str(), status = %output.status, detail = %detail, "scan failed");
            Err(ScanError::Failed { detail, exit_code: output.status.code() })
        }
    }
}
