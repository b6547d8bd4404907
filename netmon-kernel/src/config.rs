use serde::{Deserialize, Serialize};
use std::{path::{Path, PathBuf}, str::FromStr, time::Duration};
use tokio::fs;
use tracing::warn;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct RelayConfig {
    pub server: ServerConf,
    pub scan: ScanConf,
    pub snapshot: SnapshotConf,
    pub dashboard: DashboardConf,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConf {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ScanConf {
    pub command: String, // ex: "python3 network_scanner.py"
    pub working_dir: Option<PathBuf>,
    pub interval_ms: u64,
    pub auto_scan: bool,
    /// Délai entre la fin d'un scan manuel et le push (laisse l'écriture du fichier aboutir)
    pub push_delay_ms: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct SnapshotConf {
    pub path: PathBuf,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DashboardConf {
    pub static_dir: PathBuf,
}

impl Default for ServerConf {
    fn default() -> Self {
        Self { bind: "0.0.0.0".into(), port: 3000 }
    }
}

impl Default for ScanConf {
    fn default() -> Self {
        Self {
            command: "python3 network_scanner.py".into(),
            working_dir: None,
            interval_ms: 30_000,
            auto_scan: true,
            push_delay_ms: 500,
        }
    }
}

impl Default for SnapshotConf {
    fn default() -> Self {
        Self { path: PathBuf::from("network_data.json") }
    }
}

impl Default for DashboardConf {
    fn default() -> Self {
        Self { static_dir: PathBuf::from("public") }
    }
}

impl ScanConf {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }

    pub fn push_delay(&self) -> Duration {
        Duration::from_millis(self.push_delay_ms)
    }
}

impl RelayConfig {
    /// Applique les surcharges d'environnement (PORT, SCAN_INTERVAL, AUTO_SCAN, NETMON_*).
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("NETMON_BIND") { self.server.bind = v; }
        if let Some(port) = parse_var(&lookup, "PORT") { self.server.port = port; }
        if let Some(v) = lookup("NETMON_SCANNER_CMD") { self.scan.command = v; }
        if let Some(v) = lookup("NETMON_SCANNER_DIR") { self.scan.working_dir = Some(PathBuf::from(v)); }
        if let Some(ms) = parse_var(&lookup, "SCAN_INTERVAL") { self.scan.interval_ms = ms; }
        if let Some(ms) = parse_var(&lookup, "NETMON_PUSH_DELAY_MS") { self.scan.push_delay_ms = ms; }
        // seul "false" désactive, comme le relais historique
        if let Some(v) = lookup("AUTO_SCAN") { self.scan.auto_scan = v.trim() != "false"; }
        if let Some(v) = lookup("NETMON_SNAPSHOT_PATH") { self.snapshot.path = PathBuf::from(v); }
        if let Some(v) = lookup("NETMON_STATIC_DIR") { self.dashboard.static_dir = PathBuf::from(v); }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.bind, self.server.port)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparseable environment value");
            None
        }
    }
}

/// Charge netmon.yaml (ou $NETMON_CONFIG) puis les surcharges d'environnement.
pub async fn load_config() -> RelayConfig {
    let path = std::env::var("NETMON_CONFIG").unwrap_or_else(|_| "netmon.yaml".into());
    let mut cfg = read_config_file(Path::new(&path)).await;
    cfg.apply_env(|key| std::env::var(key).ok());
    cfg
}

async fn read_config_file(path: &Path) -> RelayConfig {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return RelayConfig::default();
    }
    let txt = fs::read_to_string(path).await.unwrap_or_default();
    if txt.trim().is_empty() {
        return RelayConfig::default();
    }
    serde_yaml::from_str(&txt).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "invalid config file, using defaults");
        RelayConfig::default()
    })
}
