use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Debug, Serialize, Deserialize)]
pub struct RelayHealth {
    pub status: String,
    pub uptime: f64,
    pub connected_clients: usize,
    pub scans_in_flight: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_usage_mb: Option<f32>,
    pub timestamp: String,
}

#[derive(Debug, Clone)]
pub struct HealthTracker {
    start_time: Instant,
}

impl Default for HealthTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthTracker {
    pub fn new() -> Self {
        Self { start_time: Instant::now() }
    }

    pub fn uptime_seconds(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }

    /// Ne peut pas échouer : la route health répond toujours 200.
    pub fn report(&self, connected_clients: usize, scans_in_flight: usize) -> RelayHealth {
        RelayHealth {
            status: "ok".to_string(),
            uptime: self.uptime_seconds(),
            connected_clients,
            scans_in_flight,
            memory_usage_mb: get_memory_usage_mb(),
            timestamp: crate::models::now_rfc3339(),
        }
    }
}

#[cfg(target_os = "linux")]
fn get_memory_usage_mb() -> Option<f32> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    let line = status.lines().find(|l| l.starts_with("VmRSS:"))?;
    let kb = line.split_whitespace().nth(1)?.parse::<u64>().ok()?;
    Some(kb as f32 / 1024.0) // KB -> MB
}

#[cfg(not(target_os = "linux"))]
fn get_memory_usage_mb() -> Option<f32> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_fields() {
        let tracker = HealthTracker::new();
        let report = tracker.report(3, 1);
        assert_eq!(report.status, "ok");
        assert_eq!(report.connected_clients, 3);
        assert_eq!(report.scans_in_flight, 1);
        assert!(report.uptime >= 0.0);
        assert!(!report.timestamp.is_empty());
    }
}
