use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/// Document produit par le scanner externe (network_data.json).
/// Gardé tel quel : seul un objet JSON au premier niveau est exigé.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(transparent)]
pub struct Snapshot(Map<String, Value>);

impl Snapshot {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Fiche d'un appareil ; une fiche `null` compte comme absente.
    pub fn device(&self, address: &str) -> Option<&Value> {
        self.get("devices")?
            .as_object()?
            .get(address)
            .filter(|record| !record.is_null())
    }

    pub fn stats(&self) -> StatsView {
        StatsView {
            total_devices: self.get("total_devices").cloned(),
            summary: self.get("summary").cloned(),
            last_scan: self.get("timestamp").cloned(),
        }
    }
}

// GET /api/stats : clé absente du snapshot = clé omise
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StatsView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_devices: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_scan: Option<Value>,
}

/// Trame poussée aux abonnés WebSocket.
#[derive(Debug, Serialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushEvent {
    NetworkUpdate { data: Snapshot, timestamp: String },
}

impl PushEvent {
    pub fn network_update(data: Snapshot) -> Self {
        PushEvent::NetworkUpdate { data, timestamp: now_rfc3339() }
    }
}

#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub success: bool,
    pub message: String,
    pub output: String,
}

pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snapshot_is_kept_verbatim() {
        let raw = json!({
            "devices": {"10.0.0.5": {"hostname": "tv1"}},
            "total_devices": null,
            "summary": null,
            "timestamp": 1760000000.5,
            "scanner_version": "3.1"
        });
        let snap: Snapshot = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(snap.get("scanner_version"), Some(&json!("3.1")));
        assert_eq!(serde_json::to_value(&snap).unwrap(), raw);
    }

    #[test]
    fn test_top_level_must_be_an_object() {
        assert!(serde_json::from_value::<Snapshot>(json!([1, 2])).is_err());
        assert!(serde_json::from_value::<Snapshot>(json!("devices")).is_err());
    }

    #[test]
    fn test_device_lookup() {
        let snap: Snapshot = serde_json::from_value(json!({
            "devices": {"10.0.0.5": {"hostname": "tv1"}, "10.0.0.6": null}
        }))
        .unwrap();
        assert_eq!(snap.device("10.0.0.5"), Some(&json!({"hostname": "tv1"})));
        assert_eq!(snap.device("10.0.0.6"), None);
        assert_eq!(snap.device("10.0.0.9"), None);

        let odd: Snapshot = serde_json::from_value(json!({"devices": [1]})).unwrap();
        assert_eq!(odd.device("0"), None);
    }

    #[test]
    fn test_stats_projection() {
        let snap: Snapshot = serde_json::from_value(json!({
            "devices": {},
            "total_devices": 4,
            "summary": {"gaming": 2},
            "timestamp": "2026-10-16T10:00:00"
        }))
        .unwrap();
        let stats = serde_json::to_value(snap.stats()).unwrap();
        assert_eq!(
            stats,
            json!({"total_devices": 4, "summary": {"gaming": 2}, "last_scan": "2026-10-16T10:00:00"})
        );
    }

    #[test]
    fn test_stats_omits_absent_keeps_null() {
        let snap: Snapshot = serde_json::from_value(json!({"devices": {}, "summary": null})).unwrap();
        let stats = serde_json::to_value(snap.stats()).unwrap();
        assert_eq!(stats, json!({"summary": null}));
    }

    #[test]
    fn test_push_event_shape() {
        let event = PushEvent::network_update(Snapshot::default());
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "network_update");
        assert_eq!(value["data"], json!({}));
        assert!(value["timestamp"].as_str().unwrap().contains('T'));
    }
}
