/*!
Construction de snapshots de test

Produit des documents au format écrit par le scanner:
`{devices: {<ip>: {...}}, total_devices, summary, timestamp}`
*/

use serde_json::{json, Map, Value};

#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    devices: Map<String, Value>,
    summary: Map<String, Value>,
    timestamp: String,
    extra: Map<String, Value>,
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self {
            devices: Map::new(),
            summary: Map::new(),
            timestamp: "2026-10-16T10:00:00".to_string(),
            extra: Map::new(),
        }
    }

    /// Ajoute un appareil avec un enregistrement arbitraire
    pub fn device<S: Into<String>>(mut self, ip: S, record: Value) -> Self {
        self.devices.insert(ip.into(), record);
        self
    }

    /// Raccourci : appareil avec seulement hostname + status "online"
    pub fn host<S: Into<String>>(self, ip: S, hostname: &str) -> Self {
        self.device(ip, json!({ "hostname": hostname, "status": "online" }))
    }

    pub fn summary_field<S: Into<String>>(mut self, key: S, value: Value) -> Self {
        self.summary.insert(key.into(), value);
        self
    }

    pub fn timestamp<S: Into<String>>(mut self, ts: S) -> Self {
        self.timestamp = ts.into();
        self
    }

    /// Champ de premier niveau hors format de base (doit être conservé par le relais)
    pub fn extra<S: Into<String>>(mut self, key: S, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn build(self) -> Value {
        let mut doc = Map::new();
        doc.insert("total_devices".into(), json!(self.devices.len()));
        doc.insert("devices".into(), Value::Object(self.devices));
        doc.insert("summary".into(), Value::Object(self.summary));
        doc.insert("timestamp".into(), Value::String(self.timestamp));
        doc.extend(self.extra);
        Value::Object(doc)
    }
}
