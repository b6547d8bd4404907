//! NetMon kernel : relais temps réel entre le scanner réseau et le dashboard.
//!
//! Le scanner externe écrit `network_data.json` ; le relais le sert en REST,
//! le surveille et pousse chaque nouvelle version aux abonnés WebSocket.

pub mod broadcast;
pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod hub;
pub mod models;
pub mod scanner;
pub mod scheduler;
pub mod snapshot;
pub mod state;
pub mod watcher;
