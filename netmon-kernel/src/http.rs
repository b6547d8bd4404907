/**
 * API REST NETMON - Serveur HTTP du relais
 *
 * RÔLE :
 * Expose le snapshot réseau au dashboard : lecture REST, scan manuel,
 * santé du relais, et canal push WebSocket pour les mises à jour en direct.
 *
 * FONCTIONNEMENT :
 * - Routes sous /api : network, device/{ip}, stats, scan (POST), health
 * - Upgrade WebSocket sur tout autre chemin (le dashboard se connecte sur /) :
 *   abonnement push, reçoit immédiatement le snapshot courant
 * - Sans upgrade : fichiers statiques du dashboard (ServeDir)
 * - Erreurs traduites en statut + JSON par ApiError, jamais de crash
 *
 * SÉCURITÉ :
 * - Aucune authentification (réseau local de l'événement), CORS permissif
 */

use crate::error::{ApiError, DEVICE_MISSING, SNAPSHOT_MISSING, SNAPSHOT_MISSING_HINT};
use crate::health::RelayHealth;
use crate::models::{ScanResponse, Snapshot, StatsView};
use crate::scanner::ScanMode;
use crate::state::AppState;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Request, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::path::Path as FsPath;
use tower::ServiceExt;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub fn build_router(app_state: AppState, static_dir: &FsPath) -> Router {
    let dashboard = ServeDir::new(static_dir);
    Router::new()
        .route("/api/network", get(get_network))
        .route("/api/device/{ip}", get(get_device))
        .route("/api/stats", get(get_stats))
        .route("/api/scan", post(trigger_scan))
        .route("/api/health", get(get_health))
        .fallback(
            move |ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
                  State(app): State<AppState>,
                  req: Request| push_or_dashboard(ws, app, dashboard.clone(), req),
        )
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

// GET /api/network (snapshot complet)
async fn get_network(State(app): State<AppState>) -> Result<Json<Snapshot>, ApiError> {
    let snapshot = app.store.load().await?.ok_or(ApiError::NotFound(SNAPSHOT_MISSING_HINT))?;
    Ok(Json(snapshot))
}

// GET /api/device/{ip}
async fn get_device(
    State(app): State<AppState>,
    Path(ip): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let snapshot = app.store.load().await?.ok_or(ApiError::NotFound(SNAPSHOT_MISSING))?;
    let Some(device) = snapshot.device(&ip) else {
        return Err(ApiError::NotFound(DEVICE_MISSING));
    };
    Ok(Json(device.clone()))
}

// GET /api/stats (projection total/summary/timestamp)
async fn get_stats(State(app): State<AppState>) -> Result<Json<StatsView>, ApiError> {
    let snapshot = app.store.load().await?.ok_or(ApiError::NotFound(SNAPSHOT_MISSING))?;
    Ok(Json(snapshot.stats()))
}

// POST /api/scan (scan manuel, attend la fin du processus)
async fn trigger_scan(State(app): State<AppState>) -> Result<Json<ScanResponse>, ApiError> {
    tracing::info!("manual scan triggered");
    let report = app.scanner.run(ScanMode::Manual).await?;

    // le watcher peut aussi déclencher : double push toléré
    app.lifecycle.schedule_push(app.broadcaster.clone(), app.push_delay);

    Ok(Json(ScanResponse {
        success: true,
        message: "Scan completed".to_string(),
        output: report.stdout,
    }))
}

// GET /api/health
async fn get_health(State(app): State<AppState>) -> Json<RelayHealth> {
    Json(app.health.report(app.registry.len(), app.scanner.in_flight()))
}

// tout chemin hors API : push si upgrade WebSocket, sinon fichier statique
async fn push_or_dashboard(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    app: AppState,
    dashboard: ServeDir,
    req: Request,
) -> Response {
    match ws {
        Ok(ws) => ws.on_upgrade(move |socket| handle_socket(socket, app)),
        Err(_) => match dashboard.oneshot(req).await {
            Ok(res) => res.into_response(),
            Err(never) => match never {},
        },
    }
}

async fn handle_socket(socket: WebSocket, app: AppState) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    // snapshot courant en tête de file, avant toute diffusion
    let initial = app.broadcaster.current_frame().await;
    let (conn_id, mut rx) = app.registry.register(initial);

    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if ws_sender.send(Message::Text(frame)).await.is_err() {
                return;
            }
        }
        // registre vidé (extinction) : fermeture propre
        let _ = ws_sender.send(Message::Close(None)).await;
    });

    // rien à traiter en entrée, on attend juste la fermeture
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = ws_receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(connection_id = %conn_id, error = %e, "websocket error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    app.registry.unregister(&conn_id);
}
