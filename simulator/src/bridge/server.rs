use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use netracore::stream_interface::Sighting;
use serde_json::json;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use warp::http::StatusCode;
use warp::ws::{Message, WebSocket, Ws};
use warp::{Filter, Rejection, Reply};

use super::model::SightingLog;
use crate::workflow::config::SimulatorConfig;
use crate::workflow::responder::FrameResponder;

const MAX_SIGHTING_BYTES: u64 = 8 * 1024 * 1024;
const MODEL_MISSING: &str = "Enhancement model not loaded.";

/// Shared state behind every route.
pub struct BridgeState {
    config: SimulatorConfig,
    sightings: RwLock<SightingLog>,
    connections: AtomicU64,
}

impl BridgeState {
    pub fn new(config: SimulatorConfig) -> Self {
        Self {
            config,
            sightings: RwLock::new(SightingLog::default()),
            connections: AtomicU64::new(0),
        }
    }

    fn next_responder(&self) -> FrameResponder {
        let connection = self.connections.fetch_add(1, Ordering::Relaxed);
        FrameResponder::new(
            self.config.generator.clone(),
            self.config.seed.wrapping_add(connection),
            self.config.jpeg_quality,
        )
    }
}

pub fn routes(
    state: Arc<BridgeState>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone + Send + Sync + 'static {
    let state_filter = warp::any().map(move || state.clone());

    let live_route = warp::path("ws")
        .and(warp::path("live-enhance"))
        .and(warp::ws())
        .and(state_filter.clone())
        .map(|ws: Ws, state: Arc<BridgeState>| {
            ws.on_upgrade(move |socket| serve_socket(socket, state))
        });

    let log_route = warp::path("log-sighting")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_SIGHTING_BYTES))
        .and(warp::body::json())
        .and(state_filter.clone())
        .and_then(|sighting: Sighting, state: Arc<BridgeState>| async move {
            if state.config.reject_sightings {
                warn!("[bridge] rejecting sighting logged at {}", sighting.timestamp);
                return Ok::<_, Rejection>(warp::reply::with_status(
                    warp::reply::json(&json!({"detail": "Sighting storage unavailable."})),
                    StatusCode::INTERNAL_SERVER_ERROR,
                ));
            }
            let id = state.sightings.write().await.append(sighting);
            info!("[bridge] sighting {id} logged");
            Ok(warp::reply::with_status(
                warp::reply::json(&json!({"status": "success", "id": id})),
                StatusCode::OK,
            ))
        });

    let list_route = warp::path("sightings")
        .and(warp::get())
        .and(state_filter)
        .and_then(|state: Arc<BridgeState>| async move {
            let log = state.sightings.read().await;
            Ok::<_, Rejection>(warp::reply::json(&log.entries()))
        });

    live_route.or(log_route).or(list_route)
}

async fn serve_socket(socket: WebSocket, state: Arc<BridgeState>) {
    let (mut outbound, mut inbound) = socket.split();

    if !state.config.model_loaded {
        warn!("[bridge] refusing live stream: {MODEL_MISSING}");
        let envelope = json!({ "error": MODEL_MISSING }).to_string();
        let _ = outbound.send(Message::text(envelope)).await;
        let _ = outbound
            .send(Message::close_with(1011u16, "Model not available"))
            .await;
        return;
    }

    let mut responder = state.next_responder();
    info!("[bridge] live stream connected");
    while let Some(next) = inbound.next().await {
        let message = match next {
            Ok(message) => message,
            Err(err) => {
                warn!("[bridge] live stream error: {err}");
                break;
            }
        };
        if message.is_close() {
            break;
        }
        let Ok(frame) = message.to_str() else {
            continue;
        };
        match responder.respond_json(frame) {
            Ok(reply) => {
                if outbound.send(Message::text(reply)).await.is_err() {
                    break;
                }
            }
            Err(err) => debug!("[bridge] dropped frame: {err:#}"),
        }
    }
    info!("[bridge] live stream closed");
}

/// Binds the bridge and serves until `shutdown` resolves.
pub async fn serve<F>(config: SimulatorConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let address: SocketAddr = config
        .bind
        .parse()
        .with_context(|| format!("parsing bind address {}", config.bind))?;
    let state = Arc::new(BridgeState::new(config));
    let (bound, server) = warp::serve(routes(state))
        .try_bind_with_graceful_shutdown(address, shutdown)
        .with_context(|| format!("binding bridge on {address}"))?;
    info!("[bridge] listening on {bound}");
    server.await;
    Ok(())
}
