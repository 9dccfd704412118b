use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::extract::{FromRef, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{any, get};
use axum::{Extension, Json, Router};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::config::Config;
use crate::env::MapEnv;
use crate::level::LockinLevel;
use crate::payload::{NotificationPayload, PayloadStyle};
use crate::relay::{self, Relay, RequestContext};

const METER_PAGE: &str = include_str!("../assets/meter.html");

#[derive(Clone)]
pub struct AppState {
    relay: Relay,
    style: PayloadStyle,
    endpoint: String,
}

impl FromRef<AppState> for Relay {
    fn from_ref(state: &AppState) -> Relay {
        state.relay.clone()
    }
}

/// Meter page, payload preview and the relay endpoint.
pub fn router(config: &Config, relay: Relay) -> Router {
    let state = AppState {
        relay,
        style: config.client.style(),
        endpoint: config.server.endpoint.clone(),
    };
    let context = RequestContext {
        env: MapEnv::context(config.context_env.clone()),
    };

    Router::new()
        .route("/", get(meter_page))
        .route("/api/payload", get(payload_preview))
        .route(&config.server.endpoint, any(relay::handle))
        .layer(Extension(context))
        .with_state(state)
}

pub async fn serve(config: &Config, bind: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Binding relay listener on {bind}"))?;
    let addr = listener.local_addr()?;
    info!(%addr, endpoint = %config.server.endpoint, "relay listening");

    let app = router(config, Relay::from_config(config));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Relay server terminated")?;
    info!("relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
}

async fn meter_page(State(state): State<AppState>) -> Html<String> {
    Html(METER_PAGE.replace("{{ENDPOINT}}", &state.endpoint))
}

#[derive(Debug, Deserialize)]
struct PayloadQuery {
    #[serde(default)]
    level: Option<i64>,
}

async fn payload_preview(
    State(state): State<AppState>,
    Query(query): Query<PayloadQuery>,
) -> Response {
    let level = match query.level.map(LockinLevel::try_from) {
        None => LockinLevel::default(),
        Some(Ok(level)) => level,
        Some(Err(err)) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": err.to_string() })),
            )
                .into_response()
        }
    };
    Json(NotificationPayload::build(level, &state.style, Utc::now())).into_response()
}
