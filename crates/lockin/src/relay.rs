//! Stateless webhook relay.
//!
//! Every request walks the same path: method check, destination lookup,
//! body check, one forward call, response mapping. Each step that can fail
//! ends the request with exactly one [`Envelope`] response.

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::de::IgnoredAny;
use serde::Serialize;
use tracing::{debug, error, info, Instrument};
use uuid::Uuid;

use crate::config::{Config, RelayConfig};
use crate::env::{resolve, visible_keys, EnvSource, MapEnv, ProcessEnv};

/// Uniform JSON body returned by the relay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<ConfigDebug>,
}

impl Envelope {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }
}

/// Which configuration keys were visible when the destination was missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigDebug {
    #[serde(rename = "hasProcess")]
    pub has_process: bool,
    pub keys: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Webhook URL not configured")]
    ConfigMissing { debug: ConfigDebug },
    #[error("{0}")]
    ReadBody(axum::Error),
    #[error("{0}")]
    InvalidBody(#[from] serde_json::Error),
    #[error("Failed to send to Discord")]
    Upstream { status: StatusCode, details: String },
    #[error("{0}")]
    Transport(reqwest::Error),
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::Upstream { status, .. } => *status,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn envelope(&self) -> Envelope {
        let mut message = self.to_string();
        if message.is_empty() {
            message = "Unknown error".to_string();
        }
        let mut envelope = Envelope {
            success: false,
            error: Some(message),
            ..Envelope::default()
        };
        match self {
            RelayError::ConfigMissing { debug } => envelope.debug = Some(debug.clone()),
            RelayError::Upstream { status, details } => {
                envelope.status = Some(status.as_u16());
                envelope.details = Some(details.clone());
            }
            _ => {}
        }
        envelope
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.envelope())).into_response()
    }
}

/// Per-request environment handed to the relay by the hosting layer.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub env: MapEnv,
}

#[derive(Clone)]
pub struct Relay {
    inner: Arc<Inner>,
}

struct Inner {
    env_key: String,
    debug_key_filter: String,
    max_body_bytes: usize,
    sources: Vec<Arc<dyn EnvSource>>,
    client: reqwest::Client,
}

impl Relay {
    /// `sources` are queried in order, ahead of the request context.
    pub fn new(settings: &RelayConfig, sources: Vec<Arc<dyn EnvSource>>) -> Self {
        Self::with_client(settings, sources, reqwest::Client::new())
    }

    pub fn with_client(
        settings: &RelayConfig,
        sources: Vec<Arc<dyn EnvSource>>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                env_key: settings.env_key.clone(),
                debug_key_filter: settings.debug_key_filter.clone(),
                max_body_bytes: settings.max_body_bytes,
                sources,
                client,
            }),
        }
    }

    /// Process environment first, then the platform table from the config file.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.relay,
            vec![
                Arc::new(ProcessEnv),
                Arc::new(MapEnv::platform(config.platform_env.clone())),
            ],
        )
    }

    /// Resolve the destination, check that `body` is JSON and forward its bytes once.
    pub async fn dispatch(&self, context: &RequestContext, body: Body) -> Result<(), RelayError> {
        let mut sources: Vec<&dyn EnvSource> =
            self.inner.sources.iter().map(|s| s.as_ref()).collect();
        sources.push(&context.env);

        let Some(destination) = resolve(&sources, &self.inner.env_key).await else {
            return Err(RelayError::ConfigMissing {
                debug: self.config_debug().await,
            });
        };
        debug!(source = destination.source, "resolved webhook destination");

        let bytes: Bytes = axum::body::to_bytes(body, self.inner.max_body_bytes)
            .await
            .map_err(RelayError::ReadBody)?;
        serde_json::from_slice::<IgnoredAny>(&bytes)?;

        let response = self
            .inner
            .client
            .post(&destination.value)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(bytes)
            .send()
            .await
            .map_err(|e| RelayError::Transport(e.without_url()))?;

        let status = response.status();
        if status.is_success() {
            info!(%status, "webhook accepted payload");
            return Ok(());
        }

        let details = response
            .text()
            .await
            .map_err(|e| RelayError::Transport(e.without_url()))?;
        error!(status = status.as_u16(), %details, "Discord API error");
        Err(RelayError::Upstream { status, details })
    }

    async fn config_debug(&self) -> ConfigDebug {
        let process = self
            .inner
            .sources
            .iter()
            .find(|s| s.name() == ProcessEnv.name());
        let keys = match process {
            Some(source) => visible_keys(source.as_ref(), &self.inner.debug_key_filter).await,
            None => Vec::new(),
        };
        ConfigDebug {
            has_process: process.is_some(),
            keys,
        }
    }
}

/// Axum handler for the relay endpoint. Mount with `any` so the method
/// guard answers non-POST requests itself.
pub async fn handle(
    State(relay): State<Relay>,
    method: Method,
    context: Option<Extension<RequestContext>>,
    body: Body,
) -> Response {
    let span = tracing::info_span!("relay", request_id = %Uuid::new_v4(), %method);
    async move {
        if method != Method::POST {
            debug!("rejecting non-POST request");
            return (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed").into_response();
        }

        let context = context.map(|Extension(c)| c).unwrap_or_default();
        match relay.dispatch(&context, body).await {
            Ok(()) => (StatusCode::OK, Json(Envelope::ok())).into_response(),
            Err(err) => {
                if !matches!(err, RelayError::Upstream { .. }) {
                    error!(error = %err, "relay request failed");
                }
                err.into_response()
            }
        }
    }
    .instrument(span)
    .await
}
