// http server mode - the chat relay api

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::core::{Message, NewMessage, Page, Relay, Verdict};
use crate::Error;

// room for the user name and the json around the text
const BODY_SLACK: usize = 64 * 1024;

#[derive(Deserialize)]
struct PollParams {
    // kept as a string so junk values fall back to 0 instead of a 400
    #[serde(rename = "lastMessageId")]
    last_message_id: Option<String>,
}

#[derive(Serialize)]
struct SubmitResponse {
    success: bool,
    message: Message,
    verdict: Verdict,
    #[serde(rename = "safetyAnalysis")]
    safety_analysis: Option<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub struct Server;

impl Server {
    pub fn router(relay: Relay) -> Router {
        // the log enforces the exact text limit, this only stops absurd bodies
        let body_limit = match relay.max_text_bytes() {
            // a json escape can take six bytes per text byte
            Some(limit) => {
                DefaultBodyLimit::max(limit.saturating_mul(6).saturating_add(BODY_SLACK))
            }
            None => DefaultBodyLimit::disable(),
        };

        Router::new()
            .route("/", get(health))
            .route("/api/messages", get(poll).post(submit))
            .layer(body_limit)
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(relay)
    }

    pub async fn run(relay: Relay, host: &str, port: u16) -> Result<(), Error> {
        let app = Self::router(relay);

        let addr = format!("{host}:{port}");
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::Server(e.to_string()))?;
        info!(%addr, "chat relay listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::Server(e.to_string()))?;

        info!("chat relay stopped");
        Ok(())
    }
}

// resolves on ctrl-c or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install ctrl-c handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}

async fn health() -> &'static str {
    "Chat Safety Monitor Server is running"
}

async fn poll(State(relay): State<Relay>, Query(params): Query<PollParams>) -> Json<Page> {
    let cursor = params.last_message_id.as_deref().map_or(0, parse_cursor);
    Json(relay.poll(cursor))
}

/// Read the leading run of digits, so `5abc` is 5. Anything else is 0.
fn parse_cursor(raw: &str) -> u64 {
    let raw = raw.trim_start();
    let raw = raw.strip_prefix('+').unwrap_or(raw);
    let end = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());

    raw[..end].parse().unwrap_or(0)
}

async fn submit(
    State(relay): State<Relay>,
    payload: Result<Json<NewMessage>, JsonRejection>,
) -> Result<Json<SubmitResponse>, Error> {
    let Json(new) = payload.map_err(|e| match e.status() {
        StatusCode::PAYLOAD_TOO_LARGE => Error::BodyTooLarge(e.body_text()),
        _ => Error::Validation(e.body_text()),
    })?;
    let receipt = relay.submit(new).await?;

    Ok(Json(SubmitResponse {
        success: true,
        safety_analysis: receipt.verdict.analysis(),
        message: receipt.message,
        verdict: receipt.verdict,
    }))
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Error::Validation(m) => (StatusCode::BAD_REQUEST, m.clone()),
            Error::PayloadTooLarge { .. } | Error::BodyTooLarge(_) => {
                (StatusCode::PAYLOAD_TOO_LARGE, self.to_string())
            }
            // internal detail goes to the log, not the client
            _ => {
                error!(error = %self, "error processing message");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
