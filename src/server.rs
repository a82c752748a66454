//! Inbound webhook boundary
//!
//! The platform expects a plain `ok` with status 200 for every delivered
//! event; anything else makes it redeliver. Business failures are logged
//! here and never reach the HTTP response.

use std::time::Duration;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::handlers::{route_message, IncomingMessage};
use crate::state::AppContext;
use crate::utils::errors::CourierHubError;

/// Acknowledgement body for every non-handshake event
pub const OK_REPLY: &str = "ok";

#[derive(Debug, Deserialize)]
struct WebhookEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    object: Value,
    #[serde(default)]
    group_id: Option<i64>,
    #[serde(default)]
    secret: Option<String>,
}

pub fn build_app(ctx: AppContext) -> Router {
    let webhook_path = ctx.settings.server.webhook_path.clone();

    Router::new()
        .route("/livez", get(livez))
        .route(&webhook_path, post(webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn livez() -> (StatusCode, &'static str) {
    (StatusCode::OK, OK_REPLY)
}

async fn webhook(State(ctx): State<AppContext>, body: Bytes) -> (StatusCode, String) {
    let timeout = Duration::from_secs(ctx.settings.server.request_timeout_secs);

    // Work continues in the background if the platform's patience runs out
    let task = tokio::spawn(async move { handle_webhook(&ctx, &body).await });
    let reply = match tokio::time::timeout(timeout, task).await {
        Ok(Ok(reply)) => reply,
        Ok(Err(e)) => {
            error!(error = %e, "Webhook task failed");
            OK_REPLY.to_string()
        }
        Err(_) => {
            warn!(timeout_secs = timeout.as_secs(), "Webhook still processing, acknowledging early");
            OK_REPLY.to_string()
        }
    };

    (StatusCode::OK, reply)
}

/// Process one webhook body and return the response text
pub async fn handle_webhook(ctx: &AppContext, body: &[u8]) -> String {
    let event: WebhookEvent = match serde_json::from_slice(body) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "Malformed webhook body");
            return OK_REPLY.to_string();
        }
    };

    let bot = &ctx.settings.bot;

    if event.kind == "confirmation" {
        if bot.group_id != 0 && event.group_id.is_some_and(|id| id != bot.group_id) {
            warn!(group_id = ?event.group_id, "Confirmation requested for another community");
        }
        info!("Webhook confirmation requested");
        return bot.confirmation_code.clone();
    }

    if let Some(secret) = bot.secret_key.as_deref().filter(|s| !s.is_empty()) {
        if event.secret.as_deref() != Some(secret) {
            warn!(event_type = %event.kind, "Webhook secret mismatch, event dropped");
            return OK_REPLY.to_string();
        }
    }

    match event.kind.as_str() {
        "message_new" => {
            // API 5.103+ wraps the message; older versions send it bare
            let raw = event.object.get("message").cloned().unwrap_or(event.object);
            match serde_json::from_value::<IncomingMessage>(raw) {
                Ok(message) => {
                    if let Err(e) = route_message(ctx, &message, Utc::now()).await {
                        log_handling_error(&message, &e);
                    }
                }
                Err(e) => warn!(error = %e, "Unreadable message_new object"),
            }
        }
        "message_allow" => {
            let user_id = event.object.get("user_id").and_then(Value::as_i64);
            info!(user_id = ?user_id, "User allowed messages from the community");
        }
        other => debug!(event_type = %other, "Ignoring webhook event"),
    }

    OK_REPLY.to_string()
}

fn log_handling_error(message: &IncomingMessage, e: &CourierHubError) {
    let severity = e.severity();
    if e.needs_attention() {
        error!(peer_id = message.peer_id, user_id = message.from_id, severity = %severity, error = %e, "Message handling failed");
    } else {
        warn!(
            peer_id = message.peer_id,
            user_id = message.from_id,
            severity = %severity,
            recoverable = e.is_recoverable(),
            error = %e,
            "Message handling failed"
        );
    }
}
