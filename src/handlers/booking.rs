use std::any::Any;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use chrono::{Local, Utc};
use tracing::Instrument;

use crate::config::ResponseStyle;
use crate::errors::RelayError;
use crate::models::InboundEnvelope;
use crate::services::reply::{self, AgentReply};
use crate::services::signature::{self, SIGNATURE_HEADER};
use crate::services::{payload, timing};
use crate::state::AppState;

pub async fn booking_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("booking_webhook", %request_id);

    async move {
        tracing::info!(bytes = body.len(), "received agent webhook");

        // Verify signature (skip if no shared secret configured)
        if state.config.signature_required() {
            let header = headers
                .get(SIGNATURE_HEADER)
                .and_then(|v| v.to_str().ok());

            if let Err(e) = signature::verify_signature(
                &state.config.retell_api_key,
                &body,
                header,
                Utc::now().timestamp_millis(),
            ) {
                tracing::warn!(error = %e, "rejected webhook signature");
                let err = RelayError::Unauthorized(e.to_string());
                return AgentReply::from_error(&err, &state.config.policy).into_response();
            }
        }

        let reply = match relay_booking(&state, &body).await {
            Ok(reply) => reply,
            Err(e) => {
                match &e {
                    RelayError::Internal(inner) => {
                        tracing::error!(error = ?inner, "booking relay failed")
                    }
                    other => tracing::warn!(error = %other, "booking not created"),
                }
                AgentReply::from_error(&e, &state.config.policy)
            }
        };

        tracing::info!(status = %reply.status, reply = %reply.body, "replying to agent");
        reply.into_response()
    }
    .instrument(span)
    .await
}

/// Parse, validate, forward and translate one booking request.
pub async fn relay_booking(state: &AppState, body: &[u8]) -> Result<AgentReply, RelayError> {
    let policy = &state.config.policy;

    let envelope: InboundEnvelope = serde_json::from_slice(body).map_err(|e| {
        tracing::warn!(error = %e, "could not decode webhook body");
        let reason = if e.is_syntax() || e.is_eof() {
            "request body is not valid JSON"
        } else {
            "booking arguments are in an unexpected format"
        };
        RelayError::InvalidInput(reason.to_string())
    })?;
    let args = envelope
        .args
        .ok_or_else(|| RelayError::InvalidInput("missing booking arguments".to_string()))?;

    tracing::debug!(?args, "extracted booking arguments");

    let start = if policy.strict_time_validation {
        timing::check_start_time(args.start_time.as_deref(), &Local::now())
    } else {
        let requested = args
            .start_time
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| RelayError::InvalidInput("missing start time".to_string()))?;
        timing::passthrough(requested)
    };

    tracing::info!(
        requested = args.start_time.as_deref().unwrap_or(""),
        start = %start.value,
        needs_confirmation = start.needs_confirmation(),
        "resolved start time"
    );
    if let Some(reason) = start.reason() {
        tracing::warn!(reason, "using placeholder start time");
    }

    let request = payload::build_booking_request(&args, &start, &state.config)?;
    tracing::debug!(payload = ?request, "sending booking to scheduling API");

    let upstream = state.scheduler.create_booking(&request).await?;
    tracing::info!(status = upstream.status, "scheduling API responded");

    if upstream.is_success() {
        let message = reply::success_message(&args, &start);
        return Ok(AgentReply::booked(policy.response_style, message, upstream.body));
    }

    tracing::warn!(status = upstream.status, body = %upstream.body, "scheduling API rejected booking");
    Err(RelayError::Upstream {
        status: upstream.status,
        message: reply::upstream_error_text(upstream.status, &upstream.body),
    })
}

/// Panic hook for `CatchPanicLayer`; the agent still gets something to say,
/// shaped like every other failure reply.
pub fn panic_reply(
    style: ResponseStyle,
) -> impl FnMut(Box<dyn Any + Send + 'static>) -> Response + Clone {
    move |err: Box<dyn Any + Send + 'static>| {
        let detail = err
            .downcast_ref::<String>()
            .map(String::as_str)
            .or_else(|| err.downcast_ref::<&str>().copied())
            .unwrap_or("unknown panic");
        tracing::error!(detail, "handler panicked");
        AgentReply::technical_difficulty(style).into_response()
    }
}
