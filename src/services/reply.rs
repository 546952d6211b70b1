use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::config::{RelayPolicy, ResponseStyle};
use crate::errors::RelayError;
use crate::models::BookingArgs;
use crate::services::timing::StartTime;

pub const GENERIC_APOLOGY: &str = "I'm sorry, I wasn't able to complete that booking right now. \
     Someone from our team will follow up with you shortly.";

pub const TECHNICAL_DIFFICULTY: &str =
    "I'm sorry, we're having technical difficulties right now. Please try again in a moment.";

const CONFIRM_LATER: &str = "However, I need to confirm the date and time with you. \
     We've scheduled a placeholder, but someone will call you back to confirm the exact date.";

/// What goes back to the agent platform.
#[derive(Debug, Clone)]
pub struct AgentReply {
    pub status: StatusCode,
    pub body: Value,
}

impl AgentReply {
    pub fn booked(style: ResponseStyle, message: String, booking: Value) -> Self {
        let body = match style {
            ResponseStyle::Message => Value::String(message),
            ResponseStyle::Structured => json!({ "ok": true, "booking": booking }),
        };
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    pub fn failed(style: ResponseStyle, upstream_status: Option<u16>, message: String) -> Self {
        let body = match (style, upstream_status) {
            (ResponseStyle::Message, _) => Value::String(message),
            (ResponseStyle::Structured, Some(status)) => {
                json!({ "ok": false, "status": status, "error": message })
            }
            (ResponseStyle::Structured, None) => json!({ "ok": false, "error": message }),
        };
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    pub fn unauthorized(reason: &str) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            body: json!({ "ok": false, "error": reason }),
        }
    }

    pub fn technical_difficulty(style: ResponseStyle) -> Self {
        Self::failed(style, None, TECHNICAL_DIFFICULTY.to_string())
    }

    /// Turn a failed relay into something the agent can say. Upstream text is
    /// only passed on when the policy allows it.
    pub fn from_error(err: &RelayError, policy: &RelayPolicy) -> Self {
        let style = policy.response_style;
        let mut reply = match err {
            RelayError::Unauthorized(reason) => Self::unauthorized(reason),
            RelayError::InvalidInput(reason) => {
                let message = match style {
                    ResponseStyle::Message => {
                        format!("I'm missing some details to book that ride: {reason}.")
                    }
                    ResponseStyle::Structured => reason.clone(),
                };
                Self::failed(style, None, message)
            }
            RelayError::Upstream { status, message } => {
                let message = if policy.expose_upstream_errors {
                    message.clone()
                } else {
                    GENERIC_APOLOGY.to_string()
                };
                Self::failed(style, Some(*status), message)
            }
            RelayError::Internal(_) => Self::technical_difficulty(style),
        };
        reply.status = err.status_code();
        reply
    }
}

impl IntoResponse for AgentReply {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub fn success_message(args: &BookingArgs, start: &StartTime) -> String {
    let base = format!(
        "Perfect! Your {} is booked from {} to {}.",
        args.car_selected().unwrap_or("ride"),
        args.pickup_location().unwrap_or("pickup"),
        args.destination().unwrap_or("destination"),
    );

    if start.needs_confirmation() {
        format!("{base} {CONFIRM_LATER}")
    } else {
        let when = start.requested.as_deref().unwrap_or(&start.value);
        format!("{base} Scheduled for {when}. Booking confirmed!")
    }
}

/// Most specific error text in the scheduling API's response body.
pub fn upstream_error_text(status: u16, body: &Value) -> String {
    let nested = body
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str);
    let top = body.get("message").and_then(Value::as_str);
    let bare = body.get("error").and_then(Value::as_str);

    let non_blank = |m: &&str| !m.trim().is_empty();

    nested
        .filter(non_blank)
        .or(top.filter(non_blank))
        .or(bare.filter(non_blank))
        .map(str::to_string)
        .unwrap_or_else(|| format!("Booking failed with status {status}: {body}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::timing::TimeStatus;

    fn args(metadata: Value) -> BookingArgs {
        serde_json::from_value(json!({ "name": "Jane", "metadata": metadata })).unwrap()
    }

    fn start(status: TimeStatus, requested: &str) -> StartTime {
        StartTime {
            status,
            value: "2098-12-31T22:00:00.000Z".to_string(),
            requested: Some(requested.to_string()),
        }
    }

    #[test]
    fn test_success_message_confirmed() {
        let args = args(json!({
            "car_selected": "SUV",
            "pickup_location": "Airport",
            "destination": "Hotel"
        }));
        let message = success_message(&args, &start(TimeStatus::Valid, "2099-01-01T10:00:00+12:00"));
        assert_eq!(
            message,
            "Perfect! Your SUV is booked from Airport to Hotel. \
             Scheduled for 2099-01-01T10:00:00+12:00. Booking confirmed!"
        );
    }

    #[test]
    fn test_success_message_placeholders_and_callback() {
        let message = success_message(&args(json!({})), &start(TimeStatus::Past, "yesterday"));
        assert!(message.starts_with("Perfect! Your ride is booked from pickup to destination."));
        assert!(message.contains("someone will call you back to confirm the exact date"));
        assert!(!message.contains("Booking confirmed!"));
    }

    #[test]
    fn test_error_text_precedence() {
        let body = json!({ "error": { "message": "slot taken" }, "message": "Bad Request" });
        assert_eq!(upstream_error_text(400, &body), "slot taken");

        let body = json!({ "error": { "code": "X" }, "message": "Bad Request" });
        assert_eq!(upstream_error_text(400, &body), "Bad Request");

        let body = json!({ "error": { "message": "" }, "message": "slot taken" });
        assert_eq!(upstream_error_text(400, &body), "slot taken");

        let body = json!({ "error": "unauthorized" });
        assert_eq!(upstream_error_text(401, &body), "unauthorized");

        let body = json!({ "status": "error" });
        assert_eq!(
            upstream_error_text(500, &body),
            r#"Booking failed with status 500: {"status":"error"}"#
        );
    }

    #[test]
    fn test_upstream_error_exposure_policy() {
        let err = RelayError::Upstream {
            status: 400,
            message: "slot taken".to_string(),
        };
        let mut policy = RelayPolicy::default();
        let reply = AgentReply::from_error(&err, &policy);
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body, json!("slot taken"));

        policy.expose_upstream_errors = false;
        let reply = AgentReply::from_error(&err, &policy);
        assert_eq!(reply.body, json!(GENERIC_APOLOGY));

        policy.response_style = ResponseStyle::Structured;
        let reply = AgentReply::from_error(&err, &policy);
        assert_eq!(reply.body, json!({ "ok": false, "status": 400, "error": GENERIC_APOLOGY }));
    }

    #[test]
    fn test_internal_error_hides_detail() {
        let err = RelayError::Internal(anyhow::anyhow!("connection reset by peer"));
        let reply = AgentReply::from_error(&err, &RelayPolicy::default());
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body, json!(TECHNICAL_DIFFICULTY));
    }

    #[test]
    fn test_unauthorized_reply() {
        let err = RelayError::Unauthorized("invalid signature".to_string());
        let reply = AgentReply::from_error(&err, &RelayPolicy::default());
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
        assert_eq!(reply.body, json!({ "ok": false, "error": "invalid signature" }));
    }
}
