use std::env;
use std::time::Duration;

/// How the outbound booking carries the ride details.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadStyle {
    /// A single human-readable block in `bookingFieldsResponses.notes`.
    Notes,
    /// Caller metadata passed through under `metadata` with a source tag.
    Metadata,
}

impl PayloadStyle {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "notes" => Some(PayloadStyle::Notes),
            "metadata" | "structured" => Some(PayloadStyle::Metadata),
            _ => None,
        }
    }
}

/// Shape of the body returned to the agent platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseStyle {
    /// A bare JSON string the agent reads aloud.
    Message,
    /// `{ ok, booking | error | status }`
    Structured,
}

impl ResponseStyle {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "message" | "text" => Some(ResponseStyle::Message),
            "structured" | "json" => Some(ResponseStyle::Structured),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RelayPolicy {
    pub strict_time_validation: bool,
    pub payload_style: PayloadStyle,
    pub response_style: ResponseStyle,
    pub expose_upstream_errors: bool,
}

impl Default for RelayPolicy {
    fn default() -> Self {
        Self {
            strict_time_validation: true,
            payload_style: PayloadStyle::Notes,
            response_style: ResponseStyle::Message,
            expose_upstream_errors: true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub cal_api_key: String,
    pub cal_api_url: String,
    pub cal_api_version: String,
    pub cal_event_type_id: Option<i64>,
    pub cal_timeout: Duration,
    /// Empty disables signature verification.
    pub retell_api_key: String,
    pub default_attendee_email: String,
    pub default_time_zone: String,
    pub policy: RelayPolicy,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = RelayPolicy::default();
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            cal_api_key: env::var("CAL_API_KEY").unwrap_or_default(),
            cal_api_url: env::var("CAL_API_URL")
                .unwrap_or_else(|_| "https://api.cal.com/v2/bookings".to_string()),
            cal_api_version: env::var("CAL_API_VERSION")
                .unwrap_or_else(|_| "2024-08-13".to_string()),
            cal_event_type_id: env::var("CAL_EVENT_TYPE_ID")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .filter(|id: &i64| *id > 0),
            cal_timeout: Duration::from_secs(
                env::var("CAL_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(15),
            ),
            retell_api_key: env::var("RETELL_API_KEY").unwrap_or_default(),
            default_attendee_email: env::var("DEFAULT_ATTENDEE_EMAIL")
                .unwrap_or_else(|_| "bookings@example.com".to_string()),
            default_time_zone: env::var("DEFAULT_TIME_ZONE")
                .unwrap_or_else(|_| "Pacific/Auckland".to_string()),
            policy: RelayPolicy {
                strict_time_validation: env_flag(
                    "RELAY_STRICT_TIME_VALIDATION",
                    defaults.strict_time_validation,
                ),
                payload_style: env::var("RELAY_PAYLOAD_STYLE")
                    .ok()
                    .and_then(|v| PayloadStyle::parse(&v))
                    .unwrap_or(defaults.payload_style),
                response_style: env::var("RELAY_RESPONSE_STYLE")
                    .ok()
                    .and_then(|v| ResponseStyle::parse(&v))
                    .unwrap_or(defaults.response_style),
                expose_upstream_errors: env_flag(
                    "RELAY_EXPOSE_UPSTREAM_ERRORS",
                    defaults.expose_upstream_errors,
                ),
            },
        }
    }

    pub fn signature_required(&self) -> bool {
        !self.retell_api_key.is_empty()
    }
}

fn env_flag(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .and_then(|v| parse_flag(&v))
        .unwrap_or(default)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
