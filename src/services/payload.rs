use serde_json::{Map, Value};

use crate::config::{AppConfig, PayloadStyle};
use crate::errors::RelayError;
use crate::models::{Attendee, BookingArgs, BookingFieldsResponses, BookingRequest};
use crate::services::timing::StartTime;

pub const SOURCE_TAG: &str = "Retell AI";
pub const GUEST_NAME: &str = "Guest";

/// Map the agent's arguments onto the scheduling API's booking request.
pub fn build_booking_request(
    args: &BookingArgs,
    start: &StartTime,
    config: &AppConfig,
) -> Result<BookingRequest, RelayError> {
    let event_type_id =
        resolve_event_type_id(config.cal_event_type_id, args.event_type_id.as_ref())?;

    let attendee = Attendee {
        name: args.name().unwrap_or(GUEST_NAME).to_string(),
        email: args
            .email()
            .unwrap_or(config.default_attendee_email.as_str())
            .to_string(),
        time_zone: args
            .time_zone()
            .unwrap_or(config.default_time_zone.as_str())
            .to_string(),
    };

    let (booking_fields_responses, metadata) = match config.policy.payload_style {
        PayloadStyle::Notes => (
            Some(BookingFieldsResponses {
                notes: compose_notes(args, start),
            }),
            None,
        ),
        PayloadStyle::Metadata => (None, Some(structured_metadata(args))),
    };

    Ok(BookingRequest {
        start: start.value.clone(),
        attendee,
        event_type_id,
        booking_fields_responses,
        metadata,
    })
}

/// The configured id wins over whatever the agent supplied.
pub fn resolve_event_type_id(
    configured: Option<i64>,
    supplied: Option<&Value>,
) -> Result<i64, RelayError> {
    if let Some(id) = configured.filter(|id| *id > 0) {
        return Ok(id);
    }

    let id = match supplied {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| f as i64)
            }),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    match id {
        Some(id) if id > 0 => Ok(id),
        _ if supplied.is_none() => Err(RelayError::InvalidInput(
            "no event type configured and none supplied".to_string(),
        )),
        _ => Err(RelayError::InvalidInput(
            "eventTypeId must be a positive integer".to_string(),
        )),
    }
}

pub fn compose_notes(args: &BookingArgs, start: &StartTime) -> String {
    let confirm = start.needs_confirmation();

    let mut notes = String::from("RIDE BOOKING");
    if confirm {
        notes.push_str(" ⚠️ CONFIRM DATE");
    }
    notes.push_str(&format!(
        "\nCustomer: {}\nPhone: {}\nVehicle: {}\nPickup: {}\nDrop-off: {}\nNotes: {}\nSource: {}",
        args.name().unwrap_or(GUEST_NAME),
        args.phone_number().unwrap_or("Not provided"),
        args.car_selected().unwrap_or("Standard"),
        args.pickup_location().unwrap_or("TBD"),
        args.destination().unwrap_or("TBD"),
        args.special_attention().unwrap_or("None"),
        SOURCE_TAG,
    ));
    if confirm {
        notes.push_str(&format!(
            "\nRequested: {}",
            start.requested.as_deref().unwrap_or("not provided")
        ));
    }

    notes
}

/// Caller metadata with every value flattened to a string, plus the source tag.
pub fn structured_metadata(args: &BookingArgs) -> Map<String, Value> {
    let mut out = Map::new();

    let raw = args
        .metadata
        .as_ref()
        .and_then(|m| serde_json::to_value(m).ok());
    if let Some(Value::Object(fields)) = raw {
        for (key, value) in fields {
            let text = match value {
                Value::Null => continue,
                Value::String(s) if s.trim().is_empty() => continue,
                Value::String(s) => s,
                other => other.to_string(),
            };
            out.insert(key, Value::String(text));
        }
    }

    if let Some(phone) = args.phone_number() {
        out.insert("phone_number".to_string(), Value::String(phone.to_string()));
    }
    out.insert("source".to_string(), Value::String(SOURCE_TAG.to_string()));

    out
}
