use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Body posted by the agent platform when the booking tool fires.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundEnvelope {
    #[serde(default)]
    pub args: Option<BookingArgs>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingArgs {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub start_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub time_zone: Option<String>,
    /// Number or numeric string, depending on how the agent tool was declared.
    #[serde(default)]
    pub event_type_id: Option<Value>,
    #[serde(default)]
    pub metadata: Option<RideMetadata>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RideMetadata {
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub car_selected: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub pickup_location: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub destination: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub special_attention: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BookingArgs {
    pub fn name(&self) -> Option<&str> {
        non_empty(self.name.as_deref())
    }

    pub fn phone_number(&self) -> Option<&str> {
        non_empty(self.phone_number.as_deref())
    }

    pub fn email(&self) -> Option<&str> {
        non_empty(self.email.as_deref())
    }

    pub fn time_zone(&self) -> Option<&str> {
        non_empty(self.time_zone.as_deref())
    }

    pub fn car_selected(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| non_empty(m.car_selected.as_deref()))
    }

    pub fn pickup_location(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| non_empty(m.pickup_location.as_deref()))
    }

    pub fn destination(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| non_empty(m.destination.as_deref()))
    }

    pub fn special_attention(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| non_empty(m.special_attention.as_deref()))
    }
}

/// Agents are loose with types; a phone number may arrive as a JSON number.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Request body for the scheduling API's booking-creation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub start: String,
    pub attendee: Attendee,
    pub event_type_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_fields_responses: Option<BookingFieldsResponses>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub name: String,
    pub email: String,
    pub time_zone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingFieldsResponses {
    pub notes: String,
}
