use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Utc};

const FALLBACK_HOUR: u32 = 10;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M%:z",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeStatus {
    Valid,
    Invalid,
    Past,
    /// Forwarded as supplied; strict validation is off.
    Unchecked,
}

/// Outcome of checking the caller's requested start time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTime {
    pub status: TimeStatus,
    /// Value sent to the scheduling API as `start`.
    pub value: String,
    /// What the caller asked for, untouched.
    pub requested: Option<String>,
}

impl StartTime {
    pub fn needs_confirmation(&self) -> bool {
        matches!(self.status, TimeStatus::Invalid | TimeStatus::Past)
    }

    pub fn reason(&self) -> Option<&'static str> {
        match self.status {
            TimeStatus::Invalid => Some("Invalid date"),
            TimeStatus::Past => Some("Past date"),
            TimeStatus::Valid | TimeStatus::Unchecked => None,
        }
    }
}

/// Classify `requested` against `now`. Invalid and past times are replaced by
/// the next day at 10:00 in `now`'s zone.
pub fn check_start_time<Tz: TimeZone>(requested: Option<&str>, now: &DateTime<Tz>) -> StartTime {
    let requested_owned = requested.map(str::to_string);
    let parsed = requested.and_then(|raw| parse_timestamp(raw, &now.timezone()));

    let (status, value) = match parsed {
        None => (TimeStatus::Invalid, fallback_start(now)),
        Some(dt) if dt < now.with_timezone(&Utc) => (TimeStatus::Past, fallback_start(now)),
        Some(dt) => (TimeStatus::Valid, dt),
    };

    StartTime {
        status,
        value: to_iso(&value),
        requested: requested_owned,
    }
}

pub fn passthrough(requested: &str) -> StartTime {
    StartTime {
        status: TimeStatus::Unchecked,
        value: requested.to_string(),
        requested: Some(requested.to_string()),
    }
}

/// Next calendar day at 10:00 local to `now`.
pub fn fallback_start<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    let tomorrow = now.date_naive() + Duration::days(1);
    let local = tomorrow
        .and_hms_opt(FALLBACK_HOUR, 0, 0)
        .unwrap_or_else(|| tomorrow.and_time(NaiveTime::default()));

    now.timezone()
        .from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        // 10:00 fell into a DST gap; an hour later always exists
        .or_else(|| {
            now.timezone()
                .from_local_datetime(&(local + Duration::hours(1)))
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
        })
        .unwrap_or_else(|| local.and_utc())
}

/// Timestamps without an offset are read in `local`; bare dates are UTC midnight.
pub fn parse_timestamp<Tz: TimeZone>(raw: &str, local: &Tz) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    // `Z` is only understood by the RFC 3339 parser; spell it out for the rest
    let zoned = match raw.strip_suffix(|c| c == 'Z' || c == 'z') {
        Some(rest) => format!("{rest}+00:00"),
        None => raw.to_string(),
    };
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&zoned, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.and_time(NaiveTime::default()).and_utc());
    }

    None
}

pub fn to_iso(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn auckland() -> FixedOffset {
        FixedOffset::east_opt(12 * 3600).unwrap()
    }

    fn now_in_auckland(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn test_valid_future_converted_to_utc() {
        let now = now_in_auckland("2025-06-15T09:00:00+12:00");
        let start = check_start_time(Some("2099-01-01T10:00:00+12:00"), &now);
        assert_eq!(start.status, TimeStatus::Valid);
        assert_eq!(start.value, "2098-12-31T22:00:00.000Z");
        assert!(!start.needs_confirmation());
        assert_eq!(start.reason(), None);
        assert_eq!(start.requested.as_deref(), Some("2099-01-01T10:00:00+12:00"));
    }

    #[test]
    fn test_unparseable_uses_fallback() {
        let now = now_in_auckland("2025-06-15T21:30:00+12:00");
        let start = check_start_time(Some("not-a-date"), &now);
        assert_eq!(start.status, TimeStatus::Invalid);
        assert!(start.needs_confirmation());
        assert_eq!(start.reason(), Some("Invalid date"));
        // 2025-06-16 10:00 +12:00
        assert_eq!(start.value, "2025-06-15T22:00:00.000Z");
        assert_eq!(start.requested.as_deref(), Some("not-a-date"));
    }

    #[test]
    fn test_missing_is_invalid() {
        let now = now_in_auckland("2025-06-15T09:00:00+12:00");
        let start = check_start_time(None, &now);
        assert_eq!(start.status, TimeStatus::Invalid);
        assert!(start.requested.is_none());
    }

    #[test]
    fn test_past_uses_fallback() {
        let now = now_in_auckland("2025-06-15T09:00:00+12:00");
        let start = check_start_time(Some("2025-06-14T10:00:00+12:00"), &now);
        assert_eq!(start.status, TimeStatus::Past);
        assert_eq!(start.reason(), Some("Past date"));
        assert_eq!(start.value, "2025-06-15T22:00:00.000Z");
    }

    #[test]
    fn test_exactly_now_is_valid() {
        let now = now_in_auckland("2025-06-15T09:00:00+12:00");
        let start = check_start_time(Some("2025-06-15T09:00:00+12:00"), &now);
        assert_eq!(start.status, TimeStatus::Valid);
    }

    #[test]
    fn test_fallback_is_always_future() {
        let tz = auckland();
        for hour in [0, 9, 10, 11, 23] {
            let now = tz.with_ymd_and_hms(2025, 3, 1, hour, 59, 59).unwrap();
            let fallback = fallback_start(&now);
            assert!(fallback > now.with_timezone(&Utc));
            assert_eq!(fallback.with_timezone(&tz).format("%d %H:%M").to_string(), "02 10:00");
        }
    }

    #[test]
    fn test_naive_time_read_in_local_zone() {
        let parsed = parse_timestamp("2030-05-01T14:30", &auckland()).unwrap();
        assert_eq!(to_iso(&parsed), "2030-05-01T02:30:00.000Z");
        let parsed = parse_timestamp("2030-05-01 14:30:00", &Utc).unwrap();
        assert_eq!(to_iso(&parsed), "2030-05-01T14:30:00.000Z");
    }

    #[test]
    fn test_other_accepted_formats() {
        let utc = Utc;
        assert_eq!(
            to_iso(&parse_timestamp("2030-05-01T14:30:00Z", &utc).unwrap()),
            "2030-05-01T14:30:00.000Z"
        );
        assert_eq!(
            to_iso(&parse_timestamp("2030-05-01T14:30:00+1200", &utc).unwrap()),
            "2030-05-01T02:30:00.000Z"
        );
        assert_eq!(
            to_iso(&parse_timestamp("Wed, 01 May 2030 14:30:00 +0000", &utc).unwrap()),
            "2030-05-01T14:30:00.000Z"
        );
        assert_eq!(
            to_iso(&parse_timestamp("2030-05-01", &auckland()).unwrap()),
            "2030-05-01T00:00:00.000Z"
        );
        assert!(parse_timestamp("tomorrow at 3", &utc).is_none());
        assert!(parse_timestamp("   ", &utc).is_none());
        assert!(parse_timestamp("2030-13-45T10:00:00Z", &utc).is_none());
    }

    #[test]
    fn test_minutes_only_with_zone() {
        let utc = Utc;
        assert_eq!(
            to_iso(&parse_timestamp("2099-01-01T10:00+12:00", &utc).unwrap()),
            "2098-12-31T22:00:00.000Z"
        );
        assert_eq!(
            to_iso(&parse_timestamp("2099-01-01T10:00Z", &utc).unwrap()),
            "2099-01-01T10:00:00.000Z"
        );
        assert_eq!(
            to_iso(&parse_timestamp("2099-01-01 10:00+12:00", &utc).unwrap()),
            "2098-12-31T22:00:00.000Z"
        );

        let now = now_in_auckland("2025-06-15T09:00:00+12:00");
        let start = check_start_time(Some("2099-01-01T10:00+12:00"), &now);
        assert_eq!(start.status, TimeStatus::Valid);
        assert_eq!(start.value, "2098-12-31T22:00:00.000Z");
        assert!(!start.needs_confirmation());

        let start = check_start_time(Some("2099-01-01T10:00Z"), &now);
        assert_eq!(start.status, TimeStatus::Valid);
        assert_eq!(start.value, "2099-01-01T10:00:00.000Z");
    }

    #[test]
    fn test_passthrough_keeps_string() {
        let start = passthrough("2099-01-01T10:00:00+12:00");
        assert_eq!(start.status, TimeStatus::Unchecked);
        assert_eq!(start.value, "2099-01-01T10:00:00+12:00");
        assert!(!start.needs_confirmation());
    }
}
