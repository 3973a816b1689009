use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeDelta};

pub struct TimeUtils;

impl TimeUtils {
    pub const MS_IN_S: i64 = 1000;
    pub const MS_IN_MIN: i64 = Self::MS_IN_S * 60;
    pub const MS_IN_H: i64 = Self::MS_IN_MIN * 60;
    pub const MS_IN_D: i64 = Self::MS_IN_H * 24;
    pub const STANDARD_TIME_FORMAT: &str = "%Y-%m-%d";

    /// Offset-carrying layouts, tried in order after RFC 3339.
    const ZONED_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

    /// Naive layouts, read as UTC.
    const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
}

/// Parses an event timestamp, keeping its own UTC offset. Accepts RFC 3339,
/// `YYYY-MM-DD HH:MM:SS[.f][+zz:zz]` or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_event_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    for fmt in TimeUtils::ZONED_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    for fmt in TimeUtils::NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc().fixed_offset());
        }
    }
    NaiveDate::parse_from_str(raw, TimeUtils::STANDARD_TIME_FORMAT)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), TimeUtils::STANDARD_TIME_FORMAT).ok()
}

/// Shifts a date by a signed number of days, saturating at the calendar bounds.
pub fn shift_days(date: NaiveDate, days: i64) -> NaiveDate {
    let shifted = TimeDelta::try_days(days).and_then(|delta| date.checked_add_signed(delta));
    shifted.unwrap_or(if days < 0 {
        NaiveDate::MIN
    } else {
        NaiveDate::MAX
    })
}

/// Unix seconds at midnight UTC of `date`.
pub fn date_to_epoch_secs(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc().timestamp())
        .unwrap_or_default()
}

/// Exchange-local trading date for a bar stamped at `epoch_secs`, given the exchange's UTC offset.
pub fn epoch_secs_to_local_date(epoch_secs: i64, gmt_offset_secs: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(epoch_secs + gmt_offset_secs, 0).map(|dt| dt.date_naive())
}

pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn local_now_as_timestamp_ms() -> i64 {
    Local::now().timestamp_millis()
}

pub fn how_many_seconds_ago(past_timestamp_ms: i64) -> i64 {
    (local_now_as_timestamp_ms() - past_timestamp_ms) / TimeUtils::MS_IN_S
}

pub fn format_duration(ms: i64) -> String {
    let secs = ms / 1000;
    if secs < 60 {
        return format!("{}s", secs);
    }
    let mins = secs / 60;
    if mins < 60 {
        return format!("{}m", mins);
    }
    let hours = mins / 60;
    if hours < 24 {
        return format!("{}h", hours);
    }
    let days = hours / 24;
    format!("{}d", days)
}
