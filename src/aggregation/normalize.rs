use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc, Weekday};

use crate::telemetry;

#[derive(Copy, Clone)]
enum Layout {
    /// chrono format string ending in `%z`
    Numeric(&'static str),
    /// chrono format string for everything before a trailing zone abbreviation
    Named(&'static str),
    /// `Mon, ` followed by the inner layout. The weekday must be spelled
    /// right but need not agree with the date.
    Weekday(&'static Layout),
    Rfc3339,
    /// Leading weekday optional and, when present, not checked against the date.
    Rfc2822,
}

// Tried in order; first match wins.
const LAYOUTS: &[Layout] = &[
    Layout::Weekday(&Layout::Numeric("%d %b %Y %H:%M:%S %z")), // Mon, 02 Jan 2006 15:04:05 -0700
    Layout::Weekday(&Layout::Named("%d %b %Y %H:%M:%S")),      // Mon, 02 Jan 2006 15:04:05 MST
    Layout::Numeric("%d %b %y %H:%M %z"),                      // 02 Jan 06 15:04 -0700
    Layout::Named("%d %b %y %H:%M"),                           // 02 Jan 06 15:04 MST
    Layout::Rfc3339,
    Layout::Rfc2822,
];

/// Parse an RSS `pubDate` into a UTC instant. Returns `None` for blank or
/// unrecognized input; the latter also emits a warning.
pub fn normalize_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    for layout in LAYOUTS {
        if let Some(dt) = parse_with(*layout, s) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    telemetry::agg().warn_kv("⚠️ unparsed pubDate", [("pub_date", format!("{:?}", raw))]);
    None
}

fn parse_with(layout: Layout, s: &str) -> Option<DateTime<FixedOffset>> {
    match layout {
        Layout::Numeric(fmt) => DateTime::parse_from_str(s, fmt).ok(),
        Layout::Named(fmt) => {
            let (rest, zone) = s.rsplit_once(char::is_whitespace)?;
            let offset = named_zone_offset(zone)?;
            let naive = NaiveDateTime::parse_from_str(rest.trim_end(), fmt).ok()?;
            offset.from_local_datetime(&naive).single()
        }
        Layout::Weekday(inner) => parse_with(*inner, strip_weekday(s)?),
        Layout::Rfc3339 => DateTime::parse_from_rfc3339(s).ok(),
        Layout::Rfc2822 => DateTime::parse_from_rfc2822(strip_weekday(s).unwrap_or(s)).ok(),
    }
}

/// `"Tue, 02 Jan ..."` -> `"02 Jan ..."`. `None` unless the prefix is a
/// three-letter weekday name.
fn strip_weekday(s: &str) -> Option<&str> {
    let (day, rest) = s.split_once(',')?;
    let day = day.trim();
    if day.len() != 3 || day.parse::<Weekday>().is_err() {
        return None;
    }
    Some(rest.trim_start())
}

/// Offset for a zone abbreviation. Unknown alphabetic abbreviations are read
/// as UTC; anything non-alphabetic is rejected so numeric offsets fall through.
fn named_zone_offset(zone: &str) -> Option<FixedOffset> {
    if zone.is_empty() || !zone.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let hours = match zone.to_ascii_uppercase().as_str() {
        "EST" => -5,
        "EDT" => -4,
        "CST" => -6,
        "CDT" => -5,
        "MST" => -7,
        "MDT" => -6,
        "PST" => -8,
        "PDT" => -7,
        _ => 0,
    };
    FixedOffset::east_opt(hours * 3600)
}
