use chrono::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid duration: {0:?}. Use forms like 2h, 45m or 1h15m")]
pub struct InvalidDuration(pub String);

/// Parses the compact duration forms used in notes: `1h15m`, `2h`, `45m`.
/// Case-insensitive. Anything else, including bare numbers and decimal
/// hours, is rejected.
pub fn parse_duration(s: &str) -> Result<Duration, InvalidDuration> {
    let normalized = s.trim().to_lowercase();
    let err = || InvalidDuration(s.to_string());

    let parse_int = |v: &str| v.parse::<i64>().map_err(|_| err());

    if let Some((hours, rest)) = normalized.split_once('h') {
        let hours = parse_int(hours)?;
        let minutes = match rest {
            "" => 0,
            rest => parse_int(rest.strip_suffix('m').ok_or_else(err)?)?,
        };
        return Ok(Duration::hours(hours) + Duration::minutes(minutes));
    }

    if let Some(minutes) = normalized.strip_suffix('m') {
        return Ok(Duration::minutes(parse_int(minutes)?));
    }

    Err(err())
}

/// Renders a duration the way note files carry it: `1h15m`, `2h`, `45m`,
/// and `0m` for zero. Zero components are omitted.
pub fn format_duration(d: Duration) -> String {
    let hours = d.num_hours();
    let minutes = d.num_minutes() % 60;

    match (hours, minutes) {
        (0, 0) => "0m".to_string(),
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h{m}m"),
    }
}
