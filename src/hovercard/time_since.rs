use chrono::{DateTime, Utc};

/// Humanized distance between `date` and `now`, e.g. "5 minutes ago".
pub fn time_since(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - date).num_seconds();
    let phrase = humanize(seconds.unsigned_abs());
    if seconds < 0 {
        format!("in {}", phrase)
    } else {
        format!("{} ago", phrase)
    }
}

fn humanize(seconds: u64) -> String {
    const MINUTE: u64 = 60;
    const HOUR: u64 = 60 * MINUTE;
    const DAY: u64 = 24 * HOUR;

    let rounded = |unit: u64| (seconds + unit / 2) / unit;

    match seconds {
        s if s < 45 => "a few seconds".to_string(),
        s if s < 90 => "a minute".to_string(),
        s if s < 45 * MINUTE => format!("{} minutes", rounded(MINUTE)),
        s if s < 90 * MINUTE => "an hour".to_string(),
        s if s < 22 * HOUR => format!("{} hours", rounded(HOUR)),
        s if s < 36 * HOUR => "a day".to_string(),
        s if s < 26 * DAY => format!("{} days", rounded(DAY)),
        s if s < 45 * DAY => "a month".to_string(),
        s if s < 320 * DAY => format!("{} months", rounded(30 * DAY).max(2)),
        s if s < 548 * DAY => "a year".to_string(),
        _ => format!("{} years", rounded(365 * DAY).max(2)),
    }
}
