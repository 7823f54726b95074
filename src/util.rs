//! Small helpers shared by the plugin host.

use chrono::{DateTime, TimeDelta, Utc};

/// Render the time elapsed between `then` and `now` in words.
pub fn human_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(then);
    if diff < TimeDelta::zero() {
        return "in the future?".to_string();
    }

    let days = diff.num_days();
    let seconds = diff.num_seconds() - days * 86_400;

    match days {
        0 => match seconds {
            0..10 => "just now".to_string(),
            10..60 => format!("{seconds} seconds ago"),
            60..120 => "a minute ago".to_string(),
            120..3600 => format!("{} minutes ago", seconds / 60),
            3600..7200 => "an hour ago".to_string(),
            _ => format!("{} hours ago", seconds / 3600),
        },
        1 => "Yesterday".to_string(),
        2..7 => format!("{days} days ago"),
        7..31 => format!("{} weeks ago", days / 7),
        31..365 => format!("{} months ago", days / 30),
        _ => format!("{} years ago", days / 365),
    }
}

/// [`human_time`] for a Unix timestamp against the current clock.
pub fn human_time_since(unix_seconds: i64) -> String {
    match DateTime::from_timestamp(unix_seconds, 0) {
        Some(then) => human_time(then, Utc::now()),
        None => "in the future?".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ago(seconds: i64) -> String {
        let now = Utc::now();
        human_time(now - TimeDelta::seconds(seconds), now)
    }

    #[test]
    fn test_same_day() {
        assert_eq!(ago(0), "just now");
        assert_eq!(ago(42), "42 seconds ago");
        assert_eq!(ago(90), "a minute ago");
        assert_eq!(ago(600), "10 minutes ago");
        assert_eq!(ago(3700), "an hour ago");
        assert_eq!(ago(5 * 3600), "5 hours ago");
    }

    #[test]
    fn test_days_and_beyond() {
        let day = 86_400;
        assert_eq!(ago(day + 5), "Yesterday");
        assert_eq!(ago(3 * day), "3 days ago");
        assert_eq!(ago(15 * day), "2 weeks ago");
        assert_eq!(ago(95 * day), "3 months ago");
        assert_eq!(ago(800 * day), "2 years ago");
    }

    #[test]
    fn test_future() {
        assert_eq!(ago(-30), "in the future?");
    }
}
