// Time display helpers

use chrono::{DateTime, Utc};

/// Format the rate-limit countdown as `M:SS`; empty string when open
pub fn format_countdown(remaining_secs: u64) -> String {
    if remaining_secs == 0 {
        return String::new();
    }
    format!("{}:{:02}", remaining_secs / 60, remaining_secs % 60)
}

/// Relative age for message timestamps
pub fn format_relative(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(timestamp);
    let secs = elapsed.num_seconds();

    if secs < 60 {
        "just now".to_string()
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else if secs < 86_400 {
        format!("{}h ago", secs / 3600)
    } else if secs < 7 * 86_400 {
        format!("{}d ago", secs / 86_400)
    } else {
        timestamp.format("%b %d, %Y").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_countdown_format() {
        assert_eq!(format_countdown(0), "");
        assert_eq!(format_countdown(5), "0:05");
        assert_eq!(format_countdown(60), "1:00");
        assert_eq!(format_countdown(95), "1:35");
        assert_eq!(format_countdown(600), "10:00");
    }

    #[test]
    fn test_relative_buckets() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let at = |secs: i64| now - chrono::Duration::seconds(secs);

        assert_eq!(format_relative(at(10), now), "just now");
        assert_eq!(format_relative(at(180), now), "3m ago");
        assert_eq!(format_relative(at(7200), now), "2h ago");
        assert_eq!(format_relative(at(3 * 86_400), now), "3d ago");
        assert_eq!(format_relative(at(30 * 86_400), now), "May 16, 2024");
    }
}
