//! Date filters and the year shortcode used by page templates.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use std::fmt::Display;

/// Formats a timestamp as `dd LLL yyyy` (e.g. `05 Mar 2024`) in `zone`.
pub fn readable_date<Tz>(date: &DateTime<Utc>, zone: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    date.with_timezone(zone).format("%d %b %Y").to_string()
}

/// Formats a timestamp as a valid HTML date string (`yyyy-mm-dd`) in `zone`.
pub fn html_date_string<Tz>(date: &DateTime<Utc>, zone: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    date.with_timezone(zone).format("%Y-%m-%d").to_string()
}

/// Year shortcode: the current calendar year (UTC) as text.
pub fn current_year() -> String {
    Utc::now().year().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn march_fifth_late_evening() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 23, 30, 0).unwrap()
    }

    #[test]
    fn readable_date_in_utc() {
        assert_eq!(readable_date(&march_fifth_late_evening(), &Utc), "05 Mar 2024");
    }

    #[test]
    fn html_date_string_in_utc() {
        assert_eq!(
            html_date_string(&march_fifth_late_evening(), &Utc),
            "2024-03-05"
        );
    }

    #[test]
    fn zone_shifts_the_calendar_day() {
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let date = march_fifth_late_evening();
        assert_eq!(readable_date(&date, &tokyo), "06 Mar 2024");
        assert_eq!(html_date_string(&date, &tokyo), "2024-03-06");
    }

    #[test]
    fn current_year_is_four_digits() {
        let year = current_year();
        assert_eq!(year.len(), 4);
        assert!(year.parse::<i32>().unwrap() >= 2024);
    }
}
