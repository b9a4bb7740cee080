//! Local calendar day used to pick and key the daily puzzle.

use time::{Date, OffsetDateTime, macros::format_description};
use tracing::debug;

/// Format `date` as `DD.MM.YYYY`, the layout used by the catalog.
pub fn format_date(date: Date) -> String {
    let format = format_description!("[day].[month].[year]");
    date.format(format)
        .unwrap_or_else(|_| "invalid-date".into())
}

/// Today's date on the local wall clock, falling back to UTC when the offset is unknown.
pub fn today_local() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|err| {
        debug!(error = %err, "local offset unavailable; using UTC");
        OffsetDateTime::now_utc()
    });
    format_date(now.date())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn pads_day_and_month() {
        assert_eq!(format_date(date!(2025 - 03 - 05)), "05.03.2025");
        assert_eq!(format_date(date!(2024 - 12 - 31)), "31.12.2024");
    }

    #[test]
    fn today_matches_catalog_layout() {
        let today = today_local();
        let parts: Vec<&str> = today.split('.').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), 2);
        assert_eq!(parts[1].len(), 2);
        assert_eq!(parts[2].len(), 4);
    }
}
