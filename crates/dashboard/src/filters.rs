//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats a backend timestamp for display.
///
/// RFC 3339 input is shown as `YYYY-MM-DD HH:MM UTC`; anything else is shown
/// as received.
///
/// Usage in templates: `{{ key.created_at|datetime }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn datetime(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format_timestamp(&value.to_string()))
}

pub(crate) fn format_timestamp(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw.trim()).map_or_else(
        |_| raw.to_owned(),
        |ts| {
            ts.with_timezone(&chrono::Utc)
                .format("%Y-%m-%d %H:%M UTC")
                .to_string()
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp() {
        assert_eq!(
            format_timestamp("2024-03-05T14:07:09+05:30"),
            "2024-03-05 08:37 UTC"
        );
        assert_eq!(format_timestamp("yesterday"), "yesterday");
    }
}
