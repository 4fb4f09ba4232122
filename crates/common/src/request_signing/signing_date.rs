//! Timestamps embedded in request digests.

use chrono::{DateTime, SecondsFormat, Utc};

/// Formats `instant` as ISO-8601 UTC with whole seconds and a literal `Z`,
/// e.g. `2021-10-09T05:02:38Z`.
#[must_use]
pub fn format_signing_date(instant: DateTime<Utc>) -> String {
    let formatted = instant.to_rfc3339_opts(SecondsFormat::Secs, true);
    match formatted.strip_suffix("+00:00") {
        Some(prefix) => format!("{prefix}Z"),
        None => formatted,
    }
}

/// The current time formatted for signing.
#[must_use]
pub fn current_signing_date() -> String {
    format_signing_date(Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_signing_date_truncates_fraction() {
        let instant = Utc
            .with_ymd_and_hms(2020, 4, 10, 14, 21, 40)
            .unwrap()
            .checked_add_signed(chrono::Duration::milliseconds(999))
            .unwrap();

        assert_eq!(format_signing_date(instant), "2020-04-10T14:21:40Z");
    }

    #[test]
    fn test_current_signing_date_shape() {
        let date = current_signing_date();

        assert!(date.ends_with('Z'));
        assert!(!date.contains("+00:00"));
        assert!(!date.contains('.'));
        assert_eq!(date.len(), "2021-10-09T05:02:38Z".len());
        assert!(DateTime::parse_from_rfc3339(&date).is_ok());
    }
}
