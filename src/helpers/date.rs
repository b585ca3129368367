//! Date helper functions
//!
//! Publication dates arrive from the content API as ISO 8601 strings and are
//! shown in a fixed locale using the medium date pattern ("PP" in date-fns
//! terms): `1 de mai de 2021` in pt-BR, `May 1, 2021` in en-US.

use chrono::{DateTime, Datelike, FixedOffset, TimeZone, Utc};
use chrono_tz::Tz;

/// Rendered in place of a timestamp that cannot be parsed
pub const INVALID_DATE: &str = "Invalid Date";

/// Supported display locales
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    PtBr,
    EnUs,
}

impl Locale {
    /// Resolve a BCP 47 language tag, defaulting to pt-BR
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "en" | "en-us" | "en_us" => Locale::EnUs,
            "pt" | "pt-br" | "pt_br" => Locale::PtBr,
            other => {
                tracing::warn!("Unsupported locale {:?}, using pt-BR", other);
                Locale::PtBr
            }
        }
    }

    /// Abbreviated month name (1-based month)
    fn month_abbr(self, month: u32) -> &'static str {
        const PT: [&str; 12] = [
            "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
        ];
        const EN: [&str; 12] = [
            "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
        ];
        let idx = (month.clamp(1, 12) - 1) as usize;
        match self {
            Locale::PtBr => PT[idx],
            Locale::EnUs => EN[idx],
        }
    }

    /// Medium date pattern
    pub fn medium_date<T: Datelike>(self, date: &T) -> String {
        let month = self.month_abbr(date.month());
        match self {
            Locale::PtBr => format!("{} de {} de {}", date.day(), month, date.year()),
            Locale::EnUs => format!("{} {}, {}", month, date.day(), date.year()),
        }
    }
}

/// Formats publication timestamps for display in one locale and timezone
#[derive(Debug, Clone, Copy)]
pub struct DateFormatter {
    locale: Locale,
    tz: Tz,
}

impl Default for DateFormatter {
    fn default() -> Self {
        Self::new(Locale::PtBr, chrono_tz::UTC)
    }
}

impl DateFormatter {
    pub fn new(locale: Locale, tz: Tz) -> Self {
        Self { locale, tz }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Format a raw publication timestamp.
    ///
    /// A missing timestamp is formatted as the Unix epoch, and a timestamp
    /// that cannot be parsed yields [`INVALID_DATE`]. Neither case is an error.
    pub fn format_publication_date(&self, raw: Option<&str>) -> String {
        let date = match raw {
            None => DateTime::<Utc>::UNIX_EPOCH.fixed_offset(),
            Some(raw) => match parse_timestamp(raw) {
                Some(date) => date,
                None => {
                    tracing::debug!("Unparseable publication date: {:?}", raw);
                    return INVALID_DATE.to_string();
                }
            },
        };
        self.format(&date)
    }

    /// Format a timestamp with the medium date pattern
    pub fn format<T: TimeZone>(&self, date: &DateTime<T>) -> String {
        self.locale.medium_date(&date.with_timezone(&self.tz))
    }
}

/// Parse an API timestamp.
///
/// Accepts RFC 3339 as well as the `+0000` offset form the content API emits.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
}

/// Format a date in ISO 8601 / XML format
pub fn date_xml<T: TimeZone>(date: &DateTime<T>) -> String
where
    T::Offset: std::fmt::Display,
{
    date.format("%Y-%m-%dT%H:%M:%S%.3f%:z").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pt_br_medium_date() {
        let f = DateFormatter::default();
        assert_eq!(
            f.format_publication_date(Some("2021-05-01T00:00:00Z")),
            "1 de mai de 2021"
        );
        assert_eq!(
            f.format_publication_date(Some("2021-12-25T19:25:28+0000")),
            "25 de dez de 2021"
        );
    }

    #[test]
    fn test_en_us_medium_date() {
        let f = DateFormatter::new(Locale::EnUs, chrono_tz::UTC);
        assert_eq!(
            f.format_publication_date(Some("2021-05-01T00:00:00Z")),
            "May 1, 2021"
        );
    }

    #[test]
    fn test_timezone_shifts_day() {
        let f = DateFormatter::new(Locale::PtBr, chrono_tz::America::Sao_Paulo);
        assert_eq!(
            f.format_publication_date(Some("2021-05-01T00:00:00Z")),
            "30 de abr de 2021"
        );
    }

    // A missing date is still formatted, against the epoch, rather than
    // being reported as absent.
    #[test]
    fn test_missing_date_formats_epoch() {
        let f = DateFormatter::default();
        assert_eq!(f.format_publication_date(None), "1 de jan de 1970");
    }

    #[test]
    fn test_garbage_date_is_invalid() {
        let f = DateFormatter::default();
        assert_eq!(f.format_publication_date(Some("yesterday")), INVALID_DATE);
        assert_eq!(f.format_publication_date(Some("")), INVALID_DATE);
    }

    #[test]
    fn test_locale_from_tag() {
        assert_eq!(Locale::from_tag("pt-BR"), Locale::PtBr);
        assert_eq!(Locale::from_tag("en"), Locale::EnUs);
        assert_eq!(Locale::from_tag("fr"), Locale::PtBr);
    }

    #[test]
    fn test_parse_timestamp_forms() {
        assert!(parse_timestamp("2021-03-25T19:25:28+0000").is_some());
        assert!(parse_timestamp("2021-03-25T19:25:28.123Z").is_some());
        assert!(parse_timestamp("2021-03-25").is_none());
    }

    #[test]
    fn test_date_xml() {
        let date = parse_timestamp("2021-03-25T19:25:28+0000").unwrap();
        assert_eq!(date_xml(&date), "2021-03-25T19:25:28.000+00:00");
    }
}
