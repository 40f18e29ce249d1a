use {
    crate::constants::RFC1123_FORMAT,
    chrono::{format::ParseResult, DateTime, Utc},
};

/// Parse the RFC 1123 dates found in HTTP `date` headers, e.g. `Sun, 05 Jan 2014 21:31:40 GMT`.
pub trait ParseRFC1123<T> {
    fn parse_from_rfc1123(s: &str) -> ParseResult<T>;
}

impl ParseRFC1123<DateTime<Utc>> for DateTime<Utc> {
    fn parse_from_rfc1123(s: &str) -> ParseResult<DateTime<Utc>> {
        // RFC 1123 is a profile of RFC 2822; chrono also checks that the weekday agrees with the date.
        DateTime::parse_from_rfc2822(s.trim()).map(|dt| dt.with_timezone(&Utc))
    }
}

/// Format a timestamp for use in a `date` header.
pub(crate) fn format_rfc1123(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(RFC1123_FORMAT).to_string()
}
