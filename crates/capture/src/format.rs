//! Parsing and display formatting of raw debug-output lines.
//!
//! Producers emit lines of the shape
//! `<iso-timestamp>,<field>,<thread-id>,<LEVEL> <message>`. The timestamp is
//! carried as UTC and rendered in local time.

use crate::Error;
use chrono::{Local, NaiveDateTime};
use std::fmt;

/// Strict timestamp prefix layout, `YYYY-MM-DDTHH:MM:SS`.
const ISO_PREFIX_LEN: usize = 19;
const ISO_PREFIX_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Number of suffix characters (fractional seconds/zone) forwarded verbatim
/// after the fixed prefix.
const SUFFIX_LEN: usize = 4;

/// A structured log line recovered from a raw debug message.
///
/// `timestamp` is already in display form (local time); the remaining fields
/// are carried through from the producer untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLogLine {
    pub timestamp: String,
    pub thread_id: String,
    pub level: String,
    pub message: String,
}

impl fmt::Display for ParsedLogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - Thread ID {} - Level {} - {}",
            self.timestamp, self.thread_id, self.level, self.message
        )
    }
}

/// Convert an ISO-style timestamp prefix to local display time.
///
/// The first 19 characters must match `YYYY-MM-DDTHH:MM:SS` exactly and are
/// interpreted as UTC. Up to 4 characters following the prefix (typically
/// `.123` fractional seconds) are appended verbatim, unvalidated.
///
/// ```
/// let shown = capture::format::format_timestamp("2024-01-15T10:30:00.123").unwrap();
/// assert!(shown.ends_with(".123"));
/// ```
pub fn format_timestamp(iso_prefix: &str) -> Result<String, Error> {
    let head = iso_prefix
        .get(..ISO_PREFIX_LEN)
        .ok_or_else(|| Error::MalformedTimestamp(iso_prefix.to_owned()))?;
    let naive = NaiveDateTime::parse_from_str(head, ISO_PREFIX_FORMAT)
        .map_err(|_| Error::MalformedTimestamp(iso_prefix.to_owned()))?;
    let local = naive.and_utc().with_timezone(&Local);

    let suffix: String = iso_prefix[ISO_PREFIX_LEN..].chars().take(SUFFIX_LEN).collect();
    Ok(format!("{}{suffix}", local.format(DISPLAY_FORMAT)))
}

/// Split a raw line on its first three commas and the space after the level
/// token.
///
/// Layout: timestamp before comma 1, thread id strictly between commas 2
/// and 3, level from comma 3 to the next space, message after that space.
/// Anything that does not fit (fewer than three commas, no space after the
/// level, bad timestamp) fails and the caller drops the whole line.
pub fn parse_structured_line(raw: &str) -> Result<ParsedLogLine, Error> {
    let pos1 = raw.find(',').ok_or(Error::UnparseableLine)?;
    let pos2 = find_from(raw, pos1 + 1, ',').ok_or(Error::UnparseableLine)?;
    let pos3 = find_from(raw, pos2 + 1, ',').ok_or(Error::UnparseableLine)?;

    let timestamp = format_timestamp(&raw[..pos1])?;
    let thread_id = raw[pos2 + 1..pos3].to_owned();

    let rest = &raw[pos3 + 1..];
    // A line with no space after the level token has no message field;
    // reject it.
    let space = rest.find(' ').ok_or(Error::UnparseableLine)?;
    let level = rest[..space].to_owned();
    let message = rest[space + 1..].to_owned();

    Ok(ParsedLogLine {
        timestamp,
        thread_id,
        level,
        message,
    })
}

fn find_from(haystack: &str, start: usize, needle: char) -> Option<usize> {
    haystack[start..].find(needle).map(|i| i + start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn formats_and_keeps_suffix() {
        let shown = format_timestamp("2024-01-15T10:30:00.123").unwrap();
        assert!(shown.ends_with(".123"), "suffix lost: {shown}");
        assert_eq!(shown.len(), ISO_PREFIX_LEN + SUFFIX_LEN);
    }

    #[test]
    fn roundtrips_calendar_moment_through_local_time() {
        let original = NaiveDateTime::parse_from_str("2024-01-15T10:30:00", ISO_PREFIX_FORMAT).unwrap();
        let shown = format_timestamp("2024-01-15T10:30:00.123").unwrap();

        let reparsed = NaiveDateTime::parse_from_str(&shown[..ISO_PREFIX_LEN], DISPLAY_FORMAT).unwrap();
        let back_to_utc = Local
            .from_local_datetime(&reparsed)
            .single()
            .unwrap()
            .with_timezone(&Utc)
            .naive_utc();
        assert_eq!(back_to_utc, original);
    }

    #[test]
    fn rejects_short_and_malformed_prefixes() {
        assert!(matches!(
            format_timestamp("2024-01-15"),
            Err(Error::MalformedTimestamp(_))
        ));
        assert!(matches!(
            format_timestamp("2024/01/15T10:30:00.000"),
            Err(Error::MalformedTimestamp(_))
        ));
        assert!(matches!(
            format_timestamp("not a timestamp at all!"),
            Err(Error::MalformedTimestamp(_))
        ));
    }

    #[test]
    fn parses_reference_line() {
        let line = parse_structured_line("2024-01-15T10:30:00.123,x,42,INFO hello world").unwrap();
        assert_eq!(line.thread_id, "42");
        assert_eq!(line.level, "INFO");
        assert_eq!(line.message, "hello world");
        assert_eq!(line.timestamp, format_timestamp("2024-01-15T10:30:00.123").unwrap());
    }

    #[test]
    fn display_shape_matches_output_contract() {
        let line = parse_structured_line("2024-06-01T12:00:00.000,tid,7,WARN low memory").unwrap();
        let shown = line.to_string();
        assert!(shown.contains("Thread ID 7 - Level WARN - low memory"), "{shown}");
    }

    #[test]
    fn too_few_commas_is_unparseable() {
        for raw in ["", "a", "a,b", "a,b,c", "2024-01-15T10:30:00.123,x,42"] {
            assert!(matches!(
                parse_structured_line(raw),
                Err(Error::UnparseableLine)
            ));
        }
    }

    #[test]
    fn missing_space_after_level_is_unparseable() {
        assert!(matches!(
            parse_structured_line("2024-01-15T10:30:00.123,x,42,INFO"),
            Err(Error::UnparseableLine)
        ));
    }

    #[test]
    fn bad_timestamp_drops_whole_line() {
        assert!(matches!(
            parse_structured_line("garbage,x,42,INFO hello"),
            Err(Error::MalformedTimestamp(_))
        ));
    }

    proptest! {
        #[test]
        fn never_panics_on_arbitrary_input(raw in ".*") {
            let _ = parse_structured_line(&raw);
        }

        #[test]
        fn fewer_than_three_commas_always_fails(raw in "[^,]*(,[^,]*){0,2}") {
            prop_assert!(matches!(
                parse_structured_line(&raw),
                Err(Error::UnparseableLine)
            ));
        }

        #[test]
        fn format_timestamp_never_panics(raw in ".*") {
            let _ = format_timestamp(&raw);
        }
    }
}
