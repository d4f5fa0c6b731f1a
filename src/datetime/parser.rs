//! Token parser: one date expression to one instant
//!
//! Resolution order:
//!
//! 1. Fixed layouts (date-only, or date+time in `DateTime` mode). A layout
//!    without a year takes the reference clock's year.
//! 2. Weekday phrase: optional qualifier (`this`/`last`/`next`) followed by
//!    a weekday recognised by its first three letters.
//! 3. In `DateTime` mode the weekday date is combined with a clock time
//!    found anywhere in the text ("next friday at 8:13pm").

use std::sync::OnceLock;

use chrono::format::{parse, Parsed, StrftimeItems};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use log::debug;
use regex::Regex;

use crate::datetime::clock::{Clock, SystemClock};
use crate::datetime::error::DateParseError;
use crate::datetime::layouts::{datetime_layouts, has_time, has_year, DATE_LAYOUTS, TIME_LAYOUTS};
use crate::datetime::weekday::{resolve_weekday, weekday_from_prefix, Qualifier};

/// Characters stripped from both ends of every expression
pub const PARSER_CUTSET: &[char] = &['[', ']', ' ', '\'', '"'];

/// Whether an expression should resolve to a date or to a date and time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Date,
    DateTime,
}

/// Date expression parser bound to a reference clock
pub struct DateParser {
    clock: Box<dyn Clock>,
}

impl DateParser {
    pub fn new(clock: impl Clock + 'static) -> Self {
        DateParser { clock: Box::new(clock) }
    }

    /// Parser reading the system's local time
    pub fn system() -> Self {
        Self::new(SystemClock)
    }

    /// Current reference time (one clock read)
    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    /// Parse a date-only expression; the result is at midnight
    pub fn parse_date(&self, input: &str) -> Result<NaiveDateTime, DateParseError> {
        self.parse(input, ParseMode::Date)
    }

    /// Parse an expression that must carry a clock time
    pub fn parse_datetime(&self, input: &str) -> Result<NaiveDateTime, DateParseError> {
        self.parse(input, ParseMode::DateTime)
    }

    pub fn parse(&self, input: &str, mode: ParseMode) -> Result<NaiveDateTime, DateParseError> {
        parse_token(input, mode, self.now())
    }
}

impl std::fmt::Debug for DateParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DateParser").finish_non_exhaustive()
    }
}

/// Lowercase, strip the cutset and collapse inner whitespace
pub fn normalize(input: &str) -> String {
    input
        .trim_matches(PARSER_CUTSET)
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse one expression against an already-read reference time
pub(crate) fn parse_token(input: &str, mode: ParseMode, now: NaiveDateTime) -> Result<NaiveDateTime, DateParseError> {
    let text = normalize(input);
    let today = now.date();

    match mode {
        ParseMode::Date => {
            if let Some(date) = match_layouts(&text, DATE_LAYOUTS.iter().copied(), today.year()) {
                return Ok(date);
            }
            let date = parse_weekday_phrase(&text, today).map_err(|err| classify_failure(&text, err))?;
            Ok(date.and_time(NaiveTime::MIN))
        }
        ParseMode::DateTime => {
            if let Some(datetime) = match_layouts(&text, datetime_layouts().iter().map(String::as_str), today.year()) {
                return Ok(datetime);
            }
            // An absolute date that parsed on its own is only missing the time
            if match_layouts(&text, DATE_LAYOUTS.iter().copied(), today.year()).is_some() {
                return Err(DateParseError::InvalidTime(text));
            }
            let date = parse_weekday_phrase(&text, today).map_err(|err| classify_failure(&text, err))?;
            let time = extract_time(&text)?;
            Ok(date.and_time(time))
        }
    }
}

/// Weekday phrases never contain digits or slashes; text that does was an
/// absolute date that matched no layout.
fn classify_failure(text: &str, err: DateParseError) -> DateParseError {
    let without_times = time_regex().replace_all(text, " ");
    if without_times.chars().any(|c| c.is_ascii_digit() || c == '/') {
        DateParseError::InvalidDate(text.to_string())
    } else {
        err
    }
}

/// `%Y` takes any number of digits. Day, month and clock fields are at
/// most two digits, so a full year is the only run of exactly four.
fn has_four_digit_run(text: &str) -> bool {
    text.split(|c: char| !c.is_ascii_digit()).any(|run| run.len() == 4)
}

fn match_layouts<'a>(text: &str, layouts: impl Iterator<Item = &'a str>, year: i32) -> Option<NaiveDateTime> {
    for layout in layouts {
        if let Some(datetime) = parse_with_layout(text, layout, year) {
            debug!("'{}' matched layout '{}'", text, layout);
            return Some(datetime);
        }
    }
    None
}

/// Parse the whole text with one layout; year-less layouts take `year`
fn parse_with_layout(text: &str, layout: &str, year: i32) -> Option<NaiveDateTime> {
    let mut parsed = Parsed::new();
    parse(&mut parsed, text, StrftimeItems::new(layout)).ok()?;

    if !has_year(layout) {
        parsed.set_year(i64::from(year)).ok()?;
    } else if layout.contains("%Y") && !has_four_digit_run(text) {
        return None;
    }

    let date = parsed.to_naive_date().ok()?;
    let time = if has_time(layout) {
        parsed.to_naive_time().ok()?
    } else {
        NaiveTime::MIN
    };
    Some(date.and_time(time))
}

/// Resolve "[qualifier] weekday" against `today`
///
/// Clock times and the connectives "at"/"on" are skipped, so
/// "8:13pm on next fri" and "next friday at 8:13 pm" both find Friday.
pub fn parse_weekday_phrase(text: &str, today: NaiveDate) -> Result<NaiveDate, DateParseError> {
    let text = normalize(text);
    let without_times = time_regex().replace_all(&text, " ");
    let mut words = without_times
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|word| !word.is_empty() && !is_filler_word(word));

    let first = words.next();
    let (qualifier, day) = match first.and_then(Qualifier::from_word) {
        Some(qualifier) => (qualifier, words.next()),
        None => (Qualifier::None, first),
    };

    let day = day.unwrap_or_default();
    if day.chars().count() < 3 {
        return Err(DateParseError::DayTooShort(text));
    }

    let weekday = weekday_from_prefix(day).ok_or_else(|| DateParseError::InvalidDay(text.clone()))?;
    debug!("'{}' resolved as {} {}", text, qualifier.as_str(), weekday);

    Ok(resolve_weekday(qualifier, weekday, today))
}

fn is_filler_word(word: &str) -> bool {
    matches!(word, "at" | "on")
}

fn time_regex() -> &'static Regex {
    static TIME_RE: OnceLock<Regex> = OnceLock::new();
    TIME_RE.get_or_init(|| {
        Regex::new(r"\b\d{1,2}:\d{2}(?:\s*[ap]m)?\b").expect("time pattern is a valid regex")
    })
}

/// Find the first clock time in the text and read it with a time layout
pub fn extract_time(text: &str) -> Result<NaiveTime, DateParseError> {
    let text = normalize(text);
    let found = time_regex()
        .find(&text)
        .ok_or_else(|| DateParseError::InvalidTime(text.clone()))?;
    let candidate = found.as_str();

    TIME_LAYOUTS
        .iter()
        .find_map(|layout| NaiveTime::parse_from_str(candidate, layout).ok())
        .ok_or_else(|| DateParseError::InvalidTime(text.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datetime::clock::FixedClock;

    // Wednesday 7 July 2021
    fn parser() -> DateParser {
        DateParser::new(FixedClock::new(date(7, 7)))
    }

    fn date(day: u32, month: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, month, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn jan_2() -> NaiveDateTime {
        date(2, 1)
    }

    fn jan_2_evening() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 1, 2)
            .unwrap()
            .and_hms_opt(20, 13, 0)
            .unwrap()
    }

    #[test]
    fn test_date_layouts() {
        let parser = parser();
        for input in [
            "02/Jan/2021",
            "02/JAN/2021",
            "02-Jan-2021",
            "02-JAN-2021",
            "02-Jan-21",
            "02-JAN-21",
            "2/Jan/2021",
            "2/JAN/2021",
            "02/01/2021",
            "2/01/2021",
            "2/01",
            "02-Jan 2021",
            "02-Jan",
            "Jan 02, 2021",
            "Jan 02",
            "Jan 2",
            "January 02, 2021",
        ] {
            assert_eq!(parser.parse_date(input), Ok(jan_2()), "input: {}", input);
        }
    }

    #[test]
    fn test_datetime_layouts() {
        let parser = parser();
        for input in [
            "02/Jan/2021 at 20:13",
            "02/JAN/2021, at 20:13",
            "02-Jan-2021 20:13",
            "02-JAN-2021, 20:13",
            "20:13 02-Jan-21",
            "20:13, 02-JAN-21",
            "2/Jan/2021 at 08:13 PM",
            "2/JAN/2021 at 08:13 pm",
            "02/01/2021 at 08:13PM",
            "2/01/2021 at 08:13pm",
            "2/01, 08:13pm",
            "8:13PM, 02-Jan 2021",
            "8:13pm, 02-Jan",
            "08:13PM on Jan 02, 2021",
            "08:13 pm, on Jan 02",
            "Jan 2 8:13PM",
            "January 02, 2021, 8:13pm",
        ] {
            assert_eq!(parser.parse_datetime(input), Ok(jan_2_evening()), "input: {}", input);
        }
    }

    #[test]
    fn test_year_fixup_uses_reference_year() {
        let parser = DateParser::new(FixedClock::new(
            NaiveDate::from_ymd_opt(2030, 3, 1).unwrap().and_hms_opt(12, 0, 0).unwrap(),
        ));
        assert_eq!(
            parser.parse_date("Jan 2"),
            Ok(NaiveDate::from_ymd_opt(2030, 1, 2).unwrap().and_hms_opt(0, 0, 0).unwrap())
        );
        assert_eq!(
            parser.parse_date("02/Jan/2021"),
            Ok(jan_2()),
            "explicit years are kept"
        );
    }

    #[test]
    fn test_weekday_phrases_in_date_mode() {
        let parser = parser();
        assert_eq!(parser.parse_date("last Mon"), Ok(date(5, 7)));
        assert_eq!(parser.parse_date("Monday"), Ok(date(5, 7)));
        assert_eq!(parser.parse_date("last Wednesday"), Ok(date(30, 6)));
        assert_eq!(parser.parse_date("next wed"), Ok(date(14, 7)));
        assert_eq!(parser.parse_date("this sun"), Ok(date(11, 7)));
        assert_eq!(parser.parse_date("  'Friday'  "), Ok(date(9, 7)));
        assert_eq!(parser.parse_date("next   friday"), Ok(date(9, 7)));
    }

    #[test]
    fn test_weekday_with_time() {
        let parser = parser();
        let friday_evening = NaiveDate::from_ymd_opt(2021, 7, 9)
            .unwrap()
            .and_hms_opt(20, 13, 0)
            .unwrap();
        assert_eq!(parser.parse_datetime("next Friday at 8:13pm"), Ok(friday_evening));
        assert_eq!(parser.parse_datetime("next friday at 8:13 PM"), Ok(friday_evening));
        assert_eq!(parser.parse_datetime("Friday 20:13"), Ok(friday_evening));
        assert_eq!(parser.parse_datetime("8:13pm on next fri"), Ok(friday_evening));
    }

    #[test]
    fn test_datetime_mode_requires_a_time() {
        let parser = parser();
        assert!(matches!(parser.parse_datetime("next friday"), Err(DateParseError::InvalidTime(_))));
        assert!(matches!(parser.parse_datetime("02/Jan/2021"), Err(DateParseError::InvalidTime(_))));
    }

    #[test]
    fn test_failures_name_the_stage() {
        let parser = parser();
        assert!(matches!(parser.parse_date("garbage"), Err(DateParseError::InvalidDay(_))));
        assert!(matches!(parser.parse_date("day"), Err(DateParseError::InvalidDay(_))));
        assert!(matches!(parser.parse_date("mo"), Err(DateParseError::DayTooShort(_))));
        assert!(matches!(parser.parse_date("last"), Err(DateParseError::DayTooShort(_))));
        assert!(matches!(parser.parse_date(""), Err(DateParseError::DayTooShort(_))));
        assert!(matches!(parser.parse_date("32/13/2021"), Err(DateParseError::InvalidDate(_))));
        for short_year in ["02/Jan/21", "02/01/21", "2/01/202", "Jan 02, 21", "January 02, 021", "02/01/20210"] {
            assert!(
                matches!(parser.parse_date(short_year), Err(DateParseError::InvalidDate(_))),
                "input: {}",
                short_year
            );
        }
        assert!(matches!(parser.parse_datetime("02/01/21 at 8:13pm"), Err(DateParseError::InvalidDate(_))));
        assert!(matches!(parser.parse_datetime("garbage"), Err(DateParseError::InvalidDay(_))));
    }

    #[test]
    fn test_extract_time() {
        assert_eq!(extract_time("at 20:13"), Ok(NaiveTime::from_hms_opt(20, 13, 0).unwrap()));
        assert_eq!(extract_time("8:13 pm"), Ok(NaiveTime::from_hms_opt(20, 13, 0).unwrap()));
        assert_eq!(extract_time("12:05am"), Ok(NaiveTime::from_hms_opt(0, 5, 0).unwrap()));
        assert!(extract_time("no time here").is_err());
        assert!(extract_time("25:99").is_err());
    }

    #[test]
    fn test_canonical_output_reparses_to_same_date() {
        let parser = parser();
        for input in ["next thu", "last sat", "Jan 2", "this mon"] {
            let resolved = parser.parse_date(input).unwrap();
            let canonical = resolved.format("%d/%b/%Y").to_string();
            assert_eq!(parser.parse_date(&canonical), Ok(resolved), "canonical: {}", canonical);
        }
    }
}
