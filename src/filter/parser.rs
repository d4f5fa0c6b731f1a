//! Range filter parser
//!
//! # Grammar
//!
//! ```text
//! range := part | part ";" part
//! part  := "start" token | "end" token
//! ```
//!
//! # Examples
//!
//! ```text
//! start monday
//! end 02/Jan/2021
//! start last mon; end next fri
//! end friday; start monday
//! ```
//!
//! Each token is parsed with the date parser. A label given twice keeps
//! the last value. Start and end are not checked against each other; an
//! inverted range simply matches nothing.

use log::debug;

use crate::datetime::error::DateParseError;
use crate::datetime::parser::{normalize, parse_token, DateParser, ParseMode};
use crate::filter::evaluator::DateRange;

/// Separator between the start and end parts
pub const RANGE_SEPARATOR: char = ';';

const START_LABEL: &str = "start";
const END_LABEL: &str = "end";

/// Parse a range expression, reading the parser's clock once
pub fn parse_range(parser: &DateParser, input: &str, mode: ParseMode) -> Result<DateRange, DateParseError> {
    let raw_parts: Vec<&str> = input.split(RANGE_SEPARATOR).collect();
    if raw_parts.len() > 2 {
        return Err(DateParseError::TooManyParts(input.to_string()));
    }

    if normalize(input).is_empty() {
        return Err(DateParseError::EmptyFilter);
    }
    // An empty part ("start monday;") has no label and fails below
    let parts: Vec<String> = raw_parts.iter().map(|part| normalize(part)).collect();

    let now = parser.now();
    let mut range = DateRange::default();

    for part in &parts {
        if let Some(token) = part.strip_prefix(START_LABEL) {
            range.start = Some(parse_token(token, mode, now)?);
        } else if let Some(token) = part.strip_prefix(END_LABEL) {
            range.end = Some(parse_token(token, mode, now)?);
        } else {
            return Err(DateParseError::MissingQualifier(part.clone()));
        }
    }

    debug!("range '{}' parsed as {:?}", input, range);
    Ok(range)
}

impl DateParser {
    /// Parse "start <token>; end <token>" into a range
    pub fn parse_range(&self, input: &str, mode: ParseMode) -> Result<DateRange, DateParseError> {
        parse_range(self, input, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datetime::clock::{Clock, FixedClock};
    use chrono::{NaiveDate, NaiveDateTime};
    use std::cell::Cell;
    use std::rc::Rc;

    fn reference() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 7, 7)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn parser() -> DateParser {
        DateParser::new(FixedClock::new(reference()))
    }

    fn july(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 7, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_start_and_end() {
        let range = parser().parse_range("start Monday; end Friday", ParseMode::Date).unwrap();
        assert_eq!(range.start, Some(july(5)));
        assert_eq!(range.end, Some(july(9)));
    }

    #[test]
    fn test_part_order_does_not_matter() {
        let parser = parser();
        let forward = parser.parse_range("start Monday; end Friday", ParseMode::Date).unwrap();
        let swapped = parser.parse_range("end Friday; start Monday", ParseMode::Date).unwrap();
        assert_eq!(forward, swapped);
    }

    #[test]
    fn test_open_ended_ranges() {
        let parser = parser();
        let start_only = parser.parse_range("start last mon", ParseMode::Date).unwrap();
        assert_eq!(start_only, DateRange { start: Some(july(5)), end: None });

        let end_only = parser.parse_range("[end 02/Jan/2021]", ParseMode::Date).unwrap();
        assert_eq!(end_only.start, None);
        assert_eq!(
            end_only.end,
            Some(NaiveDate::from_ymd_opt(2021, 1, 2).unwrap().and_hms_opt(0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_datetime_mode_bounds() {
        let range = parser()
            .parse_range("start Monday at 9:00; end Friday at 8:13pm", ParseMode::DateTime)
            .unwrap();
        assert_eq!(range.start, Some(july(5).date().and_hms_opt(9, 0, 0).unwrap()));
        assert_eq!(range.end, Some(july(9).date().and_hms_opt(20, 13, 0).unwrap()));
    }

    #[test]
    fn test_duplicate_label_last_write_wins() {
        let range = parser().parse_range("start monday; start friday", ParseMode::Date).unwrap();
        assert_eq!(range.start, Some(july(9)));
        assert_eq!(range.end, None);
    }

    #[test]
    fn test_empty_part_is_missing_qualifier() {
        let parser = parser();
        assert_eq!(
            parser.parse_range("start monday;", ParseMode::Date),
            Err(DateParseError::MissingQualifier(String::new()))
        );
        assert_eq!(
            parser.parse_range("; end friday", ParseMode::Date),
            Err(DateParseError::MissingQualifier(String::new()))
        );
        assert_eq!(
            parser.parse_range("  ;  ", ParseMode::Date),
            Err(DateParseError::MissingQualifier(String::new()))
        );
    }

    #[test]
    fn test_too_many_parts() {
        let parser = parser();
        assert!(matches!(parser.parse_range("a;b;c", ParseMode::Date), Err(DateParseError::TooManyParts(_))));
        assert!(matches!(
            parser.parse_range("start mon; end fri; end sat", ParseMode::Date),
            Err(DateParseError::TooManyParts(_))
        ));
        assert!(matches!(parser.parse_range(";;", ParseMode::Date), Err(DateParseError::TooManyParts(_))));
    }

    #[test]
    fn test_empty_filter() {
        let parser = parser();
        assert_eq!(parser.parse_range("", ParseMode::Date), Err(DateParseError::EmptyFilter));
        assert_eq!(parser.parse_range("   ", ParseMode::Date), Err(DateParseError::EmptyFilter));
        assert_eq!(parser.parse_range("''", ParseMode::Date), Err(DateParseError::EmptyFilter));
    }

    #[test]
    fn test_missing_qualifier() {
        let parser = parser();
        assert_eq!(
            parser.parse_range("monday", ParseMode::Date),
            Err(DateParseError::MissingQualifier("monday".to_string()))
        );
        assert!(matches!(
            parser.parse_range("start monday; friday", ParseMode::Date),
            Err(DateParseError::MissingQualifier(_))
        ));
    }

    #[test]
    fn test_token_errors_propagate() {
        let parser = parser();
        assert!(matches!(parser.parse_range("start garbage", ParseMode::Date), Err(DateParseError::InvalidDay(_))));
        assert!(matches!(parser.parse_range("end mo", ParseMode::Date), Err(DateParseError::DayTooShort(_))));
        assert!(matches!(parser.parse_range("end fri", ParseMode::DateTime), Err(DateParseError::InvalidTime(_))));
    }

    struct CountingClock {
        reads: Rc<Cell<usize>>,
    }

    impl Clock for CountingClock {
        fn now(&self) -> NaiveDateTime {
            self.reads.set(self.reads.get() + 1);
            reference()
        }
    }

    #[test]
    fn test_clock_read_once_per_range() {
        let reads = Rc::new(Cell::new(0));
        let parser = DateParser::new(CountingClock { reads: Rc::clone(&reads) });
        parser.parse_range("start monday; end friday", ParseMode::Date).unwrap();
        assert_eq!(reads.get(), 1);
    }
}
