use thiserror::Error;

/// Failure while turning a date expression into an instant or range
///
/// The variant tells which stage rejected the input. The payload is the
/// text that stage was looking at.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateParseError {
    #[error("empty filter")]
    EmptyFilter,
    #[error("too many parts in '{0}' (expected at most 2 separated by ';')")]
    TooManyParts(String),
    #[error("missing qualifier in '{0}' (each part must begin with 'start' or 'end')")]
    MissingQualifier(String),
    #[error("invalid date '{0}'")]
    InvalidDate(String),
    #[error("invalid time in '{0}' (expected H:MM or H:MM am/pm)")]
    InvalidTime(String),
    #[error("invalid day '{0}'")]
    InvalidDay(String),
    #[error("day too short in '{0}' (need at least 3 letters of a weekday)")]
    DayTooShort(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_input() {
        let err = DateParseError::MissingQualifier("monday".to_string());
        assert!(err.to_string().contains("monday"));
        assert!(err.to_string().contains("start"));

        let err = DateParseError::TooManyParts("a;b;c".to_string());
        assert!(err.to_string().contains("a;b;c"));
    }
}
