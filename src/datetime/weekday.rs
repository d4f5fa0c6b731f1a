//! Weekday resolution
//!
//! Turns "last Monday", "this fri", "next wed" or a bare weekday into a
//! calendar date relative to a reference day. Weekday indices count from
//! Sunday (Sunday = 0, Saturday = 6).

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Relative modifier attached to a weekday name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qualifier {
    /// Bare weekday: the occurrence inside the current Sunday-based week
    None,
    /// Zero to six days forward
    This,
    /// One to seven days back, never today
    Last,
    /// One to seven days forward, never today
    Next,
}

impl Qualifier {
    /// Recognise a qualifier word ("this", "last", "next")
    pub fn from_word(word: &str) -> Option<Self> {
        match word.to_lowercase().as_str() {
            "this" => Some(Qualifier::This),
            "last" => Some(Qualifier::Last),
            "next" => Some(Qualifier::Next),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Qualifier::None => "none",
            Qualifier::This => "this",
            Qualifier::Last => "last",
            Qualifier::Next => "next",
        }
    }
}

/// Weekday name prefixes, matched against the first three letters of a word
const WEEKDAY_PREFIXES: &[(&str, Weekday)] = &[
    ("mon", Weekday::Mon),
    ("tue", Weekday::Tue),
    ("wed", Weekday::Wed),
    ("thu", Weekday::Thu),
    ("fri", Weekday::Fri),
    ("sat", Weekday::Sat),
    ("sun", Weekday::Sun),
];

/// Match a word to a weekday by its first three letters (case-insensitive)
///
/// "Wednesday", "wed" and "wedge" all resolve to Wednesday.
pub fn weekday_from_prefix(word: &str) -> Option<Weekday> {
    let prefix: String = word.chars().take(3).collect::<String>().to_lowercase();
    WEEKDAY_PREFIXES
        .iter()
        .find(|(name, _)| *name == prefix)
        .map(|(_, weekday)| *weekday)
}

/// Modulo that is never negative for a positive divisor
pub fn floor_mod(dividend: i64, divisor: i64) -> i64 {
    dividend.rem_euclid(divisor)
}

/// Resolve a qualified weekday against `today`
pub fn resolve_weekday(qualifier: Qualifier, target: Weekday, today: NaiveDate) -> NaiveDate {
    let current = i64::from(today.weekday().num_days_from_sunday());
    let target = i64::from(target.num_days_from_sunday());

    let offset = match qualifier {
        // Plain index difference: no wraparound, stays within the current week
        Qualifier::None => target - current,
        Qualifier::This => floor_mod(target - current, 7),
        Qualifier::Last => {
            let back = floor_mod(current - target, 7);
            if back == 0 { -7 } else { -back }
        }
        Qualifier::Next => {
            let forward = floor_mod(target - current, 7);
            if forward == 0 { 7 } else { forward }
        }
    };

    today + Duration::days(offset)
}
