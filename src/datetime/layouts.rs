//! Accepted date and time layouts
//!
//! Layouts are chrono strftime patterns. Month names match
//! case-insensitively and `%d`/`%I` accept one or two digits, so a single
//! pattern covers "2/Jan/2021", "02/JAN/2021" and so on.
//!
//! Date+time layouts are the cross product of every date layout, every
//! time layout and the eight connectives below. The product is built once
//! on first use.

use std::sync::OnceLock;

/// Date-only layouts in the order they are tried
///
/// The two-digit-year form comes first: `%Y` also accepts "21" and would
/// otherwise read "02-Jan-21" as the year 21.
pub const DATE_LAYOUTS: &[&str] = &[
    "%d-%b-%y",
    "%d/%b/%Y",
    "%d-%b-%Y",
    "%d/%m/%Y",
    "%d/%m",
    "%d-%b %Y",
    "%d-%b",
    "%b %d, %Y",
    "%b %d",
    "%B %d, %Y",
    "%B %d",
];

/// Clock layouts: 24-hour, then 12-hour with and without a space before am/pm
pub const TIME_LAYOUTS: &[&str] = &["%H:%M", "%I:%M %p", "%I:%M%p"];

/// How a date and a time may be joined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    DateFirst(&'static str),
    TimeFirst(&'static str),
}

pub const CONNECTIVES: [Connective; 8] = [
    Connective::DateFirst(" at "),
    Connective::DateFirst(", at "),
    Connective::DateFirst(" "),
    Connective::DateFirst(", "),
    Connective::TimeFirst(" "),
    Connective::TimeFirst(", "),
    Connective::TimeFirst(" on "),
    Connective::TimeFirst(", on "),
];

impl Connective {
    pub fn join(&self, date: &str, time: &str) -> String {
        match self {
            Connective::DateFirst(sep) => format!("{}{}{}", date, sep, time),
            Connective::TimeFirst(sep) => format!("{}{}{}", time, sep, date),
        }
    }
}

/// All date+time layouts, in date-layout-major order
pub fn datetime_layouts() -> &'static [String] {
    static LAYOUTS: OnceLock<Vec<String>> = OnceLock::new();
    LAYOUTS.get_or_init(|| {
        let mut layouts = Vec::with_capacity(DATE_LAYOUTS.len() * TIME_LAYOUTS.len() * CONNECTIVES.len());
        for date in DATE_LAYOUTS {
            for time in TIME_LAYOUTS {
                for connective in CONNECTIVES {
                    layouts.push(connective.join(date, time));
                }
            }
        }
        layouts
    })
}

/// Whether the layout carries a year field
pub fn has_year(layout: &str) -> bool {
    layout.contains("%Y") || layout.contains("%y")
}

/// Whether the layout carries a clock time
pub fn has_time(layout: &str) -> bool {
    layout.contains("%H") || layout.contains("%I")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_datetime_layouts_are_full_cross_product() {
        let layouts = datetime_layouts();
        assert_eq!(layouts.len(), DATE_LAYOUTS.len() * TIME_LAYOUTS.len() * 8);

        let unique: HashSet<&String> = layouts.iter().collect();
        assert_eq!(unique.len(), layouts.len());
    }

    #[test]
    fn test_datetime_layouts_memoized() {
        let first = datetime_layouts().as_ptr();
        let second = datetime_layouts().as_ptr();
        assert_eq!(first, second);
    }

    #[test]
    fn test_connective_join() {
        assert_eq!(Connective::DateFirst(" at ").join("%d/%m", "%H:%M"), "%d/%m at %H:%M");
        assert_eq!(Connective::TimeFirst(", on ").join("%b %d", "%H:%M"), "%H:%M, on %b %d");
    }

    #[test]
    fn test_layout_classification() {
        assert!(has_year("%d-%b-%y"));
        assert!(has_year("%B %d, %Y"));
        assert!(!has_year("%d/%m"));
        assert!(has_time("%d/%m %I:%M%p"));
        assert!(!has_time("%d/%m/%Y"));
    }
}
