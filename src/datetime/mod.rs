//! Natural-language date parsing
//!
//! Resolves expressions such as "next Friday", "last Mon", "Jan 2" or
//! "02/Jan/2021 at 8:13pm" into concrete local times, relative to an
//! injected reference clock.

pub mod clock;
pub mod error;
pub mod layouts;
pub mod parser;
pub mod weekday;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::DateParseError;
pub use parser::{DateParser, ParseMode};
pub use weekday::{resolve_weekday, Qualifier};
