//! Range filters over task timestamps
//!
//! `parser` turns "start <date>; end <date>" into a `DateRange`;
//! `evaluator` applies ranges and regex filters to tasks.

pub mod evaluator;
pub mod parser;

pub use evaluator::{matches, DateRange, TaskFilter};
pub use parser::{parse_range, RANGE_SEPARATOR};
