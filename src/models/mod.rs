// Records exchanged with the task service

pub mod graph_time;
pub mod list;
pub mod task;

pub use graph_time::DateTimeTimeZone;
pub use list::*;
pub use task::*;
