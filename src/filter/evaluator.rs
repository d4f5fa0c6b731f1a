//! Filter evaluator
//!
//! Decides whether a task passes the filters given on the command line.
//!
//! # Filter Terms
//!
//! - `title` / `status` - regular expressions matched against the title and
//!   the user-facing status words
//! - `reminder`, `due`, `completed`, `created`, `last_modified` - date
//!   ranges; a configured range never matches a task without that time
//!
//! All terms must match.

use chrono::NaiveDateTime;
use regex::Regex;

use crate::models::graph_time::utc_to_local;
use crate::models::TodoTask;

/// Inclusive range with optional open ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl DateRange {
    /// Whether a present candidate lies within both bounds
    pub fn contains(&self, candidate: NaiveDateTime) -> bool {
        if let Some(start) = self.start {
            if candidate < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if candidate > end {
                return false;
            }
        }
        true
    }
}

/// Apply an optional range to an optional candidate
///
/// No range always matches; a range never matches an absent candidate.
pub fn matches(range: Option<&DateRange>, candidate: Option<NaiveDateTime>) -> bool {
    match (range, candidate) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(range), Some(candidate)) => range.contains(candidate),
    }
}

/// Every filter a task view can apply
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub title: Option<Regex>,
    pub status: Option<Regex>,
    pub reminder: Option<DateRange>,
    pub due: Option<DateRange>,
    pub completed: Option<DateRange>,
    pub created: Option<DateRange>,
    pub last_modified: Option<DateRange>,
}

impl TaskFilter {
    pub fn matches(&self, task: &TodoTask) -> bool {
        if let Some(title) = &self.title {
            if !title.is_match(&task.title) {
                return false;
            }
        }
        if let Some(status) = &self.status {
            if !status.is_match(task.status.as_str()) {
                return false;
            }
        }

        let checks = [
            (&self.reminder, task.reminder_date_time),
            (&self.due, task.due_date_time),
            (&self.completed, task.completed_date_time),
            (&self.created, Some(utc_to_local(task.created_date_time))),
            (&self.last_modified, Some(utc_to_local(task.last_modified_date_time))),
        ];
        checks
            .into_iter()
            .all(|(range, candidate)| matches(range.as_ref(), candidate))
    }

    /// Keep only the tasks that pass every filter
    pub fn apply<'a>(&self, tasks: &'a [TodoTask]) -> Vec<&'a TodoTask> {
        tasks.iter().filter(|task| self.matches(task)).collect()
    }
}
