use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::models::graph_time;

/// Task status (service lifecycle state)
///
/// The wire form is camelCase (`notStarted`); users see and type
/// space-separated words (`not started`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Completed,
    WaitingOnOthers,
    Deferred,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::NotStarted,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::WaitingOnOthers,
        TaskStatus::Deferred,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "not started",
            TaskStatus::InProgress => "in progress",
            TaskStatus::Completed => "completed",
            TaskStatus::WaitingOnOthers => "waiting on others",
            TaskStatus::Deferred => "deferred",
        }
    }

    /// Parse the user-facing form (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.to_lowercase();
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }

    pub fn as_wire(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "notStarted",
            TaskStatus::InProgress => "inProgress",
            TaskStatus::Completed => "completed",
            TaskStatus::WaitingOnOthers => "waitingOnOthers",
            TaskStatus::Deferred => "deferred",
        }
    }

    pub fn from_wire(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_wire() == s)
    }

    pub fn options() -> String {
        let names: Vec<&str> = Self::ALL.iter().map(|status| status.as_str()).collect();
        format!("[{}]", names.join(", "))
    }
}

impl Serialize for TaskStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire())
    }
}

impl<'de> Deserialize<'de> for TaskStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        TaskStatus::from_wire(&s).ok_or_else(|| serde::de::Error::custom(format!("unknown task status '{}'", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Low,
    #[default]
    Normal,
    High,
}

impl Importance {
    pub const ALL: [Importance; 3] = [Importance::Low, Importance::Normal, Importance::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Importance::Low => "low",
            Importance::Normal => "normal",
            Importance::High => "high",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.to_lowercase();
        Self::ALL.into_iter().find(|importance| importance.as_str() == s)
    }

    pub fn options() -> String {
        let names: Vec<&str> = Self::ALL.iter().map(|importance| importance.as_str()).collect();
        format!("[{}]", names.join(", "))
    }
}

/// Task as returned by the service
///
/// Optional times are local wall-clock times; created and last-modified
/// are UTC instants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoTask {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub importance: Importance,
    #[serde(default)]
    pub is_reminder_on: bool,
    pub status: TaskStatus,
    #[serde(default, with = "graph_time::optional")]
    pub reminder_date_time: Option<NaiveDateTime>,
    #[serde(default, with = "graph_time::optional")]
    pub due_date_time: Option<NaiveDateTime>,
    #[serde(default, with = "graph_time::optional")]
    pub completed_date_time: Option<NaiveDateTime>,
    pub created_date_time: DateTime<Utc>,
    pub last_modified_date_time: DateTime<Utc>,
}

/// Body of a task creation request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    pub importance: Importance,
    pub is_reminder_on: bool,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none", with = "graph_time::optional")]
    pub reminder_date_time: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none", with = "graph_time::optional")]
    pub due_date_time: Option<NaiveDateTime>,
}

impl NewTask {
    pub fn new(title: String) -> Self {
        Self {
            title,
            importance: Importance::Normal,
            is_reminder_on: false,
            status: TaskStatus::NotStarted,
            reminder_date_time: None,
            due_date_time: None,
        }
    }

    /// Set the reminder; this also turns the reminder on
    pub fn with_reminder(mut self, reminder: NaiveDateTime) -> Self {
        self.reminder_date_time = Some(reminder);
        self.is_reminder_on = true;
        self
    }

    pub fn with_due_date(mut self, due: NaiveDateTime) -> Self {
        self.due_date_time = Some(due);
        self
    }
}
