use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Task list as returned by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskList {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub is_owner: bool,
    #[serde(default)]
    pub is_shared: bool,
    /// `none`, `defaultList`, `flaggedEmails` or `unknownFutureValue`
    #[serde(default)]
    pub wellknown_list_name: Option<String>,
}

/// Find a list by display name (case-insensitive)
pub fn find_list<'a>(lists: &'a [TaskList], name: &str) -> Result<&'a TaskList> {
    let wanted = name.to_lowercase();
    lists
        .iter()
        .find(|list| list.display_name.to_lowercase() == wanted)
        .ok_or_else(|| anyhow!("could not find list '{}'", name))
}

/// `{ "value": [...] }` envelope around collections
#[derive(Debug, Clone, Deserialize)]
pub struct Collection<T> {
    pub value: Vec<T>,
}
