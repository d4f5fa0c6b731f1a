use log::debug;
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::models::{Collection, NewTask, TaskList, TodoTask};

const MAX_ERROR_BODY: usize = 240;

/// The service answered, but not with what was asked for
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{method} {path} failed: HTTP {status}{detail}")]
    Status {
        method: &'static str,
        path: String,
        status: StatusCode,
        detail: String,
    },
    #[error("could not decode the response to {method} {path}")]
    Decode {
        method: &'static str,
        path: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Bearer-authenticated client for the task service
pub struct GraphClient {
    http: Client,
    base_url: String,
    access_token: String,
}

impl GraphClient {
    pub fn new(base_url: &str, access_token: impl Into<String>) -> Self {
        GraphClient {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `GET /me/todo/lists`
    pub fn get_lists(&self) -> anyhow::Result<Vec<TaskList>> {
        let lists: Collection<TaskList> = self.get_json("/me/todo/lists")?;
        Ok(lists.value)
    }

    /// `GET /me/todo/lists/{id}/tasks`
    pub fn get_tasks(&self, list_id: &str) -> anyhow::Result<Vec<TodoTask>> {
        let tasks: Collection<TodoTask> = self.get_json(&tasks_path(list_id))?;
        Ok(tasks.value)
    }

    /// `POST /me/todo/lists/{id}/tasks`; the service answers 201 Created
    pub fn create_task(&self, list_id: &str, task: &NewTask) -> anyhow::Result<TodoTask> {
        let path = tasks_path(list_id);
        debug!("POST {}", path);

        let response = self
            .http
            .post(self.url(&path))
            .bearer_auth(&self.access_token)
            .json(task)
            .send()?;

        let response = expect_status(response, "POST", &path, StatusCode::CREATED)?;
        let created = response.json::<TodoTask>().map_err(|source| ApiError::Decode {
            method: "POST",
            path: path.clone(),
            source,
        })?;
        Ok(created)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        debug!("GET {}", path);
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(&self.access_token)
            .send()?;

        let response = expect_status(response, "GET", path, StatusCode::OK)?;
        let body = response.json::<T>().map_err(|source| ApiError::Decode {
            method: "GET",
            path: path.to_string(),
            source,
        })?;
        Ok(body)
    }
}

fn tasks_path(list_id: &str) -> String {
    format!("/me/todo/lists/{}/tasks", list_id)
}

fn expect_status(response: Response, method: &'static str, path: &str, expected: StatusCode) -> Result<Response, ApiError> {
    let status = response.status();
    if status == expected {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    Err(ApiError::Status {
        method,
        path: path.to_string(),
        status,
        detail: format_error_body(&body),
    })
}

/// Summarise an error body: the service's `error.message` if present,
/// else the first few hundred characters
fn format_error_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let message = serde_json::from_str::<serde_json::Value>(trimmed)
        .ok()
        .and_then(|value| value["error"]["message"].as_str().map(str::to_string));

    let summary = message.unwrap_or_else(|| {
        let flat = trimmed.replace(['\n', '\r'], " ");
        if flat.chars().count() > MAX_ERROR_BODY {
            let cut: String = flat.chars().take(MAX_ERROR_BODY).collect();
            format!("{}...", cut)
        } else {
            flat
        }
    });
    format!(": {}", summary)
}
