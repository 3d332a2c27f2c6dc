//! Microsoft To Do task creation through the Graph API.
//!
//! A long-lived refresh token (obtained once, out of band) is exchanged for
//! an access token on every run.

use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;

use super::email::{render_subject, render_text};
use crate::config::NotifySettings;
use crate::error::NotifyError;
use crate::watcher::UpdateEvent;

pub const DEFAULT_TOKEN_URL: &str = "https://login.microsoftonline.com/common/oauth2/v2.0/token";
pub const DEFAULT_GRAPH_URL: &str = "https://graph.microsoft.com/v1.0";
const SCOPES: &str = "Tasks.ReadWrite offline_access";
const TIMEOUT: Duration = Duration::from_secs(30);

/// To-do credentials read from `MS_TODO_*` variables.
#[derive(Clone)]
pub struct TodoConfig {
    pub client_id: String,
    pub refresh_token: String,
    pub token_url: String,
    pub graph_url: String,
}

impl std::fmt::Debug for TodoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoConfig")
            .field("client_id", &self.client_id)
            .field("token_url", &self.token_url)
            .field("graph_url", &self.graph_url)
            .finish_non_exhaustive()
    }
}

impl TodoConfig {
    /// Build from a variable lookup.
    ///
    /// Returns `Ok(None)` when neither variable is set.
    ///
    /// # Errors
    ///
    /// Returns an error when only one of the two credentials is set.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<Self>, NotifyError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        match (get("MS_TODO_CLIENT_ID"), get("MS_TODO_REFRESH_TOKEN")) {
            (None, None) => Ok(None),
            (Some(client_id), Some(refresh_token)) => Ok(Some(Self {
                client_id,
                refresh_token,
                token_url: DEFAULT_TOKEN_URL.to_string(),
                graph_url: DEFAULT_GRAPH_URL.to_string(),
            })),
            (None, Some(_)) => Err(NotifyError::MissingCredentials(
                "MS_TODO_CLIENT_ID".to_string(),
            )),
            (Some(_), None) => Err(NotifyError::MissingCredentials(
                "MS_TODO_REFRESH_TOKEN".to_string(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ListsResponse {
    #[serde(default)]
    value: Vec<TodoList>,
}

#[derive(Debug, Deserialize)]
struct TodoList {
    id: String,
    #[serde(rename = "displayName")]
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct CreatedTask {
    id: String,
}

/// Thin Graph API client for task creation.
pub struct TodoClient {
    http: reqwest::Client,
    config: TodoConfig,
}

impl TodoClient {
    /// Create a client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: TodoConfig) -> Result<Self, NotifyError> {
        let http = reqwest::Client::builder()
            .user_agent(crate::github::USER_AGENT)
            .timeout(TIMEOUT)
            .build()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        Ok(Self { http, config })
    }

    /// Exchange the refresh token for an access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token endpoint is unreachable or rejects the request.
    pub async fn access_token(&self) -> Result<String, NotifyError> {
        let response = self
            .http
            .post(&self.config.token_url)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("refresh_token", self.config.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
                ("scope", SCOPES),
            ])
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let token: TokenResponse = read_json(response, "token refresh").await?;
        Ok(token.access_token)
    }

    /// Id of the list named `name`, creating it when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if listing or creating fails.
    pub async fn find_or_create_list(&self, token: &str, name: &str) -> Result<String, NotifyError> {
        let url = format!("{}/me/todo/lists", self.config.graph_url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        let lists: ListsResponse = read_json(response, "list lookup").await?;

        if let Some(list) = lists.value.into_iter().find(|l| l.display_name == name) {
            return Ok(list.id);
        }

        tracing::info!(list = name, "Creating to-do list");
        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&serde_json::json!({ "displayName": name }))
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        let created: TodoList = read_json(response, "list creation").await?;
        Ok(created.id)
    }

    /// Create a task and return its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the Graph API rejects the task.
    pub async fn create_task(
        &self,
        token: &str,
        list_id: &str,
        title: &str,
        body: &str,
    ) -> Result<String, NotifyError> {
        let url = format!("{}/me/todo/lists/{list_id}/tasks", self.config.graph_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&serde_json::json!({
                "title": title,
                "importance": "normal",
                "body": { "content": body, "contentType": "text" },
            }))
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        let task: CreatedTask = read_json(response, "task creation").await?;
        Ok(task.id)
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    what: &str,
) -> Result<T, NotifyError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(NotifyError::Api(format!("{what} failed with {status}: {body}")));
    }
    response
        .json()
        .await
        .map_err(|e| NotifyError::Api(format!("{what} returned an invalid body: {e}")))
}

/// Create one task summarising all updates in the configured list.
///
/// # Errors
///
/// Returns an error if any Graph API step fails.
pub async fn send_todo(
    config: &TodoConfig,
    updates: &[UpdateEvent],
    settings: &NotifySettings,
) -> Result<(), NotifyError> {
    let client = TodoClient::new(config.clone())?;
    let token = client.access_token().await?;
    let list_id = client
        .find_or_create_list(&token, &settings.todo_list_name)
        .await?;

    let title = render_subject(updates, settings);
    let body = render_text(updates, settings, Utc::now());
    let task_id = client.create_task(&token, &list_id, &title, &body).await?;

    tracing::info!(list = %settings.todo_list_name, task = %task_id, "To-do task created");
    Ok(())
}
