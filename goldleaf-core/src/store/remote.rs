//! Remote HTTP backend
//!
//! Talks to a goldleaf server that enforces the same contract the local
//! backend enforces itself. This client performs no business validation:
//! it ships requests, and translates the server's field-keyed error
//! payloads back into the shared error taxonomy so callers see the same
//! failures from either backend.
//!
//! The underlying reqwest client is async; [`RemoteStore`] wraps it in a
//! current-thread runtime so it can serve the synchronous [`Repository`]
//! trait.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Serialize;
use uuid::Uuid;

use crate::config::RemoteConfig;
use crate::error::{Error, Result};
use crate::types::{
    Amount, DurationLogInput, LogEntry, LogQuery, NewDayOutcome, NewDayPreview, Profile,
    StreakBonusRule, Task, TaskInput, TaskPatch,
};

use super::{Repository, StreakRuleInput};

/// Async HTTP client for the goldleaf server API
pub struct RemoteClient {
    http_client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct CreateProfileRequest<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct HabitIncrementRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    by: Option<Amount>,
}

#[derive(Serialize)]
struct NewDayStartRequest<'a> {
    checked_ids: &'a [Uuid],
}

impl RemoteClient {
    /// Create a new client from configuration
    ///
    /// Returns an error if the configuration is missing required fields.
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let base_url = config
            .server_url
            .clone()
            .ok_or_else(|| Error::Config("remote.server_url is required".to_string()))?
            .trim_end_matches('/')
            .to_string();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(api_key) = &config.api_key {
            let auth_value = format!("Bearer {}", api_key);
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&auth_value)
                    .map_err(|e| Error::Config(format!("invalid api_key: {}", e)))?,
            );
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    fn profile_url(&self, profile_id: Uuid, suffix: &str) -> String {
        format!(
            "{}/api/profiles/{}/{}",
            self.base_url,
            urlencoding::encode(&profile_id.to_string()),
            suffix
        )
    }

    fn task_url(&self, profile_id: Uuid, task_id: Uuid, suffix: &str) -> String {
        format!(
            "{}/api/profiles/{}/tasks/{}/{}",
            self.base_url,
            urlencoding::encode(&profile_id.to_string()),
            urlencoding::encode(&task_id.to_string()),
            suffix
        )
    }

    /// Check the status and decode the server's error payload on failure.
    async fn check(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_else(|_| "unknown".to_string());
        Err(map_api_error(status, &body))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Api(format!("HTTP request failed: {}", e)))?;
        self.check(response)
            .await?
            .json()
            .await
            .map_err(|e| Error::Api(format!("failed to parse response: {}", e)))
    }

    async fn send_json<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        method: reqwest::Method,
        url: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .http_client
            .request(method, url)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Api(format!("HTTP request failed: {}", e)))?;
        self.check(response)
            .await?
            .json()
            .await
            .map_err(|e| Error::Api(format!("failed to parse response: {}", e)))
    }

    async fn delete(&self, url: &str) -> Result<()> {
        let response = self
            .http_client
            .delete(url)
            .send()
            .await
            .map_err(|e| Error::Api(format!("HTTP request failed: {}", e)))?;
        self.check(response).await?;
        Ok(())
    }

    pub async fn fetch_profiles(&self) -> Result<Vec<Profile>> {
        self.get_json(&format!("{}/api/profiles/", self.base_url)).await
    }

    pub async fn create_profile(&self, name: &str) -> Result<Profile> {
        self.send_json(
            reqwest::Method::POST,
            &format!("{}/api/profiles/", self.base_url),
            &CreateProfileRequest { name },
        )
        .await
    }

    pub async fn delete_profile(&self, id: Uuid) -> Result<()> {
        self.delete(&format!(
            "{}/api/profiles/{}/",
            self.base_url,
            urlencoding::encode(&id.to_string())
        ))
        .await
    }

    pub async fn fetch_tasks(&self, profile_id: Uuid) -> Result<Vec<Task>> {
        self.get_json(&self.profile_url(profile_id, "tasks/")).await
    }

    pub async fn create_task(&self, input: &TaskInput) -> Result<Task> {
        self.send_json(
            reqwest::Method::POST,
            &self.profile_url(input.profile_id, "tasks/"),
            input,
        )
        .await
    }

    pub async fn update_task(&self, id: Uuid, profile_id: Uuid, patch: &TaskPatch) -> Result<Task> {
        self.send_json(
            reqwest::Method::PATCH,
            &self.task_url(profile_id, id, ""),
            patch,
        )
        .await
    }

    pub async fn delete_task(&self, id: Uuid, profile_id: Uuid) -> Result<()> {
        self.delete(&self.task_url(profile_id, id, "")).await
    }

    pub async fn habit_increment(
        &self,
        id: Uuid,
        profile_id: Uuid,
        by: Option<Amount>,
    ) -> Result<Task> {
        self.send_json(
            reqwest::Method::POST,
            &self.task_url(profile_id, id, "habit-increment/"),
            &HabitIncrementRequest { by },
        )
        .await
    }

    pub async fn daily_complete(&self, id: Uuid, profile_id: Uuid) -> Result<Task> {
        self.send_json(
            reqwest::Method::POST,
            &self.task_url(profile_id, id, "daily-complete/"),
            &serde_json::json!({}),
        )
        .await
    }

    pub async fn todo_complete(&self, id: Uuid, profile_id: Uuid) -> Result<Task> {
        self.send_json(
            reqwest::Method::POST,
            &self.task_url(profile_id, id, "todo-complete/"),
            &serde_json::json!({}),
        )
        .await
    }

    pub async fn reward_claim(&self, id: Uuid, profile_id: Uuid) -> Result<Task> {
        self.send_json(
            reqwest::Method::POST,
            &self.task_url(profile_id, id, "reward-claim/"),
            &serde_json::json!({}),
        )
        .await
    }

    pub async fn fetch_logs(&self, profile_id: Uuid, query: &LogQuery) -> Result<Vec<LogEntry>> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(limit) = query.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(from) = query.from_date {
            params.push(("from", from.to_string()));
        }
        if let Some(to) = query.to_date {
            params.push(("to", to.to_string()));
        }
        if let Some(log_type) = query.log_type {
            params.push(("type", log_type.as_str().to_string()));
        }
        if let Some(task_id) = query.task_id {
            params.push(("task", task_id.to_string()));
        }

        let url = self.profile_url(profile_id, "logs/");
        let response = self
            .http_client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| Error::Api(format!("HTTP request failed: {}", e)))?;
        self.check(response)
            .await?
            .json()
            .await
            .map_err(|e| Error::Api(format!("failed to parse response: {}", e)))
    }

    pub async fn fetch_streak_rules(
        &self,
        profile_id: Uuid,
        task_id: Uuid,
    ) -> Result<Vec<StreakBonusRule>> {
        self.get_json(&self.task_url(profile_id, task_id, "streak-rules/"))
            .await
    }

    pub async fn replace_streak_rules(
        &self,
        profile_id: Uuid,
        task_id: Uuid,
        rules: &[StreakRuleInput],
    ) -> Result<()> {
        let _: serde_json::Value = self
            .send_json(
                reqwest::Method::PUT,
                &self.task_url(profile_id, task_id, "streak-rules/"),
                &rules,
            )
            .await?;
        Ok(())
    }

    pub async fn new_day_preview(&self, profile_id: Uuid) -> Result<NewDayPreview> {
        self.get_json(&self.profile_url(profile_id, "new-day/")).await
    }

    pub async fn new_day_start(
        &self,
        profile_id: Uuid,
        checked_ids: &[Uuid],
    ) -> Result<NewDayOutcome> {
        self.send_json(
            reqwest::Method::POST,
            &self.profile_url(profile_id, "new-day/"),
            &NewDayStartRequest { checked_ids },
        )
        .await
    }

    pub async fn create_duration_log(&self, input: &DurationLogInput) -> Result<LogEntry> {
        self.send_json(
            reqwest::Method::POST,
            &self.profile_url(input.profile_id, "logs/durations/"),
            input,
        )
        .await
    }

    /// Check whether the server is reachable
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/health", self.base_url);
        match self.http_client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }
}

/// Translate a server error response into the shared error taxonomy.
///
/// The server reports guard failures as field-keyed JSON objects; the
/// offending field name tells us which invariant tripped.
fn map_api_error(status: StatusCode, body: &str) -> Error {
    if status == StatusCode::NOT_FOUND {
        return Error::NotFound(extract_message(body).unwrap_or_else(|| "resource".to_string()));
    }

    if let Ok(payload) = serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(body) {
        for (field, value) in &payload {
            let message = field_message(value);
            match field.as_str() {
                "completion_period" | "is_done" => return Error::AlreadyCompleted(message),
                "is_claimed" => return Error::AlreadyClaimed(message),
                "gold_balance" => return Error::InsufficientFunds(message),
                "task_type" => return Error::TypeMismatch(message),
                "gold_delta" => return Error::InvalidState(message),
                "detail" | "non_field_errors" => {
                    return Error::Api(format!("API error ({}): {}", status, message))
                }
                _ => {
                    return Error::Validation {
                        field: field.clone(),
                        message,
                    }
                }
            }
        }
    }

    Error::Api(format!("API error ({}): {}", status, body))
}

fn extract_message(body: &str) -> Option<String> {
    let payload: serde_json::Map<String, serde_json::Value> = serde_json::from_str(body).ok()?;
    payload.values().next().map(field_message)
}

/// The server wraps messages either as a bare string or a list of strings.
fn field_message(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    }
}

/// Synchronous wrapper serving the [`Repository`] trait over [`RemoteClient`].
pub struct RemoteStore {
    client: RemoteClient,
    runtime: tokio::runtime::Runtime,
}

impl RemoteStore {
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Config(format!("failed to create runtime: {}", e)))?;

        Ok(Self {
            client: RemoteClient::new(config)?,
            runtime,
        })
    }

    /// Check whether the server is reachable (blocking)
    pub fn health_check(&self) -> Result<bool> {
        self.runtime.block_on(self.client.health_check())
    }
}

impl Repository for RemoteStore {
    fn fetch_profiles(&self) -> Result<Vec<Profile>> {
        self.runtime.block_on(self.client.fetch_profiles())
    }

    fn create_profile(&self, name: &str) -> Result<Profile> {
        self.runtime.block_on(self.client.create_profile(name))
    }

    fn delete_profile(&self, id: Uuid) -> Result<()> {
        self.runtime.block_on(self.client.delete_profile(id))
    }

    fn fetch_tasks(&self, profile_id: Uuid) -> Result<Vec<Task>> {
        self.runtime.block_on(self.client.fetch_tasks(profile_id))
    }

    fn create_task(&self, input: TaskInput) -> Result<Task> {
        self.runtime.block_on(self.client.create_task(&input))
    }

    fn update_task(&self, id: Uuid, profile_id: Uuid, patch: TaskPatch) -> Result<Task> {
        self.runtime
            .block_on(self.client.update_task(id, profile_id, &patch))
    }

    fn delete_task(&self, id: Uuid, profile_id: Uuid) -> Result<()> {
        self.runtime.block_on(self.client.delete_task(id, profile_id))
    }

    fn habit_increment(&self, id: Uuid, profile_id: Uuid, by: Option<Amount>) -> Result<Task> {
        self.runtime
            .block_on(self.client.habit_increment(id, profile_id, by))
    }

    fn daily_complete(&self, id: Uuid, profile_id: Uuid) -> Result<Task> {
        self.runtime
            .block_on(self.client.daily_complete(id, profile_id))
    }

    fn todo_complete(&self, id: Uuid, profile_id: Uuid) -> Result<Task> {
        self.runtime
            .block_on(self.client.todo_complete(id, profile_id))
    }

    fn reward_claim(&self, id: Uuid, profile_id: Uuid) -> Result<Task> {
        self.runtime
            .block_on(self.client.reward_claim(id, profile_id))
    }

    fn fetch_logs(&self, profile_id: Uuid, query: &LogQuery) -> Result<Vec<LogEntry>> {
        self.runtime
            .block_on(self.client.fetch_logs(profile_id, query))
    }

    fn fetch_streak_rules(&self, profile_id: Uuid, task_id: Uuid) -> Result<Vec<StreakBonusRule>> {
        self.runtime
            .block_on(self.client.fetch_streak_rules(profile_id, task_id))
    }

    fn replace_streak_rules(
        &self,
        profile_id: Uuid,
        task_id: Uuid,
        rules: Vec<StreakRuleInput>,
    ) -> Result<()> {
        self.runtime
            .block_on(self.client.replace_streak_rules(profile_id, task_id, &rules))
    }

    fn new_day_preview(&self, profile_id: Uuid) -> Result<NewDayPreview> {
        self.runtime.block_on(self.client.new_day_preview(profile_id))
    }

    fn new_day_start(&self, profile_id: Uuid, checked_ids: &[Uuid]) -> Result<NewDayOutcome> {
        self.runtime
            .block_on(self.client.new_day_start(profile_id, checked_ids))
    }

    fn create_duration_log(&self, input: DurationLogInput) -> Result<LogEntry> {
        self.runtime
            .block_on(self.client.create_duration_log(&input))
    }

    fn queue_duration_log(&self, input: DurationLogInput) {
        // Best-effort: never surface network failures to the timer.
        if let Err(e) = self.create_duration_log(input) {
            tracing::warn!(error = %e, "Failed to queue activity duration log");
        }
    }
}
