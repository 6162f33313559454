//! Relational-table adapter: a PostgREST endpoint reached with URL + anon key.

use super::{FieldValues, RemoteSource, TaskFeed, error_for_status, http};
use crate::errors::{AppError, AppResult};
use crate::models::row::{Column, Row, value_text};
use crate::models::task::{Task, TimeEntry};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Method;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Table names probed when the schema listing is not exposed.
pub const TABLE_CANDIDATES: &[&str] = &["tasks", "todos", "items", "kanban_items", "tickets", "projects"];

pub const DEFAULT_ROW_LIMIT: u32 = 100;
pub const DEFAULT_TASK_LIMIT: u32 = 200;

const TASK_SELECT: &str =
    "*,projects!inner(id,month_year,clients!inner(id,name,user_id))";

#[derive(Debug, Clone)]
pub struct RelationalClient {
    base_url: String,
    anon_key: String,
    title_column: Option<String>,
    row_limit: u32,
    task_limit: u32,
    client: reqwest::Client,
}

impl RelationalClient {
    pub fn new(project_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            base_url: project_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            title_column: None,
            row_limit: DEFAULT_ROW_LIMIT,
            task_limit: DEFAULT_TASK_LIMIT,
            client: http::client(),
        }
    }

    /// Column used for `Row::display_name`.
    pub fn with_title_column(mut self, column: Option<String>) -> Self {
        self.title_column = column;
        self
    }

    pub fn with_row_limit(mut self, limit: u32) -> Self {
        self.row_limit = limit.max(1);
        self
    }

    pub fn with_task_limit(mut self, limit: u32) -> Self {
        self.task_limit = limit.max(1);
        self
    }

    fn rest_url(&self, path: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> AppResult<Value> {
        log::debug!("relational source {} {}", method, path);
        let mut req = self
            .client
            .request(method, self.rest_url(path))
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .query(query);
        if let Some(b) = body {
            req = req.header("Prefer", "return=minimal").json(b);
        }

        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(error_for_status(status.as_u16(), &text, path));
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn select(&self, table: &str, query: &[(&str, String)]) -> AppResult<Vec<Map<String, Value>>> {
        let v = self.request(Method::GET, table, query, None).await?;
        match v {
            Value::Array(items) => Ok(items
                .into_iter()
                .filter_map(|i| match i {
                    Value::Object(m) => Some(m),
                    _ => None,
                })
                .collect()),
            Value::Null => Ok(Vec::new()),
            other => Err(AppError::transport(
                200,
                format!("unexpected payload for {table}: {other}"),
            )),
        }
    }

    /// Table names from the OpenAPI description served at the REST root.
    pub async fn list_tables(&self) -> AppResult<Vec<String>> {
        let root = self.request(Method::GET, "", &[], None).await?;
        let mut names: Vec<String> = root
            .get("definitions")
            .and_then(|d| d.as_object())
            .map(|d| d.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        Ok(names)
    }

    /// First candidate that answers a one-row probe.
    pub async fn find_table(&self, candidates: &[&str]) -> AppResult<Option<String>> {
        for name in candidates {
            match self.select(name, &[("select", "*".into()), ("limit", "1".into())]).await {
                Ok(_) => return Ok(Some((*name).to_string())),
                Err(AppError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }

    pub async fn fetch_rows(&self, table: &str, limit: u32) -> AppResult<Vec<Row>> {
        let records = self
            .select(table, &[("select", "*".into()), ("limit", limit.to_string())])
            .await?;
        Ok(records.into_iter().map(|r| self.to_row(r)).collect())
    }

    fn to_row(&self, record: Map<String, Value>) -> Row {
        let id = record.get("id").map(value_text).unwrap_or_default();
        let display_name = self
            .title_column
            .as_deref()
            .into_iter()
            .chain(["title", "name"])
            .filter_map(|c| record.get(c).map(value_text))
            .find(|s| !s.is_empty())
            .unwrap_or_else(|| id.clone());
        Row {
            id,
            display_name,
            fields: record.into_iter().collect(),
        }
    }
}

fn user_filter(user_id: Option<&str>, column: &'static str) -> Option<(&'static str, String)> {
    user_id
        .filter(|u| !u.is_empty())
        .map(|u| (column, format!("eq.{u}")))
}

#[async_trait]
impl RemoteSource for RelationalClient {
    async fn list_columns(&self, table: &str) -> AppResult<Vec<Column>> {
        let probe = self
            .select(table, &[("select", "*".into()), ("limit", "1".into())])
            .await?;
        Ok(probe
            .into_iter()
            .next()
            .map(|r| r.keys().map(|k| Column::new(k.clone(), k.clone())).collect())
            .unwrap_or_default())
    }

    async fn list_rows(&self, table: &str) -> AppResult<Vec<Row>> {
        self.fetch_rows(table, self.row_limit).await
    }

    async fn update_row(&self, table: &str, row_id: &str, fields: &FieldValues) -> AppResult<()> {
        let body = Value::Object(fields.clone().into_iter().collect());
        self.request(
            Method::PATCH,
            table,
            &[("id", format!("eq.{row_id}"))],
            Some(&body),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl TaskFeed for RelationalClient {
    async fn fetch_tasks(&self, user_id: Option<&str>) -> AppResult<Vec<Task>> {
        let mut query = vec![
            ("select", TASK_SELECT.to_string()),
            ("order", "created_at.desc".to_string()),
            ("limit", self.task_limit.to_string()),
        ];
        query.extend(user_filter(user_id, "projects.clients.user_id"));

        let v = self.request(Method::GET, "tasks", &query, None).await?;
        Ok(serde_json::from_value(v)?)
    }

    async fn fetch_available_months(&self, user_id: Option<&str>) -> AppResult<Vec<String>> {
        let mut query = vec![("select", "month_year,clients!inner(user_id)".to_string())];
        query.extend(user_filter(user_id, "clients.user_id"));

        let months: BTreeSet<String> = self
            .select("projects", &query)
            .await?
            .iter()
            .filter_map(|p| p.get("month_year").and_then(|m| m.as_str()))
            .filter(|m| !m.trim().is_empty())
            .map(String::from)
            .collect();
        Ok(months.into_iter().collect())
    }

    async fn fetch_time_entries_since(
        &self,
        since: DateTime<Utc>,
        user_id: Option<&str>,
    ) -> AppResult<Vec<TimeEntry>> {
        let mut query = vec![
            ("select", "*".to_string()),
            (
                "start_time",
                format!("gte.{}", since.to_rfc3339_opts(SecondsFormat::Millis, true)),
            ),
        ];
        query.extend(user_filter(user_id, "user_id"));

        let v = self.request(Method::GET, "time_entries", &query, None).await?;
        Ok(serde_json::from_value(v)?)
    }

    async fn create_time_entry(&self, entry: &TimeEntry) -> AppResult<()> {
        let body = serde_json::to_value(entry)?;
        self.request(Method::POST, "time_entries", &[], Some(&body))
            .await?;
        Ok(())
    }

    async fn update_task(&self, task_id: &str, fields: &FieldValues) -> AppResult<()> {
        self.update_row("tasks", task_id, fields).await
    }
}
