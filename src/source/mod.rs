//! Remote Source Adapter: one contract over both flavours of remote table.

pub mod document;
pub mod http;
pub mod relational;

use crate::errors::{AppError, AppResult};
use crate::models::row::{Column, Row};
use crate::models::source_config::{Credentials, SourceConfig};
use crate::models::task::{Task, TimeEntry};
use document::DocumentClient;
use relational::RelationalClient;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;

/// column id → new value, as sent to `update_row`.
pub type FieldValues = BTreeMap<String, Value>;

#[async_trait]
pub trait RemoteSource: Send + Sync {
    async fn list_columns(&self, table: &str) -> AppResult<Vec<Column>>;

    async fn list_rows(&self, table: &str) -> AppResult<Vec<Row>>;

    async fn update_row(&self, table: &str, row_id: &str, fields: &FieldValues) -> AppResult<()>;
}

/// Task/client hierarchy and time entries used by the time tracker.
#[async_trait]
pub trait TaskFeed: Send + Sync {
    async fn fetch_tasks(&self, user_id: Option<&str>) -> AppResult<Vec<Task>>;

    async fn fetch_available_months(&self, user_id: Option<&str>) -> AppResult<Vec<String>>;

    async fn fetch_time_entries_since(
        &self,
        since: DateTime<Utc>,
        user_id: Option<&str>,
    ) -> AppResult<Vec<TimeEntry>>;

    async fn create_time_entry(&self, entry: &TimeEntry) -> AppResult<()>;

    async fn update_task(&self, task_id: &str, fields: &FieldValues) -> AppResult<()>;
}

/// Overrides the document API base URL (self-hosted proxies, tests).
pub const DOCUMENT_API_ENV: &str = "RTASKSYNC_DOCUMENT_API";

/// Limits applied when building a client from a stored connection.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub rows: u32,
    pub tasks: u32,
}

/// The concrete client behind a stored connection.
#[derive(Debug, Clone)]
pub enum SourceClient {
    Document(DocumentClient),
    Relational(RelationalClient),
}

impl SourceClient {
    pub fn from_config(cfg: &SourceConfig, limits: Limits) -> Self {
        match &cfg.credentials {
            Credentials::Document { token } => {
                let mut c = DocumentClient::new(token.clone(), cfg.source_id.clone());
                if let Ok(base) = std::env::var(DOCUMENT_API_ENV) {
                    c = c.with_base_url(base);
                }
                SourceClient::Document(c)
            }
            Credentials::Relational { url, anon_key } => {
                let title = cfg
                    .mapping
                    .mapping()
                    .column(crate::models::role::Role::Title)
                    .map(String::from);
                SourceClient::Relational(
                    RelationalClient::new(url.clone(), anon_key.clone())
                        .with_title_column(title)
                        .with_row_limit(limits.rows)
                        .with_task_limit(limits.tasks),
                )
            }
        }
    }

    /// The time-tracking feed, only offered by relational sources.
    pub fn task_feed(&self) -> AppResult<&RelationalClient> {
        match self {
            SourceClient::Relational(c) => Ok(c),
            SourceClient::Document(_) => Err(AppError::Validation(
                "time tracking needs a relational source".into(),
            )),
        }
    }
}

#[async_trait]
impl RemoteSource for SourceClient {
    async fn list_columns(&self, table: &str) -> AppResult<Vec<Column>> {
        match self {
            SourceClient::Document(c) => c.list_columns(table).await,
            SourceClient::Relational(c) => c.list_columns(table).await,
        }
    }

    async fn list_rows(&self, table: &str) -> AppResult<Vec<Row>> {
        match self {
            SourceClient::Document(c) => c.list_rows(table).await,
            SourceClient::Relational(c) => c.list_rows(table).await,
        }
    }

    async fn update_row(&self, table: &str, row_id: &str, fields: &FieldValues) -> AppResult<()> {
        match self {
            SourceClient::Document(c) => c.update_row(table, row_id, fields).await,
            SourceClient::Relational(c) => c.update_row(table, row_id, fields).await,
        }
    }
}

/// Map a failed HTTP exchange onto the error taxonomy.
pub fn error_for_status(status: u16, body: &str, what: &str) -> AppError {
    let message = extract_error_message(body);
    let code = error_code(body);
    match (status, code.as_deref()) {
        (401 | 403, _) => AppError::Auth(format!("{what}: {message}")),
        (_, Some("PGRST205" | "42P01")) | (404, _) => {
            AppError::NotFound(format!("{what}: {message}"))
        }
        _ => AppError::transport(status, format!("{what}: {message}")),
    }
}

fn parse_body(body: &str) -> Option<Value> {
    serde_json::from_str::<Value>(body).ok()
}

fn error_code(body: &str) -> Option<String> {
    parse_body(body)?
        .get("code")
        .and_then(|c| c.as_str())
        .map(String::from)
}

fn extract_error_message(body: &str) -> String {
    parse_body(body)
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.trim().to_string())
}
