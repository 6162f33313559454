//! Document-table adapter (bearer token over HTTPS).

use super::{FieldValues, RemoteSource, error_for_status, http};
use crate::errors::{AppError, AppResult};
use crate::models::row::{Column, Row};
use async_trait::async_trait;
use regex::Regex;
use reqwest::{Method, Url};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;

pub const DEFAULT_BASE_URL: &str = "https://coda.io/apis/v1";
const ROW_LIMIT: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DocSummary {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct ItemList<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct RawRow {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    values: BTreeMap<String, Value>,
}

/// Ids pulled out of a document URL pasted by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentRef {
    pub doc_id: Option<String>,
    pub table_id: Option<String>,
}

/// Accepts `https://host/d/Name_d<DOC>/Section_s<SEC>/Table_t<TABLE>` and the
/// `?tableId=` form. Anything unparseable yields empty ids.
pub fn parse_document_url(raw: &str) -> DocumentRef {
    let Ok(url) = Url::parse(raw.trim()) else {
        return DocumentRef::default();
    };
    let path = url.path();

    let doc_re = Regex::new(r"_d([a-zA-Z0-9_-]+)").ok();
    let table_re = Regex::new(r"_t([a-zA-Z0-9_-]+)").ok();

    let doc_id = doc_re
        .and_then(|re| re.captures(path))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());

    let table_id = url
        .query_pairs()
        .find(|(k, _)| k == "tableId")
        .map(|(_, v)| v.into_owned())
        .or_else(|| {
            table_re
                .and_then(|re| re.captures(path))
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
        });

    DocumentRef { doc_id, table_id }
}

#[derive(Debug, Clone)]
pub struct DocumentClient {
    token: String,
    doc_id: String,
    base_url: String,
    client: reqwest::Client,
}

impl DocumentClient {
    pub fn new(token: impl Into<String>, doc_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            doc_id: doc_id.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client: http::client(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_doc(mut self, doc_id: impl Into<String>) -> Self {
        self.doc_id = doc_id.into();
        self
    }

    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> AppResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("document source {} {}", method, path);

        let mut req = self
            .client
            .request(method, &url)
            .bearer_auth(&self.token);
        if let Some(b) = body {
            req = req.json(&b);
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

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        let v = self.request(Method::GET, path, None).await?;
        Ok(serde_json::from_value(v)?)
    }

    /// `Ok(false)` when the token is rejected; other failures propagate.
    pub async fn validate_token(&self) -> AppResult<bool> {
        match self.request(Method::GET, "/whoami", None).await {
            Ok(_) => Ok(true),
            Err(AppError::Auth(msg)) => {
                log::warn!("token validation failed: {msg}");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn list_docs(&self) -> AppResult<Vec<DocSummary>> {
        let list: ItemList<DocSummary> = self.get("/docs?limit=50").await?;
        Ok(list.items)
    }

    pub async fn list_tables(&self) -> AppResult<Vec<Column>> {
        let path = format!("/docs/{}/tables?limit=50", self.doc_id);
        let list: ItemList<Column> = self.get(&path).await?;
        Ok(list.items)
    }

    async fn table_exists(&self, doc_id: &str, table_id: &str) -> AppResult<bool> {
        let path = format!("/docs/{doc_id}/tables/{table_id}");
        match self.request(Method::GET, &path, None).await {
            Ok(_) => Ok(true),
            Err(AppError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Scan the visible documents for the one holding `table_id`.
    pub async fn find_doc_for_table(&self, table_id: &str) -> AppResult<Option<String>> {
        for doc in self.list_docs().await? {
            if self.table_exists(&doc.id, table_id).await? {
                return Ok(Some(doc.id));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl RemoteSource for DocumentClient {
    async fn list_columns(&self, table: &str) -> AppResult<Vec<Column>> {
        let path = format!("/docs/{}/tables/{}/columns?limit=100", self.doc_id, table);
        let list: ItemList<Column> = self.get(&path).await?;
        Ok(list.items)
    }

    async fn list_rows(&self, table: &str) -> AppResult<Vec<Row>> {
        let path = format!(
            "/docs/{}/tables/{}/rows?valueFormat=simple&limit={}",
            self.doc_id, table, ROW_LIMIT
        );
        let list: ItemList<RawRow> = self.get(&path).await?;
        Ok(list
            .items
            .into_iter()
            .map(|r| Row {
                display_name: r.name.unwrap_or_else(|| r.id.clone()),
                id: r.id,
                fields: r.values,
            })
            .collect())
    }

    async fn update_row(&self, table: &str, row_id: &str, fields: &FieldValues) -> AppResult<()> {
        let cells: Vec<Value> = fields
            .iter()
            .map(|(column, value)| json!({ "column": column, "value": value }))
            .collect();
        let body = json!({ "row": { "cells": cells } });
        let path = format!("/docs/{}/tables/{}/rows/{}", self.doc_id, table, row_id);
        self.request(Method::PUT, &path, Some(body)).await?;
        Ok(())
    }
}
