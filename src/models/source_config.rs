use crate::core::mapping::MappingState;
use crate::models::role::SourceKind;
use serde::{Deserialize, Serialize};

/// How we authenticate against the remote source. Stored as-is (no encryption).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Credentials {
    Document { token: String },
    Relational { url: String, anon_key: String },
}

impl Credentials {
    pub fn kind(&self) -> SourceKind {
        match self {
            Credentials::Document { .. } => SourceKind::Document,
            Credentials::Relational { .. } => SourceKind::Relational,
        }
    }
}

/// Persisted connection: created on first successful discovery, replaced on
/// explicit reconfiguration, removed on disconnect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Document id, or project URL for relational sources.
    pub source_id: String,
    /// Table id, or table name for relational sources.
    pub table_id: String,
    pub mapping: MappingState,
    pub credentials: Credentials,
    /// Owner of time entries (relational time tracking only).
    #[serde(default)]
    pub user_id: Option<String>,
}

impl SourceConfig {
    pub const STORE_KEY: &'static str = "source_config";

    pub fn kind(&self) -> SourceKind {
        self.credentials.kind()
    }
}
