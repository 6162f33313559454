//! Field Mapper: guesses which column plays which role from column names.
//!
//! The keyword tables are plain data evaluated in role-priority order, so
//! adding a role or a synonym never touches the matching code.

use crate::errors::{AppError, AppResult};
use crate::models::role::{Role, SourceKind};
use crate::models::row::Column;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const DOCUMENT_KEYWORDS: &[(Role, &[&str])] = &[
    (
        Role::Group,
        &["status", "statut", "etat", "état", "stage", "jour", "day", "group"],
    ),
    (Role::Assignee, &["assign", "owner", "respo", "user", "person"]),
    (
        Role::Progress,
        &["progress", "avanc", "complete", "complétion", "%", "done"],
    ),
    (Role::Priority, &["priorit", "prio", "urgen", "importan"]),
    (Role::Notes, &["comment", "note", "desc", "detail", "text"]),
];

const RELATIONAL_KEYWORDS: &[(Role, &[&str])] = &[
    (Role::Title, &["title", "name", "summary", "task", "label"]),
    (Role::Status, &["status", "state", "stage", "column"]),
    (Role::Assignee, &["assign", "owner", "user", "respo"]),
    (Role::Description, &["desc", "body", "content", "detail", "note"]),
    (Role::DueDate, &["date", "due", "dead", "end"]),
];

pub fn keyword_table(kind: SourceKind) -> &'static [(Role, &'static [&'static str])] {
    match kind {
        SourceKind::Document => DOCUMENT_KEYWORDS,
        SourceKind::Relational => RELATIONAL_KEYWORDS,
    }
}

/// role → column id. Unresolved roles are simply absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMapping {
    pub kind: SourceKind,
    #[serde(default)]
    pub columns: BTreeMap<Role, String>,
}

impl RoleMapping {
    pub fn empty(kind: SourceKind) -> Self {
        Self {
            kind,
            columns: BTreeMap::new(),
        }
    }

    pub fn column(&self, role: Role) -> Option<&str> {
        self.columns.get(&role).map(String::as_str)
    }

    pub fn is_resolved(&self, role: Role) -> bool {
        self.columns.contains_key(&role)
    }

    pub fn primary_resolved(&self) -> bool {
        self.is_resolved(self.kind.primary_role())
    }

    /// Manual override. The column must exist in the discovered schema and the
    /// role must belong to this kind of source.
    pub fn assign(&mut self, role: Role, column_id: &str, columns: &[Column]) -> AppResult<()> {
        if !self.kind.roles().contains(&role) {
            return Err(AppError::Validation(format!(
                "role '{}' does not apply to {} sources",
                role.code(),
                self.kind.as_str()
            )));
        }
        let found = columns
            .iter()
            .find(|c| c.id == column_id || c.name == column_id)
            .ok_or_else(|| AppError::NotFound(format!("column '{}'", column_id)))?;
        self.columns.insert(role, found.id.clone());
        Ok(())
    }

    pub fn clear(&mut self, role: Role) {
        self.columns.remove(&role);
    }

    /// Fill only the roles still unresolved here from `inferred`.
    pub fn merge_missing(&mut self, inferred: &RoleMapping) {
        for (role, col) in &inferred.columns {
            self.columns.entry(*role).or_insert_with(|| col.clone());
        }
    }
}

/// Two-state mapping workflow. `Resolved` guarantees the primary role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "mapping", rename_all = "snake_case")]
pub enum MappingState {
    NeedsMapping(RoleMapping),
    Resolved(RoleMapping),
}

impl MappingState {
    pub fn from_mapping(mapping: RoleMapping) -> Self {
        if mapping.primary_resolved() {
            MappingState::Resolved(mapping)
        } else {
            MappingState::NeedsMapping(mapping)
        }
    }

    pub fn mapping(&self) -> &RoleMapping {
        match self {
            MappingState::NeedsMapping(m) | MappingState::Resolved(m) => m,
        }
    }

    /// The mapping for the row view. Errors route the caller back to manual mapping.
    pub fn resolved(&self) -> AppResult<&RoleMapping> {
        match self {
            MappingState::Resolved(m) => Ok(m),
            MappingState::NeedsMapping(m) => Err(AppError::Validation(format!(
                "required role '{}' is not mapped",
                m.kind.primary_role().code()
            ))),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, MappingState::Resolved(_))
    }
}

/// First column (source order) whose lowercase name contains any keyword.
fn find_column<'a>(columns: &'a [Column], keywords: &[&str]) -> Option<&'a Column> {
    columns.iter().find(|c| {
        let name = c.name.to_lowercase();
        keywords.iter().any(|k| name.contains(k))
    })
}

pub fn infer_mapping(kind: SourceKind, columns: &[Column]) -> RoleMapping {
    let mut mapping = RoleMapping::empty(kind);
    for (role, keywords) in keyword_table(kind) {
        if let Some(col) = find_column(columns, keywords) {
            mapping.columns.insert(*role, col.id.clone());
        }
    }
    mapping
}

/// Re-run inference on top of an existing (possibly manual) mapping.
/// Already-resolved roles are never overwritten.
pub fn reinfer(previous: &RoleMapping, columns: &[Column]) -> MappingState {
    let mut merged = previous.clone();
    merged.merge_missing(&infer_mapping(previous.kind, columns));
    MappingState::from_mapping(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<Column> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| Column::new(format!("c-{i}"), *n))
            .collect()
    }

    #[test]
    fn any_status_column_becomes_group() {
        let columns = cols(&["Name", "Project Status", "Owner"]);
        let m = infer_mapping(SourceKind::Document, &columns);
        assert_eq!(m.column(Role::Group), Some("c-1"));
        assert_eq!(m.column(Role::Assignee), Some("c-2"));
        assert!(m.primary_resolved());
    }

    #[test]
    fn first_matching_column_in_source_order_wins() {
        let columns = cols(&["Jour", "Status", "Avancement", "Priorité", "Commentaires"]);
        let m = infer_mapping(SourceKind::Document, &columns);
        assert_eq!(m.column(Role::Group), Some("c-0"));
        assert_eq!(m.column(Role::Progress), Some("c-2"));
        assert_eq!(m.column(Role::Priority), Some("c-3"));
        assert_eq!(m.column(Role::Notes), Some("c-4"));
    }

    #[test]
    fn unmatched_roles_stay_unresolved() {
        let columns = cols(&["Foo", "Bar"]);
        let m = infer_mapping(SourceKind::Document, &columns);
        assert!(m.columns.is_empty());
        assert!(matches!(
            MappingState::from_mapping(m),
            MappingState::NeedsMapping(_)
        ));
    }

    #[test]
    fn relational_keywords() {
        let columns = cols(&["id", "title", "state", "assigned_to", "body", "due_at"]);
        let m = infer_mapping(SourceKind::Relational, &columns);
        assert_eq!(m.column(Role::Title), Some("c-1"));
        assert_eq!(m.column(Role::Status), Some("c-2"));
        assert_eq!(m.column(Role::Assignee), Some("c-3"));
        assert_eq!(m.column(Role::Description), Some("c-4"));
        assert_eq!(m.column(Role::DueDate), Some("c-5"));
    }

    #[test]
    fn reinference_keeps_manual_choices() {
        let columns = cols(&["Day", "Status", "Owner"]);
        let mut manual = RoleMapping::empty(SourceKind::Document);
        manual.assign(Role::Group, "c-1", &columns).unwrap();

        let state = reinfer(&manual, &columns);
        let m = state.resolved().unwrap();
        assert_eq!(m.column(Role::Group), Some("c-1"));
        assert_eq!(m.column(Role::Assignee), Some("c-2"));
    }

    #[test]
    fn assign_rejects_unknown_column_and_foreign_role() {
        let columns = cols(&["Day"]);
        let mut m = RoleMapping::empty(SourceKind::Document);
        assert!(matches!(
            m.assign(Role::Group, "c-9", &columns),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            m.assign(Role::Title, "c-0", &columns),
            Err(AppError::Validation(_))
        ));
        m.assign(Role::Group, "Day", &columns).unwrap();
        assert_eq!(m.column(Role::Group), Some("c-0"));
    }

    #[test]
    fn needs_mapping_blocks_row_view() {
        let state = MappingState::NeedsMapping(RoleMapping::empty(SourceKind::Relational));
        assert!(matches!(state.resolved(), Err(AppError::Validation(_))));
    }
}
