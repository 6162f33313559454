//! Edit Session: an isolated working copy of one row plus its save status.

use crate::core::mapping::RoleMapping;
use crate::core::normalize::{ProgressUnit, to_storage};
use crate::core::scheduler::EditGuard;
use crate::errors::{AppError, AppResult};
use crate::models::role::Role;
use crate::models::row::{Row, value_number};
use crate::source::{FieldValues, RemoteSource};
use chrono::Local;
use serde_json::Value;
use std::collections::BTreeSet;
use std::time::Duration;
use tokio::time::Instant;

/// How long "saved" stays visible before reading as idle.
pub const SAVED_DISPLAY: Duration = Duration::from_secs(2);

const NOTE_STAMP: &str = "%d/%m/%Y %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    Idle,
    Editing,
    Saving,
    Saved { at: Instant },
    Error(String),
}

impl SaveStatus {
    /// `Saved` decays to `Idle` after [`SAVED_DISPLAY`].
    pub fn current(&self) -> SaveStatus {
        match self {
            SaveStatus::Saved { at } if at.elapsed() >= SAVED_DISPLAY => SaveStatus::Idle,
            other => other.clone(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self.current() {
            SaveStatus::Idle => "idle",
            SaveStatus::Editing => "editing",
            SaveStatus::Saving => "saving",
            SaveStatus::Saved { .. } => "saved",
            SaveStatus::Error(_) => "error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EditBuffer {
    row: Row,
    original: Row,
    touched: BTreeSet<Role>,
    note: String,
}

impl EditBuffer {
    pub fn row(&self) -> &Row {
        &self.row
    }
}

/// What a commit ended up doing.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    /// Nothing changed, no remote call.
    Unchanged,
    Saved(FieldValues),
}

#[derive(Debug)]
pub struct EditSession {
    guard: EditGuard,
    mapping: RoleMapping,
    unit: ProgressUnit,
    buffer: Option<EditBuffer>,
    status: SaveStatus,
}

impl EditSession {
    pub fn new(guard: EditGuard, mapping: RoleMapping) -> Self {
        Self {
            guard,
            mapping,
            unit: ProgressUnit::default(),
            buffer: None,
            status: SaveStatus::Idle,
        }
    }

    pub fn status(&self) -> SaveStatus {
        self.status.current()
    }

    pub fn buffer(&self) -> Option<&EditBuffer> {
        self.buffer.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.buffer.is_some()
    }

    /// Copy `row` into a fresh buffer. `unit` is the progress convention at open time.
    /// Reopening the row already being edited keeps its pending changes.
    pub fn open(&mut self, row: &Row, unit: ProgressUnit) -> AppResult<()> {
        if let Some(b) = &self.buffer {
            if b.row.id == row.id {
                return Ok(());
            }
            return Err(AppError::EditSession(format!(
                "row {} is already being edited",
                b.row.id
            )));
        }
        self.unit = unit;
        self.buffer = Some(EditBuffer {
            row: row.clone(),
            original: row.clone(),
            touched: BTreeSet::new(),
            note: String::new(),
        });
        self.status = SaveStatus::Editing;
        self.guard.open();
        Ok(())
    }

    fn buffer_mut(&mut self) -> AppResult<&mut EditBuffer> {
        self.buffer
            .as_mut()
            .ok_or_else(|| AppError::EditSession("no row is being edited".into()))
    }

    /// Change a mapped field. Progress takes a percent (0..=100).
    pub fn update_field(&mut self, role: Role, value: Value) -> AppResult<()> {
        if role == self.mapping.kind.notes_role() {
            return Err(AppError::EditSession(format!(
                "'{}' is append-only, add a note instead",
                role.code()
            )));
        }
        let column = self
            .mapping
            .column(role)
            .ok_or_else(|| AppError::Validation(format!("role '{}' is not mapped", role.code())))?
            .to_string();

        let value = if role == Role::Progress {
            let pct = value_number(&value).ok_or_else(|| {
                AppError::Validation(format!("progress must be a number, got {value}"))
            })?;
            Value::from(pct.round().clamp(0.0, 100.0) as u64)
        } else {
            value
        };

        let buf = self.buffer_mut()?;
        buf.row.fields.insert(column, value);
        buf.touched.insert(role);
        self.status = SaveStatus::Editing;
        Ok(())
    }

    /// Set the note to append on commit. Blank text clears it.
    pub fn append_note(&mut self, text: &str) -> AppResult<()> {
        if self.mapping.column(self.mapping.kind.notes_role()).is_none() {
            return Err(AppError::Validation("no notes column is mapped".into()));
        }
        let buf = self.buffer_mut()?;
        buf.note = text.trim().to_string();
        self.status = SaveStatus::Editing;
        Ok(())
    }

    /// Only touched fields and the note append go into the payload.
    pub fn payload(&self) -> AppResult<FieldValues> {
        let buf = self
            .buffer
            .as_ref()
            .ok_or_else(|| AppError::EditSession("no row is being edited".into()))?;
        let mut out = FieldValues::new();

        for role in &buf.touched {
            let Some(col) = self.mapping.column(*role) else {
                continue;
            };
            let Some(v) = buf.row.value(col) else {
                continue;
            };
            let v = if *role == Role::Progress {
                let pct = value_number(v).unwrap_or(0.0).clamp(0.0, 100.0) as u8;
                Value::from(to_storage(pct, self.unit))
            } else {
                v.clone()
            };
            out.insert(col.to_string(), v);
        }

        if !buf.note.is_empty()
            && let Some(col) = self.mapping.column(self.mapping.kind.notes_role())
        {
            let old = buf.original.text(col);
            let stamp = Local::now().format(NOTE_STAMP);
            out.insert(col.to_string(), Value::from(append_stamped(&old, &stamp.to_string(), &buf.note)));
        }
        Ok(out)
    }

    /// Write the buffer through `source`. The buffer survives a failure for retry.
    pub async fn commit<S>(&mut self, source: &S, table: &str) -> AppResult<CommitOutcome>
    where
        S: RemoteSource + ?Sized,
    {
        let payload = self.payload()?;
        if payload.is_empty() {
            self.status = SaveStatus::Idle;
            return Ok(CommitOutcome::Unchanged);
        }
        let row_id = self
            .buffer
            .as_ref()
            .map(|b| b.row.id.clone())
            .unwrap_or_default();

        self.status = SaveStatus::Saving;
        match source.update_row(table, &row_id, &payload).await {
            Ok(()) => {
                log::info!("row {} saved ({} field(s))", row_id, payload.len());
                self.status = SaveStatus::Saved { at: Instant::now() };
                self.buffer = None;
                self.guard.close();
                Ok(CommitOutcome::Saved(payload))
            }
            Err(e) => {
                log::warn!("saving row {row_id} failed: {e}");
                self.status = SaveStatus::Error(e.to_string());
                Err(e)
            }
        }
    }

    /// Drop the buffer without writing anything.
    pub fn cancel(&mut self) {
        self.buffer = None;
        self.status = SaveStatus::Idle;
        self.guard.close();
    }
}

/// `old` + blank line + `[stamp]` + new text.
pub fn append_stamped(old: &str, stamp: &str, new: &str) -> String {
    if old.trim().is_empty() {
        format!("[{stamp}]\n{new}")
    } else {
        format!("{old}\n\n[{stamp}]\n{new}")
    }
}
