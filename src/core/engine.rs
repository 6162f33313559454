//! Sync engine: one connected table, its mirror, the auto-refresh loop and
//! the edit session, wired together.

use crate::core::aggregate::{
    ClientGroup, PeriodSelection, PeriodSummary, available_months, available_weeks,
    group_by_client, select_tasks, summarize,
};
use crate::core::edit::{CommitOutcome, EditSession, SaveStatus};
use crate::core::mapping::{MappingState, RoleMapping, infer_mapping, reinfer};
use crate::core::mirror::{FilterSelection, Mirror};
use crate::core::period::{default_week, monday_for_week_label};
use crate::core::scheduler::{Countdown, EditGuard, SyncScheduler};
use crate::core::tracker::TimeTracker;
use crate::errors::{AppError, AppResult};
use crate::models::role::{Role, SourceKind};
use crate::models::row::Row;
use crate::models::task::Task;
use crate::source::{RemoteSource, TaskFeed};
use crate::utils::date::WeekdayLocale;
use chrono::{Local, NaiveDate, TimeZone, Utc};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// User asked: every error surfaces.
    Foreground,
    /// Timer or post-save: transport errors are logged and dropped.
    Background,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Updated(usize),
    Skipped,
}

/// Result of `save_edit`: what was written and the follow-up refresh, if any.
#[derive(Debug)]
pub struct SaveReport {
    pub outcome: CommitOutcome,
    pub refresh: Option<JoinHandle<()>>,
}

fn lock(mirror: &Mutex<Mirror>) -> MutexGuard<'_, Mirror> {
    mirror.lock().unwrap_or_else(|e| e.into_inner())
}

/// Fetch and wholesale-replace the mirror. The last response to land wins.
pub async fn refresh_mirror<S>(
    source: &S,
    table: &str,
    mirror: &Mutex<Mirror>,
    mode: RefreshMode,
) -> AppResult<RefreshOutcome>
where
    S: RemoteSource + ?Sized,
{
    match source.list_rows(table).await {
        Ok(rows) => {
            let n = rows.len();
            lock(mirror).set_rows(rows);
            log::debug!("mirror refreshed: {n} row(s) from {table}");
            Ok(RefreshOutcome::Updated(n))
        }
        Err(e) if mode == RefreshMode::Background && e.is_transient() => {
            log::warn!("background refresh of {table} failed: {e}");
            Ok(RefreshOutcome::Skipped)
        }
        Err(e) => Err(e),
    }
}

/// List columns and build the mapping state for `table`.
/// A previous mapping is kept and only its gaps are inferred.
pub async fn discover_mapping<S>(
    source: &S,
    kind: SourceKind,
    table: &str,
    previous: Option<&RoleMapping>,
) -> AppResult<MappingState>
where
    S: RemoteSource + ?Sized,
{
    let columns = source.list_columns(table).await?;
    if columns.is_empty() {
        return Err(AppError::NotFound(format!("table {table} exposes no columns")));
    }
    let state = match previous {
        Some(prev) if prev.kind == kind => reinfer(prev, &columns),
        _ => MappingState::from_mapping(infer_mapping(kind, &columns)),
    };
    if !state.is_resolved() {
        log::info!(
            "no column matched '{}' in {table}, manual mapping needed",
            kind.primary_role().code()
        );
    }
    Ok(state)
}

pub struct SyncEngine<S: RemoteSource + 'static> {
    source: Arc<S>,
    table: String,
    mapping: RoleMapping,
    mirror: Arc<Mutex<Mirror>>,
    scheduler: SyncScheduler,
    edit: EditSession,
}

impl<S: RemoteSource + 'static> SyncEngine<S> {
    /// Rows only render once the primary role resolves.
    pub fn new(
        source: S,
        table: impl Into<String>,
        mapping: &MappingState,
        locale: WeekdayLocale,
    ) -> AppResult<Self> {
        let mapping = mapping.resolved()?.clone();
        let guard = EditGuard::default();
        Ok(Self {
            source: Arc::new(source),
            table: table.into(),
            mirror: Arc::new(Mutex::new(Mirror::new(mapping.clone(), locale))),
            scheduler: SyncScheduler::new(guard.clone()),
            edit: EditSession::new(guard, mapping.clone()),
            mapping,
        })
    }

    pub fn mapping(&self) -> &RoleMapping {
        &self.mapping
    }

    pub fn guard(&self) -> &EditGuard {
        self.scheduler.guard()
    }

    pub async fn refresh(&self, mode: RefreshMode) -> AppResult<RefreshOutcome> {
        refresh_mirror(self.source.as_ref(), &self.table, &self.mirror, mode).await
    }

    /// Start (or restart) the periodic background refresh.
    pub fn start_auto_refresh(&mut self, interval: Duration) {
        let source = Arc::clone(&self.source);
        let mirror = Arc::clone(&self.mirror);
        let table = self.table.clone();
        self.scheduler.start(interval, move || {
            let source = Arc::clone(&source);
            let mirror = Arc::clone(&mirror);
            let table = table.clone();
            async move {
                if let Err(e) =
                    refresh_mirror(source.as_ref(), &table, &mirror, RefreshMode::Background).await
                {
                    log::error!("scheduled refresh of {table} failed: {e}");
                }
            }
        });
    }

    pub fn stop_auto_refresh(&mut self) {
        self.scheduler.stop();
    }

    pub fn countdown(&self) -> Countdown {
        self.scheduler.countdown()
    }

    pub fn set_filter(&self, selection: FilterSelection) {
        lock(&self.mirror).set_filter(selection);
    }

    pub fn suppress_default_filter(&self) {
        lock(&self.mirror).suppress_default_filter();
    }

    pub fn filtered_rows(&self) -> Vec<Row> {
        lock(&self.mirror).filtered_rows().to_vec()
    }

    pub fn facet_values(&self, role: Role) -> Vec<String> {
        lock(&self.mirror).facet_values(role)
    }

    /// Read access to the mirror for views (progress display, counts...).
    pub fn with_mirror<T>(&self, f: impl FnOnce(&Mirror) -> T) -> T {
        f(&lock(&self.mirror))
    }

    pub fn open_edit(&mut self, row_id: &str) -> AppResult<()> {
        let (row, unit) = {
            let m = lock(&self.mirror);
            let row = m
                .row(row_id)
                .cloned()
                .ok_or_else(|| AppError::NotFound(format!("row {row_id}")))?;
            (row, m.progress_unit())
        };
        self.edit.open(&row, unit)
    }

    pub fn update_field(&mut self, role: Role, value: Value) -> AppResult<()> {
        self.edit.update_field(role, value)
    }

    pub fn append_note(&mut self, text: &str) -> AppResult<()> {
        self.edit.append_note(text)
    }

    pub fn edit_session(&self) -> &EditSession {
        &self.edit
    }

    pub fn save_status(&self) -> SaveStatus {
        self.edit.status()
    }

    /// Commit the open edit, then reconcile the mirror in the background.
    pub async fn save_edit(&mut self) -> AppResult<SaveReport> {
        let outcome = self.edit.commit(self.source.as_ref(), &self.table).await?;
        let refresh = match outcome {
            CommitOutcome::Saved(_) => {
                let source = Arc::clone(&self.source);
                let mirror = Arc::clone(&self.mirror);
                let table = self.table.clone();
                Some(tokio::spawn(async move {
                    if let Err(e) =
                        refresh_mirror(source.as_ref(), &table, &mirror, RefreshMode::Background)
                            .await
                    {
                        log::error!("post-save refresh of {table} failed: {e}");
                    }
                }))
            }
            CommitOutcome::Unchanged => None,
        };
        Ok(SaveReport { outcome, refresh })
    }

    pub fn cancel_edit(&mut self) {
        self.edit.cancel();
    }

    /// Stop refreshing, drop the open edit and the running timer without persisting.
    pub fn disconnect(&mut self, tracker: &mut TimeTracker) {
        self.scheduler.stop();
        self.edit.cancel();
        if let Some(t) = tracker.discard() {
            log::info!("running timer for task {} discarded", t.task_id);
        }
    }
}

/// Everything the period screen shows for one selection.
#[derive(Debug, Clone, Default)]
pub struct PeriodReport {
    pub months: Vec<String>,
    pub weeks: Vec<String>,
    pub selection: PeriodSelection,
    pub groups: Vec<ClientGroup>,
    pub summary: PeriodSummary,
}

/// Fetch tasks and time entries and aggregate them for `wanted`.
/// Month defaults to the most recent one, week to today's or the first.
pub async fn load_period<F>(
    feed: &F,
    user_id: Option<&str>,
    wanted: &PeriodSelection,
    today: NaiveDate,
) -> AppResult<PeriodReport>
where
    F: TaskFeed + ?Sized,
{
    let tasks: Vec<Task> = feed.fetch_tasks(user_id).await?;
    let listed = feed.fetch_available_months(user_id).await?;
    let months = available_months(
        listed
            .iter()
            .map(String::as_str)
            .chain(tasks.iter().filter_map(Task::month_label)),
    );

    let mut selection = wanted.clone();
    if selection.month.is_none() {
        selection.month = months.first().cloned();
    }
    let weeks = selection
        .month
        .as_deref()
        .map(|m| available_weeks(&tasks, m))
        .unwrap_or_default();
    if selection.week.as_ref().is_none_or(|w| !weeks.contains(w)) {
        selection.week = default_week(&weeks, today);
    }

    let visible = select_tasks(&tasks, &selection);
    let searching = selection
        .search
        .as_deref()
        .is_some_and(|s| !s.trim().is_empty());

    let entries = match (&selection.month, &selection.week) {
        (Some(m), Some(w)) if !searching => match monday_for_week_label(m, w)
            .and_then(|d| Local.from_local_datetime(&d).earliest())
        {
            Some(monday) => {
                feed.fetch_time_entries_since(monday.with_timezone(&Utc), user_id)
                    .await?
            }
            None => Vec::new(),
        },
        _ => Vec::new(),
    };

    Ok(PeriodReport {
        groups: group_by_client(&visible),
        summary: summarize(&visible, &entries),
        months,
        weeks,
        selection,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::row::Column;
    use crate::source::FieldValues;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        rows: Mutex<Vec<Row>>,
        fail_transport: std::sync::atomic::AtomicBool,
        updates: AtomicUsize,
    }

    impl Scripted {
        fn new(rows: Vec<Row>) -> Self {
            Self {
                rows: Mutex::new(rows),
                fail_transport: Default::default(),
                updates: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RemoteSource for Scripted {
        async fn list_columns(&self, _table: &str) -> AppResult<Vec<Column>> {
            Ok(vec![
                Column::new("c1", "Jour"),
                Column::new("c2", "Responsable"),
                Column::new("c3", "Avancement"),
                Column::new("c4", "Commentaires"),
            ])
        }

        async fn list_rows(&self, _table: &str) -> AppResult<Vec<Row>> {
            if self.fail_transport.load(Ordering::SeqCst) {
                return Err(AppError::transport(0, "connection reset"));
            }
            Ok(self.rows.lock().unwrap().clone())
        }

        async fn update_row(&self, _table: &str, _id: &str, _f: &FieldValues) -> AppResult<()> {
            self.updates.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    impl SyncEngine<Scripted> {
        fn source(&self) -> &Scripted {
            &self.source
        }
    }

    fn row(id: &str, day: &str, pct: f64) -> Row {
        Row::new(id, id)
            .with_field("c1", json!(day))
            .with_field("c3", json!(pct))
            .with_field("c4", json!(""))
    }

    async fn engine(rows: Vec<Row>) -> SyncEngine<Scripted> {
        let src = Scripted::new(rows);
        let state = discover_mapping(&src, SourceKind::Document, "t", None)
            .await
            .unwrap();
        SyncEngine::new(src, "t", &state, WeekdayLocale::En).unwrap()
    }

    #[tokio::test]
    async fn discovery_resolves_and_engine_refreshes() {
        let e = engine(vec![row("1", "Mon", 0.5), row("2", "Tue", 0.1)]).await;
        assert_eq!(e.mapping().column(Role::Group), Some("c1"));
        assert_eq!(e.mapping().column(Role::Notes), Some("c4"));

        let out = e.refresh(RefreshMode::Foreground).await.unwrap();
        assert_eq!(out, RefreshOutcome::Updated(2));
        assert_eq!(e.facet_values(Role::Group), vec!["Mon", "Tue"]);
    }

    #[tokio::test]
    async fn unresolved_mapping_blocks_engine() {
        let state = MappingState::from_mapping(RoleMapping::empty(SourceKind::Document));
        let r = SyncEngine::new(Scripted::new(vec![]), "t", &state, WeekdayLocale::Fr);
        assert!(matches!(r, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn background_swallows_transport_errors() {
        let e = engine(vec![row("1", "Mon", 0.5)]).await;
        e.refresh(RefreshMode::Foreground).await.unwrap();
        e.source().fail_transport.store(true, Ordering::SeqCst);

        assert_eq!(
            e.refresh(RefreshMode::Background).await.unwrap(),
            RefreshOutcome::Skipped
        );
        assert!(e.refresh(RefreshMode::Foreground).await.is_err());
        // last known good state survives
        assert_eq!(e.filtered_rows().len(), 1);
    }

    #[tokio::test]
    async fn refresh_never_touches_open_buffer() {
        let mut e = engine(vec![row("1", "Mon", 0.5)]).await;
        e.refresh(RefreshMode::Foreground).await.unwrap();
        e.open_edit("1").unwrap();
        e.update_field(Role::Progress, json!(70)).unwrap();

        // a response lands after the edit opened
        *e.source().rows.lock().unwrap() = vec![row("1", "Mon", 0.9)];
        e.refresh(RefreshMode::Background).await.unwrap();

        let mirrored = e.with_mirror(|m| m.row("1").and_then(|r| m.progress_percent(r)));
        assert_eq!(mirrored, Some(90));
        let buffered = e.edit_session().buffer().unwrap().row().value("c3").cloned();
        assert_eq!(buffered, Some(json!(70)));
    }

    #[tokio::test]
    async fn save_writes_then_refreshes_in_background() {
        let mut e = engine(vec![row("1", "Mon", 0.5)]).await;
        e.refresh(RefreshMode::Foreground).await.unwrap();
        e.open_edit("1").unwrap();
        e.update_field(Role::Progress, json!(100)).unwrap();
        *e.source().rows.lock().unwrap() = vec![row("1", "Mon", 1.0)];

        let report = e.save_edit().await.unwrap();
        assert!(matches!(report.outcome, CommitOutcome::Saved(_)));
        report.refresh.unwrap().await.unwrap();

        assert_eq!(e.source().updates.load(Ordering::SeqCst), 1);
        let pct = e.with_mirror(|m| m.row("1").and_then(|r| m.progress_percent(r)));
        assert_eq!(pct, Some(100));
        assert!(!e.guard().is_open());
    }

    #[tokio::test]
    async fn unchanged_save_skips_remote_and_refresh() {
        let mut e = engine(vec![row("1", "Mon", 0.5)]).await;
        e.refresh(RefreshMode::Foreground).await.unwrap();
        e.open_edit("1").unwrap();
        let report = e.save_edit().await.unwrap();
        assert_eq!(report.outcome, CommitOutcome::Unchanged);
        assert!(report.refresh.is_none());
        assert_eq!(e.source().updates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_stops_everything() {
        let mut e = engine(vec![row("1", "Mon", 0.5)]).await;
        e.refresh(RefreshMode::Foreground).await.unwrap();
        e.start_auto_refresh(Duration::from_secs(60));
        e.open_edit("1").unwrap();

        let mut tracker = TimeTracker::new();
        tracker.start("task-1").unwrap();

        e.disconnect(&mut tracker);
        assert_eq!(e.countdown(), Countdown::Inactive);
        assert!(!e.edit_session().is_open());
        assert!(!e.guard().is_open());
        assert!(tracker.active().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn auto_refresh_updates_mirror() {
        let mut e = engine(vec![row("1", "Mon", 0.5)]).await;
        e.start_auto_refresh(Duration::from_secs(60));
        assert!(e.filtered_rows().is_empty());

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(e.filtered_rows().len(), 1);
    }
}
