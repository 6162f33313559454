//! Week/month view over the task feed: selection, client groups and totals.

use crate::core::period::{sort_month_labels, sort_week_labels};
use crate::models::task::{Task, TimeEntry};
use crate::source::FieldValues;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// What the user picked. A non-empty search overrides month and week.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeriodSelection {
    pub month: Option<String>,
    pub week: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientGroup {
    pub name: String,
    pub tasks: Vec<Task>,
    pub remaining: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeriodSummary {
    pub task_count: usize,
    pub global_progress: u32,
    pub total_estimated: f64,
    pub total_worked: f64,
    pub remaining: f64,
    /// Minutes logged in time entries for the period.
    pub tracked_minutes: i64,
}

/// Distinct month labels, most recent first. Labels that are not a
/// "Month Year" keep their first-seen order at the end.
pub fn available_months<'a, I>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    let mut v: Vec<String> = labels
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty() && seen.insert(*s))
        .map(String::from)
        .collect();
    sort_month_labels(&mut v);
    v
}

/// Distinct week labels of one month, by number.
pub fn available_weeks(tasks: &[Task], month: &str) -> Vec<String> {
    let mut v: Vec<String> = tasks
        .iter()
        .filter(|t| t.month_label() == Some(month))
        .map(|t| t.week_label().to_string())
        .filter(|w| !w.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    sort_week_labels(&mut v);
    v
}

fn matches_search(task: &Task, needle: &str) -> bool {
    task.title().to_lowercase().contains(needle) || task.client_name().to_lowercase().contains(needle)
}

/// Tasks visible under `sel`.
pub fn select_tasks<'a>(tasks: &'a [Task], sel: &PeriodSelection) -> Vec<&'a Task> {
    if let Some(q) = sel.search.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let needle = q.to_lowercase();
        return tasks.iter().filter(|t| matches_search(t, &needle)).collect();
    }
    tasks
        .iter()
        .filter(|t| sel.month.is_none() || t.month_label() == sel.month.as_deref())
        .filter(|t| sel.week.as_deref().is_none_or(|w| t.week_label() == w))
        .collect()
}

/// Tasks bucketed by client; groups with pending work first, then by name.
pub fn group_by_client(tasks: &[&Task]) -> Vec<ClientGroup> {
    let mut by_name: BTreeMap<String, Vec<Task>> = BTreeMap::new();
    for t in tasks {
        by_name
            .entry(t.client_name().to_string())
            .or_default()
            .push((*t).clone());
    }

    let mut groups: Vec<ClientGroup> = by_name
        .into_iter()
        .map(|(name, tasks)| {
            let remaining = tasks.iter().filter(|t| !t.completed).count();
            ClientGroup {
                name,
                tasks,
                remaining,
            }
        })
        .collect();
    groups.sort_by(|a, b| {
        (a.remaining == 0)
            .cmp(&(b.remaining == 0))
            .then_with(|| a.name.cmp(&b.name))
    });
    groups
}

pub fn summarize(tasks: &[&Task], entries: &[TimeEntry]) -> PeriodSummary {
    let n = tasks.len();
    let global_progress = if n == 0 {
        0
    } else {
        let sum: f64 = tasks.iter().map(|t| t.progress_value()).sum();
        (sum / n as f64).round().max(0.0) as u32
    };
    let total_estimated: f64 = tasks.iter().map(|t| t.estimated()).sum();
    let total_worked: f64 = tasks
        .iter()
        .filter(|t| t.completed)
        .map(|t| t.estimated())
        .sum();

    let ids: BTreeSet<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
    let tracked_minutes = entries
        .iter()
        .filter(|e| ids.contains(e.task_id.as_str()))
        .map(|e| e.duration_minutes)
        .sum();

    PeriodSummary {
        task_count: n,
        global_progress,
        total_estimated,
        total_worked,
        remaining: (total_estimated - total_worked).max(0.0),
        tracked_minutes,
    }
}

/// Fields written when a task's progress changes; 100 also completes it.
pub fn progress_update(progress: u8) -> FieldValues {
    let progress = progress.min(100);
    let mut f = FieldValues::new();
    f.insert("progress".into(), Value::from(progress));
    if progress == 100 {
        f.insert("completed".into(), Value::Bool(true));
    }
    f
}

/// Fields written when a task is (un)checked; completing sets progress to 100.
pub fn completion_update(completed: bool) -> FieldValues {
    let mut f = FieldValues::new();
    f.insert("completed".into(), Value::Bool(completed));
    if completed {
        f.insert("progress".into(), Value::from(100));
    }
    f
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task(id: &str, title: &str, client: Option<&str>, week: &str, progress: f64, done: bool, est: f64) -> Task {
        let clients = client.map(|c| json!({"id": format!("c-{c}"), "name": c}));
        serde_json::from_value(json!({
            "id": id,
            "title": title,
            "progress": progress,
            "completed": done,
            "estimated_minutes": est,
            "week_number": week,
            "projects": {"id": "p", "month_year": "Mars 2025", "clients": clients}
        }))
        .unwrap()
    }

    fn sample() -> Vec<Task> {
        vec![
            task("1", "Audit", Some("Zeta"), "S1", 100.0, true, 60.0),
            task("2", "Landing page", Some("Acme"), "S1", 50.0, false, 120.0),
            task("3", "Emails", None, "S2", 0.0, false, 30.0),
            task("4", "Report", Some("Acme"), "S1", 25.0, false, 30.0),
        ]
    }

    #[test]
    fn week_selection_and_totals() {
        let tasks = sample();
        let sel = PeriodSelection {
            month: Some("Mars 2025".into()),
            week: Some("S1".into()),
            search: None,
        };
        let visible = select_tasks(&tasks, &sel);
        assert_eq!(visible.len(), 3);

        let entries = vec![TimeEntry {
            user_id: "u".into(),
            client_id: "c-Acme".into(),
            task_id: "2".into(),
            start_time: chrono::Utc::now(),
            end_time: chrono::Utc::now(),
            duration_minutes: 45,
            notes: None,
        }];
        let s = summarize(&visible, &entries);
        assert_eq!(s.global_progress, 58);
        assert_eq!(s.total_estimated, 210.0);
        assert_eq!(s.total_worked, 60.0);
        assert_eq!(s.remaining, 150.0);
        assert_eq!(s.tracked_minutes, 45);
    }

    #[test]
    fn empty_selection_has_zero_progress() {
        let s = summarize(&[], &[]);
        assert_eq!(s.global_progress, 0);
        assert_eq!(s.remaining, 0.0);
    }

    #[test]
    fn search_overrides_period() {
        let tasks = sample();
        let sel = PeriodSelection {
            month: Some("Avril 2025".into()),
            week: Some("S9".into()),
            search: Some("ACME".into()),
        };
        let ids: Vec<&str> = select_tasks(&tasks, &sel).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "4"]);

        let sel = PeriodSelection {
            search: Some("sans".into()),
            ..Default::default()
        };
        assert_eq!(select_tasks(&tasks, &sel).len(), 1);
    }

    #[test]
    fn groups_with_pending_work_first() {
        let tasks = sample();
        let all: Vec<&Task> = tasks.iter().collect();
        let names: Vec<String> = group_by_client(&all).into_iter().map(|g| g.name).collect();
        assert_eq!(names, vec!["Acme", "Sans Client", "Zeta"]);
    }

    #[test]
    fn weeks_and_months_listing() {
        let tasks = sample();
        assert_eq!(available_weeks(&tasks, "Mars 2025"), vec!["S1", "S2"]);
        assert!(available_weeks(&tasks, "Avril 2025").is_empty());
        assert_eq!(
            available_months(["Mars 2025", "Avril 2025", " Mars 2025 ", ""]),
            vec!["Avril 2025", "Mars 2025"]
        );
    }

    #[test]
    fn unknown_month_labels_keep_their_order() {
        assert_eq!(
            available_months(["Zzz notes", "Mars 2025", "Aaa misc", "Zzz notes"]),
            vec!["Mars 2025", "Zzz notes", "Aaa misc"]
        );
    }

    #[test]
    fn progress_and_completion_rules() {
        assert_eq!(progress_update(100)["completed"], json!(true));
        assert!(!progress_update(40).contains_key("completed"));
        assert_eq!(completion_update(true)["progress"], json!(100));
        assert!(!completion_update(false).contains_key("progress"));
    }
}
