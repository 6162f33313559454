//! Local Mirror & Filter Engine.
//!
//! Holds the last fetched rows (replaced wholesale per successful fetch),
//! the derived facets and the filtered view. Every mutation recomputes the
//! view, so readers never see a stale projection.

use crate::core::mapping::RoleMapping;
use crate::core::normalize::{ProgressUnit, detect_unit, to_percent};
use crate::models::role::Role;
use crate::models::row::Row;
use crate::utils::date::{WeekdayLocale, weekday_name};
use chrono::{DateTime, Datelike, Local, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Empty fields mean "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub assignee: String,
}

impl FilterSelection {
    pub fn new(group: impl Into<String>, assignee: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            assignee: assignee.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.group.is_empty() && self.assignee.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Mirror {
    mapping: RoleMapping,
    locale: WeekdayLocale,
    rows: Vec<Row>,
    filtered: Vec<Row>,
    filter: FilterSelection,
    populated: bool,
    progress_unit: ProgressUnit,
    refreshed_at: Option<DateTime<Local>>,
}

impl Mirror {
    pub fn new(mapping: RoleMapping, locale: WeekdayLocale) -> Self {
        Self {
            mapping,
            locale,
            rows: Vec::new(),
            filtered: Vec::new(),
            filter: FilterSelection::default(),
            populated: false,
            progress_unit: ProgressUnit::default(),
            refreshed_at: None,
        }
    }

    pub fn mapping(&self) -> &RoleMapping {
        &self.mapping
    }

    pub fn set_rows(&mut self, rows: Vec<Row>) {
        self.set_rows_on(rows, Local::now().weekday());
    }

    /// Replace the mirror. `today` drives the first-population default filter.
    pub fn set_rows_on(&mut self, rows: Vec<Row>, today: Weekday) {
        self.rows = rows;
        self.refreshed_at = Some(Local::now());
        self.progress_unit = self.detect_progress_unit();

        if !self.populated && !self.rows.is_empty() {
            self.populated = true;
            if self.filter.is_empty() {
                self.apply_default_group(today);
            }
        }

        self.recompute();
    }

    pub fn set_filter(&mut self, selection: FilterSelection) {
        self.filter = FilterSelection::new(selection.group.trim(), selection.assignee.trim());
        self.recompute();
    }

    /// Keep the first population from picking today's group.
    pub fn suppress_default_filter(&mut self) {
        self.populated = true;
    }

    pub fn filter(&self) -> &FilterSelection {
        &self.filter
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn filtered_rows(&self) -> &[Row] {
        &self.filtered
    }

    pub fn row(&self, id: &str) -> Option<&Row> {
        self.rows.iter().find(|r| r.id == id)
    }

    pub fn progress_unit(&self) -> ProgressUnit {
        self.progress_unit
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Local>> {
        self.refreshed_at
    }

    /// Progress of a row as 0..=100, when the progress role is mapped and set.
    pub fn progress_percent(&self, row: &Row) -> Option<u8> {
        let col = self.mapping.column(Role::Progress)?;
        row.number(col).map(|v| to_percent(v, self.progress_unit))
    }

    /// Distinct, trimmed, non-empty values of a role, sorted.
    pub fn facet_values(&self, role: Role) -> Vec<String> {
        let Some(col) = self.mapping.column(role) else {
            return Vec::new();
        };
        self.rows
            .iter()
            .map(|r| r.text(col))
            .filter(|v| !v.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn detect_progress_unit(&self) -> ProgressUnit {
        match self.mapping.column(Role::Progress) {
            Some(col) => detect_unit(self.rows.iter().filter_map(|r| r.number(col))),
            None => ProgressUnit::default(),
        }
    }

    fn apply_default_group(&mut self, today: Weekday) {
        let Some(col) = self.mapping.column(self.mapping.kind.group_role()) else {
            return;
        };
        let wanted = weekday_name(today, self.locale).to_lowercase();
        if let Some(value) = self
            .rows
            .iter()
            .map(|r| r.text(col))
            .find(|v| v.to_lowercase() == wanted)
        {
            log::debug!("default group filter set to '{}'", value);
            self.filter.group = value;
        }
    }

    fn matches(&self, row: &Row) -> bool {
        let checks = [
            (self.mapping.kind.group_role(), &self.filter.group),
            (Role::Assignee, &self.filter.assignee),
        ];
        checks.iter().all(|(role, wanted)| {
            if wanted.is_empty() {
                return true;
            }
            match self.mapping.column(*role) {
                Some(col) => row.text(col) == **wanted,
                // Unmapped role: the filter is hidden, not applied.
                None => true,
            }
        })
    }

    fn recompute(&mut self) {
        self.filtered = self
            .rows
            .iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::role::SourceKind;
    use serde_json::json;

    fn mapping() -> RoleMapping {
        let mut m = RoleMapping::empty(SourceKind::Document);
        m.columns.insert(Role::Group, "grp".into());
        m.columns.insert(Role::Assignee, "who".into());
        m.columns.insert(Role::Progress, "pct".into());
        m
    }

    fn row(id: &str, group: &str, who: &str) -> Row {
        Row::new(id, id)
            .with_field("grp", json!(group))
            .with_field("who", json!(who))
    }

    fn sample() -> Mirror {
        let mut m = Mirror::new(mapping(), WeekdayLocale::En);
        m.set_rows_on(
            vec![row("1", "Mon", "A"), row("2", "Mon", "B"), row("3", "Tue", "A")],
            Weekday::Sun,
        );
        m
    }

    #[test]
    fn conjunctive_filtering() {
        let mut m = sample();
        assert_eq!(m.filtered_rows().len(), 3);

        m.set_filter(FilterSelection::new("Mon", ""));
        assert_eq!(m.filtered_rows().len(), 2);

        m.set_filter(FilterSelection::new("Mon", "A"));
        assert_eq!(m.filtered_rows().len(), 1);
        assert_eq!(m.filtered_rows()[0].id, "1");

        m.set_filter(FilterSelection::new("Wed", ""));
        assert!(m.filtered_rows().is_empty());
    }

    #[test]
    fn filter_is_case_sensitive_on_values() {
        let mut m = sample();
        m.set_filter(FilterSelection::new("mon", ""));
        assert!(m.filtered_rows().is_empty());
    }

    #[test]
    fn facets_are_distinct_trimmed_sorted() {
        let mut m = Mirror::new(mapping(), WeekdayLocale::En);
        m.set_rows_on(
            vec![row("1", " Tue ", "B"), row("2", "Mon", ""), row("3", "Tue", "A")],
            Weekday::Sun,
        );
        assert_eq!(m.facet_values(Role::Group), vec!["Mon", "Tue"]);
        assert_eq!(m.facet_values(Role::Assignee), vec!["A", "B"]);
        assert!(m.facet_values(Role::Priority).is_empty());
    }

    #[test]
    fn default_filter_picks_today_on_first_population_only() {
        let mut m = Mirror::new(mapping(), WeekdayLocale::Fr);
        m.set_rows_on(
            vec![row("1", "lundi", "A"), row("2", "Mardi", "B")],
            Weekday::Mon,
        );
        assert_eq!(m.filter().group, "lundi");
        assert_eq!(m.filtered_rows().len(), 1);

        // user clears it, a later refresh must not re-apply it
        m.set_filter(FilterSelection::default());
        m.set_rows_on(
            vec![row("1", "lundi", "A"), row("2", "Mardi", "B")],
            Weekday::Mon,
        );
        assert!(m.filter().group.is_empty());
        assert_eq!(m.filtered_rows().len(), 2);
    }

    #[test]
    fn default_filter_respects_existing_selection() {
        let mut m = Mirror::new(mapping(), WeekdayLocale::Fr);
        m.set_filter(FilterSelection::new("", "B"));
        m.set_rows_on(vec![row("1", "Lundi", "A"), row("2", "Lundi", "B")], Weekday::Mon);
        assert!(m.filter().group.is_empty());
        assert_eq!(m.filtered_rows().len(), 1);
    }

    #[test]
    fn suppressed_default_keeps_everything() {
        let mut m = Mirror::new(mapping(), WeekdayLocale::Fr);
        m.suppress_default_filter();
        m.set_rows_on(vec![row("1", "lundi", "A"), row("2", "Mardi", "B")], Weekday::Mon);
        assert!(m.filter().is_empty());
        assert_eq!(m.filtered_rows().len(), 2);
    }

    #[test]
    fn no_default_without_match() {
        let m = sample();
        assert!(m.filter().is_empty());
    }

    #[test]
    fn progress_unit_follows_row_set() {
        let mut m = Mirror::new(mapping(), WeekdayLocale::En);
        m.set_rows_on(vec![row("1", "Mon", "A")], Weekday::Sun);
        assert_eq!(m.progress_unit(), ProgressUnit::Fraction);

        m.set_rows_on(
            vec![row("1", "Mon", "A").with_field("pct", json!(40))],
            Weekday::Sun,
        );
        assert_eq!(m.progress_unit(), ProgressUnit::Percentage);
        let r = m.row("1").unwrap().clone();
        assert_eq!(m.progress_percent(&r), Some(40));
    }
}
