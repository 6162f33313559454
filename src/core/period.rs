//! Calendar arithmetic for period labels: ISO weeks, "Month Year" ordering
//! and the Monday anchoring a week label inside its month.

use crate::utils::date::first_monday_on_or_after;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use std::cmp::Ordering;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Month vocabulary of period labels, compared without diacritics.
pub const MONTHS: [&str; 12] = [
    "JANVIER",
    "FEVRIER",
    "MARS",
    "AVRIL",
    "MAI",
    "JUIN",
    "JUILLET",
    "AOUT",
    "SEPTEMBRE",
    "OCTOBRE",
    "NOVEMBRE",
    "DECEMBRE",
];

/// ISO-8601 week number: the week belongs to the year of its Thursday.
pub fn iso_week(date: NaiveDate) -> u32 {
    let thursday = date + Duration::days(3 - i64::from(date.weekday().num_days_from_monday()));
    (thursday.ordinal0() / 7) + 1
}

fn fold(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_uppercase()
}

/// 0-based index of a month name in [`MONTHS`].
pub fn month_index(name: &str) -> Option<u32> {
    let folded = fold(name.trim());
    MONTHS.iter().position(|m| *m == folded).map(|i| i as u32)
}

/// `(year, month index)` of a "Month Year" label.
pub fn parse_month_label(label: &str) -> Option<(i32, u32)> {
    let mut parts = label.split_whitespace();
    let (month, year) = (parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    Some((year.parse().ok()?, month_index(month)?))
}

/// Most recent first; labels that do not parse go last in their original order.
pub fn sort_month_labels(labels: &mut [String]) {
    labels.sort_by(|a, b| match (parse_month_label(a), parse_month_label(b)) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// Digits embedded in a week label ("S3" → 3).
pub fn week_number(label: &str) -> Option<u32> {
    let digits: String = label.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// Ascending by embedded number, labels without digits first.
pub fn sort_week_labels(labels: &mut [String]) {
    labels.sort_by_key(|l| week_number(l).unwrap_or(0));
}

/// Midnight of the Monday that opens `week_label` within `month_label`.
/// Week labels without digits count as week 1.
pub fn monday_for_week_label(month_label: &str, week_label: &str) -> Option<NaiveDateTime> {
    let (year, month0) = parse_month_label(month_label)?;
    let first = NaiveDate::from_ymd_opt(year, month0 + 1, 1)?;
    let week = week_number(week_label).filter(|n| *n > 0).unwrap_or(1);
    let monday = first_monday_on_or_after(first) + Duration::weeks(i64::from(week) - 1);
    monday.and_hms_opt(0, 0, 0)
}

/// Week shown when none was chosen: the label numbered like today's ISO week,
/// else the first available one.
pub fn default_week(available: &[String], today: NaiveDate) -> Option<String> {
    let current = iso_week(today);
    available
        .iter()
        .find(|w| week_number(w) == Some(current))
        .or_else(|| available.first())
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn iso_weeks() {
        assert_eq!(iso_week(d(2024, 1, 1)), 1);
        assert_eq!(iso_week(d(2021, 1, 3)), 53);
        assert_eq!(iso_week(d(2020, 12, 31)), 53);
        assert_eq!(iso_week(d(2024, 12, 30)), 1);
        assert_eq!(iso_week(d(2025, 3, 12)), d(2025, 3, 12).iso_week().week());
    }

    #[test]
    fn month_labels_sort_recent_first() {
        let mut labels: Vec<String> = ["Mars 2024", "Notes", "Février 2025", "DÉCEMBRE 2024", "Janvier 2025", "Divers"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        sort_month_labels(&mut labels);
        assert_eq!(
            labels,
            vec!["Février 2025", "Janvier 2025", "DÉCEMBRE 2024", "Mars 2024", "Notes", "Divers"]
        );
    }

    #[test]
    fn month_names_ignore_accents_and_case() {
        assert_eq!(month_index("août"), Some(7));
        assert_eq!(month_index("Fevrier"), Some(1));
        assert_eq!(month_index("Brumaire"), None);
        assert_eq!(parse_month_label("Mars"), None);
    }

    #[test]
    fn mondays_for_week_labels() {
        // March 2025 starts on a Saturday: S1 is Monday the 3rd
        let s1 = monday_for_week_label("Mars 2025", "S1").unwrap();
        assert_eq!(s1, d(2025, 3, 3).and_hms_opt(0, 0, 0).unwrap());
        let s3 = monday_for_week_label("Mars 2025", "S3").unwrap();
        assert_eq!(s3.date(), d(2025, 3, 17));
        // September 2025 starts on a Monday
        assert_eq!(monday_for_week_label("Septembre 2025", "x").unwrap().date(), d(2025, 9, 1));
        assert!(monday_for_week_label("Someday", "S1").is_none());
    }

    #[test]
    fn week_labels_by_number() {
        let mut w: Vec<String> = ["S10", "S2", "S1"].iter().map(|s| s.to_string()).collect();
        sort_week_labels(&mut w);
        assert_eq!(w, vec!["S1", "S2", "S10"]);

        assert_eq!(default_week(&w, d(2024, 1, 10)), Some("S2".to_string()));
        assert_eq!(default_week(&w, d(2024, 6, 10)), Some("S1".to_string()));
        assert_eq!(default_week(&[], d(2024, 6, 10)), None);
    }
}
