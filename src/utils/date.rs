use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Locale used to name weekdays when picking the default group filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekdayLocale {
    #[default]
    Fr,
    En,
}

pub fn weekday_name(day: Weekday, locale: WeekdayLocale) -> &'static str {
    match locale {
        WeekdayLocale::Fr => match day {
            Weekday::Mon => "Lundi",
            Weekday::Tue => "Mardi",
            Weekday::Wed => "Mercredi",
            Weekday::Thu => "Jeudi",
            Weekday::Fri => "Vendredi",
            Weekday::Sat => "Samedi",
            Weekday::Sun => "Dimanche",
        },
        WeekdayLocale::En => match day {
            Weekday::Mon => "Monday",
            Weekday::Tue => "Tuesday",
            Weekday::Wed => "Wednesday",
            Weekday::Thu => "Thursday",
            Weekday::Fri => "Friday",
            Weekday::Sat => "Saturday",
            Weekday::Sun => "Sunday",
        },
    }
}

/// First Monday on or after `date`.
pub fn first_monday_on_or_after(date: NaiveDate) -> NaiveDate {
    let shift = (7 - date.weekday().num_days_from_monday()) % 7;
    date + chrono::Duration::days(i64::from(shift))
}
