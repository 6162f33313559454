//! Progress values arrive either as fractions (0.26) or percentages (26).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressUnit {
    #[default]
    Fraction,
    Percentage,
}

/// Any observed value above 1 means the column stores percentages.
pub fn detect_unit<I>(values: I) -> ProgressUnit
where
    I: IntoIterator<Item = f64>,
{
    if values.into_iter().any(|v| v.is_finite() && v > 1.0) {
        ProgressUnit::Percentage
    } else {
        ProgressUnit::Fraction
    }
}

/// Display percent in 0..=100.
///
/// The value itself decides the reading: anything above 1 is already a
/// percentage, anything at or below 1 is scaled up.
pub fn to_percent(value: f64, _unit: ProgressUnit) -> u8 {
    let pct = if value > 1.0 { value } else { value * 100.0 };
    pct.round().clamp(0.0, 100.0) as u8
}

pub fn to_storage(percent: u8, unit: ProgressUnit) -> f64 {
    let p = f64::from(percent.min(100));
    match unit {
        ProgressUnit::Percentage => p,
        ProgressUnit::Fraction => p / 100.0,
    }
}
