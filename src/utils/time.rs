//! Time utilities: countdown and stopwatch formatting.

use std::time::Duration;

/// `4m 59s` style, used by the refresh countdown.
pub fn format_countdown(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{}m {}s", secs / 60, secs % 60)
}

/// `HH:MM:SS`, used by the running timer.
pub fn format_elapsed(secs: i64) -> String {
    let s = secs.max(0);
    format!("{:02}:{:02}:{:02}", s / 3600, (s % 3600) / 60, s % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats() {
        assert_eq!(format_countdown(Duration::from_secs(299)), "4m 59s");
        assert_eq!(format_countdown(Duration::from_millis(999)), "0m 0s");
        assert_eq!(format_elapsed(3725), "01:02:05");
    }
}
