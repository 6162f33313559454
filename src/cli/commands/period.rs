use crate::cli::parser::Commands;
use crate::cli::session::{client, load_connection, load_tracker, open_db};
use crate::config::Config;
use crate::core::aggregate::PeriodSelection;
use crate::core::engine::{PeriodReport, load_period};
use crate::errors::AppResult;
use crate::ui::messages::header;
use crate::utils::colors::{GREEN, GREY, paint};
use crate::utils::date::today;
use crate::utils::formatting::{bold, mins2readable, progress_bar};
use crate::utils::time::format_elapsed;
use chrono::Utc;

/// Month/week overview of the time-tracking tasks, grouped by client.
pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Period {
        month,
        week,
        search,
    } = cmd
    else {
        return Ok(());
    };

    let pool = open_db(cfg)?;
    let src = load_connection(&pool)?;
    let source = client(cfg, &src);
    let feed = source.task_feed()?;

    let wanted = PeriodSelection {
        month: month.clone(),
        week: week.clone(),
        search: search.clone().filter(|s| !s.trim().is_empty()),
    };
    let report = load_period(feed, src.user_id.as_deref(), &wanted, today()).await?;
    print_report(&report);

    if let Some(active) = load_tracker(&pool)?.active() {
        println!(
            "\n⏱  timer running on task {} for {}",
            active.task_id,
            format_elapsed(active.elapsed_secs(Utc::now()))
        );
    }
    Ok(())
}

fn print_report(r: &PeriodReport) {
    let sel = &r.selection;
    let title = match &sel.search {
        Some(s) => format!("Search \"{s}\""),
        None => format!(
            "{} / {}",
            sel.month.as_deref().unwrap_or("-"),
            sel.week.as_deref().unwrap_or("-")
        ),
    };
    header(title);

    if sel.search.is_none() {
        println!("{}", paint(&format!("months: {}", r.months.join(", ")), GREY));
        println!("{}", paint(&format!("weeks:  {}", r.weeks.join(", ")), GREY));
        println!();
    }

    if r.groups.is_empty() {
        println!("No tasks for this selection.");
    }
    for g in &r.groups {
        let pending = if g.remaining == 0 {
            paint("done", GREEN)
        } else {
            format!("{} left", g.remaining)
        };
        println!("{}  ({pending})", bold(&g.name));
        for t in &g.tasks {
            let mark = if t.completed { "[x]" } else { "[ ]" };
            let pct = t.progress_value().round().clamp(0.0, 100.0) as u8;
            println!(
                "  {mark} {:<40} {}  {:>7}  {}",
                t.title(),
                progress_bar(pct, 10),
                mins2readable(t.estimated().round() as i64),
                paint(&t.id, GREY)
            );
        }
    }

    let s = &r.summary;
    println!();
    println!(
        "{} task(s), {}% overall | estimated {} | done {} | remaining {} | tracked {}",
        s.task_count,
        s.global_progress,
        mins2readable(s.total_estimated.round() as i64),
        mins2readable(s.total_worked.round() as i64),
        mins2readable(s.remaining.round() as i64),
        mins2readable(s.tracked_minutes)
    );
}
