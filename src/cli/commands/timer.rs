use crate::cli::parser::{Commands, TimerAction};
use crate::cli::session::{client, load_connection, load_tracker, open_db, save_tracker};
use crate::config::Config;
use crate::core::tracker::ActiveTimerSession;
use crate::db::log::audit;
use crate::errors::AppResult;
use crate::source::TaskFeed;
use crate::ui::messages::{info, success, warning};
use crate::utils::time::format_elapsed;
use chrono::{Local, Utc};
use std::io::Write;
use std::time::Duration;

/// One running timer at a time, kept in the local store between invocations.
pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Timer { action } = cmd else {
        return Ok(());
    };
    let pool = open_db(cfg)?;
    let mut tracker = load_tracker(&pool)?;

    match action {
        TimerAction::Start { task_id } => {
            let started = tracker.start(task_id)?.start_time;
            save_tracker(&pool, &tracker)?;
            audit(&pool.conn, "timer", task_id, "started");
            success(format!(
                "Timer started on task {task_id} at {}",
                started.with_timezone(&Local).format("%H:%M:%S")
            ));
        }
        TimerAction::Stop => {
            let src = load_connection(&pool)?;
            let source = client(cfg, &src);
            let feed = source.task_feed()?;

            let task = match tracker.active() {
                Some(a) => {
                    let tasks = feed.fetch_tasks(src.user_id.as_deref()).await?;
                    tasks.into_iter().find(|t| t.id == a.task_id)
                }
                None => None,
            };

            let result = tracker
                .stop(feed, task.as_ref(), src.user_id.as_deref())
                .await;
            // Persist whatever state the stop left behind.
            save_tracker(&pool, &tracker)?;

            match result? {
                Some(entry) => {
                    audit(
                        &pool.conn,
                        "timer",
                        &entry.task_id,
                        &format!("{} min recorded", entry.duration_minutes),
                    );
                    success(format!(
                        "Recorded {} min on task {}",
                        entry.duration_minutes, entry.task_id
                    ));
                    info("Run `rtasksync period` to see it in the totals.");
                }
                None => warning("Timer ran for less than 2 seconds, nothing recorded."),
            }
        }
        TimerAction::Status { follow, ticks } => match tracker.active() {
            Some(a) if *follow || ticks.is_some() => follow_timer(a, *ticks).await,
            Some(a) => println!("{}", status_line(a)),
            None => info("No timer running."),
        },
    }
    Ok(())
}

fn status_line(a: &ActiveTimerSession) -> String {
    format!(
        "⏱  task {} running for {}",
        a.task_id,
        format_elapsed(a.elapsed_secs(Utc::now()))
    )
}

/// Redraw the elapsed time every second until Ctrl-C.
async fn follow_timer(a: &ActiveTimerSession, ticks: Option<u64>) {
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    let mut count = 0u64;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = ticker.tick() => {
                print!("\r{}  ", status_line(a));
                let _ = std::io::stdout().flush();

                count += 1;
                if ticks.is_some_and(|n| count >= n) {
                    break;
                }
            }
        }
    }
    println!("\nStopped at {}", Local::now().format("%H:%M:%S"));
}
