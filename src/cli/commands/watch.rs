use crate::cli::commands::rows::{apply_filter, print_rows};
use crate::cli::parser::Commands;
use crate::cli::session::{engine, load_connection, open_db};
use crate::config::Config;
use crate::core::engine::RefreshMode;
use crate::errors::AppResult;
use crate::ui::messages::info;
use chrono::Local;
use std::io::Write;
use std::time::Duration;

/// Keep the mirror fresh until Ctrl-C, re-printing rows after each refresh.
pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Watch {
        interval,
        group,
        assignee,
        ticks,
    } = cmd
    else {
        return Ok(());
    };

    let pool = open_db(cfg)?;
    let src = load_connection(&pool)?;
    let mut engine = engine(cfg, &src)?;
    apply_filter(&engine, group.as_deref(), assignee.as_deref(), false);

    engine.refresh(RefreshMode::Foreground).await?;
    print_rows(&engine);

    let every = interval
        .map(|s| Duration::from_secs(s.max(1)))
        .unwrap_or_else(|| cfg.refresh_interval());
    engine.start_auto_refresh(every);
    info(format!("Watching {} (Ctrl-C to stop)", src.table_id));

    let mut seen = engine.with_mirror(|m| m.refreshed_at());
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    let mut count = 0u64;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = ticker.tick() => {
                let latest = engine.with_mirror(|m| m.refreshed_at());
                if latest != seen {
                    seen = latest;
                    println!();
                    print_rows(&engine);
                }
                print!("\r{}  ", engine.countdown());
                let _ = std::io::stdout().flush();

                count += 1;
                if ticks.is_some_and(|n| count >= n) {
                    break;
                }
            }
        }
    }

    engine.stop_auto_refresh();
    println!("\nStopped at {}", Local::now().format("%H:%M:%S"));
    Ok(())
}
