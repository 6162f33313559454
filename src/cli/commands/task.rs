use crate::cli::parser::Commands;
use crate::cli::session::{client, load_connection, open_db};
use crate::config::Config;
use crate::core::aggregate::{completion_update, progress_update};
use crate::db::log::audit;
use crate::errors::{AppError, AppResult};
use crate::source::TaskFeed;
use crate::ui::messages::success;

/// Set progress or completion of one time-tracking task.
pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Task {
        task_id,
        progress,
        done,
        reopen,
    } = cmd
    else {
        return Ok(());
    };

    let fields = match (progress, *done, *reopen) {
        (Some(p), false, false) => progress_update(*p),
        (None, true, false) => completion_update(true),
        (None, false, true) => completion_update(false),
        (None, false, false) => {
            return Err(AppError::Validation(
                "pass --progress, --done or --reopen".into(),
            ));
        }
        _ => {
            return Err(AppError::Validation(
                "--progress cannot be combined with --done/--reopen".into(),
            ));
        }
    };

    let pool = open_db(cfg)?;
    let src = load_connection(&pool)?;
    let source = client(cfg, &src);
    source.task_feed()?.update_task(task_id, &fields).await?;

    let summary = fields
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(", ");
    audit(&pool.conn, "edit", task_id, &summary);
    success(format!("Task {task_id} updated ({summary})."));
    Ok(())
}
