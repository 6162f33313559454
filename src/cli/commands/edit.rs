use crate::cli::parser::Commands;
use crate::cli::session::{engine, load_connection, open_db, parse_role, split_assignment};
use crate::config::Config;
use crate::core::edit::CommitOutcome;
use crate::core::engine::RefreshMode;
use crate::db::log::audit;
use crate::errors::AppResult;
use crate::models::role::Role;
use crate::ui::messages::{info, success};
use serde_json::Value;

/// Open one row, apply the requested changes and save them in one write.
/// Without changes, the row is printed instead.
pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Edit {
        row_id,
        progress,
        set,
        note,
    } = cmd
    else {
        return Ok(());
    };

    let pool = open_db(cfg)?;
    let src = load_connection(&pool)?;
    let mut engine = engine(cfg, &src)?;
    engine.suppress_default_filter();
    engine.refresh(RefreshMode::Foreground).await?;
    engine.open_edit(row_id)?;

    if progress.is_none() && set.is_empty() && note.is_none() {
        if let Some(buf) = engine.edit_session().buffer() {
            let row = buf.row();
            println!("{} ({})", row.display_name, row.id);
            for role in engine.mapping().kind.roles() {
                if let Some(col) = engine.mapping().column(*role) {
                    println!("  {:<12} {}", role.code(), row.text(col));
                }
            }
        }
        engine.cancel_edit();
        return Ok(());
    }

    if let Some(p) = progress {
        engine.update_field(Role::Progress, Value::from(*p))?;
    }
    for arg in set {
        let (role, value) = split_assignment(arg)?;
        engine.update_field(parse_role(role)?, Value::from(value))?;
    }
    if let Some(text) = note {
        engine.append_note(text)?;
    }

    let report = engine.save_edit().await?;
    match &report.outcome {
        CommitOutcome::Saved(fields) => {
            let cols: Vec<&str> = fields.keys().map(String::as_str).collect();
            audit(&pool.conn, "edit", row_id, &cols.join(", "));
            success(format!(
                "Row {row_id} {} ({}).",
                engine.save_status().label(),
                cols.join(", ")
            ));
        }
        CommitOutcome::Unchanged => info("Nothing changed."),
    }
    if let Some(handle) = report.refresh
        && let Err(e) = handle.await
    {
        log::warn!("post-save refresh task ended abnormally: {e}");
    }
    Ok(())
}
