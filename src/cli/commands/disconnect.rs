use crate::cli::session::{load_tracker, open_db};
use crate::config::Config;
use crate::core::tracker::ActiveTimerSession;
use crate::db::log::audit;
use crate::db::store::KvStore;
use crate::errors::AppResult;
use crate::models::source_config::SourceConfig;
use crate::ui::messages::{info, success, warning};

/// Forget the stored connection. A running timer is dropped, not recorded.
pub fn handle(cfg: &Config) -> AppResult<()> {
    let pool = open_db(cfg)?;
    if let Some(active) = load_tracker(&pool)?.active() {
        warning(format!(
            "Discarding the running timer on task {}",
            active.task_id
        ));
    }

    let kv = KvStore::new(&pool.conn);
    kv.remove(ActiveTimerSession::STORE_KEY)?;
    if kv.remove(SourceConfig::STORE_KEY)? {
        audit(&pool.conn, "disconnect", "", "connection removed");
        success("Disconnected.");
    } else {
        info("Not connected.");
    }
    Ok(())
}
