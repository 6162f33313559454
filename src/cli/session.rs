//! Shared plumbing for the command handlers: local store, stored connection,
//! engine construction and the persisted timer.

use crate::config::Config;
use crate::core::engine::SyncEngine;
use crate::core::mapping::RoleMapping;
use crate::core::tracker::{ActiveTimerSession, TimeTracker};
use crate::db::pool::DbPool;
use crate::db::store::KvStore;
use crate::errors::{AppError, AppResult};
use crate::models::role::Role;
use crate::models::source_config::SourceConfig;
use crate::source::{Limits, SourceClient};

pub fn open_db(cfg: &Config) -> AppResult<DbPool> {
    DbPool::open_initialized(&cfg.database)
}

pub fn limits(cfg: &Config) -> Limits {
    Limits {
        rows: cfg.row_limit,
        tasks: cfg.task_limit,
    }
}

pub fn stored_connection(pool: &DbPool) -> AppResult<Option<SourceConfig>> {
    KvStore::new(&pool.conn).get(SourceConfig::STORE_KEY)
}

pub fn load_connection(pool: &DbPool) -> AppResult<SourceConfig> {
    stored_connection(pool)?.ok_or(AppError::NotConnected)
}

pub fn save_connection(pool: &DbPool, src: &SourceConfig) -> AppResult<()> {
    KvStore::new(&pool.conn).set(SourceConfig::STORE_KEY, src)
}

pub fn client(cfg: &Config, src: &SourceConfig) -> SourceClient {
    SourceClient::from_config(src, limits(cfg))
}

pub fn engine(cfg: &Config, src: &SourceConfig) -> AppResult<SyncEngine<SourceClient>> {
    SyncEngine::new(client(cfg, src), src.table_id.clone(), &src.mapping, cfg.weekday_locale)
}

pub fn load_tracker(pool: &DbPool) -> AppResult<TimeTracker> {
    let active: Option<ActiveTimerSession> =
        KvStore::new(&pool.conn).get(ActiveTimerSession::STORE_KEY)?;
    Ok(TimeTracker::restore(active))
}

/// Persist the tracker's running session, or clear it.
pub fn save_tracker(pool: &DbPool, tracker: &TimeTracker) -> AppResult<()> {
    let kv = KvStore::new(&pool.conn);
    match tracker.active() {
        Some(a) => kv.set(ActiveTimerSession::STORE_KEY, a),
        None => kv.remove(ActiveTimerSession::STORE_KEY).map(|_| ()),
    }
}

/// Split a `key=value` argument.
pub fn split_assignment(arg: &str) -> AppResult<(&str, &str)> {
    arg.split_once('=')
        .map(|(k, v)| (k.trim(), v.trim()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| AppError::Validation(format!("expected KEY=VALUE, got '{arg}'")))
}

pub fn parse_role(code: &str) -> AppResult<Role> {
    Role::from_code(code).ok_or_else(|| AppError::Validation(format!("unknown role '{code}'")))
}

/// One line per role of the mapping's kind: `role → column` or `-`.
pub fn print_mapping(mapping: &RoleMapping) {
    for role in mapping.kind.roles() {
        let col = mapping.column(*role).unwrap_or("-");
        println!("  {:<12} → {}", role.code(), col);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignments() {
        assert_eq!(split_assignment("group = c-1").unwrap(), ("group", "c-1"));
        assert_eq!(split_assignment("note=a=b").unwrap(), ("note", "a=b"));
        assert!(split_assignment("=x").is_err());
        assert!(split_assignment("nothing").is_err());
    }

    #[test]
    fn timer_roundtrips_through_store() {
        let pool = DbPool::in_memory().unwrap();
        let mut t = load_tracker(&pool).unwrap();
        assert!(t.active().is_none());

        t.start("task-9").unwrap();
        save_tracker(&pool, &t).unwrap();
        let restored = load_tracker(&pool).unwrap();
        assert_eq!(restored.active().unwrap().task_id, "task-9");

        t.discard();
        save_tracker(&pool, &t).unwrap();
        assert!(load_tracker(&pool).unwrap().active().is_none());
    }
}
