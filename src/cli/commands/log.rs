use crate::cli::parser::Commands;
use crate::cli::session::open_db;
use crate::config::Config;
use crate::core::log::LogLogic;
use crate::errors::AppResult;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if matches!(cmd, Commands::Log { print: true }) {
        let pool = open_db(cfg)?;
        LogLogic::print_log(&pool)?;
    }

    Ok(())
}
