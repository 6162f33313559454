use crate::cli::parser::Commands;
use crate::cli::session::{engine, load_connection, open_db, parse_role};
use crate::config::Config;
use crate::core::engine::RefreshMode;
use crate::errors::{AppError, AppResult};

/// Distinct values of one mapped role, as offered by the filters.
pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Facets { role } = cmd else {
        return Ok(());
    };

    let pool = open_db(cfg)?;
    let src = load_connection(&pool)?;
    let role = parse_role(role)?;
    if src.mapping.mapping().column(role).is_none() {
        return Err(AppError::Validation(format!(
            "role '{}' is not mapped",
            role.code()
        )));
    }

    let engine = engine(cfg, &src)?;
    engine.suppress_default_filter();
    engine.refresh(RefreshMode::Foreground).await?;

    let values = engine.facet_values(role);
    if values.is_empty() {
        println!("No values for '{}'.", role.code());
    }
    for v in values {
        println!("{v}");
    }
    Ok(())
}
