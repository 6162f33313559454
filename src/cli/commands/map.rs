use crate::cli::parser::Commands;
use crate::cli::session::{
    client, load_connection, open_db, parse_role, print_mapping, save_connection, split_assignment,
};
use crate::config::Config;
use crate::core::mapping::{MappingState, reinfer};
use crate::db::log::audit;
use crate::errors::AppResult;
use crate::source::RemoteSource;
use crate::ui::messages::{success, warning};

/// Show the mapping, or override it role by role. Manual choices survive re-inference.
pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Map {
        set,
        clear,
        reinfer: want_reinfer,
    } = cmd
    else {
        return Ok(());
    };

    let pool = open_db(cfg)?;
    let mut src = load_connection(&pool)?;

    if set.is_empty() && clear.is_empty() && !want_reinfer {
        println!(
            "Mapping for {} table '{}' ({}):",
            src.kind().as_str(),
            src.table_id,
            if src.mapping.is_resolved() { "resolved" } else { "needs mapping" }
        );
        print_mapping(src.mapping.mapping());
        return Ok(());
    }

    let columns = client(cfg, &src).list_columns(&src.table_id).await?;
    let mut mapping = src.mapping.mapping().clone();

    for code in clear {
        mapping.clear(parse_role(code)?);
    }
    for arg in set {
        let (role, column) = split_assignment(arg)?;
        mapping.assign(parse_role(role)?, column, &columns)?;
    }

    src.mapping = if *want_reinfer {
        reinfer(&mapping, &columns)
    } else {
        MappingState::from_mapping(mapping)
    };
    save_connection(&pool, &src)?;
    audit(
        &pool.conn,
        "map",
        &src.table_id,
        &format!("{} role(s) mapped", src.mapping.mapping().columns.len()),
    );

    print_mapping(src.mapping.mapping());
    if src.mapping.is_resolved() {
        success("Mapping saved.");
    } else {
        warning(format!(
            "'{}' is still unmapped; rows stay hidden until it is set.",
            src.kind().primary_role().code()
        ));
    }
    Ok(())
}
