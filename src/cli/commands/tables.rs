use crate::cli::session::{client, load_connection, open_db};
use crate::config::Config;
use crate::errors::AppResult;
use crate::source::SourceClient;

/// List the tables reachable with the stored credentials; the connected one is starred.
pub async fn handle(cfg: &Config) -> AppResult<()> {
    let pool = open_db(cfg)?;
    let src = load_connection(&pool)?;

    let tables: Vec<(String, String)> = match client(cfg, &src) {
        SourceClient::Document(c) => c
            .list_tables()
            .await?
            .into_iter()
            .map(|t| (t.id, t.name))
            .collect(),
        SourceClient::Relational(c) => c
            .list_tables()
            .await?
            .into_iter()
            .map(|t| (t.clone(), t))
            .collect(),
    };

    if tables.is_empty() {
        println!("No tables visible.");
        return Ok(());
    }
    for (id, name) in tables {
        let mark = if id == src.table_id { "*" } else { " " };
        println!("{mark} {id:<24} {name}");
    }
    Ok(())
}
