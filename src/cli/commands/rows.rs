use crate::cli::parser::Commands;
use crate::cli::session::{engine, load_connection, open_db};
use crate::config::Config;
use crate::core::engine::{RefreshMode, SyncEngine};
use crate::core::mirror::{FilterSelection, Mirror};
use crate::errors::AppResult;
use crate::models::role::Role;
use crate::models::row::Row;
use crate::source::RemoteSource;
use crate::utils::colors::{GREY, color_for_priority, paint};
use crate::utils::formatting::progress_bar;
use crate::utils::table::Table;

pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Rows {
        group,
        assignee,
        all,
    } = cmd
    else {
        return Ok(());
    };

    let pool = open_db(cfg)?;
    let src = load_connection(&pool)?;
    let engine = engine(cfg, &src)?;

    apply_filter(&engine, group.as_deref(), assignee.as_deref(), *all);
    engine.refresh(RefreshMode::Foreground).await?;

    print_rows(&engine);
    Ok(())
}

/// Explicit values win; `--all` keeps the first fetch unfiltered.
pub fn apply_filter<S: RemoteSource + 'static>(
    engine: &SyncEngine<S>,
    group: Option<&str>,
    assignee: Option<&str>,
    all: bool,
) {
    if all {
        engine.suppress_default_filter();
    }
    if group.is_some() || assignee.is_some() {
        engine.set_filter(FilterSelection::new(
            group.unwrap_or_default(),
            assignee.unwrap_or_default(),
        ));
    }
}

/// Render the filtered view, one column per mapped role.
pub fn print_rows<S: RemoteSource + 'static>(engine: &SyncEngine<S>) {
    engine.with_mirror(|m| {
        let filter = m.filter();
        if !filter.is_empty() {
            println!(
                "{}",
                paint(
                    &format!("filter: group='{}' assignee='{}'", filter.group, filter.assignee),
                    GREY
                )
            );
        }

        let table = rows_table(m, m.filtered_rows());
        if table.is_empty() {
            println!("No rows match ({} fetched).", m.rows().len());
        } else {
            println!("{}", table.render());
            println!("{} of {} row(s)", m.filtered_rows().len(), m.rows().len());
        }
    });
}

fn rows_table(m: &Mirror, rows: &[Row]) -> Table {
    let mapping = m.mapping();
    let notes = mapping.kind.notes_role();
    let roles: Vec<Role> = mapping
        .kind
        .roles()
        .iter()
        .copied()
        .filter(|r| *r != notes && mapping.column(*r).is_some())
        .collect();

    let mut table = Table::new(
        std::iter::once("id".to_string())
            .chain(std::iter::once("name".to_string()))
            .chain(roles.iter().map(|r| r.code().to_string())),
    );

    for row in rows {
        let mut cells = vec![row.id.clone(), row.display_name.clone()];
        for role in &roles {
            let col = mapping.column(*role).unwrap_or_default();
            let cell = match role {
                Role::Progress => m
                    .progress_percent(row)
                    .map(|p| progress_bar(p, 10))
                    .unwrap_or_default(),
                Role::Priority => {
                    let v = row.text(col);
                    paint(&v, color_for_priority(&v))
                }
                _ => row.text(col),
            };
            cells.push(cell);
        }
        table.add_row(cells);
    }
    table
}
