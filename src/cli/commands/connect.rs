use crate::cli::parser::{Commands, ConnectTarget};
use crate::cli::session::{open_db, print_mapping, save_connection, stored_connection};
use crate::config::Config;
use crate::core::engine::discover_mapping;
use crate::core::mapping::{MappingState, RoleMapping};
use crate::db::log::audit;
use crate::errors::{AppError, AppResult};
use crate::models::role::SourceKind;
use crate::models::source_config::{Credentials, SourceConfig};
use crate::source::document::{DocumentClient, parse_document_url};
use crate::source::relational::{RelationalClient, TABLE_CANDIDATES};
use crate::source::DOCUMENT_API_ENV;
use crate::ui::messages::{info, success, warning};

/// Handle `connect document|relational`: discover the table, infer the
/// mapping and store the connection.
pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Connect { target } = cmd else {
        return Ok(());
    };
    let pool = open_db(cfg)?;
    let previous = stored_connection(&pool)?;

    let src = match target {
        ConnectTarget::Document {
            token,
            url,
            doc_id,
            table_id,
        } => {
            connect_document(
                token,
                url.as_deref(),
                doc_id.clone(),
                table_id.clone(),
                previous.as_ref(),
            )
            .await?
        }
        ConnectTarget::Relational {
            url,
            key,
            table,
            user,
        } => connect_relational(url, key, table.clone(), user.clone(), previous.as_ref()).await?,
    };

    save_connection(&pool, &src)?;
    audit(
        &pool.conn,
        "connect",
        &src.table_id,
        &format!("{} source {}", src.kind().as_str(), src.source_id),
    );

    success(format!(
        "Connected to {} table '{}'",
        src.kind().as_str(),
        src.table_id
    ));
    print_mapping(src.mapping.mapping());
    if let MappingState::NeedsMapping(m) = &src.mapping {
        warning(format!(
            "No column looks like '{}'. Pick one with `rtasksync map --set {}=<column_id>`.",
            m.kind.primary_role().code(),
            m.kind.primary_role().code()
        ));
    }
    Ok(())
}

/// Mapping kept from the stored connection when it points at the same table.
fn previous_mapping<'a>(
    previous: Option<&'a SourceConfig>,
    kind: SourceKind,
    source_id: &str,
    table: &str,
) -> Option<&'a RoleMapping> {
    previous
        .filter(|p| p.kind() == kind && p.source_id == source_id && p.table_id == table)
        .map(|p| p.mapping.mapping())
}

async fn connect_document(
    token: &str,
    url: Option<&str>,
    doc_id: Option<String>,
    table_id: Option<String>,
    previous: Option<&SourceConfig>,
) -> AppResult<SourceConfig> {
    let parsed = url.map(parse_document_url).unwrap_or_default();
    let doc_id = doc_id.or(parsed.doc_id);
    let table_id = table_id.or(parsed.table_id);

    let mut client = DocumentClient::new(token, doc_id.clone().unwrap_or_default());
    if let Ok(base) = std::env::var(DOCUMENT_API_ENV) {
        client = client.with_base_url(base);
    }

    if !client.validate_token().await? {
        return Err(AppError::Auth("token rejected by the document API".into()));
    }

    let doc_id = match (doc_id, &table_id) {
        (Some(d), _) => d,
        (None, Some(t)) => {
            info(format!("Looking for the document holding table {t}…"));
            client
                .find_doc_for_table(t)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("no visible document holds table {t}")))?
        }
        (None, None) => {
            let docs = client.list_docs().await?;
            for d in &docs {
                println!("  {}  {}", d.id, d.name);
            }
            return Err(AppError::Validation(
                "pass --doc (or --url) to pick a document".into(),
            ));
        }
    };
    client = client.with_doc(doc_id.clone());

    let Some(table_id) = table_id else {
        for t in client.list_tables().await? {
            println!("  {}  {}", t.id, t.name);
        }
        return Err(AppError::Validation(
            "pass --table (or a URL with a table) to pick a table".into(),
        ));
    };

    let prev = previous_mapping(previous, SourceKind::Document, &doc_id, &table_id);
    let mapping = discover_mapping(&client, SourceKind::Document, &table_id, prev).await?;

    Ok(SourceConfig {
        source_id: doc_id,
        table_id,
        mapping,
        credentials: Credentials::Document {
            token: token.to_string(),
        },
        user_id: None,
    })
}

async fn connect_relational(
    url: &str,
    key: &str,
    table: Option<String>,
    user: Option<String>,
    previous: Option<&SourceConfig>,
) -> AppResult<SourceConfig> {
    let client = RelationalClient::new(url, key);
    let source_id = url.trim_end_matches('/').to_string();

    let table = match table {
        Some(t) => t,
        None => client.find_table(TABLE_CANDIDATES).await?.ok_or_else(|| {
            AppError::NotFound(format!(
                "none of the usual tables exist ({}), pass --table",
                TABLE_CANDIDATES.join(", ")
            ))
        })?,
    };

    let prev = previous_mapping(previous, SourceKind::Relational, &source_id, &table);
    let mapping = discover_mapping(&client, SourceKind::Relational, &table, prev).await?;

    Ok(SourceConfig {
        source_id,
        table_id: table,
        mapping,
        credentials: Credentials::Relational {
            url: url.to_string(),
            anon_key: key.to_string(),
        },
        user_id: user.filter(|u| !u.trim().is_empty()),
    })
}
