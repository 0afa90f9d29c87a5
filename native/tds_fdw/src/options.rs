/// Option validation and resolution.
///
/// Options live on three catalog objects: the foreign table (`database`,
/// `query`, `table`), the foreign server (`servername`, `language`,
/// `character_set`, `port`) and the user mapping (`username`, `password`).
///
/// [`validate_options`] checks one object's options when it is defined.
/// [`resolve_options`] merges the three lists for a table into a
/// [`ConnectionPlan`], applying defaults and synthesizing the query.
use secrecy::SecretString;

use crate::constants::{DEFAULT_SERVERNAME, TABLE_QUERY_PREFIX, VALID_OPTIONS};
use crate::error::{Result, TdsError};
use crate::host::{ForeignTableId, OptionCatalog};
use crate::models::{ConnectionPlan, FdwOption, OptionContext, QuerySource};

/// True when `name` is accepted on catalog objects of kind `context`.
pub fn is_valid_option(name: &str, context: OptionContext) -> bool {
    VALID_OPTIONS
        .iter()
        .any(|(option, ctx)| *ctx == context && *option == name)
}

/// Names accepted on catalog objects of kind `context`, in table order.
pub fn valid_options_for(context: OptionContext) -> Vec<&'static str> {
    VALID_OPTIONS
        .iter()
        .filter(|(_, ctx)| *ctx == context)
        .map(|(option, _)| *option)
        .collect()
}

/// Validate the options of one catalog object.
///
/// Fails on the first unknown name, repeated name, or `query`/`table`
/// conflict, in list order.
pub fn validate_options(options: &[FdwOption], context: OptionContext) -> Result<()> {
    let mut set = OptionSet::default();

    for option in options {
        tracing::debug!(option = %option.name, %context, "validating option");

        if !is_valid_option(&option.name, context) {
            return Err(TdsError::InvalidOption {
                name: option.name.clone(),
                context,
                valid: valid_options_for(context),
            });
        }

        set.apply(option)?;
    }

    Ok(())
}

/// Merge table, server and user mapping options into a connection plan.
///
/// Lists are applied in that order. A name repeated within one list is an
/// error; names the wrapper does not know are skipped.
pub fn resolve_options(
    table: &[FdwOption],
    server: &[FdwOption],
    user_mapping: &[FdwOption],
) -> Result<ConnectionPlan> {
    let mut merged = OptionSet::default();

    for level in [table, server, user_mapping] {
        let mut seen = OptionSet::default();
        for option in level {
            if !VALID_OPTIONS.iter().any(|(name, _)| *name == option.name) {
                tracing::warn!(option = %option.name, "ignoring unknown option");
                continue;
            }
            seen.apply(option).map_err(|e| match e {
                // Report the conflict the same way whichever option came first.
                TdsError::ConflictingOptions { .. } => TdsError::ConflictingOptions {
                    option: "query",
                    other: "table",
                },
                other => other,
            })?;
        }
        merged.merge(seen);
    }

    merged.into_plan()
}

/// Look up a foreign table's options in the host catalog and resolve them.
pub fn resolve_for_table<K>(catalog: &K, table: ForeignTableId) -> Result<ConnectionPlan>
where
    K: OptionCatalog + ?Sized,
{
    let options = catalog.foreign_table_options(table)?;
    let plan = resolve_options(&options.table, &options.server, &options.user_mapping)?;

    tracing::debug!(
        table,
        host = %plan.host_string(),
        query = %plan.query(),
        "resolved connection plan"
    );

    Ok(plan)
}

/// Option values collected from one or more lists, before defaults apply.
#[derive(Default)]
struct OptionSet {
    servername: Option<String>,
    language: Option<String>,
    character_set: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<SecretString>,
    database: Option<String>,
    query: Option<String>,
    table: Option<String>,
}

impl OptionSet {
    /// Record one option, rejecting repeats and `query`/`table` conflicts.
    fn apply(&mut self, option: &FdwOption) -> Result<()> {
        let value = &option.value;
        let redundant = || TdsError::RedundantOption {
            name: option.name.clone(),
            value: value.clone(),
        };

        match option.name.as_str() {
            "servername" => set_once(&mut self.servername, value.clone(), redundant),
            "language" => set_once(&mut self.language, value.clone(), redundant),
            "character_set" => set_once(&mut self.character_set, value.clone(), redundant),
            "port" => {
                let port = parse_port(value)?;
                set_once(&mut self.port, port, redundant)
            }
            "username" => set_once(&mut self.username, value.clone(), redundant),
            "password" => {
                if self.password.is_some() {
                    // Never echo a password back in an error message.
                    return Err(TdsError::RedundantOption {
                        name: option.name.clone(),
                        value: "********".to_string(),
                    });
                }
                self.password = Some(SecretString::from(value.clone()));
                Ok(())
            }
            "database" => set_once(&mut self.database, value.clone(), redundant),
            "query" => {
                if self.table.is_some() {
                    return Err(TdsError::ConflictingOptions {
                        option: "query",
                        other: "table",
                    });
                }
                set_once(&mut self.query, value.clone(), redundant)
            }
            "table" => {
                if self.query.is_some() {
                    return Err(TdsError::ConflictingOptions {
                        option: "table",
                        other: "query",
                    });
                }
                set_once(&mut self.table, value.clone(), redundant)
            }
            _ => Ok(()),
        }
    }

    /// Overlay `other` on top of `self`; values set in `other` win.
    fn merge(&mut self, other: OptionSet) {
        overlay(&mut self.servername, other.servername);
        overlay(&mut self.language, other.language);
        overlay(&mut self.character_set, other.character_set);
        overlay(&mut self.port, other.port);
        overlay(&mut self.username, other.username);
        overlay(&mut self.password, other.password);
        overlay(&mut self.database, other.database);
        overlay(&mut self.query, other.query);
        overlay(&mut self.table, other.table);
    }

    fn into_plan(self) -> Result<ConnectionPlan> {
        let (query, source) = match (self.query, self.table) {
            (Some(_), Some(_)) => {
                return Err(TdsError::ConflictingOptions {
                    option: "query",
                    other: "table",
                })
            }
            (Some(query), None) => (query, QuerySource::Query),
            (None, Some(table)) => (
                format!("{TABLE_QUERY_PREFIX}{table}"),
                QuerySource::Table(table),
            ),
            (None, None) => return Err(TdsError::MissingQueryOrTable),
        };

        let servername = self.servername.unwrap_or_else(|| {
            tracing::debug!("servername not set, using default {DEFAULT_SERVERNAME}");
            DEFAULT_SERVERNAME.to_string()
        });

        Ok(ConnectionPlan {
            servername,
            port: self.port,
            language: self.language,
            character_set: self.character_set,
            username: self.username,
            password: self.password,
            database: self.database,
            query,
            source,
        })
    }
}

fn set_once<T>(slot: &mut Option<T>, value: T, redundant: impl FnOnce() -> TdsError) -> Result<()> {
    if slot.is_some() {
        return Err(redundant());
    }
    *slot = Some(value);
    Ok(())
}

fn overlay<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

fn parse_port(value: &str) -> Result<u16> {
    match value.trim().parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(TdsError::InvalidPort {
            value: value.to_string(),
        }),
    }
}
