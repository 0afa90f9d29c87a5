#![no_main]
//! Structured option fuzzing
//!
//! Generates option lists drawn mostly from the recognized option names so
//! the fuzzer spends its time on redundancy, conflict and port handling
//! rather than on unknown names.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tds_fdw::{resolve_options, validate_options, FdwOption, OptionContext, TdsError};

#[derive(Debug, Arbitrary)]
enum OptionName {
    Servername,
    Language,
    CharacterSet,
    Port,
    Username,
    Password,
    Database,
    Query,
    Table,
    /// Arbitrary, usually unknown, name
    Other(String),
}

impl OptionName {
    fn as_str(&self) -> &str {
        match self {
            OptionName::Servername => "servername",
            OptionName::Language => "language",
            OptionName::CharacterSet => "character_set",
            OptionName::Port => "port",
            OptionName::Username => "username",
            OptionName::Password => "password",
            OptionName::Database => "database",
            OptionName::Query => "query",
            OptionName::Table => "table",
            OptionName::Other(name) => name,
        }
    }
}

#[derive(Debug, Arbitrary)]
struct Input {
    table: Vec<(OptionName, String)>,
    server: Vec<(OptionName, String)>,
    user_mapping: Vec<(OptionName, String)>,
}

fn to_options(level: &[(OptionName, String)]) -> Vec<FdwOption> {
    level
        .iter()
        .map(|(name, value)| FdwOption::new(name.as_str(), value.as_str()))
        .collect()
}

fuzz_target!(|input: Input| {
    let table = to_options(&input.table);
    let server = to_options(&input.server);
    let user_mapping = to_options(&input.user_mapping);

    let _ = validate_options(&table, OptionContext::Table);
    let _ = validate_options(&server, OptionContext::Server);
    let _ = validate_options(&user_mapping, OptionContext::UserMapping);

    match resolve_options(&table, &server, &user_mapping) {
        Ok(plan) => {
            if let Some(port) = plan.port() {
                assert!(port > 0);
                assert!(plan.host_string().ends_with(&format!(":{port}")));
            }
        }
        Err(TdsError::ConflictingOptions { option, other }) => {
            assert_eq!((option, other), ("query", "table"));
        }
        Err(err) => {
            let _ = err.sqlstate();
        }
    }
});
