//! Property-based tests using proptest
//!
//! These tests verify invariants of option resolution and the cost model
//! that should hold for all inputs.

// Allow unwrap() in tests for cleaner test code
#![allow(clippy::unwrap_used)]

use proptest::prelude::*;

use super::test_utils::opts;
use crate::error::{ErrorKind, TdsError};
use crate::models::{FdwOption, OptionContext};
use crate::options::{resolve_options, validate_options};
use crate::planner::estimate_cost;
use crate::utils::host_string;

fn context() -> impl Strategy<Value = OptionContext> {
    prop_oneof![
        Just(OptionContext::Wrapper),
        Just(OptionContext::Server),
        Just(OptionContext::Table),
        Just(OptionContext::UserMapping),
    ]
}

proptest! {
    /// Property: validation never panics on arbitrary option lists
    #[test]
    fn validate_never_panics(
        pairs in prop::collection::vec(("[a-z_]{0,12}", ".{0,20}"), 0..8),
        ctx in context()
    ) {
        let options: Vec<_> = pairs
            .iter()
            .map(|(n, v)| FdwOption::new(n.as_str(), v.as_str()))
            .collect();
        let _ = validate_options(&options, ctx);
    }

    /// Property: a `table` option always resolves to `SELECT * FROM <table>`
    #[test]
    fn table_resolves_to_select_star(table in "[A-Za-z_][A-Za-z0-9_.\\[\\]]{0,30}") {
        let plan = resolve_options(&opts(&[("table", table.as_str())]), &[], &[]).unwrap();
        prop_assert_eq!(plan.query(), format!("SELECT * FROM {table}"));
    }

    /// Property: `query` together with `table` never resolves, at any levels
    #[test]
    fn query_with_table_always_conflicts(
        query in ".{1,40}",
        table in "[a-z]{1,10}",
        query_level in 0usize..3,
        table_level in 0usize..3
    ) {
        let mut levels = [Vec::new(), Vec::new(), Vec::new()];
        levels[query_level].push(FdwOption::new("query", query));
        levels[table_level].push(FdwOption::new("table", table));

        let err = resolve_options(&levels[0], &levels[1], &levels[2]).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::Configuration);
        let is_conflict = matches!(err, TdsError::ConflictingOptions { .. });
        prop_assert!(is_conflict);
    }

    /// Property: without `query` or `table`, resolution always fails
    #[test]
    fn neither_query_nor_table_fails(
        servername in "[a-z0-9.]{1,20}",
        database in "[a-z]{1,10}"
    ) {
        let err = resolve_options(
            &opts(&[("database", database.as_str())]),
            &opts(&[("servername", servername.as_str())]),
            &[],
        )
        .unwrap_err();
        let is_missing = matches!(err, TdsError::MissingQueryOrTable);
        prop_assert!(is_missing);
    }

    /// Property: ports in range are accepted and show up in the host string
    #[test]
    fn valid_ports_resolve(port in 1u16..=u16::MAX) {
        let port_text = port.to_string();
        let plan = resolve_options(
            &opts(&[("table", "t")]),
            &opts(&[("servername", "db"), ("port", port_text.as_str())]),
            &[],
        )
        .unwrap();
        prop_assert_eq!(plan.port(), Some(port));
        prop_assert_eq!(plan.host_string(), format!("db:{port}"));
    }

    /// Property: ports out of range are rejected
    #[test]
    fn out_of_range_ports_rejected(port in 65536u32..10_000_000) {
        let port_text = port.to_string();
        let result = validate_options(&opts(&[("port", port_text.as_str())]), OptionContext::Server);
        let is_invalid_port = matches!(result, Err(TdsError::InvalidPort { .. }));
        prop_assert!(is_invalid_port);
    }

    /// Property: startup cost depends only on locality, total is linear in rows
    #[test]
    fn cost_model(rows in 0.0f64..1e12, remote in "[a-z]{3,12}\\.example\\.com") {
        for (servername, startup) in [("127.0.0.1", 0.0), ("localhost", 0.0), (remote.as_str(), 25.0)] {
            let plan = resolve_options(
                &opts(&[("table", "t")]),
                &opts(&[("servername", servername)]),
                &[],
            )
            .unwrap();
            let cost = estimate_cost(&plan, rows);
            prop_assert_eq!(cost.startup_cost, startup);
            prop_assert_eq!(cost.total_cost, startup + rows);
        }
    }

    /// Property: no port means the bare server name
    #[test]
    fn host_string_without_port(servername in "[a-zA-Z0-9.-]{1,30}") {
        prop_assert_eq!(host_string(&servername, None), servername.clone());
    }
}
