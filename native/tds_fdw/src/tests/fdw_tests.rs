//! Tests for fdw.rs - Host call sequences through the handler facade

// Allow unwrap() in tests for cleaner test code
#![allow(clippy::unwrap_used)]

use super::test_utils::{
    init_tracing, int4, opts, text, MockClient, MockScript, RecordingSink, StaticCatalog,
};
use crate::error::ErrorKind;
use crate::fdw::TdsFdw;
use crate::models::{OptionContext, Row};
use crate::protocol::TypeTag;

const EMPLOYEES: u32 = 1;
const LOCAL: u32 = 2;
const BROKEN: u32 = 3;

fn catalog() -> StaticCatalog {
    StaticCatalog::new()
        .with_table(
            EMPLOYEES,
            &[("database", "hr"), ("table", "employees")],
            &[("servername", "mssql.internal"), ("port", "1433")],
            &[("username", "reader"), ("password", "pw")],
        )
        .with_table(LOCAL, &[("query", "SELECT 1")], &[("servername", "localhost")], &[])
        .with_table(
            BROKEN,
            &[("table", "t"), ("query", "SELECT 1")],
            &[],
            &[],
        )
}

fn script() -> MockScript {
    MockScript::new()
        .column("id", TypeTag::INT4)
        .column("name", TypeTag::VARCHAR)
        .row(vec![int4(1), text("Ada")])
        .row(vec![int4(2), text("Grace")])
        .row(vec![int4(3), text("Edsger")])
}

#[test]
fn test_validator_entry_point() {
    assert!(TdsFdw::<MockClient, StaticCatalog>::validate(
        &opts(&[("servername", "x"), ("port", "1433")]),
        OptionContext::Server
    )
    .is_ok());

    let err = TdsFdw::<MockClient, StaticCatalog>::validate(
        &opts(&[("port", "1433")]),
        OptionContext::Table,
    )
    .unwrap_err();
    assert_eq!(err.sqlstate(), "HV00D");
}

#[test]
fn test_planning_sequence() {
    init_tracing();
    let client = MockClient::new(script());
    let fdw = TdsFdw::new(client.clone(), catalog()).with_notice_sink(RecordingSink::new());

    let rel = fdw.get_foreign_rel_size(EMPLOYEES).unwrap();
    assert_eq!(rel.rows, 1.0, "count reported after fetching one row");
    assert_eq!(rel.tuples, rel.rows);
    assert_eq!(client.commands(), vec!["SELECT * FROM employees"]);
    assert_eq!(client.databases(), vec!["hr"]);
    client.assert_balanced();

    let cost = fdw.estimate_costs(EMPLOYEES, &rel).unwrap();
    assert_eq!(cost.startup_cost, 25.0);
    assert_eq!(cost.total_cost, 26.0);

    let path = fdw.get_foreign_paths(EMPLOYEES, &rel).unwrap();
    assert_eq!(path.total_cost, cost.total_cost);
    assert_eq!(path.rows, rel.rows);
}

#[test]
fn test_local_table_costs() {
    let client = MockClient::new(script());
    let fdw = TdsFdw::new(client, catalog());
    let rel = crate::planner::rel_size(10);

    let cost = fdw.estimate_costs(LOCAL, &rel).unwrap();
    assert_eq!(cost.startup_cost, 0.0);
    assert_eq!(cost.total_cost, 10.0);
}

#[test]
fn test_scan_sequence() {
    let client = MockClient::new(script());
    let fdw = TdsFdw::new(client.clone(), catalog());

    let mut cursor = fdw.begin_foreign_scan(EMPLOYEES).unwrap();
    let mut slot: Option<Row> = None;
    let mut names = Vec::new();
    loop {
        cursor.iterate(&mut slot).unwrap();
        let Some(row) = slot.as_ref() else { break };
        names.push(row[1].as_str().unwrap().to_string());
    }
    cursor.close();

    assert_eq!(names, vec!["Ada", "Grace", "Edsger"]);
    assert_eq!(client.hosts(), vec!["mssql.internal:1433"]);
    client.assert_balanced();
}

#[test]
fn test_configuration_error_before_connecting() {
    let client = MockClient::new(script());
    let fdw = TdsFdw::new(client.clone(), catalog());

    let err = fdw.get_foreign_rel_size(BROKEN).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(fdw.begin_foreign_scan(BROKEN).is_err());
    assert!(client.events().is_empty(), "no protocol call was made");
}

#[test]
fn test_unknown_table() {
    let fdw = TdsFdw::new(MockClient::new(script()), catalog());
    assert_eq!(fdw.plan(99).unwrap_err().sqlstate(), "HV00R");
}

#[test]
fn test_analyze_not_supported() {
    let fdw = TdsFdw::new(MockClient::new(script()), catalog());
    assert!(!fdw.analyze_foreign_table(EMPLOYEES));
}
