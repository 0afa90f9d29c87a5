//! Tests for planner.rs - Row count estimation and the cost model

// Allow unwrap() in tests for cleaner test code
#![allow(clippy::unwrap_used)]

use super::test_utils::{
    int4, local_plan, plan_with, remote_plan, MockClient, MockScript, RecordingSink, Step,
};
use crate::error::{ErrorKind, TdsError};
use crate::models::RelSize;
use crate::planner::{estimate_cost, estimate_size, foreign_path, rel_size, startup_cost};
use crate::protocol::{ResultsStatus, RowStatus, TypeTag};

fn three_rows() -> MockScript {
    MockScript::new()
        .column("id", TypeTag::INT4)
        .row(vec![int4(1)])
        .row(vec![int4(2)])
        .row(vec![int4(3)])
        .count(3)
}

mod size {
    use super::*;

    #[test]
    fn test_reported_count_is_the_estimate() {
        let client = MockClient::new(three_rows());
        let rows = estimate_size(&client, &remote_plan("SELECT id FROM t"), RecordingSink::new())
            .unwrap();

        assert_eq!(rows, 3);
        assert_eq!(client.count_of("fetch"), 1, "fetches at most one row");
        assert_eq!(client.count_of("close"), 1);
        client.assert_balanced();
    }

    #[test]
    fn test_no_result_set_estimates_zero() {
        let client = MockClient::new(MockScript::new().results(ResultsStatus::NoMoreResults));
        let rows = estimate_size(&client, &local_plan("EXEC sp_who"), RecordingSink::new())
            .unwrap();

        assert_eq!(rows, 0);
        assert_eq!(client.count_of("fetch"), 0);
        client.assert_balanced();
    }

    #[test]
    fn test_unknown_count_falls_back_to_rows_seen() {
        let client = MockClient::new(
            MockScript::new()
                .column("id", TypeTag::INT4)
                .row(vec![int4(1)])
                .count(-1),
        );
        let rows = estimate_size(&client, &local_plan("SELECT 1"), RecordingSink::new()).unwrap();
        assert_eq!(rows, 1);

        let client = MockClient::new(MockScript::new().count(-1));
        let rows = estimate_size(&client, &local_plan("SELECT 1"), RecordingSink::new()).unwrap();
        assert_eq!(rows, 0);
    }

    #[test]
    fn test_execution_failure_closes_session() {
        let client = MockClient::new(three_rows().failing(Step::Exec));
        let err = estimate_size(&client, &remote_plan("SELECT id FROM t"), RecordingSink::new())
            .unwrap_err();

        assert!(matches!(err, TdsError::Execute { .. }));
        assert_eq!(client.count_of("close"), 1);
        client.assert_balanced();
    }

    #[test]
    fn test_fetch_failure_uses_planning_context() {
        let client = MockClient::new(MockScript::new().end_with(RowStatus::Fail));
        let err = estimate_size(&client, &remote_plan("SELECT 1"), RecordingSink::new())
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Failed to get row while getting plan for query"
        );
        client.assert_balanced();
    }

    #[test]
    fn test_buffer_full_while_planning() {
        let client = MockClient::new(MockScript::new().end_with(RowStatus::BufferFull));
        let err = estimate_size(&client, &remote_plan("SELECT 1"), RecordingSink::new())
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Resource);
        assert_eq!(
            err.to_string(),
            "Buffer filled up while getting plan for query"
        );
    }

    #[test]
    fn test_connection_failure_is_surfaced() {
        let client = MockClient::new(MockScript::new().failing(Step::Open));
        let err = estimate_size(&client, &remote_plan("SELECT 1"), RecordingSink::new())
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Connection);
        client.assert_balanced();
    }
}

mod cost {
    use super::*;

    #[test]
    fn test_local_servers_have_no_startup_cost() {
        for servername in ["127.0.0.1", "localhost"] {
            let plan = plan_with(&[("table", "t")], &[("servername", servername)], &[]);
            let cost = estimate_cost(&plan, 100.0);
            assert_eq!(cost.startup_cost, 0.0, "{servername}");
            assert_eq!(cost.total_cost, 100.0);
        }
    }

    #[test]
    fn test_remote_servers_pay_startup_cost() {
        for servername in ["db.example.com", "10.0.0.5", "LOCALHOST", "127.0.0.2"] {
            let plan = plan_with(&[("table", "t")], &[("servername", servername)], &[]);
            assert_eq!(startup_cost(&plan), 25.0, "{servername}");
            assert_eq!(estimate_cost(&plan, 3.0).total_cost, 28.0);
        }
    }

    #[test]
    fn test_default_servername_is_local() {
        assert_eq!(startup_cost(&local_plan("SELECT 1")), 0.0);
    }

    #[test]
    fn test_rel_size_and_path() {
        let rel = rel_size(42);
        assert_eq!(
            rel,
            RelSize {
                rows: 42.0,
                tuples: 42.0
            }
        );

        let path = foreign_path(&remote_plan("SELECT 1"), &rel);
        assert_eq!(path.rows, 42.0);
        assert_eq!(path.startup_cost, 25.0);
        assert_eq!(path.total_cost, 67.0);
    }
}
