/// Size and cost estimates for the host planner
///
/// Row counts come from running the resolved query once on a short-lived
/// session and reading the connection's reported row count. Costs follow a
/// flat model: a fixed startup penalty for remote servers plus one unit per
/// estimated row.
use std::sync::Arc;

use crate::connection::Session;
use crate::constants::{LOCAL_STARTUP_COST, REMOTE_STARTUP_COST};
use crate::error::Result;
use crate::host::NoticeSink;
use crate::models::{ConnectionPlan, CostEstimate, ForeignPath, RelSize};
use crate::protocol::Client;

/// Completes row-fetch error messages raised while planning.
pub const PLANNING_CONTEXT: &str = "while getting plan for query";

/// Estimate how many rows the resolved query returns.
///
/// Opens a transient session, executes the query, fetches at most one row
/// and reads the connection's row count. The session is closed whether or
/// not the estimate succeeded. A query without a result set counts as 0.
pub fn estimate_size<C: Client>(
    client: &Arc<C>,
    plan: &ConnectionPlan,
    sink: Arc<dyn NoticeSink>,
) -> Result<u64> {
    let mut session = Session::open(Arc::clone(client), plan, sink)?;
    let estimate = count_rows(&mut session, plan.query());
    session.close();
    estimate
}

fn count_rows<C: Client>(session: &mut Session<C>, query: &str) -> Result<u64> {
    if !session.execute(query)? {
        return Ok(0);
    }

    let counted = u64::from(session.next_row(PLANNING_CONTEXT)?);
    let reported = session.row_count()?;

    tracing::debug!(counted, reported, "row count estimate");

    // -1 means the library does not know; fall back to what was seen.
    Ok(u64::try_from(reported).unwrap_or(counted))
}

/// Startup cost for the plan's server: free for local, penalized otherwise.
pub fn startup_cost(plan: &ConnectionPlan) -> f64 {
    if plan.is_local() {
        LOCAL_STARTUP_COST
    } else {
        REMOTE_STARTUP_COST
    }
}

/// Startup and total cost for scanning `rows` rows.
pub fn estimate_cost(plan: &ConnectionPlan, rows: f64) -> CostEstimate {
    let startup_cost = startup_cost(plan);
    CostEstimate {
        startup_cost,
        total_cost: startup_cost + rows,
    }
}

/// Relation size for a row estimate; every row is a live tuple.
pub fn rel_size(rows: u64) -> RelSize {
    let rows = rows as f64;
    RelSize { rows, tuples: rows }
}

/// The single foreign scan path for a sized relation.
pub fn foreign_path(plan: &ConnectionPlan, rel: &RelSize) -> ForeignPath {
    let cost = estimate_cost(plan, rel.rows);
    ForeignPath {
        rows: rel.rows,
        startup_cost: cost.startup_cost,
        total_cost: cost.total_cost,
    }
}
