/// Entry points called by the host query engine.
///
/// [`TdsFdw`] ties the catalog, the client library and the notice sink
/// together and exposes one method per host callback: option validation,
/// relation sizing, cost estimation, path generation, scan start and
/// ANALYZE support.
use std::sync::Arc;

use crate::cursor::ScanCursor;
use crate::error::Result;
use crate::host::{ForeignTableId, LogNoticeSink, NoticeSink, OptionCatalog};
use crate::models::{ConnectionPlan, CostEstimate, FdwOption, ForeignPath, OptionContext, RelSize};
use crate::options;
use crate::planner;
use crate::protocol::Client;

/// Foreign data wrapper handler for TDS servers.
pub struct TdsFdw<C: Client, K: OptionCatalog> {
    client: Arc<C>,
    catalog: K,
    sink: Arc<dyn NoticeSink>,
}

impl<C: Client, K: OptionCatalog> TdsFdw<C, K> {
    /// Handler that reports notices and warnings to the log only.
    pub fn new(client: Arc<C>, catalog: K) -> Self {
        Self {
            client,
            catalog,
            sink: Arc::new(LogNoticeSink),
        }
    }

    /// Send server notices and conversion warnings to `sink` instead.
    #[must_use]
    pub fn with_notice_sink(mut self, sink: Arc<dyn NoticeSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Validator for options given to `CREATE`/`ALTER` on a catalog object.
    pub fn validate(options: &[FdwOption], context: OptionContext) -> Result<()> {
        options::validate_options(options, context)
    }

    /// Resolve the connection plan for `table` from the catalog.
    pub fn plan(&self, table: ForeignTableId) -> Result<ConnectionPlan> {
        options::resolve_for_table(&self.catalog, table)
    }

    /// Estimate the relation size by asking the remote server.
    pub fn get_foreign_rel_size(&self, table: ForeignTableId) -> Result<RelSize> {
        let plan = self.plan(table)?;
        let rows = planner::estimate_size(&self.client, &plan, Arc::clone(&self.sink))?;

        tracing::debug!(table, rows, "foreign relation size");
        Ok(planner::rel_size(rows))
    }

    /// Startup and total cost of scanning a relation of size `rel`.
    pub fn estimate_costs(&self, table: ForeignTableId, rel: &RelSize) -> Result<CostEstimate> {
        let plan = self.plan(table)?;
        Ok(planner::estimate_cost(&plan, rel.rows))
    }

    /// The one access path offered for the relation.
    pub fn get_foreign_paths(&self, table: ForeignTableId, rel: &RelSize) -> Result<ForeignPath> {
        let plan = self.plan(table)?;
        let path = planner::foreign_path(&plan, rel);

        tracing::debug!(
            table,
            startup_cost = path.startup_cost,
            total_cost = path.total_cost,
            "foreign path"
        );
        Ok(path)
    }

    /// Connect and return a cursor; the query is sent on the first fetch.
    pub fn begin_foreign_scan(&self, table: ForeignTableId) -> Result<ScanCursor<C>> {
        let plan = self.plan(table)?;
        ScanCursor::begin(Arc::clone(&self.client), &plan, Arc::clone(&self.sink))
    }

    /// ANALYZE is not supported for foreign tables of this wrapper.
    pub fn analyze_foreign_table(&self, table: ForeignTableId) -> bool {
        tracing::debug!(table, "analyze not supported");
        false
    }
}

impl<C: Client, K: OptionCatalog> std::fmt::Debug for TdsFdw<C, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TdsFdw").finish_non_exhaustive()
    }
}
