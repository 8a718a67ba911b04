// =====================================================================================
// ANALYTICS CELL - GROUPING-SETS AGGREGATION FOR THE CLINIC DASHBOARD
// =====================================================================================
//
// Computes ROLLUP and CUBE subtotals over consultation facts in memory and
// serves the two canned dashboard reports.
//
// =====================================================================================

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{
    AggregateReport, AggregateRow, AggregationError, DashboardReport, GroupKey, GroupingMode,
    GroupingSpec, MeasureDef, MeasureFn, MeasureValue,
};
pub use services::{aggregate, grouping_sets, DashboardService};

pub use router::analytics_routes;
