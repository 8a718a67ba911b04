// libs/analytics-cell/src/services/dashboard.rs
use tracing::{debug, instrument};

use shared_database::{FactFilter, StoreHandle};
use shared_models::{
    FactTable, DIM_AGE, DIM_DAY, DIM_GENDER, DIM_MONTH, DIM_YEAR, MEASURE_DIAGNOSTIC_CODES,
};

use crate::models::{
    AggregateReport, AggregationError, DashboardReport, GroupingMode, GroupingSpec, MeasureDef,
};
use crate::services::grouping::aggregate;

pub const TOTAL_CONSULTATIONS: &str = "total_consultation";
pub const TOTAL_DIAGNOSTIC_CODES: &str = "total_diagnostic_codes";

/// Serves the dashboard aggregations. Facts are re-derived from the store on
/// every request.
pub struct DashboardService {
    store: StoreHandle,
}

impl DashboardService {
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    /// Consultation counts under `ROLLUP(year, month, day)`.
    pub fn consultations_by_date(facts: &FactTable) -> Result<AggregateReport, AggregationError> {
        Self::report(
            facts,
            GroupingSpec::new([DIM_YEAR, DIM_MONTH, DIM_DAY]),
            GroupingMode::Rollup,
            vec![MeasureDef::count(TOTAL_CONSULTATIONS)],
        )
    }

    /// Diagnostic-code sums under `CUBE(age, gender)`.
    pub fn diagnostics_by_age_and_gender(
        facts: &FactTable,
    ) -> Result<AggregateReport, AggregationError> {
        Self::report(
            facts,
            GroupingSpec::new([DIM_AGE, DIM_GENDER]),
            GroupingMode::Cube,
            vec![MeasureDef::sum(TOTAL_DIAGNOSTIC_CODES, MEASURE_DIAGNOSTIC_CODES)],
        )
    }

    #[instrument(skip(self))]
    pub async fn dashboard(&self, filter: &FactFilter) -> Result<DashboardReport, AggregationError> {
        let facts = self.store.fetch_facts(filter).await?;
        debug!("Loaded {} consultation facts for dashboard", facts.len());

        Ok(DashboardReport {
            consultations_by_date: Self::consultations_by_date(&facts)?,
            diagnostics_by_age_and_gender: Self::diagnostics_by_age_and_gender(&facts)?,
        })
    }

    fn report(
        facts: &FactTable,
        spec: GroupingSpec,
        mode: GroupingMode,
        measures: Vec<MeasureDef>,
    ) -> Result<AggregateReport, AggregationError> {
        let rows = aggregate(facts, &spec, mode, &measures)?;
        Ok(AggregateReport {
            mode,
            dimensions: spec.dimensions,
            measures: measures.into_iter().map(|m| m.name).collect(),
            rows,
        })
    }
}
