// libs/analytics-cell/src/services/grouping.rs
use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use shared_models::{FactRecord, FactTable};

use crate::models::{
    AggregateRow, AggregationError, GroupKey, GroupingMode, GroupingSpec, MeasureDef, MeasureFn,
    MeasureValue, MAX_CUBE_DIMENSIONS, MAX_ROLLUP_DIMENSIONS,
};

/// Grouping sets for `width` dimensions as `grouping_id` masks (bit set = ALL).
///
/// ROLLUP yields the `width + 1` prefixes from most specific to the grand
/// total; CUBE yields all `2^width` subsets. The empty set is always last.
pub fn grouping_sets(mode: GroupingMode, width: usize) -> Vec<u32> {
    let full = all_mask(width);
    match mode {
        GroupingMode::Rollup => (0..=width)
            .map(|unbound| full & !all_mask(width - unbound))
            .collect(),
        GroupingMode::Cube => (0..=full).collect(),
    }
}

/// Computes every ROLLUP or CUBE subtotal of `facts` over `spec`.
///
/// Rows come back in ascending key order with ALL sorting after every bound
/// value, so subtotals follow the rows they summarize and the grand total is
/// last. The grand total is emitted even when `facts` is empty.
pub fn aggregate(
    facts: &FactTable,
    spec: &GroupingSpec,
    mode: GroupingMode,
    measures: &[MeasureDef],
) -> Result<Vec<AggregateRow>, AggregationError> {
    let dimension_columns = resolve_dimensions(facts, spec, mode)?;
    let folds = resolve_measures(facts, measures)?;
    let sets = grouping_sets(mode, dimension_columns.len());

    let mut groups: BTreeMap<Vec<GroupKey>, (u32, Vec<Accumulator>)> = BTreeMap::new();
    groups.insert(
        vec![GroupKey::All; dimension_columns.len()],
        (all_mask(dimension_columns.len()), Accumulator::start(&folds)),
    );

    for record in facts.records() {
        for &mask in &sets {
            let key = group_key(record, &dimension_columns, mask);
            let (_, accumulators) = groups
                .entry(key)
                .or_insert_with(|| (mask, Accumulator::start(&folds)));

            for (accumulator, fold) in accumulators.iter_mut().zip(&folds) {
                accumulator.fold(fold, record)?;
            }
        }
    }

    debug!(
        "{} over {:?}: {} facts, {} grouping sets, {} rows",
        mode,
        spec.dimensions,
        facts.len(),
        sets.len(),
        groups.len()
    );

    Ok(groups
        .into_iter()
        .map(|(key, (grouping_id, accumulators))| AggregateRow {
            key,
            grouping_id,
            measures: accumulators
                .into_iter()
                .zip(&folds)
                .map(|(accumulator, fold)| accumulator.finish(fold.kind))
                .collect(),
        })
        .collect())
}

fn all_mask(width: usize) -> u32 {
    if width >= 32 {
        u32::MAX
    } else {
        (1u32 << width) - 1
    }
}

fn group_key(record: &FactRecord, columns: &[usize], mask: u32) -> Vec<GroupKey> {
    columns
        .iter()
        .enumerate()
        .map(|(position, &column)| {
            if mask & (1 << position) != 0 {
                GroupKey::All
            } else {
                GroupKey::Value(record.dimension(column).clone())
            }
        })
        .collect()
}

fn resolve_dimensions(
    facts: &FactTable,
    spec: &GroupingSpec,
    mode: GroupingMode,
) -> Result<Vec<usize>, AggregationError> {
    if spec.is_empty() {
        return Err(AggregationError::InvalidSpec(
            "at least one dimension is required".to_string(),
        ));
    }

    let limit = match mode {
        GroupingMode::Rollup => MAX_ROLLUP_DIMENSIONS,
        GroupingMode::Cube => MAX_CUBE_DIMENSIONS,
    };
    if spec.len() > limit {
        return Err(AggregationError::InvalidSpec(format!(
            "{} accepts at most {} dimensions, got {}",
            mode,
            limit,
            spec.len()
        )));
    }

    let mut seen = HashSet::new();
    spec.dimensions
        .iter()
        .map(|name| {
            if !seen.insert(name.as_str()) {
                return Err(AggregationError::InvalidSpec(format!(
                    "dimension '{}' listed twice",
                    name
                )));
            }
            facts.schema().dimension_index(name).ok_or_else(|| {
                AggregationError::InvalidSpec(format!("unknown dimension '{}'", name))
            })
        })
        .collect()
}

/// A measure definition bound to its fact column.
struct Fold<'a> {
    name: &'a str,
    kind: FoldKind,
}

#[derive(Clone, Copy)]
enum FoldKind {
    CountAll,
    CountNonNull(usize),
    Sum(usize),
}

fn resolve_measures<'a>(
    facts: &FactTable,
    measures: &'a [MeasureDef],
) -> Result<Vec<Fold<'a>>, AggregationError> {
    measures
        .iter()
        .map(|measure| {
            let column = |field: &str| {
                facts.schema().measure_index(field).ok_or_else(|| {
                    AggregationError::InvalidSpec(format!(
                        "measure '{}' reads unknown field '{}'",
                        measure.name, field
                    ))
                })
            };
            let kind = match &measure.function {
                MeasureFn::Count => FoldKind::CountAll,
                MeasureFn::CountOf(field) => FoldKind::CountNonNull(column(field)?),
                MeasureFn::Sum(field) => FoldKind::Sum(column(field)?),
            };
            Ok(Fold {
                name: &measure.name,
                kind,
            })
        })
        .collect()
}

#[derive(Default)]
struct Accumulator {
    count: u64,
    sum: i64,
}

impl Accumulator {
    fn start(folds: &[Fold<'_>]) -> Vec<Accumulator> {
        folds.iter().map(|_| Accumulator::default()).collect()
    }

    fn fold(&mut self, fold: &Fold<'_>, record: &FactRecord) -> Result<(), AggregationError> {
        match fold.kind {
            FoldKind::CountAll => self.count += 1,
            FoldKind::CountNonNull(column) => {
                if record.measure(column).is_some() {
                    self.count += 1;
                }
            }
            FoldKind::Sum(column) => {
                if let Some(value) = record.measure(column) {
                    self.sum = self.sum.checked_add(value).ok_or_else(|| {
                        AggregationError::MeasureOverflow {
                            measure: fold.name.to_string(),
                        }
                    })?;
                }
            }
        }
        Ok(())
    }

    fn finish(self, kind: FoldKind) -> MeasureValue {
        match kind {
            FoldKind::CountAll | FoldKind::CountNonNull(_) => MeasureValue::Count(self.count),
            FoldKind::Sum(_) => MeasureValue::Sum(self.sum),
        }
    }
}
