// libs/analytics-cell/src/models.rs
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use shared_database::StoreError;
use shared_models::DimensionValue;

/// Widest dimension list accepted for CUBE, which emits `2^n` grouping sets.
pub const MAX_CUBE_DIMENSIONS: usize = 12;

/// `grouping_id` is a `u32` bitmask, one bit per dimension.
pub const MAX_ROLLUP_DIMENSIONS: usize = 32;

// ==============================================================================
// GROUPING REQUEST
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupingMode {
    /// Prefixes of the ordered dimension list, most specific first.
    Rollup,
    /// Every subset of the dimension list.
    Cube,
}

impl fmt::Display for GroupingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupingMode::Rollup => write!(f, "ROLLUP"),
            GroupingMode::Cube => write!(f, "CUBE"),
        }
    }
}

/// Ordered dimension names to group by. Order is the hierarchy under ROLLUP
/// and the column order of every output key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingSpec {
    pub dimensions: Vec<String>,
}

impl GroupingSpec {
    pub fn new<I>(dimensions: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            dimensions: dimensions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "function", content = "field", rename_all = "snake_case")]
pub enum MeasureFn {
    /// `COUNT(*)`: every fact in the group.
    Count,
    /// `COUNT(field)`: facts whose measure is not NULL.
    CountOf(String),
    /// `SUM(field)` with NULLs skipped.
    Sum(String),
}

impl MeasureFn {
    pub fn field(&self) -> Option<&str> {
        match self {
            MeasureFn::Count => None,
            MeasureFn::CountOf(field) | MeasureFn::Sum(field) => Some(field),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasureDef {
    pub name: String,
    pub function: MeasureFn,
}

impl MeasureDef {
    pub fn count(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            function: MeasureFn::Count,
        }
    }

    pub fn count_of(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            function: MeasureFn::CountOf(field.into()),
        }
    }

    pub fn sum(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            function: MeasureFn::Sum(field.into()),
        }
    }
}

// ==============================================================================
// AGGREGATE OUTPUT
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum MeasureValue {
    Count(u64),
    Sum(i64),
}

impl fmt::Display for MeasureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasureValue::Count(v) => write!(f, "{}", v),
            MeasureValue::Sum(v) => write!(f, "{}", v),
        }
    }
}

/// One position of an aggregate key.
///
/// `All` orders after every value, so sorting keys ascending places each
/// subtotal directly after the rows it summarizes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupKey {
    Value(DimensionValue),
    All,
}

impl GroupKey {
    pub fn is_all(&self) -> bool {
        matches!(self, GroupKey::All)
    }

    pub fn value(&self) -> Option<&DimensionValue> {
        match self {
            GroupKey::Value(value) => Some(value),
            GroupKey::All => None,
        }
    }
}

impl Serialize for GroupKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            GroupKey::Value(value) => value.serialize(serializer),
            GroupKey::All => serializer.serialize_str("ALL"),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Value(value) => write!(f, "{}", value),
            GroupKey::All => f.write_str("ALL"),
        }
    }
}

impl From<DimensionValue> for GroupKey {
    fn from(value: DimensionValue) -> Self {
        GroupKey::Value(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateRow {
    pub key: Vec<GroupKey>,
    /// Bit `i` is set when dimension `i` is rolled up to ALL, like SQL `GROUPING()`.
    pub grouping_id: u32,
    pub measures: Vec<MeasureValue>,
}

impl AggregateRow {
    pub fn is_grand_total(&self) -> bool {
        self.key.iter().all(GroupKey::is_all)
    }

    pub fn bound_dimensions(&self) -> usize {
        self.key.iter().filter(|k| !k.is_all()).count()
    }

    pub fn measure(&self, index: usize) -> Option<MeasureValue> {
        self.measures.get(index).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateReport {
    pub mode: GroupingMode,
    pub dimensions: Vec<String>,
    pub measures: Vec<String>,
    pub rows: Vec<AggregateRow>,
}

impl AggregateReport {
    pub fn grand_total(&self) -> Option<&AggregateRow> {
        self.rows.iter().rev().find(|row| row.is_grand_total())
    }

    /// Value of the named measure on `row`.
    pub fn value(&self, row: &AggregateRow, measure: &str) -> Option<MeasureValue> {
        let index = self.measures.iter().position(|m| m == measure)?;
        row.measure(index)
    }
}

/// The two canned reports rendered on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardReport {
    pub consultations_by_date: AggregateReport,
    pub diagnostics_by_age_and_gender: AggregateReport,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum AggregationError {
    #[error("Invalid grouping spec: {0}")]
    InvalidSpec(String),

    #[error("Measure '{measure}' overflowed while summing")]
    MeasureOverflow { measure: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}
