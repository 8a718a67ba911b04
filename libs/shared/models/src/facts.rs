// libs/shared/models/src/facts.rs
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const DIM_YEAR: &str = "year";
pub const DIM_MONTH: &str = "month";
pub const DIM_DAY: &str = "day";
pub const DIM_AGE: &str = "age";
pub const DIM_GENDER: &str = "gender";
pub const MEASURE_DIAGNOSTIC_CODES: &str = "num_diagnostic_codes";

/// A single dimension value of a fact.
///
/// Variant order is the sort order: integers, then text, then NULL last,
/// matching ascending ordering with NULLS LAST.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DimensionValue {
    Int(i64),
    Text(String),
    Null,
}

impl fmt::Display for DimensionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DimensionValue::Int(v) => write!(f, "{}", v),
            DimensionValue::Text(v) => f.write_str(v),
            DimensionValue::Null => f.write_str("NULL"),
        }
    }
}

impl From<i64> for DimensionValue {
    fn from(value: i64) -> Self {
        DimensionValue::Int(value)
    }
}

impl From<&str> for DimensionValue {
    fn from(value: &str) -> Self {
        DimensionValue::Text(value.to_string())
    }
}

impl From<String> for DimensionValue {
    fn from(value: String) -> Self {
        DimensionValue::Text(value)
    }
}

impl<T: Into<DimensionValue>> From<Option<T>> for DimensionValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(DimensionValue::Null)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FactSchemaError {
    #[error("Fact record has {found} dimension values, schema declares {expected}")]
    DimensionArity { expected: usize, found: usize },

    #[error("Fact record has {found} measure values, schema declares {expected}")]
    MeasureArity { expected: usize, found: usize },
}

/// Names of the dimension and measure columns of a fact table, in column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactSchema {
    pub dimensions: Vec<String>,
    pub measures: Vec<String>,
}

impl FactSchema {
    pub fn new<D, M>(dimensions: D, measures: M) -> Self
    where
        D: IntoIterator,
        D::Item: Into<String>,
        M: IntoIterator,
        M::Item: Into<String>,
    {
        Self {
            dimensions: dimensions.into_iter().map(Into::into).collect(),
            measures: measures.into_iter().map(Into::into).collect(),
        }
    }

    pub fn dimension_index(&self, name: &str) -> Option<usize> {
        self.dimensions.iter().position(|d| d == name)
    }

    pub fn measure_index(&self, name: &str) -> Option<usize> {
        self.measures.iter().position(|m| m == name)
    }

    /// Schema of the per-consultation facts feeding the dashboard.
    pub fn consultations() -> Self {
        Self::new(
            [DIM_YEAR, DIM_MONTH, DIM_DAY, DIM_AGE, DIM_GENDER],
            [MEASURE_DIAGNOSTIC_CODES],
        )
    }
}

/// One immutable fact row. Values are positional against the owning table's schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactRecord {
    dimensions: Vec<DimensionValue>,
    measures: Vec<Option<i64>>,
}

impl FactRecord {
    pub fn dimension(&self, index: usize) -> &DimensionValue {
        &self.dimensions[index]
    }

    /// `None` is a NULL measure, skipped by aggregation.
    pub fn measure(&self, index: usize) -> Option<i64> {
        self.measures[index]
    }

    pub fn dimensions(&self) -> &[DimensionValue] {
        &self.dimensions
    }

    pub fn measures(&self) -> &[Option<i64>] {
        &self.measures
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactTable {
    schema: FactSchema,
    records: Vec<FactRecord>,
}

impl FactTable {
    pub fn new(schema: FactSchema) -> Self {
        Self {
            schema,
            records: Vec::new(),
        }
    }

    pub fn schema(&self) -> &FactSchema {
        &self.schema
    }

    pub fn records(&self) -> &[FactRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn push(
        &mut self,
        dimensions: Vec<DimensionValue>,
        measures: Vec<Option<i64>>,
    ) -> Result<(), FactSchemaError> {
        if dimensions.len() != self.schema.dimensions.len() {
            return Err(FactSchemaError::DimensionArity {
                expected: self.schema.dimensions.len(),
                found: dimensions.len(),
            });
        }
        if measures.len() != self.schema.measures.len() {
            return Err(FactSchemaError::MeasureArity {
                expected: self.schema.measures.len(),
                found: measures.len(),
            });
        }

        self.records.push(FactRecord { dimensions, measures });
        Ok(())
    }

    /// Appends one consultation fact laid out per [`FactSchema::consultations`].
    pub fn push_consultation(
        &mut self,
        date: NaiveDate,
        age: Option<i64>,
        gender: Option<&str>,
        num_diagnostic_codes: Option<i64>,
    ) -> Result<(), FactSchemaError> {
        self.push(
            vec![
                DimensionValue::Int(date.year() as i64),
                DimensionValue::Int(date.month() as i64),
                DimensionValue::Int(date.day() as i64),
                age.into(),
                gender.into(),
            ],
            vec![num_diagnostic_codes],
        )
    }
}

/// Whole years between `birth_date` and `at`, or `None` when `at` precedes birth.
pub fn age_at(birth_date: NaiveDate, at: NaiveDateTime) -> Option<i64> {
    let on = at.date();
    let mut years = on.year() - birth_date.year();
    if (on.month(), on.day()) < (birth_date.month(), birth_date.day()) {
        years -= 1;
    }
    (years >= 0).then_some(years as i64)
}
