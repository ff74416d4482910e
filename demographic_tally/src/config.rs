// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// One row of the input table.
///
/// The values are aligned with the columns of the dataset that owns the record.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Record {
    /// The order of the row in the dataset it was read from (data rows only, starting at 0).
    pub position: usize,
    /// The cells. A missing cell is `None`.
    pub values: Vec<Option<String>>,
}

/// An ordered collection of records, loaded once and never mutated afterwards.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

/// A borrowed subset of a dataset: the result of a filter or of a cohort split.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Cohort<'a> {
    pub label: String,
    pub columns: &'a [String],
    pub records: Vec<&'a Record>,
}

impl<'a> Cohort<'a> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The index of the given column in the schema of this cohort.
    pub fn column_index(&self, column: &str) -> Result<usize, TallyErrors> {
        column_index(self.columns, column)
    }
}

pub(crate) fn column_index(columns: &[String], column: &str) -> Result<usize, TallyErrors> {
    columns
        .iter()
        .position(|c| c == column)
        .ok_or_else(|| TallyErrors::InvalidColumn(column.to_string()))
}

// ******** Output data structures *********

/// A value of a category column.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub enum Category {
    Value(String),
    /// An empty cell, when missing values are tallied on their own.
    Missing,
}

impl Category {
    pub const MISSING_LABEL: &'static str = "(missing)";

    pub fn label(&self) -> &str {
        match self {
            Category::Value(s) => s.as_str(),
            Category::Missing => Category::MISSING_LABEL,
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The counts of one cohort, in display order.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Series {
    pub cohort: String,
    pub counts: Vec<(Category, u64)>,
}

impl Series {
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|(_, c)| c).sum()
    }

    pub fn categories(&self) -> Vec<Category> {
        self.counts.iter().map(|(c, _)| c.clone()).collect()
    }
}

/// Two series restricted to the same ranked selection of categories.
///
/// Both series list exactly `categories`, in the same order. A category that does not
/// occur in a cohort is listed with a count of 0.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AggregationResult {
    pub column: String,
    pub categories: Vec<Category>,
    pub series_a: Series,
    pub series_b: Series,
}

/// Errors that prevent an aggregation from completing.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum TallyErrors {
    /// The requested column is not part of the schema.
    InvalidColumn(String),
}

impl Error for TallyErrors {}

impl Display for TallyErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TallyErrors::InvalidColumn(c) => write!(f, "Invalid column: {:?}", c),
        }
    }
}

// ********* Configuration **********

/// What to do with the records that have no value in the aggregated column.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum MissingPolicy {
    /// Missing cells are counted under `Category::Missing`.
    AsCategory,
    /// Missing cells are not counted.
    Drop,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TallyRules {
    /// The number of categories to keep after ranking.
    pub top_n: usize,
    pub missing_policy: MissingPolicy,
}

impl TallyRules {
    pub const DEFAULT_RULES: TallyRules = TallyRules {
        top_n: 4,
        missing_policy: MissingPolicy::AsCategory,
    };
}
