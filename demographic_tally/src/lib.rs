pub mod builder;
mod config;
pub mod manual;

use log::{debug, info};

use std::{
    cmp::Reverse,
    collections::HashMap,
    ops::{Add, AddAssign},
};

pub use crate::config::*;

// **** Private structures ****

#[derive(Eq, PartialEq, Debug, Clone, Copy, PartialOrd, Ord, Hash)]
struct TallyCount(u64);

impl TallyCount {
    const EMPTY: TallyCount = TallyCount(0);
    const ONE: TallyCount = TallyCount(1);
}

impl std::iter::Sum for TallyCount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        TallyCount(iter.map(|tc| tc.0).sum())
    }
}

impl AddAssign for TallyCount {
    fn add_assign(&mut self, rhs: TallyCount) {
        self.0 += rhs.0;
    }
}

impl Add for TallyCount {
    type Output = TallyCount;
    fn add(self: TallyCount, rhs: TallyCount) -> TallyCount {
        TallyCount(self.0 + rhs.0)
    }
}

// One line of a category count table.
// first_seen is the smallest record position carrying this category.
#[derive(Eq, PartialEq, Debug, Clone)]
struct CategoryTally {
    category: Category,
    count: TallyCount,
    first_seen: usize,
}

// A category of the union of both count tables.
#[derive(Eq, PartialEq, Debug, Clone)]
struct CombinedTally {
    category: Category,
    count_a: TallyCount,
    count_b: TallyCount,
    first_seen: usize,
}

impl CombinedTally {
    fn total(&self) -> TallyCount {
        self.count_a + self.count_b
    }
}

// **** Dataset operations ****

impl Dataset {
    /// A view over all the records of the dataset.
    pub fn view(&self) -> Cohort<'_> {
        Cohort {
            label: "all".to_string(),
            columns: &self.columns,
            records: self.records.iter().collect(),
        }
    }

    /// The records whose value in `column` is exactly `value`.
    pub fn filter_eq(&self, column: &str, value: &str) -> Result<Cohort<'_>, TallyErrors> {
        self.view().filter_eq(column, value)
    }
}

impl<'a> Cohort<'a> {
    /// The records of this cohort whose value in `column` is exactly `value`.
    ///
    /// The schema is preserved, and so is the order of the records.
    pub fn filter_eq(&self, column: &str, value: &str) -> Result<Cohort<'a>, TallyErrors> {
        let col_idx = self.column_index(column)?;
        let records: Vec<&'a Record> = self
            .records
            .iter()
            .filter(|r| cell(r, col_idx) == Some(value))
            .cloned()
            .collect();
        debug!(
            "filter_eq: {:?} == {:?}: kept {} of {} records",
            column,
            value,
            records.len(),
            self.records.len()
        );
        Ok(Cohort {
            label: format!("{}={}", column, value),
            columns: self.columns,
            records,
        })
    }
}

fn cell(record: &Record, col_idx: usize) -> Option<&str> {
    record
        .values
        .get(col_idx)
        .and_then(|v| v.as_ref())
        .map(|s| s.as_str())
}

/// Splits a population into two disjoint cohorts according to the value of `column`.
///
/// Arguments:
/// * `population` the records to split
/// * `column` the column holding the cohort attribute
/// * `cohort_a`, `cohort_b` the (label, value) pairs identifying each cohort
///
/// The records with any other value, or no value at all, belong to neither cohort.
pub fn split_cohorts<'a>(
    population: &Cohort<'a>,
    column: &str,
    cohort_a: (&str, &str),
    cohort_b: (&str, &str),
) -> Result<(Cohort<'a>, Cohort<'a>), TallyErrors> {
    let col_idx = population.column_index(column)?;
    let mut records_a: Vec<&'a Record> = Vec::new();
    let mut records_b: Vec<&'a Record> = Vec::new();
    for r in population.records.iter() {
        match cell(r, col_idx) {
            Some(v) if v == cohort_a.1 => records_a.push(*r),
            Some(v) if v == cohort_b.1 => records_b.push(*r),
            v => {
                debug!(
                    "split_cohorts: record {} excluded, {:?} is {:?}",
                    r.position, column, v
                );
            }
        }
    }
    info!(
        "split_cohorts: {} records: {} {:?}, {} {:?}",
        population.len(),
        records_a.len(),
        cohort_a.0,
        records_b.len(),
        cohort_b.0
    );
    Ok((
        Cohort {
            label: cohort_a.0.to_string(),
            columns: population.columns,
            records: records_a,
        },
        Cohort {
            label: cohort_b.0.to_string(),
            columns: population.columns,
            records: records_b,
        },
    ))
}

// **** Aggregations ****

fn category_of(record: &Record, col_idx: usize, policy: MissingPolicy) -> Option<Category> {
    match (cell(record, col_idx), policy) {
        (Some(s), _) => Some(Category::Value(s.to_string())),
        (None, MissingPolicy::AsCategory) => Some(Category::Missing),
        (None, MissingPolicy::Drop) => None,
    }
}

// The count table of one collection of records, in order of first appearance.
fn compute_tally(records: &[&Record], col_idx: usize, policy: MissingPolicy) -> Vec<CategoryTally> {
    let mut positions: HashMap<Category, usize> = HashMap::new();
    let mut tally: Vec<CategoryTally> = Vec::new();
    for r in records.iter() {
        let category = match category_of(r, col_idx, policy) {
            Some(c) => c,
            None => continue,
        };
        if let Some(idx) = positions.get(&category) {
            let ct = &mut tally[*idx];
            ct.count += TallyCount::ONE;
            ct.first_seen = ct.first_seen.min(r.position);
        } else {
            positions.insert(category.clone(), tally.len());
            tally.push(CategoryTally {
                category,
                count: TallyCount::ONE,
                first_seen: r.position,
            });
        }
    }
    tally.sort_by_key(|ct| ct.first_seen);
    tally
}

// Union of the two tables. Categories missing on one side count 0 there.
fn combine_tallies(tally_a: &[CategoryTally], tally_b: &[CategoryTally]) -> Vec<CombinedTally> {
    let mut positions: HashMap<&Category, usize> = HashMap::new();
    let mut combined: Vec<CombinedTally> = Vec::new();
    for ct in tally_a.iter() {
        positions.insert(&ct.category, combined.len());
        combined.push(CombinedTally {
            category: ct.category.clone(),
            count_a: ct.count,
            count_b: TallyCount::EMPTY,
            first_seen: ct.first_seen,
        });
    }
    for ct in tally_b.iter() {
        if let Some(idx) = positions.get(&ct.category) {
            let c = &mut combined[*idx];
            c.count_b = ct.count;
            c.first_seen = c.first_seen.min(ct.first_seen);
        } else {
            positions.insert(&ct.category, combined.len());
            combined.push(CombinedTally {
                category: ct.category.clone(),
                count_a: TallyCount::EMPTY,
                count_b: ct.count,
                first_seen: ct.first_seen,
            });
        }
    }
    combined
}

// Highest combined total first. Equal totals keep the order of first appearance.
fn rank_categories(mut combined: Vec<CombinedTally>, top_n: usize) -> Vec<CombinedTally> {
    combined.sort_by_key(|c| (Reverse(c.total()), c.first_seen));
    combined.truncate(top_n);
    combined
}

/// The category count table of a cohort.
///
/// Returns (category, count, first position) triples, in order of first appearance.
pub fn count_categories(
    cohort: &Cohort,
    column: &str,
    policy: MissingPolicy,
) -> Result<Vec<(Category, u64, usize)>, TallyErrors> {
    let col_idx = cohort.column_index(column)?;
    Ok(compute_tally(&cohort.records, col_idx, policy)
        .into_iter()
        .map(|ct| (ct.category, ct.count.0, ct.first_seen))
        .collect())
}

/// The `n` most frequent categories of a single cohort, most frequent first.
///
/// Equal counts are listed in order of first appearance.
pub fn cohort_top_n(
    cohort: &Cohort,
    column: &str,
    n: usize,
    policy: MissingPolicy,
) -> Result<Series, TallyErrors> {
    let col_idx = cohort.column_index(column)?;
    let mut tally = compute_tally(&cohort.records, col_idx, policy);
    tally.sort_by_key(|ct| (Reverse(ct.count), ct.first_seen));
    tally.truncate(n);
    Ok(Series {
        cohort: cohort.label.clone(),
        counts: tally.into_iter().map(|ct| (ct.category, ct.count.0)).collect(),
    })
}

/// Runs the top-4 aggregation with the default rules.
///
/// See `aggregate_top_n`.
pub fn aggregate_top4(
    cohort_a: &Cohort,
    cohort_b: &Cohort,
    category_column: &str,
) -> Result<AggregationResult, TallyErrors> {
    aggregate_top_n(
        cohort_a,
        cohort_b,
        category_column,
        &TallyRules::DEFAULT_RULES,
    )
}

/// Counts the values of a category column in two cohorts and keeps the categories with the
/// greatest combined count.
///
/// Arguments:
/// * `cohort_a`, `cohort_b` two disjoint collections of records
/// * `category_column` the column to aggregate. It must be part of the schema of both cohorts.
/// * `rules` how many categories to keep and how to treat missing values
///
/// Both series of the result list the same categories in the same order: by combined count,
/// highest first, and by first appearance in the dataset for equal counts. A category that
/// does not occur in one cohort has an explicit count of 0 in its series.
pub fn aggregate_top_n(
    cohort_a: &Cohort,
    cohort_b: &Cohort,
    category_column: &str,
    rules: &TallyRules,
) -> Result<AggregationResult, TallyErrors> {
    info!(
        "aggregate_top_n: column {:?}: {} {:?} records, {} {:?} records, rules: {:?}",
        category_column,
        cohort_a.len(),
        cohort_a.label,
        cohort_b.len(),
        cohort_b.label,
        rules
    );
    let col_idx_a = cohort_a.column_index(category_column)?;
    let col_idx_b = cohort_b.column_index(category_column)?;

    let tally_a = compute_tally(&cohort_a.records, col_idx_a, rules.missing_policy);
    let tally_b = compute_tally(&cohort_b.records, col_idx_b, rules.missing_policy);
    debug!("aggregate_top_n: tally_a: {:?}", tally_a);
    debug!("aggregate_top_n: tally_b: {:?}", tally_b);

    let combined = combine_tallies(&tally_a, &tally_b);
    let num_categories = combined.len();
    let selected = rank_categories(combined, rules.top_n);
    debug!(
        "aggregate_top_n: selected {} of {} categories: {:?}",
        selected.len(),
        num_categories,
        selected
    );

    let total_a: TallyCount = selected.iter().map(|c| c.count_a).sum();
    let total_b: TallyCount = selected.iter().map(|c| c.count_b).sum();
    debug!(
        "aggregate_top_n: selection covers {} of {} and {} of {}",
        total_a.0,
        cohort_a.len(),
        total_b.0,
        cohort_b.len()
    );

    Ok(AggregationResult {
        column: category_column.to_string(),
        categories: selected.iter().map(|c| c.category.clone()).collect(),
        series_a: Series {
            cohort: cohort_a.label.clone(),
            counts: selected
                .iter()
                .map(|c| (c.category.clone(), c.count_a.0))
                .collect(),
        },
        series_b: Series {
            cohort: cohort_b.label.clone(),
            counts: selected
                .iter()
                .map(|c| (c.category.clone(), c.count_b.0))
                .collect(),
        },
    })
}
