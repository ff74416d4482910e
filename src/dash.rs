use log::{debug, info, warn};

use demographic_tally::builder::Builder;
use demographic_tally::*;
use snafu::{prelude::*, Snafu};

use std::fs;

use calamine::{open_workbook, Reader, Xlsx};

use serde_json::Value as JSValue;
use text_diff::print_diff;

pub mod chart;
pub mod config_reader;
mod io_common;
mod io_csv;
mod io_excel;

pub use crate::dash::config_reader::*;
use crate::dash::io_common::infer_provider;

#[derive(Debug, Snafu)]
pub enum DashError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The workbook has no worksheet or no header row"))]
    EmptyExcel {},
    #[snafu(display("Worksheet {name:?} not found in {path}"))]
    MissingWorksheet { name: String, path: String },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error parsing CSV line {lineno}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Expected a positive integer"))]
    ParsingJsonNumber {},
    #[snafu(display("Error reading the selection"), visibility(pub(crate)))]
    ReadingSelection { source: std::io::Error },
    #[snafu(display("Error writing the prompt"), visibility(pub(crate)))]
    WritingPrompt { source: std::io::Error },
    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Input type not implemented: {input_type:?}"))]
    UnknownInputType { input_type: String },
    #[snafu(display("Unknown category column {column:?}, expected one of {expected:?}"))]
    UnknownCategoryColumn {
        column: String,
        expected: Vec<String>,
    },
    #[snafu(display("{source}"))]
    Tally { source: TallyErrors },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type DashResult<T> = Result<T, DashError>;
pub type BDashResult<T> = Result<T, Box<DashError>>;

/// The dataset of a session, with the configuration used to read and present it.
///
/// The dataset is read once; every selection is computed again from it.
#[derive(Debug, Clone)]
pub struct Session {
    pub config: DashConfig,
    pub dataset: Dataset,
}

/// Everything displayed for one selected category column.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SelectionReport {
    pub selection: CategoryColumn,
    pub orientation: Orientation,
    pub top_n: usize,
    pub aggregation: AggregationResult,
    /// The size of each cohort.
    pub total_a: usize,
    pub total_b: usize,
    /// The most frequent categories of each cohort, ranked within that cohort only.
    pub own_top_a: Series,
    pub own_top_b: Series,
}

fn read_dataset(config: &DashConfig) -> BDashResult<Dataset> {
    let path = config.file_path();
    let provider = config.provider();
    info!("Attempting to read {:?} file {:?}", provider, path);
    match provider.as_str() {
        "xlsx" | "excel" => {
            io_excel::read_excel_table(&path, config.excel_worksheet_name.as_deref())
        }
        "csv" => io_csv::read_csv_table(&path),
        x => Err(Box::new(DashError::UnknownInputType {
            input_type: x.to_string(),
        })),
    }
}

/// Reads the dataset. Any failure here is fatal: nothing can be shown without data.
pub fn load_session(config: DashConfig) -> DashResult<Session> {
    let dataset = read_dataset(&config).map_err(|e| *e)?;
    info!(
        "load_session: {} records, columns: {:?}",
        dataset.records.len(),
        dataset.columns
    );
    Ok(Session { config, dataset })
}

/// Filters, splits and aggregates the dataset for the given category column.
pub fn render_selection(session: &Session, column: &str) -> DashResult<SelectionReport> {
    let config = &session.config;
    let selection = config.category_column(column)?;
    let orientation = selection.orientation()?;
    let rules = config.rules()?;

    let population = session
        .dataset
        .filter_eq(&config.eligibility_column(), &config.eligibility_value())
        .context(TallySnafu {})?;
    info!(
        "render_selection: {} of {} records with {:?}",
        population.len(),
        session.dataset.records.len(),
        population.label
    );

    let settings_a = config.cohort_a();
    let settings_b = config.cohort_b();
    let (cohort_a, cohort_b) = split_cohorts(
        &population,
        &config.cohort_column(),
        (settings_a.label.as_str(), settings_a.value.as_str()),
        (settings_b.label.as_str(), settings_b.value.as_str()),
    )
    .context(TallySnafu {})?;

    let aggregation =
        aggregate_top_n(&cohort_a, &cohort_b, column, &rules).context(TallySnafu {})?;
    let own_top_a = cohort_top_n(&cohort_a, column, rules.top_n, rules.missing_policy)
        .context(TallySnafu {})?;
    let own_top_b = cohort_top_n(&cohort_b, column, rules.top_n, rules.missing_policy)
        .context(TallySnafu {})?;

    Ok(SelectionReport {
        selection,
        orientation,
        top_n: rules.top_n,
        aggregation,
        total_a: cohort_a.len(),
        total_b: cohort_b.len(),
        own_top_a,
        own_top_b,
    })
}

/// Maps what the user typed to a category column: its identifier, its label, or its
/// position (starting at 1) in the list of choices.
pub fn resolve_choice(config: &DashConfig, input: &str) -> Option<String> {
    let input = input.trim();
    let choices = config.category_columns();
    if let Ok(idx) = input.parse::<usize>() {
        return idx
            .checked_sub(1)
            .and_then(|i| choices.get(i))
            .map(|c| c.column.clone());
    }
    choices
        .iter()
        .find(|c| c.column == input || c.label == input)
        .map(|c| c.column.clone())
}

pub fn write_output(out: &str, contents: &str) -> DashResult<()> {
    if out == "stdout" {
        println!("{}", contents);
        Ok(())
    } else {
        info!("Writing figure to {:?}", out);
        fs::write(out, contents).context(WritingOutputSnafu { path: out })
    }
}

pub fn read_reference(path: &str) -> DashResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

/// Compares the produced document with a reference document and prints the differences.
pub fn check_reference(reference_path: &str, result_js: &JSValue) -> DashResult<()> {
    let pretty_js = serde_json::to_string_pretty(result_js).context(ParsingJsonSnafu {})?;
    let reference = read_reference(reference_path)?;
    debug!("check_reference: reference: {:?}", reference);
    let pretty_js_ref = serde_json::to_string_pretty(&reference).context(ParsingJsonSnafu {})?;
    if pretty_js_ref != pretty_js {
        warn!("Found differences with the reference file {:?}", reference_path);
        print_diff(pretty_js_ref.as_str(), pretty_js.as_str(), "\n");
        whatever!("Difference detected between the computed figure and the reference")
    }
    Ok(())
}

/// Renders one selection: summary on stdout, figure to `out`, optional reference check.
pub fn run_selection(
    session: &Session,
    column: &str,
    out: Option<&str>,
    reference: Option<&str>,
) -> DashResult<SelectionReport> {
    let report = render_selection(session, column)?;
    println!("{}", chart::summary_text(&session.config, &report));

    let result_js = chart::build_output_js(&session.config, &report);
    if let Some(out) = out {
        let pretty_js = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;
        write_output(out, &pretty_js)?;
    }
    if let Some(reference_path) = reference {
        check_reference(reference_path, &result_js)?;
    }
    Ok(report)
}

#[cfg(test)]
pub(crate) const DONORS_FIXTURE: &str =
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/donors.csv");

#[cfg(test)]
pub(crate) const DONORS_XLSX_FIXTURE: &str =
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/donors.xlsx");

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Category {
        Category::Value(s.to_string())
    }

    fn session() -> Session {
        let config = DashConfig {
            file_path: Some(DONORS_FIXTURE.to_string()),
            ..Default::default()
        };
        load_session(config).unwrap()
    }

    #[test]
    fn age_brackets_of_temporarily_ineligible_donors() {
        let report = render_selection(&session(), "Classe_Age").unwrap();
        assert_eq!(report.total_a, 5);
        assert_eq!(report.total_b, 6);
        assert_eq!(report.orientation, Orientation::Vertical);
        let agg = &report.aggregation;
        // 46-55 and 36-45 tie with 18-25; 56-65 is left out.
        assert_eq!(
            agg.categories,
            vec![v("26-35"), v("18-25"), v("36-45"), v("46-55")]
        );
        assert_eq!(
            agg.series_a.counts,
            vec![(v("26-35"), 2), (v("18-25"), 0), (v("36-45"), 1), (v("46-55"), 1)]
        );
        assert_eq!(
            agg.series_b.counts,
            vec![(v("26-35"), 2), (v("18-25"), 2), (v("36-45"), 1), (v("46-55"), 1)]
        );
        assert_eq!(
            report.own_top_a.counts,
            vec![(v("26-35"), 2), (v("36-45"), 1), (v("56-65"), 1), (v("46-55"), 1)]
        );
    }

    #[test]
    fn workbook_and_csv_give_the_same_selection() {
        let config = DashConfig {
            file_path: Some(DONORS_XLSX_FIXTURE.to_string()),
            excel_worksheet_name: Some("Donneurs".to_string()),
            ..Default::default()
        };
        let s = load_session(config).unwrap();
        assert_eq!(s.config.provider(), "xlsx");
        let from_xlsx = render_selection(&s, "Classe_Age").unwrap();
        let from_csv = render_selection(&session(), "Classe_Age").unwrap();
        assert_eq!(from_xlsx, from_csv);
        assert_eq!(
            from_xlsx.aggregation.categories,
            vec![v("26-35"), v("18-25"), v("36-45"), v("46-55")]
        );
    }

    #[test]
    fn districts_are_drawn_horizontally() {
        let report = render_selection(&session(), "Arrondissement_de_résidence_").unwrap();
        assert_eq!(report.orientation, Orientation::Horizontal);
        assert_eq!(
            report.aggregation.categories,
            vec![v("Douala 3"), v("Douala 5"), v("Douala 1"), v("Douala 2")]
        );
        assert!(report
            .own_top_b
            .counts
            .contains(&(Category::Missing, 1)));
    }

    #[test]
    fn matches_the_reference_figure() {
        let reference = concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/data/donors_classe_age_expected.json"
        );
        let s = session();
        let report = run_selection(&s, "Classe_Age", None, Some(reference));
        assert!(report.is_ok(), "{:?}", report.err());
    }

    #[test]
    fn differences_with_the_reference_are_errors() {
        let reference = concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/data/donors_classe_age_expected.json"
        );
        let res = run_selection(&session(), "categories", None, Some(reference));
        assert!(matches!(res, Err(DashError::Whatever { .. })));
    }

    #[test]
    fn professions_from_a_config_file() {
        let path = concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/data/dashboard_config.json"
        );
        let s = load_session(read_config(path).unwrap()).unwrap();
        let report = render_selection(&s, "categories").unwrap();
        assert_eq!(report.orientation, Orientation::Horizontal);
        assert_eq!(
            report.aggregation.categories,
            vec![v("Étudiant"), v("Commerçant"), v("Sans emploi"), v("Enseignant")]
        );
        assert_eq!(
            report.aggregation.series_a.counts,
            vec![
                (v("Étudiant"), 3),
                (v("Commerçant"), 1),
                (v("Sans emploi"), 1),
                (v("Enseignant"), 0)
            ]
        );
        // Only three professions among the men.
        assert_eq!(report.own_top_a.counts.len(), 3);
    }

    #[test]
    fn unknown_selection_is_reported() {
        let res = render_selection(&session(), "Taille");
        assert!(matches!(res, Err(DashError::UnknownCategoryColumn { .. })));
    }

    #[test]
    fn selection_absent_from_the_file_is_an_invalid_column() {
        let mut config = session().config;
        let mut columns = config.category_columns();
        columns.push(CategoryColumn::new("Taille", "Taille", Orientation::Vertical));
        config.category_columns = Some(columns);
        let s = Session {
            config,
            dataset: session().dataset,
        };
        let res = render_selection(&s, "Taille");
        assert!(matches!(
            res,
            Err(DashError::Tally {
                source: TallyErrors::InvalidColumn(_)
            })
        ));
    }

    #[test]
    fn choices_resolve_by_position_name_or_label() {
        let config = DashConfig::default();
        assert_eq!(resolve_choice(&config, "1"), Some("Classe_Age".to_string()));
        assert_eq!(
            resolve_choice(&config, " categories "),
            Some("categories".to_string())
        );
        assert_eq!(
            resolve_choice(&config, "Arrondissement de résidence"),
            Some("Arrondissement_de_résidence_".to_string())
        );
        assert_eq!(resolve_choice(&config, "0"), None);
        assert_eq!(resolve_choice(&config, "5"), None);
        assert_eq!(resolve_choice(&config, "Taille"), None);
    }

    #[test]
    fn unreadable_input_is_fatal() {
        let config = DashConfig {
            file_path: Some("does/not/exist.xlsx".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            load_session(config),
            Err(DashError::OpeningExcel { .. })
        ));
        let config = DashConfig {
            file_path: Some(DONORS_FIXTURE.to_string()),
            provider: Some("parquet".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            load_session(config),
            Err(DashError::UnknownInputType { .. })
        ));
    }
}
