use crate::dash::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use std::path::Path;

pub const DEFAULT_FILE_PATH: &str = "last.xlsx";
pub const DEFAULT_TITLE: &str = "Analyse des donneurs temporairement non éligibles";
pub const DEFAULT_ELIGIBILITY_COLUMN: &str = "ÉLIGIBILITÉ_AU_DON.";
pub const DEFAULT_ELIGIBILITY_VALUE: &str = "Temporairement Non-eligible";
pub const DEFAULT_COHORT_COLUMN: &str = "Genre_";
pub const DEFAULT_COLOR_A: &str = "#1f77b4";
pub const DEFAULT_COLOR_B: &str = "#ff7f0e";

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CohortSettings {
    /// The value of the cohort column that selects this cohort.
    pub value: String,
    pub label: String,
    pub color: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Orientation {
    Vertical,
    Horizontal,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Vertical => "v",
            Orientation::Horizontal => "h",
        }
    }
}

/// A column that can be selected for the chart.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CategoryColumn {
    pub column: String,
    pub label: String,
    #[serde(rename = "orientation")]
    _orientation: Option<String>,
}

impl CategoryColumn {
    pub fn new(column: &str, label: &str, orientation: Orientation) -> CategoryColumn {
        CategoryColumn {
            column: column.to_string(),
            label: label.to_string(),
            _orientation: Some(orientation.as_str().to_string()),
        }
    }

    pub fn orientation(&self) -> DashResult<Orientation> {
        match self._orientation.as_deref() {
            None | Some("v") | Some("vertical") => Ok(Orientation::Vertical),
            Some("h") | Some("horizontal") => Ok(Orientation::Horizontal),
            Some(x) => whatever!(
                "unknown orientation {:?} for column {:?} (expected 'v' or 'h')",
                x,
                self.column
            ),
        }
    }
}

pub fn default_category_columns() -> Vec<CategoryColumn> {
    vec![
        CategoryColumn::new("Classe_Age", "Tranche d'âge", Orientation::Vertical),
        CategoryColumn::new(
            "categories",
            "Catégories professionnelles",
            Orientation::Horizontal,
        ),
        CategoryColumn::new(
            "Arrondissement_de_résidence_",
            "Arrondissement de résidence",
            Orientation::Horizontal,
        ),
        CategoryColumn::new(
            "Raison_indisponibilité_fusionnée",
            "Raisons d'inéligibilité",
            Orientation::Horizontal,
        ),
    ]
}

/// The dashboard configuration, as read from a JSON file.
///
/// Every field is optional. The accessors fill in the defaults.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashConfig {
    #[serde(rename = "filePath")]
    pub file_path: Option<String>,
    pub provider: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    pub title: Option<String>,
    #[serde(rename = "eligibilityColumn")]
    pub eligibility_column: Option<String>,
    #[serde(rename = "eligibilityValue")]
    pub eligibility_value: Option<String>,
    #[serde(rename = "cohortColumn")]
    pub cohort_column: Option<String>,
    #[serde(rename = "cohortA")]
    pub cohort_a: Option<CohortSettings>,
    #[serde(rename = "cohortB")]
    pub cohort_b: Option<CohortSettings>,
    #[serde(rename = "categoryColumns")]
    pub category_columns: Option<Vec<CategoryColumn>>,
    #[serde(rename = "topN")]
    pub(crate) _top_n: Option<JSValue>,
    #[serde(rename = "missingPolicy")]
    pub(crate) _missing_policy: Option<String>,
}

impl DashConfig {
    pub fn file_path(&self) -> String {
        self.file_path
            .clone()
            .unwrap_or_else(|| DEFAULT_FILE_PATH.to_string())
    }

    /// The input type: the configured one, or the one matching the file extension.
    pub fn provider(&self) -> String {
        self.provider
            .clone()
            .unwrap_or_else(|| infer_provider(&self.file_path()))
    }

    pub fn title(&self) -> String {
        self.title.clone().unwrap_or_else(|| DEFAULT_TITLE.to_string())
    }

    pub fn eligibility_column(&self) -> String {
        self.eligibility_column
            .clone()
            .unwrap_or_else(|| DEFAULT_ELIGIBILITY_COLUMN.to_string())
    }

    pub fn eligibility_value(&self) -> String {
        self.eligibility_value
            .clone()
            .unwrap_or_else(|| DEFAULT_ELIGIBILITY_VALUE.to_string())
    }

    pub fn cohort_column(&self) -> String {
        self.cohort_column
            .clone()
            .unwrap_or_else(|| DEFAULT_COHORT_COLUMN.to_string())
    }

    pub fn cohort_a(&self) -> CohortSettings {
        self.cohort_a.clone().unwrap_or_else(|| CohortSettings {
            value: "Homme".to_string(),
            label: "Hommes".to_string(),
            color: Some(DEFAULT_COLOR_A.to_string()),
        })
    }

    pub fn cohort_b(&self) -> CohortSettings {
        self.cohort_b.clone().unwrap_or_else(|| CohortSettings {
            value: "Femme".to_string(),
            label: "Femmes".to_string(),
            color: Some(DEFAULT_COLOR_B.to_string()),
        })
    }

    pub fn colors(&self) -> (String, String) {
        (
            self.cohort_a()
                .color
                .unwrap_or_else(|| DEFAULT_COLOR_A.to_string()),
            self.cohort_b()
                .color
                .unwrap_or_else(|| DEFAULT_COLOR_B.to_string()),
        )
    }

    pub fn category_columns(&self) -> Vec<CategoryColumn> {
        self.category_columns
            .clone()
            .unwrap_or_else(default_category_columns)
    }

    /// Looks up a selectable column by its identifier.
    pub fn category_column(&self, column: &str) -> DashResult<CategoryColumn> {
        let all = self.category_columns();
        all.iter()
            .find(|c| c.column == column)
            .cloned()
            .context(UnknownCategoryColumnSnafu {
                column,
                expected: all.iter().map(|c| c.column.clone()).collect::<Vec<String>>(),
            })
    }

    pub fn top_n(&self) -> DashResult<usize> {
        match &self._top_n {
            None => Ok(TallyRules::DEFAULT_RULES.top_n),
            x => match read_js_int(x)? {
                0 => whatever!("topN must be at least 1"),
                n => Ok(n),
            },
        }
    }

    pub fn missing_policy(&self) -> DashResult<MissingPolicy> {
        match self._missing_policy.as_deref() {
            None => Ok(TallyRules::DEFAULT_RULES.missing_policy),
            Some("asCategory") => Ok(MissingPolicy::AsCategory),
            Some("drop") => Ok(MissingPolicy::Drop),
            Some(x) => whatever!(
                "unknown missing policy: {:?} (expected 'asCategory' or 'drop')",
                x
            ),
        }
    }

    pub fn rules(&self) -> DashResult<TallyRules> {
        Ok(TallyRules {
            top_n: self.top_n()?,
            missing_policy: self.missing_policy()?,
        })
    }
}

pub fn read_config(path: &str) -> DashResult<DashConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    debug!("read_config: content: {:?}", contents);
    let mut config: DashConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    // A relative input path is relative to the configuration file.
    if let (Some(file_path), Some(parent)) = (config.file_path.clone(), Path::new(path).parent()) {
        if Path::new(&file_path).is_relative() {
            config.file_path = Some(parent.join(file_path).display().to_string());
        }
    }
    Ok(config)
}

fn read_js_int(x: &Option<JSValue>) -> DashResult<usize> {
    match x {
        Some(JSValue::Number(n)) => n
            .as_u64()
            .map(|x| x as usize)
            .context(ParsingJsonNumberSnafu {}),
        Some(JSValue::String(s)) => s.parse::<usize>().ok().context(ParsingJsonNumberSnafu {}),
        _ => None.context(ParsingJsonNumberSnafu {}),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_donor_dashboard() {
        let config = DashConfig::default();
        assert_eq!(config.file_path(), "last.xlsx");
        assert_eq!(config.provider(), "xlsx");
        assert_eq!(config.eligibility_column(), "ÉLIGIBILITÉ_AU_DON.");
        assert_eq!(config.eligibility_value(), "Temporairement Non-eligible");
        assert_eq!(config.cohort_column(), "Genre_");
        assert_eq!(config.cohort_a().value, "Homme");
        assert_eq!(config.cohort_b().label, "Femmes");
        assert_eq!(config.rules().unwrap(), TallyRules::DEFAULT_RULES);

        let columns = config.category_columns();
        assert_eq!(columns.len(), 4);
        assert_eq!(columns[0].orientation().unwrap(), Orientation::Vertical);
        for c in &columns[1..] {
            assert_eq!(c.orientation().unwrap(), Orientation::Horizontal);
        }
    }

    #[test]
    fn reads_partial_json() {
        let js = r##"{
            "filePath": "donors.csv",
            "cohortA": {"value": "M", "label": "Men"},
            "categoryColumns": [{"column": "age", "label": "Age"}],
            "topN": "3",
            "missingPolicy": "drop"
        }"##;
        let config: DashConfig = serde_json::from_str(js).unwrap();
        assert_eq!(config.provider(), "csv");
        assert_eq!(config.cohort_a().label, "Men");
        assert_eq!(config.colors().0, DEFAULT_COLOR_A);
        assert_eq!(config.cohort_b().value, "Femme");
        assert_eq!(
            config.rules().unwrap(),
            TallyRules {
                top_n: 3,
                missing_policy: MissingPolicy::Drop
            }
        );
        let age = config.category_column("age").unwrap();
        assert_eq!(age.orientation().unwrap(), Orientation::Vertical);
    }

    #[test]
    fn input_path_is_relative_to_the_config_file() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/dashboard_config.json");
        let config = read_config(path).unwrap();
        assert_eq!(config.file_path(), DONORS_FIXTURE);
        assert_eq!(config.provider(), "csv");
        assert_eq!(config.category_columns(), default_category_columns());
        assert!(matches!(
            read_config("does/not/exist.json"),
            Err(DashError::OpeningJson { .. })
        ));
    }

    #[test]
    fn rejects_unknown_settings() {
        let js = r#"{
            "categoryColumns": [{"column": "age", "label": "Age", "orientation": "diagonal"}],
            "topN": 0,
            "missingPolicy": "ignore"
        }"#;
        let config: DashConfig = serde_json::from_str(js).unwrap();
        assert!(config.category_column("age").unwrap().orientation().is_err());
        assert!(config.top_n().is_err());
        assert!(config.missing_policy().is_err());
        assert!(matches!(
            config.category_column("Classe_Age"),
            Err(DashError::UnknownCategoryColumn { .. })
        ));
    }
}
