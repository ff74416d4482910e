pub use crate::config::*;

/// A builder for assembling a dataset row by row.
///
/// The readers use it to turn a spreadsheet into a `Dataset`.
///
/// ```
/// pub use demographic_tally::builder::Builder;
/// # use demographic_tally::TallyErrors;
///
/// let mut builder = Builder::new(&["Genre_".to_string(), "Classe_Age".to_string()])?;
///
/// builder.add_row_simple(&["Homme", "26-35"]);
/// builder.add_row(&[Some("Femme".to_string())]);
///
/// let dataset = builder.build();
/// assert_eq!(dataset.records.len(), 2);
/// assert_eq!(dataset.records[1].values[1], None);
///
/// # Ok::<(), TallyErrors>(())
/// ```
pub struct Builder {
    pub(crate) _columns: Vec<String>,
    pub(crate) _records: Vec<Record>,
}

impl Builder {
    /// Starts a dataset with the given header.
    ///
    /// The column names must be unique, since the aggregations address columns by name.
    pub fn new(columns: &[String]) -> Result<Builder, TallyErrors> {
        for (idx, c) in columns.iter().enumerate() {
            if columns[..idx].contains(c) {
                return Err(TallyErrors::InvalidColumn(c.clone()));
            }
        }
        Ok(Builder {
            _columns: columns.to_vec(),
            _records: Vec::new(),
        })
    }

    /// Adds a row in which every cell is filled.
    ///
    /// Empty strings are treated as missing cells.
    pub fn add_row_simple(&mut self, values: &[&str]) {
        let cells: Vec<Option<String>> = values
            .iter()
            .map(|s| {
                if s.is_empty() {
                    None
                } else {
                    Some(s.to_string())
                }
            })
            .collect();
        self.add_row(&cells)
    }

    /// Adds a row of cells.
    ///
    /// Rows shorter than the header are padded with missing cells, and the cells beyond the
    /// last column are ignored.
    pub fn add_row(&mut self, values: &[Option<String>]) {
        let mut cells: Vec<Option<String>> = values
            .iter()
            .take(self._columns.len())
            .cloned()
            .collect();
        cells.resize(self._columns.len(), None);
        let position = self._records.len();
        self._records.push(Record {
            position,
            values: cells,
        });
    }

    pub fn num_rows(&self) -> usize {
        self._records.len()
    }

    pub fn build(self) -> Dataset {
        Dataset {
            columns: self._columns,
            records: self._records,
        }
    }
}
