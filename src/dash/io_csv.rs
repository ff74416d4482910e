// Primitives for reading CSV files.

use crate::dash::{
    io_common::{make_header, normalize_cell, simplify_file_name},
    *,
};

/// Reads a CSV file in which the first line is the header and every other line is a record.
pub fn read_csv_table(path: &str) -> BDashResult<Dataset> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;

    let header_cells: Vec<Option<String>> = rdr
        .headers()
        .context(CsvLineParseSnafu { lineno: 1_usize })?
        .iter()
        .map(normalize_cell)
        .collect();
    let header = make_header(&header_cells);
    debug!("read_csv_table: header: {:?}", header);

    let mut builder = Builder::new(&header).context(TallySnafu {})?;
    for (idx, line_r) in rdr.into_records().enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        let cells: Vec<Option<String>> = line.iter().map(normalize_cell).collect();
        if cells.iter().all(|c| c.is_none()) {
            debug!("read_csv_table: skipping blank line {}", lineno);
            continue;
        }
        debug!("read_csv_table: lineno: {:?} row: {:?}", lineno, &cells);
        builder.add_row(&cells);
    }
    info!(
        "read_csv_table: {}: {} columns, {} records",
        simplify_file_name(path),
        header.len(),
        builder.num_rows()
    );
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_the_donor_fixture() {
        let ds = read_csv_table(DONORS_FIXTURE).unwrap();
        assert_eq!(ds.columns.len(), 7);
        assert_eq!(ds.columns[1], "Genre_");
        assert_eq!(ds.records.len(), 14);
        // Row 9 has no district.
        assert_eq!(ds.records[8].values[4], None);
        // Row 12 has no gender.
        assert_eq!(ds.records[11].values[1], None);
        assert_eq!(ds.records[13].position, 13);
    }

    #[test]
    fn missing_file_is_an_error() {
        let res = read_csv_table("does/not/exist.csv");
        assert!(matches!(res.map_err(|e| *e), Err(DashError::CsvOpen { .. })));
    }
}
