use calamine::DataType;
use chrono::Timelike;

use crate::dash::{
    io_common::{make_header, normalize_cell, render_number, simplify_file_name},
    *,
};

/// Reads a worksheet in which the first row is the header and every other row is a record.
pub fn read_excel_table(path: &str, worksheet_name: Option<&str>) -> BDashResult<Dataset> {
    let wrange = get_range(path, worksheet_name)?;

    let mut iter = wrange.rows();
    let header_row = iter.next().context(EmptyExcelSnafu {})?;
    let header_cells: Vec<Option<String>> = header_row.iter().map(read_cell).collect();
    let header = make_header(&header_cells);
    debug!("read_excel_table: header: {:?}", header);

    let mut builder = Builder::new(&header).context(TallySnafu {})?;
    for (idx, row) in iter.enumerate() {
        let cells: Vec<Option<String>> = row.iter().map(read_cell).collect();
        if cells.iter().all(|c| c.is_none()) {
            // Blank lines do not count as records.
            debug!("read_excel_table: skipping blank row {}", idx + 2);
            continue;
        }
        debug!("read_excel_table: row {}: {:?}", idx + 2, cells);
        builder.add_row(&cells);
    }
    info!(
        "read_excel_table: {}: {} columns, {} records",
        simplify_file_name(path),
        header.len(),
        builder.num_rows()
    );
    Ok(builder.build())
}

fn read_cell(cell: &DataType) -> Option<String> {
    match cell {
        DataType::String(s) => normalize_cell(s),
        DataType::Float(f) => Some(render_number(*f)),
        DataType::Int(i) => Some(i.to_string()),
        DataType::Bool(b) => Some(b.to_string()),
        DataType::DateTime(f) => Some(render_date(cell, *f)),
        DataType::Empty => None,
        DataType::Error(e) => {
            debug!("read_cell: treating cell error {:?} as missing", e);
            None
        }
    }
}

/// Dates are written in the ISO format, with the time only when it is not midnight.
fn render_date(cell: &DataType, f: f64) -> String {
    match cell.as_datetime() {
        Some(dt) if dt.num_seconds_from_midnight() == 0 => dt.format("%Y-%m-%d").to_string(),
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => render_number(f),
    }
}

fn get_range(path: &str, worksheet_name: Option<&str>) -> BDashResult<calamine::Range<DataType>> {
    debug!(
        "read_excel_table: path: {:?} worksheet: {:?}",
        path, worksheet_name
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(name) = worksheet_name {
        let wrange = workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { name, path })?
            .context(OpeningExcelSnafu { path })?;
        Ok(wrange)
    } else {
        let wrange = workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu {})?
            .context(OpeningExcelSnafu { path })?;
        Ok(wrange)
    }
}
