// Primitives for reading Excel workbooks.

use calamine::DataType;

use crate::analysis::io_csv::ColumnLayout;
use crate::analysis::io_common::{make_default_id, ParsedSubmission};
use crate::analysis::*;

// Excel serial dates count the days since 1899-12-30.
const EXCEL_UNIX_EPOCH_DAYS: f64 = 25569.0;
const SECONDS_PER_DAY: f64 = 86400.0;

pub fn read_excel_file(path: String, cfs: &FileSource) -> BAnalysisResult<Vec<ParsedSubmission>> {
    let default_id = make_default_id(&path);
    let wrange = get_range(&path, cfs)?;

    let mut iter = wrange.rows();
    let header_row = iter.next().context(EmptyExcelSnafu {})?;
    let header: Vec<String> = header_row
        .iter()
        .enumerate()
        .map(|(idx, c)| read_cell(1, idx, c))
        .collect::<AnalysisResult<Vec<String>>>()?;
    debug!("read_excel_file: header: {:?}", header);
    let layout = ColumnLayout::from_header(&header, cfs)?;

    let mut res: Vec<ParsedSubmission> = Vec::new();
    for (idx, row) in iter.enumerate() {
        let lineno = idx + 2;
        debug!("read_excel_file: lineno: {:?} row: {:?}", lineno, row);
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(col, c)| read_cell(lineno, col, c))
            .collect::<AnalysisResult<Vec<String>>>()?;
        // Fully empty rows are trailing formatting, not submissions.
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }
        res.push(layout.parse_row(lineno, &cells, &default_id)?);
    }
    Ok(res)
}

fn get_range(path: &str, cfs: &FileSource) -> BAnalysisResult<calamine::Range<DataType>> {
    debug!(
        "read_excel_file: path: {:?} worksheet: {:?}",
        path, &cfs.excel_worksheet_name
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let wrange = if let Some(worksheet_name) = cfs.excel_worksheet_name.as_deref() {
        workbook
            .worksheet_range(worksheet_name)
            .context(MissingWorksheetSnafu {
                name: worksheet_name,
            })?
            .context(OpeningExcelSnafu { path })?
    } else {
        workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu {})?
            .context(OpeningExcelSnafu { path })?
    };
    Ok(wrange)
}

// Cells are turned into the text a CSV file would carry.
fn read_cell(lineno: usize, col: usize, cell: &DataType) -> AnalysisResult<String> {
    match cell {
        DataType::Empty => Ok("".to_string()),
        DataType::String(s) => Ok(s.clone()),
        DataType::Int(i) => Ok(i.to_string()),
        DataType::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => Ok(format!("{}", *f as i64)),
        DataType::Float(f) => Ok(f.to_string()),
        DataType::Bool(b) => Ok(if *b { "1" } else { "0" }.to_string()),
        DataType::DateTime(f) => {
            let secs = ((f - EXCEL_UNIX_EPOCH_DAYS) * SECONDS_PER_DAY).round() as i64;
            Ok(secs.to_string())
        }
        _ => ExcelWrongCellTypeSnafu {
            lineno: lineno as u64,
            content: format!("column {}: {:?}", col + 1, cell),
        }
        .fail(),
    }
}
