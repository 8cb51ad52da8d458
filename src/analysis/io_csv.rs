// Primitives for reading CSV files.

use std::collections::HashMap;

use crate::analysis::io_common::{make_default_id, parse_cell, ParsedSubmission};
use crate::analysis::*;

/// The position of the columns of a header row.
pub struct ColumnLayout {
    id: Option<usize>,
    location: usize,
    updated: usize,
    submission_type: Option<usize>,
    quarantine_status: Option<usize>,
    verification_status: Option<usize>,
    // (index, tag)
    fields: Vec<(usize, String)>,
}

impl ColumnLayout {
    pub fn from_header(header: &[String], cfs: &FileSource) -> AnalysisResult<ColumnLayout> {
        let find = |name: &str| header.iter().position(|h| h.trim() == name);
        let find_required = |name: &str| {
            find(name).context(MissingColumnSnafu {
                name: name.to_string(),
            })
        };
        let id = match cfs.id_column.as_deref() {
            Some(name) => Some(find_required(name)?),
            None => None,
        };
        let reserved = cfs.reserved_columns();
        let fields: Vec<(usize, String)> = header
            .iter()
            .enumerate()
            .filter(|(_, h)| !h.trim().is_empty() && !reserved.contains(&h.trim()))
            .map(|(idx, h)| (idx, h.trim().to_string()))
            .collect();
        debug!("ColumnLayout: fields: {:?}", fields);
        Ok(ColumnLayout {
            id,
            location: find_required(cfs.location_column())?,
            updated: find_required(cfs.updated_column())?,
            submission_type: find(cfs.submission_type_column()),
            quarantine_status: find(cfs.quarantine_column()),
            verification_status: find(cfs.verification_column()),
            fields,
        })
    }

    /// Reads one row. Missing trailing cells are empty.
    pub fn parse_row(
        &self,
        lineno: usize,
        row: &[String],
        default_id: &dyn Fn(usize) -> String,
    ) -> AnalysisResult<ParsedSubmission> {
        let required = |idx: usize| -> AnalysisResult<String> {
            row.get(idx)
                .cloned()
                .context(LineTooShortSnafu { lineno })
        };
        let optional = |idx: Option<usize>| -> Option<String> {
            idx.and_then(|i| row.get(i))
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        let mut values: HashMap<String, FieldValue> = HashMap::new();
        for (idx, tag) in self.fields.iter() {
            if let Some(v) = row.get(*idx).and_then(|s| parse_cell(s)) {
                values.insert(tag.clone(), v);
            }
        }
        Ok(ParsedSubmission {
            lineno,
            id: Some(optional(self.id).unwrap_or_else(|| default_id(lineno))),
            location: required(self.location)?,
            updated: required(self.updated)?,
            submission_type: optional(self.submission_type),
            quarantine_status: optional(self.quarantine_status),
            verification_status: optional(self.verification_status),
            values,
        })
    }
}

pub fn read_csv_submissions(path: String, cfs: &FileSource) -> BAnalysisResult<Vec<ParsedSubmission>> {
    let default_id = make_default_id(&path);
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(&path)
        .context(CsvOpenSnafu {})?;
    let header: Vec<String> = rdr
        .headers()
        .context(CsvLineParseSnafu {})?
        .iter()
        .map(|s| s.to_string())
        .collect();
    debug!("read_csv_submissions: header: {:?}", header);
    let layout = ColumnLayout::from_header(&header, cfs)?;

    let mut res: Vec<ParsedSubmission> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu {})?;
        let row: Vec<String> = line.iter().map(|s| s.to_string()).collect();
        debug!("read_csv_submissions: lineno: {:?} row: {:?}", lineno, row);
        res.push(layout.parse_row(lineno, &row, &default_id)?);
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(l: &[&str]) -> Vec<String> {
        l.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn layout_from_header() {
        let cfs = FileSource::new("csv", "x.csv");
        let header = strings(&["location", "updated", "type", "RV", "A", ""]);
        let layout = ColumnLayout::from_header(&header, &cfs).unwrap();
        assert_eq!(
            layout.fields,
            vec![(3, "RV".to_string()), (4, "A".to_string())]
        );
        assert_eq!(layout.submission_type, Some(2));
        assert_eq!(layout.quarantine_status, None);

        let ps = layout
            .parse_row(2, &strings(&["PS1", "10", "O", "100", ""]), &|l| {
                format!("x-{}", l)
            })
            .unwrap();
        assert_eq!(ps.id, Some("x-2".to_string()));
        assert_eq!(ps.submission_type, Some("O".to_string()));
        assert_eq!(ps.values.get("RV"), Some(&FieldValue::Number(100.0)));
        assert_eq!(ps.values.get("A"), None);
    }

    #[test]
    fn missing_columns() {
        let cfs = FileSource::new("csv", "x.csv");
        let header = strings(&["station", "updated", "A"]);
        assert!(ColumnLayout::from_header(&header, &cfs).is_err());

        let header = strings(&["location", "updated", "A"]);
        let layout = ColumnLayout::from_header(&header, &cfs).unwrap();
        assert!(layout
            .parse_row(2, &strings(&["PS1"]), &|l| l.to_string())
            .is_err());
    }
}
