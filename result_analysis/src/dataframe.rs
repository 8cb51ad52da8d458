use log::{debug, info};
use std::collections::HashSet;

use crate::config::*;
use crate::location::*;

/// One submission in the analysis table.
#[derive(PartialEq, Debug, Clone)]
pub struct Row {
    pub location: LocationId,
    /// The name of the location at each level, aligned with `Table::location_types`.
    pub path: Vec<Option<String>>,
    /// Aligned with `Table::columns`. `None` is a value that was not reported.
    pub values: Vec<Option<f64>>,
    /// Seconds since the unix epoch.
    pub updated: i64,
    /// Set by the reporting classifier.
    pub reported: bool,
}

/// The submissions of a form, one row per submission.
#[derive(PartialEq, Debug, Clone)]
pub struct Table {
    pub location_types: Vec<String>,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, tag: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == tag)
    }

    pub fn location_type_index(&self, name: &str) -> Option<usize> {
        self.location_types.iter().position(|c| c == name)
    }

    pub fn column_indices(&self, tags: &[String]) -> Vec<usize> {
        tags.iter().filter_map(|t| self.column_index(t)).collect()
    }

    /// The value of a field, or `None` if it is not reported or not in the table.
    pub fn value(&self, row: &Row, tag: &str) -> Option<f64> {
        self.column_index(tag).and_then(|idx| row.values[idx])
    }

    /// The name of the location of a row at the given level.
    pub fn location_name<'a>(&self, row: &'a Row, location_type: &str) -> Option<&'a str> {
        self.location_type_index(location_type)
            .and_then(|idx| row.path[idx].as_deref())
    }

    pub fn reported_rows(&self) -> Vec<&Row> {
        self.rows.iter().filter(|r| r.reported).collect()
    }
}

/// Restricts the submissions to the ones that enter the results analysis.
///
/// Master submissions are used, unless the form does not track data conflicts. Submissions
/// that failed verification or that have their results quarantined are left out.
pub fn select_submissions<'a>(submissions: &'a [Submission], form: &Form) -> Vec<&'a Submission> {
    let submission_type = if form.untrack_data_conflicts {
        SubmissionType::Observer
    } else {
        SubmissionType::Master
    };
    let res: Vec<&Submission> = submissions
        .iter()
        .filter(|s| s.submission_type == submission_type)
        .filter(|s| !s.verification_rejected)
        .filter(|s| s.quarantine_status == QuarantineStatus::NotQuarantined)
        .collect();
    debug!(
        "select_submissions: kept {} of {} submissions",
        res.len(),
        submissions.len()
    );
    res
}

/// The tags of the form that play no role in the results.
pub fn excluded_tags(form: &Form) -> HashSet<String> {
    let mut tracked: HashSet<String> = form.non_null_fields().into_iter().collect();
    tracked.insert(form.registered_voters_field());
    form.tags()
        .into_iter()
        .filter(|t| !tracked.contains(t))
        .collect()
}

/// Builds the analysis table.
///
/// The table has one column per tag of the form, except the excluded ones. If the
/// form does not have a registered voters field, the `registered_voters` column is
/// filled from the locations.
pub fn build_dataframe<'a>(
    submissions: impl IntoIterator<Item = &'a Submission>,
    form: &Form,
    tree: &LocationTree,
    excluded_tags: &HashSet<String>,
) -> Result<Table, AnalysisErrors> {
    let location_types: Vec<String> = tree
        .ordered_location_types()
        .iter()
        .map(|lt| lt.name.clone())
        .collect();
    let mut columns: Vec<String> = form
        .tags()
        .into_iter()
        .filter(|t| !excluded_tags.contains(t))
        .collect();
    let derived_rv =
        form.registered_voters_tag.is_none() && !columns.iter().any(|c| c == REGISTERED_VOTERS);
    if derived_rv {
        columns.push(REGISTERED_VOTERS.to_string());
    }

    let mut rows: Vec<Row> = Vec::new();
    for s in submissions {
        let location = tree
            .by_code(&s.location)
            .ok_or_else(|| AnalysisErrors::UnknownLocation(s.location.clone()))?;
        let location_path = tree.make_path(location.id);
        let path: Vec<Option<String>> = location_types
            .iter()
            .map(|lt| {
                location_path
                    .iter()
                    .find(|(t, _)| t == lt)
                    .map(|(_, n)| n.clone())
            })
            .collect();
        let values: Vec<Option<f64>> = columns
            .iter()
            .map(|c| {
                if derived_rv && c == REGISTERED_VOTERS {
                    location.registered_voters.map(|x| x as f64)
                } else {
                    match s.values.get(c) {
                        Some(v) => {
                            let x = v.as_number();
                            if x.is_none() {
                                debug!(
                                    "build_dataframe: submission {:?}: non numeric value {:?} for {}",
                                    s.id, v, c
                                );
                            }
                            x
                        }
                        None => None,
                    }
                }
            })
            .collect();
        rows.push(Row {
            location: location.id,
            path,
            values,
            updated: s.updated,
            reported: false,
        });
    }
    info!(
        "build_dataframe: {} rows, columns: {:?}, location types: {:?}",
        rows.len(),
        columns,
        location_types
    );
    Ok(Table {
        location_types,
        columns,
        rows,
    })
}

/// Replaces the values that mean "not reported" by missing values.
///
/// This applies to the vote share fields and to the registered voters field, each
/// with its own sentinel.
pub fn normalize_null_sentinels(table: &mut Table, form: &Form) {
    let mut tags: Vec<String> = form.vote_shares.clone();
    if let Some(rv_tag) = form.registered_voters_tag.clone() {
        tags.push(rv_tag);
    }
    for tag in tags.iter() {
        let null_value = match form.get_field_by_tag(tag).and_then(|f| f.null_value) {
            Some(x) => x as f64,
            None => continue,
        };
        let idx = match table.column_index(tag) {
            Some(idx) => idx,
            None => continue,
        };
        let mut replaced = 0;
        for row in table.rows.iter_mut() {
            if row.values[idx] == Some(null_value) {
                row.values[idx] = None;
                replaced += 1;
            }
        }
        debug!(
            "normalize_null_sentinels: {}: replaced {} occurences of {}",
            tag, replaced, null_value
        );
    }
}
