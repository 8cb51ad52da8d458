use log::debug;

use crate::config::*;
use crate::dataframe::Table;

/// Marks each row as reported or missing.
///
/// A row is reported when all the mandatory result fields are filled, the number
/// of registered voters is known and the vote shares add up to more than zero.
/// Reports where all the vote shares are zero are considered not filled yet.
pub fn classify_reporting(table: &mut Table, form: &Form) {
    let non_null_fields = form.non_null_fields();
    let rv_field = form.registered_voters_field();
    // A mandatory field absent from the table can never be filled.
    let all_columns_present = non_null_fields
        .iter()
        .chain(std::iter::once(&rv_field))
        .all(|t| table.column_index(t).is_some());
    let non_null_idxs = table.column_indices(&non_null_fields);
    let rv_idx = table.column_index(&rv_field);
    let share_idxs = table.column_indices(&form.vote_shares);

    let mut num_reported = 0;
    for row in table.rows.iter_mut() {
        let filled = non_null_idxs.iter().all(|idx| row.values[*idx].is_some());
        let has_rv = rv_idx.map(|idx| row.values[idx].is_some()).unwrap_or(false);
        let shares: f64 = share_idxs.iter().filter_map(|idx| row.values[*idx]).sum();
        row.reported = all_columns_present && filled && has_rv && shares > 0.0;
        if row.reported {
            num_reported += 1;
        }
    }
    debug!(
        "classify_reporting: {} reported, {} missing",
        num_reported,
        table.len() - num_reported
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataframe::tests::*;
    use crate::dataframe::*;

    fn classify(form: &Form, subs: &[Submission]) -> Vec<bool> {
        let tree = sample_tree();
        let mut table = build_dataframe(subs, form, &tree, &excluded_tags(form)).unwrap();
        normalize_null_sentinels(&mut table, form);
        classify_reporting(&mut table, form);
        table.rows.iter().map(|r| r.reported).collect()
    }

    #[test]
    fn reported_and_missing() {
        let form = sample_form();
        let subs = vec![
            Submission::new("PS1", 0)
                .with_number("RV", 100.0)
                .with_number("A", 60.0)
                .with_number("B", 40.0),
            // Missing a vote share
            Submission::new("PS2", 0)
                .with_number("RV", 100.0)
                .with_number("A", 60.0),
            // Missing the registered voters
            Submission::new("PS3", 0)
                .with_number("A", 60.0)
                .with_number("B", 40.0),
            // Sentinel for a vote share
            Submission::new("PS4", 0)
                .with_number("RV", 100.0)
                .with_number("A", 999.0)
                .with_number("B", 40.0),
        ];
        assert_eq!(classify(&form, &subs), vec![true, false, false, false]);
    }

    #[test]
    fn zero_registered_voters_is_reported() {
        let form = sample_form();
        let subs = vec![Submission::new("PS1", 0)
            .with_number("RV", 0.0)
            .with_number("A", 1.0)
            .with_number("B", 0.0)];
        assert_eq!(classify(&form, &subs), vec![true]);
    }

    #[test]
    fn all_zero_shares_is_missing() {
        let form = sample_form();
        let subs = vec![Submission::new("PS1", 0)
            .with_number("RV", 100.0)
            .with_number("A", 0.0)
            .with_number("B", 0.0)];
        assert_eq!(classify(&form, &subs), vec![false]);
    }

    #[test]
    fn optional_fields_are_required_when_configured() {
        let mut form = sample_form();
        form.fields.push(field("REJ", None));
        form.invalid_votes_tag = Some("REJ".to_string());
        let subs = vec![
            Submission::new("PS1", 0)
                .with_number("RV", 100.0)
                .with_number("A", 60.0)
                .with_number("B", 40.0),
            Submission::new("PS2", 0)
                .with_number("RV", 100.0)
                .with_number("A", 60.0)
                .with_number("B", 40.0)
                .with_number("REJ", 0.0),
        ];
        assert_eq!(classify(&form, &subs), vec![false, true]);
    }

    #[test]
    fn no_vote_shares_never_reports() {
        let mut form = sample_form();
        form.vote_shares = vec![];
        let subs = vec![Submission::new("PS1", 0)
            .with_number("RV", 100.0)
            .with_number("A", 60.0)];
        assert_eq!(classify(&form, &subs), vec![false]);
    }
}
