mod config;
use log::{debug, info, warn};

pub mod aggregation;
pub mod builder;
pub mod convergence;
pub mod dataframe;
pub mod estimator;
pub mod location;
pub mod manual;
pub mod reporting;

pub use crate::aggregation::{compute_grouped_report, compute_overall_report, AnalysisContext};
pub use crate::builder::LocationTreeBuilder;
pub use crate::config::*;
pub use crate::convergence::compute_convergence_series;
pub use crate::dataframe::{build_dataframe, normalize_null_sentinels, Table};
pub use crate::location::{Location, LocationId, LocationTree, LocationType, LocationTypeId};
pub use crate::reporting::classify_reporting;

/// Runs the results analysis of a form.
///
/// Arguments:
/// * `submissions` all the submissions of the form. They are filtered according to
/// the settings of the form and to the location.
/// * `form` the checklist form that carries the results
/// * `tree` the administrative divisions
/// * `location` the code of the location to analyse. If not provided, the root of
/// the divisions is used.
/// * `rules` the deployment settings
pub fn run_results_analysis(
    submissions: &[Submission],
    form: &Form,
    tree: &LocationTree,
    location: Option<&str>,
    rules: &AnalysisRules,
) -> Result<ResultsAnalysis, AnalysisErrors> {
    info!(
        "Processing {:?} submissions, form: {:?}, location: {:?}, rules: {:?}",
        submissions.len(),
        form.name,
        location,
        rules
    );
    if form.vote_shares.is_empty() {
        warn!(
            "run_results_analysis: form {:?} has no vote share fields, all results will be empty",
            form.name
        );
    }

    let loc: &Location = match location {
        Some(code) => tree
            .by_code(code)
            .ok_or_else(|| AnalysisErrors::UnknownLocation(code.to_string()))?,
        None => tree
            .root()
            .ok_or_else(|| AnalysisErrors::UnknownLocation("<root>".to_string()))?,
    };

    let mut selected: Vec<&Submission> = Vec::new();
    for s in dataframe::select_submissions(submissions, form) {
        let sloc = tree
            .by_code(&s.location)
            .ok_or_else(|| AnalysisErrors::UnknownLocation(s.location.clone()))?;
        if tree.contains(loc.id, sloc.id) {
            selected.push(s);
        }
    }
    info!(
        "Processing {:?} submissions within {}",
        selected.len(),
        loc.name
    );

    let excluded = dataframe::excluded_tags(form);
    debug!("run_results_analysis: excluded tags: {:?}", excluded);
    let mut table = build_dataframe(selected, form, tree, &excluded)?;
    normalize_null_sentinels(&mut table, form);
    classify_reporting(&mut table, form);

    let ctx = AnalysisContext { form, tree, rules };
    let overall = compute_overall_report(&table, loc.id, &ctx);
    info!(
        "Overall {}: {} reported, {} missing, turnout {}",
        loc.name, overall.reported_cnt, overall.missing_cnt, overall.turnout
    );
    for ft in overall.fields.iter() {
        info!("  {:>10} {} ({:.2}%)", ft.count, ft.tag, ft.pct * 100.0);
    }

    let grouped: Vec<GroupedReports> = tree
        .political_location_types()
        .iter()
        .map(|lt| compute_grouped_report(&table, lt.id, loc.id, &ctx))
        .collect();

    let series = compute_convergence_series(&table, &form.vote_shares);

    Ok(ResultsAnalysis {
        location: loc.name.clone(),
        location_type: tree.type_name(loc.id).to_string(),
        overall,
        grouped,
        series,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataframe::tests::*;

    fn submissions() -> Vec<Submission> {
        let mut observer = Submission::new("PS1", 50)
            .with_number("RV", 100.0)
            .with_number("A", 1.0)
            .with_number("B", 1.0);
        observer.submission_type = SubmissionType::Observer;
        vec![
            Submission::new("PS1", 100)
                .with_number("RV", 100.0)
                .with_number("A", 60.0)
                .with_number("B", 40.0),
            Submission::new("PS2", 200)
                .with_number("RV", 100.0)
                .with_number("A", 55.0)
                .with_number("B", 45.0),
            Submission::new("PS3", 300).with_number("RV", 100.0),
            Submission::new("PS4", 400)
                .with_number("RV", 120.0)
                .with_number("A", 999.0)
                .with_number("B", 20.0),
            observer,
        ]
    }

    #[test]
    fn whole_country() {
        let _ = env_logger::try_init();
        let res = run_results_analysis(
            &submissions(),
            &sample_form(),
            &sample_tree(),
            None,
            &AnalysisRules::DEFAULT_RULES,
        )
        .unwrap();
        assert_eq!(res.location, "Zambia");
        assert_eq!(res.location_type, "Country");
        // PS4 reports a sentinel for A: missing
        assert_eq!(res.overall.reported_cnt, 2);
        assert_eq!(res.overall.missing_cnt, 2);
        assert_eq!(res.overall.all_valid_votes, 200.0);

        let types: Vec<&str> = res
            .grouped
            .iter()
            .map(|g| g.location_type.as_str())
            .collect();
        assert_eq!(types, vec!["Ward", "Polling Station"]);
        assert_eq!(res.grouped[1].reports.len(), 4);
        assert_eq!(res.series.convergence[0].1.len(), 2);
    }

    #[test]
    fn one_ward() {
        let _ = env_logger::try_init();
        let res = run_results_analysis(
            &submissions(),
            &sample_form(),
            &sample_tree(),
            Some("W1"),
            &AnalysisRules::DEFAULT_RULES,
        )
        .unwrap();
        assert_eq!(res.location, "Ward 1");
        assert_eq!(res.overall.reported_cnt, 2);
        assert_eq!(res.overall.missing_cnt, 1);
        assert_eq!(res.overall.turnout, 1.0);
        assert_eq!(res.overall.field("A").map(|f| f.pct), Some(0.575));
        assert_eq!(res.grouped[0].reports.len(), 1);
        assert_eq!(res.grouped[1].reports.len(), 3);
    }

    #[test]
    fn observer_reports() {
        let mut form = sample_form();
        form.untrack_data_conflicts = true;
        let res = run_results_analysis(
            &submissions(),
            &form,
            &sample_tree(),
            None,
            &AnalysisRules::DEFAULT_RULES,
        )
        .unwrap();
        assert_eq!(res.overall.reported_cnt, 1);
        assert_eq!(res.overall.missing_cnt, 0);
        assert_eq!(res.overall.all_valid_votes, 2.0);
    }

    #[test]
    fn unknown_location() {
        let res = run_results_analysis(
            &submissions(),
            &sample_form(),
            &sample_tree(),
            Some("W9"),
            &AnalysisRules::DEFAULT_RULES,
        );
        assert_eq!(res, Err(AnalysisErrors::UnknownLocation("W9".to_string())));
    }

    #[test]
    fn form_without_vote_shares() {
        let mut form = sample_form();
        form.vote_shares = vec![];
        let res = run_results_analysis(
            &submissions(),
            &form,
            &sample_tree(),
            None,
            &AnalysisRules::DEFAULT_RULES,
        )
        .unwrap();
        assert_eq!(res.overall.reported_cnt, 0);
        assert_eq!(res.overall.all_votes, 0.0);
        assert!(res.overall.fields.is_empty());
        assert!(res.series.convergence.is_empty());
    }
}
