use log::debug;
use std::collections::HashMap;

use crate::config::*;
use crate::dataframe::{Row, Table};
use crate::estimator::{margins_of_error, ratio_samples};
use crate::location::*;

/// Everything the aggregation needs besides the table.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisContext<'a> {
    pub form: &'a Form,
    pub tree: &'a LocationTree,
    pub rules: &'a AnalysisRules,
}

impl<'a> AnalysisContext<'a> {
    pub fn with_moe(&self) -> bool {
        self.form.calculate_moe && self.rules.enable_moe
    }
}

// The accumulated rows of one location.
#[derive(Debug, Clone)]
struct Summation<'t> {
    reported_cnt: u64,
    missing_cnt: u64,
    // Sums over the reported rows, aligned with the columns of the table.
    // Missing values count as zero.
    sums: Vec<f64>,
    reported_rows: Vec<&'t Row>,
}

impl<'t> Summation<'t> {
    fn new(num_columns: usize) -> Summation<'t> {
        Summation {
            reported_cnt: 0,
            missing_cnt: 0,
            sums: vec![0.0; num_columns],
            reported_rows: Vec::new(),
        }
    }

    fn add(&mut self, row: &'t Row) {
        if !row.reported {
            self.missing_cnt += 1;
            return;
        }
        self.reported_cnt += 1;
        for (acc, v) in self.sums.iter_mut().zip(row.values.iter()) {
            *acc += v.unwrap_or(0.0);
        }
        self.reported_rows.push(row);
    }

    fn sum(&self, table: &Table, tags: &[String]) -> f64 {
        table
            .column_indices(tags)
            .iter()
            .fold(0.0, |acc, idx| acc + self.sums[*idx])
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

fn report_from_summation(table: &Table, s: &Summation, ctx: &AnalysisContext) -> Report {
    let form = ctx.form;
    let with_moe = ctx.with_moe();
    let total = (s.reported_cnt + s.missing_cnt) as f64;
    let reported_pct = ratio(s.reported_cnt as f64, total);
    let missing_pct = ratio(s.missing_cnt as f64, total);

    if s.reported_rows.is_empty() {
        let mut res = Report::empty(form, with_moe);
        res.missing_cnt = s.missing_cnt;
        res.reported_pct = reported_pct;
        res.missing_pct = missing_pct;
        return res;
    }

    let rv_fields = vec![form.registered_voters_field()];
    let all_votes_fields = form.all_votes_fields();
    let rejected_fields = form.rejected_votes_fields();
    let blank_fields = form.blank_votes_fields();

    let rv = s.sum(table, &rv_fields);
    let all_votes = s.sum(table, &all_votes_fields);
    let turnout = if rv == 0.0 {
        f64::INFINITY
    } else {
        all_votes / rv
    };
    let all_valid_votes = s.sum(table, &form.vote_shares);
    let total_rejected = s.sum(table, &rejected_fields);
    let total_blanks = s.sum(table, &blank_fields);

    let samples = |num: &[String], den: &[String]| {
        margins_of_error(
            &ratio_samples(table, &s.reported_rows, num, den),
            ctx.rules.big_n,
        )
    };

    let fields: Vec<FieldTally> = form
        .vote_shares
        .iter()
        .map(|tag| {
            let tags = [tag.clone()];
            let count = s.sum(table, &tags);
            FieldTally {
                tag: tag.clone(),
                count,
                pct: ratio(count, all_valid_votes),
                moe: if with_moe {
                    Some(samples(&tags, &form.vote_shares))
                } else {
                    None
                },
            }
        })
        .collect();

    let moe = if with_moe {
        Some(ReportMoe {
            turnout: samples(&all_votes_fields, &rv_fields),
            all_valid_votes: samples(&form.vote_shares, &all_votes_fields),
            total_rejected: if rejected_fields.is_empty() {
                MarginsOfError::default()
            } else {
                samples(&rejected_fields, &all_votes_fields)
            },
            total_blanks: if blank_fields.is_empty() {
                MarginsOfError::default()
            } else {
                samples(&blank_fields, &all_votes_fields)
            },
        })
    } else {
        None
    };

    Report {
        reported_cnt: s.reported_cnt,
        missing_cnt: s.missing_cnt,
        reported_pct,
        missing_pct,
        rv,
        all_votes,
        turnout,
        all_valid_votes,
        all_valid_votes_pct: ratio(all_valid_votes, all_votes),
        total_rejected,
        total_rejected_pct: if rejected_fields.is_empty() {
            0.0
        } else {
            ratio(total_rejected, all_votes)
        },
        total_blanks,
        total_blanks_pct: if blank_fields.is_empty() {
            0.0
        } else {
            ratio(total_blanks, all_votes)
        },
        fields,
        moe,
        data_available: true,
    }
}

/// The report for all the submissions within a location.
pub fn compute_overall_report(table: &Table, location: LocationId, ctx: &AnalysisContext) -> Report {
    let mut s = Summation::new(table.columns.len());
    for row in table
        .rows
        .iter()
        .filter(|r| ctx.tree.contains(location, r.location))
    {
        s.add(row);
    }
    debug!(
        "compute_overall_report: {}: {} reported, {} missing",
        ctx.tree.location(location).name,
        s.reported_cnt,
        s.missing_cnt
    );
    if s.reported_cnt + s.missing_cnt == 0 {
        return Report::empty(ctx.form, ctx.with_moe());
    }
    report_from_summation(table, &s, ctx)
}

/// The reports for each location of a location type, restricted to the locations
/// within `within`. The reports are sorted by location name.
pub fn compute_grouped_report(
    table: &Table,
    location_type: LocationTypeId,
    within: LocationId,
    ctx: &AnalysisContext,
) -> GroupedReports {
    let tree = ctx.tree;
    let mut groups: HashMap<LocationId, Summation> = HashMap::new();
    for row in table.rows.iter() {
        if let Some(lid) = tree.ancestor_of_type(row.location, location_type) {
            groups
                .entry(lid)
                .or_insert_with(|| Summation::new(table.columns.len()))
                .add(row);
        }
    }

    let type_name = tree.location_type(location_type).name.clone();
    let reports: Vec<LocationReport> = tree
        .locations_of_type(location_type, within)
        .iter()
        .map(|loc| {
            let report = match groups.get(&loc.id) {
                Some(s) => report_from_summation(table, s, ctx),
                None => Report::empty(ctx.form, ctx.with_moe()),
            };
            LocationReport {
                name: loc.name.clone(),
                location_type: type_name.clone(),
                report,
            }
        })
        .collect();
    debug!(
        "compute_grouped_report: {}: {} locations, {} with data",
        type_name,
        reports.len(),
        groups.len()
    );
    GroupedReports {
        location_type: type_name,
        reports,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataframe::tests::*;
    use crate::dataframe::*;
    use crate::reporting::classify_reporting;

    fn ward_submissions() -> Vec<Submission> {
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
        ]
    }

    fn prepare(form: &Form, tree: &LocationTree, subs: &[Submission]) -> Table {
        let mut table = build_dataframe(subs, form, tree, &excluded_tags(form)).unwrap();
        normalize_null_sentinels(&mut table, form);
        classify_reporting(&mut table, form);
        table
    }

    fn code(tree: &LocationTree, c: &str) -> LocationId {
        tree.by_code(c).unwrap().id
    }

    #[test]
    fn ward_scenario() {
        let form = sample_form();
        let tree = sample_tree();
        let rules = AnalysisRules::DEFAULT_RULES;
        let ctx = AnalysisContext {
            form: &form,
            tree: &tree,
            rules: &rules,
        };
        let table = prepare(&form, &tree, &ward_submissions());
        let r = compute_overall_report(&table, code(&tree, "W1"), &ctx);
        assert_eq!(r.reported_cnt, 2);
        assert_eq!(r.missing_cnt, 1);
        assert_eq!(r.all_valid_votes, 200.0);
        assert_eq!(r.all_votes, 200.0);
        assert_eq!(r.rv, 200.0);
        assert_eq!(r.turnout, 1.0);
        assert_eq!(r.field("A").map(|f| f.count), Some(115.0));
        assert_eq!(r.field("A").map(|f| f.pct), Some(0.575));
        assert_eq!(r.field("B").map(|f| f.count), Some(85.0));
        assert_eq!(r.total_rejected, 0.0);
        assert_eq!(r.total_rejected_pct, 0.0);
        assert_eq!(r.total_blanks_pct, 0.0);
        assert!(r.moe.is_none());
        assert!(r.data_available);
    }

    #[test]
    fn counts_add_up_at_every_level() {
        let form = sample_form();
        let tree = sample_tree();
        let rules = AnalysisRules::DEFAULT_RULES;
        let ctx = AnalysisContext {
            form: &form,
            tree: &tree,
            rules: &rules,
        };
        let mut subs = ward_submissions();
        subs.push(
            Submission::new("PS4", 400)
                .with_number("RV", 120.0)
                .with_number("A", 10.0)
                .with_number("B", 90.0),
        );
        let table = prepare(&form, &tree, &subs);
        let root = code(&tree, "ZM");
        let overall = compute_overall_report(&table, root, &ctx);
        assert_eq!(overall.reported_cnt + overall.missing_cnt, 4);

        for lt in tree.political_location_types() {
            let grouped = compute_grouped_report(&table, lt.id, root, &ctx);
            let total: u64 = grouped
                .reports
                .iter()
                .map(|lr| lr.report.reported_cnt + lr.report.missing_cnt)
                .sum();
            assert_eq!(total, 4, "{}", lt.name);
            let all_votes: f64 = grouped.reports.iter().map(|lr| lr.report.all_votes).sum();
            assert_eq!(all_votes, overall.all_votes, "{}", lt.name);
        }
    }

    #[test]
    fn grouped_reports_by_name() {
        let form = sample_form();
        let tree = sample_tree();
        let rules = AnalysisRules::DEFAULT_RULES;
        let ctx = AnalysisContext {
            form: &form,
            tree: &tree,
            rules: &rules,
        };
        let table = prepare(&form, &tree, &ward_submissions());
        let ps_type = tree.location_type_by_name("Polling Station").unwrap().id;
        let grouped = compute_grouped_report(&table, ps_type, code(&tree, "W1"), &ctx);
        let names: Vec<&str> = grouped.reports.iter().map(|lr| lr.name.as_str()).collect();
        assert_eq!(names, vec!["PS1", "PS2", "PS3"]);
        let ps3 = &grouped.reports[2].report;
        assert_eq!(ps3.reported_cnt, 0);
        assert_eq!(ps3.missing_cnt, 1);
        assert_eq!(ps3.missing_pct, 1.0);
        assert_eq!(ps3.all_votes, 0.0);
        assert!(!ps3.data_available);

        // No data at all for Ward 2
        let ward_type = tree.location_type_by_name("Ward").unwrap().id;
        let grouped = compute_grouped_report(&table, ward_type, code(&tree, "ZM"), &ctx);
        assert_eq!(grouped.reports.len(), 2);
        assert_eq!(grouped.reports[1].name, "Ward 2");
        assert_eq!(grouped.reports[1].report, Report::empty(&form, false));
    }

    #[test]
    fn zero_registered_voters_gives_infinite_turnout() {
        let form = sample_form();
        let tree = sample_tree();
        let rules = AnalysisRules::DEFAULT_RULES;
        let ctx = AnalysisContext {
            form: &form,
            tree: &tree,
            rules: &rules,
        };
        let subs = vec![Submission::new("PS1", 0)
            .with_number("RV", 0.0)
            .with_number("A", 3.0)
            .with_number("B", 1.0)];
        let table = prepare(&form, &tree, &subs);
        let r = compute_overall_report(&table, code(&tree, "PS1"), &ctx);
        assert_eq!(r.reported_cnt, 1);
        assert_eq!(r.turnout, f64::INFINITY);
        assert_eq!(r.field("A").map(|f| f.pct), Some(0.75));
    }

    #[test]
    fn empty_table_gives_empty_report() {
        let form = sample_form();
        let tree = sample_tree();
        let rules = AnalysisRules::DEFAULT_RULES;
        let ctx = AnalysisContext {
            form: &form,
            tree: &tree,
            rules: &rules,
        };
        let table = prepare(&form, &tree, &[]);
        let r = compute_overall_report(&table, code(&tree, "ZM"), &ctx);
        assert_eq!(r, Report::empty(&form, false));
        assert_eq!(r.fields.len(), 2);
    }

    #[test]
    fn rejected_and_blank_votes() {
        let mut form = sample_form();
        form.fields.push(field("REJ", None));
        form.fields.push(field("BLK", None));
        form.invalid_votes_tag = Some("REJ".to_string());
        form.blank_votes_tag = Some("BLK".to_string());
        let tree = sample_tree();
        let rules = AnalysisRules::DEFAULT_RULES;
        let ctx = AnalysisContext {
            form: &form,
            tree: &tree,
            rules: &rules,
        };
        let subs = vec![Submission::new("PS1", 0)
            .with_number("RV", 100.0)
            .with_number("A", 50.0)
            .with_number("B", 30.0)
            .with_number("REJ", 15.0)
            .with_number("BLK", 5.0)];
        let table = prepare(&form, &tree, &subs);
        let r = compute_overall_report(&table, code(&tree, "ZM"), &ctx);
        assert_eq!(r.all_votes, 100.0);
        assert_eq!(r.all_valid_votes, 80.0);
        assert_eq!(r.all_valid_votes_pct, 0.8);
        assert_eq!(r.total_rejected, 15.0);
        assert_eq!(r.total_rejected_pct, 0.15);
        assert_eq!(r.total_blanks, 5.0);
        assert_eq!(r.total_blanks_pct, 0.05);
        assert_eq!(r.field("A").map(|f| f.pct), Some(0.625));
    }

    #[test]
    fn margins_of_error_when_enabled() {
        let mut form = sample_form();
        form.calculate_moe = true;
        let tree = sample_tree();
        let rules = AnalysisRules {
            big_n: None,
            enable_moe: true,
        };
        let ctx = AnalysisContext {
            form: &form,
            tree: &tree,
            rules: &rules,
        };
        let table = prepare(&form, &tree, &ward_submissions());

        // Single reporting station: undefined variance is reported as 0
        let r = compute_overall_report(&table, code(&tree, "PS1"), &ctx);
        let moe = r.moe.clone().unwrap();
        assert_eq!(moe.turnout, MarginsOfError::default());
        assert_eq!(r.field("A").and_then(|f| f.moe), Some(MarginsOfError::default()));

        let r = compute_overall_report(&table, code(&tree, "W1"), &ctx);
        // a = [60, 55], m = [100, 100]: p = 0.575, variance = 0.000625
        let a_moe = r.field("A").and_then(|f| f.moe).unwrap();
        assert_eq!(a_moe.moe_95, 4.9);
        assert_eq!(a_moe.moe_99, 6.45);
        assert!(a_moe.moe_99 > a_moe.moe_95);

        // Disabled on the form
        form.calculate_moe = false;
        let ctx = AnalysisContext {
            form: &form,
            tree: &tree,
            rules: &rules,
        };
        let r = compute_overall_report(&table, code(&tree, "W1"), &ctx);
        assert!(r.moe.is_none());
    }
}
