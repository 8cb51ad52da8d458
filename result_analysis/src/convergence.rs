use log::debug;

use crate::config::*;
use crate::dataframe::Table;

/// Builds the time series of the vote shares, as submissions come in.
///
/// Only the reported rows are used, ordered by update time. The convergence series
/// is the running share of each field over the cumulative totals, the scatter series
/// is the share of each field within each submission. Shares are in percent.
pub fn compute_convergence_series(table: &Table, field_labels: &[String]) -> ConvergenceSeries {
    let mut rows: Vec<(i64, Vec<f64>)> = table
        .reported_rows()
        .iter()
        .map(|r| {
            let values: Vec<f64> = field_labels
                .iter()
                .map(|t| table.value(r, t).unwrap_or(0.0))
                .collect();
            (r.updated, values)
        })
        .collect();
    // Stable: submissions with the same time keep the order of the table.
    rows.sort_by_key(|(updated, _)| *updated);
    debug!(
        "compute_convergence_series: {} rows, fields {:?}",
        rows.len(),
        field_labels
    );

    let mut convergence: Series = field_labels.iter().map(|t| (t.clone(), Vec::new())).collect();
    let mut scatter: Series = field_labels.iter().map(|t| (t.clone(), Vec::new())).collect();

    let mut cumulative: Vec<f64> = vec![0.0; field_labels.len()];
    for (updated, values) in rows.iter() {
        let ts = updated.saturating_mul(1000);
        for (acc, v) in cumulative.iter_mut().zip(values.iter()) {
            *acc += v;
        }
        let cumulative_shares = shares(&cumulative);
        let row_shares = shares(values);
        for (idx, (c, s)) in cumulative_shares.iter().zip(row_shares.iter()).enumerate() {
            convergence[idx].1.push((ts, c * 100.0));
            scatter[idx].1.push((ts, s * 100.0));
        }
    }
    ConvergenceSeries {
        convergence,
        scatter,
    }
}

// The share of each value in the total, 0 if the total is 0.
fn shares(values: &[f64]) -> Vec<f64> {
    let total: f64 = values.iter().sum();
    values
        .iter()
        .map(|v| if total == 0.0 { 0.0 } else { v / total })
        .collect()
}
