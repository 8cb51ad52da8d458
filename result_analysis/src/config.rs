// ********* Input data structures ***********

use std::collections::HashMap;
use std::error::Error;
use std::fmt::Display;

/// A value reported for one question of a checklist.
///
/// A question that was not answered is simply absent from the submission:
/// there is no variant for it.
#[derive(PartialEq, Debug, Clone)]
pub enum FieldValue {
    Number(f64),
    /// Free text. It is interpreted as a number if it parses as one.
    Text(String),
}

impl FieldValue {
    /// The numeric content of this value, if any.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(x) => Some(*x),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }
}

/// The origin of a submission.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum SubmissionType {
    /// The aggregated record for a location, reconciled from observer reports.
    Master,
    /// The report of an individual observer.
    Observer,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum QuarantineStatus {
    NotQuarantined,
    /// The whole submission is quarantined.
    All,
    /// Only the results section is quarantined.
    Results,
}

/// One observation report, as provided by the storage layer.
#[derive(PartialEq, Debug, Clone)]
pub struct Submission {
    pub id: Option<String>,
    /// The code of the location (usually a polling station) of this report.
    pub location: String,
    pub values: HashMap<String, FieldValue>,
    /// Last update, in seconds since the unix epoch.
    pub updated: i64,
    pub submission_type: SubmissionType,
    pub quarantine_status: QuarantineStatus,
    pub verification_rejected: bool,
}

impl Submission {
    /// A master submission that is neither quarantined nor rejected.
    pub fn new(location: &str, updated: i64) -> Submission {
        Submission {
            id: None,
            location: location.to_string(),
            values: HashMap::new(),
            updated,
            submission_type: SubmissionType::Master,
            quarantine_status: QuarantineStatus::NotQuarantined,
            verification_rejected: false,
        }
    }

    pub fn with_number(mut self, tag: &str, value: f64) -> Submission {
        self.values
            .insert(tag.to_string(), FieldValue::Number(value));
        self
    }
}

/// A question of a form.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Field {
    pub tag: String,
    pub description: String,
    /// A value that means "not reported" for this question (for example 999).
    pub null_value: Option<i64>,
}

/// The name of the registered voters column when it is derived from the locations.
pub const REGISTERED_VOTERS: &str = "registered_voters";

/// A checklist form and the tags that play a role in the results.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Form {
    pub name: String,
    pub fields: Vec<Field>,
    /// The fields that count towards the contested total, in display order.
    pub vote_shares: Vec<String>,
    pub registered_voters_tag: Option<String>,
    pub invalid_votes_tag: Option<String>,
    pub blank_votes_tag: Option<String>,
    pub accredited_voters_tag: Option<String>,
    pub calculate_moe: bool,
    /// When set, the individual observer reports are analysed instead of the
    /// master submissions.
    pub untrack_data_conflicts: bool,
}

impl Form {
    pub fn get_field_by_tag(&self, tag: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.tag == tag)
    }

    pub fn tags(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.tag.clone()).collect()
    }

    pub fn registered_voters_field(&self) -> String {
        self.registered_voters_tag
            .clone()
            .unwrap_or_else(|| REGISTERED_VOTERS.to_string())
    }

    pub fn rejected_votes_fields(&self) -> Vec<String> {
        self.invalid_votes_tag.iter().cloned().collect()
    }

    pub fn blank_votes_fields(&self) -> Vec<String> {
        self.blank_votes_tag.iter().cloned().collect()
    }

    pub fn accredited_voters_fields(&self) -> Vec<String> {
        self.accredited_voters_tag.iter().cloned().collect()
    }

    /// The fields that must all be filled for a submission to count as reported.
    pub fn non_null_fields(&self) -> Vec<String> {
        let mut res = self.rejected_votes_fields();
        res.extend(self.blank_votes_fields());
        res.extend(self.accredited_voters_fields());
        res.extend(self.vote_shares.iter().cloned());
        res
    }

    /// The fields summed into the total number of votes cast.
    pub fn all_votes_fields(&self) -> Vec<String> {
        let mut res = self.vote_shares.clone();
        res.extend(self.rejected_votes_fields());
        res.extend(self.blank_votes_fields());
        res
    }
}

// ********* Configuration **********

/// Deployment-wide settings of the analysis.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AnalysisRules {
    /// The size of the whole population, used for the finite population correction.
    /// If not provided, no correction is applied.
    pub big_n: Option<u64>,
    /// Margins of error are only computed if enabled here and on the form.
    pub enable_moe: bool,
}

impl AnalysisRules {
    pub const DEFAULT_RULES: AnalysisRules = AnalysisRules {
        big_n: None,
        enable_moe: false,
    };
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Confidence {
    P95,
    P99,
}

impl Confidence {
    pub fn z(&self) -> f64 {
        match self {
            Confidence::P95 => 1.96,
            Confidence::P99 => 2.58,
        }
    }
}

// ******** Output data structures *********

#[derive(PartialEq, Debug, Clone, Copy, Default)]
pub struct MarginsOfError {
    pub moe_95: f64,
    pub moe_99: f64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct FieldTally {
    pub tag: String,
    pub count: f64,
    /// Share of the valid votes.
    pub pct: f64,
    pub moe: Option<MarginsOfError>,
}

#[derive(PartialEq, Debug, Clone, Default)]
pub struct ReportMoe {
    pub turnout: MarginsOfError,
    pub all_valid_votes: MarginsOfError,
    pub total_rejected: MarginsOfError,
    pub total_blanks: MarginsOfError,
}

/// The results summary for one location.
#[derive(PartialEq, Debug, Clone)]
pub struct Report {
    pub reported_cnt: u64,
    pub missing_cnt: u64,
    pub reported_pct: f64,
    pub missing_pct: f64,
    pub rv: f64,
    pub all_votes: f64,
    /// Infinite if no registered voters were reported.
    pub turnout: f64,
    pub all_valid_votes: f64,
    pub all_valid_votes_pct: f64,
    pub total_rejected: f64,
    pub total_rejected_pct: f64,
    pub total_blanks: f64,
    pub total_blanks_pct: f64,
    pub fields: Vec<FieldTally>,
    pub moe: Option<ReportMoe>,
    /// False when no reporting submission contributed to this report.
    pub data_available: bool,
}

impl Report {
    /// The report of a location without any data.
    pub fn empty(form: &Form, with_moe: bool) -> Report {
        let fields = form
            .vote_shares
            .iter()
            .map(|tag| FieldTally {
                tag: tag.clone(),
                count: 0.0,
                pct: 0.0,
                moe: if with_moe {
                    Some(MarginsOfError::default())
                } else {
                    None
                },
            })
            .collect();
        Report {
            reported_cnt: 0,
            missing_cnt: 0,
            reported_pct: 0.0,
            missing_pct: 0.0,
            rv: 0.0,
            all_votes: 0.0,
            turnout: 0.0,
            all_valid_votes: 0.0,
            all_valid_votes_pct: 0.0,
            total_rejected: 0.0,
            total_rejected_pct: 0.0,
            total_blanks: 0.0,
            total_blanks_pct: 0.0,
            fields,
            moe: if with_moe {
                Some(ReportMoe::default())
            } else {
                None
            },
            data_available: false,
        }
    }

    pub fn field(&self, tag: &str) -> Option<&FieldTally> {
        self.fields.iter().find(|ft| ft.tag == tag)
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct LocationReport {
    pub name: String,
    pub location_type: String,
    pub report: Report,
}

/// The reports for all the locations of one location type.
#[derive(PartialEq, Debug, Clone)]
pub struct GroupedReports {
    pub location_type: String,
    pub reports: Vec<LocationReport>,
}

/// A point of a time series: (unix time in milliseconds, percentage).
pub type SeriesPoint = (i64, f64);

/// One series per vote share field, in the order of the fields.
pub type Series = Vec<(String, Vec<SeriesPoint>)>;

#[derive(PartialEq, Debug, Clone)]
pub struct ConvergenceSeries {
    /// Cumulative vote shares, ordered by update time.
    pub convergence: Series,
    /// Vote shares of each individual submission, ordered by update time.
    pub scatter: Series,
}

#[derive(PartialEq, Debug, Clone)]
pub struct ResultsAnalysis {
    pub location: String,
    pub location_type: String,
    pub overall: Report,
    pub grouped: Vec<GroupedReports>,
    pub series: ConvergenceSeries,
}

/// Errors in the input data that prevent the analysis to be run.
///
/// Sparse or missing data is never an error: it results in empty reports.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum AnalysisErrors {
    UnknownLocation(String),
    UnknownLocationType(String),
    DuplicateLocation(String),
    DuplicateLocationType(String),
    /// The location and its parent have location types that are not ancestors of each other.
    InvalidParent { location: String, parent: String },
}

impl Error for AnalysisErrors {}

impl Display for AnalysisErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisErrors::UnknownLocation(code) => write!(f, "unknown location {}", code),
            AnalysisErrors::UnknownLocationType(name) => {
                write!(f, "unknown location type {}", name)
            }
            AnalysisErrors::DuplicateLocation(code) => write!(f, "duplicate location {}", code),
            AnalysisErrors::DuplicateLocationType(name) => {
                write!(f, "duplicate location type {}", name)
            }
            AnalysisErrors::InvalidParent { location, parent } => write!(
                f,
                "location {} cannot be placed under location {}",
                location, parent
            ),
        }
    }
}
