// Primitives shared by the submission readers.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime};

use crate::analysis::*;

/// A submission as read from a file, before validation.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct ParsedSubmission {
    pub lineno: usize,
    pub id: Option<String>,
    pub location: String,
    pub updated: String,
    pub submission_type: Option<String>,
    pub quarantine_status: Option<String>,
    pub verification_status: Option<String>,
    pub values: HashMap<String, FieldValue>,
}

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

pub fn make_default_id(path: &str) -> impl Fn(usize) -> String {
    let simplified_file_name = simplify_file_name(path);
    move |lineno| format!("{}-{:08}", simplified_file_name, lineno)
}

/// The value of a cell. Empty cells are missing values.
pub fn parse_cell(s: &str) -> Option<FieldValue> {
    let s = s.trim();
    if s.is_empty() {
        None
    } else if let Ok(x) = s.parse::<f64>() {
        Some(FieldValue::Number(x))
    } else {
        Some(FieldValue::Text(s.to_string()))
    }
}

/// Seconds since the epoch, from a number of seconds, an RFC 3339 date or a
/// `YYYY-MM-DD HH:MM:SS` date in UTC.
pub fn parse_timestamp(lineno: usize, s: &str) -> AnalysisResult<i64> {
    let s = s.trim();
    if let Ok(x) = s.parse::<i64>() {
        return Ok(x);
    }
    if let Ok(x) = s.parse::<f64>() {
        if x.is_finite() {
            return Ok(x.floor() as i64);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.timestamp());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.and_utc().timestamp());
    }
    InvalidTimestampSnafu {
        lineno,
        content: s.to_string(),
    }
    .fail()
}

fn parse_submission_type(lineno: usize, s: &Option<String>) -> AnalysisResult<SubmissionType> {
    match s.as_deref().map(|x| x.trim().to_lowercase()).as_deref() {
        None | Some("") | Some("m") | Some("master") => Ok(SubmissionType::Master),
        Some("o") | Some("observer") => Ok(SubmissionType::Observer),
        Some(x) => whatever!("line {}: unknown submission type {:?}", lineno, x),
    }
}

fn parse_quarantine_status(
    lineno: usize,
    s: &Option<String>,
) -> AnalysisResult<QuarantineStatus> {
    match s.as_deref().map(|x| x.trim()) {
        None | Some("") => Ok(QuarantineStatus::NotQuarantined),
        Some("A") => Ok(QuarantineStatus::All),
        Some("R") => Ok(QuarantineStatus::Results),
        Some(x) => whatever!("line {}: unknown quarantine status {:?}", lineno, x),
    }
}

fn is_verification_rejected(s: &Option<String>) -> bool {
    s.as_deref()
        .map(|x| x.trim().eq_ignore_ascii_case("rejected"))
        .unwrap_or(false)
}

pub fn validate_submissions(parsed: &[ParsedSubmission]) -> AnalysisResult<Vec<Submission>> {
    let mut res: Vec<Submission> = Vec::new();
    for ps in parsed.iter() {
        let location = ps.location.trim();
        if location.is_empty() {
            whatever!("line {}: missing location", ps.lineno);
        }
        let s = Submission {
            id: ps.id.clone(),
            location: location.to_string(),
            values: ps.values.clone(),
            updated: parse_timestamp(ps.lineno, &ps.updated)?,
            submission_type: parse_submission_type(ps.lineno, &ps.submission_type)?,
            quarantine_status: parse_quarantine_status(ps.lineno, &ps.quarantine_status)?,
            verification_rejected: is_verification_rejected(&ps.verification_status),
        };
        res.push(s);
    }
    debug!("validate_submissions: {} submissions", res.len());
    Ok(res)
}
