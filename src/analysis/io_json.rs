use std::collections::HashMap;

use serde::Deserialize;

use crate::analysis::io_common::{make_default_id, parse_cell, ParsedSubmission};
use crate::analysis::*;

#[derive(Debug, Clone, Deserialize)]
struct JsonSubmission {
    id: Option<String>,
    location: String,
    updated: JSValue,
    #[serde(rename = "submissionType")]
    submission_type: Option<String>,
    #[serde(rename = "quarantineStatus")]
    quarantine_status: Option<String>,
    #[serde(rename = "verificationStatus")]
    verification_status: Option<String>,
    #[serde(default)]
    values: HashMap<String, JSValue>,
}

fn read_value(lineno: usize, tag: &str, v: &JSValue) -> AnalysisResult<Option<FieldValue>> {
    match v {
        JSValue::Null => Ok(None),
        JSValue::Number(n) => Ok(n.as_f64().map(FieldValue::Number)),
        JSValue::String(s) => Ok(parse_cell(s)),
        _ => whatever!(
            "submission {}: could not understand the value {:?} of {}",
            lineno,
            v,
            tag
        ),
    }
}

fn read_updated(lineno: usize, v: &JSValue) -> AnalysisResult<String> {
    match v {
        JSValue::Number(n) => Ok(n.to_string()),
        JSValue::String(s) => Ok(s.clone()),
        _ => InvalidTimestampSnafu {
            lineno,
            content: v.to_string(),
        }
        .fail(),
    }
}

pub fn read_json_submissions(path: String, _cfs: &FileSource) -> BAnalysisResult<Vec<ParsedSubmission>> {
    let default_id = make_default_id(&path);
    let contents = fs::read_to_string(path.clone()).context(OpeningJsonSnafu { path })?;
    let js: Vec<JsonSubmission> =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    let mut res: Vec<ParsedSubmission> = Vec::new();
    for (idx, s) in js.iter().enumerate() {
        // Submissions are numbered from 1.
        let lineno = idx + 1;
        let mut values: HashMap<String, FieldValue> = HashMap::new();
        for (tag, v) in s.values.iter() {
            if let Some(fv) = read_value(lineno, tag, v)? {
                values.insert(tag.clone(), fv);
            }
        }
        res.push(ParsedSubmission {
            lineno,
            id: Some(s.id.clone().unwrap_or_else(|| default_id(lineno))),
            location: s.location.clone(),
            updated: read_updated(lineno, &s.updated)?,
            submission_type: s.submission_type.clone(),
            quarantine_status: s.quarantine_status.clone(),
            verification_status: s.verification_status.clone(),
            values,
        });
    }
    Ok(res)
}
