use crate::analysis::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "analysisName")]
    pub analysis_name: String,
    #[serde(rename = "electionDate")]
    pub election_date: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub analysis: String,
    pub date: Option<String>,
    pub form: String,
    pub location: String,
    #[serde(rename = "locationType")]
    pub location_type: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FieldConfig {
    pub tag: String,
    pub description: Option<String>,
    #[serde(rename = "nullValue")]
    pub null_value: Option<JSValue>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FormConfig {
    pub name: String,
    pub fields: Vec<FieldConfig>,
    #[serde(rename = "voteShares")]
    pub vote_shares: Option<Vec<String>>,
    #[serde(rename = "registeredVotersTag")]
    pub registered_voters_tag: Option<String>,
    #[serde(rename = "invalidVotesTag")]
    pub invalid_votes_tag: Option<String>,
    #[serde(rename = "blankVotesTag")]
    pub blank_votes_tag: Option<String>,
    #[serde(rename = "accreditedVotersTag")]
    pub accredited_voters_tag: Option<String>,
    #[serde(rename = "calculateMoe")]
    pub calculate_moe: Option<bool>,
    #[serde(rename = "untrackDataConflicts")]
    pub untrack_data_conflicts: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct LocationTypeConfig {
    pub name: String,
    pub parent: Option<String>,
    #[serde(rename = "isPolitical")]
    pub is_political: Option<bool>,
    #[serde(rename = "isAdministrative")]
    pub is_administrative: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    pub code: String,
    pub name: String,
    #[serde(rename = "locationType")]
    pub location_type: String,
    pub parent: Option<String>,
    #[serde(rename = "registeredVoters")]
    pub registered_voters: Option<u64>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "idColumn")]
    pub id_column: Option<String>,
    #[serde(rename = "locationColumn")]
    pub location_column: Option<String>,
    #[serde(rename = "updatedColumn")]
    pub updated_column: Option<String>,
    #[serde(rename = "submissionTypeColumn")]
    pub submission_type_column: Option<String>,
    #[serde(rename = "quarantineColumn")]
    pub quarantine_column: Option<String>,
    #[serde(rename = "verificationColumn")]
    pub verification_column: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

impl FileSource {
    pub fn new(provider: &str, file_path: &str) -> FileSource {
        FileSource {
            provider: provider.to_string(),
            file_path: file_path.to_string(),
            id_column: None,
            location_column: None,
            updated_column: None,
            submission_type_column: None,
            quarantine_column: None,
            verification_column: None,
            excel_worksheet_name: None,
        }
    }

    pub fn location_column(&self) -> &str {
        self.location_column.as_deref().unwrap_or("location")
    }

    pub fn updated_column(&self) -> &str {
        self.updated_column.as_deref().unwrap_or("updated")
    }

    pub fn submission_type_column(&self) -> &str {
        self.submission_type_column.as_deref().unwrap_or("type")
    }

    pub fn quarantine_column(&self) -> &str {
        self.quarantine_column.as_deref().unwrap_or("quarantine")
    }

    pub fn verification_column(&self) -> &str {
        self.verification_column.as_deref().unwrap_or("verification")
    }

    /// All the columns that do not carry field values.
    pub fn reserved_columns(&self) -> Vec<&str> {
        let mut res = vec![
            self.location_column(),
            self.updated_column(),
            self.submission_type_column(),
            self.quarantine_column(),
            self.verification_column(),
        ];
        if let Some(id) = self.id_column.as_deref() {
            res.push(id);
        }
        res
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSettings {
    pub location: Option<String>,
    #[serde(rename = "bigN")]
    pub big_n: Option<u64>,
    #[serde(rename = "enableMoe")]
    pub enable_moe: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ResultsConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    pub form: FormConfig,
    #[serde(rename = "locationTypes")]
    pub location_types: Vec<LocationTypeConfig>,
    pub locations: Vec<LocationConfig>,
    #[serde(rename = "submissionSources", default)]
    pub submission_sources: Vec<FileSource>,
    pub analysis: Option<AnalysisSettings>,
}

pub fn read_config(path: &str) -> BAnalysisResult<ResultsConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: ResultsConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(config)
}

pub fn read_summary(path: String) -> BAnalysisResult<JSValue> {
    let contents = fs::read_to_string(path.clone()).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

fn read_null_value(tag: &str, x: &Option<JSValue>) -> Option<i64> {
    let res = match x {
        None | Some(JSValue::Null) => return None,
        Some(JSValue::Number(n)) => n.as_i64(),
        Some(JSValue::String(s)) => s.trim().parse::<i64>().ok(),
        Some(_) => None,
    };
    if res.is_none() {
        warn!(
            "validate_form: field {}: ignoring the null value {:?}, it is not an integer",
            tag, x
        );
    }
    res
}

// The vote shares and the special tags that are not declared as fields.
fn undeclared_tags(fc: &FormConfig, fields: &[Field]) -> Vec<String> {
    let special = [
        &fc.registered_voters_tag,
        &fc.invalid_votes_tag,
        &fc.blank_votes_tag,
        &fc.accredited_voters_tag,
    ];
    fc.vote_shares
        .iter()
        .flatten()
        .chain(special.into_iter().flatten())
        .filter(|tag| !fields.iter().any(|f| &f.tag == *tag))
        .cloned()
        .collect()
}

pub fn validate_form(fc: &FormConfig) -> Form {
    let fields: Vec<Field> = fc
        .fields
        .iter()
        .map(|f| Field {
            tag: f.tag.clone(),
            description: f.description.clone().unwrap_or_else(|| f.tag.clone()),
            null_value: read_null_value(&f.tag, &f.null_value),
        })
        .collect();
    let vote_shares = fc.vote_shares.clone().unwrap_or_default();
    for tag in undeclared_tags(fc, &fields) {
        warn!(
            "validate_form: {:?} is not a field of the form {:?}, no submission will be reported",
            tag, fc.name
        );
    }
    Form {
        name: fc.name.clone(),
        fields,
        vote_shares,
        registered_voters_tag: fc.registered_voters_tag.clone(),
        invalid_votes_tag: fc.invalid_votes_tag.clone(),
        blank_votes_tag: fc.blank_votes_tag.clone(),
        accredited_voters_tag: fc.accredited_voters_tag.clone(),
        calculate_moe: fc.calculate_moe.unwrap_or(false),
        untrack_data_conflicts: fc.untrack_data_conflicts.unwrap_or(false),
    }
}

pub fn validate_rules(settings: &Option<AnalysisSettings>) -> AnalysisRules {
    let mut rules = AnalysisRules::DEFAULT_RULES;
    if let Some(s) = settings {
        rules.big_n = s.big_n;
        rules.enable_moe = s.enable_moe.unwrap_or(rules.enable_moe);
    }
    rules
}

/// Builds the administrative divisions. The location types and the locations
/// must be listed parents first.
pub fn build_tree(config: &ResultsConfig) -> AnalysisResult<LocationTree> {
    let mut builder = LocationTreeBuilder::new();
    for lt in config.location_types.iter() {
        builder
            .location_type(
                &lt.name,
                lt.parent.as_deref(),
                lt.is_political.unwrap_or(false),
                lt.is_administrative.unwrap_or(true),
            )
            .context(AnalysisSnafu {})?;
    }
    for l in config.locations.iter() {
        builder
            .location(
                &l.code,
                &l.name,
                &l.location_type,
                l.parent.as_deref(),
                l.registered_voters,
            )
            .context(AnalysisSnafu {})?;
    }
    Ok(builder.build())
}
