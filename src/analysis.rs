mod config_reader;
mod io_common;
mod io_csv;
mod io_json;
mod io_xlsx;

use log::{debug, info, warn};

use result_analysis::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use calamine::{open_workbook, Reader, Xlsx};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::analysis::config_reader::*;
use crate::analysis::io_common::*;

#[derive(Debug, Snafu)]
pub enum ResultsError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The workbook has no worksheet or no header row"))]
    EmptyExcel {},
    #[snafu(display("Missing worksheet {name}"))]
    MissingWorksheet { name: String },
    #[snafu(display("Unexpected cell in line {lineno}: {content}"))]
    ExcelWrongCellType { lineno: u64, content: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON content"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing the summary to {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("Error opening the CSV file"))]
    CsvOpen { source: csv::Error },
    #[snafu(display("Error parsing a CSV line"))]
    CsvLineParse { source: csv::Error },
    #[snafu(display("Missing column {name}"))]
    MissingColumn { name: String },
    #[snafu(display("Line {lineno} is too short"))]
    LineTooShort { lineno: usize },
    #[snafu(display("Line {lineno}: could not understand the timestamp {content:?}"))]
    InvalidTimestamp { lineno: usize, content: String },
    #[snafu(display("Invalid input data"))]
    Analysis { source: AnalysisErrors },
    #[snafu(display("Provider not implemented {provider:?}"))]
    UnknownProvider { provider: String },
    #[snafu(display("No submission sources detected"))]
    NoSubmissionSources {},
    #[snafu(display("Difference detected between calculated summary and reference summary"))]
    ReferenceMismatch {},
    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type AnalysisResult<T> = Result<T, ResultsError>;
pub type BAnalysisResult<T> = Result<T, Box<ResultsError>>;

/// The command line settings that may override the configuration file.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct RunSettings {
    pub config_path: String,
    pub reference_path: Option<String>,
    pub out: Option<String>,
    pub input: Option<String>,
    pub input_type: Option<String>,
    pub location: Option<String>,
    pub excel_worksheet_name: Option<String>,
}

// Numbers that JSON cannot carry are written as strings.
fn js_number(x: f64) -> JSValue {
    if x.is_finite() {
        json!(x)
    } else if x.is_nan() {
        json!("NaN")
    } else if x > 0.0 {
        json!("Infinity")
    } else {
        json!("-Infinity")
    }
}

fn insert_moe(m: &mut JSMap<String, JSValue>, prefix: &str, moe: &MarginsOfError) {
    m.insert(format!("{}_moe_95", prefix), js_number(moe.moe_95));
    m.insert(format!("{}_moe_99", prefix), js_number(moe.moe_99));
}

fn report_to_json(r: &Report) -> JSMap<String, JSValue> {
    let mut m: JSMap<String, JSValue> = JSMap::new();
    m.insert("reported_cnt".to_string(), json!(r.reported_cnt));
    m.insert("missing_cnt".to_string(), json!(r.missing_cnt));
    m.insert("reported_pct".to_string(), js_number(r.reported_pct));
    m.insert("missing_pct".to_string(), js_number(r.missing_pct));
    m.insert("rv".to_string(), js_number(r.rv));
    m.insert("all_votes".to_string(), js_number(r.all_votes));
    m.insert("turnout".to_string(), js_number(r.turnout));
    m.insert("all_valid_votes".to_string(), js_number(r.all_valid_votes));
    m.insert(
        "all_valid_votes_pct".to_string(),
        js_number(r.all_valid_votes_pct),
    );
    m.insert("total_rejected".to_string(), js_number(r.total_rejected));
    m.insert(
        "total_rejected_pct".to_string(),
        js_number(r.total_rejected_pct),
    );
    m.insert("total_blanks".to_string(), js_number(r.total_blanks));
    m.insert("total_blanks_pct".to_string(), js_number(r.total_blanks_pct));
    for ft in r.fields.iter() {
        m.insert(format!("{}_cnt", ft.tag), js_number(ft.count));
        m.insert(format!("{}_pct", ft.tag), js_number(ft.pct));
        if let Some(moe) = ft.moe {
            insert_moe(&mut m, &ft.tag, &moe);
        }
    }
    if let Some(moe) = r.moe.clone() {
        insert_moe(&mut m, "turnout", &moe.turnout);
        insert_moe(&mut m, "all_valid_votes", &moe.all_valid_votes);
        insert_moe(&mut m, "total_rejected", &moe.total_rejected);
        insert_moe(&mut m, "total_blanks", &moe.total_blanks);
    }
    m
}

fn series_to_json(series: &Series) -> JSValue {
    let mut m: JSMap<String, JSValue> = JSMap::new();
    for (tag, points) in series.iter() {
        let l: Vec<JSValue> = points
            .iter()
            .map(|(ts, v)| json!([ts, js_number(*v)]))
            .collect();
        m.insert(tag.clone(), JSValue::Array(l));
    }
    JSValue::Object(m)
}

fn results_to_json(ra: &ResultsAnalysis) -> JSValue {
    let mut grouped: JSMap<String, JSValue> = JSMap::new();
    for g in ra.grouped.iter() {
        let l: Vec<JSValue> = g
            .reports
            .iter()
            .map(|lr| {
                let mut m = report_to_json(&lr.report);
                m.insert("name".to_string(), json!(lr.name));
                m.insert("location_type".to_string(), json!(lr.location_type));
                JSValue::Object(m)
            })
            .collect();
        grouped.insert(g.location_type.clone(), JSValue::Array(l));
    }
    json!({
        "overall": report_to_json(&ra.overall),
        "grouped": grouped,
        "convergence": series_to_json(&ra.series.convergence),
        "scatter": series_to_json(&ra.series.scatter),
    })
}

fn build_summary_js(config: &ResultsConfig, ra: &ResultsAnalysis) -> JSValue {
    let c = OutputConfig {
        analysis: config.output_settings.analysis_name.clone(),
        date: config.output_settings.election_date.clone(),
        form: config.form.name.clone(),
        location: ra.location.clone(),
        location_type: ra.location_type.clone(),
    };
    json!({
        "config": c,
        "results": results_to_json(ra) })
}

fn read_submission_data(root_path: &Path, cfs: &FileSource) -> BAnalysisResult<Vec<Submission>> {
    let p: PathBuf = root_path.join(&cfs.file_path);
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read submission file {:?}", p2);
    let parsed = match cfs.provider.as_str() {
        "json" => io_json::read_json_submissions(p2, cfs)?,
        "csv" => io_csv::read_csv_submissions(p2, cfs)?,
        "xlsx" => io_xlsx::read_excel_file(p2, cfs)?,
        x => {
            return Err(Box::new(ResultsError::UnknownProvider {
                provider: x.to_string(),
            }));
        }
    };
    let res = validate_submissions(&parsed)?;
    Ok(res)
}

fn write_summary(out: &Option<String>, summary: &str) -> BAnalysisResult<()> {
    match out.as_deref() {
        None | Some("stdout") | Some("") => {
            println!("{}", summary);
        }
        Some(path) => {
            info!("Writing summary to {:?}", path);
            fs::write(path, summary).context(WritingOutputSnafu { path })?;
        }
    }
    Ok(())
}

pub fn run_analysis(settings: &RunSettings) -> BAnalysisResult<()> {
    let config_p = Path::new(settings.config_path.as_str());
    let mut config = read_config(&settings.config_path)?;
    info!("config: {:?}", config);

    // The command line overrides the sources of the configuration.
    if let Some(input) = settings.input.clone() {
        let provider = settings
            .input_type
            .clone()
            .unwrap_or_else(|| "csv".to_string());
        let mut cfs = FileSource::new(&provider, &input);
        cfs.excel_worksheet_name = settings.excel_worksheet_name.clone();
        config.submission_sources = vec![cfs];
    }
    if config.submission_sources.is_empty() {
        return Err(Box::new(ResultsError::NoSubmissionSources {}));
    }

    let form = validate_form(&config.form);
    let rules = validate_rules(&config.analysis);
    let tree = build_tree(&config)?;
    let location = settings
        .location
        .clone()
        .or_else(|| config.analysis.as_ref().and_then(|a| a.location.clone()));

    let root_p = config_p.parent().context(MissingParentDirSnafu {})?;
    let mut data: Vec<Submission> = Vec::new();
    for cfs in config.submission_sources.iter() {
        let mut file_data = read_submission_data(root_p, cfs)?;
        data.append(&mut file_data);
    }
    debug!("data: {:?}", data);

    let result = run_results_analysis(&data, &form, &tree, location.as_deref(), &rules)
        .context(AnalysisSnafu {})?;

    let result_js = build_summary_js(&config, &result);
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;
    write_summary(&settings.out, &pretty_js_stats)?;

    // The reference summary, if provided for comparison
    if let Some(summary_p) = settings.reference_path.clone() {
        let summary_ref = read_summary(summary_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference string");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            return Err(Box::new(ResultsError::ReferenceMismatch {}));
        }
    }

    Ok(())
}

fn run_analysis_test(test_name: &str, config_lpath: &str, summary_lpath: &str) {
    let test_dir = option_env!("RESULTS_TEST_DIR")
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("{}/tests", env!("CARGO_MANIFEST_DIR")));
    info!("Running test {}", test_name);
    let settings = RunSettings {
        config_path: format!("{}/{}/{}", test_dir, test_name, config_lpath),
        reference_path: Some(format!("{}/{}/{}", test_dir, test_name, summary_lpath)),
        ..Default::default()
    };
    let res = run_analysis(&settings);
    if let Err(e) = res {
        warn!("Error occured {:?}", e);
        panic!("test {} failed: {}", test_name, e);
    }
}

pub fn test_wrapper(test_name: &str) {
    run_analysis_test(
        test_name,
        format!("{}_config.json", test_name).as_str(),
        format!("{}_expected_summary.json", test_name).as_str(),
    )
}
