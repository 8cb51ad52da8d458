use clap::Parser;

/// Computes the results and turnout statistics of an election observation.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The file containing the description of the form, the administrative divisions and
    /// the submission files, in JSON format. See the manual of the result_analysis crate for the format.
    #[clap(short, long, value_parser)]
    pub config: String,
    /// (file path) A reference file containing the summary of an analysis in JSON format. If provided, elres will
    /// check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the analysis will be written in JSON format to the given
    /// location. It is printed on the standard output otherwise.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) If specified, the submissions are read from this file instead of the sources
    /// listed in the configuration.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default csv) The type of the input: json, csv or xlsx.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (location code) The location to analyse. Defaults to the location of the configuration, or to
    /// the whole country.
    #[clap(short, long, value_parser)]
    pub location: Option<String>,

    /// When using an Excel file, indicates the name of the worksheet to use. The first worksheet is used otherwise.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
