mod analysis;
mod args;

use clap::Parser;
use log::LevelFilter;
use snafu::ErrorCompat;

use crate::analysis::{run_analysis, RunSettings};
use crate::args::Args;

fn main() {
    let args = Args::parse();

    let mut builder = env_logger::Builder::from_default_env();
    if args.verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();

    let settings = RunSettings {
        config_path: args.config,
        reference_path: args.reference,
        out: args.out,
        input: args.input,
        input_type: args.input_type,
        location: args.location,
        excel_worksheet_name: args.excel_worksheet_name,
    };

    if let Err(e) = run_analysis(&settings) {
        eprintln!("An error occured: {}", e);
        if let Some(bt) = ErrorCompat::backtrace(e.as_ref()) {
            eprintln!("{}", bt);
        }
        std::process::exit(1);
    }
}
